//! Request correlation context.

use uuid::Uuid;

/// Correlation context for a single inbound request.
///
/// Carries a generated request id through logs so that the capability
/// invocation, its sandbox/browser operations, and any job writes can be
/// stitched back together when diagnosing a failure.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request id.
    id: Uuid,
    /// Component handling the request.
    component: String,
    /// Operation being performed, if known.
    operation: Option<String>,
}

impl RequestContext {
    /// Create a context for the given component.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            component: component.into(),
            operation: None,
        }
    }

    /// Set the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// The request id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Build a tracing span carrying the correlation fields.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "request",
            request_id = %self.id,
            component = %self.component,
            operation = self.operation.as_deref().unwrap_or("-"),
        )
    }
}

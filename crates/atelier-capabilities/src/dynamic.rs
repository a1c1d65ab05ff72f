//! Capabilities minted at runtime from async closures.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::CapabilityResult;
use crate::registry::Capability;
use crate::schema::ParameterSchema;

type Handler = Arc<dyn Fn(Value) -> BoxFuture<'static, CapabilityResult<Value>> + Send + Sync>;

/// A capability built from a name, schema, and async closure.
///
/// This is how capabilities are generated after startup (e.g. wrapping a
/// freshly installed package as a callable) and registered through the
/// normal [`Registry::register`](crate::Registry::register) path with the
/// same uniqueness invariant as the built-ins.
pub struct FnCapability {
    name: String,
    description: String,
    parameters: ParameterSchema,
    handler: Handler,
}

impl FnCapability {
    /// Create a capability from an async closure.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
        handler: F,
    ) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CapabilityResult<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }
}

impl std::fmt::Debug for FnCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCapability")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Capability for FnCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> ParameterSchema {
        self.parameters.clone()
    }

    async fn invoke(&self, args: Value) -> CapabilityResult<Value> {
        (self.handler)(args).await
    }
}

//! The capability registry: an explicit name → (schema, handler) table.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::audit::InvocationAudit;
use crate::error::{CapabilityError, CapabilityResult};
use crate::invocation::Invocation;
use crate::schema::ParameterSchema;

/// A named, schema-described unit of action the agent can invoke.
///
/// Implementations are constructed once, already bound to the collaborators
/// they need (sandbox manager, browser manager, job queue), and registered
/// with the [`Registry`]. The registry validates arguments against
/// [`Capability::parameters`] before calling [`Capability::invoke`], so
/// handlers may assume required arguments are present and well-typed;
/// though defensive re-extraction is still the norm.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Unique capability name.
    fn name(&self) -> &str;

    /// Human-readable description for the routing layer.
    fn description(&self) -> &str;

    /// Structural description of the accepted arguments.
    fn parameters(&self) -> ParameterSchema;

    /// Execute the capability with pre-validated arguments.
    async fn invoke(&self, args: Value) -> CapabilityResult<Value>;
}

/// Invocation metadata for one registered capability, for listing.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityDefinition {
    /// The capability name.
    pub name: String,
    /// The capability description.
    pub description: String,
    /// The parameter schema in JSON-schema form.
    pub parameters: Value,
}

/// Registry of capabilities keyed by name.
///
/// Populated once at process start by static discovery, then extended at any
/// time through the same [`register`](Self::register) path (dynamic
/// registrations are immediately visible to `invoke`). Registration rejects
/// duplicate names; [`replace`](Self::replace) is the explicit overwrite
/// path.
pub struct Registry {
    capabilities: RwLock<HashMap<String, Arc<dyn Capability>>>,
    audit: Option<Arc<InvocationAudit>>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            capabilities: RwLock::new(HashMap::new()),
            audit: None,
        }
    }

    /// Create an empty registry that records every invocation to `audit`.
    #[must_use]
    pub fn with_audit(audit: Arc<InvocationAudit>) -> Self {
        Self {
            capabilities: RwLock::new(HashMap::new()),
            audit: Some(audit),
        }
    }

    /// Register a capability under its name.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::AlreadyRegistered`] if the name is taken.
    pub async fn register(&self, capability: Arc<dyn Capability>) -> CapabilityResult<()> {
        let name = capability.name().to_string();
        let mut capabilities = self.capabilities.write().await;
        if capabilities.contains_key(&name) {
            return Err(CapabilityError::AlreadyRegistered { name });
        }
        debug!(capability = %name, "registered capability");
        capabilities.insert(name, capability);
        Ok(())
    }

    /// Replace (or insert) a capability, returning the previous one if any.
    ///
    /// This is the only overwrite path; plain registration rejects
    /// duplicates.
    pub async fn replace(&self, capability: Arc<dyn Capability>) -> Option<Arc<dyn Capability>> {
        let name = capability.name().to_string();
        let mut capabilities = self.capabilities.write().await;
        debug!(capability = %name, "replaced capability");
        capabilities.insert(name, capability)
    }

    /// Whether a capability is registered under `name`.
    pub async fn contains(&self, name: &str) -> bool {
        self.capabilities.read().await.contains_key(name)
    }

    /// Number of registered capabilities.
    pub async fn len(&self) -> usize {
        self.capabilities.read().await.len()
    }

    /// Whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.capabilities.read().await.is_empty()
    }

    /// Export all capability definitions for the routing layer.
    pub async fn definitions(&self) -> Vec<CapabilityDefinition> {
        let capabilities = self.capabilities.read().await;
        let mut definitions: Vec<CapabilityDefinition> = capabilities
            .values()
            .map(|c| CapabilityDefinition {
                name: c.name().to_string(),
                description: c.description().to_string(),
                parameters: c.parameters().to_value(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Validate `args` against the named capability's schema and execute it.
    ///
    /// Never panics and never returns `Err`: every failure (unknown name,
    /// schema violation, handler error) is folded into the returned
    /// [`Invocation`] envelope. On a validation failure the handler is not
    /// called.
    pub async fn invoke(&self, name: &str, args: Value) -> Invocation {
        let capability = {
            let capabilities = self.capabilities.read().await;
            capabilities.get(name).map(Arc::clone)
        };

        let Some(capability) = capability else {
            let error = CapabilityError::UnknownCapability {
                name: name.to_string(),
            };
            return self.finish(name, Invocation::failure(name, &error)).await;
        };

        if let Err(error) = capability.parameters().validate(&args) {
            debug!(capability = %name, %error, "rejected invocation arguments");
            return self.finish(name, Invocation::failure(name, &error)).await;
        }

        let invocation = match capability.invoke(args).await {
            Ok(payload) => Invocation::success(payload),
            Err(error) => {
                debug!(capability = %name, %error, "capability failed");
                Invocation::failure(name, &error)
            },
        };
        self.finish(name, invocation).await
    }

    /// Record the invocation outcome to the audit sink, if configured.
    async fn finish(&self, name: &str, invocation: Invocation) -> Invocation {
        if let Some(audit) = &self.audit
            && let Err(error) = audit.record(name, &invocation).await
        {
            // Audit failures must not fail the invocation itself.
            warn!(capability = %name, %error, "failed to persist invocation record");
        }
        invocation
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}

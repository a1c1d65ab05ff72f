//! Structured invocation results.

use serde_json::{Value, json};

use crate::error::CapabilityError;

/// The result of one capability invocation, as seen by the routing layer.
///
/// Renders as `{"success": true, ...payload}` on success and
/// `{"success": false, "error": <code>, "message": ...}` on failure. Failure
/// envelopes always carry enough detail to reproduce the call: the
/// capability name plus whatever context the error message embeds (session
/// id, command, path, job id).
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation(Value);

impl Invocation {
    /// Build a success envelope around a handler payload.
    ///
    /// Object payloads are merged with `success: true`; any other payload is
    /// wrapped under a `result` key. A handler-supplied `success` key is
    /// overwritten: the envelope, not the handler, owns that field.
    #[must_use]
    pub fn success(payload: Value) -> Self {
        let mut object = match payload {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("result".to_string(), other);
                map
            },
        };
        object.insert("success".to_string(), Value::Bool(true));
        Self(Value::Object(object))
    }

    /// Build a failure envelope for `capability` from an error.
    #[must_use]
    pub fn failure(capability: &str, error: &CapabilityError) -> Self {
        Self(json!({
            "success": false,
            "error": error.code(),
            "message": error.to_string(),
            "capability": capability,
        }))
    }

    /// Whether this invocation succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.0
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// The failure code, if any.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        if self.is_success() {
            None
        } else {
            self.0.get("error").and_then(Value::as_str)
        }
    }

    /// Borrow the envelope.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Consume into the envelope value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Invocation> for Value {
    fn from(invocation: Invocation) -> Self {
        invocation.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_merges_object_payload() {
        let inv = Invocation::success(json!({"stdout": "hi"}));
        assert!(inv.is_success());
        assert_eq!(inv.value()["stdout"], "hi");
        assert_eq!(inv.value()["success"], json!(true));
    }

    #[test]
    fn success_wraps_scalar_payload() {
        let inv = Invocation::success(json!(42));
        assert!(inv.is_success());
        assert_eq!(inv.value()["result"], 42);
    }

    #[test]
    fn handler_cannot_forge_success_flag() {
        let inv = Invocation::success(json!({"success": false, "ok": 1}));
        assert!(inv.is_success());
    }

    #[test]
    fn failure_carries_code_and_context() {
        let err = CapabilityError::UnknownCapability {
            name: "missing".into(),
        };
        let inv = Invocation::failure("missing", &err);
        assert!(!inv.is_success());
        assert_eq!(inv.error_code(), Some("unknown_capability"));
        assert_eq!(inv.value()["capability"], "missing");
        assert!(
            inv.value()["message"]
                .as_str()
                .unwrap()
                .contains("missing")
        );
    }
}

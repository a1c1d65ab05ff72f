//! The `browser_*` capabilities.

use std::sync::Arc;

use async_trait::async_trait;
use atelier_capabilities::{
    Capability, CapabilityError, CapabilityResult, ParameterSchema, PropertySchema, Registry,
};
use atelier_browser::BrowserSessionManager;
use serde_json::{Value, json};

use super::{browser_error, required_f64, required_str, session_arg};
use crate::error::RuntimeResult;

fn session_schema(action: &str) -> ParameterSchema {
    ParameterSchema::new()
        .property(
            "session_id",
            PropertySchema::string(format!("Browser session to {action}")),
        )
        .required("session_id")
}

fn coordinate_schema(action: &str) -> ParameterSchema {
    session_schema(action)
        .property("x", PropertySchema::number("Horizontal viewport coordinate"))
        .property("y", PropertySchema::number("Vertical viewport coordinate"))
        .required("x")
        .required("y")
}

struct BrowserStart {
    browser: Arc<BrowserSessionManager>,
}

#[async_trait]
impl Capability for BrowserStart {
    fn name(&self) -> &str {
        "browser_start"
    }

    fn description(&self) -> &str {
        "Starts an isolated browser session and navigates it to a URL. \
         Rejects ids that are already active. Idle sessions are expired by \
         the background reaper."
    }

    fn parameters(&self) -> ParameterSchema {
        session_schema("start")
            .property("url", PropertySchema::string("URL to open"))
            .required("url")
    }

    async fn invoke(&self, args: Value) -> CapabilityResult<Value> {
        let session_id = session_arg(&args)?;
        let url = required_str(&args, "url")?;

        self.browser
            .start(&session_id, url)
            .await
            .map_err(browser_error)?;

        Ok(json!({
            "session_id": session_id.as_str(),
            "url": url,
        }))
    }
}

struct BrowserScreenshot {
    browser: Arc<BrowserSessionManager>,
}

#[async_trait]
impl Capability for BrowserScreenshot {
    fn name(&self) -> &str {
        "browser_screenshot"
    }

    fn description(&self) -> &str {
        "Captures the page of a browser session as a base64-encoded image, \
         along with the current URL and cursor position."
    }

    fn parameters(&self) -> ParameterSchema {
        session_schema("capture")
    }

    async fn invoke(&self, args: Value) -> CapabilityResult<Value> {
        let session_id = session_arg(&args)?;
        let shot = self
            .browser
            .screenshot(&session_id)
            .await
            .map_err(browser_error)?;

        let mut payload =
            serde_json::to_value(shot).map_err(|e| CapabilityError::Internal {
                message: e.to_string(),
            })?;
        if let Some(object) = payload.as_object_mut() {
            object.insert("session_id".into(), json!(session_id.as_str()));
        }
        Ok(payload)
    }
}

struct BrowserClick {
    browser: Arc<BrowserSessionManager>,
}

#[async_trait]
impl Capability for BrowserClick {
    fn name(&self) -> &str {
        "browser_click"
    }

    fn description(&self) -> &str {
        "Clicks at viewport coordinates in a browser session."
    }

    fn parameters(&self) -> ParameterSchema {
        coordinate_schema("click in")
    }

    async fn invoke(&self, args: Value) -> CapabilityResult<Value> {
        let session_id = session_arg(&args)?;
        let x = required_f64(&args, "x")?;
        let y = required_f64(&args, "y")?;

        self.browser
            .click(&session_id, x, y)
            .await
            .map_err(browser_error)?;

        Ok(json!({
            "session_id": session_id.as_str(),
            "cursor": { "x": x, "y": y },
        }))
    }
}

struct BrowserType {
    browser: Arc<BrowserSessionManager>,
}

#[async_trait]
impl Capability for BrowserType {
    fn name(&self) -> &str {
        "browser_type"
    }

    fn description(&self) -> &str {
        "Types text into the focused element of a browser session."
    }

    fn parameters(&self) -> ParameterSchema {
        session_schema("type into")
            .property("text", PropertySchema::string("Text to type"))
            .required("text")
    }

    async fn invoke(&self, args: Value) -> CapabilityResult<Value> {
        let session_id = session_arg(&args)?;
        let text = required_str(&args, "text")?;

        self.browser
            .type_text(&session_id, text)
            .await
            .map_err(browser_error)?;

        Ok(json!({
            "session_id": session_id.as_str(),
            "typed": text.len(),
        }))
    }
}

struct BrowserMoveCursor {
    browser: Arc<BrowserSessionManager>,
}

#[async_trait]
impl Capability for BrowserMoveCursor {
    fn name(&self) -> &str {
        "browser_move_cursor"
    }

    fn description(&self) -> &str {
        "Moves the pointer to viewport coordinates in a browser session."
    }

    fn parameters(&self) -> ParameterSchema {
        coordinate_schema("move the cursor in")
    }

    async fn invoke(&self, args: Value) -> CapabilityResult<Value> {
        let session_id = session_arg(&args)?;
        let x = required_f64(&args, "x")?;
        let y = required_f64(&args, "y")?;

        self.browser
            .move_cursor(&session_id, x, y)
            .await
            .map_err(browser_error)?;

        Ok(json!({
            "session_id": session_id.as_str(),
            "cursor": { "x": x, "y": y },
        }))
    }
}

struct BrowserNavigate {
    browser: Arc<BrowserSessionManager>,
}

#[async_trait]
impl Capability for BrowserNavigate {
    fn name(&self) -> &str {
        "browser_navigate"
    }

    fn description(&self) -> &str {
        "Navigates an existing browser session to a new URL."
    }

    fn parameters(&self) -> ParameterSchema {
        session_schema("navigate")
            .property("url", PropertySchema::string("URL to open"))
            .required("url")
    }

    async fn invoke(&self, args: Value) -> CapabilityResult<Value> {
        let session_id = session_arg(&args)?;
        let url = required_str(&args, "url")?;

        self.browser
            .navigate(&session_id, url)
            .await
            .map_err(browser_error)?;

        Ok(json!({
            "session_id": session_id.as_str(),
            "url": url,
        }))
    }
}

struct BrowserClose {
    browser: Arc<BrowserSessionManager>,
}

#[async_trait]
impl Capability for BrowserClose {
    fn name(&self) -> &str {
        "browser_close"
    }

    fn description(&self) -> &str {
        "Closes a browser session, releasing its engine instance."
    }

    fn parameters(&self) -> ParameterSchema {
        session_schema("close")
    }

    async fn invoke(&self, args: Value) -> CapabilityResult<Value> {
        let session_id = session_arg(&args)?;
        self.browser
            .close(&session_id)
            .await
            .map_err(browser_error)?;

        Ok(json!({ "session_id": session_id.as_str(), "closed": true }))
    }
}

/// Register the browser capabilities bound to `browser`.
pub(crate) async fn register_browser_capabilities(
    registry: &Registry,
    browser: &Arc<BrowserSessionManager>,
) -> RuntimeResult<()> {
    registry
        .register(Arc::new(BrowserStart {
            browser: Arc::clone(browser),
        }))
        .await?;
    registry
        .register(Arc::new(BrowserScreenshot {
            browser: Arc::clone(browser),
        }))
        .await?;
    registry
        .register(Arc::new(BrowserClick {
            browser: Arc::clone(browser),
        }))
        .await?;
    registry
        .register(Arc::new(BrowserType {
            browser: Arc::clone(browser),
        }))
        .await?;
    registry
        .register(Arc::new(BrowserMoveCursor {
            browser: Arc::clone(browser),
        }))
        .await?;
    registry
        .register(Arc::new(BrowserNavigate {
            browser: Arc::clone(browser),
        }))
        .await?;
    registry
        .register(Arc::new(BrowserClose {
            browser: Arc::clone(browser),
        }))
        .await?;
    Ok(())
}

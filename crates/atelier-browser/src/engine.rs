//! The browser-engine boundary.
//!
//! The hosting environment supplies an engine; this crate treats it as a
//! black box satisfying launch/navigate/screenshot/interact. See
//! [`crate::mock`] for the scripted engine used in tests.

use async_trait::async_trait;

use crate::error::BrowserResult;

/// Factory for isolated browser instances.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Launch a fresh, isolated browser instance and return its page handle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BrowserError::Unavailable`] if an instance cannot be
    /// allocated.
    async fn launch(&self) -> BrowserResult<Box<dyn PageHandle>>;
}

/// Handle to one live browser page.
///
/// At most one handle exists per session; the manager owns it and closes it
/// exactly once, on explicit `close` or expiry.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Navigate to a URL.
    async fn navigate(&mut self, url: &str) -> BrowserResult<()>;

    /// The page's current URL.
    async fn current_url(&self) -> BrowserResult<String>;

    /// Capture the page as an encoded image (PNG bytes).
    async fn screenshot(&mut self) -> BrowserResult<Vec<u8>>;

    /// Click at viewport coordinates.
    async fn click(&mut self, x: f64, y: f64) -> BrowserResult<()>;

    /// Type text into the focused element.
    async fn type_text(&mut self, text: &str) -> BrowserResult<()>;

    /// Move the pointer to viewport coordinates.
    async fn move_cursor(&mut self, x: f64, y: f64) -> BrowserResult<()>;

    /// Release the underlying browser instance.
    async fn close(&mut self) -> BrowserResult<()>;
}

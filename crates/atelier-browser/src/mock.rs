//! Scripted browser engine for tests and offline development.
//!
//! Records every page operation, counts live instances, and can be
//! configured to refuse launches, so lifecycle behavior (close-before-remove,
//! leak-free rejection, expiry) is observable from the outside.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::engine::{BrowserEngine, PageHandle};
use crate::error::{BrowserError, BrowserResult};

/// A minimal valid PNG header, stands in for real screenshot bytes.
const FAKE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, Default)]
struct MockState {
    launched: AtomicUsize,
    closed: AtomicUsize,
    actions: Mutex<Vec<String>>,
}

impl MockState {
    fn record(&self, action: String) {
        if let Ok(mut actions) = self.actions.lock() {
            actions.push(action);
        }
    }
}

/// A scripted [`BrowserEngine`].
#[derive(Debug, Default)]
pub struct MockEngine {
    state: Arc<MockState>,
    refuse_launch: bool,
}

impl MockEngine {
    /// An engine that launches successfully.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that refuses every launch, simulating exhausted resources.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            state: Arc::new(MockState::default()),
            refuse_launch: true,
        }
    }

    /// Number of instances launched and not yet closed.
    #[must_use]
    pub fn live_instances(&self) -> usize {
        self.state
            .launched
            .load(Ordering::SeqCst)
            .saturating_sub(self.state.closed.load(Ordering::SeqCst))
    }

    /// Every page operation performed so far, in order.
    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        self.state
            .actions
            .lock()
            .map(|actions| actions.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BrowserEngine for MockEngine {
    async fn launch(&self) -> BrowserResult<Box<dyn PageHandle>> {
        if self.refuse_launch {
            return Err(BrowserError::Unavailable {
                message: "mock engine configured to refuse launches".into(),
            });
        }
        self.state.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPage {
            state: Arc::clone(&self.state),
            url: String::new(),
            closed: false,
        }))
    }
}

/// Page handle produced by [`MockEngine`].
struct MockPage {
    state: Arc<MockState>,
    url: String,
    closed: bool,
}

impl MockPage {
    fn ensure_open(&self) -> BrowserResult<()> {
        if self.closed {
            Err(BrowserError::Page {
                message: "page already closed".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PageHandle for MockPage {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.ensure_open()?;
        self.state.record(format!("navigate:{url}"));
        self.url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> BrowserResult<String> {
        self.ensure_open()?;
        Ok(self.url.clone())
    }

    async fn screenshot(&mut self) -> BrowserResult<Vec<u8>> {
        self.ensure_open()?;
        self.state.record("screenshot".to_string());
        Ok(FAKE_PNG.to_vec())
    }

    async fn click(&mut self, x: f64, y: f64) -> BrowserResult<()> {
        self.ensure_open()?;
        self.state.record(format!("click:{x},{y}"));
        Ok(())
    }

    async fn type_text(&mut self, text: &str) -> BrowserResult<()> {
        self.ensure_open()?;
        self.state.record(format!("type_text:{text}"));
        Ok(())
    }

    async fn move_cursor(&mut self, x: f64, y: f64) -> BrowserResult<()> {
        self.ensure_open()?;
        self.state.record(format!("move_cursor:{x},{y}"));
        Ok(())
    }

    async fn close(&mut self) -> BrowserResult<()> {
        if !self.closed {
            self.closed = true;
            self.state.closed.fetch_add(1, Ordering::SeqCst);
            self.state.record("close".to_string());
        }
        Ok(())
    }
}

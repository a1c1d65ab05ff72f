//! The browser session manager and its reaper.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use atelier_core::SessionId;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::engine::{BrowserEngine, PageHandle};
use crate::error::{BrowserError, BrowserResult};

/// Lifetime policy for browser sessions.
#[derive(Debug, Clone, Copy)]
pub struct BrowserLimits {
    /// Maximum session age before the reaper expires it.
    pub max_age: Duration,
    /// How often the reaper sweeps the session table.
    pub sweep_interval: Duration,
}

impl Default for BrowserLimits {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(30 * 60),
        }
    }
}

/// Last known pointer position within a session's viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CursorPosition {
    /// Horizontal coordinate in CSS pixels.
    pub x: f64,
    /// Vertical coordinate in CSS pixels.
    pub y: f64,
}

/// An encoded page capture plus the state needed to act on it.
#[derive(Debug, Clone, Serialize)]
pub struct Screenshot {
    /// Base64-encoded PNG image.
    pub image_base64: String,
    /// The page's current URL.
    pub url: String,
    /// Last known cursor position.
    pub cursor: CursorPosition,
}

/// Metadata about one active session.
#[derive(Debug, Clone, Serialize)]
pub struct BrowserSessionInfo {
    /// The session id.
    pub id: SessionId,
    /// When the session was started.
    pub created_at: DateTime<Utc>,
    /// Session age in seconds.
    pub age_secs: u64,
}

/// One active browser session.
struct BrowserSession {
    page: Box<dyn PageHandle>,
    cursor: CursorPosition,
    created_at: DateTime<Utc>,
    // Monotonic twin of `created_at` used for expiry math.
    opened: Instant,
}

type SessionTable = HashMap<SessionId, Arc<Mutex<BrowserSession>>>;

/// Owns isolated browser sessions with screenshot/interaction operations and
/// time-based expiry.
///
/// Cloning the manager creates a new handle to the same session table, so a
/// reaper task and request handlers share state without globals. Distinct
/// sessions operate concurrently: the table lock is only held to look up or
/// mutate the table itself, while page operations serialize per session.
pub struct BrowserSessionManager {
    engine: Arc<dyn BrowserEngine>,
    sessions: Arc<RwLock<SessionTable>>,
    limits: BrowserLimits,
}

impl Clone for BrowserSessionManager {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            sessions: Arc::clone(&self.sessions),
            limits: self.limits,
        }
    }
}

impl BrowserSessionManager {
    /// Create a manager over the given engine with the given lifetime policy.
    #[must_use]
    pub fn new(engine: Arc<dyn BrowserEngine>, limits: BrowserLimits) -> Self {
        Self {
            engine,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            limits,
        }
    }

    /// The configured lifetime policy.
    #[must_use]
    pub fn limits(&self) -> BrowserLimits {
        self.limits
    }

    /// Start a session: launch an isolated browser instance and navigate it
    /// to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::SessionExists`] if the id is already active
    /// (overwriting would leak the live engine handle),
    /// [`BrowserError::Unavailable`] if the engine cannot allocate an
    /// instance, and [`BrowserError::Page`] if the initial navigation fails
    /// (the instance is released before returning).
    pub async fn start(&self, id: &SessionId, url: &str) -> BrowserResult<()> {
        if self.sessions.read().await.contains_key(id) {
            return Err(BrowserError::SessionExists {
                session: id.to_string(),
            });
        }

        // Launch outside the table lock; slow engine startup must not block
        // unrelated sessions.
        let mut page = self.engine.launch().await?;
        if let Err(e) = page.navigate(url).await {
            let _ = page.close().await;
            return Err(e);
        }

        let session = BrowserSession {
            page,
            cursor: CursorPosition::default(),
            created_at: Utc::now(),
            opened: Instant::now(),
        };

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(id) {
            // Lost the race to a concurrent start with the same id.
            drop(sessions);
            let mut session = session;
            let _ = session.page.close().await;
            return Err(BrowserError::SessionExists {
                session: id.to_string(),
            });
        }
        info!(session = %id, %url, "started browser session");
        sessions.insert(id.clone(), Arc::new(Mutex::new(session)));
        Ok(())
    }

    /// Look up an active session.
    async fn get(&self, id: &SessionId) -> BrowserResult<Arc<Mutex<BrowserSession>>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .map(Arc::clone)
            .ok_or_else(|| BrowserError::SessionNotFound {
                session: id.to_string(),
            })
    }

    /// Capture the page as an encoded image plus current URL and cursor
    /// state.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::SessionNotFound`] for an unknown id, or the
    /// engine's failure.
    pub async fn screenshot(&self, id: &SessionId) -> BrowserResult<Screenshot> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        let image = session.page.screenshot().await?;
        let url = session.page.current_url().await?;
        Ok(Screenshot {
            image_base64: BASE64.encode(image),
            url,
            cursor: session.cursor,
        })
    }

    /// Navigate an existing session to a new URL.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::SessionNotFound`] for an unknown id, or the
    /// engine's failure.
    pub async fn navigate(&self, id: &SessionId, url: &str) -> BrowserResult<()> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        session.page.navigate(url).await
    }

    /// Click at viewport coordinates, updating the cursor state.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::SessionNotFound`] for an unknown id, or the
    /// engine's failure.
    pub async fn click(&self, id: &SessionId, x: f64, y: f64) -> BrowserResult<()> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        session.page.click(x, y).await?;
        session.cursor = CursorPosition { x, y };
        Ok(())
    }

    /// Type text into the focused element.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::SessionNotFound`] for an unknown id, or the
    /// engine's failure.
    pub async fn type_text(&self, id: &SessionId, text: &str) -> BrowserResult<()> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        session.page.type_text(text).await
    }

    /// Move the pointer, updating the cursor state.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::SessionNotFound`] for an unknown id, or the
    /// engine's failure.
    pub async fn move_cursor(&self, id: &SessionId, x: f64, y: f64) -> BrowserResult<()> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        session.page.move_cursor(x, y).await?;
        session.cursor = CursorPosition { x, y };
        Ok(())
    }

    /// Explicitly close a session, releasing its engine handle.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::SessionNotFound`] for an unknown id. Engine
    /// close failures are logged, not returned: the record is gone either
    /// way.
    pub async fn close(&self, id: &SessionId) -> BrowserResult<()> {
        let removed = self.sessions.write().await.remove(id);
        let Some(session) = removed else {
            return Err(BrowserError::SessionNotFound {
                session: id.to_string(),
            });
        };
        let mut session = session.lock().await;
        if let Err(e) = session.page.close().await {
            warn!(session = %id, error = %e, "engine close failed");
        }
        info!(session = %id, "closed browser session");
        Ok(())
    }

    /// Metadata for every active session, oldest first.
    pub async fn active_sessions(&self) -> Vec<BrowserSessionInfo> {
        let sessions = self.sessions.read().await;
        let mut infos = Vec::with_capacity(sessions.len());
        for (id, session) in sessions.iter() {
            let session = session.lock().await;
            infos.push(BrowserSessionInfo {
                id: id.clone(),
                created_at: session.created_at,
                age_secs: session.opened.elapsed().as_secs(),
            });
        }
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        infos
    }

    /// Expire every session older than the configured max age.
    ///
    /// For each expired session the engine handle is closed first, then the
    /// record is removed. A close failure is logged and the record removed
    /// anyway; a failing handle must not pin the session forever. Returns
    /// the ids that were expired.
    pub async fn reap_expired(&self) -> Vec<SessionId> {
        let max_age = self.limits.max_age;
        let expired: Vec<(SessionId, Arc<Mutex<BrowserSession>>)> = {
            let sessions = self.sessions.read().await;
            let mut found = Vec::new();
            for (id, session) in sessions.iter() {
                let locked = session.lock().await;
                if locked.opened.elapsed() > max_age {
                    found.push((id.clone(), Arc::clone(session)));
                }
            }
            found
        };

        let mut reaped = Vec::with_capacity(expired.len());
        for (id, session) in expired {
            {
                let mut session = session.lock().await;
                if let Err(e) = session.page.close().await {
                    warn!(session = %id, error = %e, "engine close failed during reap");
                }
            }
            // Remove only the session we just closed; the id may have been
            // closed and restarted concurrently.
            let mut sessions = self.sessions.write().await;
            let unchanged = sessions
                .get(&id)
                .is_some_and(|current| Arc::ptr_eq(current, &session));
            if unchanged {
                sessions.remove(&id);
            }
            drop(sessions);
            info!(session = %id, "expired browser session");
            reaped.push(id);
        }
        reaped
    }

    /// Spawn the background reaper: a fixed-interval sweep over the session
    /// table, independent of request handling.
    ///
    /// The task runs until aborted; dropping the returned handle does not
    /// stop it.
    #[must_use]
    pub fn spawn_reaper(&self) -> tokio::task::JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(manager.limits.sweep_interval);
            // The first tick completes immediately; skip it so a fresh
            // manager does not sweep before any session could age.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let reaped = manager.reap_expired().await;
                if !reaped.is_empty() {
                    debug!(count = reaped.len(), "reaper sweep expired sessions");
                }
            }
        })
    }
}

impl std::fmt::Debug for BrowserSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserSessionManager")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEngine;

    fn sid(id: &str) -> SessionId {
        SessionId::new(id).unwrap()
    }

    fn manager_with(limits: BrowserLimits) -> (BrowserSessionManager, Arc<MockEngine>) {
        let engine = Arc::new(MockEngine::new());
        let manager = BrowserSessionManager::new(
            Arc::clone(&engine) as Arc<dyn BrowserEngine>,
            limits,
        );
        (manager, engine)
    }

    fn quick_limits() -> BrowserLimits {
        BrowserLimits {
            max_age: Duration::from_millis(250),
            sweep_interval: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn start_screenshot_close() {
        let (manager, _engine) = manager_with(BrowserLimits::default());
        let id = sid("b1");
        manager.start(&id, "https://example.com").await.unwrap();

        let shot = manager.screenshot(&id).await.unwrap();
        assert_eq!(shot.url, "https://example.com");
        assert!(!shot.image_base64.is_empty());
        assert_eq!(shot.cursor, CursorPosition::default());

        manager.close(&id).await.unwrap();
        assert!(matches!(
            manager.screenshot(&id).await,
            Err(BrowserError::SessionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn start_on_active_id_rejects() {
        let (manager, engine) = manager_with(BrowserLimits::default());
        let id = sid("b1");
        manager.start(&id, "https://example.com").await.unwrap();

        let err = manager.start(&id, "https://other.com").await.unwrap_err();
        assert!(matches!(err, BrowserError::SessionExists { .. }));
        // The rejected start must not leak a live instance.
        assert_eq!(engine.live_instances(), 1);
    }

    #[tokio::test]
    async fn interactions_update_cursor() {
        let (manager, _engine) = manager_with(BrowserLimits::default());
        let id = sid("b1");
        manager.start(&id, "https://example.com").await.unwrap();

        manager.click(&id, 10.0, 20.0).await.unwrap();
        let shot = manager.screenshot(&id).await.unwrap();
        assert_eq!(shot.cursor, CursorPosition { x: 10.0, y: 20.0 });

        manager.move_cursor(&id, 5.0, 6.0).await.unwrap();
        let shot = manager.screenshot(&id).await.unwrap();
        assert_eq!(shot.cursor, CursorPosition { x: 5.0, y: 6.0 });
    }

    #[tokio::test]
    async fn navigate_changes_url() {
        let (manager, _engine) = manager_with(BrowserLimits::default());
        let id = sid("b1");
        manager.start(&id, "https://example.com").await.unwrap();
        manager.navigate(&id, "https://example.com/next").await.unwrap();

        let shot = manager.screenshot(&id).await.unwrap();
        assert_eq!(shot.url, "https://example.com/next");
    }

    #[tokio::test]
    async fn type_text_reaches_engine() {
        let (manager, engine) = manager_with(BrowserLimits::default());
        let id = sid("b1");
        manager.start(&id, "https://example.com").await.unwrap();
        manager.type_text(&id, "hello").await.unwrap();
        assert!(
            engine
                .actions()
                .iter()
                .any(|a| a == "type_text:hello")
        );
    }

    #[tokio::test]
    async fn close_releases_engine_handle() {
        let (manager, engine) = manager_with(BrowserLimits::default());
        let id = sid("b1");
        manager.start(&id, "https://example.com").await.unwrap();
        assert_eq!(engine.live_instances(), 1);

        manager.close(&id).await.unwrap();
        assert_eq!(engine.live_instances(), 0);
    }

    #[tokio::test]
    async fn unavailable_engine_surfaces_as_resource_error() {
        let engine = Arc::new(MockEngine::unavailable());
        let manager =
            BrowserSessionManager::new(engine as Arc<dyn BrowserEngine>, BrowserLimits::default());
        let err = manager
            .start(&sid("b1"), "https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, BrowserError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn reap_expires_only_old_sessions() {
        let (manager, engine) = manager_with(quick_limits());
        manager.start(&sid("old"), "https://a").await.unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        manager.start(&sid("young"), "https://b").await.unwrap();

        let reaped = manager.reap_expired().await;
        assert_eq!(reaped, vec![sid("old")]);
        assert_eq!(engine.live_instances(), 1);

        let remaining = manager.active_sessions().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, sid("young"));
    }

    #[tokio::test]
    async fn session_lives_until_max_age_and_dies_by_next_sweep() {
        let (manager, _engine) = manager_with(quick_limits());
        let reaper = manager.spawn_reaper();

        let id = sid("b1");
        manager.start(&id, "https://example.com").await.unwrap();

        // Still active well before max_age.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(manager.screenshot(&id).await.is_ok());

        // Expired by max_age + sweep_interval (plus slack for CI jitter).
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(matches!(
            manager.screenshot(&id).await,
            Err(BrowserError::SessionNotFound { .. })
        ));

        reaper.abort();
    }

    #[tokio::test]
    async fn expired_id_can_be_started_again() {
        let (manager, _engine) = manager_with(quick_limits());
        let id = sid("b1");
        manager.start(&id, "https://a").await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        manager.reap_expired().await;

        manager.start(&id, "https://b").await.unwrap();
        let shot = manager.screenshot(&id).await.unwrap();
        assert_eq!(shot.url, "https://b");
    }

    #[tokio::test]
    async fn reads_tolerated_while_sweeping() {
        let (manager, _engine) = manager_with(quick_limits());
        manager.start(&sid("b1"), "https://a").await.unwrap();

        // A sweep and a listing racing must both complete.
        let sweeper = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.reap_expired().await })
        };
        let reader = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.active_sessions().await })
        };
        sweeper.await.unwrap();
        reader.await.unwrap();
    }
}

//! The sandbox execution manager.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use atelier_core::SessionId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::process::Command;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{SandboxError, SandboxResult};
use crate::session::SandboxSession;

/// Options for [`SandboxManager::execute_shell`].
#[derive(Debug, Clone)]
pub struct ShellOptions {
    /// The session to run in (created lazily if absent).
    pub session_id: SessionId,
    /// Working directory, relative to the session root. Defaults to the root.
    pub cwd: Option<String>,
    /// Explicit deadline. There is no implicit timeout; when the deadline
    /// elapses the child is killed and [`SandboxError::Timeout`] is returned.
    pub timeout: Option<Duration>,
}

impl ShellOptions {
    /// Options for a session with default cwd and no deadline.
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            cwd: None,
            timeout: None,
        }
    }

    /// Set the working directory (resolved inside the session root).
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set an explicit execution deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Captured result of a shell command.
///
/// A non-zero exit code is not an error at this layer: the command ran, and
/// the caller decides whether its exit status is fatal.
#[derive(Debug, Clone, Serialize)]
pub struct ShellOutcome {
    /// Process exit code (`-1` if terminated by a signal).
    pub exit_code: i32,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ShellOutcome {
    /// Whether the command exited zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
    /// Anything else (symlink, socket, ...).
    Other,
}

/// One entry returned by [`SandboxManager::list_files`].
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// Entry name (single path component).
    pub name: String,
    /// Entry kind.
    pub kind: FileKind,
}

/// Metadata about a live session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    /// The session id.
    pub id: SessionId,
    /// When the session was first used.
    pub created_at: DateTime<Utc>,
}

/// Owns isolated sessions that run shell commands and read/write files
/// under session-private roots.
///
/// The session table is owned by the manager and injected where needed, not
/// reached through globals, so lifetime and concurrency discipline stay
/// explicit and testable.
pub struct SandboxManager {
    root: PathBuf,
    sessions: RwLock<HashMap<SessionId, Arc<SandboxSession>>>,
}

impl SandboxManager {
    /// Create a manager over the host-supplied sandbox root.
    ///
    /// The root itself is created on first session use, not here.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The sandbox root under which all session roots live.
    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Get the session for `id`, creating it (and its root directory) on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the session directory cannot be created.
    pub async fn session(&self, id: &SessionId) -> SandboxResult<Arc<SandboxSession>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(id) {
                return Ok(Arc::clone(session));
            }
        }

        let mut sessions = self.sessions.write().await;
        // Re-check: another task may have created it between the locks.
        if let Some(session) = sessions.get(id) {
            return Ok(Arc::clone(session));
        }

        let root = self.root.join(id.as_str());
        tokio::fs::create_dir_all(&root).await?;
        info!(session = %id, root = %root.display(), "created sandbox session");

        let session = Arc::new(SandboxSession::new(id.clone(), root));
        sessions.insert(id.clone(), Arc::clone(&session));
        Ok(session)
    }

    /// Snapshot of live sessions.
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        let sessions = self.sessions.read().await;
        let mut infos: Vec<SessionInfo> = sessions
            .values()
            .map(|s| SessionInfo {
                id: s.id().clone(),
                created_at: s.created_at(),
            })
            .collect();
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        infos
    }

    /// Run a shell command in a session.
    ///
    /// The command runs under `bash -c` with the session root as working
    /// directory unless `cwd` is given (itself confined to the root).
    /// Stdout, stderr, and the exit code are captured and returned; a
    /// non-zero exit is data, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::PathEscape`] for an out-of-root `cwd`,
    /// [`SandboxError::Spawn`] if the shell cannot be started, and
    /// [`SandboxError::Timeout`] if an explicit deadline elapses (the child
    /// is killed).
    pub async fn execute_shell(
        &self,
        command: &str,
        options: ShellOptions,
    ) -> SandboxResult<ShellOutcome> {
        let session = self.session(&options.session_id).await?;
        let cwd = match &options.cwd {
            Some(dir) => {
                let resolved = session.resolve(dir)?;
                tokio::fs::create_dir_all(&resolved).await?;
                resolved
            },
            None => session.root().to_path_buf(),
        };

        debug!(session = %options.session_id, %command, cwd = %cwd.display(), "executing shell command");

        let mut child = Command::new("bash");
        child
            .arg("-c")
            .arg(command)
            .current_dir(&cwd)
            .kill_on_drop(true);

        let output = match options.timeout {
            Some(deadline) => tokio::time::timeout(deadline, child.output())
                .await
                .map_err(|_| SandboxError::Timeout {
                    millis: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                })?,
            None => child.output().await,
        }
        .map_err(|e| SandboxError::Spawn {
            message: e.to_string(),
        })?;

        Ok(ShellOutcome {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    /// Write `content` to a file inside a session, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::PathEscape`] for out-of-root paths, or an I/O
    /// error if the write fails.
    pub async fn write_file(
        &self,
        session_id: &SessionId,
        path: &str,
        content: &str,
    ) -> SandboxResult<()> {
        let session = self.session(session_id).await?;
        let resolved = session.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&resolved, content).await?;
        debug!(session = %session_id, path = %resolved.display(), "wrote file");
        Ok(())
    }

    /// Read a file from inside a session.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::PathEscape`] for out-of-root paths,
    /// [`SandboxError::PathNotFound`] if the file does not exist, or an I/O
    /// error if the read fails.
    pub async fn read_file(&self, session_id: &SessionId, path: &str) -> SandboxResult<String> {
        let session = self.session(session_id).await?;
        let resolved = session.resolve(path)?;
        if !resolved.exists() {
            return Err(SandboxError::PathNotFound {
                session: session_id.to_string(),
                path: path.to_string(),
            });
        }
        Ok(tokio::fs::read_to_string(&resolved).await?)
    }

    /// List the direct children of a directory inside a session, sorted by
    /// name.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::PathEscape`] for out-of-root paths,
    /// [`SandboxError::PathNotFound`] if the directory does not exist, or an
    /// I/O error if the listing fails.
    pub async fn list_files(
        &self,
        session_id: &SessionId,
        directory: &str,
    ) -> SandboxResult<Vec<FileEntry>> {
        let session = self.session(session_id).await?;
        let resolved = session.resolve(directory)?;
        if !resolved.exists() {
            return Err(SandboxError::PathNotFound {
                session: session_id.to_string(),
                path: directory.to_string(),
            });
        }

        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(&resolved).await?;
        while let Some(entry) = reader.next_entry().await? {
            let file_type = entry.file_type().await?;
            let kind = if file_type.is_dir() {
                FileKind::Directory
            } else if file_type.is_file() {
                FileKind::File
            } else {
                FileKind::Other
            };
            entries.push(FileEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                kind,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

impl std::fmt::Debug for SandboxManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxManager")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager() -> (SandboxManager, TempDir) {
        let dir = TempDir::new().unwrap();
        (SandboxManager::new(dir.path()), dir)
    }

    fn sid(id: &str) -> SessionId {
        SessionId::new(id).unwrap()
    }

    #[tokio::test]
    async fn shell_captures_stdout() {
        let (manager, _dir) = manager();
        let outcome = manager
            .execute_shell("echo hello", ShellOptions::new(sid("s1")))
            .await
            .unwrap();
        assert!(outcome.success());
        assert!(outcome.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn shell_captures_nonzero_exit_as_data() {
        let (manager, _dir) = manager();
        let outcome = manager
            .execute_shell("echo oops >&2; exit 42", ShellOptions::new(sid("s1")))
            .await
            .unwrap();
        assert!(!outcome.success());
        assert_eq!(outcome.exit_code, 42);
        assert!(outcome.stderr.contains("oops"));
    }

    #[tokio::test]
    async fn shell_runs_in_session_root_by_default() {
        let (manager, dir) = manager();
        let outcome = manager
            .execute_shell("pwd", ShellOptions::new(sid("s1")))
            .await
            .unwrap();
        let expected = dir.path().join("s1");
        // Compare canonicalized: macOS tempdirs live behind /private symlinks.
        let printed = std::path::PathBuf::from(outcome.stdout.trim());
        assert_eq!(
            printed.canonicalize().unwrap(),
            expected.canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn shell_honors_cwd_inside_root() {
        let (manager, _dir) = manager();
        let outcome = manager
            .execute_shell(
                "pwd",
                ShellOptions::new(sid("s1")).with_cwd("work/sub"),
            )
            .await
            .unwrap();
        assert!(outcome.stdout.trim().ends_with("work/sub"));
    }

    #[tokio::test]
    async fn shell_rejects_cwd_escape() {
        let (manager, _dir) = manager();
        let result = manager
            .execute_shell("pwd", ShellOptions::new(sid("s1")).with_cwd("../s2"))
            .await;
        assert!(matches!(result, Err(SandboxError::PathEscape { .. })));
    }

    #[tokio::test]
    async fn shell_explicit_timeout_kills_command() {
        let (manager, _dir) = manager();
        let result = manager
            .execute_shell(
                "sleep 5",
                ShellOptions::new(sid("s1")).with_timeout(Duration::from_millis(100)),
            )
            .await;
        assert!(matches!(result, Err(SandboxError::Timeout { millis: 100 })));
    }

    #[tokio::test]
    async fn file_round_trip() {
        let (manager, _dir) = manager();
        let id = sid("s1");
        manager
            .write_file(&id, "notes/hello.txt", "hi there")
            .await
            .unwrap();
        let content = manager.read_file(&id, "notes/hello.txt").await.unwrap();
        assert_eq!(content, "hi there");
    }

    #[tokio::test]
    async fn sessions_cannot_see_each_other() {
        let (manager, _dir) = manager();
        manager
            .write_file(&sid("s1"), "secret.txt", "s1 only")
            .await
            .unwrap();

        // s2 has its own root: the file is simply not there...
        let result = manager.read_file(&sid("s2"), "secret.txt").await;
        assert!(matches!(result, Err(SandboxError::PathNotFound { .. })));

        // ...and reaching over via `..` is rejected outright.
        let result = manager.read_file(&sid("s2"), "../s1/secret.txt").await;
        assert!(matches!(result, Err(SandboxError::PathEscape { .. })));

        // Shell commands are likewise isolated per session root.
        let outcome = manager
            .execute_shell("ls", ShellOptions::new(sid("s2")))
            .await
            .unwrap();
        assert!(!outcome.stdout.contains("secret.txt"));
    }

    #[tokio::test]
    async fn write_rejects_escaping_paths() {
        let (manager, _dir) = manager();
        let result = manager
            .write_file(&sid("s1"), "../outside.txt", "nope")
            .await;
        assert!(matches!(result, Err(SandboxError::PathEscape { .. })));
    }

    #[tokio::test]
    async fn list_files_reports_names_and_kinds() {
        let (manager, _dir) = manager();
        let id = sid("s1");
        manager.write_file(&id, "b.txt", "b").await.unwrap();
        manager.write_file(&id, "a/inner.txt", "a").await.unwrap();

        let entries = manager.list_files(&id, "").await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b.txt"]);
        assert_eq!(entries[0].kind, FileKind::Directory);
        assert_eq!(entries[1].kind, FileKind::File);
    }

    #[tokio::test]
    async fn list_files_missing_directory() {
        let (manager, _dir) = manager();
        let result = manager.list_files(&sid("s1"), "nope").await;
        assert!(matches!(result, Err(SandboxError::PathNotFound { .. })));
    }

    #[tokio::test]
    async fn session_is_created_lazily_and_reused() {
        let (manager, _dir) = manager();
        assert!(manager.sessions().await.is_empty());

        let id = sid("s1");
        let first = manager.session(&id).await.unwrap();
        let second = manager.session(&id).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.sessions().await.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_first_use_creates_one_session() {
        let (manager, _dir) = manager();
        let manager = Arc::new(manager);
        let id = sid("s1");

        let mut handles = Vec::new();
        for _ in 0..16 {
            let manager = Arc::clone(&manager);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                manager.session(&id).await.unwrap();
            }));
        }
        futures::future::join_all(handles).await;

        assert_eq!(manager.sessions().await.len(), 1);
    }
}

//! A single sandbox session and its path containment rules.

use atelier_core::SessionId;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};

use crate::error::{SandboxError, SandboxResult};

/// One isolated execution context with a private filesystem scope.
#[derive(Debug, Clone)]
pub struct SandboxSession {
    id: SessionId,
    root: PathBuf,
    created_at: DateTime<Utc>,
}

impl SandboxSession {
    /// Create a session rooted at `root`.
    pub(crate) fn new(id: SessionId, root: PathBuf) -> Self {
        Self {
            id,
            root,
            created_at: Utc::now(),
        }
    }

    /// The session id.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The session's private root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// When the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Resolve a caller-supplied path inside this session's root.
    ///
    /// Relative paths are joined onto the root; absolute paths are accepted
    /// only if they already point inside it. The joined path is normalized
    /// lexically (`.` removed, `..` popped) so containment is enforced even
    /// for targets that do not exist yet; a `..` that would climb past the
    /// root is rejected.
    ///
    /// Symlinks inside the root are not chased. The root directory is
    /// private to the process, so a symlink can only exist if a sandboxed
    /// command created it: same-session interference, which is the caller's
    /// domain (see crate docs).
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::PathEscape`] if the path would leave the
    /// session root.
    pub fn resolve(&self, raw: &str) -> SandboxResult<PathBuf> {
        let escape = || SandboxError::PathEscape {
            session: self.id.to_string(),
            path: raw.to_string(),
        };

        let candidate = Path::new(raw);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };

        let mut normalized = PathBuf::new();
        for component in joined.components() {
            match component {
                Component::CurDir => {},
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(escape());
                    }
                },
                other => normalized.push(other),
            }
        }

        if normalized.starts_with(&self.root) {
            Ok(normalized)
        } else {
            Err(escape())
        }
    }
}

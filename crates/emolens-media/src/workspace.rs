//! Request-scoped temporary storage.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error};

use emolens_models::RequestToken;

use crate::error::MediaResult;

/// Temporary directory owned by a single pipeline invocation.
///
/// The directory is keyed by a fresh [`RequestToken`], so concurrent
/// requests can never write to the same path. Cleanup is idempotent:
/// `cleanup()` removes the tree exactly once, and `Drop` performs a
/// best-effort removal for paths that exit early (panic, client abort),
/// so no invocation leaks its temporaries.
#[derive(Debug)]
pub struct RequestWorkspace {
    token: RequestToken,
    root: PathBuf,
    cleaned: AtomicBool,
}

impl RequestWorkspace {
    /// Create a new workspace under `base_dir`.
    pub async fn create(base_dir: impl AsRef<Path>) -> MediaResult<Self> {
        let token = RequestToken::new();
        let root = base_dir.as_ref().join(token.as_str());
        tokio::fs::create_dir_all(&root).await?;
        debug!(token = %token, path = %root.display(), "Created request workspace");
        Ok(Self {
            token,
            root,
            cleaned: AtomicBool::new(false),
        })
    }

    /// The request token keying this workspace.
    pub fn token(&self) -> &RequestToken {
        &self.token
    }

    /// The workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for a file inside the workspace.
    pub fn path_for(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }

    /// Remove the workspace tree.
    ///
    /// Idempotent: a second call is a no-op. A deletion failure is
    /// surfaced to the caller (and logged) but leaves the workspace
    /// marked clean so `Drop` does not retry forever.
    pub async fn cleanup(&self) -> MediaResult<()> {
        if self.cleaned.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => {
                debug!(token = %self.token, "Removed request workspace");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!(
                    token = %self.token,
                    path = %self.root.display(),
                    error = %e,
                    "Failed to remove request workspace"
                );
                Err(e.into())
            }
        }
    }
}

impl Drop for RequestWorkspace {
    fn drop(&mut self) {
        if self.cleaned.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            if e.kind() != std::io::ErrorKind::NotFound {
                error!(
                    token = %self.token,
                    path = %self.root.display(),
                    error = %e,
                    "Failed to remove request workspace on drop"
                );
            }
        }
    }
}

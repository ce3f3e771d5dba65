//! Credential Store.
//!
//! The session bundle lives in a single JSON blob at a fixed path. A missing
//! file is the normal "never logged in" state. An unreadable or empty blob is
//! treated the same way: it is deleted and reported as absent so the caller
//! logs in again instead of failing.

use slotwatch_core::CredentialBundle;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::error::StoreError;
use crate::persistence::{load_json, remove_file, save_json};

/// File name of the credential blob inside the state directory.
pub const CREDENTIALS_FILE: &str = "session.json";

/// Persistent storage for the session credential bundle.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Creates a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store backed by the standard file inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CREDENTIALS_FILE))
    }

    /// Path of the credential blob.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored bundle.
    ///
    /// Returns `None` when nothing usable is stored. Corrupt or empty blobs
    /// are deleted on the way.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Option<CredentialBundle> {
        match load_json::<CredentialBundle>(&self.path).await {
            Ok(bundle) if !bundle.is_empty() => {
                debug!(cookies = bundle.len(), "Loaded credential bundle");
                Some(bundle)
            }
            Ok(_) => {
                warn!("Stored credential bundle is empty, discarding");
                self.discard().await;
                None
            }
            Err(e) if e.is_not_found() => {
                info!("No stored credential bundle");
                None
            }
            Err(e) => {
                warn!(error = %e, "Stored credential bundle is unreadable, discarding");
                self.discard().await;
                None
            }
        }
    }

    /// Replaces the stored bundle.
    #[instrument(skip(self, bundle), fields(path = %self.path.display(), cookies = bundle.len()))]
    pub async fn save(&self, bundle: &CredentialBundle) -> Result<(), StoreError> {
        save_json(&self.path, bundle).await?;
        info!("Credential bundle saved");
        Ok(())
    }

    /// Deletes the stored bundle, if any.
    pub async fn delete(&self) -> Result<(), StoreError> {
        remove_file(&self.path).await
    }

    async fn discard(&self) {
        if let Err(e) = self.delete().await {
            warn!(error = %e, "Failed to delete credential bundle");
        }
    }
}

//! On-disk JSON state.
//!
//! The only thing slotwatch keeps on disk is the session blob, which holds
//! live cookies. Writes go through a sibling temp file and a rename so a
//! crash never leaves a half-written blob, and on Unix the blob is readable
//! by its owner only.

use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::StoreError;

/// Mode for files holding secrets.
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Mode for directories created to hold them.
#[cfg(unix)]
const DIR_MODE: u32 = 0o700;

// ============================================================================
// Locations
// ============================================================================

/// Returns the default state directory.
///
/// - Linux: `~/.local/share/slotwatch`
/// - macOS: `~/Library/Application Support/slotwatch`
/// - Windows: `%LOCALAPPDATA%\slotwatch`
pub fn default_state_dir() -> PathBuf {
    dirs::data_local_dir().map_or_else(|| PathBuf::from("."), |dir| dir.join("slotwatch"))
}

// ============================================================================
// Permissions
// ============================================================================

#[cfg(unix)]
async fn restrict(path: &Path, mode: u32) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
    debug!(path = %path.display(), mode = %format!("{mode:o}"), "Restricted permissions");
    Ok(())
}

#[cfg(not(unix))]
async fn restrict(_path: &Path, _mode: u32) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(not(unix))]
const DIR_MODE: u32 = 0;

/// Writes `bytes` to a new file that is owner-only from the moment it exists.
async fn write_private(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    use tokio::io::AsyncWriteExt;

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);

    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

// ============================================================================
// Operations
// ============================================================================

/// Creates `path` (and parents) if missing. A directory created here is
/// private to its owner; an existing one is left as it is.
pub async fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    if tokio::fs::try_exists(path).await? {
        return Ok(());
    }

    debug!(path = %path.display(), "Creating state directory");
    tokio::fs::create_dir_all(path).await?;
    restrict(path, DIR_MODE).await
}

/// Writes `data` as pretty JSON, replacing the file atomically.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent).await?;
    }

    let json = serde_json::to_vec_pretty(data)?;
    let staging = path.with_extension("json.tmp");

    // A leftover staging file may carry other permissions.
    remove_file(&staging).await?;
    if let Err(e) = write_private(&staging, &json).await {
        let _ = remove_file(&staging).await;
        return Err(e);
    }
    tokio::fs::rename(&staging, path).await?;

    debug!(path = %path.display(), bytes = json.len(), "Wrote state file");
    Ok(())
}

/// Reads and deserializes a JSON file.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let bytes = tokio::fs::read(path).await?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read state file");
    Ok(serde_json::from_slice(&bytes)?)
}

/// Removes a file; a missing file is not an error.
pub async fn remove_file(path: &Path) -> Result<(), StoreError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed state file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_dir() {
        assert!(default_state_dir().ends_with("slotwatch"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let blob = dir.path().join("session.json");

        save_json(&blob, &serde_json::json!({"cookies": []})).await.unwrap();

        let mode = tokio::fs::metadata(&blob).await.unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stale_staging_file_does_not_leak_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let blob = dir.path().join("session.json");
        let staging = blob.with_extension("json.tmp");
        tokio::fs::write(&staging, b"stale").await.unwrap();
        tokio::fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o644))
            .await
            .unwrap();

        save_json(&blob, &serde_json::json!({"cookies": []})).await.unwrap();

        let mode = tokio::fs::metadata(&blob).await.unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert!(!staging.exists());
        let saved: serde_json::Value = load_json(&blob).await.unwrap();
        assert_eq!(saved, serde_json::json!({"cookies": []}));
    }
}

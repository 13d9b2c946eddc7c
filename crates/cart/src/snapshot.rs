//! Local snapshot persistence for anonymous carts.
//!
//! The snapshot is always read and written as one unit: a JSON array of line
//! items in a single well-known slot. There are no partial updates, and a
//! slot that is absent or holds content we cannot decode counts as "no
//! cart" rather than an error.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::item::LineItem;

/// Errors from writing or clearing a snapshot. Reads do not fail; see
/// [`SnapshotStore::read`].
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Filesystem error.
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    /// The cart could not be serialized.
    #[error("snapshot serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Whole-snapshot persistence of the anonymous cart.
#[allow(async_fn_in_trait)]
pub trait SnapshotStore {
    /// Read the stored cart. An absent slot and malformed content both yield
    /// `None`; implementations log the malformed case before discarding it.
    async fn read(&self) -> Option<Vec<LineItem>>;

    /// Replace the stored cart with `items`, as one unit.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the snapshot cannot be serialized or
    /// stored.
    async fn write(&self, items: &[LineItem]) -> Result<(), SnapshotError>;

    /// Remove the stored cart entirely. Clearing an absent slot is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Io` if the slot exists but cannot be removed.
    async fn clear(&self) -> Result<(), SnapshotError>;
}

/// JSON-file snapshot store.
///
/// Concurrent writers of the same file are not coordinated; the last
/// whole-snapshot write wins. That matches the one-owner-per-session model
/// the engine assumes.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Create a store over the given snapshot file. The file and its parent
    /// directory are created lazily on the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshotStore {
    async fn read(&self) -> Option<Vec<LineItem>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read cart snapshot {}: {e}", self.path.display());
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(items) => Some(items),
            Err(e) => {
                tracing::warn!(
                    "Discarding malformed cart snapshot {}: {e}",
                    self.path.display()
                );
                None
            }
        }
    }

    async fn write(&self, items: &[LineItem]) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec(items)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SnapshotError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SnapshotError::Io(e)),
        }
    }
}

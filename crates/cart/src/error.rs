//! Unified error type for cart persistence.
//!
//! The engine itself never surfaces these (mutations are optimistic and
//! loads are fail-open); they exist for callers that drive the stores
//! directly, such as migration tooling and integration tests.

use thiserror::Error;

use crate::config::ConfigError;
use crate::snapshot::SnapshotError;
use crate::store::StoreError;

/// Any error the cart subsystem can produce.
#[derive(Debug, Error)]
pub enum CartError {
    /// Database-backed store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Snapshot read or write failed.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Configuration loading failed.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience alias for cart operations.
pub type Result<T> = std::result::Result<T, CartError>;

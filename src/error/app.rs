//! Top-level application errors

use super::{CatalogError, PlaybackError, StoreError};

/// Errors surfaced by `main`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Store error
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Catalog error
    #[error("{0}")]
    Catalog(#[from] CatalogError),

    /// Playback error
    #[error("playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Audio backend could not be started
    #[error("audio backend unavailable: {0}")]
    Backend(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

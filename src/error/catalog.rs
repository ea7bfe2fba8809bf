//! Station catalog errors

use super::StoreError;

/// Catalog edit/persistence error.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Name or URL left empty
    #[error("station {0} is required")]
    MissingField(&'static str),

    /// URL does not parse as an absolute http(s) URL
    #[error("invalid stream URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// No station with this id or position
    #[error("station not found: {0}")]
    NotFound(String),

    /// Persisting the list failed
    #[error("failed to persist stations: {0}")]
    Store(#[from] StoreError),
}

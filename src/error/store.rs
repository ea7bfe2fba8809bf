//! Key/value store errors

/// Persistence error for [`JsonStore`](crate::store::JsonStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error
    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("store JSON error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    /// A missing key is not a failure for callers that seed defaults.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

//! Structured error types for every part of the player.

mod app;
mod catalog;
mod playback;
mod store;

pub use app::AppError;
pub use catalog::CatalogError;
pub use playback::{PlaybackError, SinkError};
pub use store::StoreError;

pub mod store;

pub use store::{AppSettings, MAX_CROSSFADE_MS, MIN_CROSSFADE_MS, load_settings, save_settings};

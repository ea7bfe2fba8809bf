pub mod catalog;
pub mod cli;
pub mod console;
pub mod domain;
pub mod error;
pub mod logging;
pub mod media_session;
pub mod playback;
pub mod settings;
pub mod store;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "rrradio",
    version,
    about = "Internet radio player with crossfading station changes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Override the data directory (defaults to the platform data_local_dir)
    #[arg(long, env = "RRRADIO_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Override the log directory (defaults to `{data_dir}/logs`)
    #[arg(long, env = "RRRADIO_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Override the log filter (same syntax as RUST_LOG)
    #[arg(long, env = "RUST_LOG", global = true)]
    pub log_filter: Option<String>,

    /// Play nothing: use the silent sink instead of mpv
    #[arg(long, global = true)]
    pub no_audio: bool,

    /// mpv executable to drive
    #[arg(long, env = "RRRADIO_MPV", default_value = "mpv", global = true)]
    pub mpv: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive console (default)
    Console,

    /// Print the station list
    List,

    /// Add a station
    Add {
        name: String,
        url: String,
        #[arg(long)]
        image: Option<String>,
    },

    /// Edit a station by id or 1-based position
    Edit {
        station: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        url: Option<String>,
        /// Artwork URL; pass an empty string to clear it
        #[arg(long)]
        image: Option<String>,
    },

    /// Remove a station by id or 1-based position
    Remove { station: String },

    /// Move a station to a new 1-based position
    Move { station: String, position: usize },

    /// Show or change persisted playback settings
    Settings(SettingsArgs),
}

#[derive(Debug, Args)]
pub struct SettingsArgs {
    /// 0..=100
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub volume: Option<u8>,

    #[arg(long)]
    pub crossfade: Option<bool>,

    /// Clamped to 100..=10000
    #[arg(long)]
    pub crossfade_ms: Option<u64>,
}

/// `RRRADIO_NO_AUDIO` accepts the usual truthy spellings on top of `--no-audio`.
pub fn no_audio_requested(flag: bool, env_value: Option<&str>) -> bool {
    flag || env_value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

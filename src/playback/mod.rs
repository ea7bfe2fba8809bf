//! Two-sink playback: cold starts, pause/resume and eased crossfades between stations.

mod controller;
mod envelope;
mod messages;
#[cfg(unix)]
mod mpv_sink;
mod null_sink;
mod sink;

pub use controller::{
    ControllerConfig, FRAME_INTERVAL, PREPARE_TIMEOUT, PlaybackController, STOP_ERROR_WINDOW,
    spawn_controller,
};
pub use envelope::{DEFAULT_CROSSFADE_MS, EnvelopeLevels, ease_in_out, levels, progress};
pub use messages::{
    CrossfadeSettings, PlayReply, PlaybackCommand, PlaybackEvent, PlaybackHandle, PlaybackState,
    PlayerStatus, SkipDirection, TransitionState,
};
#[cfg(unix)]
pub use mpv_sink::MpvSink;
pub use null_sink::NullSink;
pub use sink::{AudioSink, PlayFuture, SinkEvent, Subscription};

/// Which engine backs the two sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioBackend {
    Mpv { binary: String },
    Null,
}

//! Playback errors: sink capability failures and controller outcomes.

/// Failure reported by an [`AudioSink`](crate::playback::AudioSink).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The engine refused to start (unsupported format, autoplay policy, dead stream).
    #[error("play rejected: {0}")]
    Rejected(String),

    /// The engine behind the sink is gone.
    #[error("sink disconnected")]
    Disconnected,

    /// Talking to an out-of-process engine failed.
    #[error("sink IPC failed: {0}")]
    Ipc(String),
}

/// Outcome of a controller operation as seen by its caller.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// Standby sink never signalled ready within the preparing bound.
    #[error("station {station_id} did not become ready within {after_ms} ms")]
    LoadTimeout { station_id: String, after_ms: u64 },

    /// The sink reported a load error for the station's stream.
    #[error("failed to load station {station_id}: {message}")]
    LoadError { station_id: String, message: String },

    /// The sink rejected `play()`.
    #[error("playback of station {station_id} was rejected: {source}")]
    PlaybackRejected {
        station_id: String,
        #[source]
        source: SinkError,
    },

    /// A transition is already in progress.
    #[error("a station transition is already in progress")]
    IllegalTransition,

    /// The request was superseded by stop() or a newer request.
    #[error("request cancelled")]
    Cancelled,

    /// The controller task has shut down.
    #[error("playback controller is gone")]
    ControllerGone,
}

impl PlaybackError {
    /// Whether the user should see an "Error playing stream" style notice.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            PlaybackError::LoadError { .. }
                | PlaybackError::PlaybackRejected { .. }
                | PlaybackError::LoadTimeout { .. }
        )
    }
}

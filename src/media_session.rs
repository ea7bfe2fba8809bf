//! OS/notification media controls.
//!
//! The controller pushes metadata and transport state on every station
//! change; remote transport buttons come back in as [`RemoteCommand`]s.

use crate::domain::Station;

pub const SESSION_ARTIST: &str = "Live Radio Stream";
pub const SESSION_ALBUM: &str = "Rrradio";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaMetadata {
    pub title: String,
    pub artist: &'static str,
    pub album: &'static str,
    pub artwork: Option<String>,
}

impl MediaMetadata {
    pub fn for_station(station: &Station) -> Self {
        Self {
            title: station.name.clone(),
            artist: SESSION_ARTIST,
            album: SESSION_ALBUM,
            artwork: station.image.clone().filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaPlaybackState {
    None,
    Paused,
    Playing,
}

/// Transport buttons from outside the app. Seeking does not apply to live streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    Play,
    Pause,
    Stop,
    Previous,
    Next,
}

impl RemoteCommand {
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "play" => Some(RemoteCommand::Play),
            "pause" => Some(RemoteCommand::Pause),
            "stop" => Some(RemoteCommand::Stop),
            "previoustrack" | "previous" | "prev" => Some(RemoteCommand::Previous),
            "nexttrack" | "next" => Some(RemoteCommand::Next),
            _ => None,
        }
    }
}

pub trait MediaSession: Send + 'static {
    fn set_metadata(&mut self, metadata: Option<MediaMetadata>);
    fn set_playback_state(&mut self, state: MediaPlaybackState);
}

/// Session for hosts without media controls.
#[derive(Debug, Default)]
pub struct NoopMediaSession;

impl MediaSession for NoopMediaSession {
    fn set_metadata(&mut self, _metadata: Option<MediaMetadata>) {}
    fn set_playback_state(&mut self, _state: MediaPlaybackState) {}
}

/// Writes session changes to the log; used by the console frontend.
#[derive(Debug)]
pub struct TracingMediaSession {
    state: MediaPlaybackState,
}

impl Default for TracingMediaSession {
    fn default() -> Self {
        Self {
            state: MediaPlaybackState::None,
        }
    }
}

impl MediaSession for TracingMediaSession {
    fn set_metadata(&mut self, metadata: Option<MediaMetadata>) {
        match metadata {
            Some(m) => tracing::info!(
                title = %m.title,
                artwork = m.artwork.as_deref().unwrap_or("-"),
                "media session metadata"
            ),
            None => tracing::info!("media session metadata cleared"),
        }
    }

    fn set_playback_state(&mut self, state: MediaPlaybackState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "media session state");
            self.state = state;
        }
    }
}

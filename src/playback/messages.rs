use tokio::sync::{mpsc, oneshot};

use crate::domain::Station;
use crate::error::PlaybackError;
use crate::media_session::RemoteCommand;

use super::envelope::DEFAULT_CROSSFADE_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Paused,
    Buffering,
    Error,
    Ended,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "Stopped",
            PlaybackState::Loading => "Loading...",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
            PlaybackState::Buffering => "Buffering...",
            PlaybackState::Error => "Error loading stream",
            PlaybackState::Ended => "Ended",
        }
    }
}

/// Crossfade progress. `Fading` covers the paired fade-out/fade-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Inactive,
    Preparing,
    Fading,
    Committing,
    Aborting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossfadeSettings {
    pub enabled: bool,
    pub duration_ms: u64,
}

impl Default for CrossfadeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_ms: DEFAULT_CROSSFADE_MS,
        }
    }
}

/// What the UI renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    pub station: Option<Station>,
    pub transition: TransitionState,
}

impl PlayerStatus {
    pub fn idle() -> Self {
        Self {
            state: PlaybackState::Idle,
            station: None,
            transition: TransitionState::Inactive,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition != TransitionState::Inactive
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipDirection {
    Previous,
    Next,
}

pub type PlayReply = oneshot::Sender<Result<(), PlaybackError>>;

#[derive(Debug)]
pub enum PlaybackCommand {
    Play {
        station: Station,
        reply: Option<PlayReply>,
    },
    TogglePause,
    Stop,
    /// 0..=100
    SetVolume(f32),
    SetCrossfade(CrossfadeSettings),
    Remote(RemoteCommand),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Status(PlayerStatus),
    /// One-shot user-facing failure text.
    Notice(String),
    /// Remote previous/next: the catalog owner decides which station that is.
    SkipRequested(SkipDirection),
}

/// Cloneable front door to the controller task.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    tx: mpsc::Sender<PlaybackCommand>,
}

impl PlaybackHandle {
    pub(crate) fn new(tx: mpsc::Sender<PlaybackCommand>) -> Self {
        Self { tx }
    }

    /// Resolves when the request has settled: playing, paused, or failed.
    pub async fn play_station(&self, station: Station) -> Result<(), PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.send(PlaybackCommand::Play {
            station,
            reply: Some(reply),
        })
        .await?;
        rx.await.map_err(|_| PlaybackError::ControllerGone)?
    }

    pub async fn toggle_pause(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::TogglePause).await
    }

    pub async fn stop(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Stop).await
    }

    pub async fn set_volume(&self, percent: f32) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::SetVolume(percent)).await
    }

    pub async fn set_crossfade(&self, settings: CrossfadeSettings) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::SetCrossfade(settings)).await
    }

    pub async fn remote(&self, cmd: RemoteCommand) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Remote(cmd)).await
    }

    pub async fn send(&self, cmd: PlaybackCommand) -> Result<(), PlaybackError> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| PlaybackError::ControllerGone)
    }
}

use futures_util::StreamExt;
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::FuturesUnordered;
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, MissedTickBehavior};

use crate::domain::Station;
use crate::error::{PlaybackError, SinkError};
use crate::media_session::{MediaMetadata, MediaPlaybackState, MediaSession, RemoteCommand};

use super::envelope::FadeRun;
use super::messages::{
    CrossfadeSettings, PlayReply, PlaybackCommand, PlaybackEvent, PlaybackHandle, PlaybackState,
    PlayerStatus, SkipDirection, TransitionState,
};
use super::sink::{AudioSink, SinkEvent, SinkSlot};

/// How long the standby sink gets to become ready (and start) before the
/// crossfade is abandoned.
pub const PREPARE_TIMEOUT: Duration = Duration::from_secs(10);
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);
/// Error events inside this window after `stop()` come from clearing the source.
pub const STOP_ERROR_WINDOW: Duration = Duration::from_millis(100);

const PLAY_ERROR_NOTICE: &str = "Error playing stream. Please check the URL.";
const LOAD_ERROR_NOTICE: &str = "Error loading stream";

#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    pub crossfade: CrossfadeSettings,
    /// Starting volume in `[0, 1]`.
    pub volume: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            crossfade: CrossfadeSettings::default(),
            volume: 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkRole {
    Active,
    Standby,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayPurpose {
    ColdStart,
    Resume,
    CrossfadeStart,
}

/// A `play()` that resolved, tagged with the generation that issued it.
struct PlaySettled {
    generation: u64,
    purpose: PlayPurpose,
    result: Result<(), SinkError>,
}

/// Data of the in-flight crossfade; its phase lives in `TransitionState`.
struct Transition {
    generation: u64,
    station: Station,
    deadline: Instant,
    duration_ms: u64,
    play_requested: bool,
    fade: Option<FadeRun>,
}

pub struct PlaybackController<S: AudioSink> {
    tx_evt: mpsc::UnboundedSender<PlaybackEvent>,
    active: SinkSlot<S>,
    standby: SinkSlot<S>,
    media: Box<dyn MediaSession>,
    crossfade: CrossfadeSettings,
    state: PlaybackState,
    transition: TransitionState,
    current: Option<Station>,
    /// Level the user asked for, in `[0, 1]`.
    volume: f32,
    /// Last explicit `set_volume`; the fade-in endpoint when set.
    target_volume: Option<f32>,
    generation: u64,
    pending: Option<Transition>,
    in_flight: FuturesUnordered<BoxFuture<'static, PlaySettled>>,
    reply: Option<PlayReply>,
    stopping_until: Option<Instant>,
    last_status: PlayerStatus,
}

impl<S: AudioSink> PlaybackController<S> {
    pub fn new(
        active: S,
        standby: S,
        config: ControllerConfig,
        media: Box<dyn MediaSession>,
        tx_evt: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Self {
        let volume = config.volume.clamp(0.0, 1.0);
        let mut active = SinkSlot::new(active);
        let mut standby = SinkSlot::new(standby);
        active.sink.set_volume(volume);
        standby.sink.set_volume(0.0);
        Self {
            tx_evt,
            active,
            standby,
            media,
            crossfade: config.crossfade,
            state: PlaybackState::Idle,
            transition: TransitionState::Inactive,
            current: None,
            volume,
            target_volume: None,
            generation: 0,
            pending: None,
            in_flight: FuturesUnordered::new(),
            reply: None,
            stopping_until: None,
            last_status: PlayerStatus::idle(),
        }
    }

    pub fn status(&self) -> PlayerStatus {
        PlayerStatus {
            state: self.state,
            station: self.current.clone(),
            transition: self.transition,
        }
    }

    pub async fn run(mut self, mut rx_cmd: mpsc::Receiver<PlaybackCommand>) {
        let mut frame = tokio::time::interval(FRAME_INTERVAL);
        frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let _ = self
            .tx_evt
            .send(PlaybackEvent::Status(self.last_status.clone()));
        tracing::info!(
            crossfade = self.crossfade.enabled,
            crossfade_ms = self.crossfade.duration_ms,
            volume = self.volume,
            "playback controller started"
        );

        loop {
            let fading = self.fade_generation();
            let deadline = self.prepare_deadline();

            select! {
                biased;
                _ = frame.tick(), if fading.is_some() => {
                    if let Some(generation) = fading {
                        self.on_frame(generation, Instant::now());
                    }
                }
                settled = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    if let Some(settled) = settled {
                        self.on_play_settled(settled);
                    }
                }
                evt = self.active.events.next() => {
                    self.on_active_event(evt);
                }
                evt = self.standby.events.next() => {
                    self.on_standby_event(evt);
                }
                _ = tokio::time::sleep_until(deadline.map_or_else(Instant::now, |(_, at)| at)), if deadline.is_some() => {
                    if let Some((generation, _)) = deadline {
                        self.on_prepare_deadline(generation);
                    }
                }
                maybe_cmd = rx_cmd.recv() => {
                    let Some(cmd) = maybe_cmd else {
                        break;
                    };
                    self.handle_command(cmd);
                }
            }
        }

        self.stop();
        tracing::info!("playback controller stopped");
    }

    fn handle_command(&mut self, cmd: PlaybackCommand) {
        match cmd {
            PlaybackCommand::Play { station, reply } => self.play_station(station, reply),
            PlaybackCommand::TogglePause => self.toggle_pause(),
            PlaybackCommand::Stop => self.stop(),
            PlaybackCommand::SetVolume(percent) => self.set_volume(percent),
            PlaybackCommand::SetCrossfade(settings) => self.set_crossfade(settings),
            PlaybackCommand::Remote(cmd) => self.handle_remote(cmd),
        }
    }

    pub fn play_station(&mut self, station: Station, reply: Option<PlayReply>) {
        if self.transition != TransitionState::Inactive {
            tracing::warn!(
                station_id = %station.id,
                transition = ?self.transition,
                "station change rejected: transition in progress"
            );
            if let Some(reply) = reply {
                let _ = reply.send(Err(PlaybackError::IllegalTransition));
            }
            return;
        }

        let same = self
            .current
            .as_ref()
            .is_some_and(|cur| cur.same_id(&station));
        if same && matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            tracing::debug!(station_id = %station.id, state = ?self.state, "same station, toggling");
            self.replace_reply(reply);
            self.pause_or_resume();
            return;
        }

        self.replace_reply(reply);
        let can_fade = self.crossfade.enabled
            && self.state == PlaybackState::Playing
            && self.current.is_some()
            && !same;
        if can_fade {
            self.begin_crossfade(station);
        } else {
            self.cold_start(station);
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.current.is_none() {
            tracing::debug!("toggle pause ignored: no station");
            return;
        }
        self.replace_reply(None);
        if self.abort_transition().is_some() {
            tracing::info!("transition abandoned by pause");
        }
        self.pause_or_resume();
    }

    pub fn stop(&mut self) {
        tracing::info!(station_id = ?self.current.as_ref().map(|s| &s.id), "stop");
        if self.abort_transition().is_some() {
            tracing::debug!("in-flight transition aborted by stop");
        }
        self.next_generation();
        self.stopping_until = Some(Instant::now() + STOP_ERROR_WINDOW);

        self.active.clear();
        self.active.sink.set_volume(self.volume);
        self.standby.clear();
        self.standby.rewire();

        self.current = None;
        self.state = PlaybackState::Idle;
        self.media.set_metadata(None);
        self.media.set_playback_state(MediaPlaybackState::None);
        self.settle(Err(PlaybackError::Cancelled));
        self.emit_status();
    }

    /// `percent` in `[0, 100]`. Mid-transition only the fade-in endpoint moves.
    pub fn set_volume(&mut self, percent: f32) {
        if !percent.is_finite() {
            tracing::warn!(percent, "volume ignored: not a number");
            return;
        }
        let v = percent.clamp(0.0, 100.0) / 100.0;
        self.volume = v;
        self.target_volume = Some(v);
        if self.transition == TransitionState::Inactive {
            self.active.sink.set_volume(v);
        } else {
            tracing::debug!(target = v, "volume retargeted mid-transition");
        }
    }

    /// Takes effect from the next transition on.
    pub fn set_crossfade(&mut self, settings: CrossfadeSettings) {
        tracing::info!(
            enabled = settings.enabled,
            duration_ms = settings.duration_ms,
            "crossfade settings changed"
        );
        self.crossfade = settings;
    }

    fn handle_remote(&mut self, cmd: RemoteCommand) {
        tracing::debug!(?cmd, state = ?self.state, "remote command");
        match cmd {
            RemoteCommand::Play => {
                if matches!(
                    self.state,
                    PlaybackState::Paused | PlaybackState::Error | PlaybackState::Ended
                ) {
                    self.toggle_pause();
                }
            }
            RemoteCommand::Pause => {
                if matches!(
                    self.state,
                    PlaybackState::Playing | PlaybackState::Buffering | PlaybackState::Loading
                ) {
                    self.toggle_pause();
                }
            }
            RemoteCommand::Stop => self.stop(),
            RemoteCommand::Previous => {
                let _ = self
                    .tx_evt
                    .send(PlaybackEvent::SkipRequested(SkipDirection::Previous));
            }
            RemoteCommand::Next => {
                let _ = self
                    .tx_evt
                    .send(PlaybackEvent::SkipRequested(SkipDirection::Next));
            }
        }
    }

    fn cold_start(&mut self, station: Station) {
        let generation = self.next_generation();
        tracing::info!(station_id = %station.id, url = %station.url, generation, "cold start");

        self.active.sink.pause();
        self.active.rewire();
        self.active.sink.set_source(Some(&station.url));
        self.active.sink.set_volume(self.volume);

        self.current = Some(station);
        self.state = PlaybackState::Loading;
        self.emit_status();
        self.spawn_play(SinkRole::Active, PlayPurpose::ColdStart);
    }

    fn pause_or_resume(&mut self) {
        match self.state {
            PlaybackState::Playing | PlaybackState::Buffering | PlaybackState::Loading => {
                self.next_generation();
                self.active.sink.pause();
                self.state = PlaybackState::Paused;
                self.media.set_playback_state(MediaPlaybackState::Paused);
                self.emit_status();
                self.settle(Ok(()));
            }
            PlaybackState::Paused | PlaybackState::Error | PlaybackState::Ended => {
                self.next_generation();
                self.state = PlaybackState::Loading;
                self.emit_status();
                self.spawn_play(SinkRole::Active, PlayPurpose::Resume);
            }
            PlaybackState::Idle => {
                self.settle(Ok(()));
            }
        }
    }

    fn begin_crossfade(&mut self, station: Station) {
        let generation = self.next_generation();
        tracing::info!(
            station_id = %station.id,
            from = ?self.current.as_ref().map(|s| &s.id),
            generation,
            duration_ms = self.crossfade.duration_ms,
            "crossfade preparing"
        );

        self.transition = TransitionState::Preparing;
        self.standby.rewire();
        self.standby.sink.set_volume(0.0);
        self.standby.sink.set_source(Some(&station.url));
        self.pending = Some(Transition {
            generation,
            station,
            deadline: Instant::now() + PREPARE_TIMEOUT,
            duration_ms: self.crossfade.duration_ms,
            play_requested: false,
            fade: None,
        });
        self.emit_status();
    }

    fn begin_fading(&mut self, now: Instant) {
        let initial = self.active.sink.volume();
        let Some(t) = self.pending.as_mut() else {
            return;
        };
        tracing::debug!(generation = t.generation, initial, "crossfade fading");
        t.fade = Some(FadeRun::new(t.generation, now, t.duration_ms, initial));
        self.transition = TransitionState::Fading;
        self.emit_status();
    }

    fn on_frame(&mut self, generation: u64, now: Instant) {
        if self.transition != TransitionState::Fading {
            tracing::trace!(generation, "frame ignored: not fading");
            return;
        }
        let Some(fade) = self.pending.as_mut().and_then(|t| t.fade.as_mut()) else {
            return;
        };
        if fade.generation != generation {
            tracing::debug!(generation, current = fade.generation, "stale frame ignored");
            return;
        }
        let target = self.target_volume.unwrap_or(fade.initial_volume());
        let (levels, done) = fade.sample(now, target);
        tracing::trace!(ratio = fade.last_ratio(), out = levels.out_volume, r#in = levels.in_volume, "frame");
        self.active.sink.set_volume(levels.out_volume);
        self.standby.sink.set_volume(levels.in_volume);
        if done {
            self.commit();
        }
    }

    fn commit(&mut self) {
        self.transition = TransitionState::Committing;
        let Some(t) = self.pending.take() else {
            self.transition = TransitionState::Inactive;
            return;
        };
        tracing::info!(station_id = %t.station.id, generation = t.generation, "crossfade committed");

        self.active.clear();
        std::mem::swap(&mut self.active, &mut self.standby);
        self.active.rewire();
        self.standby.rewire();
        self.next_generation();

        self.media
            .set_metadata(Some(MediaMetadata::for_station(&t.station)));
        self.media.set_playback_state(MediaPlaybackState::Playing);
        self.current = Some(t.station);
        self.state = PlaybackState::Playing;
        self.transition = TransitionState::Inactive;
        self.stopping_until = None;
        self.emit_status();
        self.settle(Ok(()));
    }

    /// Abandons the transition and cold-starts its station on the active sink.
    fn fail_transition(&mut self, err: PlaybackError) {
        let Some(t) = self.abort_transition() else {
            return;
        };
        tracing::warn!(err = %err, station_id = %t.station.id, "crossfade failed, falling back to cold start");
        self.cold_start(t.station);
    }

    /// `Preparing | Fading -> Aborting -> Inactive`. Returns what was in flight.
    fn abort_transition(&mut self) -> Option<Transition> {
        if self.transition == TransitionState::Inactive {
            return None;
        }
        self.transition = TransitionState::Aborting;
        let t = self.pending.take();
        self.standby.clear();
        self.standby.rewire();
        self.active.sink.set_volume(self.volume);
        self.next_generation();
        self.transition = TransitionState::Inactive;
        self.emit_status();
        t
    }

    fn on_prepare_deadline(&mut self, generation: u64) {
        if self.transition != TransitionState::Preparing {
            return;
        }
        let Some(t) = self.pending.as_ref().filter(|t| t.generation == generation) else {
            return;
        };
        let err = PlaybackError::LoadTimeout {
            station_id: t.station.id.clone(),
            after_ms: u64::try_from(PREPARE_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
        };
        self.fail_transition(err);
    }

    fn fade_generation(&self) -> Option<u64> {
        if self.transition != TransitionState::Fading {
            return None;
        }
        self.pending
            .as_ref()
            .and_then(|t| t.fade.as_ref())
            .map(|f| f.generation)
    }

    fn prepare_deadline(&self) -> Option<(u64, Instant)> {
        if self.transition != TransitionState::Preparing {
            return None;
        }
        self.pending.as_ref().map(|t| (t.generation, t.deadline))
    }

    fn on_play_settled(&mut self, settled: PlaySettled) {
        if settled.generation != self.generation {
            tracing::debug!(
                generation = settled.generation,
                current = self.generation,
                purpose = ?settled.purpose,
                "stale play result ignored"
            );
            return;
        }

        match (settled.purpose, settled.result) {
            (PlayPurpose::ColdStart | PlayPurpose::Resume, Ok(())) => {
                if settled.purpose == PlayPurpose::ColdStart
                    && let Some(station) = self.current.as_ref()
                {
                    self.media
                        .set_metadata(Some(MediaMetadata::for_station(station)));
                }
                self.media.set_playback_state(MediaPlaybackState::Playing);
                self.state = PlaybackState::Playing;
                self.stopping_until = None;
                self.emit_status();
                self.settle(Ok(()));
            }
            (PlayPurpose::ColdStart | PlayPurpose::Resume, Err(e)) => {
                let station_id = self
                    .current
                    .as_ref()
                    .map(|s| s.id.clone())
                    .unwrap_or_default();
                tracing::warn!(err = %e, station_id = %station_id, "play rejected");
                if self.state != PlaybackState::Error {
                    self.notify(PLAY_ERROR_NOTICE);
                }
                self.state = PlaybackState::Error;
                self.media.set_playback_state(MediaPlaybackState::None);
                self.emit_status();
                self.settle(Err(PlaybackError::PlaybackRejected {
                    station_id,
                    source: e,
                }));
            }
            (PlayPurpose::CrossfadeStart, Ok(())) => {
                self.begin_fading(Instant::now());
            }
            (PlayPurpose::CrossfadeStart, Err(e)) => {
                let station_id = self
                    .pending
                    .as_ref()
                    .map(|t| t.station.id.clone())
                    .unwrap_or_default();
                self.fail_transition(PlaybackError::PlaybackRejected {
                    station_id,
                    source: e,
                });
            }
        }
    }

    fn on_active_event(&mut self, evt: SinkEvent) {
        tracing::trace!(?evt, state = ?self.state, "active sink event");
        if self.current.is_none() {
            return;
        }
        match evt {
            SinkEvent::LoadStart => {}
            SinkEvent::LoadedData | SinkEvent::CanPlay => {
                self.stopping_until = None;
                if self.state == PlaybackState::Buffering {
                    self.state = PlaybackState::Playing;
                }
            }
            SinkEvent::Playing => {
                self.stopping_until = None;
                if self.transition == TransitionState::Inactive {
                    self.state = PlaybackState::Playing;
                }
            }
            SinkEvent::Pause => {
                if matches!(self.state, PlaybackState::Playing | PlaybackState::Buffering)
                    && self.transition == TransitionState::Inactive
                {
                    self.state = PlaybackState::Paused;
                    self.media.set_playback_state(MediaPlaybackState::Paused);
                }
            }
            SinkEvent::Ended => {
                if self.transition == TransitionState::Inactive {
                    self.state = PlaybackState::Ended;
                    self.media.set_playback_state(MediaPlaybackState::None);
                }
            }
            SinkEvent::Waiting => {
                if self.state == PlaybackState::Playing {
                    self.state = PlaybackState::Buffering;
                }
            }
            SinkEvent::Error(message) => {
                if self.is_stopping() {
                    tracing::debug!(%message, "error from intentional stop suppressed");
                    return;
                }
                if self.transition != TransitionState::Inactive {
                    tracing::warn!(%message, "outgoing station failed mid-transition");
                    return;
                }
                let station_id = self
                    .current
                    .as_ref()
                    .map(|s| s.id.clone())
                    .unwrap_or_default();
                tracing::warn!(%message, station_id = %station_id, "stream error");
                self.next_generation();
                if self.state != PlaybackState::Error {
                    self.notify(LOAD_ERROR_NOTICE);
                }
                self.state = PlaybackState::Error;
                self.media.set_playback_state(MediaPlaybackState::None);
                self.settle(Err(PlaybackError::LoadError {
                    station_id,
                    message,
                }));
            }
        }
        self.emit_status();
    }

    fn on_standby_event(&mut self, evt: SinkEvent) {
        if self.transition != TransitionState::Preparing {
            tracing::trace!(?evt, "standby event ignored");
            return;
        }
        let Some(t) = self.pending.as_mut() else {
            return;
        };
        if evt.is_ready() {
            if !t.play_requested {
                t.play_requested = true;
                tracing::debug!(generation = t.generation, "standby ready, starting");
                self.spawn_play(SinkRole::Standby, PlayPurpose::CrossfadeStart);
            }
        } else if let SinkEvent::Error(message) = evt {
            let station_id = t.station.id.clone();
            self.fail_transition(PlaybackError::LoadError {
                station_id,
                message,
            });
        }
    }

    fn spawn_play(&mut self, role: SinkRole, purpose: PlayPurpose) {
        let generation = self.generation;
        let fut = match role {
            SinkRole::Active => self.active.sink.play(),
            SinkRole::Standby => self.standby.sink.play(),
        };
        self.in_flight.push(
            async move {
                PlaySettled {
                    generation,
                    purpose,
                    result: fut.await,
                }
            }
            .boxed(),
        );
    }

    fn next_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1).max(1);
        self.generation
    }

    fn is_stopping(&self) -> bool {
        self.stopping_until
            .is_some_and(|until| Instant::now() < until)
    }

    fn replace_reply(&mut self, reply: Option<PlayReply>) {
        if let Some(old) = self.reply.take() {
            let _ = old.send(Err(PlaybackError::Cancelled));
        }
        self.reply = reply;
    }

    fn settle(&mut self, result: Result<(), PlaybackError>) {
        if let Some(reply) = self.reply.take() {
            let _ = reply.send(result);
        }
    }

    fn notify(&self, message: &str) {
        let _ = self.tx_evt.send(PlaybackEvent::Notice(message.to_owned()));
    }

    fn emit_status(&mut self) {
        let status = self.status();
        if status != self.last_status {
            tracing::debug!(
                state = ?status.state,
                transition = ?status.transition,
                station_id = ?status.station.as_ref().map(|s| &s.id),
                "status"
            );
            self.last_status = status.clone();
            let _ = self.tx_evt.send(PlaybackEvent::Status(status));
        }
    }
}

/// Starts the controller task; the returned receiver carries status changes and notices.
pub fn spawn_controller<S: AudioSink>(
    active: S,
    standby: S,
    config: ControllerConfig,
    media: Box<dyn MediaSession>,
) -> (PlaybackHandle, mpsc::UnboundedReceiver<PlaybackEvent>) {
    let (tx_cmd, rx_cmd) = mpsc::channel::<PlaybackCommand>(64);
    let (tx_evt, rx_evt) = mpsc::unbounded_channel::<PlaybackEvent>();
    let controller = PlaybackController::new(active, standby, config, media, tx_evt);
    tokio::spawn(controller.run(rx_cmd));
    (PlaybackHandle::new(tx_cmd), rx_evt)
}

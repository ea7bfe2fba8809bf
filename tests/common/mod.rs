//! Scripted sinks and a test rig around the playback controller.
#![allow(dead_code)]

use futures_util::future::{self, FutureExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;

use rrradio::domain::Station;
use rrradio::error::SinkError;
use rrradio::media_session::{MediaMetadata, MediaPlaybackState, MediaSession};
use rrradio::playback::{
    AudioSink, ControllerConfig, CrossfadeSettings, PlayFuture, PlaybackEvent, PlaybackHandle,
    PlayerStatus, SinkEvent, Subscription, spawn_controller,
};

pub const EMPTY_SRC_ERROR: &str = "MEDIA_ELEMENT_ERROR: Empty src attribute";

/// How a URL behaves once loaded into a scripted sink.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Loads at once, plays when asked.
    Ready,
    /// Starts loading and never gets further; `play()` is rejected.
    NeverReady,
    /// The first load anywhere stalls like `NeverReady`; later loads are `Ready`.
    StallOnce,
    /// Fails to load; `play()` never settles.
    LoadError(String),
    /// Loads fine, but `play()` is refused.
    RejectPlay(String),
}

#[derive(Debug, Default)]
pub struct Probe {
    pub source: Option<String>,
    pub volume: f32,
    pub volume_log: Vec<f32>,
    pub play_calls: usize,
    pub sources_seen: Vec<String>,
}

pub type SharedProbe = Arc<Mutex<Probe>>;

pub fn probe(p: &SharedProbe) -> MutexGuard<'_, Probe> {
    p.lock().expect("probe lock")
}

/// Per-URL behaviours shared by both sinks of a rig.
#[derive(Debug, Default)]
pub struct Script {
    behaviors: HashMap<String, Behavior>,
    loads: Mutex<HashMap<String, usize>>,
}

impl Script {
    pub fn new(behaviors: HashMap<String, Behavior>) -> Self {
        Self {
            behaviors,
            loads: Mutex::new(HashMap::new()),
        }
    }

    /// Behaviour for this load of `url`, resolving `StallOnce`.
    fn on_load(&self, url: &str) -> Behavior {
        let mut loads = self.loads.lock().expect("loads lock");
        let n = loads.entry(url.to_owned()).or_insert(0);
        *n += 1;
        match self.behaviors.get(url).cloned().unwrap_or(Behavior::Ready) {
            Behavior::StallOnce if *n == 1 => Behavior::NeverReady,
            Behavior::StallOnce => Behavior::Ready,
            other => other,
        }
    }
}

pub struct ScriptedSink {
    probe: SharedProbe,
    script: Arc<Script>,
    loaded: Option<Behavior>,
    tx: Option<mpsc::UnboundedSender<SinkEvent>>,
    source: Option<String>,
    playing: bool,
    position: Duration,
}

impl ScriptedSink {
    pub fn new(script: Arc<Script>) -> (Self, SharedProbe) {
        let probe: SharedProbe = Arc::new(Mutex::new(Probe {
            volume: 1.0,
            ..Probe::default()
        }));
        let sink = Self {
            probe: probe.clone(),
            script,
            loaded: None,
            tx: None,
            source: None,
            playing: false,
            position: Duration::ZERO,
        };
        (sink, probe)
    }

    fn emit(&self, evt: SinkEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(evt);
        }
    }
}

impl AudioSink for ScriptedSink {
    fn set_source(&mut self, url: Option<&str>) {
        self.playing = false;
        self.source = url.map(str::to_owned);
        let previous = {
            let mut p = probe(&self.probe);
            let previous = p.source.take();
            p.source = url.map(str::to_owned);
            if let Some(url) = url {
                p.sources_seen.push(url.to_owned());
            }
            previous
        };
        self.loaded = url.map(|u| self.script.on_load(u));
        let Some(behavior) = self.loaded.clone() else {
            if previous.is_some() {
                self.emit(SinkEvent::Error(EMPTY_SRC_ERROR.to_owned()));
            }
            return;
        };
        self.emit(SinkEvent::LoadStart);
        match behavior {
            Behavior::Ready | Behavior::StallOnce | Behavior::RejectPlay(_) => {
                self.emit(SinkEvent::LoadedData);
                self.emit(SinkEvent::CanPlay);
            }
            Behavior::NeverReady => {}
            Behavior::LoadError(msg) => self.emit(SinkEvent::Error(msg)),
        }
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn play(&mut self) -> PlayFuture {
        probe(&self.probe).play_calls += 1;
        match self.loaded.clone() {
            None => future::ready(Err(SinkError::Rejected("no source".to_owned()))).boxed(),
            Some(Behavior::Ready | Behavior::StallOnce) => {
                self.playing = true;
                self.emit(SinkEvent::Playing);
                future::ready(Ok(())).boxed()
            }
            Some(Behavior::NeverReady) => {
                future::ready(Err(SinkError::Rejected("stalled".to_owned()))).boxed()
            }
            Some(Behavior::LoadError(_)) => future::pending().boxed(),
            Some(Behavior::RejectPlay(msg)) => future::ready(Err(SinkError::Rejected(msg))).boxed(),
        }
    }

    fn pause(&mut self) {
        if self.playing {
            self.emit(SinkEvent::Pause);
        }
        self.playing = false;
    }

    fn set_volume(&mut self, volume: f32) {
        let mut p = probe(&self.probe);
        p.volume = volume;
        p.volume_log.push(volume);
    }

    fn volume(&self) -> f32 {
        probe(&self.probe).volume
    }

    fn position(&self) -> Duration {
        self.position
    }

    fn set_position(&mut self, position: Duration) {
        self.position = position;
    }

    fn subscribe(&mut self) -> Subscription {
        let (tx, sub) = Subscription::channel();
        self.tx = Some(tx);
        sub
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaCall {
    Metadata(Option<MediaMetadata>),
    State(MediaPlaybackState),
}

#[derive(Clone, Default)]
pub struct RecordingMediaSession {
    pub calls: Arc<Mutex<Vec<MediaCall>>>,
}

impl MediaSession for RecordingMediaSession {
    fn set_metadata(&mut self, metadata: Option<MediaMetadata>) {
        self.calls
            .lock()
            .expect("media lock")
            .push(MediaCall::Metadata(metadata));
    }

    fn set_playback_state(&mut self, state: MediaPlaybackState) {
        self.calls
            .lock()
            .expect("media lock")
            .push(MediaCall::State(state));
    }
}

pub struct Rig {
    pub handle: PlaybackHandle,
    pub events: mpsc::UnboundedReceiver<PlaybackEvent>,
    pub seen: Vec<PlaybackEvent>,
    pub a: SharedProbe,
    pub b: SharedProbe,
    pub media: RecordingMediaSession,
}

pub fn station(id: &str) -> Station {
    let mut s = Station::new(format!("Station {id}"), url(id), None);
    s.id = id.to_owned();
    s
}

pub fn url(id: &str) -> String {
    format!("https://radio.example/{id}")
}

pub fn crossfade(enabled: bool, duration_ms: u64) -> ControllerConfig {
    ControllerConfig {
        crossfade: CrossfadeSettings {
            enabled,
            duration_ms,
        },
        volume: 0.7,
    }
}

impl Rig {
    pub fn start(config: ControllerConfig, script: &[(&str, Behavior)]) -> Self {
        let behaviors: HashMap<String, Behavior> = script
            .iter()
            .map(|(id, b)| (url(id), b.clone()))
            .collect();
        let script = Arc::new(Script::new(behaviors));
        let (sink_a, a) = ScriptedSink::new(script.clone());
        let (sink_b, b) = ScriptedSink::new(script);
        let media = RecordingMediaSession::default();
        let (handle, events) = spawn_controller(sink_a, sink_b, config, Box::new(media.clone()));
        Self {
            handle,
            events,
            seen: Vec::new(),
            a,
            b,
            media,
        }
    }

    /// Waits (in virtual time) for a status matching `pred`.
    pub async fn wait_status(&mut self, pred: impl Fn(&PlayerStatus) -> bool) -> PlayerStatus {
        let fut = async {
            loop {
                let evt = self.events.recv().await.expect("controller alive");
                self.seen.push(evt.clone());
                if let PlaybackEvent::Status(s) = evt
                    && pred(&s)
                {
                    return s;
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(120), fut)
            .await
            .expect("status in time")
    }

    /// Moves everything already emitted into `seen`.
    pub fn drain(&mut self) {
        while let Ok(evt) = self.events.try_recv() {
            self.seen.push(evt);
        }
    }

    pub fn statuses(&self) -> Vec<PlayerStatus> {
        self.seen
            .iter()
            .filter_map(|e| match e {
                PlaybackEvent::Status(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.seen
            .iter()
            .filter_map(|e| match e {
                PlaybackEvent::Notice(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> PlayerStatus {
        self.statuses().pop().unwrap_or_else(PlayerStatus::idle)
    }
}

pub fn non_increasing(log: &[f32]) -> bool {
    log.windows(2).all(|w| w[1] <= w[0] + 1e-6)
}

pub fn non_decreasing(log: &[f32]) -> bool {
    log.windows(2).all(|w| w[1] + 1e-6 >= w[0])
}

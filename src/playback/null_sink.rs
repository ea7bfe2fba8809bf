use futures_util::future::{self, FutureExt};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::SinkError;

use super::sink::{AudioSink, PlayFuture, SinkEvent, Subscription};

/// Silent sink: accepts every source, becomes ready at once and plays nothing.
///
/// Backs `--no-audio` and in-crate tests.
#[derive(Debug)]
pub struct NullSink {
    name: &'static str,
    source: Option<String>,
    volume: f32,
    position: Duration,
    paused: bool,
    tx: Option<mpsc::UnboundedSender<SinkEvent>>,
}

impl NullSink {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            source: None,
            volume: 1.0,
            position: Duration::ZERO,
            paused: true,
            tx: None,
        }
    }

    fn emit(&self, evt: SinkEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(evt);
        }
    }
}

impl AudioSink for NullSink {
    fn set_source(&mut self, url: Option<&str>) {
        tracing::debug!(sink = self.name, ?url, "null sink source");
        self.paused = true;
        match url {
            Some(url) => {
                self.source = Some(url.to_owned());
                self.emit(SinkEvent::LoadStart);
                self.emit(SinkEvent::LoadedData);
                self.emit(SinkEvent::CanPlay);
            }
            None => {
                if self.source.take().is_some() {
                    self.emit(SinkEvent::Error("empty source".to_owned()));
                }
            }
        }
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn play(&mut self) -> PlayFuture {
        if self.source.is_none() {
            return future::ready(Err(SinkError::Rejected("no source".to_owned()))).boxed();
        }
        self.paused = false;
        self.emit(SinkEvent::Playing);
        future::ready(Ok(())).boxed()
    }

    fn pause(&mut self) {
        if !self.paused && self.source.is_some() {
            self.emit(SinkEvent::Pause);
        }
        self.paused = true;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f32 {
        self.volume
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

//! The media engine capability the controller drives.
//!
//! A sink loads a URL, plays, pauses and reports what happens through an event
//! stream. The controller owns exactly two of them and is the only code that
//! mutates their source or volume.

use futures_util::future::BoxFuture;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::SinkError;

/// Media events, named after the HTML media element events they model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    LoadStart,
    LoadedData,
    Playing,
    Pause,
    Ended,
    Error(String),
    Waiting,
    CanPlay,
}

impl SinkEvent {
    /// The source has buffered enough to start.
    pub fn is_ready(&self) -> bool {
        matches!(self, SinkEvent::LoadedData | SinkEvent::CanPlay)
    }
}

pub type PlayFuture = BoxFuture<'static, Result<(), SinkError>>;

pub trait AudioSink: Send + 'static {
    /// `None` empties the sink. Engines usually report an error event when
    /// a playing source is cleared.
    fn set_source(&mut self, url: Option<&str>);
    fn source(&self) -> Option<&str>;
    /// Resolves once playback actually started, or with the reason it did not.
    fn play(&mut self) -> PlayFuture;
    fn pause(&mut self);
    /// `volume` in `[0, 1]`.
    fn set_volume(&mut self, volume: f32);
    fn volume(&self) -> f32;
    fn position(&self) -> Duration;
    fn set_position(&mut self, position: Duration);
    /// Starts a fresh event stream; the previous subscription stops receiving.
    fn subscribe(&mut self) -> Subscription;
}

/// Owned handle on a sink's event stream. Dropping it releases the stream.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<SinkEvent>,
    closed: bool,
}

impl Subscription {
    /// Pair for sink implementations: keep the sender, hand out the subscription.
    pub fn channel() -> (mpsc::UnboundedSender<SinkEvent>, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Subscription { rx, closed: false })
    }

    /// Next event. Once the sink side hangs up this stays pending forever,
    /// so it is safe to poll from a `select!` loop.
    pub async fn next(&mut self) -> SinkEvent {
        if !self.closed {
            if let Some(evt) = self.rx.recv().await {
                return evt;
            }
            self.closed = true;
            tracing::debug!("sink event stream closed");
        }
        std::future::pending().await
    }

    pub fn try_next(&mut self) -> Option<SinkEvent> {
        self.rx.try_recv().ok()
    }
}

/// A sink plus the subscription currently wired to it.
pub(crate) struct SinkSlot<S: AudioSink> {
    pub(crate) sink: S,
    pub(crate) events: Subscription,
}

impl<S: AudioSink> SinkSlot<S> {
    pub(crate) fn new(mut sink: S) -> Self {
        let events = sink.subscribe();
        Self { sink, events }
    }

    /// Drops the old wiring (and anything still queued on it) and subscribes again.
    pub(crate) fn rewire(&mut self) {
        self.events = self.sink.subscribe();
    }

    /// Pause, rewind, empty the source, silence.
    pub(crate) fn clear(&mut self) {
        self.sink.pause();
        self.sink.set_position(Duration::ZERO);
        self.sink.set_source(None);
        self.sink.set_volume(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscription_delivers_in_order() {
        let (tx, mut sub) = Subscription::channel();
        tx.send(SinkEvent::LoadStart).unwrap();
        tx.send(SinkEvent::CanPlay).unwrap();
        assert_eq!(sub.next().await, SinkEvent::LoadStart);
        assert_eq!(sub.next().await, SinkEvent::CanPlay);
        assert!(sub.try_next().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_subscription_stays_pending() {
        let (tx, mut sub) = Subscription::channel();
        drop(tx);
        let res = tokio::time::timeout(Duration::from_secs(1), sub.next()).await;
        assert!(res.is_err());
    }

    #[test]
    fn ready_events() {
        assert!(SinkEvent::CanPlay.is_ready());
        assert!(SinkEvent::LoadedData.is_ready());
        assert!(!SinkEvent::LoadStart.is_ready());
        assert!(!SinkEvent::Error("x".into()).is_ready());
    }
}

//! Sink backed by an `mpv` child process driven over its JSON IPC socket.
//!
//! ```text
//!   MpvSink::spawn()
//!         ├── writer_task  ← requests in order, one JSON line each
//!         └── reader_task  ← replies (request_id) → oneshot
//!                            events / property-change → SinkEvent
//! ```

use futures_util::future::FutureExt;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc, oneshot};

use crate::error::SinkError;

use super::sink::{AudioSink, PlayFuture, SinkEvent, Subscription};

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

const OBS_PAUSE: u64 = 1;
const OBS_PAUSED_FOR_CACHE: u64 = 2;

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

type Reply = oneshot::Sender<Result<Value, SinkError>>;
type PendingMap = Arc<Mutex<HashMap<u64, Reply>>>;
type Subscriber = Arc<std::sync::Mutex<Option<mpsc::UnboundedSender<SinkEvent>>>>;

struct MpvRequest {
    req_id: u64,
    payload: String,
    reply: Option<Reply>,
}

pub struct MpvSink {
    label: String,
    tx: mpsc::UnboundedSender<MpvRequest>,
    subscriber: Subscriber,
    source: Option<String>,
    volume: f32,
    position: Duration,
    socket_path: PathBuf,
    _child: Child,
}

impl MpvSink {
    /// Starts `binary` in idle mode and connects to its IPC socket.
    pub async fn spawn(binary: &str, label: &str) -> Result<Self, SinkError> {
        let socket_path = std::env::temp_dir().join(format!(
            "rrradio-mpv-{}-{label}.sock",
            std::process::id()
        ));
        let _ = tokio::fs::remove_file(&socket_path).await;

        tracing::info!(label, binary, socket = %socket_path.display(), "spawning mpv");
        let child = Command::new(binary)
            .arg("--no-video")
            .arg("--idle=yes")
            .arg("--pause")
            .arg("--quiet")
            .arg("--volume=0")
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SinkError::Ipc(format!("spawn {binary}: {e}")))?;

        for _ in 0..50 {
            if socket_path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        let stream = UnixStream::connect(&socket_path)
            .await
            .map_err(|e| SinkError::Ipc(format!("connect {}: {e}", socket_path.display())))?;
        tracing::info!(label, "mpv connected");

        let (read_half, write_half) = stream.into_split();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let subscriber: Subscriber = Arc::new(std::sync::Mutex::new(None));
        let (tx, rx) = mpsc::unbounded_channel::<MpvRequest>();

        tokio::spawn(writer_task(write_half, rx, pending.clone()));
        tokio::spawn(reader_task(
            BufReader::new(read_half),
            pending,
            subscriber.clone(),
            label.to_owned(),
        ));

        let sink = Self {
            label: label.to_owned(),
            tx,
            subscriber,
            source: None,
            volume: 0.0,
            position: Duration::ZERO,
            socket_path,
            _child: child,
        };
        sink.post(json!(["observe_property", OBS_PAUSE, "pause"]));
        sink.post(json!(["observe_property", OBS_PAUSED_FOR_CACHE, "paused-for-cache"]));
        Ok(sink)
    }

    fn enqueue(&self, command: Value, reply: Option<Reply>) {
        let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
        let mut payload = json!({ "command": command, "request_id": req_id }).to_string();
        payload.push('\n');
        let req = MpvRequest {
            req_id,
            payload,
            reply,
        };
        if let Err(mpsc::error::SendError(req)) = self.tx.send(req)
            && let Some(reply) = req.reply
        {
            let _ = reply.send(Err(SinkError::Disconnected));
        }
    }

    /// Fire and forget; failures surface in the log only.
    fn post(&self, command: Value) {
        self.enqueue(command, None);
    }

    fn request(&self, command: Value) -> oneshot::Receiver<Result<Value, SinkError>> {
        let (reply, rx) = oneshot::channel();
        self.enqueue(command, Some(reply));
        rx
    }
}

impl Drop for MpvSink {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

impl AudioSink for MpvSink {
    fn set_source(&mut self, url: Option<&str>) {
        tracing::debug!(label = %self.label, ?url, "mpv source");
        match url {
            Some(url) => {
                self.post(json!(["set_property", "pause", true]));
                self.post(json!(["loadfile", url, "replace"]));
                self.source = Some(url.to_owned());
            }
            None => {
                self.post(json!(["stop"]));
                self.source = None;
            }
        }
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn play(&mut self) -> PlayFuture {
        if self.source.is_none() {
            return futures_util::future::ready(Err(SinkError::Rejected("no source".to_owned())))
                .boxed();
        }
        let rx = self.request(json!(["set_property", "pause", false]));
        async move {
            match tokio::time::timeout(REPLY_TIMEOUT, rx).await {
                Ok(Ok(Ok(_))) => Ok(()),
                Ok(Ok(Err(e))) => Err(e),
                Ok(Err(_)) => Err(SinkError::Disconnected),
                Err(_) => Err(SinkError::Ipc("reply timed out".to_owned())),
            }
        }
        .boxed()
    }

    fn pause(&mut self) {
        self.post(json!(["set_property", "pause", true]));
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.post(json!(["set_property", "volume", self.volume * 100.0]));
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn position(&self) -> Duration {
        self.position
    }

    // Live streams are not seekable; only a rewind to zero is meaningful and
    // `stop` already implies it.
    fn set_position(&mut self, position: Duration) {
        self.position = position;
    }

    fn subscribe(&mut self) -> Subscription {
        let (tx, sub) = Subscription::channel();
        if let Ok(mut guard) = self.subscriber.lock() {
            *guard = Some(tx);
        }
        sub
    }
}

/// Translates one unsolicited mpv message.
fn map_event(raw: &Value) -> Vec<SinkEvent> {
    let Some(name) = raw.get("event").and_then(Value::as_str) else {
        return Vec::new();
    };
    match name {
        "start-file" => vec![SinkEvent::LoadStart],
        "file-loaded" => vec![SinkEvent::LoadedData, SinkEvent::CanPlay],
        "end-file" => match raw.get("reason").and_then(Value::as_str) {
            Some("eof") => vec![SinkEvent::Ended],
            Some("error") => {
                let msg = raw
                    .get("file_error")
                    .and_then(Value::as_str)
                    .unwrap_or("stream error");
                vec![SinkEvent::Error(msg.to_owned())]
            }
            _ => Vec::new(),
        },
        "property-change" => {
            let id = raw.get("id").and_then(Value::as_u64);
            let flag = raw.get("data").and_then(Value::as_bool);
            match (id, flag) {
                (Some(OBS_PAUSE), Some(true)) => vec![SinkEvent::Pause],
                (Some(OBS_PAUSE), Some(false)) => vec![SinkEvent::Playing],
                (Some(OBS_PAUSED_FOR_CACHE), Some(true)) => vec![SinkEvent::Waiting],
                (Some(OBS_PAUSED_FOR_CACHE), Some(false)) => vec![SinkEvent::CanPlay],
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

async fn fail_all(pending: &PendingMap, err: SinkError) {
    let mut map = pending.lock().await;
    for (_, tx) in map.drain() {
        let _ = tx.send(Err(err.clone()));
    }
}

async fn reader_task(
    mut reader: BufReader<OwnedReadHalf>,
    pending: PendingMap,
    subscriber: Subscriber,
    label: String,
) {
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                tracing::warn!(%label, "mpv connection closed");
                fail_all(&pending, SinkError::Disconnected).await;
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let val: Value = match serde_json::from_str(trimmed) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::debug!(%label, err = %e, "mpv sent invalid json");
                        continue;
                    }
                };

                if let Some(req_id) = val.get("request_id").and_then(Value::as_u64) {
                    let Some(tx) = pending.lock().await.remove(&req_id) else {
                        continue;
                    };
                    let error = val
                        .get("error")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_owned();
                    let result = if error == "success" {
                        Ok(val)
                    } else {
                        Err(SinkError::Rejected(error))
                    };
                    let _ = tx.send(result);
                    continue;
                }

                tracing::trace!(%label, event = %trimmed, "mpv event");
                let events = map_event(&val);
                if events.is_empty() {
                    continue;
                }
                if let Ok(guard) = subscriber.lock()
                    && let Some(tx) = guard.as_ref()
                {
                    for evt in events {
                        let _ = tx.send(evt);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(%label, err = %e, "mpv read error");
                fail_all(&pending, SinkError::Ipc(e.to_string())).await;
                break;
            }
        }
    }
    if let Ok(mut guard) = subscriber.lock()
        && let Some(tx) = guard.take()
    {
        let _ = tx.send(SinkEvent::Error("audio engine exited".to_owned()));
    }
}

async fn writer_task(
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<MpvRequest>,
    pending: PendingMap,
) {
    while let Some(req) = rx.recv().await {
        if let Some(reply) = req.reply {
            pending.lock().await.insert(req.req_id, reply);
        }
        if let Err(e) = writer.write_all(req.payload.as_bytes()).await {
            tracing::warn!(err = %e, "mpv write error");
            fail_all(&pending, SinkError::Ipc(e.to_string())).await;
            break;
        }
    }
    tracing::debug!("mpv writer exiting");
}

//! Line-oriented front end: reads commands from stdin, prints status changes.

mod command;
mod render;

pub use command::{ConsoleCommand, CrossfadeChange, HELP, parse};
pub use render::{settings_line, station_list, status_line};

use futures_util::StreamExt;
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::FuturesUnordered;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::select;
use tokio::sync::mpsc;

use crate::catalog::StationCatalog;
use crate::domain::Station;
use crate::error::{AppError, PlaybackError};
use crate::playback::{PlaybackEvent, PlaybackHandle, PlayerStatus, SkipDirection};
use crate::settings::{AppSettings, save_settings};
use crate::store::JsonStore;

type PlayOutcome = (Station, Result<(), PlaybackError>);

pub struct Console {
    catalog: StationCatalog,
    store: JsonStore,
    settings: AppSettings,
    handle: PlaybackHandle,
    status: PlayerStatus,
    requests: FuturesUnordered<BoxFuture<'static, PlayOutcome>>,
}

impl Console {
    pub fn new(
        catalog: StationCatalog,
        store: JsonStore,
        settings: AppSettings,
        handle: PlaybackHandle,
    ) -> Self {
        Self {
            catalog,
            store,
            settings,
            handle,
            status: PlayerStatus::idle(),
            requests: FuturesUnordered::new(),
        }
    }

    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<PlaybackEvent>,
    ) -> Result<(), AppError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("{}", station_list(self.catalog.stations(), None));
        println!("{}", settings_line(&self.settings));
        println!("type `help` for commands");

        loop {
            select! {
                evt = events.recv() => {
                    let Some(evt) = evt else {
                        tracing::warn!("playback events closed");
                        break;
                    };
                    self.on_event(evt);
                }
                Some((station, res)) = self.requests.next(), if !self.requests.is_empty() => {
                    self.on_play_outcome(&station, res);
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        tracing::info!("stdin closed");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse(&line) {
                        Ok(ConsoleCommand::Quit) => break,
                        Ok(cmd) => {
                            if let Err(e) = self.execute(cmd).await {
                                tracing::warn!(err = %e, "command failed");
                                println!("! {e}");
                            }
                        }
                        Err(msg) => println!("! {msg}"),
                    }
                }
            }
        }

        let _ = self.handle.stop().await;
        Ok(())
    }

    async fn execute(&mut self, cmd: ConsoleCommand) -> Result<(), AppError> {
        tracing::debug!(?cmd, "console command");
        match cmd {
            ConsoleCommand::Play(token) => {
                let station = self
                    .catalog
                    .resolve(&token)
                    .cloned()
                    .ok_or_else(|| AppError::Other(format!("no station `{token}`")))?;
                self.request_play(station);
            }
            ConsoleCommand::TogglePause => self.handle.toggle_pause().await?,
            ConsoleCommand::Stop => self.handle.stop().await?,
            ConsoleCommand::Next => self.skip(SkipDirection::Next),
            ConsoleCommand::Previous => self.skip(SkipDirection::Previous),
            ConsoleCommand::Volume(v) => {
                self.settings.volume = v;
                self.handle.set_volume(f32::from(v)).await?;
                self.persist_settings();
            }
            ConsoleCommand::Crossfade(change) => {
                match change {
                    CrossfadeChange::Enable(on) => self.settings.crossfade_enabled = on,
                    CrossfadeChange::DurationMs(ms) => {
                        self.settings.crossfade_enabled = true;
                        self.settings.crossfade_duration_ms = ms;
                    }
                }
                self.settings = self.settings.clone().normalized();
                self.handle.set_crossfade(self.settings.crossfade()).await?;
                self.persist_settings();
                println!("{}", settings_line(&self.settings));
            }
            ConsoleCommand::MediaKey(key) => self.handle.remote(key).await?,
            ConsoleCommand::List => {
                let playing = self.status.station.as_ref().map(|s| s.id.as_str());
                println!("{}", station_list(self.catalog.stations(), playing));
            }
            ConsoleCommand::Status => {
                println!("{}", status_line(&self.status));
                println!("{}", settings_line(&self.settings));
            }
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => {}
        }
        Ok(())
    }

    fn request_play(&mut self, station: Station) {
        if self.status.is_transitioning() {
            println!("! still switching stations, try again in a moment");
            return;
        }
        let handle = self.handle.clone();
        self.requests.push(
            async move {
                let res = handle.play_station(station.clone()).await;
                (station, res)
            }
            .boxed(),
        );
    }

    /// Previous/next relative to the current station, or the list ends when idle.
    fn skip(&mut self, dir: SkipDirection) {
        let offset = match dir {
            SkipDirection::Next => 1,
            SkipDirection::Previous => -1,
        };
        let target = match self.status.station.as_ref() {
            Some(cur) => self.catalog.neighbor(&cur.id, offset),
            None => match dir {
                SkipDirection::Next => self.catalog.stations().first(),
                SkipDirection::Previous => self.catalog.stations().last(),
            },
        };
        match target.cloned() {
            Some(station) => self.request_play(station),
            None => println!("! no stations"),
        }
    }

    fn on_event(&mut self, evt: PlaybackEvent) {
        match evt {
            PlaybackEvent::Status(status) => {
                println!("{}", status_line(&status));
                self.status = status;
            }
            PlaybackEvent::Notice(msg) => println!("! {msg}"),
            PlaybackEvent::SkipRequested(dir) => self.skip(dir),
        }
    }

    fn on_play_outcome(&mut self, station: &Station, res: Result<(), PlaybackError>) {
        match res {
            Ok(()) => tracing::debug!(station_id = %station.id, "play request settled"),
            Err(PlaybackError::IllegalTransition) => {
                println!("! still switching stations, try again in a moment");
            }
            Err(PlaybackError::Cancelled) => {
                tracing::debug!(station_id = %station.id, "play request cancelled");
            }
            // Failures that reach the user already arrived as a notice.
            Err(e) if e.is_user_facing() => {
                tracing::info!(station_id = %station.id, err = %e, "play request failed");
            }
            Err(e) => println!("! {e}"),
        }
    }

    fn persist_settings(&self) {
        if let Err(e) = save_settings(&self.store, &self.settings) {
            tracing::warn!(err = %e, "failed to save settings");
            println!("! settings not saved: {e}");
        }
    }
}

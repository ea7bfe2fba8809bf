use clap::Parser;
use directories::ProjectDirs;
use std::env;
use std::path::PathBuf;

use rrradio::catalog::{StationCatalog, StationEdit};
use rrradio::cli::{Cli, Command, SettingsArgs, no_audio_requested};
use rrradio::console::{Console, settings_line, station_list};
use rrradio::error::{AppError, CatalogError};
use rrradio::logging;
use rrradio::media_session::TracingMediaSession;
use rrradio::playback::{
    AudioBackend, ControllerConfig, NullSink, PlaybackEvent, PlaybackHandle, spawn_controller,
};
use rrradio::settings::{AppSettings, load_settings, save_settings};
use rrradio::store::JsonStore;
use tokio::sync::mpsc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let data_dir = match cli.data_dir.clone() {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    let no_audio_env = env::var("RRRADIO_NO_AUDIO").ok();
    let backend = if no_audio_requested(cli.no_audio, no_audio_env.as_deref()) {
        AudioBackend::Null
    } else {
        AudioBackend::Mpv {
            binary: cli.mpv.clone(),
        }
    };

    let _log_guard = logging::init(
        &data_dir,
        logging::LogConfig {
            dir: cli.log_dir.clone(),
            filter: cli.log_filter.clone(),
        },
    );
    tracing::info!(data_dir = %data_dir.display(), ?backend, "rrradio starting");

    let store = JsonStore::new(&data_dir);

    match cli.command.unwrap_or(Command::Console) {
        Command::Console => {
            let settings = load_settings(&store);
            let catalog = StationCatalog::open(store.clone());
            let (handle, events) = start_playback(&backend, &settings).await?;
            Console::new(catalog, store, settings, handle).run(events).await
        }
        Command::List => {
            let catalog = StationCatalog::open(store);
            println!("{}", station_list(catalog.stations(), None));
            Ok(())
        }
        Command::Add { name, url, image } => {
            let mut catalog = StationCatalog::open(store);
            let station = catalog.add(&name, &url, image.as_deref())?;
            println!("added {} [{}]", station.name, station.id);
            Ok(())
        }
        Command::Edit {
            station,
            name,
            url,
            image,
        } => {
            let mut catalog = StationCatalog::open(store);
            let id = resolve_id(&catalog, &station)?;
            let edit = StationEdit {
                name,
                url,
                image: image.map(|s| Some(s).filter(|s| !s.trim().is_empty())),
            };
            let updated = catalog.update(&id, edit)?;
            println!("updated {} [{}]", updated.name, updated.id);
            Ok(())
        }
        Command::Remove { station } => {
            let mut catalog = StationCatalog::open(store);
            let id = resolve_id(&catalog, &station)?;
            let removed = catalog.remove(&id)?;
            println!("removed {} [{}]", removed.name, removed.id);
            Ok(())
        }
        Command::Move { station, position } => {
            let mut catalog = StationCatalog::open(store);
            let id = resolve_id(&catalog, &station)?;
            catalog.move_to(&id, position.saturating_sub(1))?;
            println!("{}", station_list(catalog.stations(), None));
            Ok(())
        }
        Command::Settings(args) => {
            let settings = apply_settings_args(load_settings(&store), args);
            save_settings(&store, &settings)?;
            println!("{}", settings_line(&settings));
            Ok(())
        }
    }
}

fn default_data_dir() -> Result<PathBuf, AppError> {
    ProjectDirs::from("dev", "rrradio", "rrradio")
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .ok_or_else(|| AppError::Other("cannot determine a data directory".to_owned()))
}

fn resolve_id(catalog: &StationCatalog, token: &str) -> Result<String, CatalogError> {
    catalog
        .resolve(token)
        .map(|s| s.id.clone())
        .ok_or_else(|| CatalogError::NotFound(token.to_owned()))
}

fn apply_settings_args(mut s: AppSettings, args: SettingsArgs) -> AppSettings {
    if let Some(v) = args.volume {
        s.volume = v;
    }
    if let Some(on) = args.crossfade {
        s.crossfade_enabled = on;
    }
    if let Some(ms) = args.crossfade_ms {
        s.crossfade_duration_ms = ms;
    }
    s.normalized()
}

async fn start_playback(
    backend: &AudioBackend,
    settings: &AppSettings,
) -> Result<(PlaybackHandle, mpsc::UnboundedReceiver<PlaybackEvent>), AppError> {
    let config = ControllerConfig {
        crossfade: settings.crossfade(),
        volume: settings.volume_fraction(),
    };
    let media = Box::new(TracingMediaSession::default());
    match backend {
        AudioBackend::Null => Ok(spawn_controller(
            NullSink::new("a"),
            NullSink::new("b"),
            config,
            media,
        )),
        #[cfg(unix)]
        AudioBackend::Mpv { binary } => {
            use rrradio::playback::MpvSink;
            let a = MpvSink::spawn(binary, "a")
                .await
                .map_err(|e| AppError::Backend(e.to_string()))?;
            let b = MpvSink::spawn(binary, "b")
                .await
                .map_err(|e| AppError::Backend(e.to_string()))?;
            Ok(spawn_controller(a, b, config, media))
        }
        #[cfg(not(unix))]
        AudioBackend::Mpv { .. } => Err(AppError::Backend(
            "mpv backend needs a unix platform; use --no-audio".to_owned(),
        )),
    }
}

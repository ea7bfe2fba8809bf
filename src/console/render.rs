use crate::domain::Station;
use crate::playback::{PlaybackState, PlayerStatus, TransitionState};
use crate::settings::AppSettings;

pub const NOTHING_PLAYING: &str = "Select a station";

/// One-line status as shown after every change.
pub fn status_line(status: &PlayerStatus) -> String {
    let icon = match status.state {
        PlaybackState::Playing | PlaybackState::Buffering => "▶",
        PlaybackState::Paused => "⏸",
        PlaybackState::Loading => "…",
        PlaybackState::Error => "✖",
        PlaybackState::Idle | PlaybackState::Ended => "■",
    };
    let title = status
        .station
        .as_ref()
        .map_or(NOTHING_PLAYING, |s| s.name.as_str());
    let mut line = format!("{icon} {} · {title}", status.state.label());
    match status.transition {
        TransitionState::Preparing => line.push_str(" (preparing next station)"),
        TransitionState::Fading => line.push_str(" (crossfading)"),
        TransitionState::Inactive | TransitionState::Committing | TransitionState::Aborting => {}
    }
    line
}

pub fn station_list(stations: &[Station], playing: Option<&str>) -> String {
    if stations.is_empty() {
        return "no stations".to_owned();
    }
    stations
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let mark = if playing == Some(s.id.as_str()) { '*' } else { ' ' };
            format!("{mark}{:>3}. {}  <{}>  [{}]", i + 1, s.name, s.url, s.id)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn settings_line(s: &AppSettings) -> String {
    let xf = if s.crossfade_enabled {
        format!("{} ms", s.crossfade_duration_ms)
    } else {
        "off".to_owned()
    };
    format!("volume {}% · crossfade {xf}", s.volume)
}

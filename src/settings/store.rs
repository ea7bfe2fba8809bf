use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::playback::CrossfadeSettings;
use crate::store::JsonStore;

const SETTINGS_KEY: &str = "settings";

pub const MIN_CROSSFADE_MS: u64 = 100;
pub const MAX_CROSSFADE_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// 0..=100
    #[serde(default = "default_volume")]
    pub volume: u8,
    #[serde(default = "default_crossfade_enabled")]
    pub crossfade_enabled: bool,
    #[serde(default = "default_crossfade_duration_ms")]
    pub crossfade_duration_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            crossfade_enabled: default_crossfade_enabled(),
            crossfade_duration_ms: default_crossfade_duration_ms(),
        }
    }
}

fn default_volume() -> u8 { 70 }
fn default_crossfade_enabled() -> bool { true }
fn default_crossfade_duration_ms() -> u64 { 2000 }

impl AppSettings {
    /// Pulls out-of-range values (hand-edited files) back into bounds.
    pub fn normalized(mut self) -> Self {
        self.volume = self.volume.min(100);
        self.crossfade_duration_ms = self
            .crossfade_duration_ms
            .clamp(MIN_CROSSFADE_MS, MAX_CROSSFADE_MS);
        self
    }

    pub fn crossfade(&self) -> CrossfadeSettings {
        CrossfadeSettings {
            enabled: self.crossfade_enabled,
            duration_ms: self.crossfade_duration_ms,
        }
    }

    pub fn volume_fraction(&self) -> f32 {
        f32::from(self.volume.min(100)) / 100.0
    }
}

pub fn load_settings(store: &JsonStore) -> AppSettings {
    match store.load::<AppSettings>(SETTINGS_KEY) {
        Ok(Some(s)) => s.normalized(),
        Ok(None) => AppSettings::default(),
        Err(e) => {
            tracing::warn!(err = %e, "settings unreadable, using defaults");
            AppSettings::default()
        }
    }
}

pub fn save_settings(store: &JsonStore, s: &AppSettings) -> Result<(), StoreError> {
    store.save(SETTINGS_KEY, &s.clone().normalized())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_player_defaults() {
        let s = AppSettings::default();
        assert_eq!(s.volume, 70);
        assert!(s.crossfade_enabled);
        assert_eq!(s.crossfade_duration_ms, 2000);
        assert!((s.volume_fraction() - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn normalized_clamps_ranges() {
        let s = AppSettings {
            volume: 250,
            crossfade_enabled: false,
            crossfade_duration_ms: 5,
        }
        .normalized();
        assert_eq!(s.volume, 100);
        assert_eq!(s.crossfade_duration_ms, MIN_CROSSFADE_MS);

        let s = AppSettings {
            crossfade_duration_ms: 60_000,
            ..AppSettings::default()
        }
        .normalized();
        assert_eq!(s.crossfade_duration_ms, MAX_CROSSFADE_MS);
    }

    #[test]
    fn partial_record_fills_defaults() {
        let s: AppSettings = serde_json::from_str(r#"{"crossfadeEnabled":false}"#).unwrap();
        assert!(!s.crossfade_enabled);
        assert_eq!(s.volume, 70);
        assert_eq!(s.crossfade().duration_ms, 2000);
    }
}

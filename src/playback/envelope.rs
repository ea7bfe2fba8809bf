//! Crossfade volume curve.
//!
//! Everything here is pure: given how far into the fade we are, say what each
//! sink's volume should be. The controller owns the clock.

use tokio::time::{Duration, Instant};

pub const DEFAULT_CROSSFADE_MS: u64 = 2000;

/// Volumes for the outgoing (active) and incoming (standby) sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeLevels {
    pub out_volume: f32,
    pub in_volume: f32,
}

/// Quadratic ease-in-out: `2p²` below the midpoint, `1 - 2(1-p)²` above.
pub fn ease_in_out(p: f32) -> f32 {
    let p = p.clamp(0.0, 1.0);
    if p < 0.5 {
        2.0 * p * p
    } else {
        let q = 1.0 - p;
        1.0 - 2.0 * q * q
    }
}

/// Fraction of the fade elapsed, clamped to `[0, 1]`. A zero duration is already done.
pub fn progress(elapsed_ms: u64, duration_ms: u64) -> f32 {
    if duration_ms == 0 {
        return 1.0;
    }
    (elapsed_ms as f64 / duration_ms as f64).clamp(0.0, 1.0) as f32
}

/// `out = initial * (1 - e(p))`, `in = target * e(p)`.
pub fn levels(elapsed_ms: u64, duration_ms: u64, initial_volume: f32, target_volume: f32) -> EnvelopeLevels {
    levels_at(progress(elapsed_ms, duration_ms), initial_volume, target_volume)
}

fn levels_at(p: f32, initial_volume: f32, target_volume: f32) -> EnvelopeLevels {
    let e = ease_in_out(p);
    EnvelopeLevels {
        out_volume: (initial_volume * (1.0 - e)).clamp(0.0, 1.0),
        in_volume: (target_volume * e).clamp(0.0, 1.0),
    }
}

/// One running fade, tagged with the controller generation that started it.
#[derive(Debug, Clone)]
pub(crate) struct FadeRun {
    pub(crate) generation: u64,
    start: Instant,
    duration: Duration,
    initial_volume: f32,
    last_ratio: f32,
}

impl FadeRun {
    pub(crate) fn new(generation: u64, start: Instant, duration_ms: u64, initial_volume: f32) -> Self {
        Self {
            generation,
            start,
            duration: Duration::from_millis(duration_ms),
            initial_volume,
            last_ratio: 0.0,
        }
    }

    pub(crate) fn initial_volume(&self) -> f32 {
        self.initial_volume
    }

    pub(crate) fn last_ratio(&self) -> f32 {
        self.last_ratio
    }

    /// Levels at `now`; the target is read fresh each frame so volume changes land mid-fade.
    pub(crate) fn sample(&mut self, now: Instant, target_volume: f32) -> (EnvelopeLevels, bool) {
        let elapsed = now.saturating_duration_since(self.start);
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let duration_ms = u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX);
        let p = progress(elapsed_ms, duration_ms);
        // Progress never steps backwards, even if `now` does.
        self.last_ratio = self.last_ratio.max(p);
        let lv = levels_at(self.last_ratio, self.initial_volume, target_volume);
        (lv, self.last_ratio >= 1.0)
    }
}

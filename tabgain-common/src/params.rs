//! Volume scales and engine parameters
//!
//! The engine works in gain factors (1.0 = 100%); the popup collaborator
//! and the persistence layer work in integer percent (0-500). Conversions
//! and clamping live here so every component agrees on the ranges.

use std::time::Duration;

/// Minimum gain factor (silence)
pub const MIN_VOLUME: f32 = 0.0;

/// Maximum gain factor (500%)
pub const MAX_VOLUME: f32 = 5.0;

/// Default gain factor when a site has no saved volume (100%)
pub const DEFAULT_VOLUME: f32 = 1.0;

/// Maximum persisted percent value
pub const MAX_VOLUME_PERCENT: u16 = 500;

/// Default persisted percent value
pub const DEFAULT_VOLUME_PERCENT: u16 = 100;

/// Gain smoothing time constant
///
/// Applied on every target change to avoid audible clicks on rapid
/// slider movement.
pub const GAIN_SMOOTHING: Duration = Duration::from_millis(100);

/// Minimum interval between full document scans
///
/// Discovery calls inside this window coalesce into a no-op to bound
/// cost on pages with frequent layout churn.
pub const DISCOVERY_THROTTLE: Duration = Duration::from_millis(500);

/// Debounce window for batching mutation-inserted elements
pub const MUTATION_DEBOUNCE: Duration = Duration::from_millis(100);

/// Clamp a requested gain factor into the supported range
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return DEFAULT_VOLUME;
    }
    volume.clamp(MIN_VOLUME, MAX_VOLUME)
}

/// Convert a persisted integer percent (0-500) to a gain factor
pub fn percent_to_volume(percent: u16) -> f32 {
    let percent = percent.min(MAX_VOLUME_PERCENT);
    percent as f32 / 100.0
}

/// Convert a gain factor to the persisted integer percent scale
pub fn volume_to_percent(volume: f32) -> u16 {
    (clamp_volume(volume) * 100.0).round() as u16
}

/// Normalize a hostname into a persistence key
///
/// Keys are trimmed, lowercased, and stripped of a trailing dot.
/// Nothing else is folded, so distinct hosts never share a saved
/// volume.
pub fn normalize_hostname(hostname: &str) -> String {
    hostname
        .trim()
        .trim_end_matches('.')
        .to_ascii_lowercase()
}

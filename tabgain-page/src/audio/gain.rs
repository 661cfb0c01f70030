//! Gain node with smoothed target changes
//!
//! Target changes apply with an exponential approach toward the new
//! value (set-target-at-time semantics): v(t) converges monotonically
//! to the target with the configured time constant, so rapid slider
//! movement never produces audible clicks.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

struct GainCurve {
    start_value: f32,
    target: f32,
    start_at: Instant,
    time_constant: Duration,
}

impl GainCurve {
    fn value_at(&self, now: Instant) -> f32 {
        let tau = self.time_constant.as_secs_f32();
        if tau <= f32::EPSILON {
            return self.target;
        }
        let elapsed = now.saturating_duration_since(self.start_at).as_secs_f32();
        self.target + (self.start_value - self.target) * (-elapsed / tau).exp()
    }
}

/// The single gain stage between every connected element and the
/// audio destination
pub struct GainNode {
    curve: Mutex<GainCurve>,
}

impl GainNode {
    /// Create a gain node resting at `initial`
    pub fn new(initial: f32) -> Self {
        Self {
            curve: Mutex::new(GainCurve {
                start_value: initial,
                target: initial,
                start_at: Instant::now(),
                time_constant: Duration::ZERO,
            }),
        }
    }

    /// Begin an exponential approach toward `target`
    ///
    /// The approach starts from the instantaneous current value, so
    /// overlapping changes chain smoothly.
    pub fn set_target_at_time(&self, target: f32, time_constant: Duration) {
        let now = Instant::now();
        let mut curve = self.curve.lock().unwrap();
        let current = curve.value_at(now);
        *curve = GainCurve {
            start_value: current,
            target,
            start_at: now,
            time_constant,
        };
    }

    /// The target the node is converging toward
    pub fn target(&self) -> f32 {
        self.curve.lock().unwrap().target
    }

    /// Instantaneous gain value
    pub fn value(&self) -> f32 {
        self.value_at(Instant::now())
    }

    /// Gain value at an arbitrary instant (test hook)
    pub fn value_at(&self, now: Instant) -> f32 {
        self.curve.lock().unwrap().value_at(now)
    }
}

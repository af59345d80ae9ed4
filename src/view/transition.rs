//! Fixed-duration eased transitions.

use std::time::Duration;

/// Bars grow into place over this long.
pub const BAR_GROWTH: Duration = Duration::from_millis(1000);
pub const TOOLTIP_FADE_IN: Duration = Duration::from_millis(200);
pub const TOOLTIP_FADE_OUT: Duration = Duration::from_millis(500);

/// Cubic in-out easing of `t`, clamped to `[0, 1]`.
pub fn cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub duration: Duration,
}

impl Transition {
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Eased progress in `[0, 1]` after `elapsed`.
    pub fn progress(&self, elapsed: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        cubic_in_out(elapsed.as_secs_f64() / self.duration.as_secs_f64())
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}

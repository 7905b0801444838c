//! Time-based settle animation for snapping the strip onto a page boundary.

use std::time::{Duration, Instant};

/// Cubic ease-in-out mapping of linear progress, accelerating out of the
/// release point and decelerating into the page boundary.
fn ease_in_out_cubic(progress: f32) -> f32 {
    let t = progress.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// In-flight snap of the scroll offset toward a page boundary.
///
/// Duration scales linearly with the distance to cover, so short corrections
/// finish quickly and full page turns stay readable.
pub(crate) struct SnapAnimation {
    from: f32,
    to: f32,
    started_at: Instant,
    duration: Duration,
}

impl SnapAnimation {
    pub(crate) fn new(from: f32, to: f32, started_at: Instant, time_per_px: Duration) -> Self {
        let distance = (to - from).abs();
        Self {
            from,
            to,
            started_at,
            duration: time_per_px.mul_f64(f64::from(distance)),
        }
    }

    /// Offset at `now`, landing exactly on the target once finished.
    pub(crate) fn sample(&self, now: Instant) -> f32 {
        if self.is_finished(now) {
            return self.to;
        }
        let elapsed = now.duration_since(self.started_at).as_secs_f32();
        let progress = elapsed / self.duration.as_secs_f32();
        self.from + (self.to - self.from) * ease_in_out_cubic(progress)
    }

    pub(crate) fn is_finished(&self, now: Instant) -> bool {
        now.duration_since(self.started_at) >= self.duration
    }

    pub(crate) fn target(&self) -> f32 {
        self.to
    }
}

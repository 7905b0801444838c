//! Pointer velocity estimation for fling detection.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

/// How far back pointer samples still count toward the release velocity.
const SAMPLE_WINDOW: Duration = Duration::from_millis(250);
/// Pause length after which a held pointer no longer counts as moving.
const IDLE_CUTOFF: Duration = Duration::from_millis(100);

/// Sliding-window estimator of horizontal pointer velocity.
///
/// Fed one delta per pointer move, it reports pixels per second at release
/// time, weighted toward the most recent motion so the end of the gesture
/// decides the fling rather than its start.
pub(crate) struct FlingTracker {
    samples: VecDeque<(Instant, f32)>,
    last_update: Instant,
}

impl FlingTracker {
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            samples: VecDeque::new(),
            last_update: now,
        }
    }

    /// Records a pointer displacement of `dx` pixels arriving at `now`.
    pub(crate) fn push_delta(&mut self, now: Instant, dx: f32) {
        let dt = now.duration_since(self.last_update).as_secs_f32();
        if dt > 0.0 {
            let velocity = dx / dt;
            if velocity.is_finite() {
                self.samples.push_back((now, velocity));
            }
        }
        self.last_update = now;
        self.prune(now);
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&(at, _)) = self.samples.front() {
            if now.duration_since(at) > SAMPLE_WINDOW {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Estimated velocity in pixels per second at `now`.
    ///
    /// A pointer that rested on the surface before lifting decays toward
    /// zero over [`IDLE_CUTOFF`] so a drag-then-hold never flings.
    pub(crate) fn resolve(&mut self, now: Instant) -> f32 {
        self.prune(now);
        if self.samples.is_empty() {
            return 0.0;
        }

        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for (index, &(_, velocity)) in self.samples.iter().enumerate() {
            let weight = (index + 1) as f32;
            weighted += velocity * weight;
            total_weight += weight;
        }

        let idle = now.duration_since(self.last_update).as_secs_f32();
        let damping = (1.0 - idle / IDLE_CUTOFF.as_secs_f32()).clamp(0.0, 1.0);
        weighted / total_weight * damping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn test_steady_motion_resolves_to_its_rate() {
        let base = Instant::now();
        let mut tracker = FlingTracker::new(base);
        // -20 px every 20 ms is -1000 px/s.
        for step in 1..=6 {
            tracker.push_delta(at(base, step * 20), -20.0);
        }
        let velocity = tracker.resolve(at(base, 120));
        assert!((velocity + 1000.0).abs() < 1.0, "got {velocity}");
    }

    #[test]
    fn test_recent_motion_outweighs_old() {
        let base = Instant::now();
        let mut tracker = FlingTracker::new(base);
        for step in 1..=5 {
            tracker.push_delta(at(base, step * 20), 40.0);
        }
        for step in 6..=10 {
            tracker.push_delta(at(base, step * 20), -40.0);
        }
        assert!(tracker.resolve(at(base, 200)) < 0.0);
    }

    #[test]
    fn test_resting_before_release_decays_to_zero() {
        let base = Instant::now();
        let mut tracker = FlingTracker::new(base);
        for step in 1..=5 {
            tracker.push_delta(at(base, step * 20), -20.0);
        }
        let halfway = tracker.resolve(at(base, 150));
        assert!((halfway + 500.0).abs() < 1.0, "got {halfway}");
        assert_eq!(tracker.resolve(at(base, 250)), 0.0);
    }

    #[test]
    fn test_stale_samples_are_pruned() {
        let base = Instant::now();
        let mut tracker = FlingTracker::new(base);
        tracker.push_delta(at(base, 20), 100.0);
        // The burst above falls out of the window; only the fresh
        // opposite-direction motion remains.
        tracker.push_delta(at(base, 400), -1.0);
        tracker.push_delta(at(base, 420), -20.0);
        assert!(tracker.resolve(at(base, 420)) < 0.0);
    }

    #[test]
    fn test_empty_and_zero_dt_are_harmless() {
        let base = Instant::now();
        let mut tracker = FlingTracker::new(base);
        assert_eq!(tracker.resolve(base), 0.0);

        tracker.push_delta(base, 50.0);
        let velocity = tracker.resolve(base);
        assert!(velocity.is_finite());
        assert_eq!(velocity, 0.0);
    }
}

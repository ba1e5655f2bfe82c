//! Playback clock - maps host time to a frame index at a take's native rate
//!
//! The index is a pure function of elapsed time: `floor((now - origin) * R)`.
//! How often the host ticks does not matter, only the time it reports.
//! Moving the origin is the only way to change the mapping.
//!
//! Time is kept in integer nanoseconds so that identical elapsed intervals
//! always produce identical indices. The origin is signed because a drift
//! correction may rebase it to before the host's time zero.

use std::time::Duration;

const NANOS_PER_SEC: i128 = 1_000_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackClock {
    /// Host time at which frame 0 is shown, in nanoseconds
    origin: i128,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `now` the time of frame 0
    pub fn reset(&mut self, now: Duration) {
        self.origin = now.as_nanos() as i128;
    }

    /// Move the origin so that `frame_at(now, rate) == frame`.
    ///
    /// The offset is rounded up, so flooring at `now` lands exactly on `frame`.
    pub fn rebase(&mut self, now: Duration, frame: u64, rate: u32) {
        if rate == 0 {
            self.reset(now);
            return;
        }
        let rate = i128::from(rate);
        let offset = (i128::from(frame) * NANOS_PER_SEC + rate - 1) / rate;
        self.origin = now.as_nanos() as i128 - offset;
    }

    /// Frame index due at `now`. Times before the origin map to 0.
    pub fn frame_at(&self, now: Duration, rate: u32) -> u64 {
        let elapsed = now.as_nanos() as i128 - self.origin;
        if elapsed <= 0 {
            return 0;
        }
        let frame = elapsed * i128::from(rate) / NANOS_PER_SEC;
        u64::try_from(frame).unwrap_or(u64::MAX)
    }

    /// Origin in host nanoseconds
    pub fn origin_nanos(&self) -> i128 {
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_floor_of_elapsed_times_rate() {
        let mut clock = PlaybackClock::new();
        clock.reset(secs(5.0));
        assert_eq!(clock.frame_at(secs(5.0), 30), 0);
        assert_eq!(clock.frame_at(Duration::from_millis(5_200), 30), 6);
        assert_eq!(clock.frame_at(Duration::from_millis(5_400), 30), 12);
        assert_eq!(clock.frame_at(Duration::from_millis(5_033), 30), 0);
        assert_eq!(clock.frame_at(Duration::from_millis(5_034), 30), 1);
        assert_eq!(clock.frame_at(secs(6.0), 24), 24);
    }

    #[test]
    fn test_before_origin_is_frame_zero() {
        let mut clock = PlaybackClock::new();
        clock.reset(secs(10.0));
        assert_eq!(clock.frame_at(secs(9.0), 30), 0);
    }

    #[test]
    fn test_independent_of_tick_rate() {
        // Same sample times reached through different tick cadences
        let samples_ms = [0u64, 100, 250, 333, 1000, 1234, 2999];
        let mut clock = PlaybackClock::new();
        clock.reset(Duration::ZERO);

        let expected: Vec<u64> = samples_ms
            .iter()
            .map(|ms| ms * 30 / 1000)
            .collect();

        for step_ms in [1u64, 7, 16, 33, 50] {
            let mut got = Vec::new();
            let mut t = 0;
            for &sample in &samples_ms {
                // Query the clock at every intermediate tick, then at the sample
                while t + step_ms < sample {
                    t += step_ms;
                    let _ = clock.frame_at(Duration::from_millis(t), 30);
                }
                t = sample;
                got.push(clock.frame_at(Duration::from_millis(t), 30));
            }
            assert_eq!(got, expected, "tick step {}ms", step_ms);
        }
    }

    #[test]
    fn test_rebase_lands_on_frame() {
        let mut clock = PlaybackClock::new();
        for rate in [24u32, 25, 30, 60] {
            for frame in [1u64, 7, 31, 100, 12_345] {
                let now = secs(3.7);
                clock.rebase(now, frame, rate);
                assert_eq!(clock.frame_at(now, rate), frame, "rate {} frame {}", rate, frame);
            }
        }
    }

    #[test]
    fn test_rebase_before_host_zero() {
        let mut clock = PlaybackClock::new();
        let now = Duration::from_millis(100);
        clock.rebase(now, 31, 30);
        assert!(clock.origin_nanos() < 0);
        assert_eq!(clock.frame_at(now, 30), 31);
        assert_eq!(clock.frame_at(now + Duration::from_millis(100), 30), 34);
    }
}

//! Audio player interface and a wall-clock driven device
//!
//! The scheduler treats the audio device as the ground truth for sync: it
//! only needs to (re)start a clip at a sample offset and read the current
//! sample position back. All calls are synchronous.

use std::time::Instant;

use log::{debug, trace};

/// Audio device as seen by the scheduler
pub trait AudioPlayer {
    /// Select the clip to play next
    fn set_clip(&mut self, clip: &str);
    fn stop(&mut self);
    /// Move the play position to `sample`
    fn seek(&mut self, sample: u64);
    fn play(&mut self);
    fn is_playing(&self) -> bool;
    /// Current play position in samples from the start of the clip
    fn sample_position(&self) -> u64;
}

/// Audio device without output: the sample position advances with
/// wall-clock time while playing.
///
/// `speed` scales the clock (1.0 = real time) to emulate a sound card whose
/// crystal runs slightly fast or slow.
#[derive(Debug)]
pub struct ClockAudio {
    sample_rate: u32,
    speed: f64,
    clip: Option<String>,
    /// Position at the last seek/stop, in samples
    base: u64,
    /// Wall-clock start of the current run
    started_at: Option<Instant>,
}

impl ClockAudio {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            speed: 1.0,
            clip: None,
            base: 0,
            started_at: None,
        }
    }

    /// Clock speed relative to real time; non-positive values are ignored
    pub fn with_speed(mut self, speed: f64) -> Self {
        if speed > 0.0 {
            self.speed = speed;
        }
        self
    }

    /// Speed from a drift in parts per million (+100 = 0.01% fast)
    pub fn with_drift_ppm(self, ppm: f64) -> Self {
        self.with_speed(1.0 + ppm / 1_000_000.0)
    }

    pub fn clip(&self) -> Option<&str> {
        self.clip.as_deref()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn elapsed_samples(&self) -> u64 {
        self.started_at.map_or(0, |t| {
            (t.elapsed().as_secs_f64() * f64::from(self.sample_rate) * self.speed) as u64
        })
    }
}

impl AudioPlayer for ClockAudio {
    fn set_clip(&mut self, clip: &str) {
        debug!("Audio clip: {}", clip);
        self.clip = Some(clip.to_string());
        self.base = 0;
        self.started_at = None;
    }

    fn stop(&mut self) {
        self.base = self.sample_position();
        self.started_at = None;
    }

    fn seek(&mut self, sample: u64) {
        trace!("Audio seek to sample {}", sample);
        self.base = sample;
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }

    fn play(&mut self) {
        if self.clip.is_none() || self.started_at.is_some() {
            return;
        }
        self.started_at = Some(Instant::now());
    }

    fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }

    fn sample_position(&self) -> u64 {
        self.base + self.elapsed_samples()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Scripted device: the test sets the sample position directly and reads
    /// back every call the scheduler made.
    #[derive(Debug, Default)]
    pub(crate) struct FakeAudioState {
        pub clip: Option<String>,
        pub playing: bool,
        pub position: u64,
        pub calls: Vec<String>,
    }

    #[derive(Debug, Clone, Default)]
    pub(crate) struct FakeAudio(pub Rc<RefCell<FakeAudioState>>);

    impl AudioPlayer for FakeAudio {
        fn set_clip(&mut self, clip: &str) {
            let mut s = self.0.borrow_mut();
            s.clip = Some(clip.to_string());
            s.calls.push(format!("set_clip {}", clip));
        }

        fn stop(&mut self) {
            let mut s = self.0.borrow_mut();
            s.playing = false;
            s.calls.push("stop".to_string());
        }

        fn seek(&mut self, sample: u64) {
            let mut s = self.0.borrow_mut();
            s.position = sample;
            s.calls.push(format!("seek {}", sample));
        }

        fn play(&mut self) {
            let mut s = self.0.borrow_mut();
            s.playing = s.clip.is_some();
            s.calls.push("play".to_string());
        }

        fn is_playing(&self) -> bool {
            self.0.borrow().playing
        }

        fn sample_position(&self) -> u64 {
            self.0.borrow().position
        }
    }

    #[test]
    fn test_clock_audio_needs_clip() {
        let mut audio = ClockAudio::new(48000);
        audio.play();
        assert!(!audio.is_playing());

        audio.set_clip("take1.wav");
        audio.play();
        assert!(audio.is_playing());
        assert_eq!(audio.clip(), Some("take1.wav"));
    }

    #[test]
    fn test_clock_audio_seek_and_stop() {
        let mut audio = ClockAudio::new(48000);
        audio.set_clip("take1.wav");
        audio.seek(24000);
        assert_eq!(audio.sample_position(), 24000);

        audio.play();
        assert!(audio.sample_position() >= 24000);

        audio.stop();
        assert!(!audio.is_playing());
        let frozen = audio.sample_position();
        assert!(frozen >= 24000);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(audio.sample_position(), frozen);
    }

    #[test]
    fn test_clock_audio_advances() {
        let mut audio = ClockAudio::new(48000);
        audio.set_clip("a");
        audio.play();
        std::thread::sleep(std::time::Duration::from_millis(20));
        // At least 10ms worth of samples
        assert!(audio.sample_position() >= 480);
    }

    #[test]
    fn test_drift_speed() {
        let audio = ClockAudio::new(48000).with_drift_ppm(500.0);
        assert!((audio.speed - 1.0005).abs() < 1e-12);
        let audio = ClockAudio::new(48000).with_speed(-1.0);
        assert_eq!(audio.speed, 1.0);
    }
}

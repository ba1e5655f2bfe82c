//! Audio/video synchronizer
//!
//! Audio hardware clocks are what viewers perceive as "on time"; wall-clock
//! frame stepping drifts under load. Every `period_samples` of audio the
//! video position is checked against where it should be and, if it lags,
//! jumped forward.
//!
//! # Checkpoints
//!
//! Checkpoint k is due once the audio position passes
//! `audio_origin + k * period_samples`. At that point video should be at
//! `k * frames_per_period`. If `frame + 1` is still short of that, the frame
//! is forced to `k * frames_per_period + compensation` and the playback clock
//! is rebased to agree. k advances every time a checkpoint is passed, whether
//! or not a correction was applied.

use std::time::Duration;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use super::audio::AudioPlayer;
use super::error::ConfigError;
use super::session::Session;

/// Session-wide sync constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Audio sample rate in Hz
    pub sample_rate: u32,
    /// Samples between checkpoints (48000 at 48kHz = once per second)
    pub period_samples: u64,
    /// Video frames expected per sync period (30 for 30fps at one second)
    pub frames_per_period: u64,
    /// Frames added past the checkpoint when correcting
    pub compensation: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            period_samples: 48_000,
            frames_per_period: 30,
            compensation: 1,
        }
    }
}

impl SyncSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSync("sample_rate must be > 0".into()));
        }
        if self.period_samples == 0 {
            return Err(ConfigError::InvalidSync("period_samples must be > 0".into()));
        }
        Ok(())
    }
}

/// Result of one synchronizer evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Preconditions not met (frame 0, no clip, audio not playing)
    Skipped,
    /// Audio has not reached the next checkpoint
    NotDue,
    /// Checkpoint passed, video was on schedule
    Checkpoint { checkpoint: u64 },
    /// Checkpoint passed, video was behind and got moved forward
    Corrected { checkpoint: u64, from: u64, to: u64 },
    /// Correction target was past the end of the take, frame reset to 0
    Reset { checkpoint: u64, target: u64 },
}

#[derive(Debug, Clone, Default)]
pub struct Synchronizer {
    settings: SyncSettings,
}

impl Synchronizer {
    pub fn new(settings: SyncSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Reconcile the session's frame index against the audio position.
    ///
    /// `frame_count` and `rate` describe the active take. Leaves the frame
    /// index in `[0, frame_count]`.
    pub fn check(
        &self,
        session: &mut Session,
        audio: Option<&dyn AudioPlayer>,
        frame_count: u64,
        rate: u32,
        now: Duration,
    ) -> SyncOutcome {
        if session.frame == 0 || !session.audio_attached {
            return SyncOutcome::Skipped;
        }
        let Some(audio) = audio.filter(|a| a.is_playing()) else {
            return SyncOutcome::Skipped;
        };

        let k = session.next_sync;
        let due_at = session
            .audio_origin
            .saturating_add(k.saturating_mul(self.settings.period_samples));
        let position = audio.sample_position();
        if position <= due_at {
            return SyncOutcome::NotDue;
        }

        let expected = k.saturating_mul(self.settings.frames_per_period);
        let outcome = if session.frame + 1 < expected {
            let from = session.frame;
            let to = expected + self.settings.compensation;
            session.frame = to;
            session.resume_frame = to;
            session.clock.rebase(now, to, rate);
            if to > frame_count {
                warn!(
                    "Sync checkpoint {}: target frame {} past end of take ({}), restarting",
                    k, to, frame_count
                );
                session.frame = 0;
                session.resume_frame = 0;
                SyncOutcome::Reset { checkpoint: k, target: to }
            } else {
                debug!(
                    "Sync checkpoint {}: video behind audio (sample {}), frame {} -> {}",
                    k, position, from, to
                );
                SyncOutcome::Corrected { checkpoint: k, from, to }
            }
        } else {
            trace!("Sync checkpoint {}: on schedule at frame {}", k, session.frame);
            SyncOutcome::Checkpoint { checkpoint: k }
        };

        session.next_sync += 1;
        outcome
    }
}

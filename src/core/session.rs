//! Playback session - the single mutable state of the scheduler
//!
//! Created once when the player starts and mutated in place for the life of
//! the program; switching takes never creates a new session.

use super::clock::PlaybackClock;

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Loaded, never started (or a take was loaded after finishing)
    #[default]
    Idle,
    Playing,
    /// Frozen, waiting for an external resume
    Paused,
    /// Last take done with looping disabled
    Finished,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Active take id
    pub(crate) active_take: usize,
    /// Current frame index f. 0 means "(re)start the take on the next tick";
    /// N is the past-final-frame value before clamping.
    pub(crate) frame: u64,
    /// Frame the clock is aligned to: the last one presented, or the target
    /// of the latest sync correction. Resume continues from here.
    pub(crate) resume_frame: u64,
    pub(crate) clock: PlaybackClock,
    /// Sample position of frame 0 of the active take
    pub(crate) audio_origin: u64,
    /// Active take has a clip set on the audio player
    pub(crate) audio_attached: bool,
    /// Next sync checkpoint k, reset to 1 when a take restarts
    pub(crate) next_sync: u64,
    pub(crate) state: PlaybackState,
    pub(crate) loop_enabled: bool,
    pub(crate) continuous_play: bool,
    /// Manual advance latched until the next tick consumes it
    pub(crate) advance_requested: bool,
    /// Resumed mid-take; the next tick realigns clock and audio
    pub(crate) resume_pending: bool,
}

impl Session {
    pub fn new(loop_enabled: bool, continuous_play: bool) -> Self {
        Self {
            next_sync: 1,
            loop_enabled,
            continuous_play,
            ..Default::default()
        }
    }

    pub fn active_take(&self) -> usize {
        self.active_take
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn resume_frame(&self) -> u64 {
        self.resume_frame
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn audio_origin(&self) -> u64 {
        self.audio_origin
    }

    pub fn audio_attached(&self) -> bool {
        self.audio_attached
    }

    pub fn next_sync(&self) -> u64 {
        self.next_sync
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub fn continuous_play(&self) -> bool {
        self.continuous_play
    }

    pub fn advance_requested(&self) -> bool {
        self.advance_requested
    }
}

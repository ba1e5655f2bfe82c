//! Take sequencer - the per-tick scheduler and its control surface
//!
//! **Architecture**: `Player` owns the catalog, the preloaded frame cache, the
//! playback session and the audio device. The host calls `tick(now, sink)`
//! once per frame of its own loop with the current host time; nothing in here
//! reads a clock on its own, sleeps or blocks.
//!
//! # Tick
//!
//! 1. Frame 0 (fresh start or restart): reset the clock origin, restart the
//!    audio clip at the take's audio origin, reset the sync checkpoint to 1.
//! 2. Candidate frame = `floor((now - origin) * R)`, clamped to `N - 1`,
//!    presented, and the session index becomes `candidate + 1`.
//! 3. If that index reached `N` or a manual advance was requested: present the
//!    final frame, move to the next take (wrapping when looping), pause when
//!    continuous play is off, and return. Sync is not evaluated on this tick.
//! 4. Otherwise let the synchronizer pull video forward if audio is ahead.
//!
//! # States
//!
//! - `Idle` / `Paused`: ticks do nothing unless a manual advance is pending
//! - `Playing`: full tick
//! - `Finished`: last take done with looping off; only `load_take` leaves it

use std::time::Duration;

use log::{debug, info, warn};

use super::audio::AudioPlayer;
use super::catalog::TakeCatalog;
use super::error::ConfigError;
use super::frame_cache::FrameCache;
use super::presenter::{DisplaySink, present_frame};
use super::session::{PlaybackState, Session};
use super::sync::{SyncOutcome, SyncSettings, Synchronizer};

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing and no manual advance pending
    Inactive,
    /// A frame of the active take was presented
    Presented {
        take: usize,
        frame: u64,
        sync: SyncOutcome,
    },
    /// The active take ended this tick
    TakeEnded {
        finished: usize,
        next: Option<usize>,
        state: PlaybackState,
    },
}

pub struct Player {
    catalog: TakeCatalog,
    cache: FrameCache,
    session: Session,
    sync: Synchronizer,
    audio: Option<Box<dyn AudioPlayer>>,
}

impl Player {
    /// Build the player and load take 0.
    ///
    /// Fails on an empty catalog or unusable sync settings.
    pub fn new(
        catalog: TakeCatalog,
        cache: FrameCache,
        settings: SyncSettings,
        audio: Option<Box<dyn AudioPlayer>>,
    ) -> Result<Self, ConfigError> {
        if catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        settings.validate()?;

        let mut player = Self {
            catalog,
            cache,
            session: Session::new(false, false),
            sync: Synchronizer::new(settings),
            audio,
        };
        player.load_sequence(0);
        info!(
            "Player ready: {} takes, audio device: {}",
            player.catalog.len(),
            if player.audio.is_some() { "yes" } else { "no" }
        );
        Ok(player)
    }

    // === Control surface ===

    /// Make `index` the active take, starting from its first frame.
    ///
    /// Leaves `Finished` for `Idle`; otherwise the play state is unchanged.
    pub fn load_take(&mut self, index: usize) -> Result<(), ConfigError> {
        if index >= self.catalog.len() {
            return Err(ConfigError::TakeOutOfRange {
                index,
                len: self.catalog.len(),
            });
        }
        if self.session.state == PlaybackState::Finished {
            self.session.state = PlaybackState::Idle;
        }
        self.session.resume_pending = false;
        self.load_sequence(index);
        Ok(())
    }

    /// Start or pause playback
    pub fn set_playing(&mut self, playing: bool) {
        match (self.session.state, playing) {
            (PlaybackState::Finished, true) => {
                warn!("Playback finished; load a take to play again");
            }
            (PlaybackState::Playing, false) => {
                self.session.state = PlaybackState::Paused;
                self.stop_audio();
                debug!(
                    "Paused take {} at frame {}",
                    self.session.active_take, self.session.frame
                );
            }
            (PlaybackState::Idle | PlaybackState::Paused, true) => {
                self.session.state = PlaybackState::Playing;
                self.session.resume_pending = self.session.frame != 0;
                debug!(
                    "Playing take {} from frame {}",
                    self.session.active_take, self.session.frame
                );
            }
            _ => {}
        }
    }

    pub fn toggle_playing(&mut self) {
        self.set_playing(!self.session.is_playing());
    }

    pub fn set_loop_enabled(&mut self, enabled: bool) {
        self.session.loop_enabled = enabled;
    }

    pub fn set_continuous_play(&mut self, enabled: bool) {
        self.session.continuous_play = enabled;
    }

    /// Request an immediate end-of-take. Consumed by the next tick; repeated
    /// requests before that tick collapse into one.
    pub fn trigger_advance(&mut self) {
        if self.session.state == PlaybackState::Finished {
            debug!("Advance ignored: playback finished");
            return;
        }
        self.session.advance_requested = true;
    }

    // === Scheduling ===

    /// Run one scheduling step at host time `now`.
    pub fn tick(&mut self, now: Duration, sink: &mut dyn DisplaySink) -> TickOutcome {
        let advance = std::mem::take(&mut self.session.advance_requested);
        match self.session.state {
            PlaybackState::Playing => {}
            PlaybackState::Idle | PlaybackState::Paused if advance => {}
            _ => return TickOutcome::Inactive,
        }

        let id = self.session.active_take;
        let Some(take) = self.catalog.get(id) else {
            return TickOutcome::Inactive;
        };
        let frame_count = take.frame_count as u64;
        let rate = take.frame_rate;

        let resuming = std::mem::take(&mut self.session.resume_pending);
        if self.session.frame == 0 {
            self.restart_take(now);
        } else if resuming {
            self.resume_take(now, rate);
        }

        if frame_count == 0 {
            return self.end_take(id, frame_count, sink);
        }

        let shown = self.session.clock.frame_at(now, rate).min(frame_count - 1);
        present_frame(&self.cache, id, shown as usize, sink);
        self.session.frame = shown + 1;
        self.session.resume_frame = shown;

        if self.session.frame >= frame_count || advance {
            return self.end_take(id, frame_count, sink);
        }

        let sync = self.sync.check(
            &mut self.session,
            self.audio.as_deref(),
            frame_count,
            rate,
            now,
        );
        TickOutcome::Presented {
            take: id,
            frame: shown,
            sync,
        }
    }

    /// Point the session at take `index`, frame 0. `index` must be valid.
    fn load_sequence(&mut self, index: usize) {
        let Some(take) = self.catalog.get(index) else {
            return;
        };
        let sample_rate = self.sync.settings().sample_rate;

        self.session.active_take = index;
        self.session.audio_origin = take.audio_origin(sample_rate);
        self.session.frame = 0;
        self.session.resume_frame = 0;

        match (take.audio.as_deref(), self.audio.as_mut()) {
            (Some(clip), Some(audio)) => {
                audio.set_clip(clip);
                self.session.audio_attached = true;
            }
            (None, Some(audio)) => {
                if self.session.audio_attached {
                    audio.stop();
                }
                self.session.audio_attached = false;
            }
            (_, None) => self.session.audio_attached = false,
        }

        info!(
            "Loaded take {} ({}{}*, {} frames @ {} fps, audio origin {})",
            index,
            take.folder,
            take.prefix,
            take.frame_count,
            take.frame_rate,
            self.session.audio_origin
        );
    }

    /// Entering frame 0: new clock origin, audio from the top, first checkpoint.
    fn restart_take(&mut self, now: Duration) {
        self.session.clock.reset(now);
        self.session.next_sync = 1;
        if self.session.audio_attached
            && let Some(audio) = self.audio.as_mut()
        {
            audio.stop();
            audio.seek(self.session.audio_origin);
            audio.play();
        }
        debug!("Take {} started at {:?}", self.session.active_take, now);
    }

    /// Resumed mid-take: continue from where the clock stood at pause time
    /// instead of jumping by the time spent paused.
    fn resume_take(&mut self, now: Duration, rate: u32) {
        let shown = self.session.resume_frame;
        self.session.clock.rebase(now, shown, rate);

        if self.session.audio_attached
            && rate > 0
            && let Some(audio) = self.audio.as_mut()
        {
            let settings = self.sync.settings();
            let offset = shown * u64::from(settings.sample_rate) / u64::from(rate);
            audio.stop();
            audio.seek(self.session.audio_origin + offset);
            audio.play();
            self.session.next_sync = offset / settings.period_samples + 1;
        }
        debug!(
            "Take {} resumed at frame {}",
            self.session.active_take, shown
        );
    }

    /// End-of-take: final frame, next take, state change.
    fn end_take(&mut self, id: usize, frame_count: u64, sink: &mut dyn DisplaySink) -> TickOutcome {
        if frame_count > 0 {
            let last = frame_count - 1;
            self.session.frame = last;
            self.session.resume_frame = last;
            present_frame(&self.cache, id, last as usize, sink);
        }

        let len = self.catalog.len();
        let following = id + 1;
        let next = if following < len || self.session.loop_enabled {
            let next = following % len;
            self.load_sequence(next);
            Some(next)
        } else {
            None
        };

        match next {
            None => {
                self.session.state = PlaybackState::Finished;
                info!("Take {} finished, end of sequence", id);
            }
            Some(next) if !self.session.continuous_play => {
                self.session.state = PlaybackState::Paused;
                info!("Take {} finished, paused on take {}", id, next);
            }
            Some(next) => {
                info!("Take {} finished, continuing with take {}", id, next);
            }
        }
        if self.session.state != PlaybackState::Playing {
            self.stop_audio();
        }

        TickOutcome::TakeEnded {
            finished: id,
            next,
            state: self.session.state,
        }
    }

    fn stop_audio(&mut self) {
        if let Some(audio) = self.audio.as_mut()
            && audio.is_playing()
        {
            audio.stop();
        }
    }

    /// Stop audio and release every cached frame. The player is unusable
    /// for playback afterwards.
    pub fn shutdown(&mut self) {
        self.stop_audio();
        self.audio = None;
        self.session.audio_attached = false;
        self.session.state = PlaybackState::Finished;
        self.cache.clear();
        info!("Player shut down");
    }

    // === Accessors ===

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> PlaybackState {
        self.session.state
    }

    pub fn catalog(&self) -> &TakeCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }

    pub fn sync_settings(&self) -> &SyncSettings {
        self.sync.settings()
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop_audio();
    }
}

//! Scheduling core - catalog, cache, clock, sync, sequencer
//!
//! These modules are independent of any window, renderer or sound card; the
//! host drives them through `Player::tick` and the collaborator traits.

pub mod audio;
pub mod catalog;
pub mod clock;
pub mod error;
pub mod frame_cache;
pub mod player;
pub mod presenter;
pub mod session;
pub mod sync;

// Re-exports for convenience
pub use audio::{AudioPlayer, ClockAudio};
pub use catalog::{Take, TakeCatalog};
pub use clock::PlaybackClock;
pub use error::ConfigError;
pub use frame_cache::{AssetName, CacheStats, FrameCache, FrameStore};
pub use player::{Player, TickOutcome};
pub use presenter::{DisplaySink, FrameCounter};
pub use session::{PlaybackState, Session};
pub use sync::{SyncOutcome, SyncSettings, Synchronizer};

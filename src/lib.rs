//! HOLOPLAY - time-driven take player with audio re-sync
//!
//! Re-exports all modules for use by the binary target.

// Scheduling core (catalog, cache, clock, sync, sequencer)
pub mod core;

// App modules
pub mod cli;
pub mod config;
pub mod entities;

// Re-export commonly used types from core
pub use crate::core::audio::{AudioPlayer, ClockAudio};
pub use crate::core::catalog::{Take, TakeCatalog};
pub use crate::core::frame_cache::{FrameCache, FrameStore};
pub use crate::core::player::{Player, TickOutcome};
pub use crate::core::presenter::DisplaySink;
pub use crate::core::sync::SyncSettings;

pub use entities::{Frame, ImageStore};

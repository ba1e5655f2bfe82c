//! Configuration errors surfaced before playback starts
//!
//! Everything here is fatal to starting playback and never retried. Per-frame
//! asset failures are not errors at this level; see `entities::frame::FrameError`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Take catalog is empty")]
    EmptyCatalog,
    #[error("Take {take} has invalid frame rate {rate} (must be > 0)")]
    InvalidFrameRate { take: usize, rate: u32 },
    #[error("Take index {index} out of range (catalog has {len} takes)")]
    TakeOutOfRange { index: usize, len: usize },
    #[error("Invalid sync settings: {0}")]
    InvalidSync(String),
    #[error("Failed to read catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid catalog {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

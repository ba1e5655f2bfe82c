//! Frame cache - every frame of every take, resident for the whole session
//!
//! Structure: `Vec<TakeFrames>`, one fixed-size arena per take.
//! - Outer index: take id (catalog ordinal)
//! - Inner index: frame slot 0..N-1, plus two slack slots that stay empty
//!
//! Populated once by `FrameCache::preload` before playback starts, read-only
//! afterwards. There is no eviction and no lazy loading.
//!
//! # Partial Failure
//!
//! An asset the store cannot resolve degrades its slot to `Frame::missing()`.
//! Preload never fails because of a single frame; misses are counted and
//! reported once per take.

use std::fmt;

use log::{debug, info, warn};
use rayon::prelude::*;

use super::catalog::{Take, TakeCatalog};
use crate::entities::frame::{Frame, FrameError};

/// Digits a frame number is zero-padded to in asset names
pub const FRAME_NUMBER_PADDING: usize = 5;

/// Largest frame number that fits the padding
pub const MAX_PADDED_FRAME_NUMBER: u32 = 99_999;

/// Extra slots past the last frame of each take
const SLACK_SLOTS: usize = 2;

/// Name of one frame asset: `folder + prefix + zero-padded number`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetName {
    pub folder: String,
    pub prefix: String,
    pub number: u32,
}

impl AssetName {
    pub fn new(folder: &str, prefix: &str, number: u32) -> Self {
        Self {
            folder: folder.to_string(),
            prefix: prefix.to_string(),
            number,
        }
    }

    /// False when the number is too wide for the fixed padding
    pub fn fits_padding(&self) -> bool {
        self.number <= MAX_PADDED_FRAME_NUMBER
    }

    /// Frame number padded to `FRAME_NUMBER_PADDING` digits.
    ///
    /// Numbers past the padding width come back unpadded (best effort).
    pub fn padded_number(&self) -> String {
        format!("{:0width$}", self.number, width = FRAME_NUMBER_PADDING)
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.folder, self.prefix, self.padded_number())
    }
}

/// Resolves asset names into image handles
pub trait FrameStore {
    fn resolve(&self, asset: &AssetName) -> Result<Frame, FrameError>;
}

/// Preloaded frames of one take
#[derive(Debug, Clone)]
pub struct TakeFrames {
    slots: Box<[Frame]>,
    frame_count: usize,
    loaded: usize,
    missing: usize,
    overflowed: usize,
}

impl TakeFrames {
    /// Number of real frames N (slots hold N + slack)
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Frames that resolved to an image
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Frames that degraded to the missing sentinel
    pub fn missing(&self) -> usize {
        self.missing
    }

    /// Frames whose number did not fit the name padding
    pub fn overflowed(&self) -> usize {
        self.overflowed
    }

    /// Handle at `index`. Out-of-range slots read as missing.
    pub fn get(&self, index: usize) -> Frame {
        self.slots.get(index).cloned().unwrap_or_default()
    }

    pub fn mem(&self) -> usize {
        self.slots.iter().map(Frame::mem).sum()
    }
}

/// Aggregate cache statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub takes: usize,
    pub frames: usize,
    pub loaded: usize,
    pub missing: usize,
    pub bytes: usize,
}

/// Preloaded frames for every take of a catalog
#[derive(Debug, Default)]
pub struct FrameCache {
    takes: Vec<TakeFrames>,
}

impl FrameCache {
    /// Load every frame of every take.
    ///
    /// Takes are loaded in parallel; each take's slots are filled in frame
    /// order and no take touches another's arena.
    pub fn preload<S>(catalog: &TakeCatalog, store: &S) -> Self
    where
        S: FrameStore + Sync,
    {
        let takes: Vec<TakeFrames> = catalog
            .takes()
            .par_iter()
            .enumerate()
            .map(|(id, take)| Self::preload_take(id, take, store))
            .collect();

        let cache = Self { takes };
        let stats = cache.stats();
        info!(
            "Preloaded {} takes: {} frames ({} missing), {:.1} MB",
            stats.takes,
            stats.frames,
            stats.missing,
            stats.bytes as f64 / (1024.0 * 1024.0)
        );
        cache
    }

    /// Resolve all N frames of one take into a fresh arena of N + slack slots.
    pub fn preload_take<S>(id: usize, take: &Take, store: &S) -> TakeFrames
    where
        S: FrameStore + ?Sized,
    {
        let mut slots = vec![Frame::missing(); take.frame_count + SLACK_SLOTS].into_boxed_slice();
        let mut loaded = 0;
        let mut missing = 0;
        let mut overflowed = 0;

        for slot in 0..take.frame_count {
            // Numbers past u32 cannot be named at all; treat them as missing
            let Some(number) = u32::try_from(slot)
                .ok()
                .and_then(|offset| take.start_index.checked_add(offset))
            else {
                overflowed += 1;
                missing += 1;
                continue;
            };
            let asset = AssetName::new(&take.folder, &take.prefix, number);
            if !asset.fits_padding() {
                overflowed += 1;
            }
            match store.resolve(&asset) {
                Ok(frame) => {
                    slots[slot] = frame;
                    loaded += 1;
                }
                Err(e) => {
                    debug!("Take {} frame {}: {}", id, slot, e);
                    missing += 1;
                }
            }
        }

        if overflowed > 0 {
            warn!(
                "Take {}: {} frame numbers exceed {} digits, names are unpadded",
                id, overflowed, FRAME_NUMBER_PADDING
            );
        }
        if missing > 0 {
            warn!(
                "Take {} ({}{}*): {} of {} frames missing",
                id, take.folder, take.prefix, missing, take.frame_count
            );
        }
        debug!("Take {}: loaded {} frames", id, loaded);

        TakeFrames {
            slots,
            frame_count: take.frame_count,
            loaded,
            missing,
            overflowed,
        }
    }

    /// Handle for (take, frame index). Unknown takes and slots read as missing.
    pub fn get(&self, take: usize, index: usize) -> Frame {
        self.takes.get(take).map(|t| t.get(index)).unwrap_or_default()
    }

    pub fn take(&self, id: usize) -> Option<&TakeFrames> {
        self.takes.get(id)
    }

    pub fn len(&self) -> usize {
        self.takes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.takes.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.takes.iter().fold(
            CacheStats {
                takes: self.takes.len(),
                ..Default::default()
            },
            |mut acc, t| {
                acc.frames += t.frame_count;
                acc.loaded += t.loaded;
                acc.missing += t.missing;
                acc.bytes += t.mem();
                acc
            },
        )
    }

    /// Release every cached handle
    pub fn clear(&mut self) {
        let stats = self.stats();
        self.takes.clear();
        debug!("Frame cache cleared ({} frames released)", stats.loaded);
    }
}

//! Take catalog - immutable list of playable takes
//!
//! A take is one captured frame sequence plus its audio track and timing
//! metadata. The catalog is built once from configuration, validated, and then
//! only read: ids are ordinal positions, `0..len()`.

use log::debug;

use super::error::ConfigError;

/// Frame name prefix used when a take does not name one
pub const DEFAULT_FRAME_PREFIX: &str = "save.";

/// Description of a single take
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Take {
    /// Folder holding the frames, relative to the asset root. Ends with "/".
    pub folder: String,
    /// Frame name prefix ("save." when empty)
    pub prefix: String,
    /// Number of the first captured frame (1-based in capture tools)
    pub start_index: u32,
    /// Number of frames N
    pub frame_count: usize,
    /// Native capture rate R in frames per second
    pub frame_rate: u32,
    /// Audio clip reference, if the take has a soundtrack
    pub audio: Option<String>,
}

impl Take {
    /// Take with default prefix, start index 1 and no audio
    pub fn new(folder: impl Into<String>, frame_count: usize, frame_rate: u32) -> Self {
        Self {
            folder: folder.into(),
            prefix: DEFAULT_FRAME_PREFIX.to_string(),
            start_index: 1,
            frame_count,
            frame_rate,
            audio: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_start_index(mut self, start_index: u32) -> Self {
        self.start_index = start_index;
        self
    }

    pub fn with_audio(mut self, clip: impl Into<String>) -> Self {
        self.audio = Some(clip.into());
        self
    }

    /// Sample offset of this take's first frame inside its audio clip.
    ///
    /// `(start_index - 1) / frame_rate * sample_rate`, truncated, never negative.
    pub fn audio_origin(&self, sample_rate: u32) -> u64 {
        if self.frame_rate == 0 {
            return 0;
        }
        let seconds = (f64::from(self.start_index) - 1.0) / f64::from(self.frame_rate);
        (seconds * f64::from(sample_rate)).max(0.0) as u64
    }

    /// Duration of the take at its native rate, in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.frame_rate == 0 {
            0.0
        } else {
            self.frame_count as f64 / f64::from(self.frame_rate)
        }
    }
}

/// Ordered, validated list of takes
#[derive(Debug, Clone, Default)]
pub struct TakeCatalog {
    takes: Vec<Take>,
}

impl TakeCatalog {
    /// Validate and freeze a list of takes.
    ///
    /// Empty prefixes are replaced with `DEFAULT_FRAME_PREFIX`. A frame rate of
    /// zero is rejected. An empty list is accepted here; playback on it is not.
    pub fn new(mut takes: Vec<Take>) -> Result<Self, ConfigError> {
        for (id, take) in takes.iter_mut().enumerate() {
            if take.frame_rate == 0 {
                return Err(ConfigError::InvalidFrameRate {
                    take: id,
                    rate: take.frame_rate,
                });
            }
            if take.prefix.is_empty() {
                take.prefix = DEFAULT_FRAME_PREFIX.to_string();
            }
            debug!(
                "Take {}: {}{}* ({} frames @ {} fps, audio: {:?})",
                id, take.folder, take.prefix, take.frame_count, take.frame_rate, take.audio
            );
        }
        Ok(Self { takes })
    }

    pub fn get(&self, id: usize) -> Option<&Take> {
        self.takes.get(id)
    }

    pub fn len(&self) -> usize {
        self.takes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.takes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Take> {
        self.takes.iter()
    }

    pub fn takes(&self) -> &[Take] {
        &self.takes
    }

    /// Total frames over all takes
    pub fn total_frames(&self) -> usize {
        self.takes.iter().map(|t| t.frame_count).sum()
    }
}

//! Image handles held by the frame cache and handed to display sinks
//!
//! **Why**: takes are preloaded once and replayed many times, so a handle must
//! be cheap to clone and safe to share with whatever renders it. Pixel data
//! lives behind an `Arc` and is never mutated after load.
//!
//! # Pixel Formats
//!
//! - `PixelBuffer::U8`: LDR images (PNG/JPEG/TGA/TIFF), 4 bytes/pixel
//! - `PixelBuffer::F16`: EXR, 8 bytes/pixel
//!
//! # Missing Frames
//!
//! `Frame::missing()` is the "no image" sentinel. The cache stores it for
//! assets the store could not resolve; sinks decide how to draw absence.

use std::sync::Arc;

use half::f16 as F16;

/// Pixel buffer format
#[derive(Debug, Clone)]
pub enum PixelBuffer {
    U8(Vec<u8>),   // LDR formats - 8-bit per channel
    F16(Vec<F16>), // EXR - 16-bit float per channel
}

impl PixelBuffer {
    /// Size of the pixel data in bytes
    pub fn byte_len(&self) -> usize {
        match self {
            PixelBuffer::U8(v) => v.len(),
            PixelBuffer::F16(v) => v.len() * std::mem::size_of::<F16>(),
        }
    }
}

/// Pixel format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
    RgbaF16,
}

#[derive(Debug)]
struct FrameData {
    name: String,
    buffer: PixelBuffer,
    pixel_format: PixelFormat,
    width: usize,
    height: usize,
}

/// Shared, immutable image handle. `None` data is the missing sentinel.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    data: Option<Arc<FrameData>>,
}

/// Frame resolution errors
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Asset not found: {0}")]
    NotFound(String),
    #[error("Image error: {0}")]
    Image(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Frame {
    /// The "no image" sentinel
    pub fn missing() -> Self {
        Self { data: None }
    }

    /// Wrap a decoded pixel buffer. `name` is the asset name it was resolved from.
    pub fn from_buffer(
        name: impl Into<String>,
        buffer: PixelBuffer,
        pixel_format: PixelFormat,
        width: usize,
        height: usize,
    ) -> Self {
        Self {
            data: Some(Arc::new(FrameData {
                name: name.into(),
                buffer,
                pixel_format,
                width,
                height,
            })),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.data.is_none()
    }

    /// Asset name the frame was resolved from
    pub fn name(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.name.as_str())
    }

    pub fn width(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.width)
    }

    pub fn height(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.height)
    }

    pub fn pixel_format(&self) -> Option<PixelFormat> {
        self.data.as_ref().map(|d| d.pixel_format)
    }

    /// Resident pixel memory in bytes (0 for the sentinel)
    pub fn mem(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.buffer.byte_len())
    }

    /// True when both handles point at the same decoded image
    pub fn ptr_eq(&self, other: &Frame) -> bool {
        match (&self.data, &other.data) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

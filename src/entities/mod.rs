//! Frame handles and the disk-backed frame store

pub mod frame;
pub mod loader;

pub use frame::{Frame, FrameError, PixelBuffer, PixelFormat};
pub use loader::{ImageStore, Loader};

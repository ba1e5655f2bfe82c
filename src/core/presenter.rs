//! Frame presenter - cache lookup handed straight to the display sink

use log::trace;

use super::frame_cache::FrameCache;
use crate::entities::frame::Frame;

/// Whatever puts a frame on screen
pub trait DisplaySink {
    /// Show `frame`. The missing sentinel is passed through as-is.
    fn present(&mut self, frame: &Frame);
}

/// Fetch (take, index) from the cache and submit it to `sink`.
pub fn present_frame(cache: &FrameCache, take: usize, index: usize, sink: &mut dyn DisplaySink) {
    let frame = cache.get(take, index);
    trace!("Present take {} frame {} ({})", take, index, frame.name().unwrap_or("<missing>"));
    sink.present(&frame);
}

/// Sink that only counts what it was given. Used by headless hosts.
#[derive(Debug, Default)]
pub struct FrameCounter {
    presented: u64,
    missing: u64,
    last: Option<Frame>,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn missing(&self) -> u64 {
        self.missing
    }

    pub fn last(&self) -> Option<&Frame> {
        self.last.as_ref()
    }
}

impl DisplaySink for FrameCounter {
    fn present(&mut self, frame: &Frame) {
        self.presented += 1;
        if frame.is_missing() {
            self.missing += 1;
        }
        self.last = Some(frame.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{Take, TakeCatalog};
    use crate::core::frame_cache::tests::MemStore;

    #[test]
    fn test_present_passes_sentinel_through() {
        let mut store = MemStore::default();
        store.absent.insert("A/save.00002".to_string());
        let catalog = TakeCatalog::new(vec![Take::new("A/", 3, 30)]).unwrap();
        let cache = FrameCache::preload(&catalog, &store);

        let mut sink = FrameCounter::new();
        present_frame(&cache, 0, 0, &mut sink);
        assert_eq!(sink.last().and_then(|f| f.name()), Some("A/save.00001"));

        present_frame(&cache, 0, 1, &mut sink);
        assert!(sink.last().unwrap().is_missing());
        assert_eq!(sink.presented(), 2);
        assert_eq!(sink.missing(), 1);
    }
}

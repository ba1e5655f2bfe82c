//! Frame store over image files on disk
//!
//! Asset names carry no extension (`Take1/save.00042`); the store probes a
//! list of extensions under its root directory and decodes the first match
//! with the `image` crate (exrs for EXR).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use half::f16 as F16;
use log::{debug, trace};

use super::frame::{Frame, FrameError, PixelBuffer, PixelFormat};
use crate::core::frame_cache::{AssetName, FrameStore};

/// Extensions probed for every asset, in order
pub const DEFAULT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tga", "tif", "tiff", "exr"];

/// Image file decoder
pub struct Loader;

impl Loader {
    /// Load complete image file into Frame
    pub fn load(path: &Path, name: &str) -> Result<Frame, FrameError> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "exr" => Self::load_exr(path, name),
            _ => Self::load_generic(path, name),
        }
    }

    fn load_exr(path: &Path, name: &str) -> Result<Frame, FrameError> {
        debug!("Loading EXR: {}", path.display());

        let img = image::open(path).map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("DWAA") || err_str.contains("DWAB") {
                return FrameError::UnsupportedFormat(format!(
                    "{}: DWAA/DWAB compression not supported",
                    path.display()
                ));
            }
            FrameError::Image(format!("EXR load error: {}", e))
        })?;

        let width = img.width() as usize;
        let height = img.height() as usize;
        let buffer: Vec<F16> = img
            .to_rgba32f()
            .as_raw()
            .iter()
            .map(|&v| F16::from_f32(v))
            .collect();

        Ok(Frame::from_buffer(
            name,
            PixelBuffer::F16(buffer),
            PixelFormat::RgbaF16,
            width,
            height,
        ))
    }

    fn load_generic(path: &Path, name: &str) -> Result<Frame, FrameError> {
        trace!("Loading image: {}", path.display());

        let img = image::open(path)
            .map_err(|e| FrameError::Image(format!("{}: {}", path.display(), e)))?;

        let width = img.width() as usize;
        let height = img.height() as usize;

        Ok(Frame::from_buffer(
            name,
            PixelBuffer::U8(img.to_rgba8().into_raw()),
            PixelFormat::Rgba8,
            width,
            height,
        ))
    }
}

/// Frame store rooted at an asset directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    extensions: Vec<String>,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Replace the probed extensions (without dots)
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// First existing file for `asset` among the probed extensions
    pub fn locate(&self, asset: &AssetName) -> Option<PathBuf> {
        let base = asset.to_string();
        self.extensions
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", base, ext)))
            .find(|p| p.is_file())
    }

    /// Scan `folder + prefix + <digits>.<ext>` files under the root.
    ///
    /// Returns `(first frame number, frame count)` or `None` when nothing
    /// matches. Numbers present with several extensions count once.
    pub fn scan_take(&self, folder: &str, prefix: &str) -> Result<Option<(u32, usize)>, FrameError> {
        let literal = self.root.join(format!("{}{}", folder, prefix));
        let pattern = format!("{}*", glob::Pattern::escape(&literal.to_string_lossy()));
        let file_prefix = literal
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut numbers = BTreeSet::new();
        let entries = glob::glob(&pattern)
            .map_err(|e| FrameError::Image(format!("Glob error for pattern {}: {}", pattern, e)))?;
        for entry in entries {
            let path = entry.map_err(|e| FrameError::Image(format!("Glob entry error: {}", e)))?;
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let digits = stem.strip_prefix(file_prefix.as_str()).unwrap_or("");
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            if let Ok(number) = digits.parse::<u32>() {
                numbers.insert(number);
            }
        }

        debug!("Scanned {}: {} frames", pattern, numbers.len());
        Ok(numbers.first().map(|first| (*first, numbers.len())))
    }
}

impl FrameStore for ImageStore {
    fn resolve(&self, asset: &AssetName) -> Result<Frame, FrameError> {
        let name = asset.to_string();
        let path = self
            .locate(asset)
            .ok_or_else(|| FrameError::NotFound(name.clone()))?;
        Loader::load(&path, &name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_root(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("holoplay_loader_{}_{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("Take1")).unwrap();
        dir
    }

    fn write_png(path: &Path, w: u32, h: u32) {
        image::RgbaImage::from_pixel(w, h, image::Rgba([255, 0, 0, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_resolve_png() {
        let root = temp_root("resolve");
        write_png(&root.join("Take1/save.00001.png"), 3, 2);

        let store = ImageStore::new(&root);
        let frame = store.resolve(&AssetName::new("Take1/", "save.", 1)).unwrap();
        assert_eq!(frame.name(), Some("Take1/save.00001"));
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.pixel_format(), Some(PixelFormat::Rgba8));
        assert_eq!(frame.mem(), 3 * 2 * 4);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_missing_asset_is_not_found() {
        let root = temp_root("missing");
        let store = ImageStore::new(&root);
        let err = store.resolve(&AssetName::new("Take1/", "save.", 7)).unwrap_err();
        assert!(matches!(err, FrameError::NotFound(ref n) if n == "Take1/save.00007"));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_extension_probe_order() {
        let root = temp_root("probe");
        write_png(&root.join("Take1/save.00001.png"), 1, 1);

        let store = ImageStore::new(&root).with_extensions(["jpg"]);
        assert!(store.locate(&AssetName::new("Take1/", "save.", 1)).is_none());

        let store = ImageStore::new(&root).with_extensions(["jpg", "png"]);
        let found = store.locate(&AssetName::new("Take1/", "save.", 1)).unwrap();
        assert!(found.ends_with("save.00001.png"));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_scan_take() {
        let root = temp_root("scan");
        for n in 5..9 {
            write_png(&root.join(format!("Take1/save.{:05}.png", n)), 1, 1);
        }
        // Same frame in another format, and an unrelated file
        fs::copy(root.join("Take1/save.00005.png"), root.join("Take1/save.00005.tga")).unwrap();
        fs::write(root.join("Take1/save.meta.json"), "{}").unwrap();

        let store = ImageStore::new(&root);
        assert_eq!(store.scan_take("Take1/", "save.").unwrap(), Some((5, 4)));
        assert_eq!(store.scan_take("Take1/", "other.").unwrap(), None);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_preload_from_disk() {
        use crate::core::catalog::{Take, TakeCatalog};
        use crate::core::frame_cache::FrameCache;

        let root = temp_root("preload");
        write_png(&root.join("Take1/save.00001.png"), 1, 1);
        write_png(&root.join("Take1/save.00003.png"), 1, 1);

        let catalog = TakeCatalog::new(vec![Take::new("Take1/", 3, 30)]).unwrap();
        let cache = FrameCache::preload(&catalog, &ImageStore::new(&root));
        let frames = cache.take(0).unwrap();
        assert_eq!(frames.loaded(), 2);
        assert_eq!(frames.missing(), 1);
        assert!(cache.get(0, 1).is_missing());
        let _ = fs::remove_dir_all(&root);
    }
}

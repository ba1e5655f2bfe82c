//! Configuration: catalog file and application paths
//!
//! The catalog file is JSON describing every take plus the session-wide
//! sync constants:
//!
//! ```json
//! {
//!   "sample_rate": 48000, "period_samples": 48000,
//!   "frames_per_period": 30, "compensation": 1,
//!   "loop_takes": false, "continuous_play": false,
//!   "takes": [
//!     { "folder": "Take1/", "prefix": "save.", "start_index": 1,
//!       "frame_count": 300, "frame_rate": 30, "audio": "take1.wav" }
//!   ]
//! }
//! ```
//!
//! Missing keys take their defaults. A take without `frame_count` is sized by
//! scanning its folder on disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::core::catalog::{DEFAULT_FRAME_PREFIX, Take, TakeCatalog};
use crate::core::error::ConfigError;
use crate::core::sync::SyncSettings;
use crate::entities::loader::ImageStore;

/// Default catalog file name
pub const CATALOG_FILE: &str = "holoplay.json";

/// Default log file name
pub const LOG_FILE: &str = "holoplay.log";

fn default_frame_rate() -> u32 {
    30
}

/// One take as written in the catalog file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeEntry {
    pub folder: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub start_index: Option<u32>,
    #[serde(default)]
    pub frame_count: Option<usize>,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    #[serde(default)]
    pub audio: Option<String>,
}

/// Whole catalog file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    #[serde(flatten)]
    pub sync: SyncSettings,
    pub loop_takes: bool,
    pub continuous_play: bool,
    pub takes: Vec<TakeEntry>,
}

impl CatalogFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse catalog JSON; `origin` is only used in error messages
    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let file: Self = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        file.sync.validate()?;
        Ok(file)
    }

    /// Build the validated catalog. Takes without a frame count are scanned
    /// on disk through `store`; an unscannable take gets zero frames.
    pub fn build_catalog(&self, store: &ImageStore) -> Result<TakeCatalog, ConfigError> {
        let takes = self
            .takes
            .iter()
            .enumerate()
            .map(|(id, entry)| {
                let prefix = if entry.prefix.is_empty() {
                    DEFAULT_FRAME_PREFIX.to_string()
                } else {
                    entry.prefix.clone()
                };

                let (start_index, frame_count) = match entry.frame_count {
                    Some(count) => (entry.start_index.unwrap_or(1), count),
                    None => match store.scan_take(&entry.folder, &prefix) {
                        Ok(Some((first, count))) => {
                            info!("Take {}: found {} frames from #{}", id, count, first);
                            (entry.start_index.unwrap_or(first), count)
                        }
                        Ok(None) => {
                            warn!("Take {}: no frames found for {}{}*", id, entry.folder, prefix);
                            (entry.start_index.unwrap_or(1), 0)
                        }
                        Err(e) => {
                            warn!("Take {}: scan failed: {}", id, e);
                            (entry.start_index.unwrap_or(1), 0)
                        }
                    },
                };

                Take {
                    folder: entry.folder.clone(),
                    prefix,
                    start_index,
                    frame_count,
                    frame_rate: entry.frame_rate,
                    audio: entry.audio.clone(),
                }
            })
            .collect();
        TakeCatalog::new(takes)
    }
}

/// Configuration for overriding default application paths
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args → ENV var (HOLOPLAY_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var("HOLOPLAY_CONFIG_DIR").ok().map(PathBuf::from));
        Self { config_dir }
    }
}

/// Get path to a configuration file
///
/// Priority:
/// 1. CLI --config-dir argument
/// 2. HOLOPLAY_CONFIG_DIR environment variable
/// 3. Local folder IF it already holds holoplay.json or holoplay.log
/// 4. Platform-specific config directory from dirs-next
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    config_dir(config).join(name)
}

/// Get path to a data file (logs). Same priority as `config_file`, but falls
/// back to the platform data directory.
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    data_dir(config).join(name)
}

/// Create the config and data directories if they don't exist
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = config_dir(config);
    let data_dir = data_dir(config);

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
    }
    if data_dir != config_dir && !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    }
    Ok(())
}

fn has_local_config_files(dir: &Path) -> bool {
    [CATALOG_FILE, LOG_FILE].iter().any(|f| dir.join(f).exists())
}

fn local_dir() -> Option<PathBuf> {
    std::env::current_dir().ok().filter(|d| has_local_config_files(d))
}

fn config_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }
    local_dir()
        .or_else(|| dirs_next::config_dir().map(|d| d.join("holoplay")))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn data_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }
    local_dir()
        .or_else(|| dirs_next::data_dir().map(|d| d.join("holoplay")))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_config_file_with_custom_dir() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };
        assert_eq!(config_file("test.json", &config), PathBuf::from("/custom/test.json"));
        assert_eq!(data_file("holoplay.log", &config), PathBuf::from("/custom/holoplay.log"));
    }

    #[test]
    fn test_defaults() {
        let file = CatalogFile::parse(r#"{ "takes": [ { "folder": "Take1/" } ] }"#, Path::new("t.json")).unwrap();
        assert_eq!(file.sync, SyncSettings::default());
        assert!(!file.loop_takes);
        assert!(!file.continuous_play);
        let take = &file.takes[0];
        assert_eq!(take.prefix, "");
        assert_eq!(take.frame_rate, 30);
        assert_eq!(take.frame_count, None);
        assert_eq!(take.audio, None);
    }

    #[test]
    fn test_full_file() {
        let text = r#"{
            "sample_rate": 44100, "period_samples": 22050,
            "frames_per_period": 12, "compensation": 2,
            "loop_takes": true, "continuous_play": true,
            "takes": [
                { "folder": "A/", "prefix": "img_", "start_index": 31,
                  "frame_count": 90, "frame_rate": 24, "audio": "a.wav" },
                { "folder": "B/", "frame_count": 10 }
            ]
        }"#;
        let file = CatalogFile::parse(text, Path::new("t.json")).unwrap();
        assert_eq!(file.sync.sample_rate, 44100);
        assert_eq!(file.sync.period_samples, 22050);
        assert_eq!(file.sync.frames_per_period, 12);
        assert_eq!(file.sync.compensation, 2);
        assert!(file.loop_takes && file.continuous_play);

        let catalog = file.build_catalog(&ImageStore::new("/nonexistent")).unwrap();
        let a = catalog.get(0).unwrap();
        assert_eq!(a.prefix, "img_");
        assert_eq!(a.start_index, 31);
        assert_eq!(a.frame_count, 90);
        assert_eq!(a.audio.as_deref(), Some("a.wav"));
        let b = catalog.get(1).unwrap();
        assert_eq!(b.prefix, DEFAULT_FRAME_PREFIX);
        assert_eq!(b.start_index, 1);
        assert_eq!(b.frame_rate, 30);
    }

    #[test]
    fn test_zero_frame_rate_rejected() {
        let file = CatalogFile::parse(
            r#"{ "takes": [ { "folder": "A/", "frame_count": 1, "frame_rate": 0 } ] }"#,
            Path::new("t.json"),
        )
        .unwrap();
        let err = file.build_catalog(&ImageStore::new("/nonexistent")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFrameRate { take: 0, rate: 0 }));
    }

    #[test]
    fn test_bad_json_and_missing_file() {
        assert!(matches!(
            CatalogFile::parse("{ nope", Path::new("t.json")),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            CatalogFile::parse(r#"{ "takes": [ { "folder": "A/", "frame_rate": -1 } ] }"#, Path::new("t.json")),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            CatalogFile::load(Path::new("/nonexistent/holoplay.json")),
            Err(ConfigError::Read { .. })
        ));
        assert!(matches!(
            CatalogFile::parse(r#"{ "period_samples": 0 }"#, Path::new("t.json")),
            Err(ConfigError::InvalidSync(_))
        ));
    }

    #[test]
    fn test_frame_count_scanned_from_disk() {
        let root = std::env::temp_dir().join(format!("holoplay_config_scan_{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("T")).unwrap();
        for n in 10..14 {
            image::RgbaImage::new(1, 1)
                .save(root.join(format!("T/save.{:05}.png", n)))
                .unwrap();
        }

        let file = CatalogFile::parse(r#"{ "takes": [ { "folder": "T/" }, { "folder": "Empty/" } ] }"#, Path::new("t.json")).unwrap();
        let catalog = file.build_catalog(&ImageStore::new(&root)).unwrap();
        assert_eq!(catalog.get(0).unwrap().start_index, 10);
        assert_eq!(catalog.get(0).unwrap().frame_count, 4);
        assert_eq!(catalog.get(1).unwrap().frame_count, 0);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_serialized_shape() {
        let file = CatalogFile {
            takes: vec![TakeEntry {
                folder: "A/".into(),
                prefix: String::new(),
                start_index: None,
                frame_count: Some(3),
                frame_rate: 30,
                audio: None,
            }],
            ..Default::default()
        };
        let json = serde_json::to_value(&file).unwrap();
        // Sync constants sit at the top level, not nested
        assert_eq!(json["sample_rate"], 48000);
        assert_eq!(json["frames_per_period"], 30);
    }
}

use clap::Parser;
use std::path::PathBuf;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Images: image 0.25 (PNG, JPEG, TGA, TIFF, EXR)\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Take player: image sequences in step with their audio
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Catalog file (JSON). Default: holoplay.json in the config directory
    #[arg(value_name = "CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Directory that take folders are relative to (default: catalog's directory)
    #[arg(short = 'r', long = "assets", value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Start playing immediately
    #[arg(short = 'a', long = "autoplay")]
    pub autoplay: bool,

    /// Loop back to the first take after the last one (overrides catalog)
    #[arg(short = 'o', long = "loop", value_name = "0|1")]
    pub loop_takes: Option<u8>,

    /// Run into the next take without pausing (overrides catalog)
    #[arg(short = 'C', long = "continuous", value_name = "0|1")]
    pub continuous_play: Option<u8>,

    /// Take to start from (0-based)
    #[arg(short = 't', long = "take", value_name = "N")]
    pub take: Option<usize>,

    /// Host tick rate in Hz
    #[arg(long = "tick-hz", value_name = "HZ", default_value_t = 60.0)]
    pub tick_hz: f64,

    /// Vary the tick interval by up to this fraction (0.0 - 1.0)
    #[arg(long = "jitter", value_name = "FRACTION", default_value_t = 0.0)]
    pub jitter: f64,

    /// Stop after this many seconds (default: run until playback stops)
    #[arg(short = 'd', long = "duration", value_name = "SECONDS")]
    pub duration: Option<f64>,

    /// Skip to the next take at these host times (can be repeated)
    #[arg(short = 's', long = "skip-at", value_name = "SECONDS")]
    pub skip_at: Vec<f64>,

    /// Simulated audio clock drift in parts per million
    #[arg(long = "audio-drift-ppm", value_name = "PPM", default_value_t = 0.0, allow_negative_numbers = true)]
    pub audio_drift_ppm: f64,

    /// Play without an audio device (disables sync)
    #[arg(long = "no-audio")]
    pub no_audio: bool,

    /// Enable logging to file (default: holoplay.log in the data directory)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["holoplay"]);
        assert!(args.catalog.is_none());
        assert!(!args.autoplay);
        assert_eq!(args.tick_hz, 60.0);
        assert_eq!(args.loop_takes, None);
        assert!(args.skip_at.is_empty());
        assert!(args.log_file.is_none());
    }

    #[test]
    fn test_flags() {
        let args = Args::parse_from([
            "holoplay", "show.json", "-a", "--loop", "1", "-C", "0", "--take", "2",
            "-s", "1.5", "-s", "3", "-vv", "--log", "--audio-drift-ppm", "-250",
        ]);
        assert_eq!(args.catalog, Some(PathBuf::from("show.json")));
        assert!(args.autoplay);
        assert_eq!(args.loop_takes, Some(1));
        assert_eq!(args.continuous_play, Some(0));
        assert_eq!(args.take, Some(2));
        assert_eq!(args.skip_at, vec![1.5, 3.0]);
        assert_eq!(args.verbosity, 2);
        assert_eq!(args.log_file, Some(None));
        assert_eq!(args.audio_drift_ppm, -250.0);
    }
}

use holoplay::cli::Args;
use holoplay::config::{self, CatalogFile, PathConfig};
use holoplay::core::presenter::FrameCounter;
use holoplay::core::session::PlaybackState;
use holoplay::core::sync::SyncOutcome;
use holoplay::{AudioPlayer, ClockAudio, FrameCache, ImageStore, Player, TickOutcome};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Counters collected by the host loop
#[derive(Debug, Default)]
struct RunStats {
    ticks: u64,
    transitions: u64,
    corrections: u64,
    resets: u64,
    elapsed: Duration,
}

fn init_logging(args: &Args, path_config: &PathConfig) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| config::data_file(config::LOG_FILE, path_config));
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

/// Seconds from the command line as a `Duration`
fn seconds_arg(value: f64, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .with_context(|| format!("--{} {} is not a valid number of seconds", flag, value))
}

/// Drive the player from a wall-clock host loop until it stops or the
/// duration runs out.
fn run(player: &mut Player, args: &Args) -> Result<RunStats> {
    let interval = seconds_arg(1.0 / args.tick_hz.max(1.0), "tick-hz")?;
    let jitter = args.jitter.clamp(0.0, 1.0);
    let deadline = args
        .duration
        .map(|d| seconds_arg(d, "duration"))
        .transpose()?;

    let mut skips = args
        .skip_at
        .iter()
        .map(|s| seconds_arg(*s, "skip-at"))
        .collect::<Result<Vec<_>>>()?;
    skips.sort();
    skips.reverse();

    let mut sink = FrameCounter::new();
    let mut stats = RunStats::default();
    let host_start = Instant::now();

    loop {
        let now = host_start.elapsed();
        if deadline.is_some_and(|d| now >= d) {
            break;
        }
        while skips.last().is_some_and(|s| *s <= now) {
            skips.pop();
            debug!("Manual advance at {:?}", now);
            player.trigger_advance();
        }

        match player.tick(now, &mut sink) {
            TickOutcome::Presented { sync: SyncOutcome::Corrected { .. }, .. } => stats.corrections += 1,
            TickOutcome::Presented { sync: SyncOutcome::Reset { .. }, .. } => stats.resets += 1,
            TickOutcome::TakeEnded { .. } => stats.transitions += 1,
            _ => {}
        }
        stats.ticks += 1;

        match player.state() {
            PlaybackState::Finished => break,
            PlaybackState::Playing => {}
            _ if deadline.is_none() && skips.is_empty() => {
                info!("Playback paused with nothing left to resume it, stopping");
                break;
            }
            _ => {}
        }

        // Uneven but deterministic host cadence
        let factor = 1.0 + jitter * (stats.ticks as f64 * 0.7).sin();
        std::thread::sleep(interval.mul_f64(factor));
    }

    stats.elapsed = host_start.elapsed();
    info!(
        "Presented {} frames ({} missing) over {} ticks",
        sink.presented(),
        sink.missing(),
        stats.ticks
    );
    Ok(stats)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }
    init_logging(&args, &path_config)?;

    info!("Holoplay starting...");
    debug!("Command-line args: {:?}", args);

    let catalog_path = args
        .catalog
        .clone()
        .unwrap_or_else(|| config::config_file(config::CATALOG_FILE, &path_config));
    let file = CatalogFile::load(&catalog_path)
        .with_context(|| format!("Failed to load catalog {}", catalog_path.display()))?;

    let asset_root = args
        .assets
        .clone()
        .or_else(|| catalog_path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    info!("Asset root: {}", asset_root.display());

    let store = ImageStore::new(&asset_root);
    let catalog = file.build_catalog(&store)?;

    let preload_start = Instant::now();
    let cache = FrameCache::preload(&catalog, &store);
    let cache_stats = cache.stats();
    info!("Preload took {:.2?}", preload_start.elapsed());

    let wants_audio = !args.no_audio && catalog.iter().any(|t| t.audio.is_some());
    let audio = wants_audio.then(|| {
        Box::new(ClockAudio::new(file.sync.sample_rate).with_drift_ppm(args.audio_drift_ppm))
            as Box<dyn AudioPlayer>
    });

    let mut player = Player::new(catalog, cache, file.sync, audio)?;
    debug!("Sync settings: {:?}", player.sync_settings());
    player.set_loop_enabled(args.loop_takes.map_or(file.loop_takes, |v| v != 0));
    player.set_continuous_play(args.continuous_play.map_or(file.continuous_play, |v| v != 0));
    if let Some(take) = args.take {
        player.load_take(take)?;
    }
    player.set_playing(args.autoplay);

    let stats = run(&mut player, &args)?;
    let final_take = player.session().active_take();
    let final_state = player.state();
    player.shutdown();

    println!(
        "{} takes, {} frames loaded ({} missing, {:.1} MB)",
        cache_stats.takes,
        cache_stats.loaded,
        cache_stats.missing,
        cache_stats.bytes as f64 / (1024.0 * 1024.0)
    );
    println!(
        "{:.2}s, {} ticks, {} take changes, {} drift corrections, {} resets",
        stats.elapsed.as_secs_f64(),
        stats.ticks,
        stats.transitions,
        stats.corrections,
        stats.resets
    );
    println!("Stopped on take {} ({:?})", final_take, final_state);
    Ok(())
}

//! `bodymap` command-line entry point.

use bodymap_app::{AppError, AppResult, Coordinator, ReplayScript, run_replay, summarize};
use bodymap_core::storage::FileStore;
use bodymap_core::{Clock, EngineConfig, Figure, FigureSurface, InteractionEngine, ManualClock, SessionState};
use bodymap_core::config::{DEFAULT_HEATMAP_BINS, MAX_HEATMAP_BINS};
use bodymap_render::{FileImageSource, RasterSurface};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// annotate body maps and summarize recorded contact points
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// replay a scripted session, save it, and render each figure to PNG
    Replay {
        /// JSON replay script
        #[clap(long)]
        script: PathBuf,

        /// directory holding one JSON file per participant
        #[clap(long)]
        store: Option<PathBuf>,

        /// directory with front/back/left/right figure images
        #[clap(long)]
        assets: Option<PathBuf>,

        /// where to write rendered figures
        #[clap(long)]
        out: Option<PathBuf>,

        /// engine configuration JSON
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// print counts and heatmaps over every stored session
    Summary {
        /// directory holding one JSON file per participant
        #[clap(long)]
        store: Option<PathBuf>,

        /// heatmap bins per axis
        #[clap(long, value_parser = clap::value_parser!(u64).range(1..=MAX_HEATMAP_BINS as u64))]
        bins: Option<u64>,
    },
}

fn read_config(path: Option<&Path>) -> AppResult<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = fs::read_to_string(path).map_err(|e| AppError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    EngineConfig::from_json(&json).map_err(|e| AppError::Script(format!("bad config {}: {}", path.display(), e)))
}

fn open_store(path: Option<PathBuf>) -> AppResult<FileStore> {
    let store = match path {
        Some(path) => FileStore::new(path),
        None => FileStore::default_location(),
    };
    store.map_err(|e| AppError::Core(e.into()))
}

async fn replay(
    script_path: &Path,
    store: Option<PathBuf>,
    assets: Option<PathBuf>,
    out: Option<PathBuf>,
    config: Option<PathBuf>,
) -> AppResult<()> {
    let script = ReplayScript::load(script_path)?;
    let config = read_config(config.as_deref())?;
    let clock = Arc::new(ManualClock::new(script.started_at.unwrap_or_else(Utc::now)));
    let store = Arc::new(open_store(store)?.with_clock(clock.clone()));

    let session = SessionState::new(config.edit_time_limit(), clock.clone());
    let mut engine = InteractionEngine::new(session, config);
    let (display_width, display_height) = script.surface.display_size();
    for figure in Figure::ALL {
        let mut surface = RasterSurface::new(script.surface.width, script.surface.height);
        surface.set_display_size(display_width, display_height);
        engine.setup_figure(figure, surface);
    }
    if let Some(assets) = assets {
        let source = FileImageSource::new(assets);
        for (figure, e) in engine.preload_images(&source).await {
            log::warn!("No background for {}: {}", figure, e);
        }
    }

    let mut coordinator = Coordinator::new(engine, store);
    let report = run_replay(&mut coordinator, &script, &clock).await?;
    log::info!("Replay finished at {}: {:?}", clock.now(), report);
    println!(
        "Recorded {} points ({} rejected, {} scrolls, {} removed)",
        report.recorded, report.rejected, report.scrolled, report.removed
    );

    // Figures are written even if the save below fails.
    if let Some(out) = out {
        fs::create_dir_all(&out).map_err(|e| AppError::Io { path: out.clone(), message: e.to_string() })?;
        coordinator.engine_mut().redraw_all_figures();
        for figure in Figure::ALL {
            if let Some(surface) = coordinator.engine().surface(figure) {
                let path = out.join(format!("{}.png", figure));
                surface.save_png(&path)?;
                log::debug!("Wrote {} ({}x{})", path.display(), surface.size().width, surface.size().height);
            }
        }
    }

    coordinator.save().await?;
    println!(
        "Saved session for participant {} ({} points)",
        coordinator.engine().session().participant_id(),
        coordinator.engine().session().points_count()
    );
    Ok(())
}

async fn summary(store: Option<PathBuf>, bins: Option<u64>) -> AppResult<()> {
    let store = open_store(store)?;
    let bins = bins.map_or(DEFAULT_HEATMAP_BINS, |b| b as usize);
    let report = summarize(&store, bins).await?;
    print!("{}", report.render());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = pollster::block_on(async move {
        match cli.command {
            Command::Replay { script, store, assets, out, config } => {
                replay(&script, store, assets, out, config).await
            }
            Command::Summary { store, bins } => summary(store, bins).await,
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            if e.is_retryable() {
                eprintln!("the operation can be retried");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parses_replay() {
        let cli = Cli::try_parse_from(["bodymap", "replay", "--script", "s.json", "--out", "figs"]).unwrap();
        match cli.command {
            Command::Replay { script, out, store, .. } => {
                assert_eq!(script, PathBuf::from("s.json"));
                assert_eq!(out, Some(PathBuf::from("figs")));
                assert!(store.is_none());
            }
            Command::Summary { .. } => panic!("expected replay"),
        }
    }

    #[test]
    fn test_cli_requires_script() {
        assert!(Cli::try_parse_from(["bodymap", "replay"]).is_err());
    }

    #[test]
    fn test_replay_end_to_end() {
        let dir = tempdir().unwrap();
        let script_path = dir.path().join("session.json");
        fs::write(
            &script_path,
            r#"{
                "participantId": "42",
                "participantName": "Dee",
                "startedAt": "2025-07-01T10:00:00Z",
                "surface": { "width": 40, "height": 80 },
                "confidence": 5,
                "questionnaire": { "q1": "a", "q2": "b", "q3": "c", "q4": "d" },
                "steps": [
                    { "action": "mode", "mode": "mark_touched" },
                    { "action": "tap", "figure": "front", "x": 20, "y": 40 }
                ]
            }"#,
        )
        .unwrap();
        let store = dir.path().join("store");
        let out = dir.path().join("out");

        pollster::block_on(replay(&script_path, Some(store.clone()), None, Some(out.clone()), None)).unwrap();

        for figure in Figure::ALL {
            assert!(out.join(format!("{}.png", figure)).exists());
        }
        let report = pollster::block_on(summarize(&FileStore::new(store).unwrap(), 4)).unwrap();
        assert_eq!(report.summary.total, 1);
        assert_eq!(report.heatmaps[0].2.get(2, 2), 1);
    }

    #[test]
    fn test_cli_bounds_bins() {
        assert!(Cli::try_parse_from(["bodymap", "summary", "--bins", "5000000000"]).is_err());
        assert!(Cli::try_parse_from(["bodymap", "summary", "--bins", "0"]).is_err());
        let cli = Cli::try_parse_from(["bodymap", "summary", "--bins", "256"]).unwrap();
        assert!(matches!(cli.command, Command::Summary { bins: Some(256), .. }));
    }

    #[test]
    fn test_out_of_range_config_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "edit_time_limit_secs": 9000000000000 }"#).unwrap();
        let err = read_config(Some(&path)).unwrap_err();
        assert!(matches!(err, AppError::Script(_)));
    }

    #[test]
    fn test_missing_config_file() {
        let err = read_config(Some(Path::new("/nonexistent/bodymap.json"))).unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
    }
}

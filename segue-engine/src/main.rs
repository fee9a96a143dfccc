//! Segue demo runner - main entry point
//!
//! Drives the gapless engine against two clock-simulated pipelines: plays a
//! playlist of "tracks" with configurable simulated lengths, preloading each
//! following track the way an external shell would from its TrackChanged
//! handler. Useful for watching the transition logs without a real audio
//! backend.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use segue_engine::pipeline::ClockPipeline;
use segue_engine::{EngineConfig, GaplessEngine, PlayerEvent};

/// Command-line arguments for segue-engine
#[derive(Parser, Debug)]
#[command(name = "segue-engine")]
#[command(about = "Gapless playback engine demo (simulated pipelines)")]
#[command(version)]
struct Args {
    /// Track paths to play in order (playback is simulated)
    #[arg(required = true)]
    tracks: Vec<PathBuf>,

    /// Simulated length of each track in milliseconds
    #[arg(short = 'l', long, default_value = "3000")]
    track_length_ms: u64,

    /// Optional TOML config file with engine timing knobs
    #[arg(short, long, env = "SEGUE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "segue_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let durations: HashMap<PathBuf, u64> = args
        .tracks
        .iter()
        .map(|track| (track.clone(), args.track_length_ms))
        .collect();

    let engine = GaplessEngine::new(
        ClockPipeline::new("sim-a", durations.clone()),
        ClockPipeline::new("sim-b", durations),
        config,
    );
    let mut events = engine.subscribe_events();

    info!("Starting simulated playlist of {} tracks", args.tracks.len());
    engine
        .play(&args.tracks[0], args.tracks.get(1).cloned())
        .await
        .context("Failed to start playback")?;

    // React to events the way the external shell would: each completed
    // transition kicks off the preload of the track after next.
    let mut index = 0usize;
    while let Ok(event) = events.recv().await {
        match event {
            PlayerEvent::TrackChanged { path, .. } => {
                index += 1;
                info!(
                    "now playing [{}/{}]: {}",
                    index + 1,
                    args.tracks.len(),
                    path.display()
                );
                if let Some(next) = args.tracks.get(index + 1) {
                    engine.preload_next(next.clone()).await;
                }
            }
            PlayerEvent::EqualizerStop { .. } => {
                info!("playlist complete");
                break;
            }
            other => debug!("event: {:?}", other),
        }
    }

    engine.stop().await;
    Ok(())
}

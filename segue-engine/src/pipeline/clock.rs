//! Clock-driven reference pipeline
//!
//! Simulates a media pipeline on the wall clock: a "loaded" track has a
//! configured duration, position advances in real time while playing, and an
//! end-of-media event fires when the simulated position reaches the
//! duration. No audio is produced.
//!
//! Used by the demo binary and end-to-end tests. Real deployments supply a
//! backend-specific [`MediaPipeline`] implementation instead.

use crate::error::{Error, Result};
use crate::pipeline::MediaPipeline;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Simulated media pipeline advancing on a wall clock
pub struct ClockPipeline {
    label: &'static str,

    /// Simulated track durations, keyed by path. Loading an unlisted path
    /// fails the way a missing file would.
    durations: HashMap<PathBuf, u64>,

    state: Mutex<ClockState>,

    end_of_media: broadcast::Sender<()>,

    /// Self-reference for the end-of-media timer tasks
    weak: Weak<ClockPipeline>,
}

struct ClockState {
    loaded: Option<PathBuf>,
    duration_ms: u64,
    /// Position accumulated before `started_at` (milliseconds)
    offset_ms: u64,
    started_at: Option<Instant>,
    playing: bool,
    volume: u8,
    /// Bumped on every state change; invalidates in-flight end timers
    generation: u64,
}

impl ClockPipeline {
    /// Create a pipeline knowing the given simulated track durations
    pub fn new(label: &'static str, durations: HashMap<PathBuf, u64>) -> Arc<Self> {
        let (end_of_media, _) = broadcast::channel(8);
        Arc::new_cyclic(|weak| Self {
            label,
            durations,
            state: Mutex::new(ClockState {
                loaded: None,
                duration_ms: 0,
                offset_ms: 0,
                started_at: None,
                playing: false,
                volume: 100,
                generation: 0,
            }),
            end_of_media,
            weak: weak.clone(),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ClockState> {
        self.state.lock().unwrap()
    }

    /// Spawn a timer that fires end-of-media after `remaining_ms`, unless
    /// the pipeline state changed in the meantime (generation mismatch).
    fn arm_end_timer(&self, generation: u64, remaining_ms: u64) {
        let Some(this) = self.weak.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(remaining_ms)).await;
            let mut state = this.lock();
            if state.generation != generation || !state.playing {
                trace!("[{}] end timer lapsed (state changed)", this.label);
                return;
            }
            state.playing = false;
            state.offset_ms = state.duration_ms;
            state.started_at = None;
            state.generation += 1;
            drop(state);
            debug!("[{}] end of media reached", this.label);
            let _ = this.end_of_media.send(());
        });
    }
}

impl MediaPipeline for ClockPipeline {
    fn load(&self, path: &Path) -> Result<()> {
        let Some(&duration_ms) = self.durations.get(path) else {
            return Err(Error::MediaLoad(format!(
                "unknown media resource: {}",
                path.display()
            )));
        };
        let mut state = self.lock();
        state.loaded = Some(path.to_path_buf());
        state.duration_ms = duration_ms;
        state.offset_ms = 0;
        state.started_at = None;
        state.playing = false;
        state.generation += 1;
        debug!(
            "[{}] loaded {} ({} ms)",
            self.label,
            path.display(),
            duration_ms
        );
        Ok(())
    }

    fn play(&self) -> Result<()> {
        let mut state = self.lock();
        if state.loaded.is_none() {
            return Err(Error::InvalidState("play without loaded media".into()));
        }
        if state.playing {
            return Ok(());
        }
        state.playing = true;
        state.started_at = Some(Instant::now());
        state.generation += 1;
        let generation = state.generation;
        let remaining_ms = state.duration_ms.saturating_sub(state.offset_ms);
        drop(state);
        self.arm_end_timer(generation, remaining_ms);
        Ok(())
    }

    fn pause(&self) {
        let mut state = self.lock();
        if let Some(started_at) = state.started_at.take() {
            state.offset_ms = (state.offset_ms + started_at.elapsed().as_millis() as u64)
                .min(state.duration_ms);
        }
        state.playing = false;
        state.generation += 1;
    }

    fn stop(&self) {
        let mut state = self.lock();
        state.playing = false;
        state.started_at = None;
        state.offset_ms = 0;
        state.generation += 1;
    }

    fn set_volume(&self, volume: u8) {
        self.lock().volume = volume.min(100);
    }

    fn is_playing(&self) -> bool {
        self.lock().playing
    }

    fn position_ms(&self) -> u64 {
        let state = self.lock();
        let elapsed = state
            .started_at
            .map(|s| s.elapsed().as_millis() as u64)
            .unwrap_or(0);
        (state.offset_ms + elapsed).min(state.duration_ms)
    }

    fn duration_ms(&self) -> u64 {
        self.lock().duration_ms
    }

    fn seek_ms(&self, position_ms: u64) {
        let mut state = self.lock();
        state.offset_ms = position_ms.min(state.duration_ms);
        state.generation += 1;
        if state.playing {
            state.started_at = Some(Instant::now());
            let generation = state.generation;
            let remaining_ms = state.duration_ms.saturating_sub(state.offset_ms);
            drop(state);
            self.arm_end_timer(generation, remaining_ms);
        }
    }

    fn subscribe_end_of_media(&self) -> broadcast::Receiver<()> {
        self.end_of_media.subscribe()
    }
}

//! Gapless engine - public playback commands and slot selection
//!
//! Owns both playback units, the shared state, the transition monitor, and
//! the event bus. All mutation of roles and track paths happens through the
//! methods here and in the handoff module, under the one preload lock.

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::pipeline::MediaPipeline;
use crate::playback::monitor;
use crate::playback::state::EngineState;
use crate::playback::unit::{PlaybackUnit, SlotId, UnitState};
use segue_common::events::{EventBus, PlayerEvent};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info, warn};

/// Gapless dual-pipeline playback engine
///
/// Cheap to clone; clones share all state. Background tasks (monitor,
/// preload, end-of-media listeners) run on clones, so the engine is torn
/// down by calling [`stop`](Self::stop), not by dropping handles.
#[derive(Clone)]
pub struct GaplessEngine {
    /// Fixed pool of exactly two reusable pipeline slots
    pub(crate) units: Arc<[PlaybackUnit; 2]>,

    /// Preload lock: role pointers, track paths, unit states, volume
    pub(crate) state: Arc<Mutex<EngineState>>,

    /// Double-handoff guard, claimed by compare-and-swap
    pub(crate) transition_triggered: Arc<AtomicBool>,

    /// Broadcasts to the shell (UI, visualizer, tests)
    pub(crate) events: Arc<EventBus>,

    config: Arc<EngineConfig>,

    /// Transition monitor run flag; Some while the monitor task is alive
    monitor_run: Arc<std::sync::Mutex<Option<watch::Sender<bool>>>>,

    /// End-of-media listener tasks spawned at most once
    listeners_started: Arc<AtomicBool>,
}

impl GaplessEngine {
    /// Create an engine over two pipeline instances
    ///
    /// The pipelines are created once by the caller and reused for every
    /// track; the engine never reinitializes them.
    pub fn new(
        pipeline_a: Arc<dyn MediaPipeline>,
        pipeline_b: Arc<dyn MediaPipeline>,
        config: EngineConfig,
    ) -> Self {
        let events = Arc::new(EventBus::new(config.event_capacity));
        Self {
            units: Arc::new([
                PlaybackUnit::new(SlotId::A, pipeline_a),
                PlaybackUnit::new(SlotId::B, pipeline_b),
            ]),
            state: Arc::new(Mutex::new(EngineState::new(config.volume))),
            transition_triggered: Arc::new(AtomicBool::new(false)),
            events,
            config: Arc::new(config),
            monitor_run: Arc::new(std::sync::Mutex::new(None)),
            listeners_started: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn unit(&self, slot: SlotId) -> &PlaybackUnit {
        &self.units[slot.index()]
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Subscribe to engine events
    pub fn subscribe_events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Load and start `path`, optionally preloading `preload_hint` into the
    /// standby unit in the background.
    ///
    /// Slot selection: the first play lands on slot A; afterwards, if the
    /// standby already holds `path` preloaded, the roles swap without a
    /// reload (this is what makes a caller-driven track change gapless);
    /// otherwise the standby is loaded fresh and promoted.
    pub async fn play(&self, path: impl AsRef<Path>, preload_hint: Option<PathBuf>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        self.ensure_end_of_media_listeners();

        let mut state = self.state.lock().await;
        self.transition_triggered.store(false, Ordering::Release);
        let previous_active = state.active;

        if state.active.is_none() {
            let unit = self.unit(SlotId::A);
            state.set_unit_state(SlotId::A, UnitState::Loading);
            if let Err(e) = unit.pipeline.load(&path) {
                state.set_unit_state(SlotId::A, UnitState::Idle);
                return Err(e);
            }
            state.active = Some(SlotId::A);
            state.standby = Some(SlotId::B);
            debug!("slot A active, slot B standby");
        } else if state.is_preloaded(&path) {
            info!("using preloaded track: {}", path.display());
            state.swap_roles();
            // Preload consumed
            state.next_track = None;
        } else {
            warn!(
                "loading track without preload (transition not gapless): {}",
                path.display()
            );
            let Some(target) = state.standby else {
                return Err(Error::InvalidState("active unit with no standby".into()));
            };
            let unit = self.unit(target);
            state.set_unit_state(target, UnitState::Loading);
            if let Err(e) = unit.pipeline.load(&path) {
                state.set_unit_state(target, UnitState::Idle);
                return Err(e);
            }
            state.standby = state.active;
            state.active = Some(target);
            // Whatever was preloaded in this unit is gone now
            state.next_track = None;
        }

        let Some(active) = state.active else {
            return Err(Error::InvalidState("no active unit after slot selection".into()));
        };
        let active_unit = self.unit(active);
        active_unit.pipeline.set_volume(state.volume);
        if let Err(e) = active_unit.pipeline.play() {
            state.set_unit_state(active, UnitState::Idle);
            return Err(e);
        }

        // Only one unit's output may be audible: silence the demoted unit
        // if the caller changed tracks mid-play.
        if let Some(previous) = previous_active {
            if previous != active && self.unit(previous).pipeline.is_playing() {
                debug!("stopping demoted unit {}", previous);
                self.unit(previous).pipeline.stop();
            }
        }

        state.current_track = Some(path.clone());
        state.mark_roles_after_swap();
        drop(state);

        self.start_monitor();

        if let Some(hint) = preload_hint {
            let engine = self.clone();
            tokio::spawn(async move {
                engine.preload_next(hint).await;
            });
        }

        self.events.emit_lossy(PlayerEvent::equalizer_start(&path));
        Ok(())
    }

    /// Load a future track into the standby unit without touching the
    /// active unit's output.
    ///
    /// Silent no-op when there is no standby unit, when `path` is already
    /// playing, or when `path` is already preloaded. Runs concurrently with
    /// playback; callers usually spawn it (as `play` does for its hint).
    pub async fn preload_next(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut state = self.state.lock().await;
        let Some(standby) = state.standby else {
            debug!("preload skipped: no standby unit");
            return;
        };
        if state.current_track.as_deref() == Some(path.as_path()) {
            debug!("preload skipped: {} is already playing", path.display());
            return;
        }
        if state.next_track.as_deref() == Some(path.as_path()) {
            debug!("already preloaded: {}", path.display());
            return;
        }

        let unit = self.unit(standby);
        state.set_unit_state(standby, UnitState::Loading);
        match unit.pipeline.load(&path) {
            Ok(()) => {
                // Match the shared volume now so the future handoff cannot
                // produce a level jump.
                unit.pipeline.set_volume(state.volume);
                state.set_unit_state(standby, UnitState::Ready);
                state.next_track = Some(path.clone());
                info!("preloaded next track: {}", path.display());
            }
            Err(e) => {
                state.set_unit_state(standby, UnitState::Idle);
                state.next_track = None;
                warn!("failed to preload {}: {}", path.display(), e);
            }
        }
    }

    /// Pause the active unit, freezing (not clearing) the visualizer
    pub async fn pause(&self) {
        let state = self.state.lock().await;
        let Some(active) = state.active else {
            return;
        };
        let unit = self.unit(active);
        if unit.pipeline.is_playing() {
            unit.pipeline.pause();
            drop(state);
            self.events.emit_lossy(PlayerEvent::equalizer_pause());
            info!("playback paused");
        }
    }

    /// Resume after a pause; no-op unless a current track exists and the
    /// active unit is not already playing
    pub async fn resume(&self) {
        let state = self.state.lock().await;
        let (Some(active), Some(track)) = (state.active, state.current_track.clone()) else {
            return;
        };
        let unit = self.unit(active);
        if unit.pipeline.is_playing() {
            return;
        }
        if let Err(e) = unit.pipeline.play() {
            warn!("failed to resume playback: {}", e);
            return;
        }
        drop(state);
        self.start_monitor();
        self.events.emit_lossy(PlayerEvent::equalizer_resume(&track));
        info!("playback resumed");
    }

    /// Stop both units and clear all track/preload state. Terminal until
    /// the next `play`.
    ///
    /// Takes the preload lock while clearing, so an in-flight preload
    /// either lands before (and is clobbered here) or blocks until after
    /// (and finds no standby unit to attach to).
    pub async fn stop(&self) {
        self.stop_monitor();
        let mut state = self.state.lock().await;
        for unit in self.units.iter() {
            unit.pipeline.stop();
        }
        state.clear();
        self.transition_triggered.store(false, Ordering::Release);
        drop(state);
        self.events.emit_lossy(PlayerEvent::equalizer_stop());
        info!("playback stopped");
    }

    /// Set output volume on both units uniformly (0-100)
    pub async fn set_volume(&self, volume: u8) {
        let volume = volume.min(100);
        let mut state = self.state.lock().await;
        state.volume = volume;
        for unit in self.units.iter() {
            unit.pipeline.set_volume(volume);
        }
        debug!("volume set to {}", volume);
    }

    /// Seek within the active unit's media; no-op when nothing is active
    pub async fn seek_ms(&self, position_ms: u64) {
        let state = self.state.lock().await;
        if let Some(active) = state.active {
            self.unit(active).pipeline.seek_ms(position_ms);
        }
    }

    /// Elapsed time of the active unit (0 when nothing is active)
    pub async fn position_ms(&self) -> u64 {
        let state = self.state.lock().await;
        state
            .active
            .map(|slot| self.unit(slot).pipeline.position_ms())
            .unwrap_or(0)
    }

    /// Duration of the active unit's media (0 when nothing is active)
    pub async fn duration_ms(&self) -> u64 {
        let state = self.state.lock().await;
        state
            .active
            .map(|slot| self.unit(slot).pipeline.duration_ms())
            .unwrap_or(0)
    }

    /// Whether an active unit exists and reports playing
    pub async fn is_playing(&self) -> bool {
        let state = self.state.lock().await;
        state
            .active
            .map(|slot| self.unit(slot).pipeline.is_playing())
            .unwrap_or(false)
    }

    /// Path currently playing, if any
    pub async fn current_track(&self) -> Option<PathBuf> {
        self.state.lock().await.current_track.clone()
    }

    /// Path preloaded into the standby unit, if any
    pub async fn next_track(&self) -> Option<PathBuf> {
        self.state.lock().await.next_track.clone()
    }

    /// Current shared volume (0-100)
    pub async fn volume(&self) -> u8 {
        self.state.lock().await.volume
    }

    /// Lifecycle state of one unit
    pub async fn unit_state(&self, slot: SlotId) -> UnitState {
        self.state.lock().await.unit_state(slot)
    }

    /// Start the transition monitor if it is not already running
    pub(crate) fn start_monitor(&self) {
        let mut run = self.monitor_run.lock().unwrap();
        if run.is_some() {
            return;
        }
        let (tx, rx) = watch::channel(true);
        *run = Some(tx);
        monitor::spawn_transition_monitor(self.clone(), rx);
    }

    /// Cancel the transition monitor
    pub(crate) fn stop_monitor(&self) {
        if let Some(tx) = self.monitor_run.lock().unwrap().take() {
            let _ = tx.send(false);
        }
    }

    /// Whether the transition monitor task is running
    pub fn monitor_running(&self) -> bool {
        self.monitor_run.lock().unwrap().is_some()
    }

    /// Attach one end-of-media listener task per unit (at most once)
    fn ensure_end_of_media_listeners(&self) {
        if self
            .listeners_started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        for slot in [SlotId::A, SlotId::B] {
            let engine = self.clone();
            let mut end_rx = self.unit(slot).pipeline.subscribe_end_of_media();
            tokio::spawn(async move {
                loop {
                    match end_rx.recv().await {
                        Ok(()) => engine.handle_end_of_media(slot).await,
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            });
        }
    }
}

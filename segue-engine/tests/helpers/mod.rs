//! Shared test infrastructure for segue-engine integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};

use segue_engine::error::{Error, Result};
use segue_engine::{EngineConfig, GaplessEngine, MediaPipeline, PlayerEvent};

/// Fully scripted media pipeline
///
/// Position and end-of-media are under test control; every load/play/stop
/// call is recorded so tests can assert on the interaction with the
/// underlying backend, not just on engine state.
pub struct StubPipeline {
    label: &'static str,
    inner: Mutex<StubState>,
    end_of_media: broadcast::Sender<()>,
}

#[derive(Default)]
struct StubState {
    durations: HashMap<PathBuf, u64>,
    loaded: Option<PathBuf>,
    playing: bool,
    /// play() succeeds but is_playing stays false (stuck backend)
    refuse_start: bool,
    /// load() fails (missing file, bad codec)
    fail_load: bool,
    position_ms: u64,
    volume: u8,
    load_calls: Vec<PathBuf>,
    play_calls: u32,
    stop_calls: u32,
}

impl StubPipeline {
    pub fn new(label: &'static str) -> Arc<Self> {
        let (end_of_media, _) = broadcast::channel(8);
        Arc::new(Self {
            label,
            inner: Mutex::new(StubState::default()),
            end_of_media,
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Register a simulated duration for a path (loading unknown paths fails)
    pub fn set_duration(&self, path: impl Into<PathBuf>, duration_ms: u64) {
        self.inner
            .lock()
            .unwrap()
            .durations
            .insert(path.into(), duration_ms);
    }

    /// Move the simulated playhead
    pub fn set_position(&self, position_ms: u64) {
        self.inner.lock().unwrap().position_ms = position_ms;
    }

    pub fn set_refuse_start(&self, refuse: bool) {
        self.inner.lock().unwrap().refuse_start = refuse;
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.inner.lock().unwrap().fail_load = fail;
    }

    /// Simulate the backend reaching end of media: playback stops and the
    /// end-of-media event fires
    pub fn fire_end_of_media(&self) {
        {
            let mut state = self.inner.lock().unwrap();
            state.playing = false;
            if let Some(duration) = state.loaded.as_ref().and_then(|p| state.durations.get(p)) {
                state.position_ms = *duration;
            }
        }
        let _ = self.end_of_media.send(());
    }

    pub fn loaded(&self) -> Option<PathBuf> {
        self.inner.lock().unwrap().loaded.clone()
    }

    pub fn volume(&self) -> u8 {
        self.inner.lock().unwrap().volume
    }

    pub fn load_calls(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().load_calls.clone()
    }

    pub fn play_calls(&self) -> u32 {
        self.inner.lock().unwrap().play_calls
    }

    pub fn stop_calls(&self) -> u32 {
        self.inner.lock().unwrap().stop_calls
    }
}

impl MediaPipeline for StubPipeline {
    fn load(&self, path: &Path) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        state.load_calls.push(path.to_path_buf());
        if state.fail_load {
            return Err(Error::MediaLoad(format!(
                "scripted load failure: {}",
                path.display()
            )));
        }
        if !state.durations.contains_key(path) {
            return Err(Error::MediaLoad(format!(
                "unknown media resource: {}",
                path.display()
            )));
        }
        state.loaded = Some(path.to_path_buf());
        state.position_ms = 0;
        state.playing = false;
        Ok(())
    }

    fn play(&self) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        if state.loaded.is_none() {
            return Err(Error::InvalidState("play without loaded media".into()));
        }
        state.play_calls += 1;
        if !state.refuse_start {
            state.playing = true;
        }
        Ok(())
    }

    fn pause(&self) {
        self.inner.lock().unwrap().playing = false;
    }

    fn stop(&self) {
        let mut state = self.inner.lock().unwrap();
        state.playing = false;
        state.position_ms = 0;
        state.stop_calls += 1;
    }

    fn set_volume(&self, volume: u8) {
        self.inner.lock().unwrap().volume = volume.min(100);
    }

    fn is_playing(&self) -> bool {
        self.inner.lock().unwrap().playing
    }

    fn position_ms(&self) -> u64 {
        self.inner.lock().unwrap().position_ms
    }

    fn duration_ms(&self) -> u64 {
        let state = self.inner.lock().unwrap();
        state
            .loaded
            .as_ref()
            .and_then(|p| state.durations.get(p))
            .copied()
            .unwrap_or(0)
    }

    fn seek_ms(&self, position_ms: u64) {
        let mut state = self.inner.lock().unwrap();
        let duration = state
            .loaded
            .as_ref()
            .and_then(|p| state.durations.get(p))
            .copied()
            .unwrap_or(0);
        state.position_ms = position_ms.min(duration);
    }

    fn subscribe_end_of_media(&self) -> broadcast::Receiver<()> {
        self.end_of_media.subscribe()
    }
}

/// Engine over two stubs that both know the standard test tracks
/// (`track_a` 3000ms, `track_b` 3000ms, `track_c` 2000ms)
pub fn engine_with_stubs() -> (GaplessEngine, Arc<StubPipeline>, Arc<StubPipeline>) {
    let stub_a = StubPipeline::new("stub-a");
    let stub_b = StubPipeline::new("stub-b");
    for stub in [&stub_a, &stub_b] {
        stub.set_duration(track_a(), 3000);
        stub.set_duration(track_b(), 3000);
        stub.set_duration(track_c(), 2000);
    }
    let engine = GaplessEngine::new(
        stub_a.clone(),
        stub_b.clone(),
        EngineConfig::default(),
    );
    (engine, stub_a, stub_b)
}

pub fn track_a() -> PathBuf {
    PathBuf::from("/music/track_a.flac")
}

pub fn track_b() -> PathBuf {
    PathBuf::from("/music/track_b.mp3")
}

pub fn track_c() -> PathBuf {
    PathBuf::from("/music/track_c.ogg")
}

/// Wait (max ~1s) until the engine reports `path` preloaded
pub async fn wait_for_preload(engine: &GaplessEngine, path: &Path) {
    for _ in 0..100 {
        if engine.next_track().await.as_deref() == Some(path) {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("preload of {} did not complete", path.display());
}

/// Receive the next event, failing the test after one second of silence
pub async fn next_event(rx: &mut broadcast::Receiver<PlayerEvent>) -> PlayerEvent {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for an engine event")
        .expect("event channel closed")
}

/// Drain events until the bus has been quiet for `quiet_ms`
pub async fn collect_until_quiet(
    rx: &mut broadcast::Receiver<PlayerEvent>,
    quiet_ms: u64,
) -> Vec<PlayerEvent> {
    let mut events = Vec::new();
    while let Ok(Ok(event)) = timeout(Duration::from_millis(quiet_ms), rx.recv()).await {
        events.push(event);
    }
    events
}

/// Number of TrackChanged events in a slice
pub fn track_changes(events: &[PlayerEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, PlayerEvent::TrackChanged { .. }))
        .count()
}

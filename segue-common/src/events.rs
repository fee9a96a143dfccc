//! Event types for the Segue playback engine
//!
//! Provides the shared event enum and the EventBus broadcaster.
//!
//! # Architecture
//!
//! The engine communicates with its shell (UI, visualizer, tests) through
//! one-way broadcast events:
//! - **EventBus** (tokio::broadcast): one-to-many event fan-out
//! - Events carry UTC timestamps and serialize to JSON for transport to
//!   out-of-process consumers
//!
//! Ordering guarantee: events are delivered to each subscriber in emit
//! order, and the engine emits an event only after the audio transition it
//! describes has actually happened (e.g. `TrackChanged` fires after the new
//! pipeline is verified playing).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

/// Events emitted by the playback engine
///
/// The `Equalizer*` events are advisory visualizer lifecycle hooks: the
/// visualizer observes playback, it never controls it. A shell without a
/// visualizer can ignore them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Track boundary crossed - a handoff (proactive or fallback) or a
    /// manual track change completed and the new track is audible
    TrackChanged {
        /// Path of the track now playing
        path: PathBuf,
        /// When the change was confirmed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Visualizer should begin sampling the given track
    EqualizerStart {
        /// Path of the track now playing
        path: PathBuf,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Visualizer should freeze its display (playback paused, not stopped)
    EqualizerPause {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Visualizer should resume sampling after a pause
    EqualizerResume {
        /// Path of the track still current
        path: PathBuf,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Visualizer should stop and clear - playback ended or was stopped
    EqualizerStop {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlayerEvent {
    pub fn track_changed(path: impl Into<PathBuf>) -> Self {
        PlayerEvent::TrackChanged {
            path: path.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn equalizer_start(path: impl Into<PathBuf>) -> Self {
        PlayerEvent::EqualizerStart {
            path: path.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn equalizer_pause() -> Self {
        PlayerEvent::EqualizerPause {
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn equalizer_resume(path: impl Into<PathBuf>) -> Self {
        PlayerEvent::EqualizerResume {
            path: path.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn equalizer_stop() -> Self {
        PlayerEvent::EqualizerStop {
            timestamp: chrono::Utc::now(),
        }
    }

    /// Track path carried by this event, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            PlayerEvent::TrackChanged { path, .. }
            | PlayerEvent::EqualizerStart { path, .. }
            | PlayerEvent::EqualizerResume { path, .. } => Some(path),
            PlayerEvent::EqualizerPause { .. } | PlayerEvent::EqualizerStop { .. } => None,
        }
    }
}

/// One-to-many event broadcaster
///
/// Thin wrapper around `tokio::sync::broadcast` so emitters do not have to
/// care whether anyone is listening. Slow subscribers that fall behind the
/// channel capacity lose the oldest events (broadcast semantics); the engine
/// treats every event as lossy-tolerable since subscribers can re-query
/// engine state at any time.
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)`, or `Err` if no subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayerEvent,
    ) -> Result<usize, broadcast::error::SendError<PlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

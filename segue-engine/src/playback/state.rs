//! Shared engine state
//!
//! All role pointers and track paths live behind one `tokio::sync::Mutex`
//! (the preload lock). Every reader that makes a handoff decision from
//! `next_track` takes the same lock as the writer, so the monitor can never
//! act on a half-updated path.
//!
//! The `transition_triggered` double-handoff guard is NOT here: it is an
//! atomic owned by the engine, claimed by compare-and-swap so that exactly
//! one of {monitor tick, end-of-media callback} wins a track boundary.

use crate::playback::unit::{SlotId, UnitState};
use std::path::{Path, PathBuf};

/// Role pointers, track paths, and per-unit states
///
/// Invariants:
/// - `active` and `standby`, when both set, name distinct slots
/// - `next_track` is only set while the standby unit actually holds that
///   path (cleared whenever the standby's media is consumed or clobbered)
#[derive(Debug)]
pub struct EngineState {
    /// Unit producing audible output (None when stopped)
    pub active: Option<SlotId>,

    /// The other unit, preloaded or empty (None when stopped)
    pub standby: Option<SlotId>,

    /// Path currently playing
    pub current_track: Option<PathBuf>,

    /// Path loaded into the standby unit, if any
    pub next_track: Option<PathBuf>,

    /// Discrete lifecycle state per unit, indexed by `SlotId::index()`
    unit_states: [UnitState; 2],

    /// Shared output volume, 0-100. Applied to both units so a handoff
    /// never produces a level jump.
    pub volume: u8,
}

impl EngineState {
    pub fn new(volume: u8) -> Self {
        Self {
            active: None,
            standby: None,
            current_track: None,
            next_track: None,
            unit_states: [UnitState::Idle, UnitState::Idle],
            volume: volume.min(100),
        }
    }

    pub fn unit_state(&self, slot: SlotId) -> UnitState {
        self.unit_states[slot.index()]
    }

    pub fn set_unit_state(&mut self, slot: SlotId, state: UnitState) {
        self.unit_states[slot.index()] = state;
    }

    /// Whether `path` is sitting preloaded in a standby unit
    pub fn is_preloaded(&self, path: &Path) -> bool {
        self.standby.is_some() && self.next_track.as_deref() == Some(path)
    }

    /// Swap the active/standby role pointers
    pub fn swap_roles(&mut self) {
        std::mem::swap(&mut self.active, &mut self.standby);
    }

    /// Mark unit states to match the role pointers: active Playing,
    /// standby Idle
    pub fn mark_roles_after_swap(&mut self) {
        if let Some(active) = self.active {
            self.set_unit_state(active, UnitState::Playing);
        }
        if let Some(standby) = self.standby {
            self.set_unit_state(standby, UnitState::Idle);
        }
    }

    /// Reset to the stopped state: no roles, no tracks, both units Idle.
    /// Volume survives a stop.
    pub fn clear(&mut self) {
        self.active = None;
        self.standby = None;
        self.current_track = None;
        self.next_track = None;
        self.unit_states = [UnitState::Idle, UnitState::Idle];
    }
}

//! Playback unit - one slot of the dual-pipeline pool
//!
//! Exactly two units exist for the lifetime of the engine. One is "active"
//! (producing audible output) or none is (stopped); at most one is "standby"
//! (preloaded or empty). Units are reused across tracks, never reallocated.

use crate::pipeline::MediaPipeline;
use std::fmt;
use std::sync::Arc;

/// Identity of a playback unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotId {
    A,
    B,
}

impl SlotId {
    /// Get the other slot
    pub fn other(&self) -> Self {
        match self {
            SlotId::A => SlotId::B,
            SlotId::B => SlotId::A,
        }
    }

    /// Index into per-unit arrays
    pub fn index(&self) -> usize {
        match self {
            SlotId::A => 0,
            SlotId::B => 1,
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotId::A => write!(f, "A"),
            SlotId::B => write!(f, "B"),
        }
    }
}

/// Lifecycle state of one playback unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// No media, or media exhausted
    Idle,
    /// Media resource being loaded
    Loading,
    /// Preloaded and waiting for handoff
    Ready,
    /// Producing audible output
    Playing,
    /// Handoff in progress away from this unit
    Finishing,
}

/// One pipeline instance plus its slot identity
pub struct PlaybackUnit {
    pub slot: SlotId,
    pub pipeline: Arc<dyn MediaPipeline>,
}

impl PlaybackUnit {
    pub fn new(slot: SlotId, pipeline: Arc<dyn MediaPipeline>) -> Self {
        Self { slot, pipeline }
    }
}

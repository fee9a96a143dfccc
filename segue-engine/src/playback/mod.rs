//! Gapless playback orchestration

pub mod engine;
pub mod handoff;
pub mod monitor;
pub mod state;
pub mod unit;

pub use engine::GaplessEngine;
pub use state::EngineState;
pub use unit::{PlaybackUnit, SlotId, UnitState};

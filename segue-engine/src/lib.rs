//! # Segue Playback Engine (segue-engine)
//!
//! Gapless dual-pipeline playback engine.
//!
//! **Purpose:** Keep two media pipelines alternately active and standby so
//! that track boundaries produce no audible gap, click, or re-buffering
//! delay. A background monitor watches the active pipeline's remaining time
//! and hands playback off to a preloaded standby pipeline just before the
//! track ends; the pipeline's own end-of-media event is kept as a fallback
//! safety net.
//!
//! **Architecture:** The engine orchestrates; it does not decode. Audio
//! decode/output is an external capability supplied through the
//! [`MediaPipeline`] trait (load / play / pause / stop / volume / time /
//! seek / end-of-media events). UI concerns arrive as commands and leave as
//! [`PlayerEvent`] broadcasts - the engine never calls into a shell.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod playback;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use pipeline::MediaPipeline;
pub use playback::GaplessEngine;

// Shared event types live in segue-common so out-of-process consumers can
// depend on them without pulling in the engine.
pub use segue_common::events::{EventBus, PlayerEvent};

//! # Segue Common Library (segue-common)
//!
//! Shared types for the Segue gapless playback engine.
//!
//! **Purpose:** Event definitions and the `EventBus` broadcaster, shared
//! between the playback engine (`segue-engine`) and whatever shell consumes
//! it (desktop UI, remote control surface, tests). The engine emits events
//! and never calls into the shell; the shell subscribes and reacts.

pub mod events;

pub use events::{EventBus, PlayerEvent};

//! Engine configuration
//!
//! Timing and capacity knobs for the gapless engine. Every field has a
//! default tuned against real pipeline backends, so a config file only needs
//! to name the fields it changes.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Gapless engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Remaining-time window before end-of-track within which the handoff
    /// fires (milliseconds)
    pub transition_threshold_ms: u64,

    /// Transition monitor poll interval (milliseconds). Must be well under
    /// the threshold window; 20ms catches a 500ms window with margin.
    pub monitor_interval_ms: u64,

    /// Wait before first is-playing check after starting the standby
    /// pipeline during a handoff (milliseconds)
    pub handoff_verify_delay_ms: u64,

    /// Wait before the single retry check when the first verify fails
    /// (milliseconds)
    pub handoff_retry_delay_ms: u64,

    /// Wait before verifying the standby started during an end-of-media
    /// fallback swap (milliseconds). Longer than the handoff delay because
    /// by this point the old track is already silent.
    pub fallback_verify_delay_ms: u64,

    /// Initial output volume, 0-100
    pub volume: u8,

    /// Event broadcast channel capacity
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transition_threshold_ms: 500,
            monitor_interval_ms: 20,
            handoff_verify_delay_ms: 10,
            handoff_retry_delay_ms: 20,
            fallback_verify_delay_ms: 50,
            volume: 70,
            event_capacity: 100,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    ///
    /// Missing fields fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

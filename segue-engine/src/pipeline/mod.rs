//! Media pipeline abstraction
//!
//! The engine consumes audio decode/output as an external capability, the
//! shape of a libVLC-style media player object. Two pipeline instances are
//! created once and reused for every track; the engine never constructs
//! pipelines per-play, so backend initialization cost cannot threaten
//! gaplessness.

pub mod clock;

use crate::error::Result;
use std::path::Path;
use tokio::sync::broadcast;

pub use clock::ClockPipeline;

/// One independent audio decode/output pipeline
///
/// Implementations wrap a real backend (libVLC, GStreamer playbin, a
/// rodio sink, ...). All methods must be cheap enough to call from the
/// 20ms monitor tick; `load` is the only operation allowed to block on I/O.
///
/// The end-of-media subscription may deliver from an arbitrary thread or
/// task; the engine treats the emitting context as unspecified.
pub trait MediaPipeline: Send + Sync {
    /// Load a media resource by path, replacing any previous media
    ///
    /// Does not start playback. Position resets to zero.
    fn load(&self, path: &Path) -> Result<()>;

    /// Start or resume playback of the loaded media
    fn play(&self) -> Result<()>;

    /// Pause playback, keeping position
    fn pause(&self);

    /// Stop playback and reset position to zero (media stays loaded)
    fn stop(&self);

    /// Set output volume, 0-100
    fn set_volume(&self, volume: u8);

    /// Whether audio is currently being produced
    fn is_playing(&self) -> bool;

    /// Elapsed time in the current media (milliseconds, 0 when idle)
    fn position_ms(&self) -> u64;

    /// Total duration of the loaded media (milliseconds, 0 when unknown)
    fn duration_ms(&self) -> u64;

    /// Seek to a position in the current media (milliseconds)
    fn seek_ms(&self, position_ms: u64);

    /// Subscribe to end-of-media notifications
    ///
    /// One notification is delivered each time playback reaches the end of
    /// the loaded media.
    fn subscribe_end_of_media(&self) -> broadcast::Receiver<()>;
}

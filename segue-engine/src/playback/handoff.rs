//! Handoff controller and end-of-media fallback
//!
//! The handoff is the atomic swap of active/standby roles at a track
//! boundary. The proactive path is driven by the transition monitor; the
//! end-of-media path is a safety net for when the monitor misses the window
//! (threshold miscalculation, slow disk) and doubles as end-of-playlist
//! detection.

use crate::pipeline::MediaPipeline;
use crate::playback::engine::GaplessEngine;
use crate::playback::unit::{SlotId, UnitState};
use segue_common::events::PlayerEvent;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Wait `delay_ms`, then report whether the pipeline actually started
async fn started_after(pipeline: &Arc<dyn MediaPipeline>, delay_ms: u64) -> bool {
    sleep(Duration::from_millis(delay_ms)).await;
    pipeline.is_playing()
}

impl GaplessEngine {
    /// Swap active and standby at a track boundary.
    ///
    /// The caller must have claimed `transition_triggered`; this method
    /// releases it on any failure so a later trigger (next tick, or the
    /// end-of-media event) can retry.
    pub(crate) async fn perform_handoff(&self) {
        let mut state = self.state.lock().await;

        // The monitor may have fired against state that a concurrent stop()
        // or manual play() cleared while the trigger was in flight.
        let (Some(active), Some(standby), Some(next)) =
            (state.active, state.standby, state.next_track.clone())
        else {
            self.transition_triggered.store(false, Ordering::Release);
            return;
        };

        info!("gapless transition to {}", next.display());
        let incoming = &self.unit(standby).pipeline;
        incoming.set_volume(state.volume);
        if let Err(e) = incoming.play() {
            warn!("standby unit {} failed to start: {}", standby, e);
            self.transition_triggered.store(false, Ordering::Release);
            return;
        }
        if !started_after(incoming, self.config().handoff_verify_delay_ms).await {
            // One bounded retry; if the standby still refuses, leave the
            // current track playing past its preloaded point rather than
            // dropping audio.
            let retried = incoming.play().is_ok()
                && started_after(incoming, self.config().handoff_retry_delay_ms).await;
            if !retried {
                warn!(
                    "standby unit {} did not start, keeping current track audible",
                    standby
                );
                self.transition_triggered.store(false, Ordering::Release);
                return;
            }
        }

        state.set_unit_state(active, UnitState::Finishing);
        state.swap_roles();
        state.current_track = Some(next.clone());
        state.next_track = None;
        state.set_unit_state(standby, UnitState::Playing);

        // Emit only after the incoming unit is confirmed playing, track
        // change before the visualizer hook.
        self.events.emit_lossy(PlayerEvent::track_changed(&next));
        self.events.emit_lossy(PlayerEvent::equalizer_start(&next));

        // Stop the outgoing unit explicitly to free decode resources and
        // restore its volume baseline for reuse.
        let outgoing = &self.unit(active).pipeline;
        outgoing.set_volume(state.volume);
        outgoing.stop();
        state.set_unit_state(active, UnitState::Idle);

        // Release the trigger for the next track boundary. Stale events from
        // the demoted unit are filtered by the active-role check instead.
        self.transition_triggered.store(false, Ordering::Release);
        debug!("transition complete, slot {} now active", standby);
    }

    /// End-of-media safety net for the unit in `slot`.
    ///
    /// Ignores events from demoted units and boundaries the monitor already
    /// claimed. An empty `next_track` means genuine end of playlist.
    pub(crate) async fn handle_end_of_media(&self, slot: SlotId) {
        let mut state = self.state.lock().await;
        if state.active != Some(slot) {
            // Stale event from a unit that already lost its active role
            return;
        }
        if self
            .transition_triggered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let (Some(standby), Some(next)) = (state.standby, state.next_track.clone()) else {
            info!("end of playlist reached");
            state.set_unit_state(slot, UnitState::Idle);
            drop(state);
            self.stop_monitor();
            self.events.emit_lossy(PlayerEvent::equalizer_stop());
            return;
        };

        warn!(
            "proactive transition missed the window for {}, using end-of-media fallback",
            next.display()
        );
        let incoming = &self.unit(standby).pipeline;
        incoming.set_volume(state.volume);
        let started = incoming.play().is_ok()
            && started_after(incoming, self.config().fallback_verify_delay_ms).await;
        if !started {
            // Nothing audible remains; the shell sees no TrackChanged and
            // can surface the stall to the user.
            warn!("fallback start failed, playback halted");
            self.transition_triggered.store(false, Ordering::Release);
            return;
        }

        let outgoing = &self.unit(slot).pipeline;
        outgoing.stop();
        state.swap_roles();
        state.current_track = Some(next.clone());
        state.mark_roles_after_swap();
        // next_track is intentionally left in place here: the shell's
        // TrackChanged handler drives the next preload cycle, and that load
        // replaces it.
        self.transition_triggered.store(false, Ordering::Release);
        self.events.emit_lossy(PlayerEvent::track_changed(&next));
        self.events.emit_lossy(PlayerEvent::equalizer_start(&next));
        debug!("fallback transition complete, slot {} now active", standby);
    }
}

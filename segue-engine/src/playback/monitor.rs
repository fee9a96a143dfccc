//! Transition monitor - background polling task
//!
//! Polls the active unit's remaining time and fires the handoff when it
//! enters the transition window. Polling (default 20ms tick) rather than an
//! armed timer: the underlying pipelines only offer a coarse end-of-media
//! event with no pre-trigger, and a freshly loaded medium's duration is not
//! reliably known up front for every backend, so sub-second precision needs
//! an active read of time-remaining.

use crate::playback::engine::GaplessEngine;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace};

/// Spawn the monitor task; it runs until `run` flips to false or its sender
/// is dropped
pub(crate) fn spawn_transition_monitor(
    engine: GaplessEngine,
    mut run: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let tick_ms = engine.config().monitor_interval_ms.max(1);
        let mut ticker = interval(Duration::from_millis(tick_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("transition monitor started ({}ms interval)", tick_ms);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    engine.monitor_tick().await;
                }
                changed = run.changed() => {
                    if changed.is_err() || !*run.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("transition monitor stopped");
    })
}

impl GaplessEngine {
    /// One monitor tick: trigger the handoff when the active unit is inside
    /// the transition window and a preloaded standby is waiting.
    ///
    /// The handoff runs synchronously on the monitor task - timing
    /// precision at the track boundary matters more than keeping the
    /// monitor unblocked, and the handoff itself is bounded at tens of
    /// milliseconds.
    pub(crate) async fn monitor_tick(&self) {
        let (active, next_ready) = {
            let state = self.state.lock().await;
            (
                state.active,
                state.standby.is_some() && state.next_track.is_some(),
            )
        };
        let Some(active) = active else {
            return;
        };
        let pipeline = &self.unit(active).pipeline;
        if !pipeline.is_playing() {
            return;
        }

        let duration = pipeline.duration_ms();
        let position = pipeline.position_ms();
        if duration == 0 || position == 0 {
            return;
        }
        let remaining = duration.saturating_sub(position);
        if remaining == 0 || remaining > self.config().transition_threshold_ms {
            return;
        }
        if !next_ready {
            trace!("in transition window with nothing preloaded");
            return;
        }

        // One CAS claims the track boundary; the end-of-media fallback uses
        // the same flag, so exactly one of the two paths performs the swap.
        if self
            .transition_triggered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        debug!("transition window entered ({}ms remaining)", remaining);
        self.perform_handoff().await;
    }
}

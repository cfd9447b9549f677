//! Round driver task
//!
//! One task per round: `tick_count` shuffle ticks on an interval, the draw,
//! the settle beat, then the reveal. Every step goes through [`Shared`] and is
//! dropped if the round's generation is no longer current.

use std::sync::Arc;
use std::time::Duration;

use super::Shared;

/// Lower bound on the tick period; `tokio::time::interval` rejects zero
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

pub(super) async fn run_round(shared: Arc<Shared>, generation: u64) {
    let tick_count = shared.config.tick_count;
    let settle = shared.config.settle_duration;

    tracing::trace!(generation, tick_count, "Round driver started");

    if tick_count > 0 {
        let period = shared.config.tick_interval.max(MIN_TICK_INTERVAL);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // The first tick of an interval completes immediately
        interval.tick().await;

        for _ in 0..tick_count {
            interval.tick().await;
            if !shared.shuffle_tick(generation) {
                tracing::trace!(generation, "Round driver stopped during shuffle");
                return;
            }
        }
    }

    if !shared.begin_settle(generation) {
        return;
    }

    if !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }

    shared.finish_round(generation);
}

//! Reveal Events
//!
//! Everything the sequencer tells its host, as plain data. Hosts that prefer a
//! channel over callbacks receive these from
//! [`RevealSequencer::with_events`](crate::sequencer::RevealSequencer::with_events).

use serde::{Deserialize, Serialize};

use crate::lottery::RoundOutcome;
use crate::sequencer::RevealState;

/// One frame of the shuffle animation
///
/// Positions index into the candidate list passed to `start_round`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickFrame {
    /// Round the frame belongs to
    pub round_index: u64,
    /// 1-based tick number
    pub tick: u32,
    /// Ticks in a full shuffle
    pub total_ticks: u32,
    /// Permutation of candidate positions, in display order
    pub display_order: Vec<usize>,
    /// Candidate positions to highlight this frame (sorted)
    pub highlighted: Vec<usize>,
}

impl TickFrame {
    /// Fraction of the shuffle completed, in `0.0..=1.0`
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.total_ticks == 0 {
            return 1.0;
        }
        f64::from(self.tick) / f64::from(self.total_ticks)
    }

    /// Whether candidate position `index` is highlighted
    #[must_use]
    pub fn is_highlighted(&self, index: usize) -> bool {
        self.highlighted.binary_search(&index).is_ok()
    }
}

/// Events from the sequencer to its host
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RevealEvent {
    /// Shuffle tick
    Tick(TickFrame),

    /// Lifecycle transition
    StateChanged {
        /// Previous state
        from: RevealState,
        /// New state
        to: RevealState,
    },

    /// Winners revealed (exactly once per completed round)
    RoundComplete(RoundOutcome),
}

impl RevealEvent {
    /// Short event name for logging
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Tick(_) => "tick",
            Self::StateChanged { .. } => "state_changed",
            Self::RoundComplete(_) => "round_complete",
        }
    }
}

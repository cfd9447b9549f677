//! Host Integration
//!
//! The seam between the reveal core and whatever draws it: the
//! [`RevealObserver`] callbacks, a channel-backed observer, and the
//! [`PhotoWall`] view model that turns layout plus tick frames into tile
//! rectangles.
//!
//! Observer hooks run after the sequencer has released its state lock, so an
//! observer may query the sequencer or call `cancel`/`reset` from a hook.
//! Hooks still delay the next step of the round and should return quickly.

mod wall;

pub use wall::{PhotoWall, WallTile};

use tokio::sync::mpsc;

use crate::events::{RevealEvent, TickFrame};
use crate::lottery::{LotteryRound, RoundOutcome};
use crate::photo::PhotoEntry;
use crate::sequencer::RevealState;

/// Receives the sequencer's notifications
pub trait RevealObserver: Send + Sync {
    /// A shuffle tick was produced
    fn on_tick(&self, _frame: &TickFrame) {}

    /// The sequencer moved between states
    fn on_state_change(&self, _from: RevealState, _to: RevealState) {}

    /// Winners were revealed. Called exactly once per completed round and
    /// never for a cancelled one.
    fn on_round_complete(&self, round: &LotteryRound, winners: &[PhotoEntry]);
}

/// Observer that ignores everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl RevealObserver for NullObserver {
    fn on_round_complete(&self, _round: &LotteryRound, _winners: &[PhotoEntry]) {}
}

/// Observer that forwards every notification as a [`RevealEvent`]
#[derive(Clone, Debug)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<RevealEvent>,
}

impl ChannelObserver {
    /// Create the observer and the receiving end of its channel
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RevealEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: RevealEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Reveal event receiver dropped");
        }
    }
}

impl RevealObserver for ChannelObserver {
    fn on_tick(&self, frame: &TickFrame) {
        self.send(RevealEvent::Tick(frame.clone()));
    }

    fn on_state_change(&self, from: RevealState, to: RevealState) {
        self.send(RevealEvent::StateChanged { from, to });
    }

    fn on_round_complete(&self, round: &LotteryRound, winners: &[PhotoEntry]) {
        self.send(RevealEvent::RoundComplete(RoundOutcome {
            round: round.clone(),
            winners: winners.to_vec(),
        }));
    }
}

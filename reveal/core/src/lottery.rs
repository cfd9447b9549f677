//! Lottery Engine
//!
//! Fair winner selection without replacement. The engine is stateless: the
//! caller passes in the ids to exclude and keeps the [`WinnerLedger`] itself.
//!
//! Selection is a Fisher-Yates shuffle of the eligible pool stopped after `k`
//! swaps (`SliceRandom::partial_shuffle`), so every ordered `k`-subset is
//! equally likely and the draw always terminates in `k` steps.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{RevealError, Result};
use crate::photo::{PhotoEntry, PhotoId};

/// Candidates minus `excluded`, in input order, first occurrence of each id
#[must_use]
pub fn eligible_pool<'a>(
    candidates: &'a [PhotoEntry],
    excluded: &HashSet<PhotoId>,
) -> Vec<&'a PhotoEntry> {
    let mut seen: HashSet<PhotoId> = HashSet::with_capacity(candidates.len());
    candidates
        .iter()
        .filter(|entry| !excluded.contains(&entry.id))
        .filter(|entry| seen.insert(entry.id.clone()))
        .collect()
}

/// Draw up to `k` distinct winners uniformly at random.
///
/// Returns `min(k, |eligible pool|)` entries. A `k` larger than the pool is
/// clamped silently and an empty pool yields an empty vec; whether that ends
/// the session is the caller's decision.
pub fn draw_winners<R: Rng + ?Sized>(
    candidates: &[PhotoEntry],
    k: usize,
    excluded: &HashSet<PhotoId>,
    rng: &mut R,
) -> Vec<PhotoEntry> {
    let mut pool = eligible_pool(candidates, excluded);
    let take = k.min(pool.len());
    let (chosen, _) = pool.partial_shuffle(rng, take);
    chosen.iter().map(|entry| (*entry).clone()).collect()
}

/// Like [`draw_winners`] but an empty eligible pool is an error.
///
/// # Errors
///
/// Returns [`RevealError::EmptyPool`] if no candidate survives exclusion.
pub fn try_draw_winners<R: Rng + ?Sized>(
    candidates: &[PhotoEntry],
    k: usize,
    excluded: &HashSet<PhotoId>,
    rng: &mut R,
) -> Result<Vec<PhotoEntry>> {
    let winners = draw_winners(candidates, k, excluded, rng);
    if winners.is_empty() {
        return Err(RevealError::EmptyPool);
    }
    Ok(winners)
}

/// Record of one completed draw
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryRound {
    /// Zero-based index of the round within the session
    pub round_index: u64,
    /// Eligible pool ids (candidates minus exclusions), no duplicates
    pub candidates: Vec<PhotoId>,
    /// Winner count actually drawn (`requested` clamped to the pool size)
    pub k: usize,
    /// Winners in draw order
    pub winners: Vec<PhotoId>,
}

/// A round record together with the winning entries
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// The immutable round record
    pub round: LotteryRound,
    /// Winning entries, same order as `round.winners`
    pub winners: Vec<PhotoEntry>,
}

/// Draw a full round and package it as a [`RoundOutcome`]
pub fn draw_round<R: Rng + ?Sized>(
    round_index: u64,
    candidates: &[PhotoEntry],
    k: usize,
    excluded: &HashSet<PhotoId>,
    rng: &mut R,
) -> RoundOutcome {
    let pool: Vec<PhotoId> = eligible_pool(candidates, excluded)
        .into_iter()
        .map(|entry| entry.id.clone())
        .collect();
    let winners = draw_winners(candidates, k, excluded, rng);

    RoundOutcome {
        round: LotteryRound {
            round_index,
            k: k.min(pool.len()),
            candidates: pool,
            winners: winners.iter().map(|entry| entry.id.clone()).collect(),
        },
        winners,
    }
}

/// Cumulative set of ids that already won in this session
///
/// Append-only; only an explicit full reset clears it.
#[derive(Clone, Debug, Default)]
pub struct WinnerLedger {
    ids: HashSet<PhotoId>,
    order: Vec<PhotoId>,
}

impl WinnerLedger {
    /// Create an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record winners, ignoring ids already present
    pub fn extend<'a>(&mut self, winners: impl IntoIterator<Item = &'a PhotoId>) {
        for id in winners {
            if self.ids.insert(id.clone()) {
                self.order.push(id.clone());
            }
        }
    }

    /// Whether `id` has already won
    #[must_use]
    pub fn contains(&self, id: &PhotoId) -> bool {
        self.ids.contains(id)
    }

    /// The id set, suitable as the `excluded` argument of a draw
    #[must_use]
    pub fn ids(&self) -> &HashSet<PhotoId> {
        &self.ids
    }

    /// Winners in the order they were recorded
    #[must_use]
    pub fn in_order(&self) -> &[PhotoId] {
        &self.order
    }

    /// Number of recorded winners
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no winner has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Forget every winner
    pub fn clear(&mut self) {
        self.ids.clear();
        self.order.clear();
    }
}

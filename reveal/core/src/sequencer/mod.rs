//! Reveal Sequencer - the lottery round state machine
//!
//! ```text
//!          start_round                ticks done               settle done
//!   Idle ─────────────▶ Shuffling ───────────────▶ Settling ───────────────▶ Revealed
//!    ▲                    │  (draw winners)          │                         │
//!    │       cancel       │                          │                         │
//!    ├────────────────────┴──────────────────────────┘                         │
//!    │                                   reset                                 │
//!    └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sequencer owns every timer of a round. One driver task per round runs
//! on the ambient tokio runtime; it performs each step under the state lock
//! after checking that its round generation is still current.
//!
//! Observer callbacks never run under the state lock. Each step queues its
//! notifications, releases the state, then delivers them while holding a
//! separate reentrant delivery lock. `cancel()` takes the delivery lock before
//! bumping the generation, so once it returns no tick or completion of the
//! cancelled round can reach the observer. Callbacks may read the sequencer
//! and may call `cancel`, `reset` or `start_round`; notices raised from inside
//! a callback are delivered after it returns, in commit order.
//!
//! `start_round` while a round is in flight is rejected, never queued or
//! restarted.

mod driver;

use std::cell::Cell;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{RevealError, Result};
use crate::events::{RevealEvent, TickFrame};
use crate::host::{ChannelObserver, RevealObserver};
use crate::lottery::{draw_round, eligible_pool, RoundOutcome, WinnerLedger};
use crate::photo::{PhotoEntry, PhotoId};

/// Offset mixed into the seed of the draw RNG so that the cosmetic display
/// shuffle and the winner draw never share a stream
const DRAW_STREAM_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Lifecycle state of the sequencer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevealState {
    /// No round in progress
    #[default]
    Idle,
    /// Display order is being cycled
    Shuffling,
    /// Winners drawn, waiting out the settle beat
    Settling,
    /// Winners announced, waiting for the host to reset
    Revealed,
}

impl RevealState {
    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Shuffling => "shuffling",
            Self::Settling => "settling",
            Self::Revealed => "revealed",
        }
    }

    /// Whether a round is in flight (timers pending)
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Shuffling | Self::Settling)
    }
}

impl std::fmt::Display for RevealState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-round options supplied by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOptions {
    /// Number of winners requested (clamped to the eligible pool)
    pub winners: usize,
    /// Skip ids that won earlier rounds of this session
    pub exclude_prior_winners: bool,
}

impl Default for RoundOptions {
    fn default() -> Self {
        Self {
            winners: 1,
            exclude_prior_winners: false,
        }
    }
}

impl RoundOptions {
    /// Options for `winners` winners without exclusion
    #[must_use]
    pub fn new(winners: usize) -> Self {
        Self {
            winners,
            ..Self::default()
        }
    }

    /// Enable or disable exclusion of prior winners
    #[must_use]
    pub fn excluding_prior_winners(mut self, exclude: bool) -> Self {
        self.exclude_prior_winners = exclude;
        self
    }
}

/// Timing and randomness settings of the sequencer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequencerConfig {
    /// Time between shuffle ticks (default: 100 ms)
    pub tick_interval: Duration,
    /// Number of shuffle ticks per round (default: 20)
    pub tick_count: u32,
    /// Length of the settle beat (default: 400 ms, zero skips it)
    pub settle_duration: Duration,
    /// Positions highlighted per tick (default: 3)
    pub highlight_count: usize,
    /// Fixed RNG seed for reproducible sessions (default: entropy)
    pub seed: Option<u64>,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            tick_count: 20,
            settle_duration: Duration::from_millis(400),
            highlight_count: 3,
            seed: None,
        }
    }
}

impl SequencerConfig {
    /// Create a config with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tick interval
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the number of shuffle ticks
    #[must_use]
    pub fn with_tick_count(mut self, count: u32) -> Self {
        self.tick_count = count;
        self
    }

    /// Set the settle duration
    #[must_use]
    pub fn with_settle_duration(mut self, duration: Duration) -> Self {
        self.settle_duration = duration;
        self
    }

    /// Set the number of highlighted positions per tick
    #[must_use]
    pub fn with_highlight_count(mut self, count: usize) -> Self {
        self.highlight_count = count;
        self
    }

    /// Fix the RNG seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Short, seeded timings for tests
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            tick_interval: Duration::from_millis(10),
            tick_count: 5,
            settle_duration: Duration::from_millis(20),
            highlight_count: 2,
            seed: Some(7),
        }
    }

    /// Total time from `start_round` to the reveal
    #[must_use]
    pub fn round_duration(&self) -> Duration {
        self.tick_interval * self.tick_count + self.settle_duration
    }
}

/// The round currently in flight
struct ActiveRound {
    candidates: Vec<PhotoEntry>,
    options: RoundOptions,
    round_index: u64,
    tick: u32,
    display_order: Vec<usize>,
    outcome: Option<RoundOutcome>,
}

/// Observer notification queued under the state lock
enum Notice {
    StateChanged { from: RevealState, to: RevealState },
    Tick(TickFrame),
    RoundComplete(RoundOutcome),
}

struct Inner {
    state: RevealState,
    /// Bumped on every start and cancel; stale driver steps compare against it
    generation: u64,
    completed_rounds: u64,
    ledger: WinnerLedger,
    /// Exclusion mode of the most recent round
    session_excludes: bool,
    active: Option<ActiveRound>,
    last_round: Option<RoundOutcome>,
    display_rng: StdRng,
    draw_rng: StdRng,
    task: Option<JoinHandle<()>>,
    /// Notifications not yet handed to the observer, in commit order
    pending: VecDeque<Notice>,
}

pub(crate) struct Shared {
    config: SequencerConfig,
    observer: Arc<dyn RevealObserver>,
    inner: Mutex<Inner>,
    /// Held across a whole step and its delivery. The flag is set while a
    /// drain is running on the owning thread.
    delivery: ReentrantMutex<Cell<bool>>,
}

/// Clears the draining flag even if an observer panics
struct Draining<'a>(&'a Cell<bool>);

impl Drop for Draining<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Drives lottery rounds and notifies a [`RevealObserver`]
///
/// Cheap to clone; all clones control the same sequencer.
#[derive(Clone)]
pub struct RevealSequencer {
    shared: Arc<Shared>,
}

impl RevealSequencer {
    /// Create a sequencer reporting to `observer`
    #[must_use]
    pub fn new(config: SequencerConfig, observer: Arc<dyn RevealObserver>) -> Self {
        let (display_rng, draw_rng) = match config.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed ^ DRAW_STREAM_SALT),
            ),
            None => (StdRng::from_entropy(), StdRng::from_entropy()),
        };

        Self {
            shared: Arc::new(Shared {
                config,
                observer,
                inner: Mutex::new(Inner {
                    state: RevealState::Idle,
                    generation: 0,
                    completed_rounds: 0,
                    ledger: WinnerLedger::new(),
                    session_excludes: false,
                    active: None,
                    last_round: None,
                    display_rng,
                    draw_rng,
                    task: None,
                    pending: VecDeque::new(),
                }),
                delivery: ReentrantMutex::new(Cell::new(false)),
            }),
        }
    }

    /// Create a sequencer that forwards every event to a channel
    #[must_use]
    pub fn with_events(config: SequencerConfig) -> (Self, mpsc::UnboundedReceiver<RevealEvent>) {
        let (observer, rx) = ChannelObserver::new();
        (Self::new(config, Arc::new(observer)), rx)
    }

    /// Get the sequencer configuration
    #[must_use]
    pub fn config(&self) -> &SequencerConfig {
        &self.shared.config
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> RevealState {
        self.shared.inner.lock().state
    }

    /// Rounds revealed since the session started
    #[must_use]
    pub fn completed_rounds(&self) -> u64 {
        self.shared.inner.lock().completed_rounds
    }

    /// Outcome of the most recently revealed round
    #[must_use]
    pub fn last_round(&self) -> Option<RoundOutcome> {
        self.shared.inner.lock().last_round.clone()
    }

    /// Ids excluded from future rounds, in the order they won
    #[must_use]
    pub fn excluded_ids(&self) -> Vec<PhotoId> {
        self.shared.inner.lock().ledger.in_order().to_vec()
    }

    /// Start a round over `candidates`.
    ///
    /// Returns the index the round will carry once revealed. Must be called
    /// from within a tokio runtime; the round's timers run on it.
    ///
    /// # Errors
    ///
    /// - [`RevealError::InvalidState`] unless the sequencer is idle
    /// - [`RevealError::EmptyPool`] if `candidates` is empty, or nothing is
    ///   left after excluding prior winners
    /// - [`RevealError::Configuration`] if zero winners are requested
    /// - [`RevealError::NoRuntime`] outside a tokio runtime
    ///
    /// On error the sequencer is left untouched.
    pub fn start_round(&self, candidates: Vec<PhotoEntry>, options: RoundOptions) -> Result<u64> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| RevealError::NoRuntime)?;

        self.shared.with_delivery(|inner| {
            if inner.state != RevealState::Idle {
                tracing::warn!(state = %inner.state, "Rejected start_round: round not idle");
                return Err(RevealError::InvalidState {
                    operation: "start round",
                    state: inner.state,
                });
            }
            if options.winners == 0 {
                return Err(RevealError::configuration("winner count must be at least 1"));
            }
            if candidates.is_empty() {
                return Err(RevealError::EmptyPool);
            }
            if options.exclude_prior_winners
                && eligible_pool(&candidates, inner.ledger.ids()).is_empty()
            {
                tracing::warn!(
                    candidates = candidates.len(),
                    excluded = inner.ledger.len(),
                    "Rejected start_round: every candidate already won"
                );
                return Err(RevealError::EmptyPool);
            }

            inner.generation += 1;
            let generation = inner.generation;
            let round_index = inner.completed_rounds;

            tracing::debug!(
                round_index,
                candidates = candidates.len(),
                winners = options.winners,
                exclude_prior_winners = options.exclude_prior_winners,
                "Starting reveal round"
            );

            inner.active = Some(ActiveRound {
                display_order: (0..candidates.len()).collect(),
                candidates,
                options,
                round_index,
                tick: 0,
                outcome: None,
            });
            Shared::transition(inner, RevealState::Shuffling);

            // The driver's first step waits on the delivery lock held here,
            // so the Shuffling notice always precedes its first tick
            let task = runtime.spawn(driver::run_round(Arc::clone(&self.shared), generation));
            inner.task = Some(task);

            Ok(round_index)
        })
    }

    /// Abort the round in flight without revealing it.
    ///
    /// No-op unless shuffling or settling; safe to call repeatedly, including
    /// from inside an observer callback. Once it returns, no tick or
    /// completion of the cancelled round reaches the observer.
    pub fn cancel(&self) {
        self.shared.with_delivery(|inner| {
            if !inner.state.is_active() {
                return;
            }
            Shared::abort_round(inner);
            tracing::info!("Reveal round cancelled");
            Shared::transition(inner, RevealState::Idle);
        });
    }

    /// Dismiss a revealed round and return to idle.
    ///
    /// Prior winners are forgotten unless the round ran with
    /// `exclude_prior_winners`. No-op when already idle.
    ///
    /// # Errors
    ///
    /// Returns [`RevealError::InvalidState`] while a round is in flight; use
    /// [`cancel`](Self::cancel) instead.
    pub fn reset(&self) -> Result<()> {
        self.shared.with_delivery(|inner| {
            let state = inner.state;
            match state {
                RevealState::Idle => Ok(()),
                RevealState::Revealed => {
                    if !inner.session_excludes {
                        inner.ledger.clear();
                    }
                    Shared::transition(inner, RevealState::Idle);
                    Ok(())
                }
                RevealState::Shuffling | RevealState::Settling => {
                    tracing::warn!(state = %state, "Rejected reset: round in flight");
                    Err(RevealError::InvalidState {
                        operation: "reset",
                        state,
                    })
                }
            }
        })
    }

    /// Full host reset: cancel anything in flight and forget every winner
    pub fn reset_session(&self) {
        self.shared.with_delivery(|inner| {
            if inner.state.is_active() {
                Shared::abort_round(inner);
            }
            inner.ledger.clear();
            inner.session_excludes = false;
            inner.completed_rounds = 0;
            inner.last_round = None;
            if inner.state != RevealState::Idle {
                Shared::transition(inner, RevealState::Idle);
            }
            tracing::info!("Reveal session reset");
        });
    }
}

impl std::fmt::Debug for RevealSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("RevealSequencer")
            .field("config", &self.shared.config)
            .field("state", &inner.state)
            .field("completed_rounds", &inner.completed_rounds)
            .field("excluded", &inner.ledger.len())
            .finish()
    }
}

impl Shared {
    /// Run `step` under the state lock, then hand its notifications to the
    /// observer with the state lock released.
    ///
    /// The delivery lock is taken first and held until the queue is empty,
    /// so a `cancel()` on another thread waits out any delivery in progress.
    /// A nested call from inside a callback only queues; the outer drain
    /// delivers its notices after the current callback returns.
    fn with_delivery<T>(&self, step: impl FnOnce(&mut Inner) -> T) -> T {
        let delivery = self.delivery.lock();
        let mut inner = self.inner.lock();
        let result = step(&mut *inner);
        drop(inner);
        self.drain(&delivery);
        result
    }

    fn drain(&self, draining: &Cell<bool>) {
        if draining.replace(true) {
            return;
        }
        let _draining = Draining(draining);

        loop {
            // The state guard must not outlive this statement
            let next = self.inner.lock().pending.pop_front();
            let Some(notice) = next else {
                break;
            };
            match notice {
                Notice::StateChanged { from, to } => self.observer.on_state_change(from, to),
                Notice::Tick(frame) => self.observer.on_tick(&frame),
                Notice::RoundComplete(outcome) => {
                    self.observer.on_round_complete(&outcome.round, &outcome.winners);
                }
            }
        }
    }

    fn transition(inner: &mut Inner, to: RevealState) {
        let from = inner.state;
        inner.state = to;
        tracing::debug!(from = %from, to = %to, "Reveal state changed");
        inner.pending.push_back(Notice::StateChanged { from, to });
    }

    /// Revoke the pending timers and discard partial results
    fn abort_round(inner: &mut Inner) {
        if let Some(task) = inner.task.take() {
            task.abort();
        }
        inner.generation += 1;
        inner.active = None;
    }

    /// One shuffle tick. Returns false if the round is gone.
    pub(crate) fn shuffle_tick(&self, generation: u64) -> bool {
        self.with_delivery(|inner| {
            if inner.generation != generation || inner.state != RevealState::Shuffling {
                return false;
            }
            let Some(active) = inner.active.as_mut() else {
                return false;
            };

            active.tick += 1;
            active.display_order.shuffle(&mut inner.display_rng);

            let slots = active.display_order.len();
            let mut highlighted = rand::seq::index::sample(
                &mut inner.display_rng,
                slots,
                self.config.highlight_count.min(slots),
            )
            .into_vec();
            highlighted.sort_unstable();

            let frame = TickFrame {
                round_index: active.round_index,
                tick: active.tick,
                total_ticks: self.config.tick_count,
                display_order: active.display_order.clone(),
                highlighted,
            };
            tracing::trace!(tick = frame.tick, total = frame.total_ticks, "Shuffle tick");
            inner.pending.push_back(Notice::Tick(frame));
            true
        })
    }

    /// Draw the winners and enter the settle beat
    pub(crate) fn begin_settle(&self, generation: u64) -> bool {
        self.with_delivery(|inner| {
            if inner.generation != generation || inner.state != RevealState::Shuffling {
                return false;
            }
            let Some(active) = inner.active.as_mut() else {
                return false;
            };

            let no_exclusions = HashSet::new();
            let excluded = if active.options.exclude_prior_winners {
                inner.ledger.ids()
            } else {
                &no_exclusions
            };
            let outcome = draw_round(
                active.round_index,
                &active.candidates,
                active.options.winners,
                excluded,
                &mut inner.draw_rng,
            );
            tracing::debug!(
                round_index = active.round_index,
                eligible = outcome.round.candidates.len(),
                winners = outcome.winners.len(),
                "Winners drawn"
            );
            active.outcome = Some(outcome);

            Shared::transition(inner, RevealState::Settling);
            true
        })
    }

    /// Publish the winners and notify the observer (exactly once per round)
    pub(crate) fn finish_round(&self, generation: u64) {
        self.with_delivery(|inner| {
            if inner.generation != generation || inner.state != RevealState::Settling {
                return;
            }
            let Some(outcome) = inner.active.take().and_then(|mut active| {
                inner.session_excludes = active.options.exclude_prior_winners;
                active.outcome.take()
            }) else {
                return;
            };

            if inner.session_excludes {
                inner.ledger.extend(&outcome.round.winners);
            }
            inner.completed_rounds += 1;
            inner.task = None;
            inner.last_round = Some(outcome.clone());

            Shared::transition(inner, RevealState::Revealed);

            tracing::info!(
                round_index = outcome.round.round_index,
                winners = ?outcome.round.winners,
                "Round revealed"
            );
            inner.pending.push_back(Notice::RoundComplete(outcome));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::lottery::LotteryRound;

    fn photos(n: usize) -> Vec<PhotoEntry> {
        (0..n)
            .map(|i| {
                PhotoEntry::new(
                    PhotoId::new(format!("p{i}")),
                    format!("/{i}.jpg"),
                    format!("{i}.jpg"),
                )
            })
            .collect()
    }

    /// Drain events until the round completes, returning everything seen
    async fn run_to_completion(rx: &mut mpsc::UnboundedReceiver<RevealEvent>) -> Vec<RevealEvent> {
        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            let done = matches!(event, RevealEvent::RoundComplete(_));
            seen.push(event);
            if done {
                break;
            }
        }
        seen
    }

    #[derive(Default)]
    struct CountingObserver {
        ticks: AtomicUsize,
        completions: AtomicUsize,
    }

    impl RevealObserver for CountingObserver {
        fn on_tick(&self, _frame: &TickFrame) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }

        fn on_round_complete(&self, _round: &LotteryRound, _winners: &[PhotoEntry]) {
            self.completions.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Observer that calls back into the sequencer from every hook
    #[derive(Default)]
    struct ReentrantObserver {
        sequencer: std::sync::OnceLock<RevealSequencer>,
        cancel_at_tick: Option<u32>,
        reset_on_complete: bool,
        log: Mutex<Vec<String>>,
    }

    impl ReentrantObserver {
        fn attach(self, config: SequencerConfig) -> (Arc<Self>, RevealSequencer) {
            let observer = Arc::new(self);
            let sequencer = RevealSequencer::new(config, observer.clone());
            let _ = observer.sequencer.set(sequencer.clone());
            (observer, sequencer)
        }

        fn current(&self) -> RevealState {
            self.sequencer
                .get()
                .map_or(RevealState::Idle, RevealSequencer::state)
        }

        fn record(&self, entry: String) {
            self.log.lock().push(entry);
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().clone()
        }
    }

    impl RevealObserver for ReentrantObserver {
        fn on_tick(&self, frame: &TickFrame) {
            self.record(format!("tick {} {}", frame.tick, self.current()));
            if self.cancel_at_tick == Some(frame.tick) {
                if let Some(sequencer) = self.sequencer.get() {
                    sequencer.cancel();
                }
            }
        }

        fn on_state_change(&self, from: RevealState, to: RevealState) {
            self.record(format!("{from}->{to} {}", self.current()));
        }

        fn on_round_complete(&self, round: &LotteryRound, _winners: &[PhotoEntry]) {
            self.record(format!("complete {} {}", round.round_index, self.current()));
            if self.reset_on_complete {
                if let Some(sequencer) = self.sequencer.get() {
                    sequencer.reset().unwrap();
                }
            }
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = SequencerConfig::default();
        assert_eq!(config.tick_interval, Duration::from_millis(100));
        assert_eq!(config.tick_count, 20);
        assert_eq!(config.settle_duration, Duration::from_millis(400));
        assert_eq!(config.round_duration(), Duration::from_millis(2400));
    }

    #[test]
    fn test_start_outside_runtime() {
        let (sequencer, _rx) = RevealSequencer::with_events(SequencerConfig::for_testing());
        let result = sequencer.start_round(photos(3), RoundOptions::new(1));
        assert_eq!(result, Err(RevealError::NoRuntime));
        assert_eq!(sequencer.state(), RevealState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_round_event_order() {
        let config = SequencerConfig::for_testing();
        let (sequencer, mut rx) = RevealSequencer::with_events(config.clone());

        assert_eq!(sequencer.start_round(photos(6), RoundOptions::new(2)), Ok(0));
        let events = run_to_completion(&mut rx).await;

        let transitions: Vec<(RevealState, RevealState)> = events
            .iter()
            .filter_map(|e| match e {
                RevealEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect();
        assert_eq!(
            transitions,
            vec![
                (RevealState::Idle, RevealState::Shuffling),
                (RevealState::Shuffling, RevealState::Settling),
                (RevealState::Settling, RevealState::Revealed),
            ]
        );

        let ticks: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                RevealEvent::Tick(frame) => Some(frame.tick),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, (1..=config.tick_count).collect::<Vec<_>>());

        let Some(RevealEvent::RoundComplete(outcome)) = events.last() else {
            panic!("round did not complete");
        };
        assert_eq!(outcome.winners.len(), 2);
        assert_eq!(sequencer.state(), RevealState::Revealed);
        assert_eq!(sequencer.completed_rounds(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_frames_are_permutations() {
        let (sequencer, mut rx) = RevealSequencer::with_events(SequencerConfig::for_testing());
        sequencer.start_round(photos(8), RoundOptions::new(1)).unwrap();

        for event in run_to_completion(&mut rx).await {
            if let RevealEvent::Tick(frame) = event {
                let mut order = frame.display_order.clone();
                order.sort_unstable();
                assert_eq!(order, (0..8).collect::<Vec<_>>());
                assert_eq!(frame.highlighted.len(), 2);
                assert!(frame.highlighted.iter().all(|&i| i < 8));
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_takes_configured_time() {
        let config = SequencerConfig::default();
        let (sequencer, mut rx) = RevealSequencer::with_events(config.clone());

        let started = tokio::time::Instant::now();
        sequencer.start_round(photos(4), RoundOptions::new(1)).unwrap();
        run_to_completion(&mut rx).await;
        let elapsed = started.elapsed();

        assert!(elapsed >= config.round_duration(), "finished early: {elapsed:?}");
        assert!(elapsed < config.round_duration() + Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_shuffling_is_rejected() {
        let (sequencer, mut rx) = RevealSequencer::with_events(SequencerConfig::for_testing());
        sequencer.start_round(photos(3), RoundOptions::new(1)).unwrap();
        assert!(matches!(rx.recv().await, Some(RevealEvent::StateChanged { .. })));

        let result = sequencer.start_round(photos(5), RoundOptions::new(1));
        assert_eq!(
            result,
            Err(RevealError::InvalidState {
                operation: "start round",
                state: RevealState::Shuffling,
            })
        );
        assert_eq!(sequencer.state(), RevealState::Shuffling);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_validation() {
        let (sequencer, mut rx) = RevealSequencer::with_events(SequencerConfig::for_testing());

        let err = tokio_test::assert_err!(sequencer.start_round(Vec::new(), RoundOptions::new(1)));
        assert_eq!(err, RevealError::EmptyPool);
        assert!(matches!(
            sequencer.start_round(photos(2), RoundOptions::new(0)),
            Err(RevealError::Configuration(_))
        ));
        assert_eq!(sequencer.state(), RevealState::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks_and_completion() {
        let (sequencer, mut rx) = RevealSequencer::with_events(SequencerConfig::for_testing());
        sequencer.start_round(photos(4), RoundOptions::new(1)).unwrap();

        // Wait for the first tick, then cancel mid-shuffle
        loop {
            match rx.recv().await {
                Some(RevealEvent::Tick(_)) => break,
                Some(_) => {}
                None => panic!("channel closed"),
            }
        }
        sequencer.cancel();

        assert!(matches!(
            rx.recv().await,
            Some(RevealEvent::StateChanged {
                from: RevealState::Shuffling,
                to: RevealState::Idle
            })
        ));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err(), "event delivered after cancel");
        assert_eq!(sequencer.state(), RevealState::Idle);
        assert!(sequencer.last_round().is_none());
        assert_eq!(sequencer.completed_rounds(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_settle() {
        let config = SequencerConfig::for_testing().with_settle_duration(Duration::from_secs(1));
        let (sequencer, mut rx) = RevealSequencer::with_events(config);
        sequencer.start_round(photos(4), RoundOptions::new(1)).unwrap();

        loop {
            if let Some(RevealEvent::StateChanged {
                to: RevealState::Settling,
                ..
            }) = rx.recv().await
            {
                break;
            }
        }
        sequencer.cancel();
        sequencer.cancel();

        tokio::time::sleep(Duration::from_secs(5)).await;
        let mut late = Vec::new();
        while let Ok(event) = rx.try_recv() {
            late.push(event);
        }
        assert_eq!(late.len(), 1, "only the cancel transition: {late:?}");
        assert_eq!(sequencer.state(), RevealState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_when_idle_is_noop() {
        let (sequencer, mut rx) = RevealSequencer::with_events(SequencerConfig::for_testing());
        sequencer.cancel();
        sequencer.cancel();
        tokio_test::assert_ok!(sequencer.reset());
        assert_eq!(sequencer.state(), RevealState::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_fires_once_per_round() {
        let observer = Arc::new(CountingObserver::default());
        let config = SequencerConfig::for_testing();
        let sequencer = RevealSequencer::new(config.clone(), observer.clone());

        for round in 0..3u64 {
            assert_eq!(sequencer.start_round(photos(5), RoundOptions::new(1)), Ok(round));
            tokio::time::sleep(config.round_duration() * 3).await;
            assert_eq!(sequencer.state(), RevealState::Revealed);
            sequencer.reset().unwrap();
        }

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(observer.completions.load(Ordering::SeqCst), 3);
        assert_eq!(
            observer.ticks.load(Ordering::SeqCst),
            3 * config.tick_count as usize
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ticks_and_zero_settle() {
        let config = SequencerConfig::for_testing()
            .with_tick_count(0)
            .with_settle_duration(Duration::ZERO);
        let (sequencer, mut rx) = RevealSequencer::with_events(config);
        sequencer.start_round(photos(3), RoundOptions::new(3)).unwrap();

        let events = run_to_completion(&mut rx).await;
        assert!(!events.iter().any(|e| matches!(e, RevealEvent::Tick(_))));
        assert!(events.iter().any(|e| matches!(
            e,
            RevealEvent::StateChanged {
                to: RevealState::Settling,
                ..
            }
        )));
        assert_eq!(sequencer.last_round().unwrap().winners.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exclusion_across_rounds() {
        let (sequencer, mut rx) = RevealSequencer::with_events(SequencerConfig::for_testing());
        let options = RoundOptions::new(2).excluding_prior_winners(true);

        sequencer.start_round(photos(5), options).unwrap();
        run_to_completion(&mut rx).await;
        let first = sequencer.last_round().unwrap();
        sequencer.reset().unwrap();
        assert_eq!(sequencer.excluded_ids().len(), 2);

        sequencer.start_round(photos(5), options).unwrap();
        run_to_completion(&mut rx).await;
        let second = sequencer.last_round().unwrap();

        assert_eq!(second.round.candidates.len(), 3);
        assert_eq!(second.round.round_index, 1);
        for id in &second.round.winners {
            assert!(!first.round.winners.contains(id));
        }
        assert_eq!(sequencer.excluded_ids().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_ledger_without_exclusion() {
        let (sequencer, mut rx) = RevealSequencer::with_events(SequencerConfig::for_testing());

        sequencer
            .start_round(photos(5), RoundOptions::new(2).excluding_prior_winners(true))
            .unwrap();
        run_to_completion(&mut rx).await;
        sequencer.reset().unwrap();
        assert_eq!(sequencer.excluded_ids().len(), 2);

        // A round without exclusion draws from everyone and ends the carry-over
        sequencer.start_round(photos(5), RoundOptions::new(1)).unwrap();
        run_to_completion(&mut rx).await;
        assert_eq!(sequencer.last_round().unwrap().round.candidates.len(), 5);
        sequencer.reset().unwrap();
        assert!(sequencer.excluded_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_pool_is_rejected() {
        let (sequencer, mut rx) = RevealSequencer::with_events(SequencerConfig::for_testing());
        let options = RoundOptions::new(5).excluding_prior_winners(true);

        sequencer.start_round(photos(3), options).unwrap();
        run_to_completion(&mut rx).await;
        sequencer.reset().unwrap();

        assert_eq!(sequencer.start_round(photos(3), options), Err(RevealError::EmptyPool));
        assert_eq!(sequencer.state(), RevealState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_while_shuffling_is_rejected() {
        let (sequencer, _rx) = RevealSequencer::with_events(SequencerConfig::for_testing());
        sequencer.start_round(photos(3), RoundOptions::new(1)).unwrap();

        assert!(matches!(
            sequencer.reset(),
            Err(RevealError::InvalidState {
                operation: "reset",
                ..
            })
        ));
        assert_eq!(sequencer.state(), RevealState::Shuffling);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_session_forgets_everything() {
        let (sequencer, mut rx) = RevealSequencer::with_events(SequencerConfig::for_testing());
        sequencer
            .start_round(photos(4), RoundOptions::new(1).excluding_prior_winners(true))
            .unwrap();
        run_to_completion(&mut rx).await;

        sequencer.reset_session();
        assert_eq!(sequencer.state(), RevealState::Idle);
        assert!(sequencer.excluded_ids().is_empty());
        assert!(sequencer.last_round().is_none());
        assert_eq!(sequencer.completed_rounds(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seeded_sessions_are_reproducible() {
        let config = SequencerConfig::for_testing().with_seed(1234);
        let mut winners = Vec::new();

        for _ in 0..2 {
            let (sequencer, mut rx) = RevealSequencer::with_events(config.clone());
            sequencer.start_round(photos(10), RoundOptions::new(3)).unwrap();
            run_to_completion(&mut rx).await;
            winners.push(sequencer.last_round().unwrap().round.winners);
        }
        assert_eq!(winners[0], winners[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_can_read_state_from_callbacks() {
        let config = SequencerConfig::for_testing();
        let (observer, sequencer) = ReentrantObserver::default().attach(config.clone());

        sequencer.start_round(photos(3), RoundOptions::new(1)).unwrap();
        tokio::time::sleep(config.round_duration() * 3).await;

        assert_eq!(
            observer.log(),
            vec![
                "idle->shuffling shuffling",
                "tick 1 shuffling",
                "tick 2 shuffling",
                "tick 3 shuffling",
                "tick 4 shuffling",
                "tick 5 shuffling",
                "shuffling->settling settling",
                "settling->revealed revealed",
                "complete 0 revealed",
            ]
        );
        assert_eq!(sequencer.state(), RevealState::Revealed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_can_cancel_from_tick() {
        let config = SequencerConfig::for_testing();
        let (observer, sequencer) = ReentrantObserver {
            cancel_at_tick: Some(2),
            ..ReentrantObserver::default()
        }
        .attach(config.clone());

        sequencer.start_round(photos(4), RoundOptions::new(1)).unwrap();
        tokio::time::sleep(config.round_duration() * 3).await;

        assert_eq!(
            observer.log(),
            vec![
                "idle->shuffling shuffling",
                "tick 1 shuffling",
                "tick 2 shuffling",
                "shuffling->idle idle",
            ]
        );
        assert_eq!(sequencer.state(), RevealState::Idle);
        assert_eq!(sequencer.completed_rounds(), 0);
        assert!(sequencer.last_round().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_can_reset_from_completion() {
        let config = SequencerConfig::for_testing().with_tick_count(1);
        let (observer, sequencer) = ReentrantObserver {
            reset_on_complete: true,
            ..ReentrantObserver::default()
        }
        .attach(config.clone());

        sequencer.start_round(photos(4), RoundOptions::new(1)).unwrap();
        tokio::time::sleep(config.round_duration() * 3).await;

        let log = observer.log();
        assert_eq!(
            &log[log.len() - 3..],
            [
                "settling->revealed revealed",
                "complete 0 revealed",
                "revealed->idle idle",
            ]
        );
        assert_eq!(sequencer.state(), RevealState::Idle);
        assert_eq!(sequencer.start_round(photos(4), RoundOptions::new(1)), Ok(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reentrant_observer_does_not_stall_runtime() {
        let config = SequencerConfig::for_testing();
        let (observer, sequencer) = ReentrantObserver::default().attach(config.clone());

        sequencer.start_round(photos(3), RoundOptions::new(1)).unwrap();
        let revealed = tokio::time::timeout(Duration::from_secs(5), async {
            while observer.log().last().map(String::as_str) != Some("complete 0 revealed") {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;

        assert!(revealed.is_ok(), "round never revealed");
        assert_eq!(sequencer.state(), RevealState::Revealed);
    }
}

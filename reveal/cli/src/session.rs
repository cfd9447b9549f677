//! Headless reveal session
//!
//! Runs rounds back to back over one photo set: start, follow the event
//! stream into the wall, announce the winners, reset, repeat.

use std::future::Future;
use std::io::Write;

use anyhow::{bail, Result};
use tokio::sync::mpsc;

use reveal_core::{
    PhotoEntry, PhotoWall, RevealError, RevealEvent, RevealSequencer, RoundOptions, RoundOutcome,
};

use crate::report;

/// How events are printed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    /// Grid and banners for humans
    Text,
    /// One JSON object per event
    Json,
}

/// Why a session stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// Every requested round was revealed
    Completed,
    /// Exclusion left nobody to draw
    PoolExhausted,
    /// Interrupted; the round in flight was cancelled
    Interrupted,
}

/// Drives a sequencer through a number of rounds
pub struct RevealSession<W: Write> {
    sequencer: RevealSequencer,
    events: mpsc::UnboundedReceiver<RevealEvent>,
    wall: PhotoWall,
    options: RoundOptions,
    mode: OutputMode,
    out: W,
    outcomes: Vec<RoundOutcome>,
}

impl<W: Write> RevealSession<W> {
    /// Create a session over the photos already loaded into `wall`
    pub fn new(
        sequencer: RevealSequencer,
        events: mpsc::UnboundedReceiver<RevealEvent>,
        wall: PhotoWall,
        options: RoundOptions,
        mode: OutputMode,
        out: W,
    ) -> Self {
        Self {
            sequencer,
            events,
            wall,
            options,
            mode,
            out,
            outcomes: Vec::new(),
        }
    }

    /// Revealed rounds so far
    pub fn outcomes(&self) -> &[RoundOutcome] {
        &self.outcomes
    }

    /// Consume the session, returning the writer
    pub fn into_output(self) -> W {
        self.out
    }

    /// Run up to `rounds` rounds, stopping early when `shutdown` resolves
    pub async fn run(
        &mut self,
        rounds: u32,
        shutdown: impl Future<Output = ()>,
    ) -> Result<SessionEnd> {
        tokio::pin!(shutdown);
        let photos: Vec<PhotoEntry> = self.wall.photos().to_vec();

        for round in 0..rounds {
            match self.sequencer.start_round(photos.clone(), self.options) {
                Ok(index) => tracing::debug!(round, index, "Round started"),
                Err(RevealError::EmptyPool) if round > 0 => {
                    tracing::info!(round, "Every photo has already won, stopping");
                    if self.mode == OutputMode::Text {
                        writeln!(self.out, "Everyone has already won. Session over.")?;
                    }
                    return Ok(SessionEnd::PoolExhausted);
                }
                Err(e) => return Err(e.into()),
            }

            loop {
                tokio::select! {
                    event = self.events.recv() => {
                        let Some(event) = event else {
                            bail!("Reveal event channel closed mid-round");
                        };
                        if self.handle_event(&event)? {
                            break;
                        }
                    }
                    () = &mut shutdown => {
                        self.sequencer.cancel();
                        self.flush_events()?;
                        tracing::warn!(round, "Interrupted, round cancelled");
                        return Ok(SessionEnd::Interrupted);
                    }
                }
            }

            self.sequencer.reset()?;
            self.flush_events()?;
            self.wall.clear_marks();
        }

        Ok(SessionEnd::Completed)
    }

    /// Handle events already delivered, such as the transition back to idle
    /// that `reset` and `cancel` emit synchronously
    fn flush_events(&mut self) -> Result<()> {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(&event)?;
        }
        Ok(())
    }

    /// Fold one event into the wall and print it. Returns true once the round
    /// is revealed.
    fn handle_event(&mut self, event: &RevealEvent) -> Result<bool> {
        self.wall.apply_event(event);

        if self.mode == OutputMode::Json {
            serde_json::to_writer(&mut self.out, event)?;
            writeln!(self.out)?;
        }

        let RevealEvent::RoundComplete(outcome) = event else {
            return Ok(false);
        };

        if self.mode == OutputMode::Text {
            if let Some(grid) = self.wall.grid()? {
                let tiles = self.wall.tiles()?;
                write!(self.out, "{}", report::grid_map(&tiles, grid.cols))?;
            }
            writeln!(
                self.out,
                "{}",
                report::winner_banner(outcome.round.round_index, &outcome.winners)
            )?;
        }
        self.outcomes.push(outcome.clone());
        Ok(true)
    }
}

//! Reveal Core - Headless Photo Lottery Reveal
//!
//! This crate provides the logic behind a photo giveaway wall: lay out every
//! participant photo in the largest uniform grid that fits the window, then
//! run a timed "shuffle and reveal" that draws winners fairly. It has no UI
//! dependencies; a browser, a TUI, or a headless script can drive it.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                            Host                                 │
//! │   photos + window size          renders tiles, celebrates       │
//! └──────────┬──────────────────────────────────▲──────────────────┘
//!            │ start_round / cancel / reset     │ RevealObserver
//!            │                                  │ (or RevealEvent channel)
//! ┌──────────▼──────────────────────────────────┴──────────────────┐
//! │                       REVEAL CORE                               │
//! │  ┌──────────────┐   ┌──────────────────┐   ┌────────────────┐  │
//! │  │    layout    │   │    sequencer     │──▶│    lottery     │  │
//! │  │ (grid solve) │   │ (state machine,  │   │ (fair draw,    │  │
//! │  │              │   │  tokio timers)   │   │  exclusions)   │  │
//! │  └──────────────┘   └──────────────────┘   └────────────────┘  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`GridConfig`]: Rows, columns, and tile size from [`layout::solve`]
//! - [`RevealSequencer`]: Drives rounds through Idle, Shuffling, Settling,
//!   and Revealed
//! - [`LotteryRound`]: Immutable record of one draw
//! - [`RevealObserver`]: Host callbacks; [`ChannelObserver`] turns them into
//!   [`RevealEvent`]s
//! - [`PhotoWall`]: View model combining layout with the latest tick frame
//!
//! # Quick Start
//!
//! ```ignore
//! use reveal_core::{PhotoEntry, RevealSequencer, RoundOptions, SequencerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let photos = vec![
//!         PhotoEntry::ingest("/photos/ana.jpg", "ana.jpg"),
//!         PhotoEntry::ingest("/photos/bo.jpg", "bo.jpg"),
//!     ];
//!
//!     let (sequencer, mut events) = RevealSequencer::with_events(SequencerConfig::default());
//!     sequencer.start_round(photos, RoundOptions::new(1)).unwrap();
//!
//!     while let Some(event) = events.recv().await {
//!         if let reveal_core::RevealEvent::RoundComplete(outcome) = event {
//!             println!("Winner: {}", outcome.winners[0].label());
//!             break;
//!         }
//!     }
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod layout;
pub mod lottery;
pub mod photo;
pub mod sequencer;

// Re-exports for convenience
pub use config::{load_config, ConfigError, ConfigOverrides, ConfigSource, RevealConfigFile};
pub use error::{Result, RevealError};
pub use events::{RevealEvent, TickFrame};
pub use host::{ChannelObserver, NullObserver, PhotoWall, RevealObserver, WallTile};
pub use layout::{solve, GridConfig, LayoutCache, LayoutSettings, Rect, Viewport};
pub use lottery::{draw_winners, LotteryRound, RoundOutcome, WinnerLedger};
pub use photo::{PhotoEntry, PhotoId};
pub use sequencer::{RevealSequencer, RevealState, RoundOptions, SequencerConfig};

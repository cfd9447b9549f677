//! Photo Reveal - Headless photo giveaway
//!
//! Lays out every photo in a folder as a grid, then shuffles and reveals
//! winners round by round.
//!
//! # Usage
//!
//! ```bash
//! # One winner from a folder
//! photo-reveal ~/event/photos
//!
//! # Three rounds of two winners, nobody wins twice
//! photo-reveal ~/event/photos --winners 2 --rounds 3 --exclude-prior-winners
//!
//! # Reproducible draw, events as JSON lines
//! photo-reveal ~/event/photos --seed 42 --json
//!
//! # Verbose logging
//! RUST_LOG=debug photo-reveal ~/event/photos
//! ```
//!
//! # Files
//!
//! - Config: `$XDG_CONFIG_HOME/photo-reveal/reveal.toml`
//!
//! # Signals
//!
//! - `SIGINT`: Cancel the round in flight and exit

mod ingest;
mod report;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use reveal_core::config::{load_config_from_path, ConfigOverrides};
use reveal_core::{load_config, PhotoWall, RevealSequencer, Viewport};

use session::{OutputMode, RevealSession, SessionEnd};

/// Photo Reveal - shuffle a folder of photos and draw winners
#[derive(Parser, Debug)]
#[command(name = "photo-reveal")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Folder containing the participant photos
    #[arg(value_name = "DIR")]
    dir: PathBuf,

    /// Winners per round
    #[arg(short = 'w', long, value_name = "N")]
    winners: Option<usize>,

    /// Number of rounds to run
    #[arg(short = 'r', long, default_value_t = 1, value_name = "N")]
    rounds: u32,

    /// Never draw the same photo twice in this session
    #[arg(short = 'x', long)]
    exclude_prior_winners: bool,

    /// Window width used for the layout
    #[arg(long, default_value_t = 1280.0, value_name = "PX")]
    width: f64,

    /// Window height used for the layout
    #[arg(long, default_value_t = 800.0, value_name = "PX")]
    height: f64,

    /// Fixed RNG seed for a reproducible draw
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "REVEAL_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print every event as a JSON line instead of the text report
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "REVEAL_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(winners) = self.winners {
            overrides = overrides.with_winners(winners);
        }
        if self.exclude_prior_winners {
            overrides = overrides.with_exclude_prior_winners(true);
        }
        if let Some(seed) = self.seed {
            overrides = overrides.with_seed(seed);
        }
        overrides
    }
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("photo_reveal={level},reveal_core={level}"))
    });

    // Logs go to stderr so stdout stays clean for the report or JSON stream
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut config = match &args.config {
        Some(path) => load_config_from_path(Some(path.clone())),
        None => load_config(),
    }
    .context("Failed to load configuration")?;
    args.overrides().apply(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        source = %config.source(),
        winners = config.default_winners,
        exclude_prior_winners = config.exclude_prior_winners,
        "Configuration loaded"
    );

    let photos = ingest::scan_photo_dir(&args.dir)?;
    if photos.is_empty() {
        anyhow::bail!("No photos found in {}", args.dir.display());
    }

    let mut wall = PhotoWall::new(config.layout);
    wall.set_photos(photos);
    let grid = wall
        .resize(Viewport::new(args.width, args.height))
        .context("Window too small for the photo grid")?;
    if !grid.has_room() {
        anyhow::bail!(
            "A {}x{} window leaves no room for {} photos",
            args.width,
            args.height,
            wall.photos().len()
        );
    }

    let mode = if args.json {
        OutputMode::Json
    } else {
        println!("{}", report::grid_summary(&grid, wall.photos().len()));
        OutputMode::Text
    };

    let (sequencer, events) = RevealSequencer::with_events(config.sequencer.clone());
    let mut session = RevealSession::new(
        sequencer,
        events,
        wall,
        config.round_options(),
        mode,
        std::io::stdout(),
    );

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler available; run to completion
            std::future::pending::<()>().await;
        }
    };

    let end = session.run(args.rounds, shutdown).await?;
    info!(
        rounds = session.outcomes().len(),
        end = ?end,
        "Session finished"
    );

    if end == SessionEnd::Interrupted {
        std::process::exit(130);
    }
    Ok(())
}

//! TOML Configuration File Support
//!
//! Layout and timing settings for the reveal widget, loaded from
//! `~/.config/photo-reveal/reveal.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables (`REVEAL_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/photo-reveal/reveal.toml` (typically `~/.config/photo-reveal/reveal.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [layout]
//! gap = 10.0
//! padding = 20.0
//! header_height = 80.0
//! footer_height = 0.0
//! aspect_ratio = 0.6725
//!
//! [reveal]
//! tick_interval_ms = 100
//! tick_count = 20
//! settle_ms = 400
//! highlight_count = 3
//! default_winners = 1
//! exclude_prior_winners = false
//! seed = 42
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::LayoutSettings;
use crate::sequencer::{RoundOptions, SequencerConfig};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Layout section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutToml {
    /// Space between tiles
    pub gap: Option<f64>,

    /// Padding around the grid
    pub padding: Option<f64>,

    /// Height reserved above the grid
    pub header_height: Option<f64>,

    /// Height reserved below the grid
    pub footer_height: Option<f64>,

    /// Tile width / tile height
    pub aspect_ratio: Option<f64>,
}

/// Reveal section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealSectionToml {
    /// Time between shuffle ticks in milliseconds
    pub tick_interval_ms: Option<u64>,

    /// Shuffle ticks per round
    pub tick_count: Option<u32>,

    /// Settle beat in milliseconds
    pub settle_ms: Option<u64>,

    /// Positions highlighted per tick
    pub highlight_count: Option<usize>,

    /// Winners per round when the host does not say
    pub default_winners: Option<usize>,

    /// Exclude earlier winners from later rounds
    pub exclude_prior_winners: Option<bool>,

    /// Fixed RNG seed
    pub seed: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealToml {
    /// Layout configuration section
    pub layout: LayoutToml,

    /// Reveal timing configuration section
    pub reveal: RevealSectionToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved configuration for a reveal session
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct RevealConfigFile {
    /// Grid chrome and tile shape
    pub layout: LayoutSettings,

    /// Tick cadence, settle beat, and seed
    pub sequencer: SequencerConfig,

    /// Winners per round
    pub default_winners: usize,

    /// Whether rounds exclude earlier winners
    pub exclude_prior_winners: bool,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for RevealConfigFile {
    fn default() -> Self {
        Self {
            layout: LayoutSettings::default(),
            sequencer: SequencerConfig::default(),
            default_winners: 1,
            exclude_prior_winners: false,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl RevealConfigFile {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Round options implied by this configuration
    #[must_use]
    pub fn round_options(&self) -> RoundOptions {
        RoundOptions::new(self.default_winners).excluding_prior_winners(self.exclude_prior_winners)
    }

    /// Check every value the solver and sequencer would reject later
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        if !(layout.gap.is_finite() && layout.gap >= 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "layout.gap must be a non-negative number, got {}",
                layout.gap
            )));
        }
        for (name, value) in [
            ("layout.padding", layout.padding),
            ("layout.header_height", layout.header_height),
            ("layout.footer_height", layout.footer_height),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if !(layout.aspect_ratio.is_finite() && layout.aspect_ratio > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "layout.aspect_ratio must be positive, got {}",
                layout.aspect_ratio
            )));
        }
        if self.sequencer.tick_count > 0 && self.sequencer.tick_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "reveal.tick_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.default_winners == 0 {
            return Err(ConfigError::ValidationError(
                "reveal.default_winners must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/photo-reveal/reveal.toml` or
/// `~/.config/photo-reveal/reveal.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("photo-reveal").join("reveal.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if the
/// merged values fail validation. A missing config file is not an error.
pub fn load_config() -> Result<RevealConfigFile, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed, or
/// if the merged values fail validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<RevealConfigFile, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

fn load_config_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<RevealConfigFile, ConfigError> {
    let mut config = RevealConfigFile::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: RevealToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);

    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut RevealConfigFile, toml: &RevealToml) {
    // Layout settings
    if let Some(gap) = toml.layout.gap {
        config.layout.gap = gap;
    }
    if let Some(padding) = toml.layout.padding {
        config.layout.padding = padding;
    }
    if let Some(height) = toml.layout.header_height {
        config.layout.header_height = height;
    }
    if let Some(height) = toml.layout.footer_height {
        config.layout.footer_height = height;
    }
    if let Some(ratio) = toml.layout.aspect_ratio {
        config.layout.aspect_ratio = ratio;
    }

    // Reveal settings
    if let Some(ms) = toml.reveal.tick_interval_ms {
        config.sequencer.tick_interval = Duration::from_millis(ms);
    }
    if let Some(count) = toml.reveal.tick_count {
        config.sequencer.tick_count = count;
    }
    if let Some(ms) = toml.reveal.settle_ms {
        config.sequencer.settle_duration = Duration::from_millis(ms);
    }
    if let Some(count) = toml.reveal.highlight_count {
        config.sequencer.highlight_count = count;
    }
    if let Some(winners) = toml.reveal.default_winners {
        config.default_winners = winners;
    }
    if let Some(exclude) = toml.reveal.exclude_prior_winners {
        config.exclude_prior_winners = exclude;
    }
    if let Some(seed) = toml.reveal.seed {
        config.sequencer.seed = Some(seed);
    }
}

/// Parse an environment value, warning about and skipping junk
fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = raw, "Ignoring unparsable environment variable");
            None
        }
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut RevealConfigFile, env: impl Fn(&str) -> Option<String>) {
    let mut read = |key: &str| -> Option<String> {
        let value = env(key);
        if value.is_some() {
            config.source = ConfigSource::Env;
        }
        value
    };

    let gap = read("REVEAL_GAP").and_then(|v| parse_env::<f64>("REVEAL_GAP", &v));
    let padding = read("REVEAL_PADDING").and_then(|v| parse_env::<f64>("REVEAL_PADDING", &v));
    let header =
        read("REVEAL_HEADER_HEIGHT").and_then(|v| parse_env::<f64>("REVEAL_HEADER_HEIGHT", &v));
    let footer =
        read("REVEAL_FOOTER_HEIGHT").and_then(|v| parse_env::<f64>("REVEAL_FOOTER_HEIGHT", &v));
    let aspect =
        read("REVEAL_ASPECT_RATIO").and_then(|v| parse_env::<f64>("REVEAL_ASPECT_RATIO", &v));
    let tick_ms =
        read("REVEAL_TICK_INTERVAL_MS").and_then(|v| parse_env::<u64>("REVEAL_TICK_INTERVAL_MS", &v));
    let tick_count =
        read("REVEAL_TICK_COUNT").and_then(|v| parse_env::<u32>("REVEAL_TICK_COUNT", &v));
    let settle_ms = read("REVEAL_SETTLE_MS").and_then(|v| parse_env::<u64>("REVEAL_SETTLE_MS", &v));
    let highlight =
        read("REVEAL_HIGHLIGHT_COUNT").and_then(|v| parse_env::<usize>("REVEAL_HIGHLIGHT_COUNT", &v));
    let winners = read("REVEAL_WINNERS").and_then(|v| parse_env::<usize>("REVEAL_WINNERS", &v));
    let exclude = read("REVEAL_EXCLUDE_PRIOR_WINNERS")
        .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"));
    let seed = read("REVEAL_SEED").and_then(|v| parse_env::<u64>("REVEAL_SEED", &v));

    if let Some(gap) = gap {
        config.layout.gap = gap;
    }
    if let Some(padding) = padding {
        config.layout.padding = padding;
    }
    if let Some(height) = header {
        config.layout.header_height = height;
    }
    if let Some(height) = footer {
        config.layout.footer_height = height;
    }
    if let Some(ratio) = aspect {
        config.layout.aspect_ratio = ratio;
    }
    if let Some(ms) = tick_ms {
        config.sequencer.tick_interval = Duration::from_millis(ms);
    }
    if let Some(count) = tick_count {
        config.sequencer.tick_count = count;
    }
    if let Some(ms) = settle_ms {
        config.sequencer.settle_duration = Duration::from_millis(ms);
    }
    if let Some(count) = highlight {
        config.sequencer.highlight_count = count;
    }
    if let Some(winners) = winners {
        config.default_winners = winners;
    }
    if let Some(exclude) = exclude {
        config.exclude_prior_winners = exclude;
    }
    if let Some(seed) = seed {
        config.sequencer.seed = Some(seed);
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides,
/// then call [`RevealConfigFile::validate`] again.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Winners per round override
    pub winners: Option<usize>,

    /// Exclusion flag override
    pub exclude_prior_winners: Option<bool>,

    /// RNG seed override
    pub seed: Option<u64>,

    /// Tick interval override (milliseconds)
    pub tick_interval_ms: Option<u64>,

    /// Tick count override
    pub tick_count: Option<u32>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set winners override
    #[must_use]
    pub fn with_winners(mut self, winners: usize) -> Self {
        self.winners = Some(winners);
        self
    }

    /// Set exclusion override
    #[must_use]
    pub fn with_exclude_prior_winners(mut self, exclude: bool) -> Self {
        self.exclude_prior_winners = Some(exclude);
        self
    }

    /// Set seed override
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set tick interval override
    #[must_use]
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = Some(ms);
        self
    }

    /// Set tick count override
    #[must_use]
    pub fn with_tick_count(mut self, count: u32) -> Self {
        self.tick_count = Some(count);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut RevealConfigFile) {
        if self.winners.is_some()
            || self.exclude_prior_winners.is_some()
            || self.seed.is_some()
            || self.tick_interval_ms.is_some()
            || self.tick_count.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(winners) = self.winners {
            config.default_winners = winners;
        }
        if let Some(exclude) = self.exclude_prior_winners {
            config.exclude_prior_winners = exclude;
        }
        if let Some(seed) = self.seed {
            config.sequencer.seed = Some(seed);
        }
        if let Some(ms) = self.tick_interval_ms {
            config.sequencer.tick_interval = Duration::from_millis(ms);
        }
        if let Some(count) = self.tick_count {
            config.sequencer.tick_count = count;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

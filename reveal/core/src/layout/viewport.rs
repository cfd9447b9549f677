//! Viewport and layout settings
//!
//! The grid does not get the whole window: a header strip (logos and event
//! title), an optional footer, and a uniform padding are taken off first.

use serde::{Deserialize, Serialize};

use super::{solve, GridConfig, Rect};
use crate::error::Result;

/// Host window size
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Window width
    pub width: f64,
    /// Window height
    pub height: f64,
}

impl Viewport {
    /// Create a viewport
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Rectangle left for the grid once `settings` chrome is removed
    #[must_use]
    pub fn content_rect(&self, settings: &LayoutSettings) -> Rect {
        Rect {
            x: settings.padding,
            y: settings.header_height + settings.padding,
            width: self.width - settings.padding * 2.0,
            height: self.height
                - settings.header_height
                - settings.footer_height
                - settings.padding * 2.0,
        }
    }

    /// Solve the grid for `item_count` photos inside this viewport
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the chrome leaves no room for the
    /// grid, or if `settings` carries an invalid gap or aspect ratio.
    pub fn solve(&self, item_count: usize, settings: &LayoutSettings) -> Result<GridConfig> {
        let content = self.content_rect(settings);
        solve(
            item_count,
            content.width,
            content.height,
            settings.gap,
            settings.aspect_ratio,
        )
    }
}

/// Fixed layout parameters of the photo wall
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutSettings {
    /// Space between tiles
    pub gap: f64,
    /// Padding around the grid on every side
    pub padding: f64,
    /// Height reserved above the grid
    pub header_height: f64,
    /// Height reserved below the grid
    pub footer_height: f64,
    /// Tile width / tile height
    pub aspect_ratio: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            gap: 10.0,
            padding: 20.0,
            header_height: 80.0,
            footer_height: 0.0,
            // Portrait participant cards, 1240x1844
            aspect_ratio: 1240.0 / 1844.0,
        }
    }
}

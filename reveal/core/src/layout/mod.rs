//! Grid Layout Solver
//!
//! Packs `n` equally sized tiles of a fixed aspect ratio into a container,
//! choosing the uniform row/column split that gives each tile the largest
//! area.
//!
//! # Algorithm
//!
//! ```text
//! for cols in 1..=n
//!     rows     = ceil(n / cols)
//!     max_w    = (W - (cols - 1) * gap) / cols
//!     max_h    = (H - (rows - 1) * gap) / rows
//!     tile_h   = min(max_h, max_w / aspect)
//!     area     = tile_h * (tile_h * aspect)
//! keep the strictly greatest area (ties keep the lowest cols)
//! ```
//!
//! Restricting the search to uniform grids is enough because every tile
//! shares one aspect ratio. The solver is pure: callers re-run it on every
//! resize or item count change, or go through [`LayoutCache`].

mod cache;
mod viewport;

pub use cache::LayoutCache;
pub use viewport::{LayoutSettings, Viewport};

use serde::{Deserialize, Serialize};

use crate::error::{RevealError, Result};

/// Tile height reported for an empty grid
pub const NOMINAL_TILE_HEIGHT: f64 = 100.0;

/// Grid geometry produced by [`solve`]
///
/// When the gaps alone overflow the container the solver still answers, with
/// a zero `tile_height`. Such a grid has no room for tiles: [`has_room`]
/// is false and [`cell_rect`] places nothing.
///
/// [`has_room`]: Self::has_room
/// [`cell_rect`]: Self::cell_rect
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
    /// Height of every tile
    pub tile_height: f64,
    /// Tile width / tile height
    pub aspect_ratio: f64,
}

impl GridConfig {
    /// Width of every tile
    #[must_use]
    pub fn tile_width(&self) -> f64 {
        self.tile_height * self.aspect_ratio
    }

    /// Area of a single tile
    #[must_use]
    pub fn tile_area(&self) -> f64 {
        self.tile_height * self.tile_width()
    }

    /// Whether tiles can be placed at all
    #[must_use]
    pub fn has_room(&self) -> bool {
        self.tile_height > 0.0
    }

    /// Number of slots in the grid
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }

    /// Total width of the tiles plus the gaps between them
    #[must_use]
    pub fn grid_width(&self, gap: f64) -> f64 {
        self.cols as f64 * self.tile_width() + self.cols.saturating_sub(1) as f64 * gap
    }

    /// Total height of the tiles plus the gaps between them
    #[must_use]
    pub fn grid_height(&self, gap: f64) -> f64 {
        self.rows as f64 * self.tile_height + self.rows.saturating_sub(1) as f64 * gap
    }

    /// Rectangle of the tile at `index` (row-major), with the grid centred
    /// inside `container`. Returns `None` past the last slot, and for every
    /// slot of a grid without room.
    #[must_use]
    pub fn cell_rect(&self, index: usize, container: Rect, gap: f64) -> Option<Rect> {
        if index >= self.capacity() || !self.has_room() {
            return None;
        }
        let row = index / self.cols;
        let col = index % self.cols;

        let origin_x = container.x + (container.width - self.grid_width(gap)) / 2.0;
        let origin_y = container.y + (container.height - self.grid_height(gap)) / 2.0;

        Some(Rect {
            x: origin_x + col as f64 * (self.tile_width() + gap),
            y: origin_y + row as f64 * (self.tile_height + gap),
            width: self.tile_width(),
            height: self.tile_height,
        })
    }
}

/// Axis-aligned rectangle in host units (usually CSS or device pixels)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Rectangle anchored at the origin
    #[must_use]
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    /// Whether `other` lies entirely inside this rectangle (with a small
    /// tolerance for float rounding)
    #[must_use]
    pub fn contains(&self, other: &Rect) -> bool {
        const EPS: f64 = 1e-9;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.x + other.width <= self.x + self.width + EPS
            && other.y + other.height <= self.y + self.height + EPS
    }
}

/// Find the uniform grid that maximizes tile area.
///
/// With `item_count == 0` this returns a 1x1 grid with a nominal tile height;
/// there is nothing to place and the caller should not render a grid. If no
/// column count leaves a positive tile, the result has a zero tile height and
/// [`GridConfig::has_room`] is false.
///
/// # Errors
///
/// Returns [`RevealError::Configuration`] if the container dimensions or the
/// aspect ratio are not positive and finite, or if `gap` is negative.
pub fn solve(
    item_count: usize,
    container_width: f64,
    container_height: f64,
    gap: f64,
    aspect_ratio: f64,
) -> Result<GridConfig> {
    validate(container_width, container_height, gap, aspect_ratio)?;

    if item_count == 0 {
        return Ok(GridConfig {
            rows: 1,
            cols: 1,
            tile_height: NOMINAL_TILE_HEIGHT,
            aspect_ratio,
        });
    }

    // Cols = 1 with a zero tile is the fallback when even the gaps don't fit
    let mut best = GridConfig {
        rows: item_count,
        cols: 1,
        tile_height: 0.0,
        aspect_ratio,
    };
    let mut best_area = 0.0;

    for cols in 1..=item_count {
        let rows = item_count.div_ceil(cols);
        let total_gap_w = (cols - 1) as f64 * gap;
        let total_gap_h = (rows - 1) as f64 * gap;

        let max_tile_w = (container_width - total_gap_w) / cols as f64;
        let max_tile_h = (container_height - total_gap_h) / rows as f64;

        let tile_height = max_tile_h.min(max_tile_w / aspect_ratio).max(0.0);
        let area = tile_height * (tile_height * aspect_ratio);

        if area > best_area {
            best_area = area;
            best = GridConfig {
                rows,
                cols,
                tile_height,
                aspect_ratio,
            };
        }
    }

    tracing::trace!(
        item_count,
        rows = best.rows,
        cols = best.cols,
        tile_height = best.tile_height,
        "Solved grid layout"
    );

    Ok(best)
}

fn validate(width: f64, height: f64, gap: f64, aspect_ratio: f64) -> Result<()> {
    if !(width.is_finite() && width > 0.0) {
        return Err(RevealError::configuration(format!(
            "container width must be positive, got {width}"
        )));
    }
    if !(height.is_finite() && height > 0.0) {
        return Err(RevealError::configuration(format!(
            "container height must be positive, got {height}"
        )));
    }
    if !(gap.is_finite() && gap >= 0.0) {
        return Err(RevealError::configuration(format!(
            "gap must be non-negative, got {gap}"
        )));
    }
    if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
        return Err(RevealError::configuration(format!(
            "aspect ratio must be positive, got {aspect_ratio}"
        )));
    }
    Ok(())
}

//! Memoized layout for resize-heavy hosts
//!
//! Hosts tend to call the solver on every resize notification, many of which
//! repeat the previous size. The cache keeps the last input tuple and result.

use super::{solve, GridConfig};
use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq)]
struct SolveKey {
    item_count: usize,
    width: f64,
    height: f64,
    gap: f64,
    aspect_ratio: f64,
}

/// Single-entry memo over [`solve`]
#[derive(Clone, Debug, Default)]
pub struct LayoutCache {
    last: Option<(SolveKey, GridConfig)>,
    hits: u64,
    misses: u64,
}

impl LayoutCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Solve, reusing the previous result when the inputs are unchanged
    ///
    /// # Errors
    ///
    /// Same as [`solve`]. Errors are never cached.
    pub fn solve(
        &mut self,
        item_count: usize,
        width: f64,
        height: f64,
        gap: f64,
        aspect_ratio: f64,
    ) -> Result<GridConfig> {
        let key = SolveKey {
            item_count,
            width,
            height,
            gap,
            aspect_ratio,
        };

        if let Some((last_key, grid)) = self.last {
            if last_key == key {
                self.hits += 1;
                return Ok(grid);
            }
        }

        let grid = solve(item_count, width, height, gap, aspect_ratio)?;
        self.misses += 1;
        self.last = Some((key, grid));
        Ok(grid)
    }

    /// Most recent successful result
    #[must_use]
    pub fn current(&self) -> Option<GridConfig> {
        self.last.map(|(_, grid)| grid)
    }

    /// (hits, misses) since creation
    #[must_use]
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    /// Drop the memoized entry
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}

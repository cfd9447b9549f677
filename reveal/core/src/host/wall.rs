//! Photo wall view model
//!
//! Holds the current photo set, the viewport, and the latest tick frame, and
//! answers "which photo goes where, and is it lit". Renderers only draw
//! [`WallTile`]s.

use std::collections::HashSet;

use crate::error::Result;
use crate::events::{RevealEvent, TickFrame};
use crate::layout::{GridConfig, LayoutCache, LayoutSettings, Rect, Viewport};
use crate::photo::{PhotoEntry, PhotoId};
use crate::sequencer::RevealState;

/// One placed photo
#[derive(Clone, Debug, PartialEq)]
pub struct WallTile<'a> {
    /// The photo shown in this slot
    pub photo: &'a PhotoEntry,
    /// Where to draw it
    pub rect: Rect,
    /// Lit by the current shuffle frame
    pub highlighted: bool,
    /// Among the revealed winners
    pub winner: bool,
}

/// Layout and reveal state of the photo grid
#[derive(Debug, Default)]
pub struct PhotoWall {
    settings: LayoutSettings,
    cache: LayoutCache,
    viewport: Option<Viewport>,
    photos: Vec<PhotoEntry>,
    display_order: Vec<usize>,
    highlighted: Vec<usize>,
    winners: HashSet<PhotoId>,
}

impl PhotoWall {
    /// Create an empty wall
    #[must_use]
    pub fn new(settings: LayoutSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Layout settings in use
    #[must_use]
    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// Replace the photo set; ordering and marks start over
    pub fn set_photos(&mut self, photos: Vec<PhotoEntry>) {
        self.display_order = (0..photos.len()).collect();
        self.photos = photos;
        self.highlighted.clear();
        self.winners.clear();
    }

    /// Current photo set, in ingestion order
    #[must_use]
    pub fn photos(&self) -> &[PhotoEntry] {
        &self.photos
    }

    /// Record a new window size and solve the grid for it
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the window leaves no room for tiles.
    /// The previous viewport is kept in that case.
    pub fn resize(&mut self, viewport: Viewport) -> Result<GridConfig> {
        let grid = self.solve_for(viewport)?;
        self.viewport = Some(viewport);
        Ok(grid)
    }

    /// Grid for the current viewport, if one has been set
    ///
    /// # Errors
    ///
    /// Same as [`resize`](Self::resize).
    pub fn grid(&mut self) -> Result<Option<GridConfig>> {
        match self.viewport {
            Some(viewport) => self.solve_for(viewport).map(Some),
            None => Ok(None),
        }
    }

    fn solve_for(&mut self, viewport: Viewport) -> Result<GridConfig> {
        let content = viewport.content_rect(&self.settings);
        self.cache.solve(
            self.photos.len(),
            content.width,
            content.height,
            self.settings.gap,
            self.settings.aspect_ratio,
        )
    }

    /// Apply a shuffle frame. Frames for a different photo count are ignored.
    pub fn apply_frame(&mut self, frame: &TickFrame) {
        if frame.display_order.len() != self.photos.len() {
            tracing::debug!(
                frame_len = frame.display_order.len(),
                photos = self.photos.len(),
                "Ignoring tick frame for a different photo set"
            );
            return;
        }
        self.display_order.clone_from(&frame.display_order);
        self.highlighted.clone_from(&frame.highlighted);
    }

    /// Mark the revealed winners
    pub fn mark_winners(&mut self, winners: &[PhotoEntry]) {
        self.highlighted.clear();
        self.winners = winners.iter().map(|w| w.id.clone()).collect();
    }

    /// Back to the natural order with nothing lit
    pub fn clear_marks(&mut self) {
        self.display_order = (0..self.photos.len()).collect();
        self.highlighted.clear();
        self.winners.clear();
    }

    /// Fold a sequencer event into the wall
    pub fn apply_event(&mut self, event: &RevealEvent) {
        match event {
            RevealEvent::Tick(frame) => self.apply_frame(frame),
            RevealEvent::StateChanged {
                to: RevealState::Idle,
                ..
            } => self.clear_marks(),
            RevealEvent::StateChanged { .. } => {}
            RevealEvent::RoundComplete(outcome) => self.mark_winners(&outcome.winners),
        }
    }

    /// Whether `id` is currently marked as a winner
    #[must_use]
    pub fn is_winner(&self, id: &PhotoId) -> bool {
        self.winners.contains(id)
    }

    /// Placed tiles in display order. Empty until a viewport is set.
    ///
    /// # Errors
    ///
    /// Same as [`resize`](Self::resize).
    pub fn tiles(&mut self) -> Result<Vec<WallTile<'_>>> {
        let Some(viewport) = self.viewport else {
            return Ok(Vec::new());
        };
        let grid = self.solve_for(viewport)?;
        let content = viewport.content_rect(&self.settings);
        let gap = self.settings.gap;

        Ok(self
            .display_order
            .iter()
            .enumerate()
            .filter_map(|(slot, &index)| {
                let photo = self.photos.get(index)?;
                let rect = grid.cell_rect(slot, content, gap)?;
                Some(WallTile {
                    photo,
                    rect,
                    highlighted: self.highlighted.binary_search(&index).is_ok(),
                    winner: self.winners.contains(&photo.id),
                })
            })
            .collect())
    }
}

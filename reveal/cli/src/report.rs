//! Plain-text rendering of the wall and the results

use std::fmt::Write as _;

use reveal_core::{GridConfig, PhotoEntry, WallTile};

/// Width of one cell in the text grid
const CELL_WIDTH: usize = 14;

/// One-line description of the solved grid
pub fn grid_summary(grid: &GridConfig, photos: usize) -> String {
    format!(
        "{photos} photos in {} x {} grid, tiles {:.0} x {:.0}",
        grid.rows,
        grid.cols,
        grid.tile_width(),
        grid.tile_height
    )
}

/// Labels laid out row by row; winners in brackets, highlights starred
pub fn grid_map(tiles: &[WallTile<'_>], cols: usize) -> String {
    let mut out = String::new();
    for row in tiles.chunks(cols.max(1)) {
        for tile in row {
            let label = truncate(tile.photo.label(), CELL_WIDTH - 2);
            let cell = if tile.winner {
                format!("[{label}]")
            } else if tile.highlighted {
                format!("*{label}*")
            } else {
                format!(" {label} ")
            };
            let _ = write!(out, "{cell:<width$}", width = CELL_WIDTH);
        }
        out.truncate(out.trim_end().len());
        out.push('\n');
    }
    out
}

/// Announcement printed when a round is revealed
pub fn winner_banner(round_index: u64, winners: &[PhotoEntry]) -> String {
    let names: Vec<&str> = winners.iter().map(PhotoEntry::label).collect();
    let noun = if winners.len() == 1 { "winner" } else { "winners" };
    format!(
        "*** Congratulations! *** Round {} {noun}: {}",
        round_index + 1,
        names.join(", ")
    )
}

fn truncate(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut short: String = label.chars().take(max_chars.saturating_sub(1)).collect();
    short.push('~');
    short
}

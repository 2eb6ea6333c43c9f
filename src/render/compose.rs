//! Grid composition: one captured frame plus view state into a cell grid.

use super::diff::CellGrid;
use super::glyph::{encode, encode_quadrant, Cell, DisplayMode};
use crate::view::{sample, sample_quadrants, FrameView, ViewState};

/// Background used behind status text.
const STATUS_BG: crate::view::Rgb = crate::view::Rgb::new(40, 40, 40);

/// Build the full terminal grid for one frame.
///
/// Quadrant mode samples at 2x cell density and dithers; every other mode
/// takes one (possibly neighborhood-averaged) sample per cell.
pub fn compose(
    frame: &FrameView,
    view: &ViewState,
    mode: DisplayMode,
    term_w: u16,
    term_h: u16,
) -> CellGrid {
    let mut grid = CellGrid::new(term_w, term_h);
    for y in 0..term_h {
        for x in 0..term_w {
            let cell = match mode {
                DisplayMode::Quadrant => {
                    encode_quadrant(sample_quadrants(frame, view, x, y, term_w, term_h))
                }
                _ => encode(sample(frame, view, x, y, term_w, term_h), mode),
            };
            grid.set(x, y, cell);
        }
    }
    grid
}

/// Overwrite row 0 of the grid with a status line.
///
/// The row must also be registered as an overlay row on the renderer so
/// it gets the line-clear treatment.
pub fn overlay_status(grid: &mut CellGrid, text: &str) {
    let width = grid.width();
    let mut chars = text.chars();
    for x in 0..width {
        let ch = chars.next().unwrap_or(' ');
        grid.set(x, 0, Cell::new(ch, crate::view::Rgb::WHITE, STATUS_BG));
    }
}

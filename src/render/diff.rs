//! Differential terminal output.
//!
//! Repainting every cell at ~30 fps saturates most terminal emulators, so
//! the renderer keeps the last grid it emitted and writes only cells that
//! changed since then. Cost per frame is proportional to the number of
//! changed cells, not the terminal area.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Colors, Print, SetColors};
use crossterm::terminal::{Clear, ClearType};

use super::glyph::Cell;
use crate::view::Rgb;

/// A rectangular grid of rendered cells, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CellGrid {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl CellGrid {
    /// Create a grid of blank cells.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::blank(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u16, y: u16) -> Cell {
        self.cells[self.index(x, y)]
    }

    /// Set a cell; out-of-bounds coordinates are ignored.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.cells[idx] = cell;
        }
    }
}

fn to_color(c: Rgb) -> Color {
    Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

/// Writes only the cells that changed since the last committed grid.
///
/// Rows registered as overlay rows (status/overlay text) get a line-clear
/// before being rewritten, and are then repainted in full, since the
/// clear wipes their unchanged cells too.
pub struct DiffRenderer {
    prev: Option<CellGrid>,
    overlay_rows: Vec<u16>,
}

impl DiffRenderer {
    pub fn new() -> Self {
        Self {
            prev: None,
            overlay_rows: Vec::new(),
        }
    }

    /// Register rows that receive a line-clear before any rewrite.
    pub fn with_overlay_rows(mut self, rows: Vec<u16>) -> Self {
        self.overlay_rows = rows;
        self
    }

    /// Drop the committed state, forcing a full repaint on the next render
    /// (used after a terminal resize).
    pub fn invalidate(&mut self) {
        self.prev = None;
    }

    /// Emit the terminal writes needed to display `grid`, then commit it
    /// as the new last-emitted state. Returns the number of cells written.
    pub fn render<W: Write>(&mut self, grid: &CellGrid, out: &mut W) -> io::Result<usize> {
        let full = match &self.prev {
            Some(prev) => prev.width() != grid.width() || prev.height() != grid.height(),
            None => true,
        };

        // Overlay rows containing any change are cleared and repainted
        // whole; everything else is a per-cell diff.
        let mut dirty_overlays: Vec<u16> = Vec::new();
        for &row in &self.overlay_rows {
            if row >= grid.height() {
                continue;
            }
            let changed = full
                || (0..grid.width()).any(|x| {
                    self.prev
                        .as_ref()
                        .is_some_and(|p| p.get(x, row) != grid.get(x, row))
                });
            if changed {
                dirty_overlays.push(row);
            }
        }

        let mut written = 0usize;
        let mut current_colors: Option<(Rgb, Rgb)> = None;

        for &row in &dirty_overlays {
            queue!(out, MoveTo(0, row), Clear(ClearType::CurrentLine))?;
        }

        for y in 0..grid.height() {
            let overlay_dirty = dirty_overlays.contains(&y);
            if self.overlay_rows.contains(&y) && !overlay_dirty {
                continue;
            }
            for x in 0..grid.width() {
                let cell = grid.get(x, y);
                let changed = if overlay_dirty {
                    // Cleared row: repaint everything visible on it.
                    cell != Cell::blank()
                } else {
                    full || self.prev.as_ref().is_some_and(|p| p.get(x, y) != cell)
                };
                if !changed {
                    continue;
                }

                queue!(out, MoveTo(x, y))?;
                if current_colors != Some((cell.fg, cell.bg)) {
                    queue!(
                        out,
                        SetColors(Colors::new(to_color(cell.fg), to_color(cell.bg)))
                    )?;
                    current_colors = Some((cell.fg, cell.bg));
                }
                queue!(out, Print(cell.ch))?;
                written += 1;
            }
        }

        out.flush()?;
        self.prev = Some(grid.clone());
        Ok(written)
    }
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colored(r: u8) -> Cell {
        Cell::new('x', Rgb::new(r, 0, 0), Rgb::BLACK)
    }

    #[test]
    fn test_first_render_paints_everything() {
        let mut renderer = DiffRenderer::new();
        let mut grid = CellGrid::new(4, 2);
        grid.set(1, 1, colored(10));
        let mut out = Vec::new();
        let written = renderer.render(&grid, &mut out).unwrap();
        assert_eq!(written, 8);
        assert!(!out.is_empty());
    }

    #[test]
    fn test_identical_grid_writes_nothing() {
        let mut renderer = DiffRenderer::new();
        let mut grid = CellGrid::new(10, 4);
        grid.set(3, 2, colored(200));
        let mut out = Vec::new();
        renderer.render(&grid, &mut out).unwrap();

        let mut out2 = Vec::new();
        let written = renderer.render(&grid, &mut out2).unwrap();
        assert_eq!(written, 0);
        assert!(out2.is_empty());
    }

    #[test]
    fn test_single_cell_change_writes_single_cell() {
        let mut renderer = DiffRenderer::new();
        let mut grid = CellGrid::new(10, 4);
        let mut out = Vec::new();
        renderer.render(&grid, &mut out).unwrap();

        grid.set(7, 1, colored(99));
        let mut out2 = Vec::new();
        let written = renderer.render(&grid, &mut out2).unwrap();
        assert_eq!(written, 1);
    }

    #[test]
    fn test_resize_forces_full_repaint() {
        let mut renderer = DiffRenderer::new();
        let grid = CellGrid::new(4, 4);
        renderer.render(&grid, &mut Vec::new()).unwrap();

        let bigger = CellGrid::new(5, 4);
        let written = renderer.render(&bigger, &mut Vec::new()).unwrap();
        assert_eq!(written, 20);
    }

    #[test]
    fn test_invalidate_forces_full_repaint() {
        let mut renderer = DiffRenderer::new();
        let grid = CellGrid::new(3, 3);
        renderer.render(&grid, &mut Vec::new()).unwrap();
        renderer.invalidate();
        let written = renderer.render(&grid, &mut Vec::new()).unwrap();
        assert_eq!(written, 9);
    }

    #[test]
    fn test_overlay_row_gets_line_clear() {
        let mut renderer = DiffRenderer::new().with_overlay_rows(vec![0]);
        let mut grid = CellGrid::new(8, 3);
        renderer.render(&grid, &mut Vec::new()).unwrap();

        grid.set(2, 0, Cell::new('A', Rgb::WHITE, Rgb::BLACK));
        let mut out = Vec::new();
        let written = renderer.render(&grid, &mut out).unwrap();
        // The row is cleared and only its one visible cell repainted.
        assert_eq!(written, 1);
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("\x1b[2K"), "expected a line-clear escape");
    }

    #[test]
    fn test_untouched_overlay_row_is_not_cleared() {
        let mut renderer = DiffRenderer::new().with_overlay_rows(vec![0]);
        let mut grid = CellGrid::new(8, 3);
        grid.set(1, 0, Cell::new('S', Rgb::WHITE, Rgb::BLACK));
        renderer.render(&grid, &mut Vec::new()).unwrap();

        // Change outside the overlay row only.
        grid.set(4, 2, colored(33));
        let mut out = Vec::new();
        let written = renderer.render(&grid, &mut out).unwrap();
        assert_eq!(written, 1);
        let text = String::from_utf8_lossy(&out);
        assert!(!text.contains("\x1b[2K"));
    }

    #[test]
    fn test_grid_set_out_of_bounds_ignored() {
        let mut grid = CellGrid::new(2, 2);
        grid.set(5, 5, colored(1));
        assert_eq!(grid.get(0, 0), Cell::blank());
    }
}

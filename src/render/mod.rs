//! Rendering: glyph encoding, grid composition, and differential output.
//!
//! The pipeline for one frame:
//!
//! 1. [`compose`] samples the frame through the viewport for every cell
//!    and encodes each sample with [`glyph::encode`] (or the quadrant
//!    ditherer) into a [`CellGrid`].
//! 2. [`overlay_status`] stamps the status line over the top row.
//! 3. [`DiffRenderer::render`] compares the grid against the last one it
//!    emitted and writes only the changed cells.

mod compose;
mod diff;
pub mod glyph;

pub use compose::{compose, overlay_status};
pub use diff::{CellGrid, DiffRenderer};
pub use glyph::{encode, encode_quadrant, luma, Cell, DisplayMode};

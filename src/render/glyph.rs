//! Glyph encoding: color samples to terminal characters.
//!
//! Every display mode is a pure function of its input sample(s), which is
//! what lets the diff renderer trust cell equality between frames.

use crate::view::Rgb;

/// ASCII density ramp (10 levels), darkest to brightest.
pub const ASCII_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Shade-block ramp (5 levels) using the Unicode shade characters.
pub const SHADES_RAMP: &[char] = &[' ', '░', '▒', '▓', '█'];

/// Lower-block height ramp (9 levels).
pub const BLOCKS_RAMP: &[char] = &[' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Braille fill ramp (9 levels), dots filling bottom-up.
pub const BRAILLE_RAMP: &[char] = &['⠀', '⢀', '⣀', '⣄', '⣤', '⣦', '⣶', '⣷', '⣿'];

/// Sparse dot ramp (7 levels).
pub const DOTS_RAMP: &[char] = &[' ', '.', ':', '⁚', '⁖', '⁘', '⁙'];

/// The 16 quadrant block glyphs, indexed by a 4-bit mask of "light"
/// quadrants with the most significant bit at top-left:
/// bit 3 = top-left, bit 2 = top-right, bit 1 = bottom-left,
/// bit 0 = bottom-right.
pub const QUADRANT_GLYPHS: [char; 16] = [
    ' ', '▗', '▖', '▄', '▝', '▐', '▞', '▟', '▘', '▚', '▌', '▙', '▀', '▜', '▛', '█',
];

/// One rendered terminal cell: glyph plus 24-bit foreground/background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Rgb,
    pub bg: Rgb,
}

impl Cell {
    pub const fn new(ch: char, fg: Rgb, bg: Rgb) -> Self {
        Self { ch, fg, bg }
    }

    /// An empty black cell, the initial state of the whole grid.
    pub const fn blank() -> Self {
        Self::new(' ', Rgb::BLACK, Rgb::BLACK)
    }
}

/// Selectable glyph/shading style.
///
/// A closed enum so that adding or removing a mode is a compile-checked
/// change everywhere it is dispatched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Solid color cells, no brightness ramp.
    Pixels,
    /// Lower-block height ramp.
    Blocks,
    /// Shade-character ramp.
    Shades,
    /// Classic ASCII density ramp.
    #[default]
    Ascii,
    /// Braille fill ramp.
    Braille,
    /// Sparse dot ramp.
    Dots,
    /// 2x2 sub-cell dithering into quadrant block glyphs.
    Quadrant,
}

impl DisplayMode {
    /// All modes in key-binding order (keys `1`..`7`).
    pub const ALL: [DisplayMode; 7] = [
        DisplayMode::Pixels,
        DisplayMode::Blocks,
        DisplayMode::Shades,
        DisplayMode::Ascii,
        DisplayMode::Braille,
        DisplayMode::Dots,
        DisplayMode::Quadrant,
    ];

    /// The brightness ramp for ramp-based modes; `None` for Pixels and
    /// Quadrant, which do not index a ramp.
    pub fn ramp(&self) -> Option<&'static [char]> {
        match self {
            DisplayMode::Pixels | DisplayMode::Quadrant => None,
            DisplayMode::Blocks => Some(BLOCKS_RAMP),
            DisplayMode::Shades => Some(SHADES_RAMP),
            DisplayMode::Ascii => Some(ASCII_RAMP),
            DisplayMode::Braille => Some(BRAILLE_RAMP),
            DisplayMode::Dots => Some(DOTS_RAMP),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DisplayMode::Pixels => "pixels",
            DisplayMode::Blocks => "blocks",
            DisplayMode::Shades => "shades",
            DisplayMode::Ascii => "ascii",
            DisplayMode::Braille => "braille",
            DisplayMode::Dots => "dots",
            DisplayMode::Quadrant => "quadrant",
        }
    }

    /// Parse a mode name (used by the CLI and config file).
    pub fn parse(s: &str) -> Option<Self> {
        DisplayMode::ALL
            .into_iter()
            .find(|m| m.name() == s.to_lowercase())
    }
}

/// Perceptual luma of a color, ITU-R BT.601 weights.
pub fn luma(c: Rgb) -> u8 {
    ((299 * c.r as u32 + 587 * c.g as u32 + 114 * c.b as u32) / 1000) as u8
}

/// Encode a single cell sample under the given mode.
///
/// Pixels mode ignores brightness and paints a solid block in the sample
/// color. Ramp modes index their ramp by luma (the index is clamped to
/// the ramp bounds) with the sample color on black. Quadrant mode takes
/// four samples and goes through [`encode_quadrant`] instead.
pub fn encode(sample: Rgb, mode: DisplayMode) -> Cell {
    match mode.ramp() {
        None => Cell::new('█', sample, sample),
        Some(ramp) => {
            let idx = (luma(sample) as usize * (ramp.len() - 1) / 255).min(ramp.len() - 1);
            Cell::new(ramp[idx], sample, Rgb::BLACK)
        }
    }
}

/// Encode a 2x2 quadrant sample set into one block-element cell.
///
/// Sub-samples are partitioned into "light" and "dark" by comparison to
/// their own mean luminance; the glyph is chosen by the 4-bit light mask
/// (MSB = top-left) and the two partitions' average colors become the
/// foreground (light) and background (dark). An empty light partition
/// falls back to white so the glyph stays well defined.
///
/// `samples` are ordered top-left, top-right, bottom-left, bottom-right.
pub fn encode_quadrant(samples: [Rgb; 4]) -> Cell {
    let lumas: [u32; 4] = [
        luma(samples[0]) as u32,
        luma(samples[1]) as u32,
        luma(samples[2]) as u32,
        luma(samples[3]) as u32,
    ];
    let mean = lumas.iter().sum::<u32>() / 4;

    let mut mask = 0usize;
    let mut light = (0u32, 0u32, 0u32, 0u32); // r, g, b, count
    let mut dark = (0u32, 0u32, 0u32, 0u32);
    for (i, (&s, &l)) in samples.iter().zip(lumas.iter()).enumerate() {
        if l > mean {
            mask |= 1 << (3 - i);
            light = (
                light.0 + s.r as u32,
                light.1 + s.g as u32,
                light.2 + s.b as u32,
                light.3 + 1,
            );
        } else {
            dark = (
                dark.0 + s.r as u32,
                dark.1 + s.g as u32,
                dark.2 + s.b as u32,
                dark.3 + 1,
            );
        }
    }

    let fg = if light.3 > 0 {
        Rgb::new(
            (light.0 / light.3) as u8,
            (light.1 / light.3) as u8,
            (light.2 / light.3) as u8,
        )
    } else {
        Rgb::WHITE
    };
    let bg = if dark.3 > 0 {
        Rgb::new(
            (dark.0 / dark.3) as u8,
            (dark.1 / dark.3) as u8,
            (dark.2 / dark.3) as u8,
        )
    } else {
        Rgb::BLACK
    };

    Cell::new(QUADRANT_GLYPHS[mask], fg, bg)
}

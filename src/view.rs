//! Zoom/pan view state and terminal-cell to source-pixel mapping.
//!
//! The viewport is the sub-rectangle of the captured frame currently
//! visible. Its size is `frame / zoom`; its position is derived from the
//! normalized pan center every time it is needed, never stored, so zoom
//! changes cannot make it drift out of bounds.

/// An RGB color sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Zoom level above which samples are averaged over a small neighborhood
/// to anti-alias magnified pixels.
pub const AVERAGING_ZOOM_THRESHOLD: f32 = 3.0;

/// Neighborhood radius used for high-zoom averaging (a 3x3 window).
pub const AVERAGING_RADIUS: i64 = 1;

/// Default pan step as a fraction of the pan range per arrow key press.
pub const PAN_STEP: f32 = 0.05;

/// Default zoom step per key press.
pub const ZOOM_STEP: f32 = 0.5;

/// Current zoom level and pan center.
///
/// `pan_x`/`pan_y` are the normalized center of the visible viewport
/// within the captured frame, both clamped to `[0, 1]`. Zoom is clamped
/// to `[1.0, max_zoom]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    zoom: f32,
    pan_x: f32,
    pan_y: f32,
    max_zoom: f32,
}

impl ViewState {
    /// Create a view at zoom 1.0, centered.
    pub fn new(max_zoom: f32) -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.5,
            pan_y: 0.5,
            max_zoom: max_zoom.max(1.0),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan_x(&self) -> f32 {
        self.pan_x
    }

    pub fn pan_y(&self) -> f32 {
        self.pan_y
    }

    pub fn max_zoom(&self) -> f32 {
        self.max_zoom
    }

    /// Adjust zoom by `delta`, clamping to `[1.0, max_zoom]`.
    pub fn adjust_zoom(&mut self, delta: f32) {
        self.zoom = (self.zoom + delta).clamp(1.0, self.max_zoom);
    }

    /// Adjust the pan center by normalized deltas, clamping to `[0, 1]`.
    pub fn adjust_pan(&mut self, dx: f32, dy: f32) {
        self.pan_x = (self.pan_x + dx).clamp(0.0, 1.0);
        self.pan_y = (self.pan_y + dy).clamp(0.0, 1.0);
    }

    /// Reset to zoom 1.0 with a centered viewport.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan_x = 0.5;
        self.pan_y = 0.5;
    }
}

/// A borrowed view over one complete frame's pixel data.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
}

impl<'a> FrameView<'a> {
    /// Wrap raw row-major packed pixel data. `data` must hold at least
    /// `width * height * bytes_per_pixel` bytes.
    pub fn new(data: &'a [u8], width: u32, height: u32, bytes_per_pixel: usize) -> Self {
        debug_assert!(data.len() >= width as usize * height as usize * bytes_per_pixel);
        Self {
            data,
            width,
            height,
            bytes_per_pixel,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Read the pixel at (x, y). Coordinates must be in bounds.
    fn pixel(&self, x: u32, y: u32) -> Rgb {
        let idx = (y as usize * self.width as usize + x as usize) * self.bytes_per_pixel;
        Rgb {
            r: self.data[idx],
            g: self.data[idx + 1],
            b: self.data[idx + 2],
        }
    }
}

/// Map a terminal cell to a source coordinate under the current view.
///
/// Returns the clamped `(src_x, src_y)` for the top-left-of-cell sample
/// point. The viewport is `frame / zoom` pixels, positioned so its center
/// tracks the pan fractions; at zoom 1.0 the origin is 0 and the full
/// frame maps onto the terminal grid.
pub fn map_cell(
    view: &ViewState,
    cell_x: u16,
    cell_y: u16,
    term_w: u16,
    term_h: u16,
    frame_w: u32,
    frame_h: u32,
) -> (u32, u32) {
    let view_w = frame_w as f32 / view.zoom();
    let view_h = frame_h as f32 / view.zoom();
    let origin_x = (frame_w as f32 - view_w) * view.pan_x();
    let origin_y = (frame_h as f32 - view_h) * view.pan_y();

    let src_x = origin_x + (cell_x as f32 / term_w.max(1) as f32) * view_w;
    let src_y = origin_y + (cell_y as f32 / term_h.max(1) as f32) * view_h;

    (
        (src_x.floor() as i64).clamp(0, frame_w as i64 - 1) as u32,
        (src_y.floor() as i64).clamp(0, frame_h as i64 - 1) as u32,
    )
}

/// Sample the frame color for one terminal cell.
///
/// Below [`AVERAGING_ZOOM_THRESHOLD`] this is a single pixel read. Above
/// it, a `(2r+1) x (2r+1)` neighborhood around the mapped coordinate is
/// averaged, each neighbor clamped to the frame bounds independently.
pub fn sample(
    frame: &FrameView,
    view: &ViewState,
    cell_x: u16,
    cell_y: u16,
    term_w: u16,
    term_h: u16,
) -> Rgb {
    let (sx, sy) = map_cell(
        view,
        cell_x,
        cell_y,
        term_w,
        term_h,
        frame.width(),
        frame.height(),
    );

    if view.zoom() <= AVERAGING_ZOOM_THRESHOLD {
        return frame.pixel(sx, sy);
    }

    let mut r = 0u32;
    let mut g = 0u32;
    let mut b = 0u32;
    let mut count = 0u32;
    for dy in -AVERAGING_RADIUS..=AVERAGING_RADIUS {
        for dx in -AVERAGING_RADIUS..=AVERAGING_RADIUS {
            let nx = (sx as i64 + dx).clamp(0, frame.width() as i64 - 1) as u32;
            let ny = (sy as i64 + dy).clamp(0, frame.height() as i64 - 1) as u32;
            let p = frame.pixel(nx, ny);
            r += p.r as u32;
            g += p.g as u32;
            b += p.b as u32;
            count += 1;
        }
    }
    Rgb {
        r: (r / count) as u8,
        g: (g / count) as u8,
        b: (b / count) as u8,
    }
}

/// Sample four sub-cell colors for quadrant encoding.
///
/// Samples at twice the cell density, one per quadrant, in the order
/// top-left, top-right, bottom-left, bottom-right.
pub fn sample_quadrants(
    frame: &FrameView,
    view: &ViewState,
    cell_x: u16,
    cell_y: u16,
    term_w: u16,
    term_h: u16,
) -> [Rgb; 4] {
    let w2 = term_w.saturating_mul(2);
    let h2 = term_h.saturating_mul(2);
    let x2 = cell_x * 2;
    let y2 = cell_y * 2;
    [
        sample(frame, view, x2, y2, w2, h2),
        sample(frame, view, x2 + 1, y2, w2, h2),
        sample(frame, view, x2, y2 + 1, w2, h2),
        sample(frame, view, x2 + 1, y2 + 1, w2, h2),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A frame where each pixel encodes its own coordinates:
    /// r = x, g = y, b = 0.
    fn coord_frame(width: u32, height: u32) -> Vec<u8> {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(x as u8);
                data.push(y as u8);
                data.push(0);
            }
        }
        data
    }

    #[test]
    fn test_view_state_zoom_clamped() {
        let mut view = ViewState::new(8.0);
        view.adjust_zoom(-3.0);
        assert_eq!(view.zoom(), 1.0);
        view.adjust_zoom(100.0);
        assert_eq!(view.zoom(), 8.0);
    }

    #[test]
    fn test_view_state_pan_clamped() {
        let mut view = ViewState::new(8.0);
        view.adjust_pan(-2.0, 2.0);
        assert_eq!(view.pan_x(), 0.0);
        assert_eq!(view.pan_y(), 1.0);
    }

    #[test]
    fn test_view_state_reset() {
        let mut view = ViewState::new(8.0);
        view.adjust_zoom(4.0);
        view.adjust_pan(0.3, -0.2);
        view.reset();
        assert_eq!(view.zoom(), 1.0);
        assert_eq!(view.pan_x(), 0.5);
        assert_eq!(view.pan_y(), 0.5);
    }

    #[test]
    fn test_identity_mapping_at_zoom_one() {
        // At zoom 1 the full frame maps onto the terminal grid:
        // monotonic in both axes, always in bounds.
        let view = ViewState::new(8.0);
        let (fw, fh) = (64u32, 48u32);
        let (tw, th) = (32u16, 24u16);

        let mut last_x = 0;
        for cx in 0..tw {
            let (sx, sy) = map_cell(&view, cx, 0, tw, th, fw, fh);
            assert!(sx < fw && sy < fh);
            assert!(sx >= last_x, "mapping must be monotonic in x");
            last_x = sx;
        }
        // Extremes cover the frame edges.
        assert_eq!(map_cell(&view, 0, 0, tw, th, fw, fh), (0, 0));
        let (sx, sy) = map_cell(&view, tw - 1, th - 1, tw, th, fw, fh);
        assert_eq!(sx, fw - fw / tw as u32);
        assert_eq!(sy, fh - fh / th as u32);
    }

    #[test]
    fn test_mapping_always_clamped_in_bounds() {
        let (fw, fh) = (100u32, 80u32);
        let (tw, th) = (80u16, 24u16);
        for &zoom in &[1.0f32, 1.7, 2.5, 4.0, 8.0] {
            for &(px, py) in &[(0.0f32, 0.0f32), (1.0, 1.0), (0.25, 0.9), (0.5, 0.5)] {
                let mut view = ViewState::new(8.0);
                view.adjust_zoom(zoom - 1.0);
                view.adjust_pan(px - 0.5, py - 0.5);
                for cy in 0..th {
                    for cx in 0..tw {
                        let (sx, sy) = map_cell(&view, cx, cy, tw, th, fw, fh);
                        assert!(sx < fw, "src_x {} out of range at zoom {}", sx, zoom);
                        assert!(sy < fh, "src_y {} out of range at zoom {}", sy, zoom);
                    }
                }
            }
        }
    }

    #[test]
    fn test_zoom_narrows_viewport_around_center() {
        let view1 = ViewState::new(8.0);
        let mut view2 = ViewState::new(8.0);
        view2.adjust_zoom(1.0); // zoom = 2.0

        let (fw, fh) = (128u32, 96u32);
        let (tw, th) = (16u16, 12u16);

        let (x1, _) = map_cell(&view1, 0, 0, tw, th, fw, fh);
        let (x2, _) = map_cell(&view2, 0, 0, tw, th, fw, fh);
        // Zoomed-in viewport starts inside the frame, not at its edge.
        assert_eq!(x1, 0);
        assert_eq!(x2, 32); // (128 - 64) * 0.5
    }

    #[test]
    fn test_sample_single_pixel_below_threshold() {
        let data = coord_frame(16, 16);
        let frame = FrameView::new(&data, 16, 16, 3);
        let view = ViewState::new(8.0);
        let c = sample(&frame, &view, 4, 4, 16, 16);
        assert_eq!((c.r, c.g), (4, 4));
    }

    #[test]
    fn test_sample_averages_above_threshold() {
        // Uniform frame with one bright pixel: the 3x3 average at high
        // zoom must differ from the raw center read.
        let mut data = vec![0u8; 16 * 16 * 3];
        let center = (8 * 16 + 8) * 3;
        data[center] = 90;
        let frame = FrameView::new(&data, 16, 16, 3);

        let mut view = ViewState::new(8.0);
        view.adjust_zoom(3.0); // zoom = 4.0 > threshold
        // Cell that maps onto the bright pixel: at zoom 4 the viewport is
        // 4x4 starting at (6,6), so cell (8,8) of a 16x16 grid lands on (8,8).
        let c = sample(&frame, &view, 8, 8, 16, 16);
        assert_eq!(c.r, 10); // 90 / 9
    }

    #[test]
    fn test_neighborhood_clamps_at_frame_edges() {
        let data = coord_frame(8, 8);
        let frame = FrameView::new(&data, 8, 8, 3);
        let mut view = ViewState::new(8.0);
        view.adjust_zoom(7.0);
        view.adjust_pan(-0.5, -0.5); // pan to top-left corner
        // Must not panic: neighbors off the edge clamp independently.
        let _ = sample(&frame, &view, 0, 0, 8, 8);
    }

    #[test]
    fn test_quadrant_samples_are_ordered() {
        let data = coord_frame(32, 32);
        let frame = FrameView::new(&data, 32, 32, 3);
        let view = ViewState::new(8.0);
        let q = sample_quadrants(&frame, &view, 4, 4, 16, 16);
        // Left column samples sit left of right column samples.
        assert!(q[0].r <= q[1].r);
        assert!(q[2].r <= q[3].r);
        // Top row samples sit above bottom row samples.
        assert!(q[0].g <= q[2].g);
        assert!(q[1].g <= q[3].g);
    }
}

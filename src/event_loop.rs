//! Async event loop for concurrent handling of terminal, capture, and
//! rendering.
//!
//! Three concerns run concurrently under `tokio::select!`:
//! 1. Terminal events (keyboard input, resize) via crossterm EventStream
//! 2. Capture subprocess output via tokio channel from the reader thread
//! 3. A render tick (~30 FPS) and a restart poll for debounced capture
//!    resolution changes
//!
//! The loop exits when the user quits, a Ctrl+C arrives on the signal
//! handler, or the capture subprocess dies.

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::capture::{CaptureController, CaptureEvent};
use crate::frame::FrameAssembler;
use crate::input::{handle_key_event, KeyAction};
use crate::render::{compose, overlay_status, DiffRenderer, DisplayMode};
use crate::view::{FrameView, ViewState, PAN_STEP, ZOOM_STEP};

/// Render cadence. Capture frames arrive faster than this; the latest
/// complete frame wins.
const RENDER_INTERVAL: Duration = Duration::from_millis(33);

/// How often the debounce deadline is polled.
const RESTART_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Frames-per-second estimate over a sliding one-second window.
pub struct FpsCounter {
    frames: u32,
    window_start: Instant,
    fps: f32,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            frames: 0,
            window_start: now,
            fps: 0.0,
        }
    }

    /// Record one completed frame.
    pub fn frame(&mut self, now: Instant) {
        self.frames += 1;
        let elapsed = now.duration_since(self.window_start);
        if elapsed >= Duration::from_secs(1) {
            self.fps = self.frames as f32 / elapsed.as_secs_f32();
            self.frames = 0;
            self.window_start = now;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

/// Runtime options carried into the loop.
pub struct LoopOptions {
    pub mode: DisplayMode,
    pub status_bar: bool,
}

/// The last fully assembled frame, with the geometry it was captured at.
///
/// Geometry is kept here rather than read from the controller: after a
/// resolution restart the controller already describes the new process
/// while this frame still has the old dimensions, and it must keep
/// rendering correctly until the first new frame replaces it.
struct LastFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
}

fn make_renderer(status_bar: bool) -> DiffRenderer {
    if status_bar {
        DiffRenderer::new().with_overlay_rows(vec![0])
    } else {
        DiffRenderer::new()
    }
}

fn status_text(
    mode: DisplayMode,
    view: &ViewState,
    capture_w: u32,
    capture_h: u32,
    fps: f32,
) -> String {
    format!(
        " {} | zoom {:.1}x | pan ({:+.2},{:+.2}) | {}x{} | {:.0} fps | 1-7 mode +/- zoom arrows pan 0 reset q quit",
        mode.name(),
        view.zoom(),
        view.pan_x(),
        view.pan_y(),
        capture_w,
        capture_h,
        fps,
    )
}

/// Run the viewer until quit or capture failure.
///
/// `running` is cleared by the Ctrl+C signal handler; the loop polls it
/// on every tick so an interrupt delivered outside the raw-mode event
/// stream still stops the viewer.
pub async fn run(
    controller: &mut CaptureController,
    capture_rx: &mut mpsc::Receiver<CaptureEvent>,
    view: &mut ViewState,
    options: LoopOptions,
    running: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut stdout = std::io::stdout();
    let mut event_stream = EventStream::new();

    let mut mode = options.mode;
    let mut status_bar = options.status_bar;
    let mut renderer = make_renderer(status_bar);

    let mut render_interval = tokio::time::interval(RENDER_INTERVAL);
    render_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut restart_interval = tokio::time::interval(RESTART_POLL_INTERVAL);
    restart_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let (mut term_cols, mut term_rows) = crossterm::terminal::size().unwrap_or((80, 24));

    // Assembler geometry tracks the process being fed, not the frame
    // being displayed.
    let active = controller.active_config().clone();
    let mut assembler = FrameAssembler::new(active.frame_size());
    let (mut feed_w, mut feed_h) = (active.width, active.height);
    let mut feed_bpp = active.pixel_format.bytes_per_pixel();

    let mut last_frame: Option<LastFrame> = None;
    let mut fps = FpsCounter::new(Instant::now());

    loop {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        tokio::select! {
            // Keyboard input and terminal resize
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        match handle_key_event(key_event) {
                            KeyAction::SetMode(m) => mode = m,
                            KeyAction::ZoomIn => {
                                view.adjust_zoom(ZOOM_STEP);
                                controller.request_zoom(view.zoom(), Instant::now());
                            }
                            KeyAction::ZoomOut => {
                                view.adjust_zoom(-ZOOM_STEP);
                                controller.request_zoom(view.zoom(), Instant::now());
                            }
                            KeyAction::PanLeft => view.adjust_pan(-PAN_STEP, 0.0),
                            KeyAction::PanRight => view.adjust_pan(PAN_STEP, 0.0),
                            KeyAction::PanUp => view.adjust_pan(0.0, -PAN_STEP),
                            KeyAction::PanDown => view.adjust_pan(0.0, PAN_STEP),
                            KeyAction::ResetView => {
                                view.reset();
                                controller.request_zoom(view.zoom(), Instant::now());
                            }
                            KeyAction::ToggleStatus => {
                                status_bar = !status_bar;
                                renderer = make_renderer(status_bar);
                            }
                            KeyAction::Quit => break,
                            KeyAction::None => {}
                        }
                    }
                    Some(Ok(Event::Resize(cols, rows))) => {
                        term_cols = cols;
                        term_rows = rows;
                        // Grid dimensions changed; the renderer repaints
                        // fully on its own when it sees the new size.
                    }
                    Some(Ok(_)) => {
                        // Ignore other events (mouse, focus, etc.)
                    }
                    Some(Err(e)) => {
                        return Err(Box::new(e));
                    }
                    None => break,
                }
            }

            // Raw bytes from the capture subprocess
            maybe_data = capture_rx.recv() => {
                match maybe_data {
                    Some(CaptureEvent::Data { generation, bytes }) => {
                        if generation != controller.generation() {
                            // A replaced process still draining its pipe.
                            continue;
                        }
                        let (w, h, bpp) = (feed_w, feed_h, feed_bpp);
                        assembler.feed(&bytes, |frame| {
                            last_frame = Some(LastFrame {
                                data: frame.to_vec(),
                                width: w,
                                height: h,
                                bytes_per_pixel: bpp,
                            });
                            fps.frame(Instant::now());
                        });
                    }
                    Some(CaptureEvent::Eof { generation }) => {
                        if let Some(err) = controller.handle_eof(generation) {
                            return Err(Box::new(err));
                        }
                    }
                    None => break,
                }
            }

            // Render the latest complete frame
            _ = render_interval.tick() => {
                if let Some(ref frame) = last_frame {
                    let frame_view = FrameView::new(
                        &frame.data,
                        frame.width,
                        frame.height,
                        frame.bytes_per_pixel,
                    );
                    let mut grid = compose(&frame_view, view, mode, term_cols, term_rows);
                    if status_bar {
                        let cfg = controller.active_config();
                        overlay_status(
                            &mut grid,
                            &status_text(mode, view, cfg.width, cfg.height, fps.fps()),
                        );
                    }
                    // A failed write leaves stale cells; the next diff
                    // against the committed grid repairs them.
                    if let Err(e) = renderer.render(&grid, &mut stdout) {
                        log::warn!("render failed: {}", e);
                        renderer.invalidate();
                    }
                }
            }

            // Commit debounced capture restarts
            _ = restart_interval.tick() => {
                if let Some(config) = controller.take_due_restart(Instant::now()) {
                    assembler.reset(config.frame_size());
                    feed_w = config.width;
                    feed_h = config.height;
                    feed_bpp = config.pixel_format.bytes_per_pixel();
                    controller.respawn()?;
                    // last_frame stays: the old frame keeps rendering at
                    // its own geometry until the new stream delivers.
                }
            }
        }
    }

    Ok(())
}

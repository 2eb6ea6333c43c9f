//! Video capture via an external ffmpeg subprocess.
//!
//! The subprocess streams raw packed pixels to stdout; resolution is
//! picked from the zoom level through a tier table, and tier changes
//! restart the subprocess after a debounce window. Every subprocess
//! carries a generation id so output from a replaced instance can be
//! told apart from the current one.

mod config;
mod controller;
mod process;
mod tiers;

pub use config::{CaptureConfig, PixelFormat};
pub use controller::{CaptureController, CaptureState};
pub use process::{CaptureEvent, CaptureProcess};
pub use tiers::{ResolutionTier, ZoomTiers};

use thiserror::Error;

/// Errors from the capture subsystem.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The capture tool binary was not found on disk or in PATH.
    #[error("Capture tool not found at '{path}'. Install ffmpeg or pass --ffmpeg-path")]
    ToolNotFound { path: String },

    /// The subprocess could not be spawned for another reason.
    #[error("Failed to start capture process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// The subprocess exited while it was supposed to be streaming.
    #[error("Capture process exited unexpectedly (exit code {code:?})")]
    ProcessExited { code: Option<i32> },
}

//! Capture subprocess configuration and ffmpeg argument construction.

use std::fmt;
use std::str::FromStr;

/// Raw packed pixel format requested from the capture subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 24-bit packed RGB, 3 bytes per pixel.
    #[default]
    Rgb24,
    /// 32-bit RGB with alpha, 4 bytes per pixel.
    Rgba,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb24 => 3,
            PixelFormat::Rgba => 4,
        }
    }

    /// The ffmpeg `-pix_fmt` name.
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Rgba => "rgba",
        }
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rgb24" | "rgb" => Ok(PixelFormat::Rgb24),
            "rgba" => Ok(PixelFormat::Rgba),
            other => Err(format!(
                "Unknown pixel format '{}'. Supported: rgb24, rgba",
                other
            )),
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ffmpeg_name())
    }
}

/// Everything needed to spawn one capture subprocess instance.
///
/// Owned exclusively by the capture controller; recomputed from the zoom
/// level's resolution tier on restart, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Device index as reported by device enumeration.
    pub device_index: u32,
    pub width: u32,
    pub height: u32,
    /// Frame rate requested from the device.
    pub fps_in: u32,
    /// Frame rate emitted on the raw stream.
    pub fps_out: u32,
    pub pixel_format: PixelFormat,
    /// Horizontally flip the image (selfie view).
    pub mirror: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: 640,
            height: 480,
            fps_in: 30,
            fps_out: 30,
            pixel_format: PixelFormat::Rgb24,
            mirror: false,
        }
    }
}

impl CaptureConfig {
    /// Size in bytes of one complete frame on the raw stream.
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * self.pixel_format.bytes_per_pixel()
    }

    /// Derive the config for a different capture resolution.
    pub fn with_resolution(&self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self.clone()
        }
    }

    /// Build the ffmpeg argument list for this configuration.
    ///
    /// The subprocess reads the avfoundation device and writes raw packed
    /// pixels to stdout; diagnostics go to stderr.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            "avfoundation".to_string(),
            "-framerate".to_string(),
            self.fps_in.to_string(),
            "-video_size".to_string(),
            format!("{}x{}", self.width, self.height),
            "-i".to_string(),
            self.device_index.to_string(),
        ];
        if self.mirror {
            args.push("-vf".to_string());
            args.push("hflip".to_string());
        }
        args.extend([
            "-r".to_string(),
            self.fps_out.to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            self.pixel_format.ffmpeg_name().to_string(),
            "-".to_string(),
        ]);
        args
    }
}

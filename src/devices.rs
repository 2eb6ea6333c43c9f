//! Camera discovery via ffmpeg's AVFoundation device listing.
//!
//! ffmpeg prints the device table to stderr when asked to list devices.
//! Only the video section matters here; "Capture screen N" entries are
//! pseudo-devices for screen recording and are filtered out unless the
//! caller asks for everything.

use std::process::{Command, Stdio};

/// A video capture device as reported by AVFoundation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub index: u32,
    pub name: String,
}

impl Device {
    /// AVFoundation exposes each display as a "Capture screen N" entry
    /// alongside real cameras.
    pub fn is_screen(&self) -> bool {
        self.name.starts_with("Capture screen")
    }
}

/// Run ffmpeg to enumerate AVFoundation video devices.
///
/// Returns cameras only; pass `include_screens` to keep the screen
/// capture pseudo-devices too.
pub fn list_video_devices(ffmpeg_path: &str, include_screens: bool) -> Result<Vec<Device>, String> {
    let output = Command::new(ffmpeg_path)
        .args(["-f", "avfoundation", "-list_devices", "true", "-i", ""])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output();

    let output = match output {
        Ok(o) => o,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(format!(
                    "Capture tool not found at '{}'. Install it with:\n\n    brew install ffmpeg\n",
                    ffmpeg_path
                ));
            }
            return Err(format!("Failed to run {}: {}", ffmpeg_path, e));
        }
    };

    // The listing goes to stderr; the command itself "fails" because the
    // empty input URL is invalid, so the exit status is not checked.
    let stderr = String::from_utf8_lossy(&output.stderr);
    let devices = parse_video_devices(&stderr);
    if include_screens {
        Ok(devices)
    } else {
        Ok(devices.into_iter().filter(|d| !d.is_screen()).collect())
    }
}

/// Parse the video section of ffmpeg's device listing output.
pub fn parse_video_devices(stderr: &str) -> Vec<Device> {
    let mut devices = Vec::new();
    let mut in_video_section = false;

    for line in stderr.lines() {
        if line.contains("AVFoundation video devices:") {
            in_video_section = true;
            continue;
        }
        if line.contains("AVFoundation audio devices:") {
            in_video_section = false;
            continue;
        }
        if in_video_section {
            if let Some(device) = parse_device_line(line) {
                devices.push(device);
            }
        }
    }

    devices
}

/// Parse one device entry of the form:
/// `[AVFoundation indev @ 0x...] [index] device name`
fn parse_device_line(line: &str) -> Option<Device> {
    let bracket_idx = line.find("] [")?;
    let after_bracket = &line[bracket_idx + 3..];

    let close_bracket = after_bracket.find(']')?;
    let index: u32 = after_bracket[..close_bracket].parse().ok()?;

    let name = after_bracket
        .get(close_bracket + 1..)?
        .trim_start_matches(' ')
        .trim()
        .to_string();
    if name.is_empty() {
        return None;
    }

    Some(Device { index, name })
}

/// Check that `index` names an actual camera, with a listing in the
/// error message when it does not.
pub fn validate_device(ffmpeg_path: &str, index: u32) -> Result<Device, String> {
    let devices = list_video_devices(ffmpeg_path, false)?;
    if let Some(device) = devices.iter().find(|d| d.index == index) {
        return Ok(device.clone());
    }
    let mut msg = format!("No camera at index {}. Available cameras:\n", index);
    if devices.is_empty() {
        msg.push_str("  (none found)\n");
    } else {
        for device in &devices {
            msg.push_str(&format!("  [{}] {}\n", device.index, device.name));
        }
    }
    Err(msg)
}

/// Print the camera list to stdout.
pub fn print_devices(devices: &[Device]) {
    println!("Cameras:");
    if devices.is_empty() {
        println!("  (none found)");
    } else {
        for device in devices {
            println!("  [{}] {}", device.index, device.name);
        }
    }
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use termlens::capture::{CaptureConfig, CaptureController, PixelFormat};
use termlens::config::Config;
use termlens::devices;
use termlens::event_loop::{self, LoopOptions};
use termlens::render::DisplayMode;
use termlens::terminal::TerminalGuard;
use termlens::view::ViewState;

/// Grace period between SIGINT and SIGKILL when stopping the subprocess.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Parse and validate zoom (1.0-8.0)
fn parse_zoom(s: &str) -> Result<f32, String> {
    let zoom: f32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !(1.0..=8.0).contains(&zoom) {
        return Err(format!("Zoom must be between 1.0 and 8.0, got {}", zoom));
    }
    Ok(zoom)
}

/// Parse and validate framerate (1-60 fps)
fn parse_framerate(s: &str) -> Result<u32, String> {
    let fps: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid framerate", s))?;
    if !(1..=60).contains(&fps) {
        return Err(format!("Framerate must be between 1 and 60 fps, got {}", fps));
    }
    Ok(fps)
}

/// Parse display mode name
fn parse_mode(s: &str) -> Result<DisplayMode, String> {
    DisplayMode::parse(s).ok_or_else(|| {
        format!(
            "Unknown mode '{}'. Available modes: pixels, blocks, shades, ascii, braille, dots, quadrant",
            s
        )
    })
}

/// Parse pixel format name
fn parse_pixel_format(s: &str) -> Result<PixelFormat, String> {
    s.parse()
}

/// termlens: Live camera viewer for the terminal
#[derive(Parser)]
#[command(name = "termlens")]
#[command(version, about = "Live camera viewer for the terminal")]
#[command(long_about = "Renders a live camera feed as colored characters in the terminal, \
    with zoom, pan, and several glyph styles. Capture resolution adapts to the zoom \
    level so zoomed-in views stay sharp.")]
#[command(after_help = "EXAMPLES:
    # View the default camera
    termlens

    # Second camera, braille glyphs, mirrored
    termlens start --device 1 --mode braille --mirror

    # Start zoomed in
    termlens start --zoom 2.5

    # List available cameras
    termlens list-devices

KEYS (while running):
    1-7     Display mode
    + / -   Zoom in / out
    Arrows  Pan
    0       Reset zoom and pan
    s       Toggle status bar
    q       Quit")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args, Default)]
struct StartArgs {
    /// Camera device index (see list-devices)
    #[arg(long, short = 'd')]
    device: Option<u32>,

    /// Initial zoom level (1.0-8.0)
    #[arg(long, short = 'z', value_parser = parse_zoom)]
    zoom: Option<f32>,

    /// Display mode (pixels, blocks, shades, ascii, braille, dots, quadrant)
    #[arg(long, short = 'm', value_parser = parse_mode)]
    mode: Option<DisplayMode>,

    /// Capture framerate (1-60 fps, default: 30)
    #[arg(long, short = 'f', value_parser = parse_framerate)]
    fps: Option<u32>,

    /// Raw pixel format from the capture tool (rgb24, rgba)
    #[arg(long, value_parser = parse_pixel_format)]
    pixel_format: Option<PixelFormat>,

    /// Mirror (horizontally flip) the camera
    #[arg(long)]
    mirror: bool,

    /// Hide the status bar
    #[arg(long)]
    no_status: bool,

    /// Path to the ffmpeg binary (default: ffmpeg from PATH)
    #[arg(long)]
    ffmpeg_path: Option<String>,

    /// Custom config file path (default: ~/.config/termlens/config.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// View the camera (default when no command is given)
    Start(StartArgs),

    /// List available cameras
    #[command(after_help = "EXAMPLES:
    termlens list-devices        # List cameras
    termlens list-devices --all  # Include screen capture pseudo-devices")]
    ListDevices {
        /// Include screen capture pseudo-devices
        #[arg(long)]
        all: bool,
    },
}

fn run_start(args: StartArgs) -> Result<(), String> {
    // Load config file.
    // If --config is specified, require the file to exist.
    // Otherwise, fall back to defaults if the default config is not found.
    let cfg = if let Some(ref path) = args.config {
        if !path.exists() {
            return Err(format!("Config file '{}' not found", path.display()));
        }
        Config::load(Some(path.as_path())).map_err(|e| e.to_string())?
    } else {
        match Config::load(None) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                eprintln!("Using default settings.\n");
                Config::default()
            }
        }
    };

    // Merge settings: CLI args > config file > built-in defaults
    let device = args.device.unwrap_or(cfg.capture.device);
    let fps = args.fps.unwrap_or(cfg.capture.fps);
    let mirror = args.mirror || cfg.capture.mirror;
    let ffmpeg_path = args
        .ffmpeg_path
        .unwrap_or_else(|| cfg.capture.ffmpeg_path.clone());
    let pixel_format = match args.pixel_format {
        Some(pf) => pf,
        None => cfg.capture.pixel_format.parse()?,
    };
    let mode = match args.mode {
        Some(m) => m,
        None => parse_mode(&cfg.render.mode)?,
    };
    let status_bar = !args.no_status && cfg.render.status_bar;
    let max_zoom = cfg.view.max_zoom.max(1.0);
    let initial_zoom = args.zoom.unwrap_or(cfg.view.zoom).clamp(1.0, max_zoom);

    // Validate the device before taking over the terminal, so errors
    // come out readable.
    let camera = devices::validate_device(&ffmpeg_path, device)?;
    log::info!("using camera [{}] {}", camera.index, camera.name);

    let base = CaptureConfig {
        device_index: device,
        fps_in: fps,
        fps_out: fps,
        pixel_format,
        mirror,
        ..CaptureConfig::default()
    };

    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    let mut controller = CaptureController::new(
        ffmpeg_path,
        base,
        cfg.zoom_tiers(),
        Duration::from_millis(cfg.capture.debounce_ms),
        SHUTDOWN_GRACE,
        tx,
    );

    let mut view = ViewState::new(max_zoom);
    view.adjust_zoom(initial_zoom - view.zoom());

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        }) {
            eprintln!("Warning: Could not set up Ctrl+C handler: {}", e);
        }
    }

    // Start capture before switching screens: a spawn failure here
    // prints a normal error instead of trashing the display.
    controller.start(view.zoom()).map_err(|e| e.to_string())?;

    let mut guard = TerminalGuard::enter().map_err(|e| {
        controller.shutdown();
        format!("Failed to set up terminal: {}", e)
    })?;

    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        controller.shutdown();
        let _ = guard.exit();
        format!("Failed to create async runtime: {}", e)
    })?;

    let result = rt.block_on(event_loop::run(
        &mut controller,
        &mut rx,
        &mut view,
        LoopOptions { mode, status_bar },
        running,
    ));

    // Ordered teardown: subprocess first, then the terminal, so any
    // capture diagnostics land on a restored screen.
    controller.shutdown();
    let _ = guard.exit();

    match result {
        Ok(()) => {
            println!("termlens stopped.");
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::ListDevices { all }) => {
            match devices::list_video_devices("ffmpeg", all) {
                Ok(list) => devices::print_devices(&list),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Start(args)) => {
            if let Err(e) = run_start(args) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            // Bare `termlens` starts the viewer with defaults.
            if let Err(e) = run_start(StartArgs::default()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

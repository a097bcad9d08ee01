// This is free and unencumbered software released into the public domain.

#[cfg(not(feature = "std"))]
compile_error!("asimov-hal-camera-snapshot requires the 'std' feature");

use asimov_hal_camera_module::{
    cli,
    shared::{
        CameraConfig, CameraError, CameraEvent, CameraFacing, CameraService, EncodingQuality,
        FocusPoint, RequestId, Size,
    },
};
use asimov_module::SysexitsError::{self, *};
use clap::Parser;
use clientele::StandardOptions;
use serde_json::{Value, json};
use std::{
    error::Error as StdError,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

#[derive(Debug, Parser)]
struct Options {
    #[clap(flatten)]
    flags: StandardOptions,

    /// Camera to open (`sim`, `sim:<name>`)
    #[arg(long, default_value = "sim")]
    device: String,

    /// Use the front-facing camera
    #[arg(long)]
    front: bool,

    #[arg(short, long = "size", value_parser = parse_dimensions)]
    size: Option<Size>,

    #[arg(short, long, value_enum)]
    quality: Option<Quality>,

    /// Focus point as X,Y in 0..1, origin at the top left
    #[arg(long, value_parser = parse_focus_point)]
    focus: Option<FocusPoint>,

    /// Gallery directory (default: $ASIMOV_HAL_CAMERA_GALLERY or ~/Pictures)
    #[arg(long)]
    gallery: Option<PathBuf>,

    /// Seconds to wait for the camera and for the saved image
    #[arg(long, default_value = "10")]
    timeout: u64,

    #[arg(
        value_name = "FORMAT",
        short = 'o',
        long = "output",
        value_enum,
        default_value = "text"
    )]
    output: OutputFormat,

    /// Output file or directory (default: the gallery)
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Jsonl,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Quality {
    VeryLow,
    Low,
    Normal,
    High,
    VeryHigh,
}

impl From<Quality> for EncodingQuality {
    fn from(q: Quality) -> Self {
        match q {
            Quality::VeryLow => Self::VeryLow,
            Quality::Low => Self::Low,
            Quality::Normal => Self::Normal,
            Quality::High => Self::High,
            Quality::VeryHigh => Self::VeryHigh,
        }
    }
}

pub fn main() -> Result<SysexitsError, Box<dyn StdError>> {
    asimov_module::dotenv().ok();
    let args = asimov_module::args_os()?;
    let options = Options::parse_from(args);

    if options.flags.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(EX_OK);
    }

    if options.flags.license {
        print!("{}", include_str!("../../UNLICENSE"));
        return Ok(EX_OK);
    }

    if asimov_module::init_tracing_subscriber(&options.flags).is_err() {
        eprintln!("WARN: failed to initialize logging");
    }

    let exit_code = match run_snapshot(&options) {
        Ok(()) => EX_OK,
        Err(err) => cli::handle_error(&err, &options.flags),
    };

    Ok(exit_code)
}

fn run_snapshot(opts: &Options) -> Result<(), CameraError> {
    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit2 = Arc::clone(&quit);
        ctrlc::set_handler(move || {
            quit2.store(true, Ordering::SeqCst);
        })
        .map_err(|e| CameraError::other(format!("{e}")))?;
    }

    let facing = if opts.front {
        CameraFacing::Front
    } else {
        CameraFacing::Back
    };
    let mut config = CameraConfig::new(facing).with_device(opts.device.clone());
    if let Some(dir) = &opts.gallery {
        config = config.with_gallery_dir(dir.clone());
    }
    cli::info_user(
        &opts.flags,
        &format!("opening {} ({facing:?} camera)", opts.device),
    );

    let driver = config.open_driver()?;
    let mut camera = CameraService::new(config);

    // Staged while detached; applied when the session comes up.
    if let Some(size) = opts.size {
        camera.set_size(size)?;
    }
    if let Some(point) = opts.focus {
        camera.set_custom_focus_point(point);
    }

    camera.attach(driver)?;
    if let Some(quality) = opts.quality {
        camera.set_quality(quality.into());
    }

    let deadline = Instant::now() + Duration::from_secs(opts.timeout);
    let tick = Duration::from_millis(50);

    while !camera.is_ready_for_capture() {
        if quit.load(Ordering::SeqCst) {
            cli::warn_user(&opts.flags, "interrupted before capture");
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(CameraError::NotReady);
        }
        camera.wait_and_dispatch(tick);
        drain_events(&camera, opts, None);
    }

    let path = opts.path.clone().unwrap_or_default();
    let request_id = camera.capture(&path);
    cli::info_user(&opts.flags, &format!("capture #{request_id} started"));

    loop {
        if let Some(result) = drain_events(&camera, opts, Some(request_id)) {
            return result;
        }
        if quit.load(Ordering::SeqCst) {
            cli::warn_user(&opts.flags, "interrupted while waiting for the image");
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(CameraError::other("timed out waiting for the captured image"));
        }
        camera.wait_and_dispatch(tick);
    }
}

/// Prints queued events. Returns the capture outcome once the event
/// resolving `request_id` has been seen.
fn drain_events(
    camera: &CameraService,
    opts: &Options,
    request_id: Option<RequestId>,
) -> Option<Result<(), CameraError>> {
    let mut outcome = None;

    while let Ok(event) = camera.events().try_recv() {
        print_event(&event, &opts.output);
        match event {
            CameraEvent::ImageSaved { request_id: id, .. } if Some(id) == request_id => {
                outcome = Some(Ok(()));
            },
            CameraEvent::Error {
                request_id: id,
                message,
                ..
            } if Some(id) == request_id => {
                outcome = Some(Err(CameraError::Other(message)));
            },
            _ => {},
        }
    }

    outcome
}

fn print_event(event: &CameraEvent, format: &OutputFormat) {
    match format {
        OutputFormat::Text => match event {
            CameraEvent::ImageSaved { request_id, path } => {
                println!("#{request_id} saved {}", path.display())
            },
            CameraEvent::Error {
                request_id,
                kind,
                message,
            } => println!("#{request_id} error ({kind:?}): {message}"),
            CameraEvent::ImageExposed { request_id } => println!("#{request_id} exposed"),
            CameraEvent::ImageCaptured { request_id, .. } => println!("#{request_id} captured"),
            _ => {},
        },
        OutputFormat::Jsonl => println!("{}", event_to_json(event)),
    }
}

fn event_to_json(event: &CameraEvent) -> Value {
    match event {
        CameraEvent::FocusPointChanged(p) => {
            json!({ "event": "focus_point_changed", "x": p.x, "y": p.y })
        },
        CameraEvent::FocusModeChanged(mode) => {
            json!({ "event": "focus_mode_changed", "mode": format!("{mode:?}") })
        },
        CameraEvent::FocusPointModeChanged(mode) => {
            json!({ "event": "focus_point_mode_changed", "mode": format!("{mode:?}") })
        },
        CameraEvent::ImageExposed { request_id } => {
            json!({ "event": "image_exposed", "request_id": request_id })
        },
        CameraEvent::ImageCaptured {
            request_id,
            preview,
        } => json!({
            "event": "image_captured",
            "request_id": request_id,
            "preview": preview.as_ref().map(|f| json!({ "width": f.width, "height": f.height })),
        }),
        CameraEvent::ImageSaved { request_id, path } => json!({
            "event": "image_saved",
            "request_id": request_id,
            "path": path.display().to_string(),
        }),
        CameraEvent::Error {
            request_id,
            kind,
            message,
        } => json!({
            "event": "error",
            "request_id": request_id,
            "kind": format!("{kind:?}"),
            "message": message,
        }),
        CameraEvent::ReadyForCaptureChanged(ready) => {
            json!({ "event": "ready_for_capture_changed", "ready": ready })
        },
    }
}

fn parse_dimensions(s: &str) -> Result<Size, String> {
    let s = s.trim().replace('×', "x");
    let Some((w, h)) = s.split_once('x') else {
        return Err(format!("Invalid format '{s}'. Use WxH (e.g., 1920x1080)"));
    };

    let width: u32 = w.trim().parse().map_err(|_| format!("Invalid width: {w}"))?;
    let height: u32 = h.trim().parse().map_err(|_| format!("Invalid height: {h}"))?;
    let size = Size::new(width, height);
    if !size.is_valid() {
        return Err(format!("Size {size} must be non-zero"));
    }
    Ok(size)
}

fn parse_focus_point(s: &str) -> Result<FocusPoint, String> {
    let Some((x, y)) = s.split_once(',') else {
        return Err(format!("Invalid focus point '{s}'. Use X,Y (e.g., 0.5,0.5)"));
    };
    let x: f64 = x.trim().parse().map_err(|_| format!("Invalid X: {x}"))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("Invalid Y: {y}"))?;
    if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
        return Err(format!("Focus point {x},{y} must lie within 0..1"));
    }
    Ok(FocusPoint { x, y })
}

use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use shapecam_core::capture::domain::media_devices::{FacingMode, MediaDevices, VideoConstraints};
use shapecam_core::capture::infrastructure::ffmpeg_camera::{CameraDevice, FfmpegMediaDevices};
use shapecam_core::capture::infrastructure::image_sequence_source::ImageSequenceDevices;
use shapecam_core::detection::domain::capability::Capability;
use shapecam_core::detection::domain::category::Category;
use shapecam_core::detection::infrastructure::onnx_face_detector::{
    FaceDetectorOptions, OnnxFaceDetector,
};
use shapecam_core::detection::infrastructure::qr_barcode_detector::QrBarcodeDetector;
use shapecam_core::detection::infrastructure::replay_detector::{ReplayDetector, ReplayRecording};
use shapecam_core::pump::pass_logger::StdoutPassLogger;
use shapecam_core::pump::pump_config::PumpConfig;
use shapecam_core::rendering::infrastructure::png_sequence::PngSequenceWriter;
use shapecam_core::rendering::infrastructure::raster_surface::RasterSurface;
use shapecam_core::shared::constants::{DEFAULT_SEQUENCE_FPS, FACE_MODEL_NAME, FACE_MODEL_URL};
use shapecam_core::shared::model_resolver;
use shapecam_core::startup::fallback_view::LogFallbackView;
use shapecam_core::startup::session::{Session, StartupOutcome};

const DEFAULT_DEVICE: &str = "/dev/video0";

/// Surface size used until the first frame sets the real resolution.
const INITIAL_SURFACE_SIZE: (u32, u32) = (640, 480);

/// Live face, text and barcode overlays on a camera feed.
#[derive(Parser)]
#[command(name = "shapecam")]
struct Cli {
    /// Camera device as `<path>[@user|environment]` (repeatable).
    #[arg(long = "device")]
    devices: Vec<CameraDevice>,

    /// Video file or image directory to use instead of a camera.
    #[arg(long, conflicts_with = "devices")]
    input: Option<PathBuf>,

    /// Write every annotated frame as a PNG into this directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Capabilities that must be available (comma-separated). Text
    /// detection has no local backend and requires --replay.
    #[arg(long, value_delimiter = ',', default_value = "face,barcode")]
    detect: Vec<Category>,

    /// Preferred camera direction: user or environment.
    #[arg(long)]
    facing: Option<FacingMode>,

    /// Ticks per second driving the detection loop.
    #[arg(long, default_value = "60")]
    refresh_rate: f64,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.25")]
    confidence: f64,

    /// Use full-size letterboxing for face detection.
    #[arg(long)]
    no_fast_mode: bool,

    /// Replay recorded detections from a JSON file instead of running detectors.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Stop after this many seconds (default: until Ctrl+C).
    #[arg(long)]
    duration: Option<f64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = PumpConfig {
        capabilities: cli.detect.clone(),
        refresh_rate_hz: cli.refresh_rate,
        constraints: cli
            .facing
            .map_or(VideoConstraints::Any, VideoConstraints::Facing),
        ..PumpConfig::default()
    };
    config.validate()?;

    let capabilities = build_capabilities(&cli)?;
    let mut devices = build_devices(&cli);
    let surface = build_surface(cli.output_dir.as_deref())?;
    let mut view = LogFallbackView::new();

    let tick_interval = config.tick_interval()?;
    let mut session = Session::new(config).with_logger(Box::new(StdoutPassLogger::default()));
    let mut pump = match session.start(capabilities, devices.as_mut(), &mut view, Box::new(surface))? {
        StartupOutcome::Active(pump) => pump,
        StartupOutcome::Fallback(missing) => {
            let names: Vec<_> = missing.iter().map(|c| c.name()).collect();
            log::warn!("Not starting: missing {}", names.join(", "));
            return Ok(());
        }
    };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))?;
    }
    if let Some(seconds) = cli.duration {
        let stop = Arc::clone(&stop);
        std::thread::Builder::new()
            .name("duration".into())
            .spawn(move || {
                std::thread::sleep(Duration::from_secs_f64(seconds));
                stop.store(true, Ordering::SeqCst);
            })?;
    }

    let ticks = crossbeam_channel::tick(tick_interval);
    let stats = pump.run(&ticks, &stop)?;
    log::info!("Stopped: {stats}");
    if let Some(dir) = &cli.output_dir {
        log::info!("Frames written to {}", dir.display());
    }
    Ok(())
}

/// Builds every capability this host can offer. A capability that fails to
/// initialise is left out so the startup probe can report it.
fn build_capabilities(cli: &Cli) -> Result<Vec<Capability>, Box<dyn std::error::Error>> {
    if let Some(path) = &cli.replay {
        let recording = Arc::new(ReplayRecording::load(path)?);
        log::info!("Replaying {} recorded passes from {}", recording.len(), path.display());
        return Ok(cli
            .detect
            .iter()
            .map(|category| replay_capability(*category, &recording))
            .collect());
    }

    let mut capabilities = Vec::new();
    if cli.detect.contains(&Category::Face) {
        match build_face_detector(cli) {
            Ok(detector) => capabilities.push(Capability::Face(Box::new(detector))),
            Err(e) => log::warn!("Face detection unavailable: {e}"),
        }
    }
    if cli.detect.contains(&Category::Barcode) {
        capabilities.push(Capability::Barcode(Box::new(QrBarcodeDetector::new())));
    }
    if cli.detect.contains(&Category::Text) {
        log::warn!("Text detection is only available with --replay");
    }
    Ok(capabilities)
}

fn replay_capability(category: Category, recording: &Arc<ReplayRecording>) -> Capability {
    let detector = ReplayDetector::new(Arc::clone(recording));
    match category {
        Category::Face => Capability::Face(Box::new(detector)),
        Category::Text => Capability::Text(Box::new(detector)),
        Category::Barcode => Capability::Barcode(Box::new(detector)),
    }
}

fn build_face_detector(cli: &Cli) -> Result<OnnxFaceDetector, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {FACE_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        FACE_MODEL_NAME,
        FACE_MODEL_URL,
        None,
        Some(Box::new(download_progress)),
    )?;
    eprintln!();

    let options = FaceDetectorOptions {
        fast_mode: !cli.no_fast_mode,
        confidence: cli.confidence,
        ..FaceDetectorOptions::default()
    };
    Ok(OnnxFaceDetector::new(&model_path, options)?)
}

fn build_devices(cli: &Cli) -> Box<dyn MediaDevices> {
    match &cli.input {
        Some(input) if input.is_dir() => {
            Box::new(ImageSequenceDevices::new(input, DEFAULT_SEQUENCE_FPS))
        }
        Some(input) => Box::new(FfmpegMediaDevices::new(vec![CameraDevice::new(input)])),
        None if cli.devices.is_empty() => Box::new(FfmpegMediaDevices::new(vec![
            CameraDevice::new(DEFAULT_DEVICE).with_format("v4l2"),
        ])),
        None => Box::new(FfmpegMediaDevices::new(cli.devices.clone())),
    }
}

fn build_surface(output_dir: Option<&Path>) -> Result<RasterSurface, Box<dyn std::error::Error>> {
    let (width, height) = INITIAL_SURFACE_SIZE;
    let surface = RasterSurface::new(width, height);
    Ok(match output_dir {
        Some(dir) => surface.with_writer(PngSequenceWriter::create(dir)?),
        None => surface,
    })
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(input) = &cli.input {
        if !input.exists() {
            return Err(format!("Input not found: {}", input.display()).into());
        }
    }
    if let Some(replay) = &cli.replay {
        if !replay.is_file() {
            return Err(format!("Replay file not found: {}", replay.display()).into());
        }
    }
    if cli.detect.is_empty() {
        return Err("--detect needs at least one of: face, text, barcode".into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if !cli.refresh_rate.is_finite() || cli.refresh_rate <= 0.0 {
        return Err(format!("Refresh rate must be positive, got {}", cli.refresh_rate).into());
    }
    if let Some(seconds) = cli.duration {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(format!("Duration must be positive, got {seconds}").into());
        }
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::capture::domain::media_devices::{
    CaptureError, FacingMode, MediaDevices, VideoConstraints,
};
use crate::capture::domain::video_source::VideoSource;
use crate::shared::frame::Frame;

const PAUSE_POLL: Duration = Duration::from_millis(10);

/// A camera the host can open: a capture device node or a video file.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraDevice {
    pub path: PathBuf,
    pub facing: Option<FacingMode>,
    /// libavdevice input format (e.g. `v4l2`). `None` opens `path` as a file.
    pub format: Option<String>,
}

impl CameraDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            facing: None,
            format: None,
        }
    }

    pub fn with_facing(mut self, facing: FacingMode) -> Self {
        self.facing = Some(facing);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    fn is_live(&self) -> bool {
        self.format.is_some()
    }
}

/// Parses `<path>[@<facing>]`. Paths under `/dev/` are opened with `v4l2`.
impl FromStr for CameraDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, facing) = match s.rsplit_once('@') {
            Some((path, facing)) => (path, Some(facing.parse::<FacingMode>()?)),
            None => (s, None),
        };
        if path.is_empty() {
            return Err(format!("empty device path in '{s}'"));
        }
        let mut device = CameraDevice::new(path);
        device.facing = facing;
        if path.starts_with("/dev/") {
            device = device.with_format("v4l2");
        }
        Ok(device)
    }
}

/// [`MediaDevices`] over a fixed list of ffmpeg-readable cameras.
pub struct FfmpegMediaDevices {
    devices: Vec<CameraDevice>,
}

impl FfmpegMediaDevices {
    pub fn new(devices: Vec<CameraDevice>) -> Self {
        Self { devices }
    }

    /// Picks the first device matching the constraints; a facing hint that
    /// nothing matches falls back to the first device.
    pub fn select(&self, constraints: &VideoConstraints) -> Option<&CameraDevice> {
        match constraints {
            VideoConstraints::Any => self.devices.first(),
            VideoConstraints::Facing(mode) => self
                .devices
                .iter()
                .find(|d| d.facing == Some(*mode))
                .or_else(|| self.devices.first()),
        }
    }
}

impl MediaDevices for FfmpegMediaDevices {
    fn get_user_media(
        &mut self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoSource>, CaptureError> {
        let device = self
            .select(constraints)
            .ok_or(CaptureError::NotFound(*constraints))?;
        log::info!("opening camera {}", device.path.display());
        Ok(Box::new(FfmpegCamera::open(device)?))
    }
}

#[derive(Default)]
struct CameraState {
    latest: Mutex<Option<Arc<Frame>>>,
    paused: AtomicBool,
    ended: AtomicBool,
    stop: AtomicBool,
}

/// Pauses and resumes a running [`FfmpegCamera`] from any thread.
#[cfg(test)]
#[derive(Clone)]
pub(crate) struct PlaybackHandle {
    state: Arc<CameraState>,
}

#[cfg(test)]
impl PlaybackHandle {
    pub(crate) fn pause(&self) {
        self.state.paused.store(true, Ordering::SeqCst);
    }

    pub(crate) fn resume(&self) {
        self.state.paused.store(false, Ordering::SeqCst);
    }
}

/// Camera backed by ffmpeg-next. A decode thread keeps the newest RGB frame.
///
/// File sources are paced at the stream's frame rate and report paused once
/// the stream ends.
pub struct FfmpegCamera {
    state: Arc<CameraState>,
    dimensions: (u32, u32),
    worker: Option<JoinHandle<()>>,
}

impl FfmpegCamera {
    pub fn open(device: &CameraDevice) -> Result<Self, CaptureError> {
        if device.is_live() {
            if let Err(e) = std::fs::File::open(&device.path) {
                return Err(match e.kind() {
                    std::io::ErrorKind::PermissionDenied => {
                        CaptureError::PermissionDenied(device.path.display().to_string())
                    }
                    _ => CaptureError::Io(e),
                });
            }
        }
        let session = DecodeSession::open(device).map_err(|e| CaptureError::Open {
            device: device.path.display().to_string(),
            message: e.to_string(),
        })?;
        let dimensions = (session.width, session.height);

        let state = Arc::new(CameraState::default());
        let worker_state = Arc::clone(&state);
        let worker = std::thread::Builder::new()
            .name("camera-decode".into())
            .spawn(move || session.run(&worker_state))?;

        Ok(Self {
            state,
            dimensions,
            worker: Some(worker),
        })
    }

    #[cfg(test)]
    pub(crate) fn playback(&self) -> PlaybackHandle {
        PlaybackHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl VideoSource for FfmpegCamera {
    fn dimensions(&self) -> Option<(u32, u32)> {
        Some(self.dimensions)
    }

    fn is_paused(&self) -> bool {
        self.state.paused.load(Ordering::SeqCst) || self.state.ended.load(Ordering::SeqCst)
    }

    fn current_frame(&self) -> Option<Arc<Frame>> {
        self.state
            .latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Drop for FfmpegCamera {
    fn drop(&mut self) {
        self.state.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("camera decode thread panicked");
            }
        }
    }
}

struct DecodeSession {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    frame_interval: Option<Duration>,
}

// Safety: a DecodeSession is moved into the decode thread once and used only
// there. The raw pointers inside ffmpeg types are never shared.
unsafe impl Send for DecodeSession {}

impl DecodeSession {
    fn open(device: &CameraDevice) -> Result<Self, ffmpeg_next::Error> {
        ffmpeg_next::init()?;

        let ictx = match &device.format {
            Some(name) => {
                ffmpeg_next::device::register_all();
                let format = ffmpeg_next::device::input::video()
                    .find(|f| f.name() == name.as_str())
                    .ok_or(ffmpeg_next::Error::DemuxerNotFound)?;
                match ffmpeg_next::format::open_with(
                    &device.path,
                    &ffmpeg_next::format::Format::Input(format),
                    ffmpeg_next::Dictionary::new(),
                )? {
                    ffmpeg_next::format::context::Context::Input(ictx) => ictx,
                    ffmpeg_next::format::context::Context::Output(_) => {
                        return Err(ffmpeg_next::Error::DemuxerNotFound)
                    }
                }
            }
            None => ffmpeg_next::format::input(&device.path)?,
        };

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or(ffmpeg_next::Error::StreamNotFound)?;
        let stream_index = stream.index();
        let rate = stream.rate();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;
        let (width, height) = (decoder.width(), decoder.height());

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let frame_interval = if device.is_live() || rate.numerator() <= 0 {
            None
        } else {
            Some(Duration::from_secs_f64(
                rate.denominator() as f64 / rate.numerator() as f64,
            ))
        };

        Ok(Self {
            ictx,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            frame_interval,
        })
    }

    fn run(mut self, state: &CameraState) {
        let started = Instant::now();
        let mut publisher = Publisher {
            state,
            started,
            next_due: started,
            index: 0,
        };

        if let Err(e) = self.decode_all(&mut publisher) {
            log::error!("camera decode failed: {e}");
        }
        state.ended.store(true, Ordering::SeqCst);
        log::info!("camera stream ended after {} frames", publisher.index);
    }

    fn decode_all(&mut self, publisher: &mut Publisher<'_>) -> Result<(), ffmpeg_next::Error> {
        for (stream, packet) in self.ictx.packets() {
            if publisher.stopped() {
                return Ok(());
            }
            if stream.index() != self.stream_index {
                continue;
            }
            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }
            receive_frames(
                &mut self.decoder,
                &mut self.scaler,
                (self.width, self.height),
                self.frame_interval,
                publisher,
            )?;
        }
        let _ = self.decoder.send_eof();
        receive_frames(
            &mut self.decoder,
            &mut self.scaler,
            (self.width, self.height),
            self.frame_interval,
            publisher,
        )
    }
}

struct Publisher<'a> {
    state: &'a CameraState,
    started: Instant,
    next_due: Instant,
    index: usize,
}

impl Publisher<'_> {
    fn stopped(&self) -> bool {
        self.state.stop.load(Ordering::SeqCst)
    }

    /// Blocks while paused. Returns false if stopped meanwhile.
    fn wait_while_paused(&self) -> bool {
        while self.state.paused.load(Ordering::SeqCst) {
            if self.stopped() {
                return false;
            }
            std::thread::sleep(PAUSE_POLL);
        }
        !self.stopped()
    }

    fn publish(&mut self, pixels: Vec<u8>, width: u32, height: u32, interval: Option<Duration>) {
        if let Some(interval) = interval {
            let now = Instant::now();
            if self.next_due > now {
                std::thread::sleep(self.next_due - now);
            }
            self.next_due = self.next_due.max(now) + interval;
        }
        let frame = Frame::new(pixels, width, height, self.index)
            .with_timestamp(self.started.elapsed());
        *self.state.latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(frame));
        self.index += 1;
    }
}

fn receive_frames(
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut ffmpeg_next::software::scaling::Context,
    (width, height): (u32, u32),
    interval: Option<Duration>,
    publisher: &mut Publisher<'_>,
) -> Result<(), ffmpeg_next::Error> {
    let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
    while decoder.receive_frame(&mut decoded).is_ok() {
        if !publisher.wait_while_paused() {
            return Ok(());
        }
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&decoded, &mut rgb_frame)?;
        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        publisher.publish(pixels, width, height, interval);
    }
    Ok(())
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// dropping per-row stride padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

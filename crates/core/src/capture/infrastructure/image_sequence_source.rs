use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::capture::domain::media_devices::{CaptureError, MediaDevices, VideoConstraints};
use crate::capture::domain::video_source::VideoSource;
use crate::shared::constants::{DEFAULT_SEQUENCE_FPS, IMAGE_EXTENSIONS};
use crate::shared::frame::Frame;

/// A directory of still images played back as a looping camera.
///
/// Images are decoded once up front and resized to the first image's size.
/// The visible image is derived from wall-clock time, so no thread is needed.
pub struct ImageSequenceSource {
    images: Vec<Vec<u8>>,
    width: u32,
    height: u32,
    frame_interval: Duration,
    started: Instant,
    paused: Arc<AtomicBool>,
    last: Mutex<Option<Arc<Frame>>>,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path, fps: f64) -> Result<Self, CaptureError> {
        let paths = list_images(dir)?;
        let Some(first) = paths.first() else {
            return Err(CaptureError::Open {
                device: dir.display().to_string(),
                message: "no images found".into(),
            });
        };
        let first = load_rgb(first)?;
        let (width, height) = first.dimensions();

        let mut images = vec![first.into_raw()];
        for path in &paths[1..] {
            let mut img = load_rgb(path)?;
            if img.dimensions() != (width, height) {
                img = image::imageops::resize(
                    &img,
                    width,
                    height,
                    image::imageops::FilterType::Triangle,
                );
            }
            images.push(img.into_raw());
        }
        log::info!(
            "loaded {} images ({width}x{height}) from {}",
            images.len(),
            dir.display()
        );

        let fps = if fps > 0.0 { fps } else { DEFAULT_SEQUENCE_FPS };
        Ok(Self {
            images,
            width,
            height,
            frame_interval: Duration::from_secs_f64(1.0 / fps),
            started: Instant::now(),
            paused: Arc::new(AtomicBool::new(false)),
            last: Mutex::new(None),
        })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Shared pause flag; setting it pauses the source.
    #[cfg(test)]
    pub(crate) fn pause_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.paused)
    }

    /// Frame visible `elapsed` after the source started.
    fn frame_at(&self, elapsed: Duration) -> Arc<Frame> {
        let tick = (elapsed.as_nanos() / self.frame_interval.as_nanos().max(1)) as usize;
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(frame) = last.as_ref().filter(|f| f.index() == tick) {
            return Arc::clone(frame);
        }
        let data = self.images[tick % self.images.len()].clone();
        let frame = Arc::new(
            Frame::new(data, self.width, self.height, tick)
                .with_timestamp(self.frame_interval * tick as u32),
        );
        *last = Some(Arc::clone(&frame));
        frame
    }
}

impl VideoSource for ImageSequenceSource {
    fn dimensions(&self) -> Option<(u32, u32)> {
        Some((self.width, self.height))
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn current_frame(&self) -> Option<Arc<Frame>> {
        Some(self.frame_at(self.started.elapsed()))
    }
}

/// [`MediaDevices`] that serves one image directory for any constraints.
pub struct ImageSequenceDevices {
    dir: PathBuf,
    fps: f64,
}

impl ImageSequenceDevices {
    pub fn new(dir: impl Into<PathBuf>, fps: f64) -> Self {
        Self {
            dir: dir.into(),
            fps,
        }
    }
}

impl MediaDevices for ImageSequenceDevices {
    fn get_user_media(
        &mut self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoSource>, CaptureError> {
        if let VideoConstraints::Facing(mode) = constraints {
            log::debug!("image sequence ignores facing mode {mode}");
        }
        Ok(Box::new(ImageSequenceSource::open(&self.dir, self.fps)?))
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, CaptureError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

fn load_rgb(path: &Path) -> Result<image::RgbImage, CaptureError> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|e| CaptureError::Open {
            device: path.display().to_string(),
            message: e.to_string(),
        })
}

use std::path::{Path, PathBuf};

use image::RgbImage;

/// Writes presented frames as numbered PNG files: `frame_000000.png`,
/// `frame_000001.png`, ...
pub struct PngSequenceWriter {
    dir: PathBuf,
    next_index: u64,
}

impl PngSequenceWriter {
    /// Creates the output directory if needed.
    pub fn create(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, next_index: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frames_written(&self) -> u64 {
        self.next_index
    }

    pub fn write(&mut self, image: &RgbImage) -> Result<PathBuf, image::ImageError> {
        let path = self.dir.join(format!("frame_{:06}.png", self.next_index));
        image.save(&path)?;
        self.next_index += 1;
        Ok(path)
    }
}

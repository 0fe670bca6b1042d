use thiserror::Error;

use crate::detection::domain::detected_shape::{DetectedBarcode, DetectedFace, DetectedText};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("detector backend failed: {0}")]
    Backend(String),
    #[error("frame rejected: {0}")]
    InvalidFrame(String),
    #[error("detector panicked: {0}")]
    Panicked(String),
}

impl DetectionError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        DetectionError::Backend(err.to_string())
    }
}

/// Domain interface for face detection.
///
/// Implementations may be stateful (e.g., replay cursors), hence `&mut self`.
/// Each detector is owned by a single worker thread.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, DetectionError>;
}

pub trait TextDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedText>, DetectionError>;
}

pub trait BarcodeDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedBarcode>, DetectionError>;
}

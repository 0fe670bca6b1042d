use std::fmt;

use crate::detection::domain::category::Category;
use crate::detection::domain::detection_set::Detections;
use crate::detection::domain::shape_detector::{
    BarcodeDetector, DetectionError, FaceDetector, TextDetector,
};
use crate::shared::frame::Frame;

/// A detection capability provided by the host, tagged by category.
pub enum Capability {
    Face(Box<dyn FaceDetector>),
    Text(Box<dyn TextDetector>),
    Barcode(Box<dyn BarcodeDetector>),
}

impl Capability {
    pub fn category(&self) -> Category {
        match self {
            Capability::Face(_) => Category::Face,
            Capability::Text(_) => Category::Text,
            Capability::Barcode(_) => Category::Barcode,
        }
    }

    pub fn detect(&mut self, frame: &Frame) -> Result<Detections, DetectionError> {
        match self {
            Capability::Face(d) => d.detect(frame).map(Detections::Faces),
            Capability::Text(d) => d.detect(frame).map(Detections::Texts),
            Capability::Barcode(d) => d.detect(frame).map(Detections::Barcodes),
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Capability").field(&self.category()).finish()
    }
}

//! Replays detection results recorded from a host's shape detection API.
//!
//! The file is a JSON array with one entry per detection pass:
//!
//! ```json
//! [
//!   {
//!     "faces": [{ "boundingBox": { "top": 10, "left": 20, "width": 100, "height": 80 },
//!                 "landmarks": [{ "type": "eye", "location": { "x": 50, "y": 40 } }] }],
//!     "texts": [{ "boundingBox": { ... }, "rawValue": "ABC" }],
//!     "barcodes": [{ "boundingBox": { ... }, "rawValue": "…", "format": "qr_code",
//!                    "cornerPoints": [{ "x": 1, "y": 2 }, ...] }]
//!   }
//! ]
//! ```
//!
//! Missing categories are empty for that pass.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::detected_shape::{
    BarcodeFormat, DetectedBarcode, DetectedFace, DetectedText, Landmark, LandmarkType,
};
use crate::detection::domain::detection_set::DetectionSet;
use crate::detection::domain::shape_detector::{
    BarcodeDetector, DetectionError, FaceDetector, TextDetector,
};
use crate::shared::frame::Frame;
use crate::shared::geometry::{BoundingBox, Point};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed detection recording: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("pass {pass}: {message}")]
    Invalid { pass: usize, message: String },
}

/// `DOMRectReadOnly` as serialised by a host: `top`/`left` and `x`/`y` are
/// interchangeable and may both be present.
#[derive(Deserialize)]
struct RecordedBox {
    top: Option<f64>,
    left: Option<f64>,
    x: Option<f64>,
    y: Option<f64>,
    width: f64,
    height: f64,
}

#[derive(Clone, Copy, Deserialize)]
struct RecordedPoint {
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct RecordedLandmark {
    #[serde(rename = "type")]
    kind: String,
    location: Option<RecordedPoint>,
    #[serde(default)]
    locations: Vec<RecordedPoint>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordedFace {
    bounding_box: RecordedBox,
    #[serde(default)]
    landmarks: Vec<RecordedLandmark>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordedText {
    bounding_box: RecordedBox,
    raw_value: String,
    #[serde(default)]
    corner_points: Vec<RecordedPoint>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordedBarcode {
    bounding_box: RecordedBox,
    raw_value: String,
    format: Option<String>,
    #[serde(default)]
    corner_points: Vec<RecordedPoint>,
}

#[derive(Deserialize)]
struct RecordedPass {
    #[serde(default)]
    faces: Vec<RecordedFace>,
    #[serde(default)]
    texts: Vec<RecordedText>,
    #[serde(default)]
    barcodes: Vec<RecordedBarcode>,
}

impl From<RecordedBox> for BoundingBox {
    fn from(b: RecordedBox) -> Self {
        BoundingBox::new(
            b.top.or(b.y).unwrap_or(0.0),
            b.left.or(b.x).unwrap_or(0.0),
            b.width,
            b.height,
        )
    }
}

impl From<RecordedPoint> for Point {
    fn from(p: RecordedPoint) -> Self {
        Point::new(p.x, p.y)
    }
}

fn points(recorded: Vec<RecordedPoint>) -> Vec<Point> {
    recorded.into_iter().map(Point::from).collect()
}

impl RecordedPass {
    fn into_detection_set(self) -> Result<DetectionSet, String> {
        let mut faces = Vec::with_capacity(self.faces.len());
        for face in self.faces {
            let mut landmarks = Vec::with_capacity(face.landmarks.len());
            for landmark in face.landmarks {
                let kind = landmark.kind.parse::<LandmarkType>()?;
                let location = landmark
                    .location
                    .or_else(|| landmark.locations.first().copied())
                    .ok_or_else(|| format!("{kind} landmark has no location"))?;
                landmarks.push(Landmark {
                    location: location.into(),
                    kind,
                });
            }
            faces.push(DetectedFace {
                bounding_box: face.bounding_box.into(),
                landmarks,
            });
        }

        let texts = self
            .texts
            .into_iter()
            .map(|t| DetectedText {
                bounding_box: t.bounding_box.into(),
                raw_value: t.raw_value,
                corner_points: points(t.corner_points),
            })
            .collect();

        let mut barcodes = Vec::with_capacity(self.barcodes.len());
        for barcode in self.barcodes {
            let format = match barcode.format.as_deref() {
                Some(name) => name.parse::<BarcodeFormat>()?,
                None => BarcodeFormat::Unknown,
            };
            barcodes.push(DetectedBarcode {
                bounding_box: barcode.bounding_box.into(),
                raw_value: barcode.raw_value,
                format,
                corner_points: points(barcode.corner_points),
            });
        }

        Ok(DetectionSet {
            faces,
            texts,
            barcodes,
        })
    }
}

/// A parsed recording: one [`DetectionSet`] per pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReplayRecording {
    passes: Vec<DetectionSet>,
}

impl ReplayRecording {
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let recording = Self::from_json(&text)?;
        log::info!(
            "loaded {} recorded passes from {}",
            recording.len(),
            path.display()
        );
        Ok(recording)
    }

    pub fn from_json(text: &str) -> Result<Self, ReplayError> {
        let recorded: Vec<RecordedPass> = serde_json::from_str(text)?;
        let passes = recorded
            .into_iter()
            .enumerate()
            .map(|(pass, r)| {
                r.into_detection_set()
                    .map_err(|message| ReplayError::Invalid { pass, message })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { passes })
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn pass(&self, index: usize) -> Option<&DetectionSet> {
        self.passes.get(index)
    }
}

/// Detector that returns recorded results, one pass per call, looping.
///
/// Each instance keeps its own cursor, so one instance per capability
/// replays every category in step.
pub struct ReplayDetector {
    recording: Arc<ReplayRecording>,
    cursor: usize,
}

impl ReplayDetector {
    pub fn new(recording: Arc<ReplayRecording>) -> Self {
        Self {
            recording,
            cursor: 0,
        }
    }

    fn next_pass(&mut self) -> Option<&DetectionSet> {
        if self.recording.is_empty() {
            return None;
        }
        let index = self.cursor % self.recording.len();
        self.cursor = self.cursor.wrapping_add(1);
        self.recording.pass(index)
    }
}

impl FaceDetector for ReplayDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectedFace>, DetectionError> {
        Ok(self.next_pass().map(|p| p.faces.clone()).unwrap_or_default())
    }
}

impl TextDetector for ReplayDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectedText>, DetectionError> {
        Ok(self.next_pass().map(|p| p.texts.clone()).unwrap_or_default())
    }
}

impl BarcodeDetector for ReplayDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectedBarcode>, DetectionError> {
        Ok(self
            .next_pass()
            .map(|p| p.barcodes.clone())
            .unwrap_or_default())
    }
}

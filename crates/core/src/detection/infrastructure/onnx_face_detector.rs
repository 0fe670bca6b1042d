//! YOLO-pose face detector using ONNX Runtime via `ort`.
//!
//! Handles letterbox preprocessing, inference and NMS, then maps the five
//! pose keypoints onto eye/nose/mouth landmarks.
use std::path::Path;

use crate::detection::domain::detected_shape::{DetectedFace, Landmark, LandmarkType};
use crate::detection::domain::shape_detector::{DetectionError, FaceDetector};
use crate::shared::frame::Frame;
use crate::shared::geometry::{BoundingBox, Point};

/// Input resolution when the model's input shape is dynamic.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Input resolution used in fast mode when the model's input shape is dynamic.
const FAST_INPUT_SIZE: u32 = 320;

/// Default confidence threshold for face detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Number of keypoints per detection (5 landmarks × 3 values each: x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

/// Landmark kind for each keypoint the model emits, in output order.
const KEYPOINT_KINDS: [LandmarkType; 5] = [
    LandmarkType::Eye,
    LandmarkType::Eye,
    LandmarkType::Nose,
    LandmarkType::Mouth,
    LandmarkType::Mouth,
];

#[derive(Clone, Debug, PartialEq)]
pub struct FaceDetectorOptions {
    /// Trade accuracy for speed: nearest-neighbour resize and, where the
    /// model allows it, a smaller input.
    pub fast_mode: bool,
    pub confidence: f64,
    /// Keep at most this many faces (highest confidence first).
    pub max_detected_faces: Option<usize>,
}

impl Default for FaceDetectorOptions {
    fn default() -> Self {
        Self {
            fast_mode: true,
            confidence: DEFAULT_CONFIDENCE,
            max_detected_faces: None,
        }
    }
}

/// YOLO face detector backed by an ONNX Runtime session.
pub struct OnnxFaceDetector {
    session: ort::session::Session,
    options: FaceDetectorOptions,
    input_size: u32,
}

impl OnnxFaceDetector {
    /// Load a YOLO-pose ONNX model and prepare for inference.
    ///
    /// A fixed input shape in the model (NCHW) always wins over the fast-mode size.
    pub fn new(model_path: &Path, options: FaceDetectorOptions) -> Result<Self, DetectionError> {
        let session = load_session(model_path).map_err(DetectionError::backend)?;

        let fixed_size = session.inputs().first().and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                (shape.len() >= 4 && shape[2] > 0).then(|| shape[2] as u32)
            } else {
                None
            }
        });
        let input_size = match fixed_size {
            Some(size) => size,
            None if options.fast_mode => FAST_INPUT_SIZE,
            None => DEFAULT_INPUT_SIZE,
        };
        log::info!(
            "face model {} loaded (input {input_size}, fast mode {})",
            model_path.display(),
            options.fast_mode
        );

        Ok(Self {
            session,
            options,
            input_size,
        })
    }
}

impl FaceDetector for OnnxFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, DetectionError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(DetectionError::InvalidFrame("empty frame".into()));
        }
        if frame.data().len() != frame.width() as usize * frame.height() as usize * 3 {
            return Err(DetectionError::InvalidFrame("frame size mismatch".into()));
        }

        let resample = if self.options.fast_mode {
            Resample::Nearest
        } else {
            Resample::Bilinear
        };
        let (input_tensor, geometry) = letterbox(frame, self.input_size, resample);

        let input_value =
            ort::value::Tensor::from_array(input_tensor).map_err(DetectionError::backend)?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(DetectionError::backend)?;
        if outputs.len() == 0 {
            return Err(DetectionError::Backend("face model produced no outputs".into()));
        }
        let tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(DetectionError::backend)?;
        let shape = tensor.shape().to_vec();
        let data = tensor
            .as_slice()
            .ok_or_else(|| DetectionError::Backend("output tensor is not contiguous".into()))?;

        let mut raw = decode_output(data, &shape, &geometry, self.options.confidence)?;
        let mut kept = nms(&mut raw, NMS_IOU_THRESH);
        if let Some(max) = self.options.max_detected_faces {
            kept.truncate(max);
        }

        Ok(kept
            .into_iter()
            .map(|d| d.into_face(frame.width() as f64, frame.height() as f64))
            .collect())
    }
}

fn load_session(model_path: &Path) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    Ok(ort::session::Session::builder()?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?)
}

/// Returns the preferred ONNX execution providers for the current platform.
///
/// An empty list means CPU only.
fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resample {
    Nearest,
    Bilinear,
}

/// Mapping from letterboxed model coordinates back to frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
struct LetterboxGeometry {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl LetterboxGeometry {
    fn to_frame(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Letterbox-resize a frame to `target_size` × `target_size` as an NCHW
/// float32 tensor in `[0, 1]`, padded with YOLO grey.
fn letterbox(
    frame: &Frame,
    target_size: u32,
    resample: Resample,
) -> (ndarray::Array4<f32>, LetterboxGeometry) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).clamp(1, target_size);
    let new_h = ((fh * scale).round() as u32).clamp(1, target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let (px, py) = (pad_x as usize, pad_y as usize);
    let mut put = |x: usize, y: usize, rgb: [u8; 3]| {
        for (c, v) in rgb.iter().enumerate() {
            tensor[[0, c, py + y, px + x]] = *v as f32 / 255.0;
        }
    };

    match resample {
        Resample::Nearest => {
            let src = frame.as_ndarray();
            let src_h = frame.height() as usize;
            let src_w = frame.width() as usize;
            for y in 0..new_h as usize {
                let sy = ((y as f64 / scale) as usize).min(src_h - 1);
                for x in 0..new_w as usize {
                    let sx = ((x as f64 / scale) as usize).min(src_w - 1);
                    put(x, y, [src[[sy, sx, 0]], src[[sy, sx, 1]], src[[sy, sx, 2]]]);
                }
            }
        }
        Resample::Bilinear => {
            match image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec()) {
                Some(image) => {
                    let resized = image::imageops::resize(
                        &image,
                        new_w,
                        new_h,
                        image::imageops::FilterType::Triangle,
                    );
                    for (x, y, pixel) in resized.enumerate_pixels() {
                        put(x as usize, y as usize, pixel.0);
                    }
                }
                None => log::warn!("frame {} has inconsistent dimensions", frame.index()),
            }
        }
    }

    (tensor, LetterboxGeometry { scale, pad_x, pad_y })
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDetection {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
    keypoints: Vec<Landmark>,
}

impl RawDetection {
    fn bounds(&self) -> BoundingBox {
        BoundingBox::from_corners(self.x1, self.y1, self.x2, self.y2)
    }

    fn into_face(self, frame_w: f64, frame_h: f64) -> DetectedFace {
        DetectedFace {
            bounding_box: BoundingBox::from_corners(
                self.x1.clamp(0.0, frame_w),
                self.y1.clamp(0.0, frame_h),
                self.x2.clamp(0.0, frame_w),
                self.y2.clamp(0.0, frame_h),
            ),
            landmarks: self.keypoints,
        }
    }
}

/// Parses a YOLO-pose output tensor.
///
/// The shape is `[1, features, detections]` (transposed) or
/// `[1, detections, features]`; each row is
/// `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]` in letterbox pixels.
fn decode_output(
    data: &[f32],
    shape: &[usize],
    geometry: &LetterboxGeometry,
    confidence: f64,
) -> Result<Vec<RawDetection>, DetectionError> {
    if shape.len() != 3 {
        return Err(DetectionError::Backend(format!(
            "unexpected face model output shape: {shape:?}"
        )));
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if data.len() < num_dets * num_feats {
        return Err(DetectionError::Backend(format!(
            "face model output has {} values, shape {shape:?} needs {}",
            data.len(),
            num_dets * num_feats
        )));
    }
    if num_feats < 5 {
        return Ok(Vec::new());
    }

    let value = |det: usize, feat: usize| -> f64 {
        let v = if transposed {
            data[feat * num_dets + det]
        } else {
            data[det * num_feats + feat]
        };
        v as f64
    };

    let mut dets = Vec::new();
    for i in 0..num_dets {
        let conf = value(i, 4);
        if conf < confidence {
            continue;
        }
        let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));
        let (x1, y1) = geometry.to_frame(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = geometry.to_frame(cx + w / 2.0, cy + h / 2.0);

        let mut keypoints = Vec::new();
        if num_feats >= 5 + NUM_KEYPOINT_VALUES {
            for (k, kind) in KEYPOINT_KINDS.iter().enumerate() {
                let base = 5 + k * 3;
                if value(i, base + 2) < KEYPOINT_CONF_THRESH {
                    continue;
                }
                let (kx, ky) = geometry.to_frame(value(i, base), value(i, base + 1));
                keypoints.push(Landmark {
                    location: Point::new(kx, ky),
                    kind: *kind,
                });
            }
        }

        dets.push(RawDetection {
            x1,
            y1,
            x2,
            y2,
            confidence: conf,
            keypoints,
        });
    }
    Ok(dets)
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets.iter() {
        let bounds = det.bounds();
        if keep.iter().all(|k| k.bounds().iou(&bounds) <= iou_thresh) {
            keep.push(det.clone());
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn raw(x1: f64, y1: f64, x2: f64, y2: f64, confidence: f64) -> RawDetection {
        RawDetection {
            x1,
            y1,
            x2,
            y2,
            confidence,
            keypoints: Vec::new(),
        }
    }

    const IDENTITY: LetterboxGeometry = LetterboxGeometry {
        scale: 1.0,
        pad_x: 0,
        pad_y: 0,
    };

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → 640: scale 3.2, 640x320 image, 160 px of vertical padding
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 0);
        let (tensor, g) = letterbox(&frame, 640, Resample::Nearest);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(g.scale, 3.2, epsilon = 0.01);
        assert_eq!(g.pad_x, 0);
        assert_eq!(g.pad_y, 160);
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50, 0);
        for resample in [Resample::Nearest, Resample::Bilinear] {
            let (tensor, g) = letterbox(&frame, 320, resample);
            let y = g.pad_y as usize + 1;
            let x = g.pad_x as usize + 1;
            assert_relative_eq!(tensor[[0, 0, y, x]], 1.0, epsilon = 0.01);
            assert_relative_eq!(tensor[[0, 0, 0, 0]], 114.0 / 255.0, epsilon = 0.01);
        }
    }

    #[test]
    fn test_bilinear_letterbox_keeps_channel_layout() {
        // left half red, right half blue
        let (w, h) = (64u32, 32u32);
        let data = (0..w * h)
            .flat_map(|i| if i % w < w / 2 { [255, 0, 0] } else { [0, 0, 255] })
            .collect();
        let frame = Frame::new(data, w, h, 0);
        let (tensor, g) = letterbox(&frame, 128, Resample::Bilinear);

        let y = g.pad_y as usize + 32;
        assert_relative_eq!(tensor[[0, 0, y, 10]], 1.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 2, y, 10]], 0.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 0, y, 118]], 0.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 2, y, 118]], 1.0, epsilon = 0.01);
    }

    #[test]
    fn test_geometry_maps_back_to_frame() {
        let g = LetterboxGeometry {
            scale: 2.0,
            pad_x: 0,
            pad_y: 40,
        };
        let (x, y) = g.to_frame(100.0, 140.0);
        assert_relative_eq!(x, 50.0);
        assert_relative_eq!(y, 50.0);
    }

    #[test]
    fn test_decode_row_major_with_landmarks() {
        // 25 candidate rows of 20 features; only the first is confident
        let mut data = vec![0.0f32; 25 * 20];
        let row = [
            50.0, 60.0, 20.0, 40.0, 0.9, // box + conf
            45.0, 50.0, 0.9, 55.0, 50.0, 0.9, 50.0, 58.0, 0.8, // eyes, nose
            46.0, 70.0, 0.1, 54.0, 70.0, 0.2, // mouth corners, not visible
        ];
        data[..20].copy_from_slice(&row);
        let dets = decode_output(&data, &[1, 25, 20], &IDENTITY, 0.25).unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].bounds(), BoundingBox::new(40.0, 40.0, 20.0, 40.0));
        let kinds: Vec<_> = dets[0].keypoints.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![LandmarkType::Eye, LandmarkType::Eye, LandmarkType::Nose]
        );
        assert_eq!(dets[0].keypoints[2].location, Point::new(50.0, 58.0));
    }

    #[test]
    fn test_decode_transposed_layout() {
        // 5 features x 6 candidates, stored feature-major; candidate 1 is confident
        let features: [[f32; 6]; 5] = [
            [10.0, 100.0, 0.0, 0.0, 0.0, 0.0],
            [10.0, 100.0, 0.0, 0.0, 0.0, 0.0],
            [4.0, 8.0, 0.0, 0.0, 0.0, 0.0],
            [4.0, 8.0, 0.0, 0.0, 0.0, 0.0],
            [0.1, 0.8, 0.0, 0.0, 0.0, 0.0],
        ];
        let data: Vec<f32> = features.iter().flatten().copied().collect();
        let dets = decode_output(&data, &[1, 5, 6], &IDENTITY, 0.25).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].bounds(), BoundingBox::new(96.0, 96.0, 8.0, 8.0));
        assert!(dets[0].keypoints.is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_shape() {
        assert!(matches!(
            decode_output(&[0.0; 4], &[4], &IDENTITY, 0.25),
            Err(DetectionError::Backend(_))
        ));
        assert!(decode_output(&[0.0; 4], &[1, 2, 5], &IDENTITY, 0.25).is_err());
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let mut dets = vec![
            raw(0.0, 0.0, 100.0, 100.0, 0.8),
            raw(5.0, 5.0, 105.0, 105.0, 0.9),
        ];
        let kept = nms(&mut dets, 0.3);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_keeps_non_overlapping() {
        let mut dets = vec![
            raw(0.0, 0.0, 50.0, 50.0, 0.9),
            raw(200.0, 200.0, 250.0, 250.0, 0.8),
        ];
        assert_eq!(nms(&mut dets, 0.3).len(), 2);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(nms(&mut [], 0.3).is_empty());
    }

    #[test]
    fn test_into_face_clamps_to_frame() {
        let face = raw(-10.0, -5.0, 50.0, 300.0, 0.9).into_face(100.0, 200.0);
        assert_eq!(face.bounding_box, BoundingBox::new(0.0, 0.0, 50.0, 200.0));
    }
}

use crate::detection::domain::detected_shape::{BarcodeFormat, DetectedBarcode};
use crate::detection::domain::shape_detector::{BarcodeDetector, DetectionError};
use crate::shared::frame::Frame;
use crate::shared::geometry::{BoundingBox, Point};

/// Frames larger than this on either side are downscaled before scanning.
const DEFAULT_MAX_DIMENSION: u32 = 640;

/// QR code detector backed by `rqrr`.
///
/// Grids that are found but fail to decode are skipped.
pub struct QrBarcodeDetector {
    max_dimension: u32,
}

impl Default for QrBarcodeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrBarcodeDetector {
    pub fn new() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }

    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }
}

impl BarcodeDetector for QrBarcodeDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedBarcode>, DetectionError> {
        let (width, height) = (frame.width(), frame.height());
        if width == 0 || height == 0 {
            return Err(DetectionError::InvalidFrame("empty frame".into()));
        }
        let luma = image::GrayImage::from_raw(width, height, frame.to_luma())
            .ok_or_else(|| DetectionError::InvalidFrame("frame size mismatch".into()))?;

        let (luma, scale) = if width > self.max_dimension || height > self.max_dimension {
            let scale = (width as f64 / self.max_dimension as f64)
                .max(height as f64 / self.max_dimension as f64);
            let w = ((width as f64 / scale) as u32).max(1);
            let h = ((height as f64 / scale) as u32).max(1);
            let small = image::imageops::resize(&luma, w, h, image::imageops::FilterType::Triangle);
            (small, scale)
        } else {
            (luma, 1.0)
        };

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            luma.width() as usize,
            luma.height() as usize,
            |x, y| luma.get_pixel(x as u32, y as u32).0[0],
        );

        let mut barcodes = Vec::new();
        for grid in prepared.detect_grids() {
            let content = match grid.decode() {
                Ok((_, content)) => content,
                Err(e) => {
                    log::debug!("QR grid found but not decoded: {e}");
                    continue;
                }
            };
            let corners: Vec<Point> = grid
                .bounds
                .iter()
                .map(|p| Point::new(p.x as f64 * scale, p.y as f64 * scale))
                .collect();
            let Some(bounding_box) = BoundingBox::enclosing(&corners) else {
                continue;
            };
            barcodes.push(DetectedBarcode {
                bounding_box,
                raw_value: content,
                format: BarcodeFormat::QrCode,
                corner_points: corners,
            });
        }

        if !barcodes.is_empty() {
            log::debug!("found {} QR codes in frame {}", barcodes.len(), frame.index());
        }
        Ok(barcodes)
    }
}

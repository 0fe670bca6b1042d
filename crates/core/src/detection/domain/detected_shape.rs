//! Shapes reported by detection capabilities.
//!
//! Field names follow the browser Shape Detection API so recorded results
//! from a host can be replayed without translation.

use std::fmt;
use std::str::FromStr;

use crate::shared::geometry::{BoundingBox, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LandmarkType {
    Eye,
    Mouth,
    Nose,
}

impl LandmarkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LandmarkType::Eye => "eye",
            LandmarkType::Mouth => "mouth",
            LandmarkType::Nose => "nose",
        }
    }
}

impl fmt::Display for LandmarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LandmarkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eye" => Ok(LandmarkType::Eye),
            "mouth" => Ok(LandmarkType::Mouth),
            "nose" => Ok(LandmarkType::Nose),
            other => Err(format!("unknown landmark type '{other}'")),
        }
    }
}

/// A named point of interest within a detected face.
#[derive(Clone, Debug, PartialEq)]
pub struct Landmark {
    pub location: Point,
    pub kind: LandmarkType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    pub bounding_box: BoundingBox,
    pub landmarks: Vec<Landmark>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetectedText {
    pub bounding_box: BoundingBox,
    pub raw_value: String,
    pub corner_points: Vec<Point>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BarcodeFormat {
    Aztec,
    Code128,
    Code39,
    DataMatrix,
    Ean13,
    Ean8,
    Pdf417,
    QrCode,
    UpcA,
    #[default]
    Unknown,
}

impl BarcodeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeFormat::Aztec => "aztec",
            BarcodeFormat::Code128 => "code_128",
            BarcodeFormat::Code39 => "code_39",
            BarcodeFormat::DataMatrix => "data_matrix",
            BarcodeFormat::Ean13 => "ean_13",
            BarcodeFormat::Ean8 => "ean_8",
            BarcodeFormat::Pdf417 => "pdf417",
            BarcodeFormat::QrCode => "qr_code",
            BarcodeFormat::UpcA => "upc_a",
            BarcodeFormat::Unknown => "unknown",
        }
    }
}

impl FromStr for BarcodeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = match s {
            "aztec" => BarcodeFormat::Aztec,
            "code_128" => BarcodeFormat::Code128,
            "code_39" => BarcodeFormat::Code39,
            "data_matrix" => BarcodeFormat::DataMatrix,
            "ean_13" => BarcodeFormat::Ean13,
            "ean_8" => BarcodeFormat::Ean8,
            "pdf417" => BarcodeFormat::Pdf417,
            "qr_code" => BarcodeFormat::QrCode,
            "upc_a" => BarcodeFormat::UpcA,
            "unknown" => BarcodeFormat::Unknown,
            other => return Err(format!("unknown barcode format '{other}'")),
        };
        Ok(format)
    }
}

/// A decoded barcode. `corner_points` is empty when the detector only
/// reports an axis-aligned box.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedBarcode {
    pub bounding_box: BoundingBox,
    pub raw_value: String,
    pub format: BarcodeFormat,
    pub corner_points: Vec<Point>,
}

use crate::detection::domain::category::Category;
use crate::detection::domain::detected_shape::{DetectedBarcode, DetectedFace, DetectedText};

/// Results of one capability call, tagged by category.
#[derive(Clone, Debug, PartialEq)]
pub enum Detections {
    Faces(Vec<DetectedFace>),
    Texts(Vec<DetectedText>),
    Barcodes(Vec<DetectedBarcode>),
}

impl Detections {
    /// Stand-in used when a capability fails for a pass.
    pub fn empty(category: Category) -> Self {
        match category {
            Category::Face => Detections::Faces(Vec::new()),
            Category::Text => Detections::Texts(Vec::new()),
            Category::Barcode => Detections::Barcodes(Vec::new()),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Detections::Faces(_) => Category::Face,
            Detections::Texts(_) => Category::Text,
            Detections::Barcodes(_) => Category::Barcode,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Detections::Faces(v) => v.len(),
            Detections::Texts(v) => v.len(),
            Detections::Barcodes(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Combined per-category results for one detection pass.
///
/// A category that is disabled, or whose capability failed, stays empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionSet {
    pub faces: Vec<DetectedFace>,
    pub texts: Vec<DetectedText>,
    pub barcodes: Vec<DetectedBarcode>,
}

impl DetectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `detections` in its category, replacing anything there.
    pub fn insert(&mut self, detections: Detections) {
        match detections {
            Detections::Faces(v) => self.faces = v,
            Detections::Texts(v) => self.texts = v,
            Detections::Barcodes(v) => self.barcodes = v,
        }
    }

    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Face => self.faces.len(),
            Category::Text => self.texts.len(),
            Category::Barcode => self.barcodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::PRIORITY.iter().all(|c| self.count(*c) == 0)
    }
}

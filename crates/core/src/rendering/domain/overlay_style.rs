use crate::detection::domain::category::Category;
use crate::rendering::domain::render_surface::{Color, Font};
use crate::shared::geometry::BoundingBox;

pub const FACE_LABEL: &str = "face detected";
pub const LABEL_FONT_FAMILY: &str = "Mononoki";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelAnchor {
    /// Offset from the box's top-left corner.
    Above,
    /// Offset from the box's bottom-left corner.
    Below,
}

/// Colours, font and label placement for one detection category.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayStyle {
    pub color: Color,
    pub font: Font,
    pub line_width: f64,
    pub label_dx: f64,
    pub label_dy: f64,
    pub anchor: LabelAnchor,
}

impl OverlayStyle {
    pub fn label_position(&self, bbox: &BoundingBox) -> (f64, f64) {
        let x = bbox.left + self.label_dx;
        let y = match self.anchor {
            LabelAnchor::Above => bbox.top + self.label_dy,
            LabelAnchor::Below => bbox.bottom() + self.label_dy,
        };
        (x, y)
    }
}

/// Marker drawn for each face landmark.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkStyle {
    pub radius: f64,
    pub label_dx: f64,
    pub label_dy: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayStyles {
    pub face: OverlayStyle,
    pub text: OverlayStyle,
    pub barcode: OverlayStyle,
    pub landmark: LandmarkStyle,
}

impl OverlayStyles {
    pub fn for_category(&self, category: Category) -> &OverlayStyle {
        match category {
            Category::Face => &self.face,
            Category::Text => &self.text,
            Category::Barcode => &self.barcode,
        }
    }
}

impl Default for OverlayStyles {
    fn default() -> Self {
        Self {
            face: OverlayStyle {
                color: Color::rgb(0xff, 0xeb, 0x3b),
                font: Font::new(16.0, LABEL_FONT_FAMILY),
                line_width: 5.0,
                label_dx: 5.0,
                label_dy: -8.0,
                anchor: LabelAnchor::Above,
            },
            text: OverlayStyle {
                color: Color::rgb(0x03, 0xa9, 0xf4),
                font: Font::new(24.0, LABEL_FONT_FAMILY),
                line_width: 5.0,
                label_dx: 5.0,
                label_dy: -12.0,
                anchor: LabelAnchor::Above,
            },
            barcode: OverlayStyle {
                color: Color::rgb(0xe9, 0x1e, 0x63),
                font: Font::new(20.0, LABEL_FONT_FAMILY),
                line_width: 5.0,
                label_dx: 5.0,
                label_dy: 20.0,
                anchor: LabelAnchor::Below,
            },
            landmark: LandmarkStyle {
                radius: 5.0,
                label_dx: 10.0,
                label_dy: 4.0,
            },
        }
    }
}

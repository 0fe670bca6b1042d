use std::f64::consts::PI;

use crate::detection::domain::category::Category;
use crate::detection::domain::detected_shape::{DetectedBarcode, DetectedFace, DetectedText};
use crate::detection::domain::detection_set::DetectionSet;
use crate::rendering::domain::overlay_style::{OverlayStyle, OverlayStyles, FACE_LABEL};
use crate::rendering::domain::render_surface::RenderSurface;
use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

/// Redraws one annotated frame: the video frame plus every detected shape.
///
/// Each call is a full clear and redraw; nothing is carried between passes.
pub struct OverlayRenderer {
    styles: OverlayStyles,
}

impl OverlayRenderer {
    pub fn new(styles: OverlayStyles) -> Self {
        Self { styles }
    }

    pub fn styles(&self) -> &OverlayStyles {
        &self.styles
    }

    pub fn render(&self, surface: &mut dyn RenderSurface, frame: &Frame, detections: &DetectionSet) {
        if surface.width() != frame.width() || surface.height() != frame.height() {
            surface.resize(frame.width(), frame.height());
        }

        surface.clear_rect(0.0, 0.0, surface.width() as f64, surface.height() as f64);
        surface.draw_image(frame, 0.0, 0.0, frame.width() as f64, frame.height() as f64);

        for category in Category::PRIORITY {
            if detections.count(category) == 0 {
                continue;
            }
            let style = self.styles.for_category(category);
            apply_style(surface, style);
            match category {
                Category::Face => {
                    for face in &detections.faces {
                        self.draw_face(surface, style, face);
                    }
                }
                Category::Text => {
                    for text in &detections.texts {
                        draw_text(surface, style, text);
                    }
                }
                Category::Barcode => {
                    for barcode in &detections.barcodes {
                        draw_barcode(surface, style, barcode);
                    }
                }
            }
        }
    }

    fn draw_face(&self, surface: &mut dyn RenderSurface, style: &OverlayStyle, face: &DetectedFace) {
        stroke_box(surface, &face.bounding_box);
        let (x, y) = style.label_position(&face.bounding_box);
        surface.fill_text(FACE_LABEL, x, y);

        let marker = &self.styles.landmark;
        for landmark in &face.landmarks {
            let p = landmark.location;
            surface.begin_path();
            surface.arc(p.x, p.y, marker.radius, 0.0, 2.0 * PI);
            surface.fill();
            surface.fill_text(
                landmark.kind.as_str(),
                p.x + marker.label_dx,
                p.y + marker.label_dy,
            );
        }
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(OverlayStyles::default())
    }
}

fn apply_style(surface: &mut dyn RenderSurface, style: &OverlayStyle) {
    surface.set_stroke_style(style.color);
    surface.set_fill_style(style.color);
    surface.set_font(&style.font);
    surface.set_line_width(style.line_width);
}

fn stroke_box(surface: &mut dyn RenderSurface, bbox: &BoundingBox) {
    surface.begin_path();
    surface.rect(bbox.left, bbox.top, bbox.width, bbox.height);
    surface.stroke();
}

fn draw_text(surface: &mut dyn RenderSurface, style: &OverlayStyle, text: &DetectedText) {
    stroke_box(surface, &text.bounding_box);
    let (x, y) = style.label_position(&text.bounding_box);
    surface.fill_text(&text.raw_value, x, y);
}

fn draw_barcode(surface: &mut dyn RenderSurface, style: &OverlayStyle, barcode: &DetectedBarcode) {
    match barcode.corner_points.split_first() {
        Some((first, rest)) => {
            surface.begin_path();
            surface.move_to(first.x, first.y);
            for p in rest {
                surface.line_to(p.x, p.y);
            }
            surface.close_path();
            surface.stroke();
        }
        None => stroke_box(surface, &barcode.bounding_box),
    }
    let (x, y) = style.label_position(&barcode.bounding_box);
    surface.fill_text(&barcode.raw_value, x, y);
}

use std::f64::consts::TAU;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut, draw_polygon_mut,
};
use imageproc::point::Point as PixelPoint;
use imageproc::rect::Rect;

use crate::rendering::domain::render_surface::{Color, Font, PresentError, RenderSurface};
use crate::rendering::infrastructure::bitmap_font;
use crate::rendering::infrastructure::png_sequence::PngSequenceWriter;
use crate::shared::frame::Frame;

/// Segments used to approximate a full circle when stroking or filling arcs.
const ARC_SEGMENTS: usize = 32;

#[derive(Clone, Debug)]
enum SubPath {
    Rect { x: f64, y: f64, width: f64, height: f64 },
    Polyline { points: Vec<(f64, f64)>, closed: bool },
    Arc { x: f64, y: f64, radius: f64, start: f64, end: f64 },
}

/// Software canvas backed by an [`RgbImage`].
///
/// Paths are collected between `begin_path` and `stroke`/`fill`, as on an
/// HTML canvas. When a [`PngSequenceWriter`] is attached, every `flush`
/// writes the canvas out as the next frame.
pub struct RasterSurface {
    canvas: RgbImage,
    stroke_color: Rgb<u8>,
    fill_color: Rgb<u8>,
    font_px: f64,
    line_width: f64,
    path: Vec<SubPath>,
    writer: Option<PngSequenceWriter>,
    frames_presented: u64,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbImage::new(width, height),
            stroke_color: Rgb([0, 0, 0]),
            fill_color: Rgb([0, 0, 0]),
            font_px: 10.0,
            line_width: 1.0,
            path: Vec::new(),
            writer: None,
            frames_presented: 0,
        }
    }

    pub fn with_writer(mut self, writer: PngSequenceWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn image(&self) -> &RgbImage {
        &self.canvas
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn stroke_segment(&mut self, from: (f64, f64), to: (f64, f64)) {
        let margin = self.line_width / 2.0 + 1.0;
        let min = (-margin, -margin);
        let max = (
            f64::from(self.canvas.width()) - 1.0 + margin,
            f64::from(self.canvas.height()) - 1.0 + margin,
        );
        let Some((from, to)) = clip_segment(from, to, min, max) else {
            return;
        };
        let color = self.stroke_color;
        let radius = (self.line_width / 2.0).floor() as i32;
        if radius == 0 {
            draw_line_segment_mut(
                &mut self.canvas,
                (from.0 as f32, from.1 as f32),
                (to.0 as f32, to.1 as f32),
                color,
            );
            return;
        }
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let cx = (from.0 + dx * t).round() as i32;
            let cy = (from.1 + dy * t).round() as i32;
            draw_filled_circle_mut(&mut self.canvas, (cx, cy), radius, color);
        }
    }

    fn stroke_polyline(&mut self, points: &[(f64, f64)], closed: bool) {
        for pair in points.windows(2) {
            self.stroke_segment(pair[0], pair[1]);
        }
        if closed && points.len() > 2 {
            self.stroke_segment(points[points.len() - 1], points[0]);
        }
    }

    fn fill_polygon(&mut self, points: &[(f64, f64)]) {
        let mut poly: Vec<PixelPoint<i32>> = points
            .iter()
            .map(|(x, y)| PixelPoint::new(x.round() as i32, y.round() as i32))
            .collect();
        poly.dedup();
        while poly.len() > 1 && poly.first() == poly.last() {
            poly.pop();
        }
        if poly.len() >= 3 {
            draw_polygon_mut(&mut self.canvas, &poly, self.fill_color);
        }
    }

    fn current_polyline(&mut self) -> Option<&mut Vec<(f64, f64)>> {
        match self.path.last_mut() {
            Some(SubPath::Polyline {
                points,
                closed: false,
            }) => Some(points),
            _ => None,
        }
    }
}

/// Liang-Barsky clip of the segment `from`-`to` against the box spanned by
/// `min` and `max`. `None` when nothing of the segment lies inside.
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    let edges = [
        (-dx, from.0 - min.0),
        (dx, max.0 - from.0),
        (-dy, from.1 - min.1),
        (dy, max.1 - from.1),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((
        (from.0 + dx * t0, from.1 + dy * t0),
        (from.0 + dx * t1, from.1 + dy * t1),
    ))
}

fn arc_points(x: f64, y: f64, radius: f64, start: f64, end: f64) -> Vec<(f64, f64)> {
    let sweep = (end - start).clamp(-TAU, TAU);
    let steps = ((sweep.abs() / TAU) * ARC_SEGMENTS as f64).ceil().max(1.0) as usize;
    (0..=steps)
        .map(|i| {
            let a = start + sweep * i as f64 / steps as f64;
            (x + radius * a.cos(), y + radius * a.sin())
        })
        .collect()
}

fn is_full_circle(start: f64, end: f64) -> bool {
    (end - start).abs() >= TAU - 1e-9
}

fn pixel_rect(x: f64, y: f64, width: f64, height: f64) -> Option<Rect> {
    let (w, h) = (width.round(), height.round());
    if w < 1.0 || h < 1.0 {
        return None;
    }
    Some(Rect::at(x.round() as i32, y.round() as i32).of_size(w as u32, h as u32))
}

fn to_rgb(color: Color) -> Rgb<u8> {
    Rgb([color.r, color.g, color.b])
}

impl RenderSurface for RasterSurface {
    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas = RgbImage::new(width, height);
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        if let Some(rect) = pixel_rect(x, y, width, height) {
            draw_filled_rect_mut(&mut self.canvas, rect, to_rgb(Color::BLACK));
        }
    }

    fn draw_image(&mut self, frame: &Frame, x: f64, y: f64, width: f64, height: f64) {
        let Some(source) =
            RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        else {
            log::warn!("frame {} has inconsistent dimensions, skipped", frame.index());
            return;
        };
        let (w, h) = (width.round() as u32, height.round() as u32);
        if w == 0 || h == 0 {
            return;
        }
        let source = if source.dimensions() == (w, h) {
            source
        } else {
            imageops::resize(&source, w, h, FilterType::Triangle)
        };
        imageops::replace(&mut self.canvas, &source, x.round() as i64, y.round() as i64);
    }

    fn set_stroke_style(&mut self, color: Color) {
        self.stroke_color = to_rgb(color);
    }

    fn set_fill_style(&mut self, color: Color) {
        self.fill_color = to_rgb(color);
    }

    fn set_font(&mut self, font: &Font) {
        self.font_px = font.size_px;
    }

    fn set_line_width(&mut self, width: f64) {
        if width > 0.0 && width.is_finite() {
            self.line_width = width;
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn close_path(&mut self) {
        if let Some(SubPath::Polyline { closed, .. }) = self.path.last_mut() {
            *closed = true;
        }
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.path.push(SubPath::Rect {
            x,
            y,
            width,
            height,
        });
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.push(SubPath::Polyline {
            points: vec![(x, y)],
            closed: false,
        });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        match self.current_polyline() {
            Some(points) => points.push((x, y)),
            None => self.move_to(x, y),
        }
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64) {
        self.path.push(SubPath::Arc {
            x,
            y,
            radius,
            start: start_angle,
            end: end_angle,
        });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        bitmap_font::draw_text(&mut self.canvas, text, x, y, self.font_px, self.fill_color);
    }

    fn stroke(&mut self) {
        let path = std::mem::take(&mut self.path);
        for sub in &path {
            match sub {
                SubPath::Rect {
                    x,
                    y,
                    width,
                    height,
                } => {
                    let corners = [
                        (*x, *y),
                        (x + width, *y),
                        (x + width, y + height),
                        (*x, y + height),
                    ];
                    self.stroke_polyline(&corners, true);
                }
                SubPath::Polyline { points, closed } => self.stroke_polyline(points, *closed),
                SubPath::Arc {
                    x,
                    y,
                    radius,
                    start,
                    end,
                } => {
                    let points = arc_points(*x, *y, *radius, *start, *end);
                    self.stroke_polyline(&points, false);
                }
            }
        }
        self.path = path;
    }

    fn fill(&mut self) {
        let path = std::mem::take(&mut self.path);
        for sub in &path {
            match sub {
                SubPath::Rect {
                    x,
                    y,
                    width,
                    height,
                } => {
                    if let Some(rect) = pixel_rect(*x, *y, *width, *height) {
                        draw_filled_rect_mut(&mut self.canvas, rect, self.fill_color);
                    }
                }
                SubPath::Polyline { points, .. } => self.fill_polygon(points),
                SubPath::Arc {
                    x,
                    y,
                    radius,
                    start,
                    end,
                } => {
                    if is_full_circle(*start, *end) {
                        draw_filled_circle_mut(
                            &mut self.canvas,
                            (x.round() as i32, y.round() as i32),
                            radius.round() as i32,
                            self.fill_color,
                        );
                    } else {
                        self.fill_polygon(&arc_points(*x, *y, *radius, *start, *end));
                    }
                }
            }
        }
        self.path = path;
    }

    fn flush(&mut self) -> Result<(), PresentError> {
        if let Some(writer) = self.writer.as_mut() {
            let path = writer.write(&self.canvas)?;
            log::debug!("presented frame to {}", path.display());
        }
        self.frames_presented += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;
    use std::f64::consts::PI;
    use std::time::{Duration, Instant};

    const YELLOW: Color = Color::rgb(0xff, 0xeb, 0x3b);

    fn solid_frame(w: u32, h: u32, rgb: [u8; 3]) -> Frame {
        let data = rgb.iter().copied().cycle().take((w * h * 3) as usize).collect();
        Frame::new(data, w, h, 0)
    }

    fn pixel(surface: &RasterSurface, x: u32, y: u32) -> [u8; 3] {
        surface.image().get_pixel(x, y).0
    }

    #[test]
    fn test_draw_image_copies_frame() {
        let mut surface = RasterSurface::new(4, 4);
        surface.draw_image(&solid_frame(4, 4, [10, 20, 30]), 0.0, 0.0, 4.0, 4.0);
        assert_eq!(pixel(&surface, 3, 3), [10, 20, 30]);
    }

    #[test]
    fn test_draw_image_scales_to_target() {
        let mut surface = RasterSurface::new(8, 8);
        surface.draw_image(&solid_frame(2, 2, [200, 0, 0]), 0.0, 0.0, 8.0, 8.0);
        assert_eq!(pixel(&surface, 7, 7), [200, 0, 0]);
    }

    #[test]
    fn test_clear_rect_blacks_out() {
        let mut surface = RasterSurface::new(4, 4);
        surface.draw_image(&solid_frame(4, 4, [10, 20, 30]), 0.0, 0.0, 4.0, 4.0);
        surface.clear_rect(0.0, 0.0, 4.0, 4.0);
        assert!(surface.image().pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_stroked_rect_outline_only() {
        let mut surface = RasterSurface::new(40, 40);
        surface.set_stroke_style(YELLOW);
        surface.set_line_width(1.0);
        surface.begin_path();
        surface.rect(5.0, 5.0, 20.0, 20.0);
        surface.stroke();

        assert_eq!(pixel(&surface, 5, 5), [0xff, 0xeb, 0x3b]);
        assert_eq!(pixel(&surface, 25, 15), [0xff, 0xeb, 0x3b]);
        assert_eq!(pixel(&surface, 15, 15), [0, 0, 0]);
    }

    #[test]
    fn test_thick_stroke_widens_edge() {
        let mut surface = RasterSurface::new(40, 40);
        surface.set_stroke_style(YELLOW);
        surface.set_line_width(5.0);
        surface.begin_path();
        surface.move_to(5.0, 20.0);
        surface.line_to(35.0, 20.0);
        surface.stroke();

        assert_eq!(pixel(&surface, 20, 18), [0xff, 0xeb, 0x3b]);
        assert_eq!(pixel(&surface, 20, 22), [0xff, 0xeb, 0x3b]);
        assert_eq!(pixel(&surface, 20, 26), [0, 0, 0]);
    }

    #[test]
    fn test_huge_rect_stroke_is_clipped_to_canvas() {
        let mut surface = RasterSurface::new(40, 40);
        surface.set_stroke_style(YELLOW);
        surface.set_line_width(5.0);
        surface.begin_path();
        surface.rect(0.0, 0.0, 1e9, 10.0);

        let started = Instant::now();
        surface.stroke();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(pixel(&surface, 20, 0), [0xff, 0xeb, 0x3b]);
        assert_eq!(pixel(&surface, 20, 10), [0xff, 0xeb, 0x3b]);
        assert_eq!(pixel(&surface, 20, 5), [0, 0, 0]);
    }

    #[rstest]
    #[case::left_of_box((-50.0, 5.0), (-20.0, 5.0))]
    #[case::below_box((0.0, 50.0), (10.0, 60.0))]
    #[case::not_finite((0.0, 0.0), (f64::NAN, 5.0))]
    fn test_clip_segment_rejects_outside(#[case] from: (f64, f64), #[case] to: (f64, f64)) {
        assert_eq!(clip_segment(from, to, (0.0, 0.0), (10.0, 10.0)), None);
    }

    #[test]
    fn test_clip_segment_trims_crossing_segment() {
        let (from, to) = clip_segment((-10.0, 5.0), (1e9, 5.0), (0.0, 0.0), (10.0, 10.0)).unwrap();
        assert_abs_diff_eq!(from.0, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(to.0, 10.0, epsilon = 1e-6);
        assert_abs_diff_eq!(to.1, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_clip_segment_keeps_inside_segment() {
        let clipped = clip_segment((1.0, 2.0), (3.0, 4.0), (0.0, 0.0), (10.0, 10.0));
        assert_eq!(clipped, Some(((1.0, 2.0), (3.0, 4.0))));
    }

    #[test]
    fn test_filled_full_arc_is_disc() {
        let mut surface = RasterSurface::new(20, 20);
        surface.set_fill_style(YELLOW);
        surface.begin_path();
        surface.arc(10.0, 10.0, 5.0, 0.0, 2.0 * PI);
        surface.fill();

        assert_eq!(pixel(&surface, 10, 10), [0xff, 0xeb, 0x3b]);
        assert_eq!(pixel(&surface, 13, 10), [0xff, 0xeb, 0x3b]);
        assert_eq!(pixel(&surface, 0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_begin_path_discards_previous_subpaths() {
        let mut surface = RasterSurface::new(20, 20);
        surface.set_stroke_style(YELLOW);
        surface.begin_path();
        surface.rect(2.0, 2.0, 4.0, 4.0);
        surface.begin_path();
        surface.rect(12.0, 12.0, 4.0, 4.0);
        surface.stroke();

        assert_eq!(pixel(&surface, 2, 2), [0, 0, 0]);
        assert_eq!(pixel(&surface, 12, 12), [0xff, 0xeb, 0x3b]);
    }

    #[test]
    fn test_closed_polygon_fill_ignores_repeated_start() {
        let mut surface = RasterSurface::new(20, 20);
        surface.set_fill_style(YELLOW);
        surface.begin_path();
        surface.move_to(2.0, 2.0);
        surface.line_to(17.0, 2.0);
        surface.line_to(17.0, 17.0);
        surface.line_to(2.0, 17.0);
        surface.line_to(2.0, 2.0);
        surface.close_path();
        surface.fill();

        assert_eq!(pixel(&surface, 10, 10), [0xff, 0xeb, 0x3b]);
    }

    #[test]
    fn test_fill_text_uses_fill_color() {
        let mut surface = RasterSurface::new(60, 20);
        surface.set_fill_style(YELLOW);
        surface.set_font(&Font::new(14.0, "Mononoki"));
        surface.fill_text("ABC", 2.0, 16.0);
        assert!(surface
            .image()
            .pixels()
            .any(|p| p.0 == [0xff, 0xeb, 0x3b]));
    }

    #[test]
    fn test_resize_changes_dimensions() {
        let mut surface = RasterSurface::new(4, 4);
        surface.resize(16, 9);
        assert_eq!((surface.width(), surface.height()), (16, 9));
    }

    #[test]
    fn test_flush_writes_png_when_writer_attached() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PngSequenceWriter::create(dir.path()).unwrap();
        let mut surface = RasterSurface::new(4, 4).with_writer(writer);
        surface.flush().unwrap();
        surface.flush().unwrap();

        assert_eq!(surface.frames_presented(), 2);
        assert!(dir.path().join("frame_000001.png").exists());
    }
}

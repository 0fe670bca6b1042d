use std::fmt;

use crate::shared::frame::Frame;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `#rgb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').filter(|d| d.is_ascii())?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            6 => Some(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let short = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
                Some(Self::rgb(short(0)?, short(1)?, short(2)?))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    pub size_px: f64,
    pub family: String,
}

impl Font {
    pub fn new(size_px: f64, family: impl Into<String>) -> Self {
        Self {
            size_px,
            family: family.into(),
        }
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px {}", self.size_px, self.family)
    }
}

pub type PresentError = Box<dyn std::error::Error + Send + Sync>;

/// 2D drawing surface with canvas-style path primitives.
///
/// Coordinates are in surface pixels; text is positioned by its baseline.
/// Drawing is infallible; only [`flush`](RenderSurface::flush), which hands
/// a finished frame to whatever displays or stores it, can fail.
pub trait RenderSurface: Send {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Resizes the surface. Contents are discarded.
    fn resize(&mut self, width: u32, height: u32);

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn draw_image(&mut self, frame: &Frame, x: f64, y: f64, width: f64, height: f64);

    fn set_stroke_style(&mut self, color: Color);
    fn set_fill_style(&mut self, color: Color);
    fn set_font(&mut self, font: &Font);
    fn set_line_width(&mut self, width: f64);

    fn begin_path(&mut self);
    fn close_path(&mut self);
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64);

    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    fn stroke(&mut self);
    fn fill(&mut self);

    /// Presents the frame drawn since the last flush.
    fn flush(&mut self) -> Result<(), PresentError> {
        Ok(())
    }
}

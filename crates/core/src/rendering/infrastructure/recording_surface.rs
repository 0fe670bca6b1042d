use std::sync::{Arc, Mutex};

use crate::rendering::domain::render_surface::{Color, Font, PresentError, RenderSurface};
use crate::shared::frame::Frame;

/// One call made against a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Resize { width: u32, height: u32 },
    ClearRect { x: f64, y: f64, width: f64, height: f64 },
    DrawImage { frame_index: usize, x: f64, y: f64, width: f64, height: f64 },
    SetStrokeStyle(Color),
    SetFillStyle(Color),
    SetFont(Font),
    SetLineWidth(f64),
    BeginPath,
    ClosePath,
    Rect { x: f64, y: f64, width: f64, height: f64 },
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    Arc { x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64 },
    FillText { text: String, x: f64, y: f64 },
    Stroke,
    Fill,
    Flush,
}

/// Surface that records every drawing call instead of rasterising.
///
/// The command log is shared, so a handle taken before the surface is moved
/// into a pump still sees what the pump draws.
pub struct RecordingSurface {
    width: u32,
    height: u32,
    commands: Arc<Mutex<Vec<DrawCommand>>>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn commands_handle(&self) -> Arc<Mutex<Vec<DrawCommand>>> {
        Arc::clone(&self.commands)
    }

    pub fn commands(&self) -> Vec<DrawCommand> {
        self.commands
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record(&self, command: DrawCommand) {
        self.commands
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(command);
    }
}

impl RenderSurface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.record(DrawCommand::Resize { width, height });
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.record(DrawCommand::ClearRect { x, y, width, height });
    }

    fn draw_image(&mut self, frame: &Frame, x: f64, y: f64, width: f64, height: f64) {
        self.record(DrawCommand::DrawImage {
            frame_index: frame.index(),
            x,
            y,
            width,
            height,
        });
    }

    fn set_stroke_style(&mut self, color: Color) {
        self.record(DrawCommand::SetStrokeStyle(color));
    }

    fn set_fill_style(&mut self, color: Color) {
        self.record(DrawCommand::SetFillStyle(color));
    }

    fn set_font(&mut self, font: &Font) {
        self.record(DrawCommand::SetFont(font.clone()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.record(DrawCommand::SetLineWidth(width));
    }

    fn begin_path(&mut self) {
        self.record(DrawCommand::BeginPath);
    }

    fn close_path(&mut self) {
        self.record(DrawCommand::ClosePath);
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.record(DrawCommand::Rect { x, y, width, height });
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.record(DrawCommand::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.record(DrawCommand::LineTo { x, y });
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64) {
        self.record(DrawCommand::Arc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
        });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.record(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
        });
    }

    fn stroke(&mut self) {
        self.record(DrawCommand::Stroke);
    }

    fn fill(&mut self) {
        self.record(DrawCommand::Fill);
    }

    fn flush(&mut self) -> Result<(), PresentError> {
        self.record(DrawCommand::Flush);
        Ok(())
    }
}

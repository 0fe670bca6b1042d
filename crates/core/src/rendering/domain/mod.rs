pub mod overlay_renderer;
pub mod overlay_style;
pub mod render_surface;

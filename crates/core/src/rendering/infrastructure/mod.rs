mod bitmap_font;
pub mod png_sequence;
pub mod raster_surface;
pub mod recording_surface;

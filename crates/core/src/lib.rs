//! Camera capture with a single-flight detection loop and shape overlays.
//!
//! A [`pump::frame_pump::FramePump`] polls a video source once per display
//! refresh, fans the current frame out to the enabled detection
//! capabilities, and redraws the render surface when all of them have
//! answered.

pub mod capture;
pub mod detection;
pub mod pump;
pub mod rendering;
pub mod shared;
pub mod startup;

pub mod media_devices;
pub mod video_source;

pub mod capability_probe;
pub mod fallback_view;
pub mod session;

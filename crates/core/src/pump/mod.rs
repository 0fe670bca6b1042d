pub mod frame_pump;
pub mod infrastructure;
pub mod pass_logger;
pub mod pump_config;
pub mod pump_error;
pub mod pump_stats;

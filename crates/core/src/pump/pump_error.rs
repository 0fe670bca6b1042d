use thiserror::Error;

use crate::detection::domain::category::Category;
use crate::rendering::domain::render_surface::PresentError;

#[derive(Error, Debug)]
pub enum PumpError {
    #[error("no detection capabilities enabled")]
    NoCapabilities,

    #[error("capability {0} enabled more than once")]
    DuplicateCapability(Category),

    #[error("refresh rate must be a positive number of hertz, got {0}")]
    InvalidRefreshRate(f64),

    #[error("failed to spawn {category} detection worker: {source}")]
    Spawn {
        category: Category,
        #[source]
        source: std::io::Error,
    },

    #[error("a detection worker stopped unexpectedly")]
    WorkerLost,

    #[error("failed to present frame: {0}")]
    Present(#[source] PresentError),
}

use thiserror::Error;

use crate::capture::domain::media_devices::{CaptureError, MediaDevices};
use crate::detection::domain::capability::Capability;
use crate::detection::domain::category::Category;
use crate::pump::frame_pump::FramePump;
use crate::pump::pass_logger::PassLogger;
use crate::pump::pump_config::PumpConfig;
use crate::pump::pump_error::PumpError;
use crate::rendering::domain::overlay_renderer::OverlayRenderer;
use crate::rendering::domain::render_surface::RenderSurface;
use crate::startup::capability_probe::{probe, HostCapabilities};
use crate::startup::fallback_view::{apply_fallback, FallbackView};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartupState {
    Unstarted,
    Active,
    Fallback,
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("session already started")]
    AlreadyStarted,

    #[error("camera unavailable: {0}")]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Pump(#[from] PumpError),
}

pub enum StartupOutcome {
    /// Camera acquired and detection workers running.
    Active(FramePump),
    /// A required capability is missing; the view shows the fallback.
    Fallback(Vec<Category>),
}

/// One-shot startup: probe capabilities, acquire the camera, build the pump.
pub struct Session {
    config: PumpConfig,
    state: StartupState,
    logger: Option<Box<dyn PassLogger>>,
}

impl Session {
    pub fn new(config: PumpConfig) -> Self {
        Self {
            config,
            state: StartupState::Unstarted,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PassLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn state(&self) -> StartupState {
        self.state
    }

    pub fn config(&self) -> &PumpConfig {
        &self.config
    }

    /// Decides between the active loop and the fallback view.
    ///
    /// `capabilities` is everything the host offers; those not enabled in
    /// the config are dropped. Camera and pump failures are returned
    /// unchanged and leave the session unstarted.
    pub fn start(
        &mut self,
        capabilities: Vec<Capability>,
        devices: &mut dyn MediaDevices,
        view: &mut dyn FallbackView,
        surface: Box<dyn RenderSurface>,
    ) -> Result<StartupOutcome, StartupError> {
        if self.state != StartupState::Unstarted {
            return Err(StartupError::AlreadyStarted);
        }
        self.config.validate()?;

        let host = HostCapabilities::from_capabilities(&capabilities);
        if !probe(&self.config.capabilities, &host) {
            let missing = host.missing(&self.config.capabilities);
            log::warn!(
                "missing detection capabilities: {}",
                missing
                    .iter()
                    .map(|c| c.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            apply_fallback(view);
            self.state = StartupState::Fallback;
            return Ok(StartupOutcome::Fallback(missing));
        }

        let enabled: Vec<Capability> = capabilities
            .into_iter()
            .filter(|c| self.config.is_enabled(c.category()))
            .collect();

        let source = devices.get_user_media(&self.config.constraints)?;
        if let Some((width, height)) = source.dimensions() {
            log::info!("camera opened at {width}x{height}");
        }

        let renderer = OverlayRenderer::new(self.config.styles.clone());
        let mut pump = FramePump::new(source, enabled, surface, renderer)?;
        if let Some(logger) = self.logger.take() {
            pump = pump.with_logger(logger);
        }
        self.state = StartupState::Active;
        Ok(StartupOutcome::Active(pump))
    }
}

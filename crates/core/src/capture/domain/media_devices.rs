use std::fmt;
use std::str::FromStr;

use crate::capture::domain::video_source::VideoSource;

/// Which way the requested camera should face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FacingMode {
    /// Towards the user (front/selfie camera).
    User,
    /// Away from the user (rear camera).
    Environment,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "front" => Ok(FacingMode::User),
            "environment" | "rear" | "back" => Ok(FacingMode::Environment),
            other => Err(format!(
                "unknown facing mode '{other}' (expected user or environment)"
            )),
        }
    }
}

/// Camera request passed to [`MediaDevices::get_user_media`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VideoConstraints {
    /// Any available camera.
    #[default]
    Any,
    /// A camera with the given facing, falling back to any camera.
    Facing(FacingMode),
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("camera access denied: {0}")]
    PermissionDenied(String),
    #[error("no camera matches {0:?}")]
    NotFound(VideoConstraints),
    #[error("failed to open camera {device}: {message}")]
    Open { device: String, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Grants access to cameras.
pub trait MediaDevices {
    fn get_user_media(
        &mut self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoSource>, CaptureError>;
}

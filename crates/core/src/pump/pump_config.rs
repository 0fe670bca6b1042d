use std::time::Duration;

use crate::capture::domain::media_devices::VideoConstraints;
use crate::detection::domain::category::Category;
use crate::pump::pump_error::PumpError;
use crate::rendering::domain::overlay_style::OverlayStyles;
use crate::shared::constants::DEFAULT_REFRESH_RATE_HZ;

/// Settings for one capture session.
///
/// `capabilities` lists the categories that must be available for the pump
/// to start. A single-category list is the face-only demo; all three is the
/// full demo with the startup probe.
#[derive(Clone, Debug, PartialEq)]
pub struct PumpConfig {
    pub capabilities: Vec<Category>,
    pub refresh_rate_hz: f64,
    pub constraints: VideoConstraints,
    pub styles: OverlayStyles,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            capabilities: Category::PRIORITY.to_vec(),
            refresh_rate_hz: DEFAULT_REFRESH_RATE_HZ,
            constraints: VideoConstraints::Any,
            styles: OverlayStyles::default(),
        }
    }
}

impl PumpConfig {
    pub fn face_only() -> Self {
        Self {
            capabilities: vec![Category::Face],
            ..Self::default()
        }
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        self.capabilities.contains(&category)
    }

    /// Time between ticks. Fails for rates whose period does not fit in a
    /// [`Duration`].
    pub fn tick_interval(&self) -> Result<Duration, PumpError> {
        if !self.refresh_rate_hz.is_finite() || self.refresh_rate_hz <= 0.0 {
            return Err(PumpError::InvalidRefreshRate(self.refresh_rate_hz));
        }
        Duration::try_from_secs_f64(1.0 / self.refresh_rate_hz)
            .map_err(|_| PumpError::InvalidRefreshRate(self.refresh_rate_hz))
    }

    pub fn validate(&self) -> Result<(), PumpError> {
        if self.capabilities.is_empty() {
            return Err(PumpError::NoCapabilities);
        }
        for (i, category) in self.capabilities.iter().enumerate() {
            if self.capabilities[..i].contains(category) {
                return Err(PumpError::DuplicateCapability(*category));
            }
        }
        self.tick_interval()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_default_enables_everything() {
        let config = PumpConfig::default();
        assert_eq!(
            config.capabilities,
            vec![Category::Face, Category::Text, Category::Barcode]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_face_only() {
        let config = PumpConfig::face_only();
        assert!(config.is_enabled(Category::Face));
        assert!(!config.is_enabled(Category::Barcode));
    }

    #[test]
    fn test_tick_interval() {
        let config = PumpConfig {
            refresh_rate_hz: 50.0,
            ..PumpConfig::default()
        };
        assert_relative_eq!(config.tick_interval().unwrap().as_secs_f64(), 0.02);
    }

    #[test]
    fn test_validate_rejects_empty() {
        let config = PumpConfig {
            capabilities: Vec::new(),
            ..PumpConfig::default()
        };
        assert!(matches!(config.validate(), Err(PumpError::NoCapabilities)));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let config = PumpConfig {
            capabilities: vec![Category::Text, Category::Face, Category::Text],
            ..PumpConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PumpError::DuplicateCapability(Category::Text))
        ));
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-30.0)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    #[case::period_overflows_duration(1e-20)]
    fn test_validate_rejects_refresh_rate(#[case] hz: f64) {
        let config = PumpConfig {
            refresh_rate_hz: hz,
            ..PumpConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PumpError::InvalidRefreshRate(_))
        ));
        assert!(matches!(
            config.tick_interval(),
            Err(PumpError::InvalidRefreshRate(_))
        ));
    }
}

//! Customer-facing print settings.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SettingsError};
use crate::pricing::PricingMode;

/// Accepted infill percentages.
pub const INFILL_RANGE: RangeInclusive<f64> = 10.0..=100.0;
/// Accepted print speeds (mm/s).
pub const SPEED_RANGE: RangeInclusive<f64> = 20.0..=100.0;

/// Print settings chosen alongside the material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfiguration {
    /// Infill density (%).
    pub infill_percentage: f64,
    /// Layer height (mm). Smaller is finer and slower.
    pub layer_height: f64,
    /// Print speed (mm/s).
    pub print_speed: f64,
    /// Pricing regime.
    pub pricing_mode: PricingMode,
    /// Support material. Always printed; kept for display.
    pub support: bool,
}

impl Default for PrintConfiguration {
    fn default() -> Self {
        Self {
            infill_percentage: 20.0,
            layer_height: 0.2,
            print_speed: 60.0,
            pricing_mode: PricingMode::Regular,
            support: true,
        }
    }
}

impl PrintConfiguration {
    /// Check every setting is within the range the shop accepts.
    pub fn validate(&self) -> Result<()> {
        check("infill_percentage", self.infill_percentage, &INFILL_RANGE)?;
        if !(self.layer_height.is_finite() && self.layer_height > 0.0) {
            return Err(SettingsError::NotPositive {
                field: "layer_height",
                value: self.layer_height,
            });
        }
        check("print_speed", self.print_speed, &SPEED_RANGE)?;
        if !self.support {
            return Err(SettingsError::SupportDisabled);
        }
        Ok(())
    }

    /// Copy with every setting forced into range.
    ///
    /// Infill and speed are clamped; NaN falls back to the default. Layer
    /// height has no upper bound and only a non-finite or non-positive value
    /// is replaced by the default.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let sanitized = Self {
            infill_percentage: clamp(self.infill_percentage, &INFILL_RANGE, defaults.infill_percentage),
            layer_height: if self.layer_height.is_finite() && self.layer_height > 0.0 {
                self.layer_height
            } else {
                defaults.layer_height
            },
            print_speed: clamp(self.print_speed, &SPEED_RANGE, defaults.print_speed),
            pricing_mode: self.pricing_mode,
            support: true,
        };
        if sanitized != *self {
            tracing::debug!(original = ?self, ?sanitized, "print configuration clamped");
        }
        sanitized
    }

    /// Quality label for the layer height.
    pub fn quality_label(&self) -> &'static str {
        match self.layer_height {
            h if h <= 0.1 => "Ultra Fine",
            h if h <= 0.15 => "Fine",
            h if h <= 0.2 => "Standard",
            h if h <= 0.3 => "Draft",
            _ => "Ultra Draft",
        }
    }

    /// Speed profile label for the print speed.
    pub fn speed_label(&self) -> &'static str {
        match self.print_speed {
            s if s <= 30.0 => "Slow & Precise",
            s if s <= 50.0 => "Balanced",
            s if s <= 70.0 => "Standard",
            s if s <= 90.0 => "Fast",
            _ => "Ultra Fast",
        }
    }
}

fn check(field: &'static str, value: f64, range: &RangeInclusive<f64>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

fn clamp(value: f64, range: &RangeInclusive<f64>, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(*range.start(), *range.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let config = PrintConfiguration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sanitized(), config);
        assert_eq!(config.quality_label(), "Standard");
        assert_eq!(config.speed_label(), "Standard");
    }

    #[test]
    fn test_invalid_settings() {
        let config = PrintConfiguration {
            infill_percentage: 5.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SettingsError::OutOfRange { field: "infill_percentage", .. })
        ));

        let config = PrintConfiguration {
            print_speed: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PrintConfiguration {
            support: false,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(SettingsError::SupportDisabled));

        let config = PrintConfiguration {
            layer_height: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SettingsError::NotPositive { field: "layer_height", .. })
        ));
    }

    #[test]
    fn test_coarse_and_fine_layers_kept() {
        for layer_height in [0.04, 0.5, 0.6] {
            let config = PrintConfiguration {
                layer_height,
                ..Default::default()
            };
            assert!(config.validate().is_ok());
            assert_eq!(config.sanitized().layer_height, layer_height);
        }
        let config = PrintConfiguration {
            layer_height: f64::INFINITY,
            ..Default::default()
        };
        assert_eq!(config.sanitized().layer_height, 0.2);
    }

    #[test]
    fn test_sanitized() {
        let config = PrintConfiguration {
            infill_percentage: 150.0,
            layer_height: 0.0,
            print_speed: f64::NAN,
            pricing_mode: PricingMode::Batch,
            support: false,
        }
        .sanitized();
        assert_eq!(config.infill_percentage, 100.0);
        assert_eq!(config.layer_height, 0.2);
        assert_eq!(config.print_speed, 60.0);
        assert_eq!(config.pricing_mode, PricingMode::Batch);
        assert!(config.support);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_labels() {
        let label = |layer_height, print_speed| {
            let c = PrintConfiguration {
                layer_height,
                print_speed,
                ..Default::default()
            };
            (c.quality_label(), c.speed_label())
        };
        assert_eq!(label(0.1, 30.0), ("Ultra Fine", "Slow & Precise"));
        assert_eq!(label(0.12, 45.0), ("Fine", "Balanced"));
        assert_eq!(label(0.28, 85.0), ("Draft", "Fast"));
        assert_eq!(label(0.35, 100.0), ("Ultra Draft", "Ultra Fast"));
    }

    #[test]
    fn test_partial_toml_style_defaults() {
        let config: PrintConfiguration =
            serde_json::from_str(r#"{"pricing_mode": "batch", "infill_percentage": 40}"#).unwrap();
        assert_eq!(config.pricing_mode, PricingMode::Batch);
        assert_eq!(config.infill_percentage, 40.0);
        assert_eq!(config.layer_height, 0.2);
    }
}

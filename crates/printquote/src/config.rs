//! Shop configuration loaded from TOML.
//!
//! Every field has a default, so an empty file reproduces the built-in
//! Brisbane shop:
//!
//! ```toml
//! material = "petg"
//! geolocation_timeout_ms = 5000
//!
//! [print]
//! pricing_mode = "batch"
//!
//! [delivery.costs]
//! international = 60.0
//! ```

use std::path::Path;
use std::time::Duration;

use printquote_cost::{Material, PrintConfiguration};
use printquote_delivery::DeliveryPolicy;
use serde::{Deserialize, Serialize};

use crate::error::{QuoteError, Result};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "PRINTQUOTE_CONFIG";

/// Quoting defaults and shop policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    /// Material id selected before the customer picks one.
    pub material: String,
    /// Print settings selected before the customer changes them.
    pub print: PrintConfiguration,
    /// Shop location, zones and delivery charges.
    pub delivery: DeliveryPolicy,
    /// How long to wait for a device position (ms).
    pub geolocation_timeout_ms: u64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            material: "pla".into(),
            print: PrintConfiguration::default(),
            delivery: DeliveryPolicy::default(),
            geolocation_timeout_ms: 10_000,
        }
    }
}

impl QuoteConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded quote config");
        Ok(config)
    }

    /// Load from an explicit path, else from `PRINTQUOTE_CONFIG`, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Default material, resolved against the catalog.
    pub fn default_material(&self) -> Result<&'static Material> {
        Material::by_id(&self.material).ok_or_else(|| QuoteError::UnknownMaterial(self.material.clone()))
    }

    /// Geolocation timeout.
    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.geolocation_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printquote_cost::PricingMode;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(QuoteConfig::from_toml_str("").unwrap(), QuoteConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = QuoteConfig::from_toml_str(
            r#"
            material = "petg"
            geolocation_timeout_ms = 2500

            [print]
            pricing_mode = "batch"
            infill_percentage = 35.0

            [delivery]
            fallback_shipping_days = 4.0

            [delivery.costs]
            international = 60.0

            [delivery.home]
            city = "Perth"
            state_names = ["WA"]
            metro_postcodes = [[6000, 6199]]
            "#,
        )
        .unwrap();

        assert_eq!(config.default_material().unwrap().name, "PETG");
        assert_eq!(config.geolocation_timeout(), Duration::from_millis(2500));
        assert_eq!(config.print.pricing_mode, PricingMode::Batch);
        assert_eq!(config.print.layer_height, 0.2);
        assert_eq!(config.delivery.fallback_shipping_days, 4.0);
        assert_eq!(config.delivery.costs.international, 60.0);
        assert_eq!(config.delivery.costs.metro, 10.0);
        assert_eq!(config.delivery.home.city, "Perth");
        assert_eq!(config.delivery.home.country_names[0], "Australia");
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            QuoteConfig::from_toml_str("material = ["),
            Err(QuoteError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_material() {
        let config = QuoteConfig {
            material: "unobtainium".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.default_material(),
            Err(QuoteError::UnknownMaterial(id)) if id == "unobtainium"
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            QuoteConfig::load("/nonexistent/printquote.toml"),
            Err(QuoteError::Io(_))
        ));
    }
}

#![warn(missing_docs)]

//! Cost estimation for 3D print quotes.
//!
//! Turns a model volume, a catalog material and a [`PrintConfiguration`]
//! into an itemized [`CostBreakdown`]. The engine is total: bad numeric
//! input is clamped rather than rejected.
//!
//! # Example
//!
//! ```
//! use printquote_cost::{estimate_cost, Material, PrintConfiguration};
//!
//! let pla = Material::by_id("pla").unwrap();
//! let cost = estimate_cost(42.0, pla, &PrintConfiguration::default());
//! assert!(cost.total_cost >= cost.details.minimum_cost);
//! ```

pub mod error;
pub mod format;
pub mod material;
pub mod pricing;
pub mod settings;

pub use error::{Result, SettingsError};
pub use format::{format_cost, format_print_time, format_weight};
pub use material::{estimated_weights, Material, MaterialCategory, MATERIALS};
pub use pricing::{batch_cost, tiered_cost, ChargeBasis, PriceTier, PricingMode, PrintingCharge};
pub use settings::PrintConfiguration;

use serde::{Deserialize, Serialize};

/// Print hours per cm³ at the reference settings.
pub const HOURS_PER_CM3: f64 = 0.06;
/// Cheapest job for the standard category ($), scaled by time multiplier.
pub const MINIMUM_COST: f64 = 15.0;
/// Share of material cost in the weighted price.
pub const MATERIAL_WEIGHT: f64 = 0.3;
/// Share of printing cost in the weighted price.
pub const PRINTING_WEIGHT: f64 = 0.7;

const REFERENCE_LAYER_HEIGHT: f64 = 0.2;
const REFERENCE_INFILL: f64 = 20.0;
const REFERENCE_SPEED: f64 = 60.0;

/// Itemized cost of printing one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Filament cost ($).
    pub material_cost: f64,
    /// Machine-time cost ($).
    pub printing_cost: f64,
    /// Support material cost ($).
    pub support_cost: f64,
    /// Weighted cost after the minimum floor, before delivery ($).
    pub base_cost: f64,
    /// Amount charged: base cost plus delivery when known ($).
    pub total_cost: f64,
    /// Printed weight (g).
    pub weight_grams: f64,
    /// Estimated print time (hours).
    pub print_time_hours: f64,
    /// Intermediate values.
    pub details: CostDetails,
}

/// Intermediate values behind a [`CostBreakdown`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostDetails {
    /// Printed weight (kg).
    pub material_weight_kg: f64,
    /// Filament price ($/kg).
    pub price_per_kg: f64,
    /// Batch machine rate ($/hour), batch mode only.
    pub hourly_rate: Option<f64>,
    /// Time band, regular mode only.
    pub tier: Option<PriceTier>,
    /// Whether the minimum replaced the weighted cost.
    pub minimum_applied: bool,
    /// Minimum for the material's category ($).
    pub minimum_cost: f64,
    /// Weighted cost before the minimum floor ($).
    pub weighted_cost: f64,
    /// Delivery charge included in `total_cost` ($).
    pub delivery_cost: Option<f64>,
}

impl CostBreakdown {
    /// Copy whose total includes a delivery charge.
    ///
    /// The charge replaces any earlier one rather than stacking.
    pub fn with_delivery(&self, delivery_cost: f64) -> Self {
        let delivery_cost = if delivery_cost.is_finite() {
            delivery_cost.max(0.0)
        } else {
            0.0
        };
        let mut out = *self;
        out.total_cost = self.base_cost + delivery_cost;
        out.details.delivery_cost = Some(delivery_cost);
        out
    }
}

/// Estimated print time (hours) for `volume` cm³.
///
/// The configuration is used as given; callers wanting range guarantees
/// should pass [`PrintConfiguration::sanitized`].
pub fn print_time_hours(volume: f64, category: MaterialCategory, config: &PrintConfiguration) -> f64 {
    let layer_height_factor = REFERENCE_LAYER_HEIGHT / config.layer_height;
    let infill_factor = 1.0 + (config.infill_percentage - REFERENCE_INFILL) / 100.0;
    let speed_factor = REFERENCE_SPEED / config.print_speed;
    volume
        * HOURS_PER_CM3
        * layer_height_factor
        * infill_factor
        * speed_factor
        * category.time_multiplier()
}

/// Price a model of `volume` cm³.
///
/// Negative, NaN or infinite volumes are priced as zero, which lands on the
/// category minimum. Settings are clamped with
/// [`PrintConfiguration::sanitized`].
pub fn estimate_cost(volume: f64, material: &Material, config: &PrintConfiguration) -> CostBreakdown {
    let volume = if volume.is_finite() && volume > 0.0 {
        volume
    } else {
        0.0
    };
    let config = config.sanitized();
    let category = material.category;

    let weight_kg = volume * category.density() / 1000.0;
    let weight_grams = weight_kg * 1000.0;
    let material_cost = weight_kg * material.price_per_kg;

    let hours = print_time_hours(volume, category, &config);
    let charge = config.pricing_mode.printing_charge(hours, category);
    let printing_cost = charge.cost;

    // Support is always printed.
    let support_cost = material_cost * 0.15 + printing_cost * 0.1;

    let weighted_cost =
        material_cost * MATERIAL_WEIGHT + printing_cost * PRINTING_WEIGHT + support_cost;
    let minimum_cost = MINIMUM_COST * category.time_multiplier();
    let minimum_applied = weighted_cost < minimum_cost;
    let base_cost = if minimum_applied {
        minimum_cost
    } else {
        weighted_cost
    };

    let (hourly_rate, tier) = match charge.basis {
        ChargeBasis::Hourly { rate } => (Some(rate), None),
        ChargeBasis::Tiered { tier } => (None, Some(tier)),
    };

    tracing::trace!(
        material = material.id,
        volume,
        hours,
        base_cost,
        minimum_applied,
        "estimated cost"
    );

    CostBreakdown {
        material_cost,
        printing_cost,
        support_cost,
        base_cost,
        total_cost: base_cost,
        weight_grams,
        print_time_hours: hours,
        details: CostDetails {
            material_weight_kg: weight_kg,
            price_per_kg: material.price_per_kg,
            hourly_rate,
            tier,
            minimum_applied,
            minimum_cost,
            weighted_cost,
            delivery_cost: None,
        },
    }
}

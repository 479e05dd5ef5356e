//! Printing-cost regimes.
//!
//! Regular jobs are priced on a stepped time tier table; batch jobs pay a
//! flat machine rate. Both scale with the material category.

use serde::{Deserialize, Serialize};

use crate::material::MaterialCategory;

/// How machine time is charged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingMode {
    /// Priority queue, tiered by print time.
    #[default]
    Regular,
    /// Batched with other jobs, charged per hour.
    Batch,
}

impl PricingMode {
    /// Printing cost of a job taking `hours` in a material of `category`.
    pub fn printing_charge(self, hours: f64, category: MaterialCategory) -> PrintingCharge {
        match self {
            PricingMode::Regular => {
                let (cost, tier) = tiered_cost(hours, category);
                PrintingCharge {
                    cost,
                    basis: ChargeBasis::Tiered { tier },
                }
            }
            PricingMode::Batch => PrintingCharge {
                cost: batch_cost(hours, category),
                basis: ChargeBasis::Hourly {
                    rate: category.hourly_rate(),
                },
            },
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            PricingMode::Regular => "regular",
            PricingMode::Batch => "batch",
        }
    }
}

/// Regular-mode time band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceTier {
    /// Under one hour.
    #[serde(rename = "Less than 1 hour")]
    UnderOneHour,
    /// One to three hours.
    #[serde(rename = "1-3 hours")]
    OneToThreeHours,
    /// Three to six hours.
    #[serde(rename = "3-6 hours")]
    ThreeToSixHours,
    /// Six hours or more.
    #[serde(rename = "6+ hours")]
    SixHoursPlus,
}

impl PriceTier {
    /// Band containing `hours`. Lower bounds are inclusive.
    pub fn for_hours(hours: f64) -> Self {
        if hours < 1.0 {
            PriceTier::UnderOneHour
        } else if hours < 3.0 {
            PriceTier::OneToThreeHours
        } else if hours < 6.0 {
            PriceTier::ThreeToSixHours
        } else {
            PriceTier::SixHoursPlus
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            PriceTier::UnderOneHour => "Less than 1 hour",
            PriceTier::OneToThreeHours => "1-3 hours",
            PriceTier::ThreeToSixHours => "3-6 hours",
            PriceTier::SixHoursPlus => "6+ hours",
        }
    }

    /// Hour at which the band starts.
    pub fn start_hour(self) -> f64 {
        match self {
            PriceTier::UnderOneHour => 0.0,
            PriceTier::OneToThreeHours => 1.0,
            PriceTier::ThreeToSixHours => 3.0,
            PriceTier::SixHoursPlus => 6.0,
        }
    }

    /// Standard-category charge at the start of the band ($).
    pub fn base_price(self) -> f64 {
        match self {
            PriceTier::UnderOneHour => 10.0,
            PriceTier::OneToThreeHours => 30.0,
            PriceTier::ThreeToSixHours => 60.0,
            PriceTier::SixHoursPlus => 100.0,
        }
    }

    /// Standard-category rate within the band ($/hour).
    pub fn hourly_rate(self) -> f64 {
        match self {
            PriceTier::UnderOneHour => 5.0,
            PriceTier::OneToThreeHours => 7.5,
            PriceTier::ThreeToSixHours => 10.0,
            PriceTier::SixHoursPlus => 8.33,
        }
    }
}

/// Printing cost with the basis it was charged on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintingCharge {
    /// Cost ($).
    pub cost: f64,
    /// Rate or tier used.
    pub basis: ChargeBasis,
}

/// Pricing basis recorded alongside the printing cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChargeBasis {
    /// Batch: flat rate per hour.
    Hourly {
        /// Rate applied ($/hour).
        rate: f64,
    },
    /// Regular: time band.
    Tiered {
        /// Band applied.
        tier: PriceTier,
    },
}

/// Batch printing cost: hours at the category's machine rate.
pub fn batch_cost(hours: f64, category: MaterialCategory) -> f64 {
    hours * category.hourly_rate()
}

/// Regular printing cost and the band it fell in.
///
/// Base, rate and the six-hour cap all scale with the category's time
/// multiplier. The table is stepped: crossing a band boundary jumps to the
/// next band's base price.
pub fn tiered_cost(hours: f64, category: MaterialCategory) -> (f64, PriceTier) {
    let tier = PriceTier::for_hours(hours);
    let multiplier = category.time_multiplier();
    let base = tier.base_price() * multiplier;
    let rate = tier.hourly_rate() * multiplier;
    let mut cost = base + (hours - tier.start_hour()) * rate;
    if tier == PriceTier::SixHoursPlus {
        cost = cost.min(category.regular_cap());
    }
    (cost, tier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tier_boundaries_inclusive() {
        assert_eq!(PriceTier::for_hours(0.0), PriceTier::UnderOneHour);
        assert_eq!(PriceTier::for_hours(0.999), PriceTier::UnderOneHour);
        assert_eq!(PriceTier::for_hours(1.0), PriceTier::OneToThreeHours);
        assert_eq!(PriceTier::for_hours(3.0), PriceTier::ThreeToSixHours);
        assert_eq!(PriceTier::for_hours(6.0), PriceTier::SixHoursPlus);
    }

    #[test]
    fn test_stepped_jump_at_one_hour() {
        let (below, _) = tiered_cost(0.999_999, MaterialCategory::Standard);
        let (at, tier) = tiered_cost(1.0, MaterialCategory::Standard);
        assert_relative_eq!(below, 15.0, epsilon = 1e-4);
        assert_eq!(at, 30.0);
        assert_eq!(tier, PriceTier::OneToThreeHours);
    }

    #[test]
    fn test_band_bases() {
        assert_eq!(tiered_cost(3.0, MaterialCategory::Standard).0, 60.0);
        assert_eq!(tiered_cost(6.0, MaterialCategory::Standard).0, 100.0);
        assert_relative_eq!(tiered_cost(2.0, MaterialCategory::Standard).0, 37.5);
        assert_relative_eq!(tiered_cost(4.5, MaterialCategory::Standard).0, 75.0);
    }

    #[test]
    fn test_category_scaling() {
        let (standard, _) = tiered_cost(2.0, MaterialCategory::Standard);
        let (reinforced, _) = tiered_cost(2.0, MaterialCategory::Reinforced);
        assert_relative_eq!(reinforced, standard * 1.6, max_relative = 1e-12);
    }

    #[test]
    fn test_cap() {
        for category in MaterialCategory::ALL {
            let (cost, tier) = tiered_cost(500.0, category);
            assert_eq!(tier, PriceTier::SixHoursPlus);
            assert_eq!(cost, category.regular_cap());
        }
        // Just past six hours the cap is not yet reached.
        assert!(tiered_cost(7.0, MaterialCategory::Standard).0 < 150.0);
    }

    #[test]
    fn test_batch_linear() {
        for category in MaterialCategory::ALL {
            let one = batch_cost(1.0, category);
            assert_eq!(batch_cost(0.0, category), 0.0);
            for hours in [0.5, 2.0, 7.25, 40.0] {
                assert_relative_eq!(batch_cost(hours, category), one * hours, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_mode_dispatch() {
        let charge = PricingMode::Batch.printing_charge(2.0, MaterialCategory::Exotic);
        assert_eq!(charge.cost, 20.0);
        assert_eq!(charge.basis, ChargeBasis::Hourly { rate: 10.0 });

        let charge = PricingMode::Regular.printing_charge(2.0, MaterialCategory::Standard);
        assert_eq!(
            charge.basis,
            ChargeBasis::Tiered {
                tier: PriceTier::OneToThreeHours
            }
        );
    }
}

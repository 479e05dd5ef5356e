//! Delivery zones and their shipping times and charges.

use serde::{Deserialize, Serialize};

/// Distance band upper bounds (km) for metro, home state and domestic.
pub const DISTANCE_BANDS_KM: [f64; 3] = [50.0, 500.0, 2000.0];

/// Destination bucket relative to the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryZone {
    /// Shop's metropolitan area.
    Metro,
    /// Elsewhere in the shop's state.
    HomeState,
    /// Elsewhere in the shop's country.
    Domestic,
    /// Another country.
    International,
}

impl DeliveryZone {
    /// Days in transit.
    pub fn shipping_days(self) -> f64 {
        match self {
            DeliveryZone::Metro => 1.0,
            DeliveryZone::HomeState => 2.0,
            DeliveryZone::Domestic => 3.0,
            DeliveryZone::International => 7.0,
        }
    }

    /// Zone for a straight-line distance from the shop.
    pub fn from_distance_km(distance: f64) -> Self {
        let [metro, state, domestic] = DISTANCE_BANDS_KM;
        if distance < metro {
            DeliveryZone::Metro
        } else if distance < state {
            DeliveryZone::HomeState
        } else if distance < domestic {
            DeliveryZone::Domestic
        } else {
            DeliveryZone::International
        }
    }
}

/// Flat delivery charge per zone ($).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryCosts {
    /// Metro charge.
    pub metro: f64,
    /// Home-state charge.
    pub home_state: f64,
    /// Domestic charge.
    pub domestic: f64,
    /// International charge.
    pub international: f64,
}

impl Default for DeliveryCosts {
    fn default() -> Self {
        Self {
            metro: 10.0,
            home_state: 15.0,
            domestic: 20.0,
            international: 45.0,
        }
    }
}

impl DeliveryCosts {
    /// Charge for a zone; an unknown zone is quoted at the domestic rate.
    pub fn for_zone(&self, zone: Option<DeliveryZone>) -> f64 {
        match zone {
            Some(DeliveryZone::Metro) => self.metro,
            Some(DeliveryZone::HomeState) => self.home_state,
            Some(DeliveryZone::Domestic) | None => self.domestic,
            Some(DeliveryZone::International) => self.international,
        }
    }
}

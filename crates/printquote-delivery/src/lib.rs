#![warn(missing_docs)]

//! Delivery estimation for 3D print quotes.
//!
//! Turns a print time and whatever is known about the destination (postal
//! address, device position, or nothing) into a staged [`EtaCalculation`]
//! and a delivery charge.
//!
//! # Example
//!
//! ```
//! use printquote_delivery::{estimate_eta_now, DeliveryPolicy, Destination};
//!
//! let eta = estimate_eta_now(6.0, &Destination::default(), &DeliveryPolicy::default());
//! assert_eq!(eta.shipping_days, 3.0);
//! ```

pub mod address;
pub mod error;
pub mod eta;
pub mod format;
pub mod geo;
pub mod zone;

pub use address::{AddressDescriptor, HomeRegion};
pub use error::LocationError;
pub use eta::{
    estimate_eta, estimate_eta_now, Destination, EtaCalculation, EtaSource, LocationFix, Urgency,
};
pub use format::{format_delivery_date, format_duration};
pub use geo::{haversine_km, GeoPoint};
pub use zone::{DeliveryCosts, DeliveryZone};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Shop location, delivery charges and fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryPolicy {
    /// Where orders ship from.
    pub origin: GeoPoint,
    /// Region used to classify addresses.
    pub home: HomeRegion,
    /// Charge per zone.
    pub costs: DeliveryCosts,
    /// Shipping days when no destination signal is usable.
    pub fallback_shipping_days: f64,
    /// Shop's UTC offset in hours, for displaying dates.
    pub utc_offset_hours: i32,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            origin: GeoPoint::new(-27.4698, 153.0251),
            home: HomeRegion::default(),
            costs: DeliveryCosts::default(),
            fallback_shipping_days: 3.0,
            utc_offset_hours: 10,
        }
    }
}

impl DeliveryPolicy {
    /// Delivery charge for an estimate, `None` when no zone was resolved.
    pub fn delivery_cost(&self, eta: &EtaCalculation) -> Option<f64> {
        eta.zone().map(|zone| self.costs.for_zone(Some(zone)))
    }

    /// Convert a timestamp to the shop's local time.
    ///
    /// An out-of-range offset falls back to UTC.
    pub fn local_time(&self, date: DateTime<Utc>) -> DateTime<FixedOffset> {
        let offset = self
            .utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        date.with_timezone(&offset)
    }

    /// Short local delivery date for an estimate, e.g. `Thu 15 Oct`.
    pub fn delivery_date_label(&self, eta: &EtaCalculation) -> String {
        format_delivery_date(&self.local_time(eta.estimated_date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_delivery_cost_follows_zone() {
        let policy = DeliveryPolicy::default();
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 0, 0, 0).unwrap();
        let address = AddressDescriptor {
            city: "Perth".into(),
            state: "WA".into(),
            postal_code: "6000".into(),
            country: "Australia".into(),
        };
        let eta = estimate_eta(3.0, &Destination::from_address(address), &policy, now);
        assert_eq!(policy.delivery_cost(&eta), Some(20.0));

        let eta = estimate_eta(3.0, &Destination::default(), &policy, now);
        assert_eq!(policy.delivery_cost(&eta), None);
    }

    #[test]
    fn test_local_date_label() {
        let policy = DeliveryPolicy::default();
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 6, 0, 0).unwrap();
        // 0.5 prep + 3 shipping + a little print time: lands on Sunday local.
        let eta = estimate_eta(1.0, &Destination::default(), &policy, now);
        assert_eq!(policy.delivery_date_label(&eta), "Sun 18 Oct");
    }

    #[test]
    fn test_bad_offset_falls_back_to_utc() {
        let policy = DeliveryPolicy {
            utc_offset_hours: 99,
            ..Default::default()
        };
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 23, 0, 0).unwrap();
        assert_eq!(policy.local_time(now).offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_policy_from_partial_json() {
        let policy: DeliveryPolicy =
            serde_json::from_str(r#"{"costs": {"international": 60.0}}"#).unwrap();
        assert_eq!(policy.costs.international, 60.0);
        assert_eq!(policy.costs.metro, 10.0);
        assert_eq!(policy.fallback_shipping_days, 3.0);
    }
}

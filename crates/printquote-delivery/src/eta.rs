//! Staged delivery estimate.
//!
//! Total time is print time, preparation, queueing and shipping. Shipping
//! comes from the first usable destination signal: a classifiable address,
//! then a device position, then the policy's fallback.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::address::AddressDescriptor;
use crate::error::LocationError;
use crate::geo::{haversine_km, GeoPoint};
use crate::zone::DeliveryZone;
use crate::DeliveryPolicy;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Outcome of a one-shot device geolocation request.
pub type LocationFix = std::result::Result<GeoPoint, LocationError>;

/// Everything known about where the order is going.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Destination {
    /// Postal address, if entered.
    pub address: Option<AddressDescriptor>,
    /// Device position, if requested.
    pub location: Option<LocationFix>,
}

impl Destination {
    /// Destination known only by address.
    pub fn from_address(address: AddressDescriptor) -> Self {
        Self {
            address: Some(address),
            location: None,
        }
    }

    /// Destination known only by a geolocation attempt.
    pub fn from_location(location: LocationFix) -> Self {
        Self {
            address: None,
            location: Some(location),
        }
    }
}

/// Which destination signal set the shipping time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EtaSource {
    /// Postal address classified into a zone.
    Address {
        /// Zone.
        zone: DeliveryZone,
        /// Human-readable zone label.
        location_info: String,
    },
    /// Device position.
    Geolocation {
        /// Zone implied by the distance.
        zone: DeliveryZone,
        /// Great-circle distance to the shop (km).
        distance_km: f64,
        /// Device coordinates.
        coordinates: GeoPoint,
    },
    /// Neither signal was usable.
    Fallback {
        /// Why geolocation was not used, if it was attempted.
        reason: Option<String>,
    },
}

/// Staged delivery estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtaCalculation {
    /// Expected arrival.
    pub estimated_date: DateTime<Utc>,
    /// Machine time (days).
    pub print_time_days: f64,
    /// Post-processing and packing (days).
    pub prep_days: f64,
    /// Wait before the job starts (days).
    pub queue_delay_days: f64,
    /// Transit (days).
    pub shipping_days: f64,
    /// Sum of the four stages (days).
    pub total_days: f64,
    /// Signal used for shipping.
    pub source: EtaSource,
}

impl EtaCalculation {
    /// Whether a device position set the shipping time.
    pub fn is_geolocation_used(&self) -> bool {
        matches!(self.source, EtaSource::Geolocation { .. })
    }

    /// Whether a postal address set the shipping time.
    pub fn is_address_based(&self) -> bool {
        matches!(self.source, EtaSource::Address { .. })
    }

    /// Zone the shipping time was based on, if any.
    pub fn zone(&self) -> Option<DeliveryZone> {
        match &self.source {
            EtaSource::Address { zone, .. } | EtaSource::Geolocation { zone, .. } => Some(*zone),
            EtaSource::Fallback { .. } => None,
        }
    }

    /// Why geolocation was not used, when it failed.
    pub fn location_error(&self) -> Option<&str> {
        match &self.source {
            EtaSource::Fallback { reason } => reason.as_deref(),
            _ => None,
        }
    }

    /// Great-circle distance to the shop, when geolocation was used.
    pub fn distance_km(&self) -> Option<f64> {
        match &self.source {
            EtaSource::Geolocation { distance_km, .. } => Some(*distance_km),
            _ => None,
        }
    }

    /// Urgency bucket for the total duration.
    pub fn urgency(&self) -> Urgency {
        Urgency::from_total_days(self.total_days)
    }
}

/// How quickly an order arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    /// Two days or less.
    Express,
    /// Up to five days.
    Standard,
    /// Up to ten days.
    Regular,
    /// Longer.
    Extended,
}

impl Urgency {
    /// Bucket a total duration.
    pub fn from_total_days(days: f64) -> Self {
        if days <= 2.0 {
            Urgency::Express
        } else if days <= 5.0 {
            Urgency::Standard
        } else if days <= 10.0 {
            Urgency::Regular
        } else {
            Urgency::Extended
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Urgency::Express => "Express",
            Urgency::Standard => "Standard",
            Urgency::Regular => "Regular",
            Urgency::Extended => "Extended",
        }
    }
}

/// Estimate delivery for a job of `print_time_hours`, starting at `now`.
///
/// Never fails: negative, NaN or infinite print times count as zero and a
/// failed geolocation falls back to the policy's standard shipping time.
pub fn estimate_eta(
    print_time_hours: f64,
    destination: &Destination,
    policy: &DeliveryPolicy,
    now: DateTime<Utc>,
) -> EtaCalculation {
    let hours = if print_time_hours.is_finite() && print_time_hours > 0.0 {
        print_time_hours
    } else {
        0.0
    };
    let print_time_days = hours / 24.0;
    let prep_days = (print_time_days * 0.2).max(0.5);
    let queue_delay_days = (print_time_days * 0.5).min(3.0);
    let (shipping_days, source) = shipping(destination, policy);
    let total_days = print_time_days + prep_days + queue_delay_days + shipping_days;

    EtaCalculation {
        estimated_date: add_days(now, total_days),
        print_time_days,
        prep_days,
        queue_delay_days,
        shipping_days,
        total_days,
        source,
    }
}

/// [`estimate_eta`] against the current clock.
pub fn estimate_eta_now(
    print_time_hours: f64,
    destination: &Destination,
    policy: &DeliveryPolicy,
) -> EtaCalculation {
    estimate_eta(print_time_hours, destination, policy, Utc::now())
}

fn shipping(destination: &Destination, policy: &DeliveryPolicy) -> (f64, EtaSource) {
    if let Some(zone) = destination
        .address
        .as_ref()
        .and_then(|a| policy.home.classify(a))
    {
        let source = EtaSource::Address {
            zone,
            location_info: policy.home.zone_label(zone).to_string(),
        };
        return (zone.shipping_days(), source);
    }

    let reason = match &destination.location {
        Some(Ok(point)) if point.is_valid() => {
            let distance_km = haversine_km(&policy.origin, point);
            let zone = DeliveryZone::from_distance_km(distance_km);
            let source = EtaSource::Geolocation {
                zone,
                distance_km,
                coordinates: *point,
            };
            return (zone.shipping_days(), source);
        }
        Some(Ok(point)) => {
            tracing::warn!(?point, "ignoring out-of-range device position");
            Some(LocationError::PositionUnavailable.to_string())
        }
        Some(Err(err)) => {
            tracing::info!(reason = %err, "geolocation failed, using fallback shipping");
            Some(err.to_string())
        }
        None => None,
    };

    (policy.fallback_shipping_days, EtaSource::Fallback { reason })
}

fn add_days(now: DateTime<Utc>, days: f64) -> DateTime<Utc> {
    let ms = (days * MS_PER_DAY).round();
    if ms >= i64::MAX as f64 {
        return DateTime::<Utc>::MAX_UTC;
    }
    TimeDelta::try_milliseconds(ms as i64)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

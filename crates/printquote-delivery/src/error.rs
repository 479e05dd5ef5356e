//! Geolocation failure reasons.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why the device position could not be used.
///
/// These never fail an estimate: the ETA falls back to the standard
/// shipping time and keeps the message for display.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationError {
    /// The user refused the location request.
    #[error("Location permission denied")]
    PermissionDenied,

    /// The device could not determine a position.
    #[error("Location information unavailable")]
    PositionUnavailable,

    /// No position arrived in time.
    #[error("Location request timed out")]
    Timeout,

    /// The platform has no geolocation capability.
    #[error("Geolocation is not supported")]
    Unsupported,

    /// Any other provider failure.
    #[error("Unknown location error")]
    Unknown,
}

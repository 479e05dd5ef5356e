//! Single-shot device geolocation with a timeout.

use std::future::Future;
use std::time::Duration;

use printquote_delivery::{GeoPoint, LocationError, LocationFix};

/// Source of the customer's current position.
pub trait LocationProvider {
    /// Request the current position once.
    fn current_position(&self) -> impl Future<Output = LocationFix> + Send;
}

/// Provider that always answers with the same result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedLocation(pub LocationFix);

impl FixedLocation {
    /// Provider that always reports the given coordinates.
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self(Ok(GeoPoint::new(latitude, longitude)))
    }
}

impl LocationProvider for FixedLocation {
    fn current_position(&self) -> impl Future<Output = LocationFix> + Send {
        std::future::ready(self.0)
    }
}

/// Provider for platforms without geolocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoLocation;

impl LocationProvider for NoLocation {
    fn current_position(&self) -> impl Future<Output = LocationFix> + Send {
        std::future::ready(Err(LocationError::Unsupported))
    }
}

/// Ask `provider` for a position, giving up after `timeout`.
///
/// Every failure is returned as a [`LocationError`] for the ETA to record;
/// nothing here is fatal.
pub async fn acquire_location<P: LocationProvider>(provider: &P, timeout: Duration) -> LocationFix {
    match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(Ok(point)) => {
            tracing::debug!(
                latitude = point.latitude,
                longitude = point.longitude,
                "device position acquired"
            );
            Ok(point)
        }
        Ok(Err(err)) => {
            tracing::info!(reason = %err, "device position unavailable");
            Err(err)
        }
        Err(_) => {
            tracing::info!(timeout_ms = timeout.as_millis() as u64, "device position timed out");
            Err(LocationError::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowProvider(Duration);

    impl LocationProvider for SlowProvider {
        fn current_position(&self) -> impl Future<Output = LocationFix> + Send {
            let delay = self.0;
            async move {
                tokio::time::sleep(delay).await;
                Ok(GeoPoint::new(0.0, 0.0))
            }
        }
    }

    #[tokio::test]
    async fn test_fixed_location() {
        let fix = acquire_location(&FixedLocation::at(-27.5, 153.0), Duration::from_secs(1)).await;
        assert_eq!(fix, Ok(GeoPoint::new(-27.5, 153.0)));
    }

    #[tokio::test]
    async fn test_provider_error_passes_through() {
        let denied = FixedLocation(Err(LocationError::PermissionDenied));
        assert_eq!(
            acquire_location(&denied, Duration::from_secs(1)).await,
            Err(LocationError::PermissionDenied)
        );
        assert_eq!(
            acquire_location(&NoLocation, Duration::from_secs(1)).await,
            Err(LocationError::Unsupported)
        );
    }

    #[tokio::test]
    async fn test_timeout() {
        let slow = SlowProvider(Duration::from_secs(30));
        assert_eq!(
            acquire_location(&slow, Duration::from_millis(20)).await,
            Err(LocationError::Timeout)
        );
    }

    #[tokio::test]
    async fn test_answer_within_timeout() {
        let quick = SlowProvider(Duration::from_millis(1));
        assert!(acquire_location(&quick, Duration::from_secs(5)).await.is_ok());
    }
}

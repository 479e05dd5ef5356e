//! Customer session: current selections and the latest quote.
//!
//! Every change to a selection starts a recalculation tagged with the next
//! generation number. A result is published only if no later generation has
//! been published already, so a slow recalculation can never overwrite the
//! quote for a newer selection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use printquote_cost::{Material, PricingMode, PrintConfiguration};
use printquote_delivery::{AddressDescriptor, LocationFix};
use printquote_mesh::ModelStats;
use serde::Serialize;
use tokio::sync::watch;

use crate::config::QuoteConfig;
use crate::error::{QuoteError, Result};
use crate::locate::{acquire_location, LocationProvider};
use crate::{price_model, Quote, QuoteRequest};

/// Quote published for one generation of selections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionUpdate {
    /// Generation of the selections this quote was computed from.
    pub generation: u64,
    /// Quote, or `None` while no model is loaded.
    pub quote: Option<Quote>,
}

#[derive(Debug, Clone)]
struct Selections {
    stats: Option<ModelStats>,
    request: QuoteRequest,
}

/// Selections captured for one recalculation.
#[derive(Debug)]
struct Recalculation {
    generation: u64,
    selections: Selections,
}

impl Recalculation {
    fn run(self, config: &QuoteConfig) -> SessionUpdate {
        let quote = self
            .selections
            .stats
            .map(|stats| price_model(&stats, &self.selections.request, config, Utc::now()));
        SessionUpdate {
            generation: self.generation,
            quote,
        }
    }
}

struct Inner {
    config: QuoteConfig,
    selections: Mutex<Selections>,
    generation: AtomicU64,
    updates: watch::Sender<SessionUpdate>,
}

/// Shared handle to one customer's quoting session.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct QuoteSession {
    inner: Arc<Inner>,
}

impl QuoteSession {
    /// Start a session with the configured default material and settings.
    pub fn new(config: QuoteConfig) -> Result<Self> {
        let request = QuoteRequest::from_config(&config)?;
        let (updates, _) = watch::channel(SessionUpdate::default());
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                selections: Mutex::new(Selections {
                    stats: None,
                    request,
                }),
                generation: AtomicU64::new(0),
                updates,
            }),
        })
    }

    /// Session configuration.
    pub fn config(&self) -> &QuoteConfig {
        &self.inner.config
    }

    /// Receive every newly published quote.
    pub fn subscribe(&self) -> watch::Receiver<SessionUpdate> {
        self.inner.updates.subscribe()
    }

    /// Most recently published quote.
    pub fn latest(&self) -> SessionUpdate {
        self.inner.updates.borrow().clone()
    }

    /// Generation of the most recent selection change.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Decode and measure an upload, replacing the current model.
    ///
    /// A file that fails to decode clears the model, so the published
    /// quote never describes a file the customer has replaced.
    pub fn load_model(&self, bytes: &[u8], filename: &str) -> Result<ModelStats> {
        match printquote_mesh::decode_and_analyze(bytes, filename) {
            Ok(stats) => {
                self.set_model(stats);
                Ok(stats)
            }
            Err(err) => {
                tracing::info!(filename, error = %err, "upload rejected");
                self.clear_model();
                Err(err.into())
            }
        }
    }

    /// Replace the current model's measurements.
    pub fn set_model(&self, stats: ModelStats) -> u64 {
        self.update(|s| s.stats = Some(stats))
    }

    /// Forget the current model.
    pub fn clear_model(&self) -> u64 {
        self.update(|s| s.stats = None)
    }

    /// Select a catalog material by id or name.
    pub fn set_material(&self, id: &str) -> Result<u64> {
        let material: &'static Material =
            Material::by_id(id).ok_or_else(|| QuoteError::UnknownMaterial(id.to_string()))?;
        Ok(self.update(|s| s.request.material = material))
    }

    /// Replace the print settings.
    pub fn set_print_configuration(&self, print: PrintConfiguration) -> u64 {
        self.update(|s| s.request.print = print)
    }

    /// Switch between regular and batch pricing.
    pub fn set_pricing_mode(&self, mode: PricingMode) -> u64 {
        self.update(|s| s.request.print.pricing_mode = mode)
    }

    /// Replace or clear the postal address.
    pub fn set_address(&self, address: Option<AddressDescriptor>) -> u64 {
        self.update(|s| s.request.destination.address = address)
    }

    /// Replace or clear the device position result.
    pub fn set_location(&self, location: Option<LocationFix>) -> u64 {
        self.update(|s| s.request.destination.location = location)
    }

    /// Ask `provider` for the device position and use whatever comes back.
    ///
    /// Failures and timeouts are recorded on the destination; the ETA then
    /// falls back to the standard shipping time.
    pub async fn locate<P: LocationProvider>(&self, provider: &P) -> u64 {
        let fix = acquire_location(provider, self.inner.config.geolocation_timeout()).await;
        self.set_location(Some(fix))
    }

    fn lock(&self) -> MutexGuard<'_, Selections> {
        self.inner
            .selections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, change: impl FnOnce(&mut Selections)) -> u64 {
        let recalculation = self.begin(change);
        let generation = recalculation.generation;
        self.complete(recalculation);
        generation
    }

    /// Apply a change and capture the selections under a new generation.
    fn begin(&self, change: impl FnOnce(&mut Selections)) -> Recalculation {
        let mut selections = self.lock();
        change(&mut selections);
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Recalculation {
            generation,
            selections: selections.clone(),
        }
    }

    /// Compute and publish; returns whether the result was published.
    fn complete(&self, recalculation: Recalculation) -> bool {
        let update = recalculation.run(&self.inner.config);
        self.publish(update)
    }

    fn publish(&self, update: SessionUpdate) -> bool {
        let generation = update.generation;
        let published = self.inner.updates.send_if_modified(|current| {
            if generation > current.generation {
                *current = update;
                true
            } else {
                false
            }
        });
        if published {
            tracing::debug!(generation, "published quote");
        } else {
            tracing::warn!(generation, latest = self.latest().generation, "discarding superseded quote");
        }
        published
    }
}

impl std::fmt::Debug for QuoteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteSession")
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::FixedLocation;
    use printquote_delivery::LocationError;

    fn session() -> QuoteSession {
        QuoteSession::new(QuoteConfig::default()).unwrap()
    }

    fn stats(volume: f64) -> ModelStats {
        ModelStats {
            volume,
            ..Default::default()
        }
    }

    fn material_of(update: &SessionUpdate) -> &'static str {
        update.quote.as_ref().unwrap().material.id
    }

    #[test]
    fn test_starts_empty() {
        let session = session();
        assert_eq!(session.latest(), SessionUpdate::default());
        assert_eq!(session.generation(), 0);
    }

    #[test]
    fn test_selection_without_model_publishes_no_quote() {
        let session = session();
        let generation = session.set_material("abs").unwrap();
        let latest = session.latest();
        assert_eq!(latest.generation, generation);
        assert!(latest.quote.is_none());
    }

    #[test]
    fn test_every_change_recalculates() {
        let session = session();
        session.set_model(stats(30.0));
        let regular = session.latest().quote.unwrap();
        assert_eq!(regular.material.id, "pla");

        session.set_pricing_mode(PricingMode::Batch);
        let batch = session.latest().quote.unwrap();
        assert_eq!(batch.cost.details.hourly_rate, Some(7.0));
        assert_eq!(session.latest().generation, 2);

        session.set_material("PLA-CF").unwrap();
        assert_eq!(material_of(&session.latest()), "pla-cf");
    }

    #[test]
    fn test_unknown_material_changes_nothing() {
        let session = session();
        session.set_model(stats(30.0));
        assert!(matches!(
            session.set_material("wood"),
            Err(QuoteError::UnknownMaterial(_))
        ));
        assert_eq!(session.generation(), 1);
        assert_eq!(material_of(&session.latest()), "pla");
    }

    #[test]
    fn test_stale_result_discarded() {
        let session = session();
        session.set_model(stats(30.0));

        let older = session.begin(|s| s.request.material = Material::by_id("abs").unwrap());
        let newer = session.begin(|s| s.request.material = Material::by_id("petg").unwrap());

        assert!(session.complete(newer));
        assert!(!session.complete(older));

        let latest = session.latest();
        assert_eq!(latest.generation, 3);
        assert_eq!(material_of(&latest), "petg");
    }

    #[test]
    fn test_concurrent_changes_end_on_last_selection() {
        let session = session();
        session.set_model(stats(10.0));
        std::thread::scope(|scope| {
            for id in ["abs", "petg", "tpu", "pla-cf"] {
                let session = session.clone();
                scope.spawn(move || {
                    for _ in 0..25 {
                        session.set_material(id).unwrap();
                    }
                });
            }
        });

        let latest = session.latest();
        assert_eq!(latest.generation, session.generation());
        assert_eq!(latest.generation, 101);
        let selected = session.lock().request.material.id;
        assert_eq!(material_of(&latest), selected);
    }

    #[test]
    fn test_failed_upload_clears_model() {
        let session = session();
        session.set_model(stats(10.0));
        assert!(session.latest().quote.is_some());

        let err = session.load_model(b"not a mesh", "broken.stl").unwrap_err();
        assert!(matches!(err, QuoteError::Mesh(_)));
        assert!(session.latest().quote.is_none());
    }

    #[tokio::test]
    async fn test_subscriber_sees_latest() {
        let session = session();
        let mut rx = session.subscribe();
        session.set_model(stats(10.0));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().generation, 1);

        session.set_address(Some(AddressDescriptor {
            city: "Brisbane".into(),
            state: "QLD".into(),
            postal_code: "4000".into(),
            country: "Australia".into(),
        }));
        rx.changed().await.unwrap();
        let update = rx.borrow_and_update().clone();
        let quote = update.quote.unwrap();
        assert_eq!(quote.delivery_cost, Some(10.0));
        assert!(quote.eta.is_address_based());
    }

    #[tokio::test]
    async fn test_locate() {
        let session = session();
        session.set_model(stats(10.0));

        session.locate(&FixedLocation::at(-27.48, 153.03)).await;
        let quote = session.latest().quote.unwrap();
        assert!(quote.eta.is_geolocation_used());
        assert_eq!(quote.eta.shipping_days, 1.0);

        session
            .locate(&FixedLocation(Err(LocationError::PermissionDenied)))
            .await;
        let quote = session.latest().quote.unwrap();
        assert_eq!(quote.eta.location_error(), Some("Location permission denied"));
        assert_eq!(quote.eta.shipping_days, 3.0);
        assert_eq!(quote.delivery_cost, None);
    }
}

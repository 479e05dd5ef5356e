#![warn(missing_docs)]

//! Upload-to-quote pipeline for a 3D printing shop.
//!
//! Wires the stages together: file bytes are decoded and measured by
//! [`printquote_mesh`], priced by [`printquote_cost`], and given a delivery
//! estimate by [`printquote_delivery`]. Each stage is a pure function of
//! its inputs; [`QuoteSession`] holds the customer's current selections
//! and republishes a fresh [`Quote`] whenever one of them changes.
//!
//! # Example
//!
//! ```ignore
//! use printquote::{estimate_quote, QuoteConfig, QuoteRequest};
//!
//! let config = QuoteConfig::default();
//! let request = QuoteRequest::from_config(&config)?;
//! let bytes = std::fs::read("bracket.stl")?;
//! let quote = estimate_quote(&bytes, "bracket.stl", &request, &config, chrono::Utc::now())?;
//! println!("{} by {}", quote.cost.total_cost, quote.eta.estimated_date);
//! ```

pub mod checkout;
pub mod config;
pub mod error;
pub mod locate;
pub mod session;

pub use checkout::CheckoutItem;
pub use config::QuoteConfig;
pub use error::{QuoteError, Result};
pub use locate::{acquire_location, FixedLocation, LocationProvider, NoLocation};
pub use session::{QuoteSession, SessionUpdate};

pub use printquote_cost as cost;
pub use printquote_delivery as delivery;
pub use printquote_mesh as mesh;

use chrono::{DateTime, Utc};
use printquote_cost::{estimate_cost, CostBreakdown, Material, PrintConfiguration};
use printquote_delivery::{estimate_eta, Destination, EtaCalculation, Urgency};
use printquote_mesh::ModelStats;
use serde::Serialize;

/// Customer selections that, together with a model, determine a quote.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    /// Chosen material.
    pub material: &'static Material,
    /// Chosen print settings.
    pub print: PrintConfiguration,
    /// Where the order is going.
    pub destination: Destination,
}

impl Default for QuoteRequest {
    fn default() -> Self {
        Self {
            material: Material::default_material(),
            print: PrintConfiguration::default(),
            destination: Destination::default(),
        }
    }
}

impl QuoteRequest {
    /// Request using the configured default material and print settings.
    pub fn from_config(config: &QuoteConfig) -> Result<Self> {
        Ok(Self {
            material: config.default_material()?,
            print: config.print,
            destination: Destination::default(),
        })
    }
}

/// Complete quote for one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    /// Geometry of the uploaded model.
    pub stats: ModelStats,
    /// Material priced.
    pub material: &'static Material,
    /// Settings priced, after clamping.
    pub print: PrintConfiguration,
    /// Cost, including delivery when the destination zone is known.
    pub cost: CostBreakdown,
    /// Delivery charge, when the destination zone is known.
    pub delivery_cost: Option<f64>,
    /// Delivery estimate.
    pub eta: EtaCalculation,
}

impl Quote {
    /// Urgency bucket of the delivery estimate.
    pub fn urgency(&self) -> Urgency {
        self.eta.urgency()
    }
}

/// Price already-measured geometry.
///
/// The print time out of the cost stage feeds the delivery stage, and the
/// destination zone it resolves sets the delivery charge.
pub fn price_model(
    stats: &ModelStats,
    request: &QuoteRequest,
    config: &QuoteConfig,
    now: DateTime<Utc>,
) -> Quote {
    let print = request.print.sanitized();
    let base = estimate_cost(stats.volume, request.material, &print);
    let eta = estimate_eta(base.print_time_hours, &request.destination, &config.delivery, now);
    let delivery_cost = config.delivery.delivery_cost(&eta);
    let cost = match delivery_cost {
        Some(charge) => base.with_delivery(charge),
        None => base,
    };

    tracing::debug!(
        material = request.material.id,
        volume = stats.volume,
        total = cost.total_cost,
        total_days = eta.total_days,
        "priced model"
    );

    Quote {
        stats: *stats,
        material: request.material,
        print,
        cost,
        delivery_cost,
        eta,
    }
}

/// Decode, measure and price an uploaded file.
///
/// Decoder failures are returned as [`QuoteError::Mesh`]; no stats are
/// produced for a file that did not decode.
pub fn estimate_quote(
    bytes: &[u8],
    filename: &str,
    request: &QuoteRequest,
    config: &QuoteConfig,
    now: DateTime<Utc>,
) -> Result<Quote> {
    let stats = printquote_mesh::decode_and_analyze(bytes, filename)?;
    Ok(price_model(&stats, request, config, now))
}

//! Line item handed to the payment collaborator.

use serde::{Deserialize, Serialize};

use crate::Quote;

/// Currency every price is quoted in.
pub const CURRENCY: &str = "aud";

/// Product name used when the customer gives none.
pub const DEFAULT_PRODUCT_NAME: &str = "3D Printing Service";

/// A single checkout line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutItem {
    /// Product name.
    pub product_name: String,
    /// Line description: material, volume and weight.
    pub description: String,
    /// Price in cents.
    pub unit_amount: i64,
    /// ISO currency code, lowercase.
    pub currency: String,
    /// Always one.
    pub quantity: u32,
}

impl CheckoutItem {
    /// Build the line item for a quote.
    pub fn from_quote(quote: &Quote, product_name: Option<&str>) -> Self {
        let product_name = product_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_PRODUCT_NAME);
        Self {
            product_name: product_name.to_string(),
            description: format!(
                "Material: {}, Volume: {:.2}cm³, Weight: {:.2}g",
                quote.material.name, quote.stats.volume, quote.cost.weight_grams
            ),
            unit_amount: to_cents(quote.cost.total_cost),
            currency: CURRENCY.to_string(),
            quantity: 1,
        }
    }
}

fn to_cents(amount: f64) -> i64 {
    if amount.is_finite() && amount > 0.0 {
        (amount * 100.0).round() as i64
    } else {
        0
    }
}

//! Postal address classification into delivery zones.

use serde::{Deserialize, Serialize};

use crate::zone::DeliveryZone;

/// Destination address as typed by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressDescriptor {
    /// City or suburb.
    pub city: String,
    /// State or region.
    pub state: String,
    /// Postal code.
    pub postal_code: String,
    /// Country.
    pub country: String,
}

impl AddressDescriptor {
    /// Whether every field is blank.
    pub fn is_blank(&self) -> bool {
        [&self.city, &self.state, &self.postal_code, &self.country]
            .iter()
            .all(|f| f.trim().is_empty())
    }
}

/// Where the shop is, for address classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeRegion {
    /// Metro city name.
    pub city: String,
    /// Names the home state is written as (abbreviation first).
    pub state_names: Vec<String>,
    /// Names the home country is written as.
    pub country_names: Vec<String>,
    /// Inclusive postal code ranges of the metro area.
    pub metro_postcodes: Vec<[u32; 2]>,
    /// Label shown for metro deliveries.
    pub metro_label: String,
    /// Label shown for the rest of the home state.
    pub state_label: String,
    /// Label shown for the rest of the country.
    pub domestic_label: String,
    /// Label shown for other countries.
    pub international_label: String,
}

impl Default for HomeRegion {
    fn default() -> Self {
        Self {
            city: "Brisbane".into(),
            state_names: vec!["QLD".into(), "Queensland".into()],
            country_names: vec!["Australia".into(), "AU".into(), "AUS".into()],
            metro_postcodes: vec![[4000, 4199]],
            metro_label: "Brisbane metropolitan area".into(),
            state_label: "Queensland regional".into(),
            domestic_label: "Interstate Australia".into(),
            international_label: "International".into(),
        }
    }
}

impl HomeRegion {
    /// Bucket an address, or `None` when it is too incomplete to place.
    ///
    /// A matching state wins when the country is blank or the home country.
    /// Outside the home state a country is required: blank means unknown,
    /// the home country is domestic, anything else is international.
    pub fn classify(&self, address: &AddressDescriptor) -> Option<DeliveryZone> {
        if address.is_blank() {
            return None;
        }
        let country = address.country.trim();
        let home_country = country.is_empty() || matches_any(country, &self.country_names);

        if home_country && matches_any(address.state.trim(), &self.state_names) {
            let metro = address.city.trim().eq_ignore_ascii_case(&self.city)
                || self.is_metro_postcode(&address.postal_code);
            return Some(if metro {
                DeliveryZone::Metro
            } else {
                DeliveryZone::HomeState
            });
        }

        if country.is_empty() {
            None
        } else if home_country {
            Some(DeliveryZone::Domestic)
        } else {
            Some(DeliveryZone::International)
        }
    }

    /// Whether a postal code falls in one of the metro ranges.
    ///
    /// The code must be all digits and as long as the range bounds, so
    /// `"04000"` and `"4000A"` do not match `4000`.
    pub fn is_metro_postcode(&self, postal_code: &str) -> bool {
        let code = postal_code.trim();
        if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        let Ok(value) = code.parse::<u32>() else {
            return false;
        };
        self.metro_postcodes.iter().any(|&[start, end]| {
            code.len() == digit_count(start) && (start..=end).contains(&value)
        })
    }

    /// Display label for a zone.
    pub fn zone_label(&self, zone: DeliveryZone) -> &str {
        match zone {
            DeliveryZone::Metro => self.metro_label.as_str(),
            DeliveryZone::HomeState => self.state_label.as_str(),
            DeliveryZone::Domestic => self.domestic_label.as_str(),
            DeliveryZone::International => self.international_label.as_str(),
        }
    }
}

fn matches_any(value: &str, names: &[String]) -> bool {
    !value.is_empty() && names.iter().any(|n| n.eq_ignore_ascii_case(value))
}

fn digit_count(n: u32) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

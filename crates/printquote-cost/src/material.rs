//! Fixed material catalog.
//!
//! The category of a material, not the material itself, drives every
//! downstream multiplier: density, print time, hourly rate and price cap.

use serde::{Deserialize, Serialize};

/// Material family that determines density and machine-time scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialCategory {
    /// PLA and similar easy-printing filaments.
    Standard,
    /// ABS, PETG, TPU: slower, fussier prints.
    Exotic,
    /// Fibre-filled filaments.
    Reinforced,
}

impl MaterialCategory {
    /// All categories, cheapest first.
    pub const ALL: [MaterialCategory; 3] = [
        MaterialCategory::Standard,
        MaterialCategory::Exotic,
        MaterialCategory::Reinforced,
    ];

    /// Printed density (g/cm³).
    pub fn density(self) -> f64 {
        match self {
            MaterialCategory::Standard => 1.25,
            MaterialCategory::Exotic => 1.2,
            MaterialCategory::Reinforced => 1.3,
        }
    }

    /// Relative machine time, also used to scale tier prices and the minimum.
    pub fn time_multiplier(self) -> f64 {
        match self {
            MaterialCategory::Standard => 1.0,
            MaterialCategory::Exotic => 1.3,
            MaterialCategory::Reinforced => 1.6,
        }
    }

    /// Batch-mode machine rate ($/hour).
    pub fn hourly_rate(self) -> f64 {
        match self {
            MaterialCategory::Standard => 7.0,
            MaterialCategory::Exotic => 10.0,
            MaterialCategory::Reinforced => 14.0,
        }
    }

    /// Upper bound on the regular-mode printing cost ($).
    pub fn regular_cap(self) -> f64 {
        match self {
            MaterialCategory::Standard => 150.0,
            MaterialCategory::Exotic => 195.0,
            MaterialCategory::Reinforced => 240.0,
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            MaterialCategory::Standard => "standard",
            MaterialCategory::Exotic => "exotic",
            MaterialCategory::Reinforced => "reinforced",
        }
    }
}

/// A catalog material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Material {
    /// Stable identifier, e.g. `pla-cf`.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Filament price ($/kg).
    pub price_per_kg: f64,
    /// Category.
    pub category: MaterialCategory,
    /// One-line description for pickers.
    pub description: &'static str,
}

/// Every material the shop prints.
pub static MATERIALS: [Material; 5] = [
    Material {
        id: "pla",
        name: "PLA",
        price_per_kg: 25.0,
        category: MaterialCategory::Standard,
        description: "Biodegradable, easy to print, perfect for beginners",
    },
    Material {
        id: "abs",
        name: "ABS",
        price_per_kg: 30.0,
        category: MaterialCategory::Exotic,
        description: "Strong, impact-resistant, suitable for functional parts",
    },
    Material {
        id: "petg",
        name: "PETG",
        price_per_kg: 35.0,
        category: MaterialCategory::Exotic,
        description: "Chemical resistant, clear printing, food-safe",
    },
    Material {
        id: "tpu",
        name: "TPU",
        price_per_kg: 45.0,
        category: MaterialCategory::Exotic,
        description: "Flexible, rubber-like material for specialized applications",
    },
    Material {
        id: "pla-cf",
        name: "PLA-CF",
        price_per_kg: 60.0,
        category: MaterialCategory::Reinforced,
        description: "Carbon fiber reinforced PLA for stronger, stiffer parts",
    },
];

impl Material {
    /// Look up a material by id or display name, ignoring case.
    pub fn by_id(id: &str) -> Option<&'static Material> {
        let id = id.trim();
        MATERIALS
            .iter()
            .find(|m| m.id.eq_ignore_ascii_case(id) || m.name.eq_ignore_ascii_case(id))
    }

    /// The material selected when nothing else is chosen (PLA).
    pub fn default_material() -> &'static Material {
        &MATERIALS[0]
    }

    /// Printed weight (g) of `volume` cm³ of this material.
    pub fn weight_grams(&self, volume: f64) -> f64 {
        volume.max(0.0) * self.category.density()
    }
}

/// Estimated printed weight (g) of `volume` cm³ in every catalog material.
pub fn estimated_weights(volume: f64) -> impl Iterator<Item = (&'static Material, f64)> {
    MATERIALS.iter().map(move |m| (m, m.weight_grams(volume)))
}

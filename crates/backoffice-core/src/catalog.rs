//! # Default Catalog
//!
//! The products and stock sub-types written on first start so that every
//! stock and invoice form has options to choose from.
//!
//! ```text
//! Butter (Dairy)          → 9 sub-type rows
//! Desi Ghee (Dairy)       → 2 sub-type rows
//! Whipping Cream (Dairy)  → 1 standard row
//! Vinegar (Condiment)     → 1 standard row
//! Yogurt (Dairy)          → 1 standard row
//!                           ──
//!                           14 stock rows, all at quantity 0 / price 0
//! ```

/// Butter sub-types, in the order they are seeded.
pub const BUTTER_SUB_TYPES: [&str; 9] = [
    "Blend Butter",
    "Premium Butter",
    "Local Butter",
    "Baking Butter",
    "White Butter",
    "Yellow Butter",
    "Salted",
    "Unsalted",
    "Butterify",
];

/// Desi Ghee sub-types, in the order they are seeded.
pub const DESI_GHEE_SUB_TYPES: [&str; 2] = ["Blend Ghee", "Authentic Ghee"];

/// A product written by the first-run seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedProduct {
    pub name: &'static str,
    pub category: &'static str,
    /// Empty means a single standard (no sub-type) stock row.
    pub sub_types: &'static [&'static str],
}

impl SeedProduct {
    /// Sub-type of every stock row this product gets; `None` is the standard row.
    pub fn stock_sub_types(&self) -> Vec<Option<&'static str>> {
        if self.sub_types.is_empty() {
            vec![None]
        } else {
            self.sub_types.iter().copied().map(Some).collect()
        }
    }
}

/// The default catalog, in insertion order.
pub static DEFAULT_CATALOG: [SeedProduct; 5] = [
    SeedProduct {
        name: "Butter",
        category: "Dairy",
        sub_types: &BUTTER_SUB_TYPES,
    },
    SeedProduct {
        name: "Desi Ghee",
        category: "Dairy",
        sub_types: &DESI_GHEE_SUB_TYPES,
    },
    SeedProduct {
        name: "Whipping Cream",
        category: "Dairy",
        sub_types: &[],
    },
    SeedProduct {
        name: "Vinegar",
        category: "Condiment",
        sub_types: &[],
    },
    SeedProduct {
        name: "Yogurt",
        category: "Dairy",
        sub_types: &[],
    },
];

/// Every (product name, sub-type) stock row of the default catalog.
pub fn seed_stock_rows() -> impl Iterator<Item = (&'static str, Option<&'static str>)> {
    DEFAULT_CATALOG.iter().flat_map(|product| {
        product
            .stock_sub_types()
            .into_iter()
            .map(move |sub_type| (product.name, sub_type))
    })
}

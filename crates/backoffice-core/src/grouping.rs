//! # Stock Option Grouping
//!
//! Folds joined (stock item, product) rows into the product-keyed choice
//! lists used by the stock adjustment and invoice line forms.
//!
//! ## Shape
//! ```text
//! rows (ordered by product name, then sub-type; absent sub-type first)
//!
//!   (12, "Butter", Some("Baking Butter"))
//!   (10, "Butter", Some("Blend Butter"))      ┌─────────────────────────────┐
//!   ...                                  ───► │ "Butter"  → [(12, Baking..),│
//!   (16, "Vinegar", None)                     │              (10, Blend..)] │
//!                                             │ "Vinegar" → [(16, Standard)]│
//!                                             └─────────────────────────────┘
//! ```
//!
//! The fold keeps the row order inside each group; ordering is the query's job.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::STANDARD_LABEL;

/// One row of the stock/product join.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockOptionRow {
    pub stock_item_id: i64,
    pub product_name: String,
    pub sub_type: Option<String>,
}

/// A selectable stock row: its id and display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockOption {
    pub stock_item_id: i64,
    pub label: String,
}

/// Product name → ordered stock options.
pub type GroupedStockOptions = BTreeMap<String, Vec<StockOption>>;

/// Groups rows by product name, labelling absent sub-types "Standard".
pub fn group_stock_options<I>(rows: I) -> GroupedStockOptions
where
    I: IntoIterator<Item = StockOptionRow>,
{
    let mut grouped = GroupedStockOptions::new();
    for row in rows {
        grouped
            .entry(row.product_name)
            .or_default()
            .push(StockOption {
                stock_item_id: row.stock_item_id,
                label: row.sub_type.unwrap_or_else(|| STANDARD_LABEL.to_string()),
            });
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, product: &str, sub_type: Option<&str>) -> StockOptionRow {
        StockOptionRow {
            stock_item_id: id,
            product_name: product.to_string(),
            sub_type: sub_type.map(str::to_string),
        }
    }

    #[test]
    fn test_groups_by_product_and_labels_standard() {
        let grouped = group_stock_options(vec![
            row(3, "Butter", Some("Salted")),
            row(4, "Butter", Some("Unsalted")),
            row(9, "Yogurt", None),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(
            grouped["Butter"],
            vec![
                StockOption { stock_item_id: 3, label: "Salted".into() },
                StockOption { stock_item_id: 4, label: "Unsalted".into() },
            ]
        );
        assert_eq!(grouped["Yogurt"][0].label, "Standard");
    }

    #[test]
    fn test_preserves_row_order_within_group() {
        let grouped = group_stock_options(vec![
            row(7, "Ghee", None),
            row(2, "Ghee", Some("Authentic Ghee")),
            row(1, "Ghee", Some("Blend Ghee")),
        ]);

        let ids: Vec<i64> = grouped["Ghee"].iter().map(|o| o.stock_item_id).collect();
        assert_eq!(ids, vec![7, 2, 1]);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_stock_options(Vec::new()).is_empty());
    }
}

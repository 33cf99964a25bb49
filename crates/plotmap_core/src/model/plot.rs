//! Marketplace records: plots, plot sets and ownership transactions.
//!
//! # Responsibility
//! - Define the persisted shapes the ownership ledger reads and writes.
//! - Derive declared plot cells from `category=plot` map items.
//!
//! # Invariants
//! - `status == Owned` iff `owner_id.is_some()`.
//! - `PlotTransaction` rows are append-only.
//! - A `PlotSet` exists only for purchases of two or more plots.

use crate::geometry::Bounds;
use crate::model::item::{Item, ItemId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Plot id; equals the id of the item the plot was derived from.
pub type PlotId = ItemId;
/// Opaque account identifier supplied by the caller.
pub type AccountId = String;
pub type MapId = Uuid;
pub type PlotSetId = Uuid;
pub type TransactionId = Uuid;

/// Price used when a plot item carries no numeric price.
pub const DEFAULT_PLOT_PRICE: f64 = 100.0;

/// Name used when a plot item carries no name.
pub fn default_plot_name(plot_id: &str) -> String {
    format!("Plot {plot_id}")
}

/// Ownership lifecycle of a plot row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotStatus {
    /// Listed and purchasable.
    Available,
    /// Held by exactly one account.
    Owned,
    /// No longer declared by the active map; kept for history.
    Archived,
}

impl PlotStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Owned => "owned",
            Self::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(Self::Available),
            "owned" => Some(Self::Owned),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Persisted ownable cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plot {
    pub id: PlotId,
    pub name: String,
    /// Item type the plot was derived from, e.g. `plot-premium`.
    pub plot_type: String,
    pub position: Bounds,
    pub map_id: MapId,
    pub owner_id: Option<AccountId>,
    pub plot_set_id: Option<PlotSetId>,
    pub status: PlotStatus,
    pub price: f64,
    pub house_type: Option<String>,
    pub house_color: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Plot {
    pub fn is_available(&self) -> bool {
        self.status == PlotStatus::Available
    }

    pub fn is_owned_by(&self, account: &str) -> bool {
        self.status == PlotStatus::Owned && self.owner_id.as_deref() == Some(account)
    }
}

/// Group of plots bought together in one purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotSet {
    pub id: PlotSetId,
    pub owner_id: AccountId,
    pub name: String,
    /// Plots currently referencing this set.
    pub member_plot_ids: Vec<PlotId>,
    pub created_at: i64,
    /// Set once every member plot has been sold.
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Purchase,
    Sale,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Sale => "sale",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "purchase" => Some(Self::Purchase),
            "sale" => Some(Self::Sale),
            _ => None,
        }
    }
}

/// Append-only ownership history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotTransaction {
    pub id: TransactionId,
    pub plot_id: PlotId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub previous_owner_id: Option<AccountId>,
    pub new_owner_id: Option<AccountId>,
    pub price: Option<f64>,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    pub acting_user_id: AccountId,
}

/// Plot cell as declared by a map item, before it is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredPlot {
    pub id: PlotId,
    pub name: String,
    pub plot_type: String,
    pub position: Bounds,
    pub price: f64,
}

impl DeclaredPlot {
    /// Derives a declared plot from a plot item. `None` for other categories.
    ///
    /// Negative or non-finite prices fall back to `default_price`.
    pub fn from_item(item: &Item, default_price: f64) -> Option<Self> {
        let properties = item.plot_properties()?;
        Some(Self {
            id: item.id.clone(),
            name: properties
                .name
                .unwrap_or_else(|| default_plot_name(&item.id)),
            plot_type: item.kind.clone(),
            position: item.bounds(),
            price: properties
                .price
                .filter(|price| price.is_finite() && *price >= 0.0)
                .unwrap_or(default_price),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DeclaredPlot, PlotStatus, DEFAULT_PLOT_PRICE};
    use crate::model::item::Item;
    use serde_json::json;

    #[test]
    fn declared_plot_falls_back_to_defaults() {
        let item: Item = serde_json::from_value(json!({
            "id": "p-7", "type": "plot-premium", "category": "plot",
            "x": 10, "y": 0, "width": 15, "height": 10, "layerId": "l"
        }))
        .unwrap();
        let plot = DeclaredPlot::from_item(&item, DEFAULT_PLOT_PRICE).unwrap();
        assert_eq!(plot.name, "Plot p-7");
        assert_eq!(plot.price, 100.0);
        assert_eq!(plot.position.width, 15.0);
    }

    #[test]
    fn status_parse_round_trips() {
        for status in [PlotStatus::Available, PlotStatus::Owned, PlotStatus::Archived] {
            assert_eq!(PlotStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PlotStatus::parse("sold"), None);
    }
}

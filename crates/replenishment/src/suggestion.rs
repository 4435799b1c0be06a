use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use procura_core::{ProductId, SupplierId};

/// Urgency classification of a reorder suggestion.
///
/// Declaration order is urgency order: sorting ascending puts `Critical` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    Critical,
    High,
    Medium,
    Low,
}

impl PriorityTier {
    pub const ALL: [PriorityTier; 4] = [
        PriorityTier::Critical,
        PriorityTier::High,
        PriorityTier::Medium,
        PriorityTier::Low,
    ];
}

/// How long current stock lasts at the observed sales velocity.
///
/// `Unbounded` means no demand was observed in the window: there is no
/// velocity signal, not an infinite supply. Serialized as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<u32>", into = "Option<u32>")]
pub enum DaysOfStock {
    Days(u32),
    Unbounded,
}

impl DaysOfStock {
    /// Integer stand-in for `Unbounded`, for callers persisting into an integer column.
    pub const SENTINEL: u32 = 999;

    pub fn days(&self) -> Option<u32> {
        match self {
            DaysOfStock::Days(d) => Some(*d),
            DaysOfStock::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, DaysOfStock::Unbounded)
    }

    /// True when stock runs out within `threshold` days. Never true for `Unbounded`.
    pub fn is_within(&self, threshold: i64) -> bool {
        match self {
            DaysOfStock::Days(d) => i64::from(*d) <= threshold,
            DaysOfStock::Unbounded => false,
        }
    }

    pub fn days_or_sentinel(&self) -> u32 {
        self.days().unwrap_or(Self::SENTINEL)
    }
}

impl From<Option<u32>> for DaysOfStock {
    fn from(value: Option<u32>) -> Self {
        value.map_or(DaysOfStock::Unbounded, DaysOfStock::Days)
    }
}

impl From<DaysOfStock> for Option<u32> {
    fn from(value: DaysOfStock) -> Self {
        value.days()
    }
}

/// Derived reorder recommendation for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderSuggestion {
    pub product_id: ProductId,
    pub product_name: String,
    pub preferred_supplier_id: Option<SupplierId>,
    /// Stock on hand as used by the computation (missing/negative read as 0).
    pub current_stock: i64,
    pub reorder_point: i64,
    pub lead_time_days: i64,
    /// Average units sold per day over the window, rounded to 2 decimals.
    pub avg_daily_sales: f64,
    pub days_of_stock: DaysOfStock,
    pub suggested_quantity: i64,
    pub priority: PriorityTier,
    /// `suggested_quantity × unit_cost`, in smallest currency unit.
    pub estimated_cost: u64,
    /// The `as_of` instant the suggestion was computed for.
    pub computed_at: DateTime<Utc>,
}

//! Velocity-based reorder suggestions.
//!
//! Model:
//! - Sum units sold per product over a trailing window ending at `as_of`.
//! - Average daily sales = units / window length, rounded to 2 decimals.
//! - Days of stock = floor(stock / average), or `Unbounded` without demand.
//! - Suggest when stock is at/below the reorder point or runs out within lead time.
//! - Size the reorder to cover lead time plus a buffer, floored at twice the
//!   reorder point, unless the product carries an explicit reorder quantity.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use procura_core::{DomainResult, ProductId};

use crate::policy::ReplenishmentPolicy;
use crate::snapshot::{ProductSnapshot, SaleSnapshot};
use crate::suggestion::{DaysOfStock, PriorityTier, ReorderSuggestion};

/// Pure reorder-suggestion calculator.
///
/// Holds only a validated policy; every call is a single pass over the inputs
/// and never mutates them.
#[derive(Debug, Clone, Copy)]
pub struct ReplenishmentCalculator {
    policy: ReplenishmentPolicy,
}

impl Default for ReplenishmentCalculator {
    fn default() -> Self {
        Self {
            policy: ReplenishmentPolicy::default(),
        }
    }
}

impl ReplenishmentCalculator {
    pub fn new(policy: ReplenishmentPolicy) -> DomainResult<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &ReplenishmentPolicy {
        &self.policy
    }

    /// Compute suggestions for every qualifying product not already pending.
    ///
    /// Output is ordered by priority (`critical` first), then product identity.
    pub fn compute(
        &self,
        products: &[ProductSnapshot],
        sales: &[SaleSnapshot],
        pending: &HashSet<ProductId>,
        as_of: DateTime<Utc>,
    ) -> Vec<ReorderSuggestion> {
        let demand = self.units_sold_in_window(sales, as_of);

        // A product listed twice is evaluated once, from its first row.
        let mut seen: HashSet<ProductId> = HashSet::with_capacity(products.len());
        let mut suggestions: Vec<ReorderSuggestion> = products
            .iter()
            .filter(|p| {
                let first = seen.insert(p.product_id);
                if !first {
                    debug!(product = %p.product_id, "ignoring duplicate product row");
                }
                first
            })
            .filter(|p| {
                let skip = pending.contains(&p.product_id);
                if skip {
                    debug!(product = %p.product_id, "skipping product with pending suggestion");
                }
                !skip
            })
            .filter_map(|p| {
                let units = demand.get(&p.product_id).copied().unwrap_or(0);
                self.evaluate(p, units, as_of)
            })
            .collect();

        suggestions.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        suggestions
    }

    /// Units sold per product within `[as_of - window, as_of]`.
    fn units_sold_in_window(
        &self,
        sales: &[SaleSnapshot],
        as_of: DateTime<Utc>,
    ) -> HashMap<ProductId, i64> {
        let window_start = as_of - Duration::days(i64::from(self.policy.window_days));

        let mut demand: HashMap<ProductId, i64> = HashMap::new();
        for sale in sales
            .iter()
            .filter(|s| s.sold_at >= window_start && s.sold_at <= as_of)
        {
            for line in &sale.lines {
                let entry = demand.entry(line.product_id).or_insert(0);
                *entry = entry.saturating_add(line.units());
            }
        }
        demand
    }

    fn evaluate(
        &self,
        product: &ProductSnapshot,
        units_sold: i64,
        as_of: DateTime<Utc>,
    ) -> Option<ReorderSuggestion> {
        let stock = product.stock();
        let reorder_point = product.reorder_point();
        let lead_time_days = product.lead_time_days();

        let avg_daily_sales = average_daily_sales(units_sold, self.policy.window_days);
        let days_of_stock = days_of_stock(stock, avg_daily_sales);

        let qualifies = stock <= reorder_point || days_of_stock.is_within(lead_time_days);
        if !qualifies {
            return None;
        }

        let suggested_quantity = product.reorder_quantity_override().unwrap_or_else(|| {
            velocity_quantity(
                avg_daily_sales,
                lead_time_days,
                self.policy.buffer_days,
                reorder_point,
            )
        });
        let priority = self.priority(stock, days_of_stock);
        let estimated_cost = u64::try_from(suggested_quantity)
            .unwrap_or(0)
            .saturating_mul(product.unit_cost());

        debug!(
            product = %product.product_id,
            stock,
            reorder_point,
            avg_daily_sales,
            ?days_of_stock,
            suggested_quantity,
            ?priority,
            "product qualifies for reorder"
        );

        Some(ReorderSuggestion {
            product_id: product.product_id,
            product_name: product.name.clone(),
            preferred_supplier_id: product.preferred_supplier_id,
            current_stock: stock,
            reorder_point,
            lead_time_days,
            avg_daily_sales,
            days_of_stock,
            suggested_quantity,
            priority,
            estimated_cost,
            computed_at: as_of,
        })
    }

    /// First match wins: empty shelf or `critical_days` → critical, then high, medium, low.
    fn priority(&self, stock: i64, days: DaysOfStock) -> PriorityTier {
        if stock == 0 || days.is_within(i64::from(self.policy.critical_days)) {
            PriorityTier::Critical
        } else if days.is_within(i64::from(self.policy.high_days)) {
            PriorityTier::High
        } else if days.is_within(i64::from(self.policy.medium_days)) {
            PriorityTier::Medium
        } else {
            PriorityTier::Low
        }
    }
}

/// Compute suggestions with the default policy (30-day window, 14-day buffer, 3/7/14 thresholds).
pub fn compute_suggestions(
    products: &[ProductSnapshot],
    sales: &[SaleSnapshot],
    pending: &HashSet<ProductId>,
    as_of: DateTime<Utc>,
) -> Vec<ReorderSuggestion> {
    ReplenishmentCalculator::default().compute(products, sales, pending, as_of)
}

fn average_daily_sales(units_sold: i64, window_days: u32) -> f64 {
    let avg = units_sold as f64 / f64::from(window_days.max(1));
    (avg * 100.0).round() / 100.0
}

fn days_of_stock(stock: i64, avg_daily_sales: f64) -> DaysOfStock {
    if avg_daily_sales <= 0.0 {
        return DaysOfStock::Unbounded;
    }
    // `as` saturates, so absurdly slow movers cap at u32::MAX days.
    DaysOfStock::Days((stock.max(0) as f64 / avg_daily_sales).floor() as u32)
}

fn velocity_quantity(
    avg_daily_sales: f64,
    lead_time_days: i64,
    buffer_days: u32,
    reorder_point: i64,
) -> i64 {
    let horizon = lead_time_days.saturating_add(i64::from(buffer_days)) as f64;
    let covering = (avg_daily_sales * horizon).ceil() as i64;
    covering.max(reorder_point.saturating_mul(2))
}

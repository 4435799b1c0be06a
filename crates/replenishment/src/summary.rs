//! Aggregations over a computed suggestion list.

use serde::{Deserialize, Serialize};

use procura_core::SupplierId;

use crate::suggestion::{PriorityTier, ReorderSuggestion};

/// Headline figures for a suggestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplenishmentSummary {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total_estimated_cost: u64,
}

impl ReplenishmentSummary {
    pub fn count(&self, tier: PriorityTier) -> usize {
        match tier {
            PriorityTier::Critical => self.critical,
            PriorityTier::High => self.high,
            PriorityTier::Medium => self.medium,
            PriorityTier::Low => self.low,
        }
    }
}

pub fn summarize(suggestions: &[ReorderSuggestion]) -> ReplenishmentSummary {
    suggestions
        .iter()
        .fold(ReplenishmentSummary::default(), |mut acc, s| {
            acc.total += 1;
            match s.priority {
                PriorityTier::Critical => acc.critical += 1,
                PriorityTier::High => acc.high += 1,
                PriorityTier::Medium => acc.medium += 1,
                PriorityTier::Low => acc.low += 1,
            }
            acc.total_estimated_cost = acc.total_estimated_cost.saturating_add(s.estimated_cost);
            acc
        })
}

/// Suggestions that would go to the same supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierGroup {
    /// `None` collects products without a preferred supplier.
    pub supplier_id: Option<SupplierId>,
    pub suggestions: Vec<ReorderSuggestion>,
    pub estimated_cost: u64,
}

/// Bucket suggestions by preferred supplier.
///
/// Groups appear in the order their first (most urgent) suggestion appears in
/// the input; the unassigned group always comes last. Input order is kept
/// inside each group.
pub fn group_by_supplier(suggestions: &[ReorderSuggestion]) -> Vec<SupplierGroup> {
    let mut groups: Vec<SupplierGroup> = Vec::new();
    let mut unassigned: Option<SupplierGroup> = None;

    for s in suggestions {
        let group = match s.preferred_supplier_id {
            Some(supplier_id) => {
                match groups.iter().position(|g| g.supplier_id == Some(supplier_id)) {
                    Some(i) => &mut groups[i],
                    None => {
                        groups.push(empty_group(Some(supplier_id)));
                        let last = groups.len() - 1;
                        &mut groups[last]
                    }
                }
            }
            None => unassigned.get_or_insert_with(|| empty_group(None)),
        };
        group.estimated_cost = group.estimated_cost.saturating_add(s.estimated_cost);
        group.suggestions.push(s.clone());
    }

    groups.extend(unassigned);
    groups
}

fn empty_group(supplier_id: Option<SupplierId>) -> SupplierGroup {
    SupplierGroup {
        supplier_id,
        suggestions: Vec::new(),
        estimated_cost: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestion::DaysOfStock;
    use chrono::Utc;
    use procura_core::ProductId;

    fn suggestion(
        priority: PriorityTier,
        supplier: Option<SupplierId>,
        cost: u64,
    ) -> ReorderSuggestion {
        ReorderSuggestion {
            product_id: ProductId::new(),
            product_name: String::new(),
            preferred_supplier_id: supplier,
            current_stock: 0,
            reorder_point: 0,
            lead_time_days: 0,
            avg_daily_sales: 0.0,
            days_of_stock: DaysOfStock::Unbounded,
            suggested_quantity: 1,
            priority,
            estimated_cost: cost,
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn summary_counts_tiers_and_sums_cost() {
        let list = vec![
            suggestion(PriorityTier::Critical, None, 100),
            suggestion(PriorityTier::Critical, None, 50),
            suggestion(PriorityTier::Low, None, 5),
        ];
        let summary = summarize(&list);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count(PriorityTier::Critical), 2);
        assert_eq!(summary.count(PriorityTier::Low), 1);
        assert_eq!(summary.count(PriorityTier::High), 0);
        assert_eq!(summary.total_estimated_cost, 155);
    }

    #[test]
    fn empty_list_summarizes_to_zero() {
        assert_eq!(summarize(&[]), ReplenishmentSummary::default());
    }

    #[test]
    fn groups_follow_first_appearance_with_unassigned_last() {
        let acme = SupplierId::new();
        let globex = SupplierId::new();
        let list = vec![
            suggestion(PriorityTier::Critical, None, 1),
            suggestion(PriorityTier::Critical, Some(globex), 10),
            suggestion(PriorityTier::High, Some(acme), 20),
            suggestion(PriorityTier::Low, Some(globex), 30),
        ];

        let groups = group_by_supplier(&list);
        let order: Vec<Option<SupplierId>> = groups.iter().map(|g| g.supplier_id).collect();
        assert_eq!(order, vec![Some(globex), Some(acme), None]);
        assert_eq!(groups[0].suggestions.len(), 2);
        assert_eq!(groups[0].estimated_cost, 40);
        assert_eq!(groups[0].suggestions[0].priority, PriorityTier::Critical);
        assert_eq!(groups[2].estimated_cost, 1);
    }
}

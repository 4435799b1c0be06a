use serde::{Deserialize, Serialize};
use tracing::debug;

use procura_auth::Role;
use procura_core::RuleId;

use crate::order::OrderCandidate;
use crate::rule::{ApprovalLevel, ApprovalRule};

/// Fallback routing when no rule matches: one approval from a configured role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultApproval {
    pub required_role: Role,
}

impl DefaultApproval {
    pub fn new(required_role: Role) -> Self {
        Self { required_role }
    }

    pub fn levels(&self) -> Vec<ApprovalLevel> {
        vec![ApprovalLevel::any_of(1, self.required_role)]
    }
}

impl Default for DefaultApproval {
    fn default() -> Self {
        Self::new(Role::OrgAdmin)
    }
}

/// Outcome of rule selection for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSelection<'a> {
    Rule(&'a ApprovalRule),
    Default(DefaultApproval),
}

impl RuleSelection<'_> {
    /// Selected rule id, `None` for the fallback.
    pub fn rule_id(&self) -> Option<RuleId> {
        match self {
            RuleSelection::Rule(rule) => Some(rule.id()),
            RuleSelection::Default(_) => None,
        }
    }

    pub fn levels(&self) -> Vec<ApprovalLevel> {
        match self {
            RuleSelection::Rule(rule) => rule.levels().to_vec(),
            RuleSelection::Default(fallback) => fallback.levels(),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, RuleSelection::Default(_))
    }
}

/// Pick the single rule governing `order`.
///
/// Only active rules whose trigger matches are considered. The highest
/// priority wins; ties go to the earliest rule in `rules`. With no candidate
/// the order falls back to `fallback`.
pub fn select_rule<'a>(
    rules: &'a [ApprovalRule],
    order: &OrderCandidate,
    fallback: DefaultApproval,
) -> RuleSelection<'a> {
    let mut best: Option<&'a ApprovalRule> = None;
    for rule in rules.iter().filter(|r| r.applies_to(order)) {
        if best.is_none_or(|b| rule.priority() > b.priority()) {
            best = Some(rule);
        }
    }

    match best {
        Some(rule) => {
            debug!(
                order_id = %order.order_id,
                rule_id = %rule.id(),
                priority = rule.priority(),
                "approval rule selected"
            );
            RuleSelection::Rule(rule)
        }
        None => {
            debug!(
                order_id = %order.order_id,
                role = %fallback.required_role,
                "no approval rule matched; using default approval"
            );
            RuleSelection::Default(fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleTrigger;
    use procura_core::{PurchaseOrderId, SupplierId};
    use proptest::prelude::*;

    fn value_rule(min: u64, max: Option<u64>, priority: i32) -> ApprovalRule {
        ApprovalRule::new(
            RuleId::new(),
            format!("value {min}..{max:?}"),
            RuleTrigger::ValueBased {
                min_amount: min,
                max_amount: max,
            },
            vec![ApprovalLevel::any_of(1, Role::FinanceManager)],
            priority,
        )
        .unwrap()
    }

    fn order(amount: u64) -> OrderCandidate {
        OrderCandidate::new(PurchaseOrderId::new(), amount)
    }

    #[test]
    fn highest_priority_match_wins() {
        let rules = vec![
            value_rule(0, Some(1_000_000), 1),
            ApprovalRule::new(
                RuleId::new(),
                "Large orders",
                RuleTrigger::ValueBased {
                    min_amount: 1_000_000,
                    max_amount: None,
                },
                vec![
                    ApprovalLevel::any_of(1, Role::WarehouseManager),
                    ApprovalLevel::any_of(2, Role::OrgAdmin),
                ],
                2,
            )
            .unwrap(),
        ];

        let selection = select_rule(&rules, &order(5_000_000), DefaultApproval::default());
        assert_eq!(selection.rule_id(), Some(rules[1].id()));
        assert_eq!(selection.levels().len(), 2);
    }

    #[test]
    fn ties_go_to_the_first_rule() {
        let rules = vec![value_rule(0, None, 3), value_rule(0, None, 3), value_rule(0, None, 1)];
        let selection = select_rule(&rules, &order(10), DefaultApproval::default());
        assert_eq!(selection.rule_id(), Some(rules[0].id()));
    }

    #[test]
    fn inactive_rules_are_skipped() {
        let rules = vec![value_rule(0, None, 9).with_active(false), value_rule(0, None, 1)];
        let selection = select_rule(&rules, &order(10), DefaultApproval::default());
        assert_eq!(selection.rule_id(), Some(rules[1].id()));
    }

    #[test]
    fn no_match_falls_back_to_default_role() {
        let supplier_rule = ApprovalRule::new(
            RuleId::new(),
            "Supplier",
            RuleTrigger::SupplierBased {
                supplier_id: SupplierId::new(),
            },
            vec![ApprovalLevel::all_of(1, Role::PurchasingManager)],
            10,
        )
        .unwrap();

        let rules = [supplier_rule];
        let selection = select_rule(&rules, &order(10), DefaultApproval::new(Role::FinanceManager));
        assert!(selection.is_default());
        assert_eq!(selection.rule_id(), None);
        assert_eq!(
            selection.levels(),
            vec![ApprovalLevel::any_of(1, Role::FinanceManager)]
        );
    }

    #[test]
    fn empty_rule_set_uses_default() {
        let selection = select_rule(&[], &order(1), DefaultApproval::default());
        assert_eq!(selection, RuleSelection::Default(DefaultApproval::new(Role::OrgAdmin)));
    }

    fn rule_strategy() -> impl Strategy<Value = ApprovalRule> {
        (0u64..1_000, proptest::option::of(1_000u64..2_000), -5i32..5, any::<bool>()).prop_map(
            |(min, max, priority, active)| value_rule(min, max, priority).with_active(active),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

        #[test]
        fn never_selects_an_inactive_or_non_matching_rule(
            rules in proptest::collection::vec(rule_strategy(), 0..12),
            amount in 0u64..2_500,
        ) {
            let candidate = order(amount);
            match select_rule(&rules, &candidate, DefaultApproval::default()) {
                RuleSelection::Rule(rule) => {
                    prop_assert!(rule.is_active());
                    prop_assert!(rule.trigger().matches(&candidate));
                    let best = rules
                        .iter()
                        .filter(|r| r.applies_to(&candidate))
                        .map(ApprovalRule::priority)
                        .max();
                    prop_assert_eq!(Some(rule.priority()), best);
                }
                RuleSelection::Default(_) => {
                    prop_assert!(rules.iter().all(|r| !r.applies_to(&candidate)));
                }
            }
        }
    }
}

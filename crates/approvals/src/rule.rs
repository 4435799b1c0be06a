//! Approval rules: when they apply and which levels they require.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use procura_auth::Role;
use procura_core::{DomainError, DomainResult, RuleId, SupplierId, lenient};

use crate::order::OrderCandidate;

/// One stage in a sign-off chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalLevel {
    /// 1-based ordinal, strictly increasing within a rule.
    pub level: u32,
    pub required_role: Role,
    /// `true`: every roster holder of the role must approve; `false`: any one suffices.
    #[serde(default)]
    pub require_all: bool,
}

impl ApprovalLevel {
    pub fn any_of(level: u32, required_role: Role) -> Self {
        Self {
            level,
            required_role,
            require_all: false,
        }
    }

    pub fn all_of(level: u32, required_role: Role) -> Self {
        Self {
            level,
            required_role,
            require_all: true,
        }
    }
}

/// Check that levels are non-empty and strictly increasing from >= 1.
pub fn validate_levels(levels: &[ApprovalLevel]) -> DomainResult<()> {
    if levels.is_empty() {
        return Err(DomainError::malformed("at least one approval level is required"));
    }
    let mut previous = 0u32;
    for l in levels {
        if l.level <= previous {
            return Err(DomainError::malformed(format!(
                "approval levels must be 1-based and strictly increasing (got {} after {})",
                l.level, previous
            )));
        }
        previous = l.level;
    }
    Ok(())
}

/// What makes a rule applicable to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTrigger {
    /// `min_amount <= amount < max_amount` (`None` = no upper bound).
    ValueBased {
        min_amount: u64,
        max_amount: Option<u64>,
    },
    TypeBased {
        order_type: String,
    },
    SupplierBased {
        supplier_id: SupplierId,
    },
}

impl RuleTrigger {
    pub fn trigger_type(&self) -> &'static str {
        match self {
            RuleTrigger::ValueBased { .. } => "value_based",
            RuleTrigger::TypeBased { .. } => "type_based",
            RuleTrigger::SupplierBased { .. } => "supplier_based",
        }
    }

    pub fn matches(&self, order: &OrderCandidate) -> bool {
        match self {
            RuleTrigger::ValueBased {
                min_amount,
                max_amount,
            } => order.amount >= *min_amount && max_amount.is_none_or(|max| order.amount < max),
            RuleTrigger::TypeBased { order_type } => {
                order.order_type.as_deref() == Some(order_type.as_str())
            }
            RuleTrigger::SupplierBased { supplier_id } => order.supplier_id == Some(*supplier_id),
        }
    }

    /// Parse a trigger from the store's `trigger_type` + `conditions` pair.
    pub fn from_parts(trigger_type: &str, conditions: &Value) -> DomainResult<Self> {
        let empty = Map::new();
        let obj = match conditions {
            Value::Object(m) => m,
            Value::Null => &empty,
            _ => return Err(DomainError::malformed("conditions must be an object")),
        };

        match trigger_type {
            "value_based" => {
                let min_amount = obj
                    .get("min_amount")
                    .and_then(lenient::value_as_u64)
                    .ok_or_else(|| {
                        DomainError::malformed("value_based rule needs a non-negative min_amount")
                    })?;
                let max_amount = match obj.get("max_amount") {
                    None | Some(Value::Null) => None,
                    Some(v) => Some(lenient::value_as_u64(v).ok_or_else(|| {
                        DomainError::malformed("max_amount must be a non-negative number")
                    })?),
                };
                if max_amount.is_some_and(|max| max < min_amount) {
                    return Err(DomainError::malformed("max_amount must be >= min_amount"));
                }
                Ok(RuleTrigger::ValueBased {
                    min_amount,
                    max_amount,
                })
            }
            "type_based" => {
                let order_type = obj
                    .get("order_type")
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| DomainError::malformed("type_based rule needs an order_type"))?;
                Ok(RuleTrigger::TypeBased {
                    order_type: order_type.to_string(),
                })
            }
            "supplier_based" => {
                let supplier_id = obj
                    .get("supplier_id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        DomainError::malformed("supplier_based rule needs a supplier_id")
                    })?
                    .parse::<SupplierId>()
                    .map_err(|e| DomainError::malformed(e.to_string()))?;
                Ok(RuleTrigger::SupplierBased { supplier_id })
            }
            other => Err(DomainError::malformed(format!("unknown trigger_type '{other}'"))),
        }
    }

    pub fn conditions(&self) -> Value {
        match self {
            RuleTrigger::ValueBased {
                min_amount,
                max_amount,
            } => serde_json::json!({ "min_amount": min_amount, "max_amount": max_amount }),
            RuleTrigger::TypeBased { order_type } => {
                serde_json::json!({ "order_type": order_type })
            }
            RuleTrigger::SupplierBased { supplier_id } => {
                serde_json::json!({ "supplier_id": supplier_id.to_string() })
            }
        }
    }
}

/// Raw rule as stored by the rule editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRuleRecord {
    pub id: RuleId,
    pub name: String,
    pub trigger_type: String,
    #[serde(default)]
    pub conditions: Value,
    #[serde(default)]
    pub levels: Vec<ApprovalLevel>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// A validated approval rule.
///
/// Only constructible through validation, so every rule the resolver sees has
/// a well-formed trigger and a strictly ordered, non-empty level chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ApprovalRuleRecord", into = "ApprovalRuleRecord")]
pub struct ApprovalRule {
    id: RuleId,
    name: String,
    trigger: RuleTrigger,
    levels: Vec<ApprovalLevel>,
    priority: i32,
    is_active: bool,
}

impl ApprovalRule {
    pub fn new(
        id: RuleId,
        name: impl Into<String>,
        trigger: RuleTrigger,
        levels: Vec<ApprovalLevel>,
        priority: i32,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::malformed("rule name cannot be empty"));
        }
        validate_levels(&levels)?;
        if let RuleTrigger::ValueBased {
            min_amount,
            max_amount: Some(max),
        } = &trigger
        {
            if max < min_amount {
                return Err(DomainError::malformed("max_amount must be >= min_amount"));
            }
        }
        Ok(Self {
            id,
            name,
            trigger,
            levels,
            priority,
            is_active: true,
        })
    }

    /// Decode and validate a stored rule record given as JSON.
    pub fn from_json(value: &Value) -> DomainResult<Self> {
        let record: ApprovalRuleRecord = serde_json::from_value(value.clone())
            .map_err(|e| DomainError::malformed(format!("approval rule: {e}")))?;
        Self::try_from(record)
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger(&self) -> &RuleTrigger {
        &self.trigger
    }

    pub fn levels(&self) -> &[ApprovalLevel] {
        &self.levels
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Active and triggered by `order`.
    pub fn applies_to(&self, order: &OrderCandidate) -> bool {
        self.is_active && self.trigger.matches(order)
    }
}

impl TryFrom<ApprovalRuleRecord> for ApprovalRule {
    type Error = DomainError;

    fn try_from(record: ApprovalRuleRecord) -> Result<Self, Self::Error> {
        let trigger = RuleTrigger::from_parts(&record.trigger_type, &record.conditions)?;
        Ok(ApprovalRule::new(record.id, record.name, trigger, record.levels, record.priority)?
            .with_active(record.is_active))
    }
}

impl From<ApprovalRule> for ApprovalRuleRecord {
    fn from(rule: ApprovalRule) -> Self {
        Self {
            id: rule.id,
            name: rule.name,
            trigger_type: rule.trigger.trigger_type().to_string(),
            conditions: rule.trigger.conditions(),
            levels: rule.levels,
            priority: rule.priority,
            is_active: rule.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procura_core::PurchaseOrderId;
    use serde_json::json;

    fn order(amount: u64) -> OrderCandidate {
        OrderCandidate::new(PurchaseOrderId::new(), amount)
    }

    #[test]
    fn value_range_is_half_open() {
        let trigger = RuleTrigger::ValueBased {
            min_amount: 1_000,
            max_amount: Some(5_000),
        };
        assert!(!trigger.matches(&order(999)));
        assert!(trigger.matches(&order(1_000)));
        assert!(trigger.matches(&order(4_999)));
        assert!(!trigger.matches(&order(5_000)));

        let open_ended = RuleTrigger::ValueBased {
            min_amount: 1_000,
            max_amount: None,
        };
        assert!(open_ended.matches(&order(u64::MAX)));
    }

    #[test]
    fn type_and_supplier_triggers_need_the_field_on_the_order() {
        let supplier = SupplierId::new();
        let by_type = RuleTrigger::TypeBased {
            order_type: "capex".into(),
        };
        let by_supplier = RuleTrigger::SupplierBased {
            supplier_id: supplier,
        };

        assert!(!by_type.matches(&order(1)));
        assert!(by_type.matches(&order(1).with_order_type("capex")));
        assert!(!by_type.matches(&order(1).with_order_type("CAPEX")));

        assert!(!by_supplier.matches(&order(1)));
        assert!(!by_supplier.matches(&order(1).with_supplier(SupplierId::new())));
        assert!(by_supplier.matches(&order(1).with_supplier(supplier)));
    }

    #[test]
    fn decodes_stored_record() {
        let id = RuleId::new();
        let rule = ApprovalRule::from_json(&json!({
            "id": id.to_string(),
            "name": "Large orders",
            "trigger_type": "value_based",
            "conditions": {"min_amount": 1000000, "max_amount": null},
            "levels": [
                {"level": 1, "required_role": "warehouse_manager"},
                {"level": 2, "required_role": "org_admin", "require_all": true}
            ],
            "priority": 2
        }))
        .unwrap();

        assert_eq!(rule.id(), id);
        assert!(rule.is_active());
        assert_eq!(rule.priority(), 2);
        assert_eq!(
            rule.trigger(),
            &RuleTrigger::ValueBased {
                min_amount: 1_000_000,
                max_amount: None
            }
        );
        assert_eq!(rule.levels()[1], ApprovalLevel::all_of(2, Role::OrgAdmin));
    }

    #[test]
    fn serde_round_trip_keeps_store_shape() {
        let rule = ApprovalRule::new(
            RuleId::new(),
            "Preferred supplier",
            RuleTrigger::SupplierBased {
                supplier_id: SupplierId::new(),
            },
            vec![ApprovalLevel::any_of(1, Role::PurchasingManager)],
            5,
        )
        .unwrap()
        .with_active(false);

        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["trigger_type"], "supplier_based");
        assert_eq!(value["is_active"], false);

        let back: ApprovalRule = serde_json::from_value(value).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn malformed_records_are_rejected() {
        let id = RuleId::new().to_string();
        let level = json!([{"level": 1, "required_role": "org_admin"}]);
        let record = |name: &str, trigger: &str, conditions: Value, levels: Value| {
            json!({
                "id": id,
                "name": name,
                "trigger_type": trigger,
                "conditions": conditions,
                "levels": levels
            })
        };
        let from_zero = || json!({"min_amount": 0});
        let cases = vec![
            record(" ", "value_based", from_zero(), level.clone()),
            record("x", "value_based", json!({"min_amount": "abc"}), level.clone()),
            record("x", "value_based", json!({"min_amount": 10, "max_amount": 5}), level.clone()),
            record("x", "type_based", json!({}), level.clone()),
            record("x", "supplier_based", json!({"supplier_id": "acme"}), level.clone()),
            record("x", "time_based", json!({}), level.clone()),
            record("x", "value_based", from_zero(), json!([])),
            record(
                "x",
                "value_based",
                from_zero(),
                json!([
                    {"level": 2, "required_role": "org_admin"},
                    {"level": 1, "required_role": "org_admin"}
                ]),
            ),
            record(
                "x",
                "value_based",
                from_zero(),
                json!([{"level": 1, "required_role": "cashier"}]),
            ),
        ];

        for case in cases {
            let err = ApprovalRule::from_json(&case).unwrap_err();
            assert_eq!(err.kind(), "malformed_input", "case: {case}");
        }
    }

    #[test]
    fn level_zero_is_rejected() {
        let err = validate_levels(&[ApprovalLevel::any_of(0, Role::OrgAdmin)]).unwrap_err();
        assert_eq!(err.kind(), "malformed_input");
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

use procura_core::{DomainError, DomainResult, PurchaseOrderId, SupplierId, lenient};

/// The facts about a purchase order that approval routing looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCandidate {
    pub order_id: PurchaseOrderId,
    /// Order total in smallest currency unit (e.g., cents).
    pub amount: u64,
    pub order_type: Option<String>,
    pub supplier_id: Option<SupplierId>,
}

impl OrderCandidate {
    pub fn new(order_id: PurchaseOrderId, amount: u64) -> Self {
        Self {
            order_id,
            amount,
            order_type: None,
            supplier_id: None,
        }
    }

    pub fn with_order_type(mut self, order_type: impl Into<String>) -> Self {
        self.order_type = Some(order_type.into());
        self
    }

    pub fn with_supplier(mut self, supplier_id: SupplierId) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    /// Decode an order record as handed over by the store.
    ///
    /// `order_id` and `amount` are required; the amount may be a number or a
    /// numeric string. Anything else fails with `MalformedInput`.
    pub fn from_record(record: &Value) -> DomainResult<Self> {
        let obj = record
            .as_object()
            .ok_or_else(|| DomainError::malformed("order record must be an object"))?;

        let order_id = obj
            .get("order_id")
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError::malformed("order_id is missing"))?
            .parse::<PurchaseOrderId>()
            .map_err(|e| DomainError::malformed(e.to_string()))?;

        let amount = obj
            .get("amount")
            .and_then(lenient::value_as_u64)
            .ok_or_else(|| {
                DomainError::malformed("amount is missing or not a non-negative number")
            })?;

        let order_type = match obj.get("order_type") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(DomainError::malformed("order_type must be a string")),
        };

        let supplier_id = match obj.get("supplier_id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(
                s.parse::<SupplierId>()
                    .map_err(|e| DomainError::malformed(e.to_string()))?,
            ),
            Some(_) => return Err(DomainError::malformed("supplier_id must be a string")),
        };

        Ok(Self {
            order_id,
            amount,
            order_type,
            supplier_id,
        })
    }
}

//! Read-only inputs of the calculator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use procura_core::{ProductId, SaleId, SupplierId, lenient};

/// A product as read from the catalog at computation time.
///
/// Numeric fields are optional: the store may hand over missing or malformed
/// values, which decode as `None` and are read as zero by the accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub current_stock: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub reorder_point: Option<i64>,
    /// Explicit reorder quantity; overrides the velocity-based suggestion.
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub reorder_quantity: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub lead_time_days: Option<i64>,
    /// Price in smallest currency unit (e.g., cents).
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub unit_cost: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_from_str")]
    pub preferred_supplier_id: Option<SupplierId>,
}

impl ProductSnapshot {
    pub fn new(product_id: ProductId) -> Self {
        Self {
            product_id,
            name: String::new(),
            current_stock: None,
            reorder_point: None,
            reorder_quantity: None,
            lead_time_days: None,
            unit_cost: None,
            preferred_supplier_id: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.current_stock = Some(stock);
        self
    }

    pub fn with_reorder_point(mut self, reorder_point: i64) -> Self {
        self.reorder_point = Some(reorder_point);
        self
    }

    pub fn with_reorder_quantity(mut self, quantity: i64) -> Self {
        self.reorder_quantity = Some(quantity);
        self
    }

    pub fn with_lead_time_days(mut self, days: i64) -> Self {
        self.lead_time_days = Some(days);
        self
    }

    pub fn with_unit_cost(mut self, unit_cost: u64) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    pub fn with_preferred_supplier(mut self, supplier_id: SupplierId) -> Self {
        self.preferred_supplier_id = Some(supplier_id);
        self
    }

    /// Stock on hand; missing and negative values read as 0.
    pub fn stock(&self) -> i64 {
        self.current_stock.unwrap_or(0).max(0)
    }

    /// Reorder point; missing and negative values read as 0.
    pub fn reorder_point(&self) -> i64 {
        self.reorder_point.unwrap_or(0).max(0)
    }

    /// Lead time; missing and negative values read as 0.
    pub fn lead_time_days(&self) -> i64 {
        self.lead_time_days.unwrap_or(0).max(0)
    }

    /// Reorder quantity override, if one is set to a positive value.
    pub fn reorder_quantity_override(&self) -> Option<i64> {
        self.reorder_quantity.filter(|q| *q > 0)
    }

    pub fn unit_cost(&self) -> u64 {
        self.unit_cost.unwrap_or(0)
    }
}

/// One line of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub quantity: Option<i64>,
}

impl SaleLine {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity: Some(quantity),
        }
    }

    /// Units this line contributes to demand (non-positive and missing count as 0).
    pub fn units(&self) -> i64 {
        self.quantity.unwrap_or(0).max(0)
    }
}

/// A completed sale, used only to derive sales velocity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSnapshot {
    pub sale_id: SaleId,
    pub sold_at: DateTime<Utc>,
    #[serde(default)]
    pub lines: Vec<SaleLine>,
}

impl SaleSnapshot {
    pub fn new(sale_id: SaleId, sold_at: DateTime<Utc>, lines: Vec<SaleLine>) -> Self {
        Self {
            sale_id,
            sold_at,
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_numeric_fields_read_as_zero() {
        let id = ProductId::new();
        let product: ProductSnapshot = serde_json::from_value(json!({
            "product_id": id.to_string(),
            "name": "Widget",
            "current_stock": "lots",
            "reorder_point": "10",
            "lead_time_days": null,
            "unit_cost": -3,
            "preferred_supplier_id": "not-an-id"
        }))
        .unwrap();

        assert_eq!(product.stock(), 0);
        assert_eq!(product.reorder_point(), 10);
        assert_eq!(product.lead_time_days(), 0);
        assert_eq!(product.unit_cost(), 0);
        assert_eq!(product.preferred_supplier_id, None);
        assert_eq!(product.reorder_quantity_override(), None);
    }

    #[test]
    fn non_positive_override_is_ignored() {
        let product = ProductSnapshot::new(ProductId::new()).with_reorder_quantity(0);
        assert_eq!(product.reorder_quantity_override(), None);

        let product = product.with_reorder_quantity(25);
        assert_eq!(product.reorder_quantity_override(), Some(25));
    }

    #[test]
    fn returns_and_garbage_lines_contribute_nothing() {
        let id = ProductId::new();
        assert_eq!(SaleLine::new(id, -4).units(), 0);
        let line: SaleLine =
            serde_json::from_value(json!({"product_id": id.to_string(), "quantity": "x"})).unwrap();
        assert_eq!(line.units(), 0);
    }
}

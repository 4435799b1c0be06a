use core::str::FromStr;

use serde::{Deserialize, Serialize};

use procura_core::DomainError;

/// Closed vocabulary of roles that can be bound to an approval level.
///
/// Role *assignment* happens outside the engine; this type only names the
/// tokens a rule may require and an approver may present.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    OrgAdmin,
    FinanceManager,
    WarehouseManager,
    PurchasingManager,
    SalesManager,
    HrManager,
    TransportManager,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 7] = [
        Role::OrgAdmin,
        Role::FinanceManager,
        Role::WarehouseManager,
        Role::PurchasingManager,
        Role::SalesManager,
        Role::HrManager,
        Role::TransportManager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::OrgAdmin => "org_admin",
            Role::FinanceManager => "finance_manager",
            Role::WarehouseManager => "warehouse_manager",
            Role::PurchasingManager => "purchasing_manager",
            Role::SalesManager => "sales_manager",
            Role::HrManager => "hr_manager",
            Role::TransportManager => "transport_manager",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| DomainError::malformed(format!("unknown role '{token}'")))
    }
}

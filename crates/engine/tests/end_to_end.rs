use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use procura_approvals::{
    ApprovalAction, ApprovalRule, ApprovalStatus, DefaultApproval, OrderCandidate,
};
use procura_auth::{Approver, ApproverRoster, Role};
use procura_core::{ActorId, DomainError, ProductId, PurchaseOrderId, RuleId, SaleId, TenantId};
use procura_engine::{
    ApprovalEnvelope, ApprovalService, EngineConfig, InMemoryApprovalDirectory,
    InMemoryInstanceStore, JobError, JobScheduler, LocalJobScheduler, ReplenishmentJob,
    ReplenishmentSnapshot, TenantScope,
};
use procura_events::{Event, InMemoryEventBus};
use procura_replenishment::{PriorityTier, ProductSnapshot, SaleLine, SaleSnapshot};

fn sale(sold_at: DateTime<Utc>, product: ProductId, quantity: i64) -> SaleSnapshot {
    SaleSnapshot::new(SaleId::new(), sold_at, vec![SaleLine::new(product, quantity)])
}

fn approve(level: u32, role: Role) -> ApprovalAction {
    ApprovalAction::approve(level, Approver::new(ActorId::new(), role), Utc::now())
}

#[test]
fn low_stock_product_gets_a_critical_suggestion() {
    let tenant = TenantId::new();
    let as_of = Utc.with_ymd_and_hms(2026, 3, 31, 12, 0, 0).unwrap();
    let product = ProductId::new();
    let quiet = ProductId::new();

    let mut snapshot = ReplenishmentSnapshot::new(tenant, as_of);
    snapshot.products = vec![
        ProductSnapshot::new(product)
            .with_name("Widget")
            .with_stock(2)
            .with_reorder_point(10)
            .with_lead_time_days(5)
            .with_unit_cost(250),
        ProductSnapshot::new(quiet).with_stock(100).with_reorder_point(10),
    ];
    snapshot.sales = vec![
        sale(as_of - Duration::days(10), product, 40),
        sale(as_of - Duration::days(2), product, 20),
        // outside the 30-day window
        sale(as_of - Duration::days(45), product, 500),
    ];

    let cfg = EngineConfig::from_lookup(|_| None);
    let run = LocalJobScheduler::for_tenant(tenant)
        .run(ReplenishmentJob::new(tenant, snapshot.clone()).with_policy(cfg.policy))
        .unwrap();

    assert_eq!(run.suggestions.len(), 1);
    let s = &run.suggestions[0];
    assert_eq!(s.product_id, product);
    assert_eq!(s.avg_daily_sales, 2.0);
    assert_eq!(s.days_of_stock.days(), Some(1));
    assert_eq!(s.priority, PriorityTier::Critical);
    assert_eq!(s.suggested_quantity, 38);
    assert_eq!(s.estimated_cost, 38 * 250);

    // Same input with the product already pending yields nothing new.
    snapshot.pending.insert(product);
    let again = LocalJobScheduler::new(TenantScope::Any)
        .run(ReplenishmentJob::new(tenant, snapshot).with_policy(cfg.policy))
        .unwrap();
    assert!(again.suggestions.is_empty());
}

#[test]
fn large_order_walks_two_levels_to_approval() {
    let tenant = TenantId::new();
    let small = RuleId::new();
    let large = RuleId::new();

    let rules: Vec<ApprovalRule> = [
        json!({
            "id": small.to_string(),
            "name": "Small orders",
            "trigger_type": "value_based",
            "conditions": {"min_amount": 0, "max_amount": 1_000_000},
            "levels": [{"level": 1, "required_role": "purchasing_manager"}],
            "priority": 1
        }),
        json!({
            "id": large.to_string(),
            "name": "Large orders",
            "trigger_type": "value_based",
            "conditions": {"min_amount": 1_000_000},
            "levels": [
                {"level": 1, "required_role": "warehouse_manager"},
                {"level": 2, "required_role": "org_admin"}
            ],
            "priority": 2
        }),
    ]
    .iter()
    .map(|v| ApprovalRule::from_json(v).unwrap())
    .collect();

    let directory = Arc::new(InMemoryApprovalDirectory::new());
    directory.set_rules(tenant, rules);
    directory.set_roster(tenant, ApproverRoster::new());
    let bus: Arc<InMemoryEventBus<ApprovalEnvelope>> = Arc::new(InMemoryEventBus::new());
    let closed = bus.subscribe_where(|e: &ApprovalEnvelope| e.payload().is_terminal());

    let service = ApprovalService::new(directory, Arc::new(InMemoryInstanceStore::new()), bus)
        .with_fallback(DefaultApproval::new(Role::OrgAdmin));

    let order = OrderCandidate::from_record(&json!({
        "order_id": PurchaseOrderId::new().to_string(),
        "amount": "5000000"
    }))
    .unwrap();

    let opened = service.open(tenant, &order, Utc::now()).unwrap();
    assert_eq!(opened.rule_id(), Some(large));
    assert_eq!(opened.current_level().map(|l| l.level()), Some(1));

    // Level 2 cannot be acted on before level 1.
    let early = service
        .act(tenant, order.order_id, &approve(2, Role::OrgAdmin))
        .unwrap_err();
    assert!(matches!(
        early,
        JobError::Domain(DomainError::OutOfSequence { expected: 1, actual: 2 })
    ));

    let step1 = service
        .act(tenant, order.order_id, &approve(1, Role::WarehouseManager))
        .unwrap();
    assert_eq!(step1.instance.status(), ApprovalStatus::Pending);
    assert_eq!(step1.instance.current_level().map(|l| l.level()), Some(2));

    let step2 = service
        .act(tenant, order.order_id, &approve(2, Role::OrgAdmin))
        .unwrap();
    assert_eq!(step2.instance.status(), ApprovalStatus::Approved);

    let terminal: Vec<&'static str> =
        closed.drain().iter().map(|e| e.payload().event_type()).collect();
    assert_eq!(terminal, vec!["approvals.instance.approved"]);

    let late_reject = ApprovalAction::reject(
        2,
        Approver::new(ActorId::new(), Role::OrgAdmin),
        Utc::now(),
    );
    let refused = service.act(tenant, order.order_id, &late_reject).unwrap_err();
    assert!(matches!(refused, JobError::Domain(DomainError::InvalidState(_))));
}

#[test]
fn require_all_level_waits_for_the_whole_roster() {
    let tenant = TenantId::new();
    let a = ActorId::new();
    let b = ActorId::new();

    let directory = Arc::new(InMemoryApprovalDirectory::new());
    directory.set_rules(
        tenant,
        vec![
            ApprovalRule::from_json(&json!({
                "id": RuleId::new().to_string(),
                "name": "Capex",
                "trigger_type": "type_based",
                "conditions": {"order_type": "capex"},
                "levels": [{"level": 1, "required_role": "finance_manager", "require_all": true}],
                "priority": 5
            }))
            .unwrap(),
        ],
    );
    directory.set_roster(
        tenant,
        ApproverRoster::new()
            .with_member(Role::FinanceManager, a)
            .with_member(Role::FinanceManager, b),
    );

    let service = ApprovalService::new(
        directory,
        Arc::new(InMemoryInstanceStore::new()),
        Arc::new(InMemoryEventBus::<ApprovalEnvelope>::new()),
    );

    let order = OrderCandidate::new(PurchaseOrderId::new(), 42).with_order_type("capex");
    service.open(tenant, &order, Utc::now()).unwrap();

    let first = service
        .act(
            tenant,
            order.order_id,
            &ApprovalAction::approve(1, Approver::new(a, Role::FinanceManager), Utc::now()),
        )
        .unwrap();
    assert_eq!(first.instance.status(), ApprovalStatus::Pending);

    let second = service
        .act(
            tenant,
            order.order_id,
            &ApprovalAction::approve(1, Approver::new(b, Role::FinanceManager), Utc::now()),
        )
        .unwrap();
    assert_eq!(second.instance.status(), ApprovalStatus::Approved);
}

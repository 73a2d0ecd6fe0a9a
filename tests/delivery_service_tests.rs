use chrono::{DateTime, TimeZone, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};

use douka_backend::entities::{employee_entity, merchant_entity, order_entity, user_entity};
use douka_backend::models::{
    AssignmentLedger, AssignmentRecord, OrderType, PAYMENT_COMPLETED, STATUS_DELIVERED,
};
use douka_backend::services::DeliveryService;
use douka_backend::AppError;

async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None).await.expect("Migrations failed");
    db
}

async fn seed_customer(db: &DatabaseConnection) -> user_entity::Model {
    user_entity::ActiveModel {
        email: Set("client@moroni.km".to_string()),
        password_hash: Set("x".to_string()),
        first_name: Set("Amina".to_string()),
        last_name: Set("Said".to_string()),
        email_verified: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert customer")
}

async fn seed_merchant(db: &DatabaseConnection, email: &str) -> merchant_entity::Model {
    merchant_entity::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set("x".to_string()),
        store_name: Set("Boutique Moroni".to_string()),
        balance: Set(0.0),
        status: Set("active".to_string()),
        email_verified: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert merchant")
}

async fn seed_employee(
    db: &DatabaseConnection,
    email: &str,
    first_name: &str,
    last_name: &str,
    role: &str,
    status: &str,
) -> employee_entity::Model {
    employee_entity::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set("x".to_string()),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        phone: Set(Some("3311234".to_string())),
        role: Set(role.to_string()),
        status: Set(status.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert employee")
}

async fn seed_delivered_order(
    db: &DatabaseConnection,
    n: u32,
    customer_id: i32,
    merchant_id: Option<i32>,
    created_at: DateTime<Utc>,
) -> order_entity::Model {
    order_entity::ActiveModel {
        order_number: Set(format!("ORD-2025-{n:04}")),
        customer_id: Set(customer_id),
        merchant_id: Set(merchant_id),
        total: Set(5000.0),
        shipping_fee: Set(500.0),
        discount: Set(0.0),
        status: Set(STATUS_DELIVERED.to_string()),
        payment_status: Set(PAYMENT_COMPLETED.to_string()),
        stock_reserved: Set(false),
        created_at: Set(created_at),
        updated_at: Set(created_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert order")
}

async fn reload(db: &DatabaseConnection, id: i32) -> order_entity::Model {
    order_entity::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("Failed to reload order")
        .expect("order exists")
}

#[tokio::test]
async fn test_backfill_applies_ledger_snapshots() {
    let db = setup().await;
    let customer = seed_customer(&db).await;
    let merchant = seed_merchant(&db, "boutique@moroni.km").await;
    let fatima = seed_employee(
        &db,
        "fatima@douka-km.com",
        "Fatima",
        "Abdou",
        "livreur",
        "active",
    )
    .await;

    let admin_order = seed_delivered_order(&db, 1, customer.id, None, Utc::now()).await;
    let merchant_order =
        seed_delivered_order(&db, 2, customer.id, Some(merchant.id), Utc::now()).await;

    let mut ledger = AssignmentLedger::new();
    ledger.record(
        "fatima@douka-km.com",
        AssignmentRecord {
            order_id: admin_order.id,
            order_type: OrderType::Admin,
            merchant_email: None,
        },
    );
    ledger.record(
        "fatima@douka-km.com",
        AssignmentRecord {
            order_id: merchant_order.id,
            order_type: OrderType::Merchant,
            merchant_email: Some("boutique@moroni.km".to_string()),
        },
    );

    let service = DeliveryService::new(db.clone());
    let report = service.backfill_delivered(&ledger).await.expect("backfill");

    assert_eq!(report.admin_updated, 1);
    assert_eq!(report.merchant_updated, 1);
    assert_eq!(report.total_updated(), 2);
    assert!(report.unmatched.is_empty());
    assert!(report.missing_livreurs.is_empty());

    let admin_order = reload(&db, admin_order.id).await;
    assert_eq!(admin_order.delivery_employee_id, Some(fatima.id));
    assert_eq!(
        admin_order.delivery_employee_email.as_deref(),
        Some("fatima@douka-km.com")
    );
    assert_eq!(admin_order.delivery_employee_name.as_deref(), Some("Fatima Abdou"));
    assert_eq!(admin_order.delivery_employee_phone.as_deref(), Some("3311234"));
    assert!(admin_order.assigned_at.is_some());

    let merchant_order = reload(&db, merchant_order.id).await;
    assert_eq!(
        merchant_order.delivery_employee_email.as_deref(),
        Some("fatima@douka-km.com")
    );
}

#[tokio::test]
async fn test_backfill_never_overwrites_an_existing_snapshot() {
    let db = setup().await;
    let customer = seed_customer(&db).await;
    seed_employee(
        &db,
        "fatima@douka-km.com",
        "Fatima",
        "Abdou",
        "livreur",
        "active",
    )
    .await;

    let order = seed_delivered_order(&db, 1, customer.id, None, Utc::now()).await;
    let mut active: order_entity::ActiveModel = order.clone().into();
    active.delivery_employee_id = Set(Some(99));
    active.delivery_employee_email = Set(Some("ancien@douka-km.com".to_string()));
    active.delivery_employee_name = Set(Some("Ancien Livreur".to_string()));
    active.delivery_employee_phone = Set(Some("3300000".to_string()));
    active.assigned_at = Set(Some(Utc::now()));
    active.update(&db).await.expect("pre-assign order");

    let mut ledger = AssignmentLedger::new();
    ledger.record(
        "fatima@douka-km.com",
        AssignmentRecord {
            order_id: order.id,
            order_type: OrderType::Admin,
            merchant_email: None,
        },
    );

    let service = DeliveryService::new(db.clone());
    let report = service.backfill_delivered(&ledger).await.expect("backfill");

    assert_eq!(report.already_assigned, 1);
    assert_eq!(report.total_updated(), 0);

    // 已有快照是权威数据，台账不得覆盖
    let order = reload(&db, order.id).await;
    assert_eq!(
        order.delivery_employee_email.as_deref(),
        Some("ancien@douka-km.com")
    );
}

#[tokio::test]
async fn test_backfill_merchant_email_must_match() {
    let db = setup().await;
    let customer = seed_customer(&db).await;
    let merchant = seed_merchant(&db, "boutique@moroni.km").await;
    seed_employee(
        &db,
        "fatima@douka-km.com",
        "Fatima",
        "Abdou",
        "livreur",
        "active",
    )
    .await;

    let order = seed_delivered_order(&db, 1, customer.id, Some(merchant.id), Utc::now()).await;

    let mut ledger = AssignmentLedger::new();
    ledger.record(
        "fatima@douka-km.com",
        AssignmentRecord {
            order_id: order.id,
            order_type: OrderType::Merchant,
            merchant_email: Some("autre-boutique@anjouan.km".to_string()),
        },
    );

    let service = DeliveryService::new(db.clone());
    let report = service.backfill_delivered(&ledger).await.expect("backfill");

    assert_eq!(report.total_updated(), 0);
    assert_eq!(report.unmatched, vec![order.id]);
    let order = reload(&db, order.id).await;
    assert!(order.delivery_employee_email.is_none());
}

#[tokio::test]
async fn test_backfill_reports_missing_livreur() {
    let db = setup().await;
    let customer = seed_customer(&db).await;
    let order = seed_delivered_order(&db, 1, customer.id, None, Utc::now()).await;

    let mut ledger = AssignmentLedger::new();
    ledger.record(
        "fantome@douka-km.com",
        AssignmentRecord {
            order_id: order.id,
            order_type: OrderType::Admin,
            merchant_email: None,
        },
    );

    let service = DeliveryService::new(db.clone());
    let report = service.backfill_delivered(&ledger).await.expect("backfill");

    assert_eq!(report.total_updated(), 0);
    assert_eq!(report.missing_livreurs, vec!["fantome@douka-km.com".to_string()]);
    assert_eq!(report.unmatched, vec![order.id]);
    let order = reload(&db, order.id).await;
    assert!(order.delivery_employee_email.is_none());
}

#[tokio::test]
async fn test_assign_default_livreur_backdates_to_order_creation() {
    let db = setup().await;
    let customer = seed_customer(&db).await;
    let ali = seed_employee(&db, "a@x.com", "Ali", "Hassan", "livreur", "active").await;

    let created_at = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap();
    let order = seed_delivered_order(&db, 1, customer.id, None, created_at).await;

    let service = DeliveryService::new(db.clone());
    let assignment = service
        .assign_default_livreur()
        .await
        .expect("default assignment");

    let livreur = assignment.livreur.expect("a livreur was picked");
    assert_eq!(livreur.id, ali.id);
    assert_eq!(assignment.orders, vec![(order.id, OrderType::Admin)]);

    let order = reload(&db, order.id).await;
    assert_eq!(order.delivery_employee_email.as_deref(), Some("a@x.com"));
    assert_eq!(order.delivery_employee_name.as_deref(), Some("Ali Hassan"));
    assert_eq!(order.delivery_employee_phone.as_deref(), Some("3311234"));
    // assigned_at 回填的是订单自己的创建时间，不是当前时间
    assert_eq!(order.assigned_at, Some(order.created_at));
    assert_eq!(order.created_at, created_at);
}

#[tokio::test]
async fn test_assign_default_livreur_without_orphans_is_a_noop() {
    let db = setup().await;
    let customer = seed_customer(&db).await;

    let order = seed_delivered_order(&db, 1, customer.id, None, Utc::now()).await;
    let mut active: order_entity::ActiveModel = order.into();
    active.delivery_employee_id = Set(Some(7));
    active.delivery_employee_email = Set(Some("fatima@douka-km.com".to_string()));
    active.delivery_employee_name = Set(Some("Fatima Abdou".to_string()));
    active.delivery_employee_phone = Set(Some("3311234".to_string()));
    active.assigned_at = Set(Some(Utc::now()));
    active.update(&db).await.expect("pre-assign order");

    // 一个员工都没有也不报错，因为根本不需要指派
    let service = DeliveryService::new(db.clone());
    let assignment = service
        .assign_default_livreur()
        .await
        .expect("no orphans means nothing to do");
    assert!(assignment.livreur.is_none());
    assert!(assignment.orders.is_empty());
}

#[tokio::test]
async fn test_assign_default_livreur_requires_an_active_livreur() {
    let db = setup().await;
    let customer = seed_customer(&db).await;
    seed_employee(&db, "conge@douka-km.com", "Said", "Omar", "livreur", "inactive").await;
    let order = seed_delivered_order(&db, 1, customer.id, None, Utc::now()).await;

    let service = DeliveryService::new(db.clone());
    let err = service
        .assign_default_livreur()
        .await
        .expect_err("an inactive livreur must not be picked");
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(err.to_string().contains("Aucun livreur actif"));

    let order = reload(&db, order.id).await;
    assert!(order.delivery_employee_email.is_none(), "failed run must not mutate orders");
}

#[tokio::test]
async fn test_delivery_report_buckets() {
    let db = setup().await;
    let customer = seed_customer(&db).await;
    let merchant = seed_merchant(&db, "boutique@moroni.km").await;

    let covered = seed_delivered_order(&db, 1, customer.id, None, Utc::now()).await;
    let mut active: order_entity::ActiveModel = covered.into();
    active.delivery_employee_id = Set(Some(7));
    active.delivery_employee_email = Set(Some("fatima@douka-km.com".to_string()));
    active.delivery_employee_name = Set(Some("Fatima Abdou".to_string()));
    active.delivery_employee_phone = Set(Some("3311234".to_string()));
    active.assigned_at = Set(Some(Utc::now()));
    active.update(&db).await.expect("pre-assign order");

    let admin_orphan = seed_delivered_order(&db, 2, customer.id, None, Utc::now()).await;
    let merchant_orphan =
        seed_delivered_order(&db, 3, customer.id, Some(merchant.id), Utc::now()).await;

    let service = DeliveryService::new(db.clone());
    let report = service.delivery_report().await.expect("report");

    assert_eq!(report.total_delivered, 3);
    assert_eq!(report.admin_with_snapshot, 1);
    assert_eq!(report.merchant_with_snapshot, 0);
    assert_eq!(report.admin_without_snapshot, 1);
    assert_eq!(report.merchant_without_snapshot, 1);
    assert_eq!(report.without_snapshot, vec![admin_orphan.id, merchant_orphan.id]);
}

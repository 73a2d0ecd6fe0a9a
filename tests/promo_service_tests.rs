use chrono::{Duration, NaiveTime, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};

use douka_backend::entities::promo_code_entity;
use douka_backend::services::PromoService;

async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None).await.expect("Migrations failed");
    db
}

fn promo(code: &str, discount_type: &str, value: f64) -> promo_code_entity::ActiveModel {
    promo_code_entity::ActiveModel {
        code: Set(code.to_string()),
        discount_type: Set(discount_type.to_string()),
        discount_value: Set(value),
        min_amount: Set(0.0),
        used_count: Set(0),
        user_limit: Set(Some(1)),
        active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_unknown_or_disabled_code_is_invalid() {
    let db = setup().await;
    let service = PromoService::new(db.clone());

    let result = service
        .validate("RIEN", "amina@moroni.km", 5000.0)
        .await
        .expect("validate");
    assert!(!result.valid);
    assert_eq!(result.discount, 0.0);
    assert_eq!(result.message, "Code promo invalide");

    let mut disabled = promo("FERME", "fixed", 1000.0);
    disabled.active = Set(false);
    disabled.insert(&db).await.expect("insert promo");

    let result = service
        .validate("FERME", "amina@moroni.km", 5000.0)
        .await
        .expect("validate");
    assert!(!result.valid);
    assert_eq!(result.message, "Code promo invalide");
}

#[tokio::test]
async fn test_date_window_is_checked_by_day() {
    let db = setup().await;
    let service = PromoService::new(db.clone());

    let mut future = promo("DEMAIN", "fixed", 500.0);
    future.start_date = Set(Some(Utc::now() + Duration::days(3)));
    future.insert(&db).await.expect("insert promo");
    let result = service
        .validate("DEMAIN", "amina@moroni.km", 5000.0)
        .await
        .expect("validate");
    assert_eq!(result.message, "Ce code promo n'est pas encore actif");

    let mut past = promo("FINI", "fixed", 500.0);
    past.end_date = Set(Some(Utc::now() - Duration::days(2)));
    past.insert(&db).await.expect("insert promo");
    let result = service
        .validate("FINI", "amina@moroni.km", 5000.0)
        .await
        .expect("validate");
    assert_eq!(result.message, "Ce code promo a expiré");

    // 截止日当天仍然有效，比较按天不按时刻
    let today_midnight = Utc::now()
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc();
    let mut last_day = promo("DERNIER", "fixed", 500.0);
    last_day.end_date = Set(Some(today_midnight));
    last_day.insert(&db).await.expect("insert promo");
    let result = service
        .validate("DERNIER", "amina@moroni.km", 5000.0)
        .await
        .expect("validate");
    assert!(result.valid, "a code expiring today is still usable: {}", result.message);
}

#[tokio::test]
async fn test_usage_limits() {
    let db = setup().await;
    let service = PromoService::new(db.clone());

    let mut exhausted = promo("EPUISE", "fixed", 500.0);
    exhausted.usage_limit = Set(Some(2));
    exhausted.used_count = Set(2);
    exhausted.insert(&db).await.expect("insert promo");
    let result = service
        .validate("EPUISE", "amina@moroni.km", 5000.0)
        .await
        .expect("validate");
    assert_eq!(
        result.message,
        "Ce code promo a atteint sa limite d'utilisation"
    );

    let mut once_each = promo("UNIQUE", "fixed", 500.0);
    once_each.used_by = Set(Some(r#"{"amina@moroni.km": 1}"#.to_string()));
    once_each.insert(&db).await.expect("insert promo");
    let result = service
        .validate("UNIQUE", "amina@moroni.km", 5000.0)
        .await
        .expect("validate");
    assert_eq!(result.message, "Vous avez déjà utilisé ce code promo");

    // 其他用户不受影响
    let result = service
        .validate("UNIQUE", "said@mutsamudu.km", 5000.0)
        .await
        .expect("validate");
    assert!(result.valid);
}

#[tokio::test]
async fn test_minimum_amount_message_formats_kmf() {
    let db = setup().await;
    let service = PromoService::new(db.clone());

    let mut exigent = promo("GROS", "fixed", 2000.0);
    exigent.min_amount = Set(10000.0);
    exigent.insert(&db).await.expect("insert promo");

    let result = service
        .validate("GROS", "amina@moroni.km", 9999.0)
        .await
        .expect("validate");
    assert_eq!(result.message, "Montant minimum de 10,000 KMF requis");

    let result = service
        .validate("GROS", "amina@moroni.km", 10000.0)
        .await
        .expect("validate");
    assert!(result.valid);
    assert_eq!(result.discount, 2000.0);
}

#[tokio::test]
async fn test_percentage_discount_is_capped() {
    let db = setup().await;
    let service = PromoService::new(db.clone());

    let mut percent = promo("DIX", "percentage", 10.0);
    percent.max_discount = Set(Some(1500.0));
    percent.insert(&db).await.expect("insert promo");

    // 10% de 20000 = 2000，封顶 1500
    let result = service
        .validate("DIX", "amina@moroni.km", 20000.0)
        .await
        .expect("validate");
    assert!(result.valid);
    assert_eq!(result.discount, 1500.0);
    assert_eq!(result.message, "Code promo appliqué! Réduction de 1,500 KMF");

    // 不触顶时按比例
    let result = service
        .validate("DIX", "said@mutsamudu.km", 8000.0)
        .await
        .expect("validate");
    assert_eq!(result.discount, 800.0);
}

#[tokio::test]
async fn test_fixed_discount_never_exceeds_cart_total() {
    let db = setup().await;
    let service = PromoService::new(db.clone());

    promo("CINQ", "fixed", 5000.0)
        .insert(&db)
        .await
        .expect("insert promo");

    let result = service
        .validate("CINQ", "amina@moroni.km", 3000.0)
        .await
        .expect("validate");
    assert!(result.valid);
    assert_eq!(result.discount, 3000.0);
}

#[tokio::test]
async fn test_use_code_increments_counters() {
    let db = setup().await;
    let service = PromoService::new(db.clone());

    let inserted = promo("MORONI", "fixed", 500.0)
        .insert(&db)
        .await
        .expect("insert promo");

    let used = service
        .use_code("MORONI", "amina@moroni.km")
        .await
        .expect("use code");
    assert!(used);

    let reloaded = promo_code_entity::Entity::find_by_id(inserted.id)
        .one(&db)
        .await
        .expect("reload promo")
        .expect("promo exists");
    assert_eq!(reloaded.used_count, 1);
    let used_by: std::collections::BTreeMap<String, i32> =
        serde_json::from_str(reloaded.used_by.as_deref().unwrap_or("{}")).expect("parse used_by");
    assert_eq!(used_by.get("amina@moroni.km"), Some(&1));

    // 默认单用户一次，再校验会被拒绝
    let result = service
        .validate("MORONI", "amina@moroni.km", 5000.0)
        .await
        .expect("validate");
    assert_eq!(result.message, "Vous avez déjà utilisé ce code promo");

    let used = service
        .use_code("INCONNU", "amina@moroni.km")
        .await
        .expect("use unknown code");
    assert!(!used, "unknown code is reported, not an error");
}

use chrono::Utc;
use migration::patch::{
    add_column_if_missing, apply_column_patches, repair_known_columns, ColumnPatch,
};
use migration::{Alias, ColumnDef, Migrator, MigratorTrait, SchemaManager, Table};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};

use douka_backend::entities::{
    cart_entity, cart_item_entity, category_entity, product_entity, subcategory_entity,
    user_entity,
};

async fn fresh_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None).await.expect("Migrations failed");
    db
}

#[tokio::test]
async fn test_migrations_create_full_schema() {
    let db = fresh_db().await;
    let manager = SchemaManager::new(&db);

    for table in [
        "users",
        "merchants",
        "employees",
        "categories",
        "subcategories",
        "products",
        "orders",
        "order_items",
        "carts",
        "cart_items",
        "promo_codes",
        "withdrawal_requests",
        "site_settings",
        "email_verification_tokens",
        "password_reset_tokens",
    ] {
        assert!(
            manager.has_table(table).await.expect("has_table failed"),
            "table {table} missing after migrations"
        );
    }

    // 后补的列也要在全新库里出现
    for column in [
        "stock_reserved",
        "stock_released_at",
        "stock_confirmed_at",
        "delivery_employee_id",
        "delivery_employee_email",
        "delivery_employee_name",
        "delivery_employee_phone",
        "assigned_at",
    ] {
        assert!(
            manager
                .has_column("orders", column)
                .await
                .expect("has_column failed"),
            "orders.{column} missing after migrations"
        );
    }
    assert!(manager.has_column("categories", "updated_at").await.unwrap());
    assert!(manager.has_column("subcategories", "updated_at").await.unwrap());
}

#[tokio::test]
async fn test_migrations_rerun_is_a_noop() {
    let db = fresh_db().await;

    Migrator::up(&db, None)
        .await
        .expect("Second migration run should succeed");

    let pending = Migrator::get_pending_migrations(&db)
        .await
        .expect("Failed to list pending migrations");
    assert!(pending.is_empty(), "no migration should remain pending");
}

#[tokio::test]
async fn test_repair_finds_nothing_to_do_on_current_schema() {
    let db = fresh_db().await;
    let manager = SchemaManager::new(&db);

    let report = repair_known_columns(&manager)
        .await
        .expect("Repair should not fail on a healthy schema");

    assert!(report.is_clean());
    assert!(report.added.is_empty(), "nothing should be added: {:?}", report.added);
    assert_eq!(report.already_present.len(), 10);
}

#[tokio::test]
async fn test_patch_adds_a_missing_column_exactly_once() {
    let db = fresh_db().await;
    let manager = SchemaManager::new(&db);

    manager
        .create_table(
            Table::create()
                .table(Alias::new("legacy_probe"))
                .if_not_exists()
                .col(
                    ColumnDef::new(Alias::new("id"))
                        .integer()
                        .not_null()
                        .primary_key(),
                )
                .to_owned(),
        )
        .await
        .expect("Failed to create probe table");

    let patch = ColumnPatch {
        table: "legacy_probe",
        column: "extra",
        build: || {
            ColumnDef::new(Alias::new("extra"))
                .integer()
                .null()
                .to_owned()
        },
    };

    let added = add_column_if_missing(&manager, &patch)
        .await
        .expect("First patch application failed");
    assert!(added, "column should be reported as added on first run");
    assert!(manager.has_column("legacy_probe", "extra").await.unwrap());

    let added_again = add_column_if_missing(&manager, &patch)
        .await
        .expect("Second patch application failed");
    assert!(!added_again, "second run must leave the schema untouched");
}

#[tokio::test]
async fn test_patch_failures_are_collected_not_fatal() {
    let db = fresh_db().await;
    let manager = SchemaManager::new(&db);

    let patches = vec![
        ColumnPatch {
            table: "orders",
            column: "assigned_at",
            build: || {
                ColumnDef::new(Alias::new("assigned_at"))
                    .timestamp_with_time_zone()
                    .null()
                    .to_owned()
            },
        },
        ColumnPatch {
            table: "table_disparue",
            column: "quoi",
            build: || {
                ColumnDef::new(Alias::new("quoi"))
                    .integer()
                    .null()
                    .to_owned()
            },
        },
    ];

    let report = apply_column_patches(&manager, &patches).await;

    assert_eq!(report.already_present, vec!["orders.assigned_at".to_string()]);
    assert_eq!(report.failed, vec!["table_disparue.quoi".to_string()]);
    assert!(!report.is_clean());
}

// 目录链的实体是纯 schema，没有服务层调用，唯一能暴露
// 实体与迁移不一致的地方就是这条插入链
#[tokio::test]
async fn test_catalog_entities_line_up_with_schema() {
    let db = fresh_db().await;
    let now = Utc::now();

    let user = user_entity::ActiveModel {
        email: Set("amina@moroni.km".to_string()),
        password_hash: Set("x".to_string()),
        first_name: Set("Amina".to_string()),
        last_name: Set("Said".to_string()),
        email_verified: Set(false),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect("insert user");

    let category = category_entity::ActiveModel {
        name: Set("Alimentation".to_string()),
        description: Set(Some("Produits alimentaires".to_string())),
        icon: Set(Some("fa-utensils".to_string())),
        active: Set(true),
        created_by: Set(Some("admin@douka-km.com".to_string())),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect("insert category");

    let subcategory = subcategory_entity::ActiveModel {
        category_id: Set(category.id),
        name: Set("Épices".to_string()),
        active: Set(true),
        created_by: Set(Some("admin@douka-km.com".to_string())),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect("insert subcategory");

    let product = product_entity::ActiveModel {
        name: Set("Vanille de Mohéli".to_string()),
        price: Set(4500.0),
        stock: Set(25),
        category_id: Set(Some(category.id)),
        subcategory_id: Set(Some(subcategory.id)),
        source: Set("admin".to_string()),
        active: Set(true),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect("insert product");

    let cart = cart_entity::ActiveModel {
        user_id: Set(user.id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect("insert cart");

    cart_item_entity::ActiveModel {
        cart_id: Set(cart.id),
        product_id: Set(product.id),
        unique_product_id: Set(Some(format!("{}-nature", product.id))),
        quantity: Set(2),
        modified_price: Set(None),
        selected_options: Set(None),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect("insert cart item");

    let items = cart_item_entity::Entity::find()
        .all(&db)
        .await
        .expect("list cart items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].cart_id, cart.id);
    assert_eq!(items[0].quantity, 2);
}

pub use sea_orm_migration::prelude::*;

pub mod patch;

mod m20250614_000001_initial;
mod m20250621_000001_add_carts;
mod m20250628_000001_add_promo_and_withdrawals;
mod m20250702_000001_add_auth_tokens;
mod m20250710_000001_add_stock_tracking;
mod m20250715_000001_add_delivery_employee_fields;
mod m20250722_000001_add_category_timestamps;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250614_000001_initial::Migration),
            Box::new(m20250621_000001_add_carts::Migration),
            Box::new(m20250628_000001_add_promo_and_withdrawals::Migration),
            Box::new(m20250702_000001_add_auth_tokens::Migration),
            Box::new(m20250710_000001_add_stock_tracking::Migration),
            Box::new(m20250715_000001_add_delivery_employee_fields::Migration),
            Box::new(m20250722_000001_add_category_timestamps::Migration),
        ]
    }
}

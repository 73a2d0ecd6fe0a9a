use crate::patch::{apply_column_patches, delivery_employee_patches, ensure_delivery_indexes};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let report = apply_column_patches(manager, &delivery_employee_patches()).await;
        if !report.is_clean() {
            log::warn!(
                "delivery employee patch skipped columns: {}",
                report.failed.join(", ")
            );
        }
        ensure_delivery_indexes(manager).await?;
        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Ok(())
    }
}

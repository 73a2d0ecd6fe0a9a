use crate::patch::{apply_column_patches, category_timestamp_patches};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let report = apply_column_patches(manager, &category_timestamp_patches()).await;
        if !report.is_clean() {
            log::warn!(
                "category timestamp patch skipped columns: {}",
                report.failed.join(", ")
            );
        }
        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Ok(())
    }
}

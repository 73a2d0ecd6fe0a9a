use crate::patch::{apply_column_patches, stock_tracking_patches};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 旧库可能已被救急脚本补过列，逐列探测，失败的列留给 repair-schema
        let report = apply_column_patches(manager, &stock_tracking_patches()).await;
        if !report.is_clean() {
            log::warn!(
                "stock tracking patch skipped columns: {}",
                report.failed.join(", ")
            );
        }
        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Ok(())
    }
}

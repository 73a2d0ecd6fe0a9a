use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Merchants {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum PromoCodes {
    Table,
    Id,
    Code,
    Description,
    DiscountType,
    DiscountValue,
    MinAmount,
    MaxDiscount,
    UsageLimit,
    UsedCount,
    UserLimit,
    StartDate,
    EndDate,
    Active,
    UsedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum WithdrawalRequests {
    Table,
    Id,
    RequestId,
    MerchantId,
    Amount,
    Method,
    AccountDetails,
    Status,
    Notes,
    AdminNotes,
    Reference,
    RequestedAt,
    ProcessedAt,
}

#[derive(DeriveIden)]
enum SiteSettings {
    Table,
    Id,
    Key,
    Value,
    Description,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PromoCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PromoCodes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PromoCodes::Code)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PromoCodes::Description).text().null())
                    .col(
                        ColumnDef::new(PromoCodes::DiscountType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PromoCodes::DiscountValue).double().not_null())
                    .col(
                        ColumnDef::new(PromoCodes::MinAmount)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(PromoCodes::MaxDiscount).double().null())
                    .col(ColumnDef::new(PromoCodes::UsageLimit).integer().null())
                    .col(
                        ColumnDef::new(PromoCodes::UsedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PromoCodes::UserLimit)
                            .integer()
                            .null()
                            .default(1),
                    )
                    .col(ColumnDef::new(PromoCodes::StartDate).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(PromoCodes::EndDate).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(PromoCodes::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(PromoCodes::UsedBy).text().null())
                    .col(
                        ColumnDef::new(PromoCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WithdrawalRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WithdrawalRequests::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WithdrawalRequests::RequestId)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(WithdrawalRequests::MerchantId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WithdrawalRequests::Amount).double().not_null())
                    .col(
                        ColumnDef::new(WithdrawalRequests::Method)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(WithdrawalRequests::AccountDetails).text().null())
                    .col(
                        ColumnDef::new(WithdrawalRequests::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(WithdrawalRequests::Notes).text().null())
                    .col(ColumnDef::new(WithdrawalRequests::AdminNotes).text().null())
                    .col(
                        ColumnDef::new(WithdrawalRequests::Reference)
                            .string_len(100)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WithdrawalRequests::RequestedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(WithdrawalRequests::ProcessedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_withdrawal_requests_merchant")
                            .from(WithdrawalRequests::Table, WithdrawalRequests::MerchantId)
                            .to(Merchants::Table, Merchants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SiteSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SiteSettings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SiteSettings::Key)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(SiteSettings::Value).text().null())
                    .col(
                        ColumnDef::new(SiteSettings::Description)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SiteSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in ["site_settings", "withdrawal_requests", "promo_codes"] {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

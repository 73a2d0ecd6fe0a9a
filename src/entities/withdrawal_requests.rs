use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "withdrawal_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 形如 WR20250818A1B2C3D4 的对外单号
    pub request_id: String,
    pub merchant_id: i32,
    pub amount: f64,
    pub method: String,
    pub account_details: Option<String>,
    /// pending / approved / processing / completed / rejected / cancelled
    pub status: String,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub reference: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "promo_codes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub code: String,
    pub description: Option<String>,
    /// percentage / fixed
    pub discount_type: String,
    pub discount_value: f64,
    pub min_amount: f64,
    pub max_discount: Option<f64>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    /// 单个用户可使用的次数上限
    pub user_limit: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub active: bool,
    /// JSON 映射：email -> 已使用次数
    pub used_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

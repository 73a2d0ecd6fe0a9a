use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i32,
    pub image_url: Option<String>,
    pub category_id: Option<i32>,
    pub subcategory_id: Option<i32>,
    /// 平台自营商品该字段为空
    pub merchant_id: Option<i32>,
    /// admin / merchant / static
    pub source: String,
    /// 以下三列存 JSON 文本：颜色、尺码与组合价
    pub colors: Option<String>,
    pub sizes: Option<String>,
    pub price_combinations: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 订单明细是下单时刻的商品快照，后续商品改价或下架不影响历史订单
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_id: i32,
    pub product_id: Option<i32>,
    pub product_name: String,
    pub product_price: f64,
    pub quantity: i32,
    pub subtotal: f64,
    pub selected_options: Option<String>,
    pub variant_details: Option<String>,
    pub product_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_number: String,
    pub customer_id: i32,
    pub merchant_id: Option<i32>,
    pub total: f64,
    pub shipping_fee: f64,
    pub discount: f64,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub promo_code_used: Option<String>,
    pub status_history: Option<String>,
    pub stock_reserved: bool,
    pub stock_released_at: Option<DateTime<Utc>>,
    pub stock_confirmed_at: Option<DateTime<Utc>>,
    pub delivery_employee_id: Option<i32>,
    pub delivery_employee_email: Option<String>,
    pub delivery_employee_name: Option<String>,
    pub delivery_employee_phone: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub processing_date: Option<DateTime<Utc>>,
    pub shipping_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

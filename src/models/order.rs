use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

use crate::entities::{employee_entity, order_entity};
use crate::models::order_status::{status_color, status_text};

/// 下单时的商品行，字段即落库快照
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewOrderItem {
    pub product_id: Option<i32>,
    pub product_name: String,
    pub product_price: f64,
    pub quantity: i32,
    pub selected_options: Option<String>,
    pub variant_details: Option<String>,
    pub product_image: Option<String>,
}

impl NewOrderItem {
    pub fn subtotal(&self) -> f64 {
        self.product_price * self.quantity as f64
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewOrder {
    pub customer_id: i32,
    pub merchant_id: Option<i32>,
    pub items: Vec<NewOrderItem>,
    pub shipping_fee: f64,
    pub discount: f64,
    pub payment_method: Option<String>,
    /// JSON 收货地址
    pub shipping_address: Option<String>,
    pub promo_code: Option<String>,
}

/// 状态切换的结果，old == new 表示本次为无操作
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub order: order_entity::Model,
    pub old_status: String,
    pub new_status: String,
}

impl StatusChange {
    pub fn changed(&self) -> bool {
        self.old_status != self.new_status
    }
}

/// 配送员身份快照。四个身份字段加一个时间戳要么全空要么全有，
/// 写入走这里保证不会出现部分填充。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySnapshot {
    pub employee_id: i32,
    pub email: String,
    pub name: String,
    pub phone: String,
}

impl DeliverySnapshot {
    pub fn from_employee(employee: &employee_entity::Model) -> Self {
        DeliverySnapshot {
            employee_id: employee.id,
            email: employee.email.clone(),
            name: employee.full_name(),
            phone: employee.phone.clone().unwrap_or_default(),
        }
    }

    /// 订单行是否已经带有快照（以邮箱字段为准）
    pub fn present_on(order: &order_entity::Model) -> bool {
        order.delivery_employee_email.is_some()
    }

    pub fn apply(&self, order: &mut order_entity::ActiveModel, assigned_at: DateTime<Utc>) {
        order.delivery_employee_id = Set(Some(self.employee_id));
        order.delivery_employee_email = Set(Some(self.email.clone()));
        order.delivery_employee_name = Set(Some(self.name.clone()));
        order.delivery_employee_phone = Set(Some(self.phone.clone()));
        order.assigned_at = Set(Some(assigned_at));
    }
}

/// 诊断列表使用的精简视图
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: i32,
    pub order_number: String,
    pub status: String,
    pub status_text: String,
    pub status_color: String,
    pub total: f64,
    pub customer_name: Option<String>,
    pub merchant_id: Option<i32>,
    pub delivery_employee_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<order_entity::Model> for OrderSummary {
    fn from(m: order_entity::Model) -> Self {
        OrderSummary {
            id: m.id,
            status_text: status_text(&m.status),
            order_number: m.order_number,
            status_color: status_color(&m.status).to_string(),
            status: m.status,
            total: m.total,
            customer_name: m.customer_name,
            merchant_id: m.merchant_id,
            delivery_employee_name: m.delivery_employee_name,
            created_at: m.created_at,
        }
    }
}

/// 用户订单统计：总花费不含已取消订单，
/// 进行中 = pending + processing，已完成 = delivered
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserOrderStats {
    pub total_orders: u64,
    pub total_spent: f64,
    pub pending_orders: u64,
    pub completed_orders: u64,
}

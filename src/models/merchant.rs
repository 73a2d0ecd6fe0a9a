use serde::Serialize;

/// 提现单里占用余额的状态
pub const WITHDRAWAL_PENDING_STATUSES: [&str; 3] = ["pending", "approved", "processing"];
pub const WITHDRAWAL_COMPLETED: &str = "completed";
pub const WITHDRAWAL_STATUSES: [&str; 6] = [
    "pending",
    "approved",
    "processing",
    "completed",
    "rejected",
    "cancelled",
];

/// 商家余额对账单。可用余额 = 已送达且收款完成订单的
/// (total - shipping_fee) 之和，扣除佣金、已完成提现与在途提现，下限为 0。
#[derive(Debug, Clone, Serialize)]
pub struct MerchantBalance {
    pub total_earnings: f64,
    pub commission_rate: f64,
    pub commission_fees: f64,
    pub completed_withdrawals: f64,
    pub pending_withdrawals: f64,
    pub available_balance: f64,
    pub delivered_orders_count: u64,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub merchant_id: i32,
    pub amount: f64,
    pub method: String,
    /// JSON 收款账户信息
    pub account_details: Option<String>,
    pub notes: Option<String>,
}

/// 提现单状态流转的结果
#[derive(Debug, Clone)]
pub struct WithdrawalStatusChange {
    pub withdrawal: crate::entities::withdrawal_request_entity::Model,
    pub old_status: String,
    pub new_status: String,
}

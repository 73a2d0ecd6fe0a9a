//! 配送归属台账
//!
//! 历史订单的配送归属在上线前只存在于交接表格里。回填时把它整理成
//! 「livreur 邮箱 -> 订单归属记录」的映射，由调用方显式传入，
//! 不做任何进程级全局状态。订单行上的快照一旦写入即为权威数据，
//! 台账只在一次性回填里使用。

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entities::order_entity;
use crate::error::AppResult;

/// 订单归属方：merchant_id 为空的是平台自营单
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Admin,
    Merchant,
}

impl OrderType {
    pub fn of(order: &order_entity::Model) -> Self {
        if order.merchant_id.is_none() {
            OrderType::Admin
        } else {
            OrderType::Merchant
        }
    }

    /// 控制台输出用的法语称谓
    pub fn display_fr(&self) -> &'static str {
        match self {
            OrderType::Admin => "Admin",
            OrderType::Merchant => "Marchand",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Admin => write!(f, "admin"),
            OrderType::Merchant => write!(f, "merchant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub order_id: i32,
    pub order_type: OrderType,
    /// 商家订单需要同时核对商家邮箱，防止订单号撞库
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_email: Option<String>,
}

/// livreur 邮箱 -> 该 livreur 历史配送的订单列表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentLedger {
    assignments: BTreeMap<String, Vec<AssignmentRecord>>,
}

impl AssignmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, employee_email: &str, record: AssignmentRecord) {
        self.assignments
            .entry(employee_email.to_string())
            .or_default()
            .push(record);
    }

    pub fn from_json(raw: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// 返回第一个匹配该订单的 livreur 邮箱。匹配条件：订单号与归属方一致，
    /// 商家订单还要求记录的商家邮箱与订单商家一致。命中即返回，不做冲突仲裁。
    pub fn find_for_order(
        &self,
        order_id: i32,
        order_type: OrderType,
        merchant_email: Option<&str>,
    ) -> Option<&str> {
        for (employee_email, records) in &self.assignments {
            for record in records {
                if record.order_id != order_id || record.order_type != order_type {
                    continue;
                }
                if order_type == OrderType::Merchant
                    && record.merchant_email.as_deref() != merchant_email
                {
                    continue;
                }
                return Some(employee_email.as_str());
            }
        }
        None
    }

    pub fn employee_count(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

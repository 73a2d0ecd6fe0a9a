//! 订单状态与状态历史
//!
//! 状态只是字符串标签，任何状态都可以切换到任何状态（与线上行为一致，
//! 不做状态机校验）。历史记录以 JSON 文本存在订单行上，最新在前，
//! 最多保留 20 条。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_CONFIRMED: &str = "confirmed";
pub const STATUS_PROCESSING: &str = "processing";
pub const STATUS_SHIPPED: &str = "shipped";
pub const STATUS_DELIVERED: &str = "delivered";
pub const STATUS_CANCELLED: &str = "cancelled";

/// 主状态字段可取的全部值。refunded 只出现在显示文案里，
/// 没有任何写入路径，所以不在此列。
pub const ORDER_STATUSES: [&str; 6] = [
    STATUS_PENDING,
    STATUS_CONFIRMED,
    STATUS_PROCESSING,
    STATUS_SHIPPED,
    STATUS_DELIVERED,
    STATUS_CANCELLED,
];

pub const PAYMENT_PENDING: &str = "pending";
pub const PAYMENT_COMPLETED: &str = "completed";
pub const PAYMENT_FAILED: &str = "failed";

/// 历史记录条数上限，超出时最旧的被丢弃
pub const STATUS_HISTORY_LIMIT: usize = 20;

const HISTORY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 状态对应的法语展示文案
pub fn status_label(status: &str) -> Option<&'static str> {
    match status {
        STATUS_PENDING | STATUS_PROCESSING => Some("En cours de préparation"),
        STATUS_CONFIRMED => Some("Confirmée"),
        STATUS_SHIPPED => Some("Expédiée"),
        STATUS_DELIVERED => Some("Livrée"),
        STATUS_CANCELLED => Some("Annulée"),
        "refunded" => Some("Remboursée"),
        _ => None,
    }
}

/// 状态对应的 bootstrap 颜色
pub fn status_color(status: &str) -> &'static str {
    match status {
        STATUS_PENDING => "warning",
        STATUS_CONFIRMED | STATUS_SHIPPED => "info",
        STATUS_PROCESSING => "primary",
        STATUS_DELIVERED => "success",
        STATUS_CANCELLED => "danger",
        "refunded" => "secondary",
        _ => "secondary",
    }
}

/// 展示文案，未知状态回退为 Title Case
pub fn status_text(status: &str) -> String {
    status_label(status)
        .map(|l| l.to_string())
        .unwrap_or_else(|| title_case(status))
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: String,
    pub status_text: String,
    /// UTC，格式 %Y-%m-%d %H:%M:%S
    pub date: String,
    pub text: String,
    pub changed_by: String,
}

/// 订单状态历史，按时间倒序（最新在前）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusHistory(Vec<StatusHistoryEntry>);

impl StatusHistory {
    /// 从数据库里的 JSON 文本解析，解析失败一律当作空历史
    pub fn parse(raw: Option<&str>) -> Self {
        let entries = raw
            .and_then(|s| serde_json::from_str::<Vec<StatusHistoryEntry>>(s).ok())
            .unwrap_or_default();
        StatusHistory(entries)
    }

    /// 在头部追加一条记录并截断到上限，返回新条目
    pub fn record(
        &mut self,
        new_status: &str,
        notes: Option<&str>,
        changed_by: Option<&str>,
        at: DateTime<Utc>,
    ) -> &StatusHistoryEntry {
        let label = status_label(new_status);
        let entry = StatusHistoryEntry {
            status: new_status.to_string(),
            status_text: status_text(new_status),
            date: at.format(HISTORY_DATE_FORMAT).to_string(),
            text: notes
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("Commande {}", label.unwrap_or(new_status))),
            changed_by: changed_by.unwrap_or("Système").to_string(),
        };
        self.0.insert(0, entry);
        self.0.truncate(STATUS_HISTORY_LIMIT);
        &self.0[0]
    }

    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    pub fn entries(&self) -> &[StatusHistoryEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

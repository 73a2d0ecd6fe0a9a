use chrono::{Duration, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::QueryFilter;

use crate::entities::order_entity::{Column, Entity as Order};
use crate::error::AppResult;

/// 生成唯一订单号，形如 ORD-2025-0042
///
/// 序号基于当天已有订单数，碰撞时递增重试；100 次仍未找到空位则
/// 退化为时间戳后四位。
pub async fn generate_order_number<C: ConnectionTrait>(db: &C) -> AppResult<String> {
    let now = Utc::now();
    let prefix = now.format("ORD-%Y").to_string();

    let today_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let tomorrow_start = today_start + Duration::days(1);

    const MAX_ATTEMPTS: u64 = 100;
    for attempt in 0..MAX_ATTEMPTS {
        let existing_count = Order::find()
            .filter(Column::CreatedAt.gte(today_start))
            .filter(Column::CreatedAt.lt(tomorrow_start))
            .count(db)
            .await?;

        let number = format!("{}-{:04}", prefix, existing_count + 1 + attempt);

        let taken = Order::find()
            .filter(Column::OrderNumber.eq(&number))
            .count(db)
            .await?;
        if taken == 0 {
            return Ok(number);
        }
    }

    // 兜底：时间戳后四位
    let suffix = Utc::now().timestamp() % 10000;
    Ok(format!("{prefix}-{suffix:04}"))
}

use crate::entities::promo_code_entity as promo_codes;
use crate::error::AppResult;
use crate::models::PromoValidation;
use crate::utils::format_kmf;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use std::collections::BTreeMap;

#[derive(Clone)]
pub struct PromoService {
    pool: DatabaseConnection,
}

impl PromoService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    async fn find_active(&self, code: &str) -> AppResult<Option<promo_codes::Model>> {
        let promo = promo_codes::Entity::find()
            .filter(promo_codes::Column::Code.eq(code))
            .filter(promo_codes::Column::Active.eq(true))
            .one(&self.pool)
            .await?;
        Ok(promo)
    }

    /// 校验促销码。不匹配不算错误，返回 valid=false 和法语提示。
    ///
    /// 依次检查：存在且启用、日期窗口（按天）、全局次数上限、
    /// 单用户次数上限、购物车最低金额；折扣按 percentage/fixed 计算，
    /// 百分比受 max_discount 封顶，最终不超过购物车总额。
    pub async fn validate(
        &self,
        code: &str,
        user_email: &str,
        cart_total: f64,
    ) -> AppResult<PromoValidation> {
        let Some(promo) = self.find_active(code).await? else {
            return Ok(PromoValidation::rejected("Code promo invalide"));
        };

        let today = Utc::now().date_naive();
        if let Some(start) = promo.start_date
            && today < start.date_naive()
        {
            return Ok(PromoValidation::rejected(
                "Ce code promo n'est pas encore actif",
            ));
        }
        if let Some(end) = promo.end_date
            && today > end.date_naive()
        {
            return Ok(PromoValidation::rejected("Ce code promo a expiré"));
        }

        if let Some(limit) = promo.usage_limit
            && promo.used_count >= limit
        {
            return Ok(PromoValidation::rejected(
                "Ce code promo a atteint sa limite d'utilisation",
            ));
        }

        let used_by = parse_used_by(promo.used_by.as_deref());
        let user_usage = used_by.get(user_email).copied().unwrap_or(0);
        if user_usage >= promo.user_limit.unwrap_or(1) {
            return Ok(PromoValidation::rejected(
                "Vous avez déjà utilisé ce code promo",
            ));
        }

        if cart_total < promo.min_amount {
            return Ok(PromoValidation::rejected(format!(
                "Montant minimum de {} KMF requis",
                format_kmf(promo.min_amount)
            )));
        }

        let mut discount = if promo.discount_type == "percentage" {
            let raw = cart_total * (promo.discount_value / 100.0);
            match promo.max_discount {
                Some(cap) => raw.min(cap),
                None => raw,
            }
        } else {
            promo.discount_value
        };
        discount = discount.min(cart_total);

        Ok(PromoValidation::accepted(discount))
    }

    /// 消费一次促销码：全局计数 +1，用户计数 +1
    ///
    /// 码不存在或未启用时返回 false，不报错。
    pub async fn use_code(&self, code: &str, user_email: &str) -> AppResult<bool> {
        let Some(promo) = self.find_active(code).await? else {
            return Ok(false);
        };

        let mut used_by = parse_used_by(promo.used_by.as_deref());
        *used_by.entry(user_email.to_string()).or_insert(0) += 1;
        let used_count = promo.used_count + 1;

        let mut active = promo.into_active_model();
        active.used_count = Set(used_count);
        active.used_by = Set(Some(serde_json::to_string(&used_by)?));
        active.update(&self.pool).await?;
        Ok(true)
    }
}

/// used_by 字段是 email -> 次数 的 JSON 映射，坏数据当作空表
fn parse_used_by(raw: Option<&str>) -> BTreeMap<String, i32> {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

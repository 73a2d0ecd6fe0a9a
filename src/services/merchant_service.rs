use crate::entities::{
    order_entity as orders, withdrawal_request_entity as withdrawals,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::settings_service::SettingsService;
use crate::utils::generate_withdrawal_request_id;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

#[derive(Clone)]
pub struct MerchantService {
    pool: DatabaseConnection,
    settings: SettingsService,
}

impl MerchantService {
    pub fn new(pool: DatabaseConnection) -> Self {
        let settings = SettingsService::new(pool.clone());
        Self { pool, settings }
    }

    /// 按已送达且收款完成的订单计算商家余额
    ///
    /// 毛收入 = sum(total - shipping_fee)，按站点 commission_rate（默认 5%）
    /// 扣佣金，再减去已完成与在途提现，可用余额下限 0。
    pub async fn calculate_balance(&self, merchant_id: i32) -> AppResult<MerchantBalance> {
        let delivered = orders::Entity::find()
            .filter(orders::Column::MerchantId.eq(merchant_id))
            .filter(orders::Column::Status.eq(STATUS_DELIVERED))
            .filter(orders::Column::PaymentStatus.eq(PAYMENT_COMPLETED))
            .all(&self.pool)
            .await?;

        let total_earnings: f64 = delivered
            .iter()
            .map(|order| order.total - order.shipping_fee)
            .sum();

        let commission_rate = self.settings.get_float("commission_rate", 5.0).await?;
        let commission_fees = total_earnings * (commission_rate / 100.0);

        let requests = withdrawals::Entity::find()
            .filter(withdrawals::Column::MerchantId.eq(merchant_id))
            .all(&self.pool)
            .await?;
        let completed_withdrawals: f64 = requests
            .iter()
            .filter(|w| w.status == WITHDRAWAL_COMPLETED)
            .map(|w| w.amount)
            .sum();
        let pending_withdrawals: f64 = requests
            .iter()
            .filter(|w| WITHDRAWAL_PENDING_STATUSES.contains(&w.status.as_str()))
            .map(|w| w.amount)
            .sum();

        let available_balance =
            total_earnings - commission_fees - completed_withdrawals - pending_withdrawals;

        Ok(MerchantBalance {
            total_earnings,
            commission_rate,
            commission_fees,
            completed_withdrawals,
            pending_withdrawals,
            available_balance: available_balance.max(0.0),
            delivered_orders_count: delivered.len() as u64,
        })
    }

    /// 创建提现申请，金额不能超过当前可用余额
    pub async fn create_withdrawal(
        &self,
        payload: NewWithdrawal,
    ) -> AppResult<withdrawals::Model> {
        if payload.amount <= 0.0 {
            return Err(AppError::ValidationError(
                "Le montant du retrait doit être positif".to_string(),
            ));
        }
        let balance = self.calculate_balance(payload.merchant_id).await?;
        if payload.amount > balance.available_balance {
            return Err(AppError::ValidationError(format!(
                "Solde insuffisant: {:.0} KMF disponibles",
                balance.available_balance
            )));
        }

        let now = Utc::now();
        let withdrawal = withdrawals::ActiveModel {
            request_id: Set(generate_withdrawal_request_id(now)),
            merchant_id: Set(payload.merchant_id),
            amount: Set(payload.amount),
            method: Set(payload.method),
            account_details: Set(payload.account_details),
            status: Set("pending".to_string()),
            notes: Set(payload.notes),
            requested_at: Set(now),
            ..Default::default()
        };
        let withdrawal = withdrawal.insert(&self.pool).await?;
        log::info!(
            "Withdrawal {} created for merchant {} ({} KMF)",
            withdrawal.request_id,
            withdrawal.merchant_id,
            withdrawal.amount
        );
        Ok(withdrawal)
    }

    pub async fn list_withdrawals(&self, merchant_id: i32) -> AppResult<Vec<withdrawals::Model>> {
        let list = withdrawals::Entity::find()
            .filter(withdrawals::Column::MerchantId.eq(merchant_id))
            .order_by_desc(withdrawals::Column::RequestedAt)
            .all(&self.pool)
            .await?;
        Ok(list)
    }

    /// 管理端推进提现单状态，顺带记录处理时间和备注
    pub async fn update_withdrawal_status(
        &self,
        request_id: &str,
        new_status: &str,
        admin_notes: Option<&str>,
        reference: Option<&str>,
    ) -> AppResult<WithdrawalStatusChange> {
        if !WITHDRAWAL_STATUSES.contains(&new_status) {
            return Err(AppError::ValidationError(format!(
                "Invalid withdrawal status: {new_status}"
            )));
        }

        let withdrawal = withdrawals::Entity::find()
            .filter(withdrawals::Column::RequestId.eq(request_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Demande de retrait non trouvée".to_string()))?;

        let old_status = withdrawal.status.clone();
        let mut active = withdrawal.into_active_model();
        active.status = Set(new_status.to_string());
        active.processed_at = Set(Some(Utc::now()));
        if let Some(notes) = admin_notes {
            active.admin_notes = Set(Some(notes.to_string()));
        }
        if let Some(reference) = reference {
            active.reference = Set(Some(reference.to_string()));
        }
        let withdrawal = active.update(&self.pool).await?;

        log::info!(
            "Withdrawal {} moved from {} to {}",
            withdrawal.request_id,
            old_status,
            new_status
        );
        Ok(WithdrawalStatusChange {
            withdrawal,
            old_status,
            new_status: new_status.to_string(),
        })
    }
}

use crate::entities::{
    employee_entity as employees, merchant_entity as merchants, order_entity as orders,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, TransactionTrait,
};

/// 台账回填的结果汇总
#[derive(Debug, Clone, Default)]
pub struct BackfillReport {
    pub admin_updated: u32,
    pub merchant_updated: u32,
    /// 已带快照而被跳过的订单数
    pub already_assigned: u32,
    /// 台账里找不到归属记录的订单
    pub unmatched: Vec<i32>,
    /// 台账里有记录但 employees 表里没有对应 livreur 的邮箱
    pub missing_livreurs: Vec<String>,
}

impl BackfillReport {
    pub fn total_updated(&self) -> u32 {
        self.admin_updated + self.merchant_updated
    }
}

/// 默认 livreur 批量指派的结果
#[derive(Debug, Clone)]
pub struct DefaultAssignment {
    /// 没有孤儿订单时为 None
    pub livreur: Option<employees::Model>,
    pub orders: Vec<(i32, OrderType)>,
}

/// 已送达订单的快照覆盖情况
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub total_delivered: u64,
    pub admin_with_snapshot: u64,
    pub merchant_with_snapshot: u64,
    pub admin_without_snapshot: u64,
    pub merchant_without_snapshot: u64,
    pub without_snapshot: Vec<i32>,
}

#[derive(Clone)]
pub struct DeliveryService {
    pool: DatabaseConnection,
}

impl DeliveryService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 用台账回填历史已送达订单的配送快照
    ///
    /// 只处理 status=delivered 且快照为空的订单；台账第一条匹配记录生效。
    /// 商家订单额外核对商家邮箱。整个回填在一个事务里，任何数据库错误
    /// 整体回滚。匹配不上的订单进入报告，不视为失败。
    pub async fn backfill_delivered(
        &self,
        ledger: &AssignmentLedger,
    ) -> AppResult<BackfillReport> {
        let txn = self.pool.begin().await?;
        let mut report = BackfillReport::default();

        let delivered = orders::Entity::find()
            .filter(orders::Column::Status.eq(STATUS_DELIVERED))
            .order_by_asc(orders::Column::Id)
            .all(&txn)
            .await?;

        let now = Utc::now();
        for order in delivered {
            if DeliverySnapshot::present_on(&order) {
                report.already_assigned += 1;
                continue;
            }

            let order_type = OrderType::of(&order);
            let merchant_email = match order.merchant_id {
                Some(merchant_id) => merchants::Entity::find_by_id(merchant_id)
                    .one(&txn)
                    .await?
                    .map(|m| m.email),
                None => None,
            };

            let Some(livreur_email) =
                ledger.find_for_order(order.id, order_type, merchant_email.as_deref())
            else {
                report.unmatched.push(order.id);
                continue;
            };

            let employee = employees::Entity::find()
                .filter(employees::Column::Email.eq(livreur_email))
                .filter(employees::Column::Role.eq(ROLE_LIVREUR))
                .one(&txn)
                .await?;
            let Some(employee) = employee else {
                log::warn!("Livreur non trouvé: {livreur_email}");
                report.missing_livreurs.push(livreur_email.to_string());
                report.unmatched.push(order.id);
                continue;
            };

            let order_id = order.id;
            let mut active = order.into_active_model();
            DeliverySnapshot::from_employee(&employee).apply(&mut active, now);
            active.update(&txn).await?;

            match order_type {
                OrderType::Admin => report.admin_updated += 1,
                OrderType::Merchant => report.merchant_updated += 1,
            }
            log::info!(
                "Order {} ({}) assigned to livreur {}",
                order_id,
                order_type,
                employee.email
            );
        }

        txn.commit().await?;
        Ok(report)
    }

    /// 给所有孤儿订单（已送达但无快照）指派第一个在职 livreur
    ///
    /// 有孤儿订单却没有可用 livreur 时直接报错，不落任何修改。
    /// assigned_at 取订单自身的创建时间，尽量贴近真实配送时刻。
    pub async fn assign_default_livreur(&self) -> AppResult<DefaultAssignment> {
        let txn = self.pool.begin().await?;

        let orphans = orders::Entity::find()
            .filter(orders::Column::Status.eq(STATUS_DELIVERED))
            .filter(orders::Column::DeliveryEmployeeEmail.is_null())
            .order_by_asc(orders::Column::Id)
            .all(&txn)
            .await?;

        if orphans.is_empty() {
            txn.commit().await?;
            return Ok(DefaultAssignment {
                livreur: None,
                orders: Vec::new(),
            });
        }

        let livreur = employees::Entity::find()
            .filter(employees::Column::Role.eq(ROLE_LIVREUR))
            .filter(employees::Column::Status.eq(EMPLOYEE_ACTIVE))
            .order_by_asc(employees::Column::Id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Aucun livreur actif trouvé".to_string()))?;

        let snapshot = DeliverySnapshot::from_employee(&livreur);
        let mut assigned = Vec::with_capacity(orphans.len());
        for order in orphans {
            let order_id = order.id;
            let order_type = OrderType::of(&order);
            let created_at = order.created_at;

            let mut active = order.into_active_model();
            snapshot.apply(&mut active, created_at);
            active.update(&txn).await?;

            assigned.push((order_id, order_type));
        }

        txn.commit().await?;
        log::info!(
            "Assigned default livreur {} to {} orphaned orders",
            livreur.email,
            assigned.len()
        );
        Ok(DefaultAssignment {
            livreur: Some(livreur),
            orders: assigned,
        })
    }

    /// 已送达订单的快照覆盖报告
    pub async fn delivery_report(&self) -> AppResult<DeliveryReport> {
        let delivered = orders::Entity::find()
            .filter(orders::Column::Status.eq(STATUS_DELIVERED))
            .order_by_asc(orders::Column::Id)
            .all(&self.pool)
            .await?;

        let mut report = DeliveryReport {
            total_delivered: delivered.len() as u64,
            ..Default::default()
        };
        for order in &delivered {
            let has_snapshot = DeliverySnapshot::present_on(order);
            match (OrderType::of(order), has_snapshot) {
                (OrderType::Admin, true) => report.admin_with_snapshot += 1,
                (OrderType::Merchant, true) => report.merchant_with_snapshot += 1,
                (OrderType::Admin, false) => report.admin_without_snapshot += 1,
                (OrderType::Merchant, false) => report.merchant_without_snapshot += 1,
            }
            if !has_snapshot {
                report.without_snapshot.push(order.id);
            }
        }
        Ok(report)
    }
}

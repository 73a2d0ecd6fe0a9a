use crate::entities::{
    employee_entity as employees, order_entity as orders, order_item_entity as order_items,
    product_entity as products, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::generate_order_number;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct OrderService {
    pool: DatabaseConnection,
}

impl OrderService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 创建订单：生成订单号、落商品快照、预占库存
    ///
    /// total = 商品小计 + 运费 - 折扣。客户的姓名、邮箱、电话此刻
    /// 被复制到订单行上，之后客户改资料不影响历史订单。
    pub async fn create_order(&self, request: NewOrder) -> AppResult<orders::Model> {
        if request.items.is_empty() {
            return Err(AppError::ValidationError(
                "La commande ne contient aucun article".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;

        let customer = users::Entity::find_by_id(request.customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

        let order_number = generate_order_number(&txn).await?;
        let subtotal: f64 = request.items.iter().map(|i| i.subtotal()).sum();
        let total = subtotal + request.shipping_fee - request.discount;
        let now = Utc::now();

        let order = orders::ActiveModel {
            order_number: Set(order_number),
            customer_id: Set(request.customer_id),
            merchant_id: Set(request.merchant_id),
            total: Set(total),
            shipping_fee: Set(request.shipping_fee),
            discount: Set(request.discount),
            status: Set(STATUS_PENDING.to_string()),
            payment_status: Set(PAYMENT_PENDING.to_string()),
            payment_method: Set(request.payment_method.clone()),
            shipping_address: Set(request.shipping_address.clone()),
            customer_name: Set(Some(customer.full_name())),
            customer_email: Set(Some(customer.email.clone())),
            customer_phone: Set(customer.phone.clone()),
            promo_code_used: Set(request.promo_code.clone()),
            stock_reserved: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let mut order = order.insert(&txn).await?;

        for item in &request.items {
            order_items::ActiveModel {
                order_id: Set(order.id),
                product_id: Set(item.product_id),
                product_name: Set(item.product_name.clone()),
                product_price: Set(item.product_price),
                quantity: Set(item.quantity),
                subtotal: Set(item.subtotal()),
                selected_options: Set(item.selected_options.clone()),
                variant_details: Set(item.variant_details.clone()),
                product_image: Set(item.product_image.clone()),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        // 预占库存：扣减在库商品的数量。快照商品（product_id 为空）跳过
        let mut reserved = false;
        for item in &request.items {
            let Some(product_id) = item.product_id else {
                continue;
            };
            if let Some(product) = products::Entity::find_by_id(product_id).one(&txn).await? {
                let remaining = (product.stock - item.quantity).max(0);
                let mut active = product.into_active_model();
                active.stock = Set(remaining);
                active.update(&txn).await?;
                reserved = true;
            }
        }
        if reserved {
            let mut active = order.into_active_model();
            active.stock_reserved = Set(true);
            order = active.update(&txn).await?;
        }

        txn.commit().await?;
        log::info!(
            "Order {} created for customer {} (total {:.0} KMF)",
            order.order_number,
            order.customer_id,
            order.total
        );
        Ok(order)
    }

    /// 切换订单状态
    ///
    /// 不做状态机校验：任何状态都可以切到任何状态。目标状态与当前一致时
    /// 直接返回，不写历史。里程碑日期只在尚未设置时落下。进入 delivered
    /// 时若订单还没有配送快照，则从调用方给的员工上复制身份字段，
    /// 同时把收款状态置为 completed。
    pub async fn update_status(
        &self,
        order_id: i32,
        new_status: &str,
        notes: Option<&str>,
        changed_by: Option<&str>,
        assigned_employee: Option<&employees::Model>,
    ) -> AppResult<StatusChange> {
        if !ORDER_STATUSES.contains(&new_status) {
            return Err(AppError::ValidationError(format!(
                "Invalid order status: {new_status}"
            )));
        }

        let txn = self.pool.begin().await?;

        let order = orders::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        let old_status = order.status.clone();

        if old_status == new_status {
            txn.commit().await?;
            return Ok(StatusChange {
                order,
                old_status: new_status.to_string(),
                new_status: new_status.to_string(),
            });
        }

        let now = Utc::now();
        let was_reserved = order.stock_reserved;
        let snapshot_missing = !DeliverySnapshot::present_on(&order);

        let mut history = StatusHistory::parse(order.status_history.as_deref());
        history.record(new_status, notes, changed_by, now);

        let order_number = order.order_number.clone();
        let mut active = order.clone().into_active_model();
        active.status = Set(new_status.to_string());
        active.updated_at = Set(now);
        active.status_history = Set(Some(history.to_json()?));

        match new_status {
            STATUS_PROCESSING => {
                if order.processing_date.is_none() {
                    active.processing_date = Set(Some(now));
                }
            }
            STATUS_SHIPPED => {
                if order.shipping_date.is_none() {
                    active.shipping_date = Set(Some(now));
                }
            }
            STATUS_DELIVERED => {
                if order.delivery_date.is_none() {
                    active.delivery_date = Set(Some(now));
                }
                active.payment_status = Set(PAYMENT_COMPLETED.to_string());
                if was_reserved && order.stock_confirmed_at.is_none() {
                    active.stock_confirmed_at = Set(Some(now));
                }
                if snapshot_missing
                    && let Some(employee) = assigned_employee
                {
                    DeliverySnapshot::from_employee(employee).apply(&mut active, now);
                }
            }
            STATUS_CANCELLED => {
                if order.cancelled_at.is_none() {
                    active.cancelled_at = Set(Some(now));
                }
            }
            _ => {}
        }

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        // 取消后的库存回补在状态落库之后单独执行，失败只记日志
        let final_order = if new_status == STATUS_CANCELLED && was_reserved {
            match self.release_stock(order_id).await {
                Ok(o) => o,
                Err(e) => {
                    log::warn!("Stock release failed for order {order_id}: {e}");
                    updated
                }
            }
        } else {
            updated
        };

        log::info!("Order {order_number} status: {old_status} -> {new_status}");
        Ok(StatusChange {
            order: final_order,
            old_status,
            new_status: new_status.to_string(),
        })
    }

    /// 回补库存并记录回补时间，返回最新订单行
    async fn release_stock(&self, order_id: i32) -> AppResult<orders::Model> {
        let txn = self.pool.begin().await?;

        let order = orders::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        if !order.stock_reserved || order.stock_released_at.is_some() {
            txn.commit().await?;
            return Ok(order);
        }

        let items = order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(order_id))
            .all(&txn)
            .await?;
        for item in items {
            let Some(product_id) = item.product_id else {
                continue;
            };
            if let Some(product) = products::Entity::find_by_id(product_id).one(&txn).await? {
                let restored = product.stock + item.quantity;
                let mut active = product.into_active_model();
                active.stock = Set(restored);
                active.update(&txn).await?;
            }
        }

        let mut active = order.into_active_model();
        active.stock_reserved = Set(false);
        active.stock_released_at = Set(Some(Utc::now()));
        let order = active.update(&txn).await?;

        txn.commit().await?;
        log::info!("Stock released for order {order_id}");
        Ok(order)
    }

    /// 顾客自助取消
    ///
    /// 业务规则与线上一致：只有「处理中 + 货到付款」的订单能自助取消，
    /// 其余状态各自返回一条给顾客看的法语提示。取消不追加状态历史。
    pub async fn cancel_user_order(
        &self,
        user_email: &str,
        order_id: i32,
    ) -> AppResult<orders::Model> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(user_email))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Utilisateur non trouvé".to_string()))?;

        let order = orders::Entity::find()
            .filter(orders::Column::Id.eq(order_id))
            .filter(orders::Column::CustomerId.eq(user.id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Commande non trouvée".to_string()))?;

        let payment_method = order.payment_method.clone().unwrap_or_default();
        let cash_on_delivery = {
            let pm = payment_method.to_lowercase();
            pm.contains("paiement à la livraison") || pm.contains("cash")
        };

        if !(order.status == STATUS_PROCESSING && cash_on_delivery) {
            let message = match order.status.as_str() {
                STATUS_SHIPPED => {
                    "Cette commande ne peut plus être annulée car elle est déjà expédiée"
                        .to_string()
                }
                STATUS_DELIVERED => {
                    "Cette commande ne peut plus être annulée car elle est déjà livrée".to_string()
                }
                STATUS_CANCELLED => "Cette commande est déjà annulée".to_string(),
                STATUS_PENDING => {
                    "Cette commande est en attente de confirmation et ne peut pas être annulée"
                        .to_string()
                }
                STATUS_CONFIRMED => {
                    "Cette commande confirmée ne peut pas être annulée".to_string()
                }
                STATUS_PROCESSING => format!(
                    "Cette commande ne peut pas être annulée car vous avez choisi le paiement \
                     par {payment_method}. Veuillez contacter le service client."
                ),
                other => {
                    format!("Cette commande ne peut plus être annulée (statut: {other})")
                }
            };
            return Err(AppError::ValidationError(message));
        }

        let was_reserved = order.stock_reserved;
        let now = Utc::now();
        let mut active = order.into_active_model();
        active.status = Set(STATUS_CANCELLED.to_string());
        active.cancelled_at = Set(Some(now));
        active.updated_at = Set(now);
        let updated = active.update(&self.pool).await?;

        let final_order = if was_reserved {
            match self.release_stock(order_id).await {
                Ok(o) => o,
                Err(e) => {
                    log::warn!("Stock release failed for order {order_id}: {e}");
                    updated
                }
            }
        } else {
            updated
        };

        log::info!("Order {} cancelled by customer {}", order_id, user_email);
        Ok(final_order)
    }

    /// 获取单个订单
    pub async fn get_order(&self, order_id: i32) -> AppResult<orders::Model> {
        orders::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
    }

    /// 按客户分页列出订单（最新在前）
    pub async fn list_for_customer(
        &self,
        customer_id: i32,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<OrderSummary>> {
        let offset = params.get_offset();
        let limit = params.get_limit();

        #[derive(Debug, sea_orm::FromQueryResult)]
        struct CountRow {
            count: i64,
        }
        let total = orders::Entity::find()
            .filter(orders::Column::CustomerId.eq(customer_id))
            .select_only()
            .column_as(Expr::val(1).count(), "count")
            .into_model::<CountRow>()
            .one(&self.pool)
            .await?
            .map(|r| r.count)
            .unwrap_or(0);

        let rows = orders::Entity::find()
            .filter(orders::Column::CustomerId.eq(customer_id))
            .order_by_desc(orders::Column::CreatedAt)
            .offset(offset as u64)
            .limit(limit as u64)
            .all(&self.pool)
            .await?;

        let data = rows.into_iter().map(OrderSummary::from).collect();
        Ok(PaginatedResponse::new(
            data,
            params.page.unwrap_or(1),
            limit,
            total,
        ))
    }

    /// 用户订单统计
    pub async fn get_user_order_stats(&self, customer_id: i32) -> AppResult<UserOrderStats> {
        let rows = orders::Entity::find()
            .filter(orders::Column::CustomerId.eq(customer_id))
            .all(&self.pool)
            .await?;

        let mut stats = UserOrderStats::default();
        for order in &rows {
            stats.total_orders += 1;
            if order.status != STATUS_CANCELLED {
                stats.total_spent += order.total;
            }
            match order.status.as_str() {
                STATUS_PENDING | STATUS_PROCESSING => stats.pending_orders += 1,
                STATUS_DELIVERED => stats.completed_orders += 1,
                _ => {}
            }
        }
        Ok(stats)
    }

    /// 平台自营订单（merchant_id 为空），最新在前
    pub async fn list_admin_orders(&self) -> AppResult<Vec<orders::Model>> {
        Ok(orders::Entity::find()
            .filter(orders::Column::MerchantId.is_null())
            .order_by_desc(orders::Column::CreatedAt)
            .all(&self.pool)
            .await?)
    }

    /// 自营配送队列：处理中与已发货的订单
    pub async fn admin_delivery_queue(&self) -> AppResult<Vec<orders::Model>> {
        Ok(orders::Entity::find()
            .filter(orders::Column::MerchantId.is_null())
            .filter(
                orders::Column::Status.is_in([STATUS_PROCESSING, STATUS_SHIPPED]),
            )
            .order_by_desc(orders::Column::CreatedAt)
            .all(&self.pool)
            .await?)
    }

    /// 自营订单营收合计（不含已取消）
    pub async fn admin_orders_total(&self) -> AppResult<f64> {
        let rows = orders::Entity::find()
            .filter(orders::Column::MerchantId.is_null())
            .filter(orders::Column::Status.ne(STATUS_CANCELLED))
            .all(&self.pool)
            .await?;
        Ok(rows.iter().map(|o| o.total).sum())
    }

    /// 诊断用：最近 N 个订单的精简视图
    pub async fn list_recent(&self, limit: u64) -> AppResult<Vec<OrderSummary>> {
        let rows = orders::Entity::find()
            .order_by_desc(orders::Column::CreatedAt)
            .limit(limit)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }
}

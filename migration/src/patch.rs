use sea_orm_migration::prelude::*;

/// 一条待补的列定义。build 每次调用都重新构造 ColumnDef，
/// 这样同一份补丁清单可以在迁移和 repair 命令里重复使用。
pub struct ColumnPatch {
    pub table: &'static str,
    pub column: &'static str,
    pub build: fn() -> ColumnDef,
}

/// 补列结果汇总。单列失败只记入 failed，不中断其余列。
#[derive(Debug, Default, Clone)]
pub struct PatchReport {
    pub added: Vec<String>,
    pub already_present: Vec<String>,
    pub failed: Vec<String>,
}

impl PatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn merge(&mut self, other: PatchReport) {
        self.added.extend(other.added);
        self.already_present.extend(other.already_present);
        self.failed.extend(other.failed);
    }
}

/// 列不存在时补上，返回是否真的动了表结构
pub async fn add_column_if_missing(
    manager: &SchemaManager<'_>,
    patch: &ColumnPatch,
) -> Result<bool, DbErr> {
    if manager.has_column(patch.table, patch.column).await? {
        return Ok(false);
    }
    let mut def = (patch.build)();
    manager
        .alter_table(
            Table::alter()
                .table(Alias::new(patch.table))
                .add_column(&mut def)
                .to_owned(),
        )
        .await?;
    Ok(true)
}

/// 按清单逐列补齐，逐列容错
pub async fn apply_column_patches(
    manager: &SchemaManager<'_>,
    patches: &[ColumnPatch],
) -> PatchReport {
    let mut report = PatchReport::default();
    for patch in patches {
        let label = format!("{}.{}", patch.table, patch.column);
        match add_column_if_missing(manager, patch).await {
            Ok(true) => {
                log::info!("Added column {label}");
                report.added.push(label);
            }
            Ok(false) => report.already_present.push(label),
            Err(err) => {
                log::warn!("Could not add column {label}: {err}");
                report.failed.push(label);
            }
        }
    }
    report
}

/// 订单库存跟踪列（历史库补列清单）
pub fn stock_tracking_patches() -> Vec<ColumnPatch> {
    vec![
        ColumnPatch {
            table: "orders",
            column: "stock_reserved",
            build: || {
                ColumnDef::new(Alias::new("stock_reserved"))
                    .boolean()
                    .not_null()
                    .default(false)
                    .to_owned()
            },
        },
        ColumnPatch {
            table: "orders",
            column: "stock_released_at",
            build: || {
                ColumnDef::new(Alias::new("stock_released_at"))
                    .timestamp_with_time_zone()
                    .null()
                    .to_owned()
            },
        },
        ColumnPatch {
            table: "orders",
            column: "stock_confirmed_at",
            build: || {
                ColumnDef::new(Alias::new("stock_confirmed_at"))
                    .timestamp_with_time_zone()
                    .null()
                    .to_owned()
            },
        },
    ]
}

/// 订单配送快照列（历史库补列清单）
pub fn delivery_employee_patches() -> Vec<ColumnPatch> {
    vec![
        ColumnPatch {
            table: "orders",
            column: "delivery_employee_id",
            build: || {
                ColumnDef::new(Alias::new("delivery_employee_id"))
                    .integer()
                    .null()
                    .to_owned()
            },
        },
        ColumnPatch {
            table: "orders",
            column: "delivery_employee_email",
            build: || {
                ColumnDef::new(Alias::new("delivery_employee_email"))
                    .string_len(120)
                    .null()
                    .to_owned()
            },
        },
        ColumnPatch {
            table: "orders",
            column: "delivery_employee_name",
            build: || {
                ColumnDef::new(Alias::new("delivery_employee_name"))
                    .string_len(200)
                    .null()
                    .to_owned()
            },
        },
        ColumnPatch {
            table: "orders",
            column: "delivery_employee_phone",
            build: || {
                ColumnDef::new(Alias::new("delivery_employee_phone"))
                    .string_len(20)
                    .null()
                    .to_owned()
            },
        },
        ColumnPatch {
            table: "orders",
            column: "assigned_at",
            build: || {
                ColumnDef::new(Alias::new("assigned_at"))
                    .timestamp_with_time_zone()
                    .null()
                    .to_owned()
            },
        },
    ]
}

/// 分类表的 updated_at 列（历史库补列清单）
pub fn category_timestamp_patches() -> Vec<ColumnPatch> {
    vec![
        ColumnPatch {
            table: "categories",
            column: "updated_at",
            build: || {
                ColumnDef::new(Alias::new("updated_at"))
                    .timestamp_with_time_zone()
                    .null()
                    .to_owned()
            },
        },
        ColumnPatch {
            table: "subcategories",
            column: "updated_at",
            build: || {
                ColumnDef::new(Alias::new("updated_at"))
                    .timestamp_with_time_zone()
                    .null()
                    .to_owned()
            },
        },
    ]
}

/// 配送列上的两个查询索引
pub async fn ensure_delivery_indexes(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name("idx_orders_delivery_employee")
                .table(Alias::new("orders"))
                .col(Alias::new("delivery_employee_id"))
                .to_owned(),
        )
        .await?;
    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name("idx_orders_assigned_at")
                .table(Alias::new("orders"))
                .col(Alias::new("assigned_at"))
                .to_owned(),
        )
        .await?;
    Ok(())
}

/// 把所有历史补列清单重放一遍，修复跳过迁移的旧库
pub async fn repair_known_columns(manager: &SchemaManager<'_>) -> Result<PatchReport, DbErr> {
    let mut report = PatchReport::default();
    report.merge(apply_column_patches(manager, &stock_tracking_patches()).await);
    report.merge(apply_column_patches(manager, &delivery_employee_patches()).await);
    report.merge(apply_column_patches(manager, &category_timestamp_patches()).await);
    ensure_delivery_indexes(manager).await?;
    Ok(report)
}

use crate::entities::employee_entity as employees;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{hash_password, validate_email, validate_password, verify_password};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct EmployeeService {
    pool: DatabaseConnection,
}

impl EmployeeService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 创建员工账号
    pub async fn create_employee(&self, payload: NewEmployee) -> AppResult<employees::Model> {
        validate_email(&payload.email)?;
        validate_password(&payload.password)?;
        if !EMPLOYEE_ROLES.contains(&payload.role.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Rôle invalide: {}",
                payload.role
            )));
        }

        let existing = employees::Entity::find()
            .filter(employees::Column::Email.eq(&payload.email))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError(
                "Un employé avec cet email existe déjà".to_string(),
            ));
        }

        let permissions = if payload.permissions.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&payload.permissions)?)
        };

        let employee = employees::ActiveModel {
            email: Set(payload.email),
            password_hash: Set(hash_password(&payload.password)?),
            first_name: Set(payload.first_name),
            last_name: Set(payload.last_name),
            phone: Set(payload.phone),
            role: Set(payload.role),
            permissions: Set(permissions),
            status: Set(EMPLOYEE_ACTIVE.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let employee = employee.insert(&self.pool).await?;
        log::info!("Employee created: {} ({})", employee.email, employee.role);
        Ok(employee)
    }

    /// 员工登录校验，成功后刷新 last_login
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<employees::Model> {
        let employee = employees::Entity::find()
            .filter(employees::Column::Email.eq(email))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Employé non trouvé".to_string()))?;

        if !verify_password(password, &employee.password_hash)? {
            return Err(AppError::ValidationError(
                "Email ou mot de passe incorrect".to_string(),
            ));
        }
        if employee.status != EMPLOYEE_ACTIVE {
            return Err(AppError::ValidationError(
                "Ce compte est désactivé".to_string(),
            ));
        }

        let mut active = employee.into_active_model();
        active.last_login = Set(Some(Utc::now()));
        let employee = active.update(&self.pool).await?;
        Ok(employee)
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<employees::Model>> {
        let employee = employees::Entity::find()
            .filter(employees::Column::Email.eq(email))
            .one(&self.pool)
            .await?;
        Ok(employee)
    }

    pub async fn list_employees(&self) -> AppResult<Vec<employees::Model>> {
        let list = employees::Entity::find()
            .order_by_asc(employees::Column::CreatedAt)
            .all(&self.pool)
            .await?;
        Ok(list)
    }

    pub async fn find_livreurs(&self) -> AppResult<Vec<employees::Model>> {
        let list = employees::Entity::find()
            .filter(employees::Column::Role.eq(ROLE_LIVREUR))
            .order_by_asc(employees::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list)
    }

    /// 把邮箱里带 douka 的 manager 规整成 admin，返回被修正的账号
    ///
    /// 历史数据里一部分内部管理员在导入时拿到了 manager 角色。
    pub async fn fix_manager_roles(&self) -> AppResult<Vec<employees::Model>> {
        let txn = self.pool.begin().await?;

        let stale = employees::Entity::find()
            .filter(employees::Column::Role.eq(ROLE_MANAGER))
            .filter(employees::Column::Email.contains("douka"))
            .order_by_asc(employees::Column::Id)
            .all(&txn)
            .await?;

        let mut updated = Vec::with_capacity(stale.len());
        for employee in stale {
            let mut active = employee.into_active_model();
            active.role = Set(ROLE_ADMIN.to_string());
            active.updated_at = Set(Some(Utc::now()));
            let employee = active.update(&txn).await?;
            log::info!("Employee {} role changed to admin", employee.email);
            updated.push(employee);
        }

        txn.commit().await?;
        Ok(updated)
    }
}

use crate::entities::{
    email_verification_token_entity as verification_tokens, employee_entity as employees,
    merchant_entity as merchants, password_reset_token_entity as reset_tokens,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::external::Mailer;
use crate::models::NewUser;
use crate::utils::{generate_token, hash_password, validate_email, validate_password};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};

/// 密码重置支持的账号类别
pub const RESET_USER_TYPES: [&str; 3] = ["user", "merchant", "admin"];

const VERIFICATION_TOKEN_HOURS: i64 = 24;
const RESET_TOKEN_HOURS: i64 = 1;

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 注册顾客账号，邮箱默认未验证
    pub async fn create_user(&self, payload: NewUser) -> AppResult<users::Model> {
        validate_email(&payload.email)?;
        validate_password(&payload.password)?;

        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(&payload.email))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError(
                "Un compte avec cet email existe déjà".to_string(),
            ));
        }

        let user = users::ActiveModel {
            email: Set(payload.email),
            password_hash: Set(hash_password(&payload.password)?),
            first_name: Set(payload.first_name),
            last_name: Set(payload.last_name),
            phone: Set(payload.phone),
            address: Set(payload.address),
            city: Set(payload.city),
            country: Set(payload.country),
            email_verified: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let user = user.insert(&self.pool).await?;
        log::info!("User created: {}", user.email);
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.pool)
            .await?;
        Ok(user)
    }

    /// 给用户签发 24 小时有效的邮箱验证令牌
    pub async fn issue_verification_token(
        &self,
        email: &str,
    ) -> AppResult<verification_tokens::Model> {
        let user = self.find_by_email(email).await?;
        if user.is_none() {
            return Err(AppError::NotFound("Utilisateur non trouvé".to_string()));
        }

        let now = Utc::now();
        let token = verification_tokens::ActiveModel {
            email: Set(email.to_string()),
            token: Set(generate_token()),
            expires_at: Set(now + Duration::hours(VERIFICATION_TOKEN_HOURS)),
            used: Set(false),
            created_at: Set(now),
            ..Default::default()
        };
        let token = token.insert(&self.pool).await?;
        Ok(token)
    }

    /// 签发验证令牌并寄出验证邮件，返回邮件是否发送成功
    pub async fn send_verification_email(&self, email: &str, mailer: &Mailer) -> AppResult<bool> {
        let token = self.issue_verification_token(email).await?;
        Ok(mailer.send_verification_email(email, &token.token))
    }

    /// 用令牌完成邮箱验证：单次有效，过期拒绝
    pub async fn confirm_email(&self, token_value: &str) -> AppResult<users::Model> {
        let token = verification_tokens::Entity::find()
            .filter(verification_tokens::Column::Token.eq(token_value))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Lien de vérification invalide".to_string()))?;

        if token.used {
            return Err(AppError::ValidationError(
                "Ce lien de vérification a déjà été utilisé".to_string(),
            ));
        }
        if token.expires_at < Utc::now() {
            return Err(AppError::ValidationError(
                "Ce lien de vérification a expiré".to_string(),
            ));
        }

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(&token.email))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Utilisateur non trouvé".to_string()))?;

        let mut token_active = token.into_active_model();
        token_active.used = Set(true);
        token_active.update(&self.pool).await?;

        let mut user_active = user.into_active_model();
        user_active.email_verified = Set(true);
        user_active.updated_at = Set(Some(Utc::now()));
        let user = user_active.update(&self.pool).await?;

        log::info!("Email verified for {}", user.email);
        Ok(user)
    }

    /// 给指定类别的账号签发 1 小时有效的密码重置令牌
    pub async fn issue_password_reset_token(
        &self,
        email: &str,
        user_type: &str,
    ) -> AppResult<reset_tokens::Model> {
        if !RESET_USER_TYPES.contains(&user_type) {
            return Err(AppError::ValidationError(format!(
                "Invalid reset user type: {user_type}"
            )));
        }
        if !self.account_exists(email, user_type).await? {
            return Err(AppError::NotFound("Compte non trouvé".to_string()));
        }

        let now = Utc::now();
        let token = reset_tokens::ActiveModel {
            email: Set(email.to_string()),
            token: Set(generate_token()),
            user_type: Set(user_type.to_string()),
            expires_at: Set(now + Duration::hours(RESET_TOKEN_HOURS)),
            used: Set(false),
            created_at: Set(now),
            ..Default::default()
        };
        let token = token.insert(&self.pool).await?;
        Ok(token)
    }

    /// 签发重置令牌并寄出邮件，返回邮件是否发送成功
    pub async fn send_password_reset_email(
        &self,
        email: &str,
        user_type: &str,
        mailer: &Mailer,
    ) -> AppResult<bool> {
        let token = self.issue_password_reset_token(email, user_type).await?;
        Ok(mailer.send_password_reset_email(email, &token.token, user_type))
    }

    /// 用重置令牌修改密码，令牌单次有效
    pub async fn reset_password(&self, token_value: &str, new_password: &str) -> AppResult<()> {
        let token = reset_tokens::Entity::find()
            .filter(reset_tokens::Column::Token.eq(token_value))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Lien de réinitialisation invalide".to_string()))?;

        if token.used {
            return Err(AppError::ValidationError(
                "Ce lien de réinitialisation a déjà été utilisé".to_string(),
            ));
        }
        if token.expires_at < Utc::now() {
            return Err(AppError::ValidationError(
                "Ce lien de réinitialisation a expiré".to_string(),
            ));
        }

        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;
        self.apply_new_password(&token.email, &token.user_type, password_hash)
            .await?;

        let email = token.email.clone();
        let mut token_active = token.into_active_model();
        token_active.used = Set(true);
        token_active.update(&self.pool).await?;

        log::info!("Password reset for {email}");
        Ok(())
    }

    async fn account_exists(&self, email: &str, user_type: &str) -> AppResult<bool> {
        let found = match user_type {
            "merchant" => merchants::Entity::find()
                .filter(merchants::Column::Email.eq(email))
                .one(&self.pool)
                .await?
                .is_some(),
            "admin" => employees::Entity::find()
                .filter(employees::Column::Email.eq(email))
                .one(&self.pool)
                .await?
                .is_some(),
            _ => users::Entity::find()
                .filter(users::Column::Email.eq(email))
                .one(&self.pool)
                .await?
                .is_some(),
        };
        Ok(found)
    }

    async fn apply_new_password(
        &self,
        email: &str,
        user_type: &str,
        password_hash: String,
    ) -> AppResult<()> {
        match user_type {
            "merchant" => {
                let merchant = merchants::Entity::find()
                    .filter(merchants::Column::Email.eq(email))
                    .one(&self.pool)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Marchand non trouvé".to_string()))?;
                let mut active = merchant.into_active_model();
                active.password_hash = Set(password_hash);
                active.updated_at = Set(Some(Utc::now()));
                active.update(&self.pool).await?;
            }
            "admin" => {
                let employee = employees::Entity::find()
                    .filter(employees::Column::Email.eq(email))
                    .one(&self.pool)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Employé non trouvé".to_string()))?;
                let mut active = employee.into_active_model();
                active.password_hash = Set(password_hash);
                active.updated_at = Set(Some(Utc::now()));
                active.update(&self.pool).await?;
            }
            _ => {
                let user = users::Entity::find()
                    .filter(users::Column::Email.eq(email))
                    .one(&self.pool)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Utilisateur non trouvé".to_string()))?;
                let mut active = user.into_active_model();
                active.password_hash = Set(password_hash);
                active.updated_at = Set(Some(Utc::now()));
                active.update(&self.pool).await?;
            }
        }
        Ok(())
    }
}

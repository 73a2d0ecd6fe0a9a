use crate::entities::site_setting_entity as site_settings;
use crate::error::AppResult;
use crate::models::SettingValue;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

#[derive(Clone)]
pub struct SettingsService {
    pool: DatabaseConnection,
}

impl SettingsService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 按键读取站点参数，自动推断类型
    pub async fn get(&self, key: &str) -> AppResult<Option<SettingValue>> {
        let setting = site_settings::Entity::find()
            .filter(site_settings::Column::Key.eq(key))
            .one(&self.pool)
            .await?;
        Ok(setting
            .and_then(|s| s.value)
            .map(|raw| SettingValue::coerce(&raw)))
    }

    pub async fn get_float(&self, key: &str, default: f64) -> AppResult<f64> {
        let value = self.get(key).await?;
        Ok(value.and_then(|v| v.as_f64()).unwrap_or(default))
    }

    pub async fn get_int(&self, key: &str, default: i64) -> AppResult<i64> {
        let value = self.get(key).await?;
        Ok(value.and_then(|v| v.as_i64()).unwrap_or(default))
    }

    pub async fn get_bool(&self, key: &str, default: bool) -> AppResult<bool> {
        let value = self.get(key).await?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(default))
    }

    pub async fn get_string(&self, key: &str, default: &str) -> AppResult<String> {
        let value = self.get(key).await?;
        Ok(value
            .map(|v| v.to_string())
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入站点参数，存在则覆盖值并刷新 updated_at
    pub async fn set(
        &self,
        key: &str,
        value: impl ToString,
        description: Option<&str>,
    ) -> AppResult<site_settings::Model> {
        let existing = site_settings::Entity::find()
            .filter(site_settings::Column::Key.eq(key))
            .one(&self.pool)
            .await?;

        let model = match existing {
            Some(setting) => {
                let mut active = setting.into_active_model();
                active.value = Set(Some(value.to_string()));
                active.updated_at = Set(Some(Utc::now()));
                if let Some(desc) = description {
                    active.description = Set(Some(desc.to_string()));
                }
                active.update(&self.pool).await?
            }
            None => {
                let setting = site_settings::ActiveModel {
                    key: Set(key.to_string()),
                    value: Set(Some(value.to_string())),
                    description: Set(description.map(|d| d.to_string())),
                    updated_at: Set(Some(Utc::now())),
                    ..Default::default()
                };
                setting.insert(&self.pool).await?
            }
        };
        Ok(model)
    }

    pub async fn list_all(&self) -> AppResult<Vec<site_settings::Model>> {
        let settings = site_settings::Entity::find()
            .order_by_asc(site_settings::Column::Key)
            .all(&self.pool)
            .await?;
        Ok(settings)
    }
}

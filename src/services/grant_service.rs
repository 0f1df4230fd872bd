//! 用户授权服务（/api/CmUserAuthorize）

use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::list_of;
use crate::client::ApiClient;
use crate::error::ConsoleError;
use crate::models::{AppRole, FacilityOption, GrantRequest, UserGrant};

const RESOURCE: &str = "CmUserAuthorize";

pub struct GrantService {
    client: Arc<ApiClient>,
}

impl GrantService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// 列出授权，可按用户/应用过滤
    pub async fn list(&self, user_id: Option<&str>, app_code: Option<&str>) -> Result<Vec<UserGrant>, ConsoleError> {
        let body = self
            .client
            .get(
                &["api", RESOURCE],
                &[
                    ("userId", user_id.unwrap_or_default()),
                    ("appCode", app_code.unwrap_or_default()),
                ],
            )
            .await?;
        let grants: Vec<UserGrant> = list_of(body);
        Ok(grants
            .into_iter()
            .filter(|g| user_id.map_or(true, |id| g.user_id.eq_ignore_ascii_case(id)))
            .filter(|g| app_code.map_or(true, |code| g.app_code == code))
            .collect())
    }

    /// 新增授权
    pub async fn create(&self, req: &GrantRequest) -> Result<(), ConsoleError> {
        req.validate()?;
        self.client.post(&["api", RESOURCE], req).await?;
        info!(
            user_id = %req.user_id,
            app_code = %req.app_code,
            role_code = %req.role_code,
            "User authorization granted"
        );
        Ok(())
    }

    /// 撤销授权，主键作为请求体
    pub async fn delete(&self, req: &GrantRequest) -> Result<(), ConsoleError> {
        req.validate()?;
        self.client.delete_with_body(&["api", RESOURCE], req).await?;
        info!(
            user_id = %req.user_id,
            app_code = %req.app_code,
            role_code = %req.role_code,
            "User authorization revoked"
        );
        Ok(())
    }

    /// 授权表单中某应用可选的角色
    pub async fn role_options(&self, app_code: &str) -> Result<Vec<AppRole>, ConsoleError> {
        let body = self.client.get(&["api", RESOURCE, "roles", app_code], &[]).await?;
        Ok(list_of(body))
    }

    /// 厂区选项
    pub async fn facilities(&self) -> Result<Vec<FacilityOption>, ConsoleError> {
        let body = self.client.get(&["api", RESOURCE, "facilities"], &[]).await?;
        Ok(list_of(body))
    }
}

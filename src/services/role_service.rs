//! 应用角色服务（/api/CmAppRoles）

use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::{list_of, one_of};
use crate::client::ApiClient;
use crate::error::ConsoleError;
use crate::models::{AppRole, AppRoleRequest};

const RESOURCE: &str = "CmAppRoles";

pub struct RoleService {
    client: Arc<ApiClient>,
}

impl RoleService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// 列出角色，可按应用过滤
    ///
    /// 后端可能忽略查询参数，结果再按应用代码过滤一次。
    pub async fn list(&self, app_code: Option<&str>) -> Result<Vec<AppRole>, ConsoleError> {
        let filter = app_code.unwrap_or_default();
        let body = self.client.get(&["api", RESOURCE], &[("appCode", filter)]).await?;
        let roles: Vec<AppRole> = list_of(body);
        Ok(match app_code {
            Some(code) => roles.into_iter().filter(|r| r.app_code == code).collect(),
            None => roles,
        })
    }

    pub async fn get(&self, app_code: &str, role_code: &str) -> Result<AppRole, ConsoleError> {
        let body = self.client.get(&["api", RESOURCE, app_code, role_code], &[]).await?;
        one_of(body, &format!("Role {}/{}", app_code, role_code))
    }

    pub async fn create(&self, req: &AppRoleRequest) -> Result<(), ConsoleError> {
        req.validate()?;
        self.client.post(&["api", RESOURCE], req).await?;
        info!(app_code = %req.app_code, role_code = %req.role_code, "Role created");
        Ok(())
    }

    pub async fn update(&self, req: &AppRoleRequest) -> Result<(), ConsoleError> {
        req.validate()?;
        self.client
            .put(&["api", RESOURCE, req.app_code.as_str(), req.role_code.as_str()], req)
            .await?;
        info!(app_code = %req.app_code, role_code = %req.role_code, "Role updated");
        Ok(())
    }

    pub async fn delete(&self, app_code: &str, role_code: &str) -> Result<(), ConsoleError> {
        self.client.delete(&["api", RESOURCE, app_code, role_code]).await?;
        info!(app_code = %app_code, role_code = %role_code, "Role deleted");
        Ok(())
    }
}

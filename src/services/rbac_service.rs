//! 角色功能分配服务（/api/Rbac）

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::list_of;
use crate::assignment::AssignmentBackend;
use crate::client::ApiClient;
use crate::error::ConsoleError;
use crate::models::{assigned_codes_from_value, AssignFunctionsRequest, RbacAssignment};

const RESOURCE: &str = "Rbac";

pub struct RbacService {
    client: Arc<ApiClient>,
}

impl RbacService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// 列出分配记录，可按应用/角色过滤
    pub async fn list(
        &self,
        app_code: Option<&str>,
        role_code: Option<&str>,
    ) -> Result<Vec<RbacAssignment>, ConsoleError> {
        let body = self
            .client
            .get(
                &["api", RESOURCE],
                &[
                    ("appCode", app_code.unwrap_or_default()),
                    ("roleCode", role_code.unwrap_or_default()),
                ],
            )
            .await?;
        let rows: Vec<RbacAssignment> = list_of(body);
        Ok(rows
            .into_iter()
            .filter(|r| app_code.map_or(true, |code| r.app_code == code))
            .filter(|r| role_code.map_or(true, |code| r.role_code == code))
            .collect())
    }

    /// 已分配给 (app, role) 的功能代码
    pub async fn assigned(&self, app_code: &str, role_code: &str) -> Result<Vec<String>, ConsoleError> {
        let body = self
            .client
            .get(&["api", RESOURCE, "assigned-functions", app_code, role_code], &[])
            .await?;
        Ok(body.map(|b| assigned_codes_from_value(&b)).unwrap_or_default())
    }

    /// 以完整集合替换 (app, role) 的分配
    pub async fn replace(&self, req: &AssignFunctionsRequest) -> Result<(), ConsoleError> {
        req.validate()?;
        self.client.post(&["api", RESOURCE], req).await?;
        info!(
            app_code = %req.app_code,
            role_code = %req.role_code,
            functions = req.function_codes.len(),
            "Role functions replaced"
        );
        Ok(())
    }

    /// 删除单条分配
    pub async fn delete(&self, rbac_code: &str) -> Result<(), ConsoleError> {
        self.client.delete(&["api", RESOURCE, rbac_code]).await?;
        info!(rbac_code = %rbac_code, "Assignment deleted");
        Ok(())
    }
}

#[async_trait]
impl AssignmentBackend for RbacService {
    async fn assigned_functions(&self, app_code: &str, role_code: &str) -> Result<Vec<String>, ConsoleError> {
        self.assigned(app_code, role_code).await
    }

    async fn replace_assigned_functions(&self, request: &AssignFunctionsRequest) -> Result<(), ConsoleError> {
        self.replace(request).await
    }
}

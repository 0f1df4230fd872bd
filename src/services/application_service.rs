//! 应用管理服务（/api/CmApplications）

use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::{list_of, one_of};
use crate::client::ApiClient;
use crate::error::ConsoleError;
use crate::models::{Application, ApplicationRequest};

const RESOURCE: &str = "CmApplications";

pub struct ApplicationService {
    client: Arc<ApiClient>,
}

impl ApplicationService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// 列出所有应用
    pub async fn list(&self) -> Result<Vec<Application>, ConsoleError> {
        let body = self.client.get(&["api", RESOURCE], &[]).await?;
        Ok(list_of(body))
    }

    /// 根据应用代码查找
    pub async fn get(&self, app_code: &str) -> Result<Application, ConsoleError> {
        let body = self.client.get(&["api", RESOURCE, app_code], &[]).await?;
        one_of(body, &format!("Application {}", app_code))
    }

    /// 创建应用
    pub async fn create(&self, req: &ApplicationRequest) -> Result<(), ConsoleError> {
        req.validate()?;
        self.client.post(&["api", RESOURCE], req).await?;
        info!(app_code = %req.app_code, "Application created");
        Ok(())
    }

    /// 更新应用
    pub async fn update(&self, app_code: &str, req: &ApplicationRequest) -> Result<(), ConsoleError> {
        req.validate()?;
        self.client.put(&["api", RESOURCE, app_code], req).await?;
        info!(app_code = %app_code, "Application updated");
        Ok(())
    }

    /// 删除应用
    pub async fn delete(&self, app_code: &str) -> Result<(), ConsoleError> {
        self.client.delete(&["api", RESOURCE, app_code]).await?;
        info!(app_code = %app_code, "Application deleted");
        Ok(())
    }
}

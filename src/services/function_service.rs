//! 应用功能服务（/api/CmAppFunctions）

use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::{list_of, one_of};
use crate::client::ApiClient;
use crate::error::ConsoleError;
use crate::models::{AppFunction, AppFunctionRequest};

const RESOURCE: &str = "CmAppFunctions";

pub struct FunctionService {
    client: Arc<ApiClient>,
}

impl FunctionService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// 列出功能，可按应用过滤
    pub async fn list(&self, app_code: Option<&str>) -> Result<Vec<AppFunction>, ConsoleError> {
        let filter = app_code.unwrap_or_default();
        let body = self.client.get(&["api", RESOURCE], &[("appCode", filter)]).await?;
        let functions: Vec<AppFunction> = list_of(body);
        Ok(match app_code {
            Some(code) => functions.into_iter().filter(|f| f.app_code == code).collect(),
            None => functions,
        })
    }

    pub async fn get(&self, app_code: &str, function_code: &str) -> Result<AppFunction, ConsoleError> {
        let body = self
            .client
            .get(&["api", RESOURCE, app_code, function_code], &[])
            .await?;
        one_of(body, &format!("Function {}/{}", app_code, function_code))
    }

    pub async fn create(&self, req: &AppFunctionRequest) -> Result<(), ConsoleError> {
        req.validate()?;
        self.client.post(&["api", RESOURCE], req).await?;
        info!(app_code = %req.app_code, function_code = %req.function_code, "Function created");
        Ok(())
    }

    pub async fn update(&self, req: &AppFunctionRequest) -> Result<(), ConsoleError> {
        req.validate()?;
        self.client
            .put(&["api", RESOURCE, req.app_code.as_str(), req.function_code.as_str()], req)
            .await?;
        info!(app_code = %req.app_code, function_code = %req.function_code, "Function updated");
        Ok(())
    }

    pub async fn delete(&self, app_code: &str, function_code: &str) -> Result<(), ConsoleError> {
        self.client
            .delete(&["api", RESOURCE, app_code, function_code])
            .await?;
        info!(app_code = %app_code, function_code = %function_code, "Function deleted");
        Ok(())
    }
}

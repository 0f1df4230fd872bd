//! Role ↔ function assignment (RBAC) model

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use validator::Validate;

use super::application::APP_CODE;
use super::function::FUNCTION_CODE;
use super::role::ROLE_CODE;
use super::{Audit, Record, Tabular};
use crate::fields::{get_str, list_items};

const RBAC_CODE: &[&str] = &["rbaC_CODE", "rbacCode", "rbac_code", "RBAC_CODE", "id"];
const ROLE_NAME: &[&str] = &["rolE_NAME", "roleName", "role_name"];
const FUNCTION_NAME: &[&str] = &["functioN_NAME", "funC_NAME", "functionName", "funcName"];

/// One row binding an application, a role and a function
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RbacAssignment {
    pub rbac_code: String,
    pub app_code: String,
    pub role_code: String,
    pub function_code: String,
    pub role_name: Option<String>,
    pub function_name: Option<String>,
    pub audit: Audit,
}

impl Record for RbacAssignment {
    fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            rbac_code: get_str(value, RBAC_CODE)?,
            app_code: get_str(value, APP_CODE)?,
            role_code: get_str(value, ROLE_CODE)?,
            function_code: get_str(value, FUNCTION_CODE)?,
            role_name: get_str(value, ROLE_NAME),
            function_name: get_str(value, FUNCTION_NAME),
            audit: Audit::from_value(value),
        })
    }
}

impl Tabular for RbacAssignment {
    fn headers() -> &'static [&'static str] {
        &[
            "RBAC Code",
            "App Code",
            "Role Code",
            "Role Name",
            "Function Code",
            "Function Name",
            "Updated By",
            "Updated At",
        ]
    }

    fn cells(&self) -> Vec<String> {
        let (by, at) = self.audit.last_modified();
        vec![
            self.rbac_code.clone(),
            self.app_code.clone(),
            self.role_code.clone(),
            self.role_name.clone().unwrap_or_default(),
            self.function_code.clone(),
            self.function_name.clone().unwrap_or_default(),
            by,
            at,
        ]
    }
}

/// 替换式提交：某 (app, role) 的完整目标功能集合，不是增量
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignFunctionsRequest {
    #[validate(length(min = 1, message = "application code is required"))]
    pub app_code: String,
    #[validate(length(min = 1, message = "role code is required"))]
    pub role_code: String,
    #[validate(length(min = 1, message = "select at least one function"))]
    pub function_codes: Vec<String>,
}

/// 解析 assigned-functions 响应：字符串数组或对象数组均可
pub fn assigned_codes_from_value(body: &Value) -> Vec<String> {
    let Some(items) = list_items(body) else {
        return Vec::new();
    };

    let codes: BTreeSet<String> = items
        .iter()
        .filter_map(|item| match item {
            Value::String(code) => Some(code.clone()),
            Value::Object(_) => get_str(item, FUNCTION_CODE),
            _ => None,
        })
        .filter(|code| !code.is_empty())
        .collect();
    codes.into_iter().collect()
}

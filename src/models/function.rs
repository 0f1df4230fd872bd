//! Application function domain model

use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use super::application::{APP_CODE, DESCRIPTION, IS_ACTIVE};
use super::{flag_cell, opt_cell, Audit, Record, Tabular};
use crate::fields::{get_flag, get_str};

pub(crate) const FUNCTION_CODE: &[&str] = &[
    "functioN_CODE",
    "funC_CODE",
    "functionCode",
    "funcCode",
    "function_code",
    "FUNCTION_CODE",
];
const FUNCTION_NAME: &[&str] = &[
    "functioN_NAME",
    "funC_NAME",
    "functionName",
    "funcName",
    "function_name",
];
const FUNCTION_URL: &[&str] = &[
    "functioN_URL",
    "funC_URL",
    "functionUrl",
    "funcUrl",
    "function_url",
];

/// Function scoped to one application; identity is (app_code, function_code)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppFunction {
    pub app_code: String,
    pub function_code: String,
    pub function_name: String,
    pub description: Option<String>,
    pub function_url: Option<String>,
    pub is_active: bool,
    pub audit: Audit,
}

impl Record for AppFunction {
    fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            app_code: get_str(value, APP_CODE)?,
            function_code: get_str(value, FUNCTION_CODE)?,
            function_name: get_str(value, FUNCTION_NAME).unwrap_or_default(),
            description: get_str(value, DESCRIPTION),
            function_url: get_str(value, FUNCTION_URL),
            is_active: get_flag(value, IS_ACTIVE).unwrap_or(true),
            audit: Audit::from_value(value),
        })
    }
}

impl Tabular for AppFunction {
    fn headers() -> &'static [&'static str] {
        &[
            "App Code",
            "Function Code",
            "Function Name",
            "Description",
            "Function URL",
            "Active",
            "Updated By",
            "Updated At",
        ]
    }

    fn cells(&self) -> Vec<String> {
        let (by, at) = self.audit.last_modified();
        vec![
            self.app_code.clone(),
            self.function_code.clone(),
            self.function_name.clone(),
            opt_cell(&self.description),
            opt_cell(&self.function_url),
            flag_cell(self.is_active),
            by,
            at,
        ]
    }

    fn is_active(&self) -> Option<bool> {
        Some(self.is_active)
    }
}

/// Create / update function request
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AppFunctionRequest {
    #[validate(length(min = 1, message = "application code is required"))]
    pub app_code: String,
    #[validate(length(min = 1, max = 50, message = "function code is required (max 50 chars)"))]
    pub function_code: String,
    #[validate(length(min = 1, max = 100, message = "function name is required (max 100 chars)"))]
    pub function_name: String,
    pub description: Option<String>,
    pub function_url: Option<String>,
    pub is_active: bool,
}

impl From<&AppFunction> for AppFunctionRequest {
    fn from(function: &AppFunction) -> Self {
        Self {
            app_code: function.app_code.clone(),
            function_code: function.function_code.clone(),
            function_name: function.function_name.clone(),
            description: function.description.clone(),
            function_url: function.function_url.clone(),
            is_active: function.is_active,
        }
    }
}

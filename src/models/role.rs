//! Application role domain model

use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use super::application::{APP_CODE, DESCRIPTION, IS_ACTIVE};
use super::{flag_cell, opt_cell, Audit, Record, Tabular};
use crate::fields::{get_flag, get_str};

pub(crate) const ROLE_CODE: &[&str] = &["rolE_CODE", "roleCode", "role_code", "ROLE_CODE", "RoleCode"];
const ROLE_NAME: &[&str] = &["rolE_NAME", "roleName", "role_name", "ROLE_NAME"];
const HOME_URL: &[&str] = &["homE_URL", "homeUrl", "home_url", "HOME_URL"];

/// Role scoped to one application; identity is (app_code, role_code)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppRole {
    pub app_code: String,
    pub role_code: String,
    pub role_name: String,
    pub description: Option<String>,
    pub home_url: Option<String>,
    pub is_active: bool,
    pub audit: Audit,
}

impl Record for AppRole {
    fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            app_code: get_str(value, APP_CODE)?,
            role_code: get_str(value, ROLE_CODE)?,
            role_name: get_str(value, ROLE_NAME).unwrap_or_default(),
            description: get_str(value, DESCRIPTION),
            home_url: get_str(value, HOME_URL),
            is_active: get_flag(value, IS_ACTIVE).unwrap_or(true),
            audit: Audit::from_value(value),
        })
    }
}

impl Tabular for AppRole {
    fn headers() -> &'static [&'static str] {
        &[
            "App Code",
            "Role Code",
            "Role Name",
            "Description",
            "Home URL",
            "Active",
            "Updated By",
            "Updated At",
        ]
    }

    fn cells(&self) -> Vec<String> {
        let (by, at) = self.audit.last_modified();
        vec![
            self.app_code.clone(),
            self.role_code.clone(),
            self.role_name.clone(),
            opt_cell(&self.description),
            opt_cell(&self.home_url),
            flag_cell(self.is_active),
            by,
            at,
        ]
    }

    fn is_active(&self) -> Option<bool> {
        Some(self.is_active)
    }
}

/// Create / update role request
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AppRoleRequest {
    #[validate(length(min = 1, message = "application code is required"))]
    pub app_code: String,
    #[validate(length(min = 1, max = 50, message = "role code is required (max 50 chars)"))]
    pub role_code: String,
    #[validate(length(min = 1, max = 100, message = "role name is required (max 100 chars)"))]
    pub role_name: String,
    pub description: Option<String>,
    pub home_url: Option<String>,
    pub is_active: bool,
}

impl From<&AppRole> for AppRoleRequest {
    fn from(role: &AppRole) -> Self {
        Self {
            app_code: role.app_code.clone(),
            role_code: role.role_code.clone(),
            role_name: role.role_name.clone(),
            description: role.description.clone(),
            home_url: role.home_url.clone(),
            is_active: role.is_active,
        }
    }
}

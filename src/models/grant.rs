//! 用户授权：用户 ↔ (应用, 角色, 厂区) 绑定

use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use super::application::APP_CODE;
use super::role::ROLE_CODE;
use super::{Audit, Record, Tabular};
use crate::fields::get_str;

pub(crate) const USER_ID: &[&str] = &[
    "useR_ID",
    "userId",
    "user_id",
    "USER_ID",
    "emplid",
    "empNo",
    "account",
];
const SITE_CODE: &[&str] = &["sitE_CODE", "siteCode", "site_code", "SITE_CODE", "site"];
const DOMAIN_CODE: &[&str] = &["domaiN_CODE", "domainCode", "domain_code", "DOMAIN_CODE", "domain"];
const FACTORY_CODE: &[&str] = &[
    "factorY_CODE",
    "factoryCode",
    "factory_code",
    "FACTORY_CODE",
    "factory",
];

/// 用户授权记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserGrant {
    pub user_id: String,
    pub app_code: String,
    pub role_code: String,
    pub site_code: Option<String>,
    pub domain_code: Option<String>,
    pub factory_code: Option<String>,
    pub audit: Audit,
}

impl Record for UserGrant {
    fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            user_id: get_str(value, USER_ID)?,
            app_code: get_str(value, APP_CODE)?,
            role_code: get_str(value, ROLE_CODE)?,
            site_code: get_str(value, SITE_CODE),
            domain_code: get_str(value, DOMAIN_CODE),
            factory_code: get_str(value, FACTORY_CODE),
            audit: Audit::from_value(value),
        })
    }
}

impl Tabular for UserGrant {
    fn headers() -> &'static [&'static str] {
        &[
            "User ID",
            "App Code",
            "Role Code",
            "Site",
            "Domain",
            "Factory",
            "Updated By",
            "Updated At",
        ]
    }

    fn cells(&self) -> Vec<String> {
        let (by, at) = self.audit.last_modified();
        vec![
            self.user_id.clone(),
            self.app_code.clone(),
            self.role_code.clone(),
            self.site_code.clone().unwrap_or_default(),
            self.domain_code.clone().unwrap_or_default(),
            self.factory_code.clone().unwrap_or_default(),
            by,
            at,
        ]
    }
}

/// 授权请求；删除时同样作为主键请求体发送
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    #[validate(length(min = 1, message = "user ID is required"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "application code is required"))]
    pub app_code: String,
    #[validate(length(min = 1, message = "role code is required"))]
    pub role_code: String,
    #[validate(length(min = 1, message = "site code is required"))]
    pub site_code: String,
    #[validate(length(min = 1, message = "domain code is required"))]
    pub domain_code: String,
    #[validate(length(min = 1, message = "factory code is required"))]
    pub factory_code: String,
}

impl From<&UserGrant> for GrantRequest {
    fn from(grant: &UserGrant) -> Self {
        Self {
            user_id: grant.user_id.clone(),
            app_code: grant.app_code.clone(),
            role_code: grant.role_code.clone(),
            site_code: grant.site_code.clone().unwrap_or_default(),
            domain_code: grant.domain_code.clone().unwrap_or_default(),
            factory_code: grant.factory_code.clone().unwrap_or_default(),
        }
    }
}

/// 厂区选项（site/domain/factory 三元组）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityOption {
    pub site_code: String,
    pub domain_code: String,
    pub factory_code: String,
    pub label: Option<String>,
}

impl Record for FacilityOption {
    fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            site_code: get_str(value, SITE_CODE)?,
            domain_code: get_str(value, DOMAIN_CODE).unwrap_or_default(),
            factory_code: get_str(value, FACTORY_CODE).unwrap_or_default(),
            label: get_str(value, &["label", "name", "text", "description"]),
        })
    }
}

impl Tabular for FacilityOption {
    fn headers() -> &'static [&'static str] {
        &["Site", "Domain", "Factory", "Label"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.site_code.clone(),
            self.domain_code.clone(),
            self.factory_code.clone(),
            self.label.clone().unwrap_or_default(),
        ]
    }
}

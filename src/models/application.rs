//! Application domain model

use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use super::{flag_cell, opt_cell, Audit, Record, Tabular};
use crate::fields::{get_flag, get_str};

pub(crate) const APP_CODE: &[&str] = &["apP_CODE", "appCode", "app_code", "APP_CODE", "AppCode"];
const APP_NAME: &[&str] = &["apP_NAME", "appName", "app_name", "APP_NAME"];
const APP_TITLE: &[&str] = &["apP_TITLE", "appTitle", "app_title", "APP_TITLE", "title"];
pub(crate) const DESCRIPTION: &[&str] = &["description", "DESCRIPTION", "desc", "Description"];
const BASE_URL: &[&str] = &["basE_URL", "baseUrl", "base_url", "BASE_URL"];
const LOGIN_URL: &[&str] = &["logiN_URL", "loginUrl", "login_url", "LOGIN_URL"];
pub(crate) const IS_ACTIVE: &[&str] = &["iS_ACTIVE", "isActive", "is_active", "IS_ACTIVE", "active"];

/// Application
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Application {
    pub app_code: String,
    pub app_name: String,
    pub app_title: Option<String>,
    pub description: Option<String>,
    pub base_url: Option<String>,
    pub login_url: Option<String>,
    pub is_active: bool,
    pub audit: Audit,
}

impl Record for Application {
    fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            app_code: get_str(value, APP_CODE)?,
            app_name: get_str(value, APP_NAME).unwrap_or_default(),
            app_title: get_str(value, APP_TITLE),
            description: get_str(value, DESCRIPTION),
            base_url: get_str(value, BASE_URL),
            login_url: get_str(value, LOGIN_URL),
            is_active: get_flag(value, IS_ACTIVE).unwrap_or(true),
            audit: Audit::from_value(value),
        })
    }
}

impl Tabular for Application {
    fn headers() -> &'static [&'static str] {
        &[
            "App Code",
            "Name",
            "Title",
            "Description",
            "Base URL",
            "Login URL",
            "Active",
            "Updated By",
            "Updated At",
        ]
    }

    fn cells(&self) -> Vec<String> {
        let (by, at) = self.audit.last_modified();
        vec![
            self.app_code.clone(),
            self.app_name.clone(),
            opt_cell(&self.app_title),
            opt_cell(&self.description),
            opt_cell(&self.base_url),
            opt_cell(&self.login_url),
            flag_cell(self.is_active),
            by,
            at,
        ]
    }

    fn is_active(&self) -> Option<bool> {
        Some(self.is_active)
    }
}

/// Create / update application request
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRequest {
    #[validate(length(min = 1, max = 50, message = "application code is required (max 50 chars)"))]
    pub app_code: String,
    #[validate(length(min = 1, max = 100, message = "application name is required (max 100 chars)"))]
    pub app_name: String,
    pub app_title: Option<String>,
    pub description: Option<String>,
    #[validate(url(message = "base URL must be a valid URL"))]
    pub base_url: Option<String>,
    #[validate(url(message = "login URL must be a valid URL"))]
    pub login_url: Option<String>,
    pub is_active: bool,
}

impl From<&Application> for ApplicationRequest {
    fn from(app: &Application) -> Self {
        Self {
            app_code: app.app_code.clone(),
            app_name: app.app_name.clone(),
            app_title: app.app_title.clone(),
            description: app.description.clone(),
            base_url: app.base_url.clone(),
            login_url: app.login_url.clone(),
            is_active: app.is_active,
        }
    }
}

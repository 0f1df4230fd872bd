//! 用户目录、当前用户与审查表选项

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::grant::USER_ID;
use super::{Record, Tabular};
use crate::fields::{get_str, get_value, list_items};

const USER_NAME: &[&str] = &[
    "useR_NAME",
    "userName",
    "user_name",
    "name",
    "displayName",
    "chineseName",
];
const EMAIL: &[&str] = &["email", "EMAIL", "emaiL_ADDRESS", "mail"];
const DEPARTMENT: &[&str] = &["depT_NAME", "deptName", "department", "dept"];

/// 用户目录中的用户（AuthUsers）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryUser {
    pub user_id: String,
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
}

impl Record for DirectoryUser {
    fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            user_id: get_str(value, USER_ID)?,
            user_name: get_str(value, USER_NAME),
            email: get_str(value, EMAIL),
            department: get_str(value, DEPARTMENT),
        })
    }
}

impl Tabular for DirectoryUser {
    fn headers() -> &'static [&'static str] {
        &["User ID", "Name", "Email", "Department"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.user_id.clone(),
            self.user_name.clone().unwrap_or_default(),
            self.email.clone().unwrap_or_default(),
            self.department.clone().unwrap_or_default(),
        ]
    }
}

/// 当前会话用户（UserInfo/current）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentUser {
    pub user_id: String,
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl Record for CurrentUser {
    fn from_value(value: &Value) -> Option<Self> {
        let roles = match get_value(value, &["roles", "Roles", "roleCodes"]) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|r| match r {
                    Value::String(s) => Some(s.clone()),
                    other => get_str(other, super::role::ROLE_CODE),
                })
                .collect(),
            _ => Vec::new(),
        };

        Some(Self {
            user_id: get_str(value, USER_ID)?,
            user_name: get_str(value, USER_NAME),
            email: get_str(value, EMAIL),
            roles,
        })
    }
}

/// 下拉选项
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionItem {
    pub value: String,
    pub label: String,
}

impl Record for OptionItem {
    fn from_value(value: &Value) -> Option<Self> {
        if let Value::String(s) = value {
            return Some(Self {
                value: s.clone(),
                label: s.clone(),
            });
        }
        let code = get_str(
            value,
            &["value", "code", "apP_CODE", "appCode", "key", "id"],
        )?;
        let label = get_str(
            value,
            &["label", "text", "name", "apP_NAME", "appName", "description"],
        )
        .unwrap_or_else(|| code.clone());
        Some(Self { value: code, label })
    }
}

/// 审查表选项：按组名归类的选项列表
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewOptions {
    pub groups: BTreeMap<String, Vec<OptionItem>>,
}

impl ReviewOptions {
    /// 数组响应归为 `options` 组；对象响应每个数组字段为一组
    pub fn from_value(value: &Value) -> Self {
        let mut groups = BTreeMap::new();
        match value {
            Value::Array(_) => {
                groups.insert("options".to_string(), collect_options(value));
            }
            Value::Object(map) => {
                for (name, entry) in map {
                    if list_items(entry).is_some() {
                        groups.insert(name.clone(), collect_options(entry));
                    }
                }
            }
            _ => {}
        }
        Self { groups }
    }
}

fn collect_options(value: &Value) -> Vec<OptionItem> {
    list_items(value)
        .map(|items| items.iter().filter_map(OptionItem::from_value).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_current_user_roles() {
        let user = CurrentUser::from_value(&json!({
            "userId": "E1001",
            "userName": "Lin",
            "roles": ["ADMIN", {"roleCode": "VIEWER"}]
        }))
        .unwrap();
        assert_eq!(user.roles, vec!["ADMIN".to_string(), "VIEWER".to_string()]);
    }

    #[test]
    fn test_review_options_groups() {
        let options = ReviewOptions::from_value(&json!({
            "applications": [{"apP_CODE": "APP1", "apP_NAME": "First"}],
            "formats": ["xlsx", "csv"],
            "generatedAt": "2024-01-01"
        }));
        assert_eq!(options.groups.len(), 2);
        assert_eq!(options.groups["applications"][0].label, "First");
        assert_eq!(options.groups["formats"][1].value, "csv");
    }
}

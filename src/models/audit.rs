//! 审计字段（创建人/时间、更新人/时间）

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::fields::{get_str, get_timestamp};

const CREATED_BY: &[&str] = &["createD_BY", "createdBy", "created_by", "CREATED_BY"];
const CREATED_AT: &[&str] = &[
    "createD_AT",
    "createdAt",
    "created_at",
    "createD_DATE",
    "createdDate",
    "CREATED_AT",
];
const UPDATED_BY: &[&str] = &["updateD_BY", "updatedBy", "updated_by", "UPDATED_BY"];
const UPDATED_AT: &[&str] = &[
    "updateD_AT",
    "updatedAt",
    "updated_at",
    "updateD_DATE",
    "updatedDate",
    "UPDATED_AT",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Audit {
    pub created_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Audit {
    pub fn from_value(value: &Value) -> Self {
        Self {
            created_by: get_str(value, CREATED_BY),
            created_at: get_timestamp(value, CREATED_AT),
            updated_by: get_str(value, UPDATED_BY),
            updated_at: get_timestamp(value, UPDATED_AT),
        }
    }

    /// 最近修改人与时间，列表展示用
    pub fn last_modified(&self) -> (String, String) {
        let by = self
            .updated_by
            .clone()
            .or_else(|| self.created_by.clone())
            .unwrap_or_default();
        let at = self
            .updated_at
            .or(self.created_at)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        (by, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_last_modified_falls_back_to_created() {
        let audit = Audit::from_value(&json!({
            "createD_BY": "alice",
            "createD_AT": "2024-05-01T10:00:00"
        }));
        assert_eq!(
            audit.last_modified(),
            ("alice".to_string(), "2024-05-01 10:00".to_string())
        );

        let audit = Audit::from_value(&json!({
            "createdBy": "alice",
            "updatedBy": "bob",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-06-02T11:30:00Z"
        }));
        assert_eq!(
            audit.last_modified(),
            ("bob".to_string(), "2024-06-02 11:30".to_string())
        );
    }
}

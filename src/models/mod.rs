//! 数据模型模块
//! 后端原始 JSON 在这里被归一化为唯一的规范结构，之后的代码不再做多键兜底查找

pub mod application;
pub mod audit;
pub mod function;
pub mod grant;
pub mod rbac;
pub mod role;
pub mod user;

pub use application::{Application, ApplicationRequest};
pub use audit::Audit;
pub use function::{AppFunction, AppFunctionRequest};
pub use grant::{FacilityOption, GrantRequest, UserGrant};
pub use rbac::{assigned_codes_from_value, AssignFunctionsRequest, RbacAssignment};
pub use role::{AppRole, AppRoleRequest};
pub use user::{CurrentUser, DirectoryUser, OptionItem, ReviewOptions};

use serde_json::Value;

/// 可从后端原始记录归一化的实体
pub trait Record: Sized {
    /// 缺少主键字段时返回 None
    fn from_value(value: &Value) -> Option<Self>;
}

/// 可以表格化展示、搜索与导出的实体
pub trait Tabular {
    fn headers() -> &'static [&'static str];

    fn cells(&self) -> Vec<String>;

    /// 没有启用标志的实体返回 None，不参与 active-only 过滤
    fn is_active(&self) -> Option<bool> {
        None
    }

    /// 用于模糊搜索的小写文本
    fn search_text(&self) -> String {
        self.cells().join("\u{1f}").to_lowercase()
    }
}

/// 把列表响应归一化为实体集合，无法识别的行记录日志后跳过
pub fn records_from_value<T: Record>(body: &Value) -> Vec<T> {
    let Some(items) = crate::fields::list_items(body) else {
        tracing::warn!("List response is neither an array nor a known envelope");
        return Vec::new();
    };

    let records: Vec<T> = items.iter().filter_map(T::from_value).collect();
    if records.len() != items.len() {
        tracing::warn!(
            received = items.len(),
            normalized = records.len(),
            "Skipped rows missing key fields"
        );
    }
    records
}

pub(crate) fn opt_cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

pub(crate) fn flag_cell(active: bool) -> String {
    if active { "Y" } else { "N" }.to_string()
}

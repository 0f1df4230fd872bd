//! Backend resource services
//! 每个服务对应后端一组 REST 资源，负责请求校验、调用与响应归一化

pub mod application_service;
pub mod function_service;
pub mod grant_service;
pub mod rbac_service;
pub mod review_service;
pub mod role_service;
pub mod user_service;

pub use application_service::ApplicationService;
pub use function_service::FunctionService;
pub use grant_service::GrantService;
pub use rbac_service::RbacService;
pub use review_service::ReviewFormService;
pub use role_service::RoleService;
pub use user_service::UserService;

use serde_json::Value;
use std::sync::Arc;

use crate::client::ApiClient;
use crate::error::ConsoleError;
use crate::models::{records_from_value, Record};

/// 全部服务的集合，共享同一个 API 客户端
pub struct Services {
    pub applications: ApplicationService,
    pub roles: RoleService,
    pub functions: FunctionService,
    pub rbac: Arc<RbacService>,
    pub grants: GrantService,
    pub users: Arc<UserService>,
    pub review: ReviewFormService,
}

impl Services {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            applications: ApplicationService::new(client.clone()),
            roles: RoleService::new(client.clone()),
            functions: FunctionService::new(client.clone()),
            rbac: Arc::new(RbacService::new(client.clone())),
            grants: GrantService::new(client.clone()),
            users: Arc::new(UserService::new(client.clone())),
            review: ReviewFormService::new(client),
        }
    }
}

/// 列表响应归一化，空响应视为空列表
pub(crate) fn list_of<T: Record>(body: Option<Value>) -> Vec<T> {
    body.map(|b| records_from_value(&b)).unwrap_or_default()
}

/// 单条记录响应归一化，兼容 `{ data: {...} }` 信封
pub(crate) fn one_of<T: Record>(body: Option<Value>, what: &str) -> Result<T, ConsoleError> {
    let body = body.ok_or_else(|| ConsoleError::not_found(what))?;
    T::from_value(&body)
        .or_else(|| {
            crate::fields::get_value(&body, &["data", "Data", "result"]).and_then(T::from_value)
        })
        .ok_or_else(|| ConsoleError::Decode(format!("{} response is missing key fields", what)))
}

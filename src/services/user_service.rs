//! 用户目录与当前用户（/api/AuthUsers, /api/UserInfo/current）

use async_trait::async_trait;
use std::sync::Arc;

use super::{list_of, one_of};
use crate::autocomplete::{Suggestion, SuggestionSource};
use crate::client::ApiClient;
use crate::error::ConsoleError;
use crate::models::{CurrentUser, DirectoryUser};

pub struct UserService {
    client: Arc<ApiClient>,
}

impl UserService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// 按关键字搜索用户目录
    pub async fn search(&self, keyword: &str) -> Result<Vec<DirectoryUser>, ConsoleError> {
        let body = self
            .client
            .get(&["api", "AuthUsers"], &[("keyword", keyword)])
            .await?;
        Ok(list_of(body))
    }

    /// 当前会话用户
    pub async fn current(&self) -> Result<CurrentUser, ConsoleError> {
        let body = self.client.get(&["api", "UserInfo", "current"], &[]).await?;
        one_of(body, "Current user")
    }
}

#[async_trait]
impl SuggestionSource for UserService {
    async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>, ConsoleError> {
        let users = self.search(query).await?;
        Ok(users
            .into_iter()
            .map(|u| {
                let label = match (&u.user_name, &u.department) {
                    (Some(name), Some(dept)) => format!("{} {} ({})", u.user_id, name, dept),
                    (Some(name), None) => format!("{} {}", u.user_id, name),
                    _ => u.user_id.clone(),
                };
                Suggestion {
                    value: u.user_id,
                    label,
                }
            })
            .collect())
    }
}

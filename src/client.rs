//! 后端 REST API 客户端
//! 所有请求携带会话 Cookie 与 X-Request-Id；204/空响应体视为 None，非 2xx 统一转为 Http 错误

use reqwest::header::{ACCEPT, CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE};
use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::ConsoleError;

/// 下载得到的文件
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    /// 来自 Content-Disposition 的文件名
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

/// 后端 API 客户端
pub struct ApiClient {
    http: Client,
    base_url: Url,
    cookie_name: String,
    session_cookie: Option<Secret<String>>,
}

impl ApiClient {
    /// 创建新的客户端
    pub fn new(config: &ApiConfig) -> Result<Self, ConsoleError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ConsoleError::Config(format!("invalid base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ConsoleError::Config(format!(
                "base URL cannot carry a path: {}",
                config.base_url
            )));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url,
            cookie_name: config.cookie_name.clone(),
            session_cookie: config.session_cookie.clone(),
        })
    }

    /// 拼接接口地址，路径段会被逐段百分号编码
    pub fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ConsoleError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConsoleError::Config("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);

        let query: Vec<_> = query.iter().filter(|(_, v)| !v.is_empty()).collect();
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, *v)));
        }
        Ok(url)
    }

    pub async fn get(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Option<Value>, ConsoleError> {
        let url = self.endpoint(segments, query)?;
        self.execute(Method::GET, url, None).await
    }

    pub async fn post<B: Serialize>(&self, segments: &[&str], body: &B) -> Result<Option<Value>, ConsoleError> {
        let url = self.endpoint(segments, &[])?;
        self.execute(Method::POST, url, Some(to_json(body)?)).await
    }

    pub async fn put<B: Serialize>(&self, segments: &[&str], body: &B) -> Result<Option<Value>, ConsoleError> {
        let url = self.endpoint(segments, &[])?;
        self.execute(Method::PUT, url, Some(to_json(body)?)).await
    }

    pub async fn delete(&self, segments: &[&str]) -> Result<Option<Value>, ConsoleError> {
        let url = self.endpoint(segments, &[])?;
        self.execute(Method::DELETE, url, None).await
    }

    /// 带请求体的 DELETE（复合主键资源）
    pub async fn delete_with_body<B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<Option<Value>, ConsoleError> {
        let url = self.endpoint(segments, &[])?;
        self.execute(Method::DELETE, url, Some(to_json(body)?)).await
    }

    /// 下载二进制文件
    pub async fn download(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Download, ConsoleError> {
        let url = self.endpoint(segments, query)?;
        let request_id = Uuid::new_v4().to_string();
        let response = self
            .request(Method::GET, url.clone(), &request_id)
            .send()
            .await
            .map_err(|e| transport_error(e, &url, &request_id))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(http_error(status, body, &url, &request_id));
        }

        let headers = response.headers().clone();
        let bytes = response.bytes().await?.to_vec();
        debug!(path = %url.path(), bytes = bytes.len(), request_id = %request_id, "Download complete");

        Ok(Download {
            bytes,
            file_name: headers
                .get(CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_file_name),
            content_type: headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        })
    }

    fn request(&self, method: Method, url: Url, request_id: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header("X-Request-Id", request_id);
        if let Some(cookie) = &self.session_cookie {
            builder = builder.header(
                COOKIE,
                format!("{}={}", self.cookie_name, cookie.expose_secret()),
            );
        }
        builder
    }

    async fn execute(&self, method: Method, url: Url, body: Option<Value>) -> Result<Option<Value>, ConsoleError> {
        let request_id = Uuid::new_v4().to_string();
        debug!(method = %method, path = %url.path(), request_id = %request_id, "Sending request");

        let mut builder = self.request(method.clone(), url.clone(), &request_id);
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(e, &url, &request_id))?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(http_error(status, text, &url, &request_id));
        }

        debug!(
            method = %method,
            path = %url.path(),
            status = status.as_u16(),
            request_id = %request_id,
            "Request succeeded"
        );

        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ConsoleError::Decode(format!("{} {}: {}", method, url.path(), e)))
    }
}

fn to_json<B: Serialize>(body: &B) -> Result<Value, ConsoleError> {
    serde_json::to_value(body).map_err(|e| ConsoleError::Decode(e.to_string()))
}

fn transport_error(e: reqwest::Error, url: &Url, request_id: &str) -> ConsoleError {
    error!(path = %url.path(), request_id = %request_id, error = %e, "Request failed to reach server");
    ConsoleError::Transport(e)
}

fn http_error(status: StatusCode, body: String, url: &Url, request_id: &str) -> ConsoleError {
    // 能解析为 JSON 的错误体保留结构，否则保留原文
    let payload = match serde_json::from_str::<Value>(&body) {
        Ok(value) => value,
        Err(_) if body.trim().is_empty() => Value::Null,
        Err(_) => Value::String(body),
    };
    warn!(
        path = %url.path(),
        status = status.as_u16(),
        request_id = %request_id,
        "Server returned an error status"
    );
    ConsoleError::Http {
        status: status.as_u16(),
        payload,
    }
}

/// 从 Content-Disposition 中解析文件名
fn parse_file_name(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            session_cookie: None,
            cookie_name: ".AspNetCore.Cookies".to_string(),
        }
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = ApiClient::new(&test_config("http://localhost:5000")).unwrap();
        let url = client
            .endpoint(&["api", "Rbac", "assigned-functions", "APP 01", "A/B"], &[])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/Rbac/assigned-functions/APP%2001/A%2FB"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_skips_empty_query() {
        let client = ApiClient::new(&test_config("https://host/rbac/")).unwrap();
        let url = client
            .endpoint(&["api", "CmAppRoles"], &[("appCode", "APP1"), ("roleCode", "")])
            .unwrap();
        assert_eq!(url.as_str(), "https://host/rbac/api/CmAppRoles?appCode=APP1");
    }

    #[test]
    fn test_parse_file_name() {
        assert_eq!(
            parse_file_name("attachment; filename=\"review_APP1.xlsx\"; filename*=UTF-8''x"),
            Some("review_APP1.xlsx".to_string())
        );
        assert_eq!(parse_file_name("inline"), None);
    }
}

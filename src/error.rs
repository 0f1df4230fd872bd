//! 统一错误模型
//! 定义控制台所有错误类型以及面向用户的提示消息

use thiserror::Error;
use validator::ValidationErrors;

/// 控制台错误类型
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// 网络/传输层失败（连接失败、超时等）
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 后端返回非 2xx 状态码，4xx 与 5xx 统一处理
    #[error("HTTP {status}: {payload}")]
    Http {
        status: u16,
        payload: serde_json::Value,
    },

    /// 提交前的必填字段校验失败
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unexpected response shape: {0}")]
    Decode(String),

    #[error("No data to export")]
    NoData,

    #[error("Export failed: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConsoleError {
    /// 获取错误码，HTTP 错误返回后端状态码
    pub fn code(&self) -> u16 {
        match self {
            ConsoleError::Http { status, .. } => *status,
            ConsoleError::NotFound(_) => 404,
            ConsoleError::Validation(_) | ConsoleError::InvalidState(_) => 400,
            ConsoleError::NoData => 204,
            ConsoleError::Transport(_) => 503,
            ConsoleError::Decode(_)
            | ConsoleError::Export(_)
            | ConsoleError::Io(_)
            | ConsoleError::Config(_) => 500,
        }
    }

    /// 获取用户友好的错误消息（不包含内部细节）
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Transport(_) => "Unable to reach the server".to_string(),
            ConsoleError::Http { status, payload } => match payload_message(payload) {
                Some(msg) => format!("Request failed ({}): {}", status, msg),
                None => format!("Request failed ({})", status),
            },
            ConsoleError::Validation(errors) => {
                let fields = field_messages(errors)
                    .into_iter()
                    .map(|(field, msg)| format!("{}: {}", field, msg))
                    .collect::<Vec<_>>();
                format!("Please fix the following fields: {}", fields.join("; "))
            }
            ConsoleError::NotFound(what) => format!("{} not found", what),
            ConsoleError::InvalidState(msg) => msg.clone(),
            ConsoleError::Decode(_) => "The server returned an unexpected response".to_string(),
            ConsoleError::NoData => "No data to export".to_string(),
            ConsoleError::Export(_) | ConsoleError::Io(_) => "Export failed".to_string(),
            ConsoleError::Config(_) => "Configuration error".to_string(),
        }
    }

    // 便捷方法
    pub fn invalid_state(msg: &str) -> Self {
        ConsoleError::InvalidState(msg.to_string())
    }

    pub fn not_found(what: &str) -> Self {
        ConsoleError::NotFound(what.to_string())
    }
}

/// 按字段展开校验错误，字段名排序后返回，便于逐字段展示
pub fn field_messages(errors: &ValidationErrors) -> Vec<(String, String)> {
    let mut messages: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                (field.clone(), msg)
            })
        })
        .collect();
    messages.sort();
    messages
}

/// 从后端错误体中提取可读消息
fn payload_message(payload: &serde_json::Value) -> Option<String> {
    match payload {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Object(_) => {
            crate::fields::get_str(payload, &["message", "Message", "title", "error", "detail"])
        }
        _ => None,
    }
}

impl From<config::ConfigError> for ConsoleError {
    fn from(e: config::ConfigError) -> Self {
        ConsoleError::Config(e.to_string())
    }
}

impl From<csv::Error> for ConsoleError {
    fn from(e: csv::Error) -> Self {
        ConsoleError::Export(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ConsoleError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ConsoleError::Export(e.to_string())
    }
}

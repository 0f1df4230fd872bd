//! 配置系统
//! 依次从默认值、可选配置文件、环境变量加载配置，会话 Cookie 使用 Secret 包装

use config::{Config, ConfigError, Environment, File};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// 后端地址，例如 "https://rbac.example.com"
    pub base_url: String,
    /// 单次请求超时时间（秒）
    pub timeout_secs: u64,
    /// 外部登录后取得的会话 Cookie 值（使用 Secret 包装，防止日志泄露）
    pub session_cookie: Option<Secret<String>>,
    /// 会话 Cookie 名称
    pub cookie_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty, compact
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    /// 列表默认每页条数
    pub page_size: usize,
    /// 用户 ID 联想输入的防抖时间（毫秒）
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// 未指定完整路径时的导出目录
    pub directory: String,
    /// CSV 分隔符（单个 ASCII 字符）
    pub csv_delimiter: String,
}

impl ExportConfig {
    pub fn delimiter(&self) -> u8 {
        self.csv_delimiter.as_bytes().first().copied().unwrap_or(b',')
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub logging: LoggingConfig,
    pub ui: UiConfig,
    pub export: ExportConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let file = std::env::var("RBAC_CONFIG_FILE").unwrap_or_else(|_| "rbac-console".to_string());

        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("api.base_url", "http://localhost:5000")?
            .set_default("api.timeout_secs", 30)?
            .set_default("api.cookie_name", ".AspNetCore.Cookies")?
            .set_default("logging.level", "warn")?
            .set_default("logging.format", "compact")?
            .set_default("ui.page_size", 10)?
            .set_default("ui.debounce_ms", 300)?
            .set_default("export.directory", ".")?
            .set_default("export.csv_delimiter", ",")?;

        // 可选配置文件（rbac-console.toml 等），不存在时忽略
        settings = settings.add_source(File::with_name(&file).required(false));

        // 从环境变量加载配置（前缀为 RBAC_）
        settings = settings.add_source(
            Environment::with_prefix("RBAC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 应用命令行覆盖项并重新校验
    pub fn with_overrides(
        mut self,
        base_url: Option<&str>,
        log_level: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Some(base_url) = base_url {
            self.api.base_url = base_url.to_string();
        }
        if let Some(level) = log_level {
            self.logging.level = level.to_string();
        }
        self.validate()?;
        Ok(self)
    }

    /// 验证配置合法性
    fn validate(&self) -> Result<(), ConfigError> {
        // 验证后端地址
        let url = url::Url::parse(&self.api.base_url).map_err(|e| {
            ConfigError::Message(format!("Invalid api.base_url {}: {}", self.api.base_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Message(
                "api.base_url must use http or https".to_string(),
            ));
        }

        if self.api.timeout_secs == 0 || self.api.timeout_secs > 300 {
            return Err(ConfigError::Message(
                "api.timeout_secs must be between 1 and 300".to_string(),
            ));
        }

        if let Some(cookie) = &self.api.session_cookie {
            if cookie.expose_secret().trim().is_empty() {
                return Err(ConfigError::Message(
                    "api.session_cookie must not be empty when set".to_string(),
                ));
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty, compact",
                    self.logging.format
                )))
            }
        }

        if self.ui.page_size == 0 || self.ui.page_size > 500 {
            return Err(ConfigError::Message(
                "ui.page_size must be between 1 and 500".to_string(),
            ));
        }

        if self.ui.debounce_ms > 5000 {
            return Err(ConfigError::Message(
                "ui.debounce_ms must not exceed 5000".to_string(),
            ));
        }

        if self.export.csv_delimiter.len() != 1 || !self.export.csv_delimiter.is_ascii() {
            return Err(ConfigError::Message(
                "export.csv_delimiter must be a single ASCII character".to_string(),
            ));
        }

        Ok(())
    }
}

//! 测试公共模块
//! 提供基于 wiremock 的后端模拟与客户端构造

#![allow(dead_code)]

use rbac_console::{
    cli::Context,
    client::ApiClient,
    config::{ApiConfig, AppConfig, ExportConfig, LoggingConfig, UiConfig},
    services::Services,
};
use secrecy::Secret;
use std::sync::Arc;
use wiremock::MockServer;

pub const TEST_COOKIE: &str = "test-session-cookie";

/// 指向模拟后端的 API 配置
pub fn create_test_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        session_cookie: Some(Secret::new(TEST_COOKIE.to_string())),
        cookie_name: ".AspNetCore.Cookies".to_string(),
    }
}

pub fn create_test_client(server: &MockServer) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(&create_test_config(server)).expect("Failed to build client"))
}

pub fn create_test_services(server: &MockServer) -> Services {
    Services::new(create_test_client(server))
}

/// 命令执行上下文，去抖设为 0 以免拖慢测试
pub fn create_test_context(server: &MockServer) -> Context {
    Context {
        config: AppConfig {
            api: create_test_config(server),
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "compact".to_string(),
            },
            ui: UiConfig {
                page_size: 10,
                debounce_ms: 0,
            },
            export: ExportConfig {
                directory: ".".to_string(),
                csv_delimiter: ",".to_string(),
            },
        },
        services: create_test_services(server),
    }
}

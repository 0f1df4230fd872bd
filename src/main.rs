//! RBAC 管理控制台入口

use clap::Parser;
use rbac_console::{
    cli::{Cli, Context},
    client::ApiClient,
    config::AppConfig,
    output::Notice,
    services::Services,
    telemetry,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // 按优先级加载：.env.local > .env.development > .env
    if let Ok(env) = std::env::var("RBAC_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::from_filename(".env.development").ok();
        dotenv::dotenv().ok();
    }

    // 1. 加载配置，命令行参数优先
    let config = AppConfig::from_env()
        .and_then(|c| c.with_overrides(cli.base_url.as_deref(), cli.log_level.as_deref()))
        .map_err(|e| {
            eprintln!("Configuration error: {}", e);
            anyhow::anyhow!("Failed to load configuration: {}", e)
        })?;

    // 2. 日志
    telemetry::init_telemetry(&config.logging);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), base_url = %config.api.base_url, "rbac-console starting");

    // 3. 客户端与服务
    let client = Arc::new(ApiClient::new(&config.api)?);
    let ctx = Context {
        services: Services::new(client),
        config,
    };

    // 4. 执行命令；Ctrl+C 时丢弃进行中的请求
    let result = tokio::select! {
        result = cli.run(&ctx) => result,
        _ = signal::ctrl_c() => {
            tracing::info!("Interrupted");
            return Ok(ExitCode::from(130));
        }
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::debug!(error = %e, code = e.code(), "Command failed");
            Notice::from(&e).emit();
            Ok(ExitCode::FAILURE)
        }
    }
}

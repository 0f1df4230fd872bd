//! RBAC 管理控制台
//! 应用、角色、功能、角色授权与用户授权的类型化客户端和交互组件

pub mod assignment;
pub mod autocomplete;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod fields;
pub mod models;
pub mod output;
pub mod services;
pub mod table;
pub mod telemetry;

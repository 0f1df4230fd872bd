//! 用户权限审查表（/api/UserReviewForm）

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::client::ApiClient;
use crate::error::ConsoleError;
use crate::models::ReviewOptions;

pub struct ReviewFormService {
    client: Arc<ApiClient>,
}

impl ReviewFormService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// 审查表可选项（应用、格式等）
    pub async fn options(&self) -> Result<ReviewOptions, ConsoleError> {
        let body = self.client.get(&["api", "UserReviewForm", "options"], &[]).await?;
        Ok(body.map(|b| ReviewOptions::from_value(&b)).unwrap_or_default())
    }

    /// 下载审查表并写入 `target`
    ///
    /// `target` 为目录时使用服务端给出的文件名。空文件视为无数据，不落盘。
    pub async fn download(&self, app_code: &str, format: &str, target: &Path) -> Result<PathBuf, ConsoleError> {
        let download = self
            .client
            .download(
                &["api", "UserReviewForm", "download"],
                &[("appCode", app_code), ("format", format)],
            )
            .await?;

        if download.bytes.is_empty() {
            return Err(ConsoleError::NoData);
        }

        let path = if target.is_dir() {
            let name = download.file_name.clone().unwrap_or_else(|| {
                let ext = extension_for(download.content_type.as_deref()).unwrap_or(format);
                format!("UserReviewForm_{}.{}", app_code, ext)
            });
            target.join(sanitize_file_name(&name))
        } else {
            target.to_path_buf()
        };

        tokio::fs::write(&path, &download.bytes).await?;
        info!(path = %path.display(), bytes = download.bytes.len(), "Review form saved");
        Ok(path)
    }
}

/// 服务端未给出文件名时，按响应类型确定扩展名
fn extension_for(content_type: Option<&str>) -> Option<&'static str> {
    let mime = content_type?.split(';').next()?.trim().to_ascii_lowercase();
    match mime.as_str() {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Some("xlsx"),
        "text/csv" => Some("csv"),
        "text/tab-separated-values" => Some("tsv"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

/// 去掉服务端文件名中的路径成分
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base {
        "" | "." | ".." => "UserReviewForm".to_string(),
        other => other.to_string(),
    }
}

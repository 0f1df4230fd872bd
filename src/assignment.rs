//! 角色功能分配编辑器
//!
//! 选中 (应用, 角色) 后异步加载已分配的功能代码作为初始勾选状态，提交时发送完整的目标集合
//! （替换式，不计算增量）。状态机：
//!
//! - `Idle`：应用或角色未选，勾选列表为空且不可操作
//! - `LoadingAssigned`：正在加载已分配功能
//! - `Ready`：勾选列表反映加载结果，可以勾选/取消
//!
//! 每次加载是一个独立任务，持有自己的 `CancellationToken` 并以 (app, role) 为键；
//! 选择变化会取消旧任务，且加载结果只在键与当前选择一致时才会生效。

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use validator::Validate;

use crate::error::ConsoleError;
use crate::models::AssignFunctionsRequest;

/// 分配编辑器依赖的后端能力
#[async_trait]
pub trait AssignmentBackend: Send + Sync + 'static {
    /// 当前已分配给 (app, role) 的功能代码
    async fn assigned_functions(&self, app_code: &str, role_code: &str) -> Result<Vec<String>, ConsoleError>;

    /// 以完整集合替换 (app, role) 的功能分配
    async fn replace_assigned_functions(&self, request: &AssignFunctionsRequest) -> Result<(), ConsoleError>;
}

/// 加载任务的键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssignmentKey {
    pub app_code: String,
    pub role_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPhase {
    Idle,
    LoadingAssigned,
    Ready,
}

struct PendingLoad {
    key: AssignmentKey,
    token: CancellationToken,
    handle: JoinHandle<Option<Result<Vec<String>, ConsoleError>>>,
}

pub struct AssignmentEditor<B: AssignmentBackend> {
    backend: Arc<B>,
    app_code: Option<String>,
    role_code: Option<String>,
    phase: EditorPhase,
    /// 加载完成时的已分配集合，用于展示变更预览
    assigned: BTreeSet<String>,
    desired: BTreeSet<String>,
    pending: Option<PendingLoad>,
    /// 最近一次加载失败的原因；此时 `assigned` 不代表服务端真实状态
    load_error: Option<String>,
}

impl<B: AssignmentBackend> AssignmentEditor<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            app_code: None,
            role_code: None,
            phase: EditorPhase::Idle,
            assigned: BTreeSet::new(),
            desired: BTreeSet::new(),
            pending: None,
            load_error: None,
        }
    }

    pub fn phase(&self) -> EditorPhase {
        self.phase
    }

    /// 已分配集合未能加载，勾选状态是从空集合开始的
    pub fn load_failed(&self) -> bool {
        self.load_error.is_some()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn app_code(&self) -> Option<&str> {
        self.app_code.as_deref()
    }

    pub fn role_code(&self) -> Option<&str> {
        self.role_code.as_deref()
    }

    /// 当前勾选的功能代码（有序）
    pub fn desired(&self) -> &BTreeSet<String> {
        &self.desired
    }

    pub fn is_checked(&self, function_code: &str) -> bool {
        self.desired.contains(function_code)
    }

    /// 选择应用；传入 None 或空串表示清空
    pub fn select_application(&mut self, app_code: Option<&str>) {
        let app_code = normalize(app_code);
        if app_code == self.app_code {
            return;
        }
        self.app_code = app_code;
        self.restart();
    }

    /// 选择角色；传入 None 或空串表示清空
    pub fn select_role(&mut self, role_code: Option<&str>) {
        let role_code = normalize(role_code);
        if role_code == self.role_code {
            return;
        }
        self.role_code = role_code;
        self.restart();
    }

    /// 勾选或取消勾选一个功能
    pub fn toggle(&mut self, function_code: &str, checked: bool) -> Result<(), ConsoleError> {
        if self.phase != EditorPhase::Ready {
            return Err(ConsoleError::invalid_state(
                "Select an application and role before choosing functions",
            ));
        }
        if checked {
            self.desired.insert(function_code.to_string());
        } else {
            self.desired.remove(function_code);
        }
        Ok(())
    }

    /// 用给定集合整体替换勾选状态
    pub fn set_desired<I, S>(&mut self, function_codes: I) -> Result<(), ConsoleError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.phase != EditorPhase::Ready {
            return Err(ConsoleError::invalid_state(
                "Select an application and role before choosing functions",
            ));
        }
        self.desired = function_codes.into_iter().map(Into::into).collect();
        Ok(())
    }

    /// 相对加载结果新增与移除的功能（只用于展示，提交仍发送完整集合）
    pub fn preview(&self) -> (Vec<String>, Vec<String>) {
        let added = self.desired.difference(&self.assigned).cloned().collect();
        let removed = self.assigned.difference(&self.desired).cloned().collect();
        (added, removed)
    }

    /// 等待进行中的加载完成并应用结果，返回之后的阶段
    pub async fn settle(&mut self) -> EditorPhase {
        let Some(pending) = self.pending.take() else {
            return self.phase;
        };

        let outcome = match pending.handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                warn!(error = %e, "Assigned-functions task did not complete");
                Some(Err(ConsoleError::invalid_state(
                    "Loading assigned functions stopped unexpectedly",
                )))
            }
        };

        // 被取消或键已过期的结果不生效
        let Some(result) = outcome else {
            return self.phase;
        };
        if self.current_key().as_ref() != Some(&pending.key) {
            debug!(
                app_code = %pending.key.app_code,
                role_code = %pending.key.role_code,
                "Discarding stale assigned-functions result"
            );
            return self.phase;
        }

        match result {
            Ok(codes) => {
                self.assigned = codes.into_iter().collect();
                self.desired = self.assigned.clone();
            }
            Err(e) => {
                // 加载失败不阻塞手动勾选
                error!(
                    app_code = %pending.key.app_code,
                    role_code = %pending.key.role_code,
                    error = %e,
                    "Failed to load assigned functions"
                );
                self.assigned.clear();
                self.desired.clear();
                self.load_error = Some(e.user_message());
            }
        }
        self.phase = EditorPhase::Ready;
        self.phase
    }

    /// 校验并提交完整的目标功能集合
    ///
    /// 失败时编辑器状态保持不变，便于修正后重试。
    pub async fn submit(&mut self) -> Result<AssignFunctionsRequest, ConsoleError> {
        let request = AssignFunctionsRequest {
            app_code: self.app_code.clone().unwrap_or_default(),
            role_code: self.role_code.clone().unwrap_or_default(),
            function_codes: self.desired.iter().cloned().collect(),
        };
        request.validate()?;

        if self.phase != EditorPhase::Ready {
            return Err(ConsoleError::invalid_state(
                "Assigned functions are still loading",
            ));
        }

        if let Err(e) = self.backend.replace_assigned_functions(&request).await {
            error!(
                app_code = %request.app_code,
                role_code = %request.role_code,
                error = %e,
                "Failed to save function assignment"
            );
            return Err(e);
        }

        info!(
            app_code = %request.app_code,
            role_code = %request.role_code,
            functions = request.function_codes.len(),
            "Function assignment saved"
        );
        self.assigned = self.desired.clone();
        Ok(request)
    }

    fn current_key(&self) -> Option<AssignmentKey> {
        match (&self.app_code, &self.role_code) {
            (Some(app_code), Some(role_code)) => Some(AssignmentKey {
                app_code: app_code.clone(),
                role_code: role_code.clone(),
            }),
            _ => None,
        }
    }

    /// 选择变化：取消旧加载，清空勾选，必要时启动新加载
    fn restart(&mut self) {
        self.cancel_pending();
        self.assigned.clear();
        self.desired.clear();
        self.load_error = None;

        let Some(key) = self.current_key() else {
            self.phase = EditorPhase::Idle;
            return;
        };

        let token = CancellationToken::new();
        let backend = self.backend.clone();
        let task_token = token.clone();
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => None,
                result = backend.assigned_functions(&task_key.app_code, &task_key.role_code) => Some(result),
            }
        });

        debug!(app_code = %key.app_code, role_code = %key.role_code, "Loading assigned functions");
        self.pending = Some(PendingLoad { key, token, handle });
        self.phase = EditorPhase::LoadingAssigned;
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.token.cancel();
            pending.handle.abort();
        }
    }
}

impl<B: AssignmentBackend> Drop for AssignmentEditor<B> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

fn normalize(code: Option<&str>) -> Option<String> {
    code.map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// 内存后端：每个 (app, role) 可配置返回值与延迟
    #[derive(Default)]
    struct MemoryBackend {
        assigned: HashMap<(String, String), (Vec<String>, Duration)>,
        failing: bool,
        panicking: bool,
        saved: Mutex<Vec<AssignFunctionsRequest>>,
        fail_save: bool,
    }

    impl MemoryBackend {
        fn with(mut self, app: &str, role: &str, codes: &[&str], delay_ms: u64) -> Self {
            self.assigned.insert(
                (app.to_string(), role.to_string()),
                (
                    codes.iter().map(|c| c.to_string()).collect(),
                    Duration::from_millis(delay_ms),
                ),
            );
            self
        }
    }

    #[async_trait]
    impl AssignmentBackend for MemoryBackend {
        async fn assigned_functions(&self, app_code: &str, role_code: &str) -> Result<Vec<String>, ConsoleError> {
            if self.panicking {
                panic!("backend crashed");
            }
            if self.failing {
                return Err(ConsoleError::Http {
                    status: 500,
                    payload: serde_json::Value::Null,
                });
            }
            let (codes, delay) = self
                .assigned
                .get(&(app_code.to_string(), role_code.to_string()))
                .cloned()
                .unwrap_or_default();
            tokio::time::sleep(delay).await;
            Ok(codes)
        }

        async fn replace_assigned_functions(&self, request: &AssignFunctionsRequest) -> Result<(), ConsoleError> {
            if self.fail_save {
                return Err(ConsoleError::Http {
                    status: 400,
                    payload: serde_json::json!({"message": "rejected"}),
                });
            }
            self.saved.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    fn codes(editor: &AssignmentEditor<MemoryBackend>) -> Vec<String> {
        editor.desired().iter().cloned().collect()
    }

    #[tokio::test]
    async fn test_idle_until_both_selected() {
        let backend = Arc::new(MemoryBackend::default().with("APP", "ADMIN", &["F1"], 0));
        let mut editor = AssignmentEditor::new(backend);
        assert_eq!(editor.phase(), EditorPhase::Idle);

        editor.select_application(Some("APP"));
        assert_eq!(editor.phase(), EditorPhase::Idle);
        assert!(editor.toggle("F1", true).is_err());

        editor.select_role(Some("ADMIN"));
        assert_eq!(editor.phase(), EditorPhase::LoadingAssigned);
        assert_eq!(editor.settle().await, EditorPhase::Ready);
        assert_eq!(codes(&editor), vec!["F1"]);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_set() {
        let backend = Arc::new(MemoryBackend::default().with("APP", "ADMIN", &["F1", "F2"], 0));
        let mut editor = AssignmentEditor::new(backend);
        editor.select_application(Some("APP"));
        editor.select_role(Some("ADMIN"));
        editor.settle().await;

        let before = codes(&editor);
        editor.toggle("F3", true).unwrap();
        editor.toggle("F3", false).unwrap();
        assert_eq!(codes(&editor), before);

        editor.toggle("F1", false).unwrap();
        editor.toggle("F1", true).unwrap();
        assert_eq!(codes(&editor), before);
    }

    #[tokio::test]
    async fn test_changing_app_discards_in_flight_result() {
        let backend = Arc::new(
            MemoryBackend::default()
                .with("SLOW", "ADMIN", &["STALE"], 200)
                .with("FAST", "ADMIN", &["FRESH"], 0),
        );
        let mut editor = AssignmentEditor::new(backend);
        editor.select_role(Some("ADMIN"));
        editor.select_application(Some("SLOW"));
        assert_eq!(editor.phase(), EditorPhase::LoadingAssigned);

        editor.select_application(Some("FAST"));
        editor.settle().await;
        assert_eq!(codes(&editor), vec!["FRESH"]);

        // 旧任务即便完成也不会覆盖
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(editor.settle().await, EditorPhase::Ready);
        assert_eq!(codes(&editor), vec!["FRESH"]);
    }

    #[tokio::test]
    async fn test_changing_app_to_one_without_assignments_is_empty() {
        let backend = Arc::new(MemoryBackend::default().with("SLOW", "ADMIN", &["STALE"], 200));
        let mut editor = AssignmentEditor::new(backend);
        editor.select_application(Some("SLOW"));
        editor.select_role(Some("ADMIN"));
        editor.select_application(Some("OTHER"));
        editor.settle().await;
        assert!(editor.desired().is_empty());
        assert_eq!(editor.phase(), EditorPhase::Ready);
    }

    #[tokio::test]
    async fn test_clearing_selection_empties_immediately() {
        let backend = Arc::new(MemoryBackend::default().with("APP", "ADMIN", &["F1", "F2"], 0));
        let mut editor = AssignmentEditor::new(backend);
        editor.select_application(Some("APP"));
        editor.select_role(Some("ADMIN"));
        editor.settle().await;
        assert_eq!(codes(&editor).len(), 2);

        editor.select_role(None);
        assert_eq!(editor.phase(), EditorPhase::Idle);
        assert!(editor.desired().is_empty());

        editor.select_role(Some("ADMIN"));
        editor.settle().await;
        editor.select_application(Some("  "));
        assert_eq!(editor.phase(), EditorPhase::Idle);
        assert!(editor.desired().is_empty());
        assert_eq!(editor.settle().await, EditorPhase::Idle);
    }

    #[tokio::test]
    async fn test_load_failure_allows_manual_selection() {
        let backend = Arc::new(MemoryBackend {
            failing: true,
            ..Default::default()
        });
        let mut editor = AssignmentEditor::new(backend);
        editor.select_application(Some("APP"));
        editor.select_role(Some("ADMIN"));
        assert_eq!(editor.settle().await, EditorPhase::Ready);
        assert!(editor.desired().is_empty());
        editor.toggle("F1", true).unwrap();
        assert!(editor.is_checked("F1"));
    }

    #[tokio::test]
    async fn test_load_failure_is_recorded_until_reselect() {
        let backend = Arc::new(MemoryBackend {
            failing: true,
            ..Default::default()
        });
        let mut editor = AssignmentEditor::new(backend);
        editor.select_application(Some("APP"));
        editor.select_role(Some("ADMIN"));
        editor.settle().await;
        assert!(editor.load_failed());
        assert_eq!(editor.load_error(), Some("Request failed (500)"));

        editor.select_role(None);
        assert!(!editor.load_failed());
    }

    #[tokio::test]
    async fn test_clearing_role_during_slow_load() {
        let backend = Arc::new(MemoryBackend::default().with("APP", "ADMIN", &["F1", "F2"], 500));
        let mut editor = AssignmentEditor::new(backend);
        editor.select_application(Some("APP"));
        editor.select_role(Some("ADMIN"));
        assert_eq!(editor.phase(), EditorPhase::LoadingAssigned);

        editor.select_role(None);
        assert_eq!(editor.phase(), EditorPhase::Idle);
        assert!(editor.desired().is_empty());

        // 不等待网络即返回
        let phase = tokio::time::timeout(Duration::from_millis(50), editor.settle())
            .await
            .unwrap();
        assert_eq!(phase, EditorPhase::Idle);
        assert!(editor.desired().is_empty());
    }

    #[tokio::test]
    async fn test_crashed_load_still_reaches_ready() {
        let backend = Arc::new(MemoryBackend {
            panicking: true,
            ..Default::default()
        });
        let mut editor = AssignmentEditor::new(backend);
        editor.select_application(Some("APP"));
        editor.select_role(Some("ADMIN"));

        assert_eq!(editor.settle().await, EditorPhase::Ready);
        assert!(editor.load_failed());
        assert!(editor.desired().is_empty());
        editor.toggle("F1", true).unwrap();
        assert!(editor.is_checked("F1"));
    }

    #[tokio::test]
    async fn test_submit_requires_a_function() {
        let backend = Arc::new(MemoryBackend::default());
        let mut editor = AssignmentEditor::new(backend.clone());
        editor.select_application(Some("APP"));
        editor.select_role(Some("ADMIN"));
        editor.settle().await;

        let err = editor.submit().await.unwrap_err();
        assert!(matches!(err, ConsoleError::Validation(_)));
        assert!(backend.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_state() {
        let backend = Arc::new(MemoryBackend {
            fail_save: true,
            ..Default::default()
        });
        let mut editor = AssignmentEditor::new(backend);
        editor.select_application(Some("APP"));
        editor.select_role(Some("ADMIN"));
        editor.settle().await;
        editor.toggle("F9", true).unwrap();

        assert!(matches!(editor.submit().await, Err(ConsoleError::Http { status: 400, .. })));
        assert_eq!(editor.app_code(), Some("APP"));
        assert_eq!(editor.role_code(), Some("ADMIN"));
        assert_eq!(codes(&editor), vec!["F9"]);
    }

    #[tokio::test]
    async fn test_submit_sends_complete_desired_set() {
        let backend = Arc::new(MemoryBackend::default().with("APP_ATH_01", "ADMIN", &["F1", "F2"], 0));
        let mut editor = AssignmentEditor::new(backend.clone());
        editor.select_application(Some("APP_ATH_01"));
        editor.select_role(Some("ADMIN"));
        editor.settle().await;

        editor.toggle("F1", false).unwrap();
        editor.toggle("F3", true).unwrap();
        assert_eq!(editor.preview(), (vec!["F3".to_string()], vec!["F1".to_string()]));

        let request = editor.submit().await.unwrap();
        assert_eq!(request.function_codes, vec!["F2", "F3"]);

        let saved = backend.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].app_code, "APP_ATH_01");
        assert_eq!(saved[0].role_code, "ADMIN");
        assert_eq!(saved[0].function_codes, vec!["F2", "F3"]);
    }
}

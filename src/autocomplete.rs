//! 用户 ID 联想输入
//!
//! 每次输入都会中止上一个防抖/查询任务，只有最后一次输入对应的结果会被应用。

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ConsoleError;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// 一条联想结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub value: String,
    pub label: String,
}

/// 联想数据来源
#[async_trait]
pub trait SuggestionSource: Send + Sync + 'static {
    async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>, ConsoleError>;
}

/// 键盘输入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Tab,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// 高亮项发生变化
    Moved(usize),
    Accepted(Suggestion),
    Dismissed,
    Ignored,
}

type LookupTask = JoinHandle<Result<Vec<Suggestion>, ConsoleError>>;

pub struct Autocomplete<S: SuggestionSource> {
    source: Arc<S>,
    debounce: Duration,
    text: String,
    suggestions: Vec<Suggestion>,
    highlighted: Option<usize>,
    open: bool,
    pending: Option<LookupTask>,
    /// 最近一次查询失败的原因，下一次输入时清除
    lookup_error: Option<String>,
}

impl<S: SuggestionSource> Autocomplete<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self::with_debounce(source, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(source: Arc<S>, debounce: Duration) -> Self {
        Self {
            source,
            debounce,
            text: String::new(),
            suggestions: Vec::new(),
            highlighted: None,
            open: false,
            pending: None,
            lookup_error: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// 查询失败时与“没有匹配”区分开
    pub fn lookup_error(&self) -> Option<&str> {
        self.lookup_error.as_deref()
    }

    /// 输入变化：重启防抖计时，空输入直接关闭列表
    pub fn input(&mut self, text: &str) {
        self.abort_pending();
        self.text = text.to_string();
        self.highlighted = None;
        self.lookup_error = None;

        let query = text.trim().to_string();
        if query.is_empty() {
            self.close();
            return;
        }

        let source = self.source.clone();
        let debounce = self.debounce;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            debug!(query = %query, "Looking up suggestions");
            source.suggest(&query).await
        }));
    }

    /// 等待当前查询完成并应用结果
    pub async fn settle(&mut self) -> &[Suggestion] {
        let Some(task) = self.pending.take() else {
            return &self.suggestions;
        };

        match task.await {
            Ok(Ok(suggestions)) => {
                self.open = !suggestions.is_empty();
                self.suggestions = suggestions;
                self.highlighted = None;
            }
            Ok(Err(e)) => {
                warn!(query = %self.text, error = %e, "Suggestion lookup failed");
                self.lookup_error = Some(e.user_message());
                self.close();
            }
            Err(e) => {
                warn!(error = %e, "Suggestion task did not complete");
                if e.is_panic() {
                    self.lookup_error = Some("User lookup stopped unexpectedly".to_string());
                    self.close();
                }
            }
        }
        &self.suggestions
    }

    /// 键盘导航
    pub fn key(&mut self, key: Key) -> KeyOutcome {
        match key {
            Key::Down if self.open && !self.suggestions.is_empty() => {
                let next = match self.highlighted {
                    None => 0,
                    Some(i) => (i + 1).min(self.suggestions.len() - 1),
                };
                self.highlighted = Some(next);
                KeyOutcome::Moved(next)
            }
            Key::Up if self.open && !self.suggestions.is_empty() => {
                let next = match self.highlighted {
                    None => self.suggestions.len() - 1,
                    Some(i) => i.saturating_sub(1),
                };
                self.highlighted = Some(next);
                KeyOutcome::Moved(next)
            }
            Key::Enter | Key::Tab => match self.acceptable() {
                Some(index) => KeyOutcome::Accepted(self.accept(index)),
                None => KeyOutcome::Ignored,
            },
            Key::Escape if self.open => {
                self.close();
                KeyOutcome::Dismissed
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// 指针选择
    pub fn select(&mut self, index: usize) -> Option<Suggestion> {
        if !self.open || index >= self.suggestions.len() {
            return None;
        }
        Some(self.accept(index))
    }

    /// 点击组件外部
    pub fn click_outside(&mut self) {
        self.close();
    }

    /// 高亮项优先；否则唯一的完全匹配项（忽略大小写）
    fn acceptable(&self) -> Option<usize> {
        if !self.open {
            return None;
        }
        if let Some(index) = self.highlighted {
            return Some(index);
        }
        let typed = self.text.trim();
        let mut exact = self
            .suggestions
            .iter()
            .enumerate()
            .filter(|(_, s)| s.value.eq_ignore_ascii_case(typed));
        match (exact.next(), exact.next()) {
            (Some((index, _)), None) => Some(index),
            _ => None,
        }
    }

    fn accept(&mut self, index: usize) -> Suggestion {
        let chosen = self.suggestions[index].clone();
        self.abort_pending();
        self.text = chosen.value.clone();
        self.close();
        chosen
    }

    fn close(&mut self) {
        self.open = false;
        self.highlighted = None;
        self.suggestions.clear();
    }

    fn abort_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

impl<S: SuggestionSource> Drop for Autocomplete<S> {
    fn drop(&mut self) {
        self.abort_pending();
    }
}

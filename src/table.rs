//! 列表视图：搜索、过滤、分页
//!
//! 列表每次展示和每次变更后都整表重新拉取，`refresh_count` 记录拉取次数。

use std::future::Future;
use tracing::debug;

use crate::error::ConsoleError;
use crate::models::Tabular;

/// 列表查询条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    /// 不区分大小写的关键字，匹配任意列
    pub search: Option<String>,
    pub active_only: bool,
    /// 从 1 开始
    pub page: usize,
    pub page_size: usize,
}

impl TableQuery {
    pub fn new(page_size: usize) -> Self {
        Self {
            search: None,
            active_only: false,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    fn matches<T: Tabular>(&self, row: &T) -> bool {
        if self.active_only && row.is_active() == Some(false) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => row.search_text().contains(&term.to_lowercase()),
            _ => true,
        }
    }
}

/// 一页结果
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: Vec<&'a T>,
    /// 过滤后的总行数
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

/// 对已拉取的行做过滤与分页；页码越界时落到最后一页
pub fn paginate<'a, T: Tabular>(rows: &'a [T], query: &TableQuery) -> Page<'a, T> {
    let matched: Vec<&T> = rows.iter().filter(|row| query.matches(*row)).collect();
    let page_size = query.page_size.max(1);
    let total = matched.len();
    let total_pages = total.div_ceil(page_size).max(1);
    let page = query.page.clamp(1, total_pages);

    let items = matched
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        items,
        total,
        page,
        total_pages,
    }
}

/// 持有拉取结果的列表视图
pub struct ListView<T> {
    rows: Vec<T>,
    pub query: TableQuery,
    refresh_count: u64,
}

impl<T: Tabular> ListView<T> {
    pub fn new(query: TableQuery) -> Self {
        Self {
            rows: Vec::new(),
            query,
            refresh_count: 0,
        }
    }

    /// 整表重新拉取；失败时保留上一次的数据
    pub async fn refresh<F, Fut>(&mut self, fetch: F) -> Result<usize, ConsoleError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, ConsoleError>>,
    {
        let rows = fetch().await?;
        self.rows = rows;
        self.refresh_count += 1;
        debug!(rows = self.rows.len(), refresh = self.refresh_count, "List refreshed");
        Ok(self.rows.len())
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// 当前条件下的全部匹配行（导出用，不分页）
    pub fn filtered(&self) -> Vec<&T> {
        self.rows.iter().filter(|row| self.query.matches(*row)).collect()
    }

    pub fn page(&self) -> Page<'_, T> {
        paginate(&self.rows, &self.query)
    }
}

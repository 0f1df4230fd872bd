//! 终端输出
//! 表格写到 stdout；操作结果提示（成功/信息/错误）写到 stderr

use std::fmt::Write as _;

use crate::error::{field_messages, ConsoleError};
use crate::models::Tabular;
use crate::table::Page;

/// 单元格最大显示宽度，超出部分截断
const MAX_CELL_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// 一次性提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// 逐字段的校验提示
    pub fields: Vec<(String, String)>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn render(&self) -> String {
        let tag = match self.level {
            NoticeLevel::Success => "[ok]",
            NoticeLevel::Info => "[info]",
            NoticeLevel::Error => "[error]",
        };
        let mut out = format!("{} {}", tag, self.message);
        for (field, message) in &self.fields {
            let _ = write!(out, "\n  - {}: {}", field, message);
        }
        out
    }

    pub fn emit(&self) {
        eprintln!("{}", self.render());
    }
}

impl From<&ConsoleError> for Notice {
    fn from(e: &ConsoleError) -> Self {
        match e {
            ConsoleError::Validation(errors) => Self {
                level: NoticeLevel::Error,
                message: "Please fix the highlighted fields".to_string(),
                fields: field_messages(errors),
            },
            other => Self {
                level: NoticeLevel::Error,
                message: other.user_message(),
                fields: Vec::new(),
            },
        }
    }
}

/// 渲染对齐的文本表格
pub fn render_table<T: Tabular>(rows: &[&T]) -> String {
    let headers = T::headers();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.cells().into_iter().map(|c| truncate(&c)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_line(&mut out, &header_cells, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in &cells {
        push_line(&mut out, row, &widths);
    }
    out
}

/// 渲染一页结果并附带分页信息
pub fn render_page<T: Tabular>(page: &Page<'_, T>) -> String {
    let mut out = render_table(&page.items);
    let _ = write!(
        out,
        "\nPage {}/{} ({} rows)",
        page.page, page.total_pages, page.total
    );
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn truncate(cell: &str) -> String {
    let cell = cell.replace(['\n', '\r'], " ");
    if cell.chars().count() <= MAX_CELL_WIDTH {
        return cell;
    }
    let mut short: String = cell.chars().take(MAX_CELL_WIDTH - 3).collect();
    short.push_str("...");
    short
}

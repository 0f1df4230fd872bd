//! 表格导出：CSV/TSV（分隔文本）与 XLSX（电子表格），单向导出

use chrono::Local;
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::error::ConsoleError;
use crate::models::Tabular;

/// 工作表名最长 31 个字符
const SHEET_NAME_MAX: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    /// 根据文件扩展名推断格式
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl FromStr for ExportFormat {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" | "txt" => Ok(ExportFormat::Tsv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            other => Err(ConsoleError::Export(format!("unsupported export format: {}", other))),
        }
    }
}

/// 导出选项
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// CSV 分隔符，TSV 固定为制表符
    pub delimiter: u8,
    pub sheet_name: String,
}

impl ExportOptions {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            delimiter: b',',
            sheet_name: "Sheet1".to_string(),
        }
    }
}

/// 默认文件名：`{prefix}_{YYYYMMDD_HHMMSS}.{ext}`
pub fn default_file_name(prefix: &str, format: ExportFormat) -> String {
    format!(
        "{}_{}.{}",
        prefix,
        Local::now().format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// 导出行到文件；空数据集直接拒绝且不创建文件
pub fn export_rows<T: Tabular>(rows: &[&T], path: &Path, options: &ExportOptions) -> Result<PathBuf, ConsoleError> {
    if rows.is_empty() {
        return Err(ConsoleError::NoData);
    }

    match options.format {
        ExportFormat::Csv => write_delimited(rows, path, options.delimiter)?,
        ExportFormat::Tsv => write_delimited(rows, path, b'\t')?,
        ExportFormat::Xlsx => write_workbook(rows, path, &options.sheet_name)?,
    }

    info!(path = %path.display(), rows = rows.len(), format = options.format.extension(), "Export written");
    Ok(path.to_path_buf())
}

fn write_delimited<T: Tabular>(rows: &[&T], path: &Path, delimiter: u8) -> Result<(), ConsoleError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;
    writer.write_record(T::headers())?;
    for row in rows {
        writer.write_record(row.cells())?;
    }
    writer.flush()?;
    Ok(())
}

fn write_workbook<T: Tabular>(rows: &[&T], path: &Path, sheet_name: &str) -> Result<(), ConsoleError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet_name: String = sheet_name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(SHEET_NAME_MAX)
        .collect();

    let worksheet = workbook.add_worksheet();
    if !sheet_name.is_empty() {
        worksheet.set_name(&sheet_name)?;
    }

    for (col, title) in T::headers().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header)?;
    }
    for (index, row) in rows.iter().enumerate() {
        let row_num = (index + 1) as u32;
        for (col, cell) in row.cells().iter().enumerate() {
            worksheet.write_string(row_num, col as u16, cell)?;
        }
    }
    worksheet.autofit();

    workbook.save(path)?;
    Ok(())
}

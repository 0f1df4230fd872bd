//! 容错字段读取
//! 后端不同接口返回的字段命名不一致（`apP_CODE` / `appCode` / `app_code`），
//! 这里按候选键顺序读取第一个存在且非 null 的值。只在 models 的归一化层使用。

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

/// 返回第一个存在且不为 null 的候选键对应的值
///
/// 空字符串与 `false` 视为有效值。
pub fn get_value<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let object = record.as_object()?;
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

/// 读取字符串字段，数字与布尔值按文本返回
pub fn get_str(record: &Value, keys: &[&str]) -> Option<String> {
    match get_value(record, keys)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 读取标志位：bool、0/1、"Y"/"N"、"true"/"false"
pub fn get_flag(record: &Value, keys: &[&str]) -> Option<bool> {
    match get_value(record, keys)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_ascii_uppercase().as_str() {
            "Y" | "YES" | "TRUE" | "1" | "ACTIVE" => Some(true),
            "N" | "NO" | "FALSE" | "0" | "INACTIVE" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// 读取时间戳：RFC 3339，或无时区的 ISO-8601（按 UTC 处理）
pub fn get_timestamp(record: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    let raw = get_str(record, keys)?;
    parse_timestamp(&raw)
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// 列表接口可能直接返回数组，也可能包在 `data` / `items` 等信封字段里
pub fn list_items(body: &Value) -> Option<&Vec<Value>> {
    match body {
        Value::Array(items) => Some(items),
        Value::Object(_) => match get_value(body, &["data", "Data", "items", "result", "records"])? {
            Value::Array(items) => Some(items),
            nested @ Value::Object(_) => list_items(nested),
            _ => None,
        },
        _ => None,
    }
}

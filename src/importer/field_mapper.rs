// ==========================================
// E-Claim 对账核心 - 字段映射器
// ==========================================
// 职责: 原始行 → 规范化字段（按变体映射表）
// 规则: 坏值一律降级为 NULL，行本身保留
// ==========================================

use crate::domain::claim::{FieldValue, MappedRow};
use crate::importer::column_maps::{FieldKind, FieldSpec, Source};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// 视为 NULL 的占位值（trim 后大小写不敏感）
pub const NULL_PLACEHOLDERS: &[&str] = &["-", "", "n/a", "nan", "null", "none"];

const DATETIME_FORMATS: &[&str] = &["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d"];

pub fn is_placeholder(raw: &str) -> bool {
    let normalized = raw.trim().to_lowercase();
    NULL_PLACEHOLDERS.contains(&normalized.as_str())
}

/// 按字符截断（不切断多字节字符）
pub fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// 标识符: 去掉数值单元格带出的 ".0"
pub fn normalize_identifier(raw: &str, max: usize) -> Option<String> {
    if is_placeholder(raw) {
        return None;
    }
    let trimmed = raw.trim();
    let stripped = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    Some(truncate_chars(stripped, max))
}

pub fn normalize_text(raw: &str, max: usize) -> Option<String> {
    if is_placeholder(raw) {
        return None;
    }
    Some(truncate_chars(raw.trim(), max))
}

/// 金额: 去千分位；无法解析 → None
pub fn parse_amount(raw: &str) -> Option<f64> {
    if is_placeholder(raw) {
        return None;
    }
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 整数: 按金额解析后向零截断
pub fn parse_integer(raw: &str) -> Option<i64> {
    parse_amount(raw).map(|v| v.trunc() as i64)
}

/// 日期时间（不做佛历换算）
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    if is_placeholder(raw) {
        return None;
    }
    let value = raw.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    parse_date(value).and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if is_placeholder(raw) {
        return None;
    }
    let value = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d);
        }
    }
    // 带时间部分的单元格只取日期
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// 按字段类型规范化单元格
pub fn normalize(kind: FieldKind, raw: &str) -> FieldValue {
    let value = match kind {
        FieldKind::Skip => None,
        FieldKind::Text(max) => normalize_text(raw, max).map(FieldValue::Text),
        FieldKind::Identifier(max) => normalize_identifier(raw, max).map(FieldValue::Text),
        FieldKind::Date => parse_date(raw).map(FieldValue::Date),
        FieldKind::DateTime => parse_datetime(raw).map(FieldValue::DateTime),
        FieldKind::Amount => parse_amount(raw).map(FieldValue::Amount),
        FieldKind::Integer => parse_integer(raw).map(FieldValue::Integer),
    };
    value.unwrap_or(FieldValue::Null)
}

// ==========================================
// FieldMapper - 工作表级映射器
// ==========================================
// 构造时把表头名来源解析成列号，逐行映射时只做下标访问
pub struct FieldMapper {
    resolved: Vec<(FieldSpec, Option<usize>)>,
    key_index: Option<usize>,
    scheme: String,
}

impl FieldMapper {
    /// # 参数
    /// - `fields`: 变体或附加工作表的映射表
    /// - `headers`: 表头索引（小写表头 → 列号），仅按名寻址时使用
    /// - `key_column`: 主键列名；该列为空的行被丢弃
    pub fn new(
        fields: &[FieldSpec],
        headers: &HashMap<String, usize>,
        key_column: &str,
        scheme: &str,
    ) -> Self {
        let resolved: Vec<(FieldSpec, Option<usize>)> = fields
            .iter()
            .map(|spec| {
                let index = match spec.source {
                    Source::Index(i) => Some(i),
                    Source::Header(h) => headers.get(&h.trim().to_lowercase()).copied(),
                };
                (*spec, index)
            })
            .collect();

        let key_index = resolved
            .iter()
            .find(|(spec, _)| spec.column.name == key_column)
            .and_then(|(_, idx)| *idx);

        Self {
            resolved,
            key_index,
            scheme: scheme.to_string(),
        }
    }

    /// 映射表中找不到表头的列名（按名寻址时用于诊断）
    pub fn unresolved_columns(&self) -> Vec<&'static str> {
        self.resolved
            .iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(spec, _)| spec.column.name)
            .collect()
    }

    /// 主键过滤: 非占位且不是字面 "nan"
    pub fn has_key(&self, row: &[String]) -> bool {
        match self.key_index {
            Some(idx) => row.get(idx).map(|v| !is_placeholder(v)).unwrap_or(false),
            None => false,
        }
    }

    /// 映射单行（调用方先做主键过滤）
    ///
    /// # 参数
    /// - `row_number`: 工作表 1 基行号
    pub fn map_row(&self, file_id: i64, row_number: usize, row: &[String]) -> MappedRow {
        let fields = self
            .resolved
            .iter()
            .map(|(spec, idx)| {
                let raw = idx
                    .and_then(|i| row.get(i))
                    .map(|s| s.as_str())
                    .unwrap_or("");
                (spec.column.name, normalize(spec.column.kind, raw))
            })
            .collect();

        MappedRow {
            file_id,
            row_number,
            scheme: self.scheme.clone(),
            fields,
        }
    }

    /// 从 data_start_row 起映射所有有主键的行
    pub fn map_rows(&self, file_id: i64, rows: &[Vec<String>], data_start_row: usize) -> Vec<MappedRow> {
        rows.iter()
            .enumerate()
            .skip(data_start_row)
            .filter(|(_, row)| self.has_key(row))
            .map(|(idx, row)| self.map_row(file_id, idx + 1, row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SchemaVariant;
    use crate::importer::column_maps::schema_for;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_placeholders_become_null() {
        for raw in ["-", "", "  ", "N/A", "nan", "NULL", "None"] {
            assert_eq!(normalize(FieldKind::Text(10), raw), FieldValue::Null, "{raw:?}");
            assert_eq!(normalize(FieldKind::Amount, raw), FieldValue::Null, "{raw:?}");
        }
    }

    #[test]
    fn test_identifier_strips_float_suffix_and_truncates() {
        assert_eq!(normalize_identifier("1234567890123.0", 20).as_deref(), Some("1234567890123"));
        assert_eq!(normalize_identifier("ABCDEFGH", 4).as_deref(), Some("ABCD"));
        assert_eq!(normalize_identifier("12.05", 10).as_deref(), Some("12.05"));
    }

    #[test]
    fn test_text_truncation_is_char_based() {
        assert_eq!(normalize_text("สมชาย ใจดี", 5).as_deref(), Some("สมชาย"));
    }

    #[test]
    fn test_amount_parsing() {
        assert_eq!(parse_amount("1,234.50"), Some(1234.5));
        assert_eq!(parse_amount(" 500 "), Some(500.0));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_integer("3.9"), Some(3));
        assert_eq!(parse_integer("-3.9"), Some(-3));
    }

    #[test]
    fn test_date_formats() {
        let d = NaiveDate::from_ymd_opt(2025, 9, 13).unwrap();
        assert_eq!(parse_date("13/09/2025"), Some(d));
        assert_eq!(parse_date("2025-09-13"), Some(d));
        assert_eq!(parse_date("13/09/2025 08:30:00"), Some(d));
        assert_eq!(parse_date("31/02/2025"), None);

        let dt = parse_datetime("13/09/2025 08:30:00").unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "08:30");
        let midnight = parse_datetime("13/09/2025").unwrap();
        assert_eq!(midnight.date(), d);
    }

    #[test]
    fn test_map_rows_filters_missing_key() {
        let schema = schema_for(SchemaVariant::UcsOp);
        let mapper = FieldMapper::new(&schema.fields, &HashMap::new(), "tran_id", "UCS");

        let rows = vec![
            row(&["header"]),
            row(&["680900001", "1", "T100", "HN1", "-", "1234567890123.0", "นาย ก", "OP", "13/09/2025 08:00:00", "", "500.50"]),
            row(&["680900001", "2", "-", "HN2"]),
            row(&["680900001", "3", "nan", "HN3"]),
            row(&["680900001", "4", "T101", "HN4"]),
        ];
        let mapped = mapper.map_rows(7, &rows, 1);

        assert_eq!(mapped.len(), 2);
        let first = &mapped[0];
        assert_eq!(first.file_id, 7);
        assert_eq!(first.row_number, 2);
        assert_eq!(first.scheme, "UCS");
        assert_eq!(first.text("tran_id"), Some("T100"));
        assert_eq!(first.get("an"), Some(&FieldValue::Null));
        assert_eq!(first.text("pid"), Some("1234567890123"));
        assert_eq!(first.get("reimbursement_total").and_then(|v| v.as_amount()), Some(500.5));
        assert_eq!(first.get("discharge_date"), Some(&FieldValue::Null));
        assert_eq!(mapped[1].text("tran_id"), Some("T101"));
    }

    #[test]
    fn test_header_addressed_mapping() {
        let schema = schema_for(SchemaVariant::Sss);
        let mut headers = HashMap::new();
        headers.insert("tran_id".to_string(), 3);
        headers.insert("ชดเชยสุทธิ".to_string(), 0);

        let mapper = FieldMapper::new(&schema.fields, &headers, "tran_id", "SSS");
        assert!(mapper.unresolved_columns().contains(&"hn"));

        let mapped = mapper.map_row(1, 6, &row(&["1,000.00", "", "", "S1"]));
        assert_eq!(mapped.text("tran_id"), Some("S1"));
        assert_eq!(mapped.get("reimbursement_total"), Some(&FieldValue::Amount(1000.0)));
        assert_eq!(mapped.get("hn"), Some(&FieldValue::Null));
    }
}

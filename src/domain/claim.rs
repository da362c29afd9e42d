// ==========================================
// E-Claim 对账核心 - 理赔领域模型
// ==========================================
// 职责: 导入文件记录 / 映射后的行 / 单文件导入结果
// 对齐: eclaim_imported_files / claim_rep / claim_rep_* 表
// ==========================================

use crate::domain::types::{FileType, ImportStatus};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// FileMetadata - 文件名解析结果
// ==========================================
// 文件名不符合语法时全部为 None（非致命）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub hospital_code: Option<String>,
    pub file_type: Option<FileType>,
    pub file_date: Option<NaiveDate>, // 已由佛历换算为公历
    pub sequence: Option<String>,
}

impl FileMetadata {
    pub fn is_empty(&self) -> bool {
        self.hospital_code.is_none()
            && self.file_type.is_none()
            && self.file_date.is_none()
            && self.sequence.is_none()
    }
}

// ==========================================
// ImportedFile - 理赔文件导入记录
// ==========================================
// 唯一键: filename；重导入只刷新，不新增
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedFile {
    pub id: i64,
    pub filename: String,
    pub file_type: Option<String>,
    pub scheme: Option<String>,
    pub hospital_code: Option<String>,
    pub file_date: Option<NaiveDate>,
    pub file_sequence: Option<String>,
    pub status: ImportStatus,
    pub total_records: i64,
    pub imported_records: i64,
    pub failed_records: i64,
    pub error_message: Option<String>,
    pub import_started_at: Option<DateTime<Utc>>,
    pub import_completed_at: Option<DateTime<Utc>>,
}

// ==========================================
// FieldValue - 规范化后的单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Amount(f64),
    Integer(i64),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<f64> {
        match self {
            FieldValue::Amount(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }
}

// ==========================================
// MappedRow - 字段映射后的行
// ==========================================
// fields 顺序与映射表一致，写库时按此顺序生成列清单
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow {
    pub file_id: i64,
    pub row_number: usize, // 工作表中的 1 基行号
    pub scheme: String,
    pub fields: Vec<(&'static str, FieldValue)>,
}

impl MappedRow {
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(|v| v.as_text())
    }
}

// ==========================================
// SheetOutcome - 附加工作表导入结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetOutcome {
    pub found: bool,
    pub sheet_name: Option<String>,
    pub imported_records: usize,
    pub error: Option<String>,
}

// ==========================================
// ImportOutcome - 单文件导入结果
// ==========================================
// total_records 口径: 主键过滤之后的数据行数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub success: bool,
    pub filename: String,
    pub file_id: Option<i64>,
    pub total_records: usize,
    pub imported_records: usize,
    pub failed_records: usize,
    pub additional_sheets: BTreeMap<String, SheetOutcome>,
    pub error: Option<String>,
}

impl ImportOutcome {
    pub fn failed(filename: &str, file_id: Option<i64>, error: String) -> Self {
        Self {
            success: false,
            filename: filename.to_string(),
            file_id,
            error: Some(error),
            ..Default::default()
        }
    }
}

// ==========================================
// E-Claim 对账核心 - 工作簿解析器
// ==========================================
// 职责: 打开 .xls/.xlsx，将每个工作表展开为字符串网格
// 约定: 网格行号 = 工作表绝对行号（0 基），不受 used range 偏移影响
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, DataType as _, Reader};
use std::path::Path;

// ==========================================
// RawSheet / RawWorkbook
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl RawSheet {
    /// 取单元格（越界返回空串）
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawWorkbook {
    pub sheets: Vec<RawSheet>,
}

impl RawWorkbook {
    /// 第一个工作表视为主数据表
    pub fn primary(&self) -> Option<&RawSheet> {
        self.sheets.first()
    }

    /// 按名称关键字查找工作表（大小写不敏感，跳过主表）
    pub fn find_sheet(&self, keywords: &[&str]) -> Option<&RawSheet> {
        self.sheets.iter().skip(1).find(|sheet| {
            let name = sheet.name.to_lowercase();
            keywords.iter().any(|k| name.contains(&k.to_lowercase()))
        })
    }
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 工作簿读取接口（测试可替换为内存实现）
pub trait FileParser: Send + Sync {
    fn load(&self, file_path: &Path) -> ImportResult<RawWorkbook>;
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn load(&self, file_path: &Path) -> ImportResult<RawWorkbook> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        // 打开工作簿（按内容自动识别 xls/xlsx）
        let mut workbook = open_workbook_auto(path)?;

        let sheet_names = workbook.sheet_names().to_vec();
        if sheet_names.is_empty() {
            return Err(ImportError::EmptyWorkbook(path.display().to_string()));
        }

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for name in sheet_names {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| ImportError::ExcelParseError(format!("{}: {}", name, e)))?;

            // used range 可能不从 A1 开始，补齐前导行列
            let (row_offset, col_offset) = range
                .start()
                .map(|(r, c)| (r as usize, c as usize))
                .unwrap_or((0, 0));

            let mut rows: Vec<Vec<String>> = vec![Vec::new(); row_offset];
            for data_row in range.rows() {
                let mut cells = vec![String::new(); col_offset];
                cells.extend(data_row.iter().map(cell_to_string));
                rows.push(cells);
            }

            sheets.push(RawSheet { name, rows });
        }

        Ok(RawWorkbook { sheets })
    }
}

/// 单元格 → 字符串
///
/// - 整数值浮点去掉小数部分（避免 "12345.0"）
/// - 日期单元格渲染为 `DD/MM/YYYY HH:MM:SS`
/// - 空/错误单元格 → ""
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%d/%m/%Y %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
    }
}

fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

// ==========================================
// E-Claim 对账核心 - 表头定位
// ==========================================
// 固定偏移: ORF / LGO
// 关键字扫描: UCS-OP / UCS-IP / SSS，失败回退默认行并告警
// ==========================================

use crate::importer::column_maps::{HeaderStrategy, HEADER_KEYWORDS};
use crate::importer::file_parser::RawSheet;
use std::collections::HashMap;
use tracing::{debug, warn};

/// 判定为表头所需的最少关键字命中数
pub const MIN_KEYWORD_HITS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLocation {
    /// 表头行（0 基）
    pub header_row: usize,
    /// 第一条数据行（0 基）
    pub data_start_row: usize,
    /// false 表示使用了回退偏移
    pub detected: bool,
}

/// 单行中命中的表头关键字数
pub fn keyword_hits(row: &[String], keywords: &[&str]) -> usize {
    row.iter()
        .filter(|cell| {
            let normalized = cell.trim().to_lowercase();
            !normalized.is_empty() && keywords.iter().any(|k| k.to_lowercase() == normalized)
        })
        .count()
}

/// 定位表头
///
/// # 参数
/// - `scan_rows`: 关键字扫描的行数上限
/// - `default_header_row`: 扫描失败时的回退表头行
pub fn locate_header(
    sheet: &RawSheet,
    strategy: HeaderStrategy,
    scan_rows: usize,
    default_header_row: usize,
) -> HeaderLocation {
    match strategy {
        HeaderStrategy::Fixed { data_start_row } => HeaderLocation {
            header_row: data_start_row.saturating_sub(1),
            data_start_row,
            detected: true,
        },
        HeaderStrategy::KeywordScan => {
            let found = sheet
                .rows
                .iter()
                .take(scan_rows)
                .position(|row| keyword_hits(row, HEADER_KEYWORDS) >= MIN_KEYWORD_HITS);

            match found {
                Some(header_row) => {
                    debug!(sheet = %sheet.name, header_row, "表头关键字扫描命中");
                    HeaderLocation {
                        header_row,
                        data_start_row: header_row + 1,
                        detected: true,
                    }
                }
                None => {
                    warn!(
                        sheet = %sheet.name,
                        scan_rows,
                        default_header_row,
                        "未找到表头行，使用默认偏移"
                    );
                    HeaderLocation {
                        header_row: default_header_row,
                        data_start_row: default_header_row + 1,
                        detected: false,
                    }
                }
            }
        }
    }
}

/// 表头行 → {小写表头: 列号}（重复表头取第一次出现）
pub fn header_index(sheet: &RawSheet, header_row: usize) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    if let Some(row) = sheet.rows.get(header_row) {
        for (col, cell) in row.iter().enumerate() {
            let key = cell.trim().to_lowercase();
            if !key.is_empty() {
                index.entry(key).or_insert(col);
            }
        }
    }
    index
}

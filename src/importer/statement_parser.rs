// ==========================================
// E-Claim 对账核心 - 结算单解析器
// ==========================================
// 职责: 把分段、带标记行的结算单工作簿解析为 表头块 + 汇总行 + 明细行
// 状态机: 每个工作表一个扫描状态
//   phase: HeaderBlock → Body（遇到分段标记或列头行进入 Body）
//   data_type: normal → appeal / disabled（由分段标记行切换）
// 约束: 纯函数，不访问数据库
// ==========================================

use crate::domain::statement::{
    ParsedStatement, StatementClaimItem, StatementHeader, StatementSummaryRow,
};
use crate::domain::types::{DataType, SummaryKind};
use crate::importer::field_mapper::{
    is_placeholder, normalize_identifier, normalize_text, parse_amount, parse_datetime,
    parse_integer,
};
use crate::importer::file_parser::{RawSheet, RawWorkbook};
use crate::importer::filename::BE_OFFSET;
use crate::importer::header_locator::{keyword_hits, MIN_KEYWORD_HITS};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// 年份不小于该值视为佛历
pub const BE_YEAR_THRESHOLD: i32 = 2400;

/// 结算单列头关键字
const STATEMENT_HEADER_KEYWORDS: &[&str] = &[
    "rep no.",
    "rep",
    "tran_id",
    "hn",
    "an",
    "pid",
    "ชื่อ-สกุล",
    "รายการ",
    "จำนวนราย",
    "เรียกเก็บ",
    "ชดเชย",
    "หักเงิน",
    "ชดเชยสุทธิ",
];

// 分段标记只按整格或前缀匹配
const NORMAL_SENTINELS: &[&str] = &["ข้อมูลปกติ", "ปกติ", "normal"];
const APPEAL_SENTINELS: &[&str] = &["ข้อมูลอุทธรณ์", "อุทธรณ์", "appeal"];
const DISABLED_SENTINELS: &[&str] = &["d1", "ข้อมูลผู้พิการ", "ผู้พิการ", "disabled"];

const DETAIL_SHEET_KEYWORDS: &[&str] = &["รายละเอียด", "detail"];

// ==========================================
// 明细列序
// ==========================================
mod detail_col {
    pub const REP_NO: usize = 0;
    pub const TRAN_ID: usize = 1;
    pub const HN: usize = 2;
    pub const AN: usize = 3;
    pub const PID: usize = 4;
    pub const PATIENT_NAME: usize = 5;
    pub const ADMISSION: usize = 6;
    pub const DISCHARGE: usize = 7;
    pub const DRG: usize = 8;
    pub const RW: usize = 9;
    pub const ADJRW: usize = 10;
    pub const CLAIM: usize = 11;
    pub const COMPENSATION: usize = 12;
    pub const DEDUCTION: usize = 13;
    pub const TOTAL_PAID: usize = 14;
    pub const REMARK: usize = 15;
}

// 汇总列序: 标签 / 例数 / 申报 / 补偿 / 扣减 / 实付
mod summary_col {
    pub const LABEL: usize = 0;
    pub const CASE_COUNT: usize = 1;
    pub const CLAIM: usize = 2;
    pub const COMPENSATION: usize = 3;
    pub const DEDUCTION: usize = 4;
    pub const NET_PAID: usize = 5;
}

// ==========================================
// 表头块正则
// ==========================================
fn report_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:วันที่|date)[^0-9]*(\d{1,2})/(\d{1,2})/(\d{4})")
            .expect("report date regex")
    })
}

fn hospital_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:หน่วยบริการ|hospital)\s*[:：]?\s*(\d{5})\s*[-:：]?\s*(.*)$")
            .expect("hospital regex")
    })
}

fn province_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:จังหวัด|province)\s*[:：]?\s*([^\s:：]+)").expect("province regex")
    })
}

// 明细日期: 日/月/年[ 时:分[:秒]]，年份可能为佛历
fn item_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})(?:\s+(\d{1,2}):(\d{2})(?::(\d{2}))?)?$")
            .expect("item date regex")
    })
}

fn document_no_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:เลขที่เอกสาร|document\s*no\.?)\s*[:：]?\s*([0-9A-Za-z][0-9A-Za-z/\-\.]*)")
            .expect("document no regex")
    })
}

// ==========================================
// 扫描状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    HeaderBlock,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScanState {
    phase: Phase,
    data_type: DataType,
}

impl ScanState {
    fn new() -> Self {
        Self {
            phase: Phase::HeaderBlock,
            data_type: DataType::Normal,
        }
    }
}

/// 行分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowClass {
    Blank,
    Sentinel(DataType),
    ColumnHeader,
    GrandTotal,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Detail,
    RepSummary,
    Receivable,
}

/// 按工作表名判定类别
pub fn sheet_kind(name: &str) -> SheetKind {
    let lower = name.to_lowercase();
    if DETAIL_SHEET_KEYWORDS.iter().any(|k| lower.contains(k)) {
        SheetKind::Detail
    } else if name.contains("REP") {
        SheetKind::RepSummary
    } else {
        SheetKind::Receivable
    }
}

fn non_empty_cells(row: &[String]) -> impl Iterator<Item = &str> {
    row.iter().map(|c| c.trim()).filter(|c| !c.is_empty())
}

fn sentinel_of(cell: &str) -> Option<DataType> {
    let lower = cell.trim().to_lowercase();
    let hit = |keys: &[&str]| keys.iter().any(|k| lower.starts_with(k));
    if hit(APPEAL_SENTINELS) {
        Some(DataType::Appeal)
    } else if hit(DISABLED_SENTINELS) {
        Some(DataType::Disabled)
    } else if hit(NORMAL_SENTINELS) {
        Some(DataType::Normal)
    } else {
        None
    }
}

fn classify_row(row: &[String]) -> RowClass {
    let cells: Vec<&str> = non_empty_cells(row).collect();
    let Some(first) = cells.first() else {
        return RowClass::Blank;
    };

    // 分段标记行只有一个非空单元格
    if cells.len() == 1 {
        if let Some(data_type) = sentinel_of(first) {
            return RowClass::Sentinel(data_type);
        }
    }
    if keyword_hits(row, STATEMENT_HEADER_KEYWORDS) >= MIN_KEYWORD_HITS {
        return RowClass::ColumnHeader;
    }
    let lower = first.to_lowercase();
    if first.starts_with("รวม") || lower.starts_with("total") {
        return RowClass::GrandTotal;
    }
    RowClass::Data
}

/// 佛历年份转公历（年份 ≥ 2400 才转换）
pub fn gregorian_year(year: i32) -> i32 {
    if year >= BE_YEAR_THRESHOLD {
        year - BE_OFFSET
    } else {
        year
    }
}

/// 日/月/年 日期时间（年份可为佛历）: 先换算年份再构造日期，闰日按公历年校验
pub fn parse_be_datetime(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    let Some(caps) = item_date_re().captures(value) else {
        return parse_datetime(value);
    };
    let number = |idx: usize| caps.get(idx).map_or(Some(0), |m| m.as_str().parse::<u32>().ok());

    let year = gregorian_year(caps[3].parse::<i32>().ok()?);
    NaiveDate::from_ymd_opt(year, number(2)?, number(1)?)?.and_hms_opt(
        number(4)?,
        number(5)?,
        number(6)?,
    )
}

/// 从表头块文本行提取元数据（每个字段取第一次命中）
pub fn parse_header_block(lines: &[String]) -> StatementHeader {
    let mut header = StatementHeader::default();

    for line in lines {
        if header.report_date.is_none() {
            if let Some(caps) = report_date_re().captures(line) {
                let day = caps[1].parse::<u32>().ok();
                let month = caps[2].parse::<u32>().ok();
                let year = caps[3].parse::<i32>().ok();
                if let (Some(d), Some(m), Some(y)) = (day, month, year) {
                    header.report_date = NaiveDate::from_ymd_opt(gregorian_year(y), m, d);
                }
            }
        }

        if header.hospital_code.is_none() {
            if let Some(caps) = hospital_re().captures(line) {
                header.hospital_code = Some(caps[1].to_string());
                // 同一行可能带省份，截断到省份关键字之前
                let name = caps[2]
                    .split("จังหวัด")
                    .next()
                    .unwrap_or("")
                    .trim()
                    .to_string();
                if !name.is_empty() {
                    header.hospital_name = Some(name);
                }
            }
        }

        if header.province.is_none() {
            if let Some(caps) = province_re().captures(line) {
                header.province = Some(caps[1].to_string());
            }
        }

        if header.document_no.is_none() {
            if let Some(caps) = document_no_re().captures(line) {
                header.document_no = Some(caps[1].to_string());
            }
        }
    }

    header
}

fn amount_or_zero(row: &[String], col: usize) -> f64 {
    row.get(col).and_then(|v| parse_amount(v)).unwrap_or(0.0)
}

fn cell<'a>(row: &'a [String], col: usize) -> &'a str {
    row.get(col).map(|s| s.as_str()).unwrap_or("")
}

fn detail_item(
    sheet_name: &str,
    row_number: usize,
    data_type: DataType,
    row: &[String],
) -> Option<StatementClaimItem> {
    use detail_col::*;

    let raw_tran_id = cell(row, TRAN_ID);
    if is_placeholder(raw_tran_id) {
        return None;
    }
    let tran_id = normalize_identifier(raw_tran_id, 15)?;

    Some(StatementClaimItem {
        sheet_name: sheet_name.to_string(),
        row_number,
        data_type,
        rep_no: normalize_identifier(cell(row, REP_NO), 15),
        tran_id,
        hn: normalize_identifier(cell(row, HN), 15),
        an: normalize_identifier(cell(row, AN), 15),
        pid: normalize_identifier(cell(row, PID), 20),
        patient_name: normalize_text(cell(row, PATIENT_NAME), 100),
        admission_date: parse_be_datetime(cell(row, ADMISSION)),
        discharge_date: parse_be_datetime(cell(row, DISCHARGE)),
        drg: normalize_text(cell(row, DRG), 10),
        rw: amount_or_zero(row, RW),
        adjrw: amount_or_zero(row, ADJRW),
        claim_amount: amount_or_zero(row, CLAIM),
        compensation: amount_or_zero(row, COMPENSATION),
        deduction: amount_or_zero(row, DEDUCTION),
        total_paid: amount_or_zero(row, TOTAL_PAID),
        remark: normalize_text(cell(row, REMARK), 500),
    })
}

fn summary_row(
    sheet_name: &str,
    row_number: usize,
    kind: SummaryKind,
    data_type: DataType,
    row: &[String],
) -> Option<StatementSummaryRow> {
    use summary_col::*;

    let label = cell(row, LABEL);
    if is_placeholder(label) {
        return None;
    }
    let (rep_no, description) = match kind {
        SummaryKind::Rep => (normalize_identifier(label, 15), None),
        SummaryKind::Receivable => (None, normalize_text(label, 255)),
    };

    Some(StatementSummaryRow {
        sheet_name: sheet_name.to_string(),
        row_number,
        summary_kind: kind,
        data_type,
        rep_no,
        description,
        case_count: row
            .get(CASE_COUNT)
            .and_then(|v| parse_integer(v))
            .unwrap_or(0),
        claim_amount: amount_or_zero(row, CLAIM),
        compensation: amount_or_zero(row, COMPENSATION),
        deduction: amount_or_zero(row, DEDUCTION),
        net_paid: amount_or_zero(row, NET_PAID),
    })
}

/// 扫描单个工作表，结果追加到 out
fn scan_sheet(sheet: &RawSheet, out: &mut ParsedStatement) {
    let kind = sheet_kind(&sheet.name);
    let mut state = ScanState::new();
    let mut header_lines: Vec<String> = Vec::new();
    let mut skipped = 0usize;

    for (idx, row) in sheet.rows.iter().enumerate() {
        let class = classify_row(row);

        if state.phase == Phase::HeaderBlock {
            match class {
                RowClass::Blank => continue,
                RowClass::Sentinel(_) | RowClass::ColumnHeader => state.phase = Phase::Body,
                RowClass::GrandTotal | RowClass::Data => {
                    header_lines.push(non_empty_cells(row).collect::<Vec<_>>().join(" "));
                    continue;
                }
            }
        }

        match class {
            RowClass::Sentinel(data_type) => state.data_type = data_type,
            RowClass::Blank | RowClass::ColumnHeader | RowClass::GrandTotal => {}
            RowClass::Data => {
                let row_number = idx + 1;
                let emitted = match kind {
                    SheetKind::Detail => {
                        match detail_item(&sheet.name, row_number, state.data_type, row) {
                            Some(item) => {
                                out.items.push(item);
                                true
                            }
                            None => false,
                        }
                    }
                    SheetKind::RepSummary | SheetKind::Receivable => {
                        let summary_kind = if kind == SheetKind::RepSummary {
                            SummaryKind::Rep
                        } else {
                            SummaryKind::Receivable
                        };
                        match summary_row(&sheet.name, row_number, summary_kind, state.data_type, row) {
                            Some(summary) => {
                                out.summaries.push(summary);
                                true
                            }
                            None => false,
                        }
                    }
                };
                if !emitted {
                    skipped += 1;
                }
            }
        }
    }

    out.header.merge_missing(parse_header_block(&header_lines));
    debug!(
        sheet = %sheet.name,
        kind = ?kind,
        header_lines = header_lines.len(),
        skipped,
        "结算单工作表扫描完成"
    );
}

/// 解析整个结算单工作簿
pub fn parse_statement(workbook: &RawWorkbook) -> ParsedStatement {
    let mut parsed = ParsedStatement::default();
    for sheet in &workbook.sheets {
        scan_sheet(sheet, &mut parsed);
    }
    parsed
}

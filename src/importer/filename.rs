// ==========================================
// E-Claim 对账核心 - 文件名元数据提取
// ==========================================
// 理赔: eclaim_{hcode}_{type}_{BE YYYYMMDD}_{seq}.xls
// 结算: STM_{hcode}_{IP|OP}{scheme}{BE YYYY}{MM}_{seq}.xls
// 不匹配时返回全空元数据（非致命）
// ==========================================

use crate::domain::claim::FileMetadata;
use crate::domain::statement::StatementFileName;
use crate::domain::types::{FileType, PatientKind, StatementScheme};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// 佛历与公历的年份差
pub const BE_OFFSET: i32 = 543;

fn claim_filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^eclaim_([0-9A-Za-z]+)_([A-Za-z]+)_(\d{8})_(\d+)\.xlsx?$")
            .expect("claim filename regex")
    })
}

fn statement_filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^STM_([0-9A-Za-z]+)_(IP|OP)(UCS|OFC|SSS|LGO)(\d{4})(\d{2})_(\d+)\.xlsx?$")
            .expect("statement filename regex")
    })
}

/// 佛历年月日 → 公历日期；非法日期返回 None
pub fn be_to_gregorian(be_year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(be_year - BE_OFFSET, month, day)
}

/// 解析 8 位佛历日期 "YYYYMMDD"
pub fn parse_be_compact_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 8 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = raw[0..4].parse().ok()?;
    let month: u32 = raw[4..6].parse().ok()?;
    let day: u32 = raw[6..8].parse().ok()?;
    be_to_gregorian(year, month, day)
}

/// 只取路径中的文件名部分
pub(crate) fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim()
}

/// 解析理赔文件名
///
/// # 示例
/// ```
/// use eclaim_recon::importer::filename::parse_claim_filename;
/// use chrono::NaiveDate;
///
/// let meta = parse_claim_filename("eclaim_10670_OP_25680913_001.xls");
/// assert_eq!(meta.hospital_code.as_deref(), Some("10670"));
/// assert_eq!(meta.file_date, NaiveDate::from_ymd_opt(2025, 9, 13));
/// ```
pub fn parse_claim_filename(filename: &str) -> FileMetadata {
    let Some(caps) = claim_filename_re().captures(base_name(filename)) else {
        return FileMetadata::default();
    };

    let Some(file_type) = FileType::from_token(&caps[2]) else {
        return FileMetadata::default();
    };
    let Some(file_date) = parse_be_compact_date(&caps[3]) else {
        return FileMetadata::default();
    };

    FileMetadata {
        hospital_code: Some(caps[1].to_string()),
        file_type: Some(file_type),
        file_date: Some(file_date),
        sequence: Some(caps[4].to_string()),
    }
}

/// 解析结算单文件名
pub fn parse_statement_filename(filename: &str) -> StatementFileName {
    let Some(caps) = statement_filename_re().captures(base_name(filename)) else {
        return StatementFileName::default();
    };

    let patient_kind = match caps[2].to_uppercase().as_str() {
        "IP" => PatientKind::Ip,
        _ => PatientKind::Op,
    };
    let Some(scheme) = StatementScheme::from_token(&caps[3]) else {
        return StatementFileName::default();
    };
    let be_year: i32 = match caps[4].parse() {
        Ok(v) => v,
        Err(_) => return StatementFileName::default(),
    };
    let month: u32 = match caps[5].parse() {
        Ok(v) => v,
        Err(_) => return StatementFileName::default(),
    };
    let Some(period_month) = be_to_gregorian(be_year, month, 1) else {
        return StatementFileName::default();
    };

    StatementFileName {
        hospital_code: Some(caps[1].to_string()),
        patient_kind: Some(patient_kind),
        scheme: Some(scheme),
        period_month: Some(period_month),
        sequence: Some(caps[6].to_string()),
    }
}

// ==========================================
// E-Claim 对账核心 - 国库拨付 CSV 导入
// ==========================================
// 职责: 拨付流水 CSV → TreasuryTransfer，整批写入 treasury_transfer
// 列: vendor_id, transfer_date, amount, reference（reference 可省略）
// 约束: 任一行格式错误则整个文件不写入
// ==========================================

use crate::domain::recon::TreasuryTransfer;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{normalize_identifier, normalize_text, parse_amount};
use crate::importer::statement_parser::parse_be_datetime;
use crate::repository::TreasuryRepository;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, instrument};

const REQUIRED_COLUMNS: &[&str] = &["vendor_id", "transfer_date", "amount"];

fn field<'a>(row: &'a HashMap<String, String>, key: &str) -> &'a str {
    row.get(key).map(|s| s.as_str()).unwrap_or("")
}

fn invalid(row: usize, message: String) -> ImportError {
    ImportError::InvalidRecord { row, message }
}

/// 解析拨付 CSV（首行为列名，列名不区分大小写）
pub fn read_transfers<R: Read>(reader: R) -> ImportResult<Vec<TreasuryTransfer>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(invalid(1, format!("缺少列 {}", required)));
        }
    }

    let mut transfers = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        // 表头占第 1 行
        let row_number = idx + 2;
        let row: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(|v| v.trim().to_string()))
            .collect();
        if row.values().all(|v| v.is_empty()) {
            continue;
        }

        let vendor_id = normalize_identifier(field(&row, "vendor_id"), 10)
            .ok_or_else(|| invalid(row_number, "vendor_id 为空".to_string()))?;
        let raw_date = field(&row, "transfer_date");
        let transfer_date = parse_be_datetime(raw_date)
            .map(|dt| dt.date())
            .ok_or_else(|| invalid(row_number, format!("日期无法解析: {}", raw_date)))?;
        let raw_amount = field(&row, "amount");
        let amount = parse_amount(raw_amount)
            .ok_or_else(|| invalid(row_number, format!("金额无法解析: {}", raw_amount)))?;

        transfers.push(TreasuryTransfer {
            vendor_id,
            transfer_date,
            amount,
            reference: normalize_text(field(&row, "reference"), 50),
        });
    }

    Ok(transfers)
}

/// 导入拨付 CSV 文件，返回写入行数
#[instrument(skip(repo), fields(path = %path.display()))]
pub fn import_transfers_csv(repo: &TreasuryRepository, path: &Path) -> ImportResult<usize> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => {}
        other => {
            return Err(ImportError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            ))
        }
    }

    let transfers = read_transfers(File::open(path)?)?;
    let inserted = repo.insert_transfers(&transfers)?;
    info!(rows = inserted, "国库拨付已导入");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_read_transfers_accepts_be_dates_and_grouped_amounts() {
        let data = "Vendor_ID,Transfer_Date,Amount,Reference\n\
                    10670,20/09/2568,\"1,800.40\",TRF-001\n\
                    ,,,\n\
                    10671,2025-10-05,100,\n";
        let transfers = read_transfers(data.as_bytes()).unwrap();

        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].vendor_id, "10670");
        assert_eq!(transfers[0].transfer_date, NaiveDate::from_ymd_opt(2025, 9, 20).unwrap());
        assert_eq!(transfers[0].amount, 1800.40);
        assert_eq!(transfers[0].reference.as_deref(), Some("TRF-001"));
        assert_eq!(transfers[1].transfer_date, NaiveDate::from_ymd_opt(2025, 10, 5).unwrap());
        assert_eq!(transfers[1].reference, None);
    }

    #[test]
    fn test_bad_row_rejects_file() {
        let data = "vendor_id,transfer_date,amount\n10670,20/09/2568,100\n10670,31/02/2568,50\n";
        match read_transfers(data.as_bytes()) {
            Err(ImportError::InvalidRecord { row, .. }) => assert_eq!(row, 3),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_column() {
        let data = "vendor_id,amount\n10670,100\n";
        assert!(matches!(
            read_transfers(data.as_bytes()),
            Err(ImportError::InvalidRecord { row: 1, .. })
        ));
    }
}

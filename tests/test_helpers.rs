// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、配置写入、xlsx 测试工作簿生成
// ==========================================
#![allow(dead_code)]

use eclaim_recon::config::ConfigManager;
use eclaim_recon::db::{init_schema, open_sqlite_connection};
use eclaim_recon::importer::{ClaimImporter, StatementImporter};
use eclaim_recon::repository::{ClaimRepository, ReconciliationRepository, StatementRepository};
use rusqlite::Connection;
use rust_xlsxwriter::Workbook;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接（同一测试内多个仓储复用）
pub fn shared_connection(db_path: &str) -> Arc<Mutex<Connection>> {
    let conn = open_sqlite_connection(db_path).unwrap();
    Arc::new(Mutex::new(conn))
}

/// 写入 global 配置
pub fn set_config(db_path: &str, key: &str, value: &str) {
    let config = ConfigManager::new(db_path).unwrap();
    config.set_global_config_value(key, value).unwrap();
}

pub fn claim_importer(conn: &Arc<Mutex<Connection>>) -> ClaimImporter<ConfigManager> {
    ClaimImporter::new(
        ClaimRepository::from_connection(conn.clone()),
        ConfigManager::from_connection(conn.clone()).unwrap(),
    )
}

pub fn statement_importer(conn: &Arc<Mutex<Connection>>) -> StatementImporter<ConfigManager> {
    StatementImporter::new(
        StatementRepository::from_connection(conn.clone()),
        ReconciliationRepository::from_connection(conn.clone()),
        ConfigManager::from_connection(conn.clone()).unwrap(),
    )
}

// ==========================================
// 工作簿生成
// ==========================================

/// 一个工作表 = 名称 + 字符串网格（空串不写入）
pub struct SheetData {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl SheetData {
    pub fn new(name: &str, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.to_string(),
            rows,
        }
    }
}

pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

/// 按列号放置单元格
pub fn sparse_row(width: usize, cells: &[(usize, &str)]) -> Vec<String> {
    let mut r = vec![String::new(); width];
    for (col, value) in cells {
        r[*col] = value.to_string();
    }
    r
}

pub fn write_workbook(path: &Path, sheets: &[SheetData]) -> Result<(), Box<dyn Error>> {
    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        for (r, cells) in sheet.rows.iter().enumerate() {
            for (c, value) in cells.iter().enumerate() {
                if !value.is_empty() {
                    worksheet.write_string(r as u32, c as u16, value)?;
                }
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}

// ==========================================
// 理赔报表（UCS 门诊布局）
// ==========================================
// 第 0 行标题，第 1 行表头，第 2 行起数据
// 列: 0=REP No. 1=序号 2=TRAN_ID 3=HN 10=补偿合计
pub const UCS_WIDTH: usize = 34;

pub struct ClaimLine<'a> {
    pub rep_no: &'a str,
    pub tran_id: &'a str,
    pub hn: &'a str,
    pub amount: &'a str,
}

pub fn claim_line<'a>(rep_no: &'a str, tran_id: &'a str, amount: &'a str) -> ClaimLine<'a> {
    ClaimLine {
        rep_no,
        tran_id,
        hn: "HN0001",
        amount,
    }
}

pub fn ucs_op_sheet(lines: &[ClaimLine]) -> SheetData {
    let mut rows = vec![
        row(&["รายงานผลการพิจารณาการจ่ายชดเชย e-Claim"]),
        sparse_row(
            UCS_WIDTH,
            &[
                (0, "REP No."),
                (1, "ลำดับ"),
                (2, "TRAN_ID"),
                (3, "HN"),
                (4, "AN"),
                (5, "PID"),
                (10, "ชดเชยสุทธิ"),
            ],
        ),
    ];
    for (i, line) in lines.iter().enumerate() {
        let seq = (i + 1).to_string();
        rows.push(sparse_row(
            UCS_WIDTH,
            &[
                (0, line.rep_no),
                (1, seq.as_str()),
                (2, line.tran_id),
                (3, line.hn),
                (10, line.amount),
            ],
        ));
    }
    SheetData::new("Data", rows)
}

/// 药品附加表（数据从第 5 行开始，0=TRAN_ID 3=药品代码）
pub fn drug_sheet(items: &[(&str, &str)]) -> SheetData {
    let mut rows = vec![
        row(&["รายการยา"]),
        row(&[]),
        row(&[]),
        row(&[]),
        row(&["TRAN_ID", "HN", "PID", "รหัสยา"]),
    ];
    for &(tran_id, code) in items {
        rows.push(row(&[tran_id, "HN0001", "", code]));
    }
    SheetData::new("Drug", rows)
}

pub fn write_ucs_op_claims(
    dir: &Path,
    filename: &str,
    lines: &[ClaimLine],
) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.join(filename);
    write_workbook(&path, &[ucs_op_sheet(lines)])?;
    Ok(path)
}

// ==========================================
// 结算单
// ==========================================
// 明细表: 表头块 → 分段标记 → 列头 → 数据 → 合计
// 列: 0=REP 1=TRAN_ID 6=入院日期 14=实付
pub const DETAIL_WIDTH: usize = 16;

pub fn statement_detail_row(rep_no: &str, tran_id: &str, paid: &str) -> Vec<String> {
    sparse_row(
        DETAIL_WIDTH,
        &[
            (0, rep_no),
            (1, tran_id),
            (2, "HN0001"),
            (6, "01/09/2568 08:30:00"),
            (14, paid),
        ],
    )
}

pub fn statement_detail_sheet(items: &[(&str, &str, &str)]) -> SheetData {
    let mut rows = vec![
        row(&["รายงานการจ่ายชดเชย วันที่ 15/10/2568"]),
        row(&["หน่วยบริการ: 10670 - โรงพยาบาลตัวอย่าง จังหวัด ขอนแก่น"]),
        row(&["เลขที่เอกสาร: 10670/IP/001"]),
        row(&[]),
        row(&["ข้อมูลปกติ"]),
        row(&["REP No.", "TRAN_ID", "HN", "AN", "PID"]),
    ];
    for &(rep_no, tran_id, paid) in items {
        rows.push(statement_detail_row(rep_no, tran_id, paid));
    }
    rows.push(sparse_row(DETAIL_WIDTH, &[(0, "รวม"), (14, "0")]));
    SheetData::new("รายละเอียด", rows)
}

pub fn statement_rep_sheet(reps: &[(&str, &str, &str)]) -> SheetData {
    let mut rows = vec![row(&[
        "REP",
        "จำนวนราย",
        "เรียกเก็บ",
        "ชดเชย",
        "หักเงิน",
        "ชดเชยสุทธิ",
    ])];
    for &(rep_no, cases, net) in reps {
        rows.push(row(&[rep_no, cases, net, net, "0", net]));
    }
    SheetData::new("สรุป REP", rows)
}

pub fn write_statement(
    dir: &Path,
    filename: &str,
    items: &[(&str, &str, &str)],
) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.join(filename);
    write_workbook(
        &path,
        &[
            statement_detail_sheet(items),
            statement_rep_sheet(&[("REP1", "1", "500")]),
        ],
    )?;
    Ok(path)
}

/// 读取单个整数（测试断言用）
pub fn query_i64(conn: &Arc<Mutex<Connection>>, sql: &str) -> i64 {
    let conn = conn.lock().unwrap();
    conn.query_row(sql, [], |r| r.get(0)).unwrap()
}

// ==========================================
// E-Claim 对账核心 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 / busy_timeout）
// - init_schema 幂等建表，claim_rep 列由映射表生成
// ==========================================

use crate::importer::column_maps::{claim_columns, Column, ALL_AUX_SHEETS};
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前建表脚本对应的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "ECLAIM_RECON_DB_PATH";

/// 默认数据库文件名
pub const DEFAULT_DB_FILE: &str = "eclaim_recon.db";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// foreign_keys / busy_timeout 都是连接级设置，每个连接都要执行
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 默认数据库路径: 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        if !path.trim().is_empty() {
            return path;
        }
    }

    if let Some(data_dir) = dirs::data_dir() {
        let app_dir = data_dir.join("eclaim-recon");
        if std::fs::create_dir_all(&app_dir).is_ok() {
            return app_dir.join(DEFAULT_DB_FILE).to_string_lossy().to_string();
        }
    }

    PathBuf::from(".")
        .join(DEFAULT_DB_FILE)
        .to_string_lossy()
        .to_string()
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

fn column_ddl(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|c| {
            if c.name == "tran_id" {
                format!("    {} {} NOT NULL", c.name, c.kind.sql_type())
            } else {
                format!("    {} {}", c.name, c.kind.sql_type())
            }
        })
        .collect::<Vec<_>>()
        .join(",\n")
}

/// claim_rep 建表语句（列 = 五个变体映射表的并集）
pub fn claim_rep_ddl() -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS claim_rep (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES eclaim_imported_files(id) ON DELETE CASCADE,
    row_number INTEGER NOT NULL,
    scheme TEXT NOT NULL,
{},
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (tran_id, file_id)
);
CREATE INDEX IF NOT EXISTS idx_claim_rep_tran_id ON claim_rep(tran_id);
CREATE INDEX IF NOT EXISTS idx_claim_rep_rep_no ON claim_rep(rep_no);
"#,
        column_ddl(claim_columns())
    )
}

/// 附加工作表建表语句
pub fn aux_tables_ddl() -> String {
    ALL_AUX_SHEETS
        .iter()
        .map(|spec| {
            format!(
                r#"
CREATE TABLE IF NOT EXISTS {table} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES eclaim_imported_files(id) ON DELETE CASCADE,
    row_number INTEGER NOT NULL,
{columns},
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_{table}_file_id ON {table}(file_id);
"#,
                table = spec.table,
                columns = column_ddl(&spec.columns()).replace(" NOT NULL", "")
            )
        })
        .collect()
}

const BASE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL DEFAULT 'global',
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS eclaim_imported_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL UNIQUE,
    file_type TEXT,
    scheme TEXT,
    hospital_code TEXT,
    file_date TEXT,
    file_sequence TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    total_records INTEGER NOT NULL DEFAULT 0,
    imported_records INTEGER NOT NULL DEFAULT 0,
    failed_records INTEGER NOT NULL DEFAULT 0,
    error_message TEXT,
    import_started_at TEXT,
    import_completed_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS stm_imported_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL UNIQUE,
    hospital_code TEXT,
    hospital_name TEXT,
    province TEXT,
    document_no TEXT,
    report_date TEXT,
    patient_kind TEXT,
    scheme TEXT,
    period_month TEXT,
    file_sequence TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    total_records INTEGER NOT NULL DEFAULT 0,
    imported_records INTEGER NOT NULL DEFAULT 0,
    failed_records INTEGER NOT NULL DEFAULT 0,
    error_message TEXT,
    import_started_at TEXT,
    import_completed_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS stm_summary (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES stm_imported_files(id) ON DELETE CASCADE,
    snapshot_id TEXT NOT NULL,
    sheet_name TEXT NOT NULL,
    row_number INTEGER NOT NULL,
    summary_kind TEXT NOT NULL,
    data_type TEXT NOT NULL,
    rep_no TEXT,
    description TEXT,
    case_count INTEGER NOT NULL DEFAULT 0,
    claim_amount REAL NOT NULL DEFAULT 0,
    compensation REAL NOT NULL DEFAULT 0,
    deduction REAL NOT NULL DEFAULT 0,
    net_paid REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_stm_summary_file ON stm_summary(file_id, snapshot_id);

CREATE TABLE IF NOT EXISTS stm_claim_item (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES stm_imported_files(id) ON DELETE CASCADE,
    sheet_name TEXT NOT NULL,
    row_number INTEGER NOT NULL,
    data_type TEXT NOT NULL,
    rep_no TEXT,
    tran_id TEXT NOT NULL,
    hn TEXT,
    an TEXT,
    pid TEXT,
    patient_name TEXT,
    admission_date TEXT,
    discharge_date TEXT,
    drg TEXT,
    rw REAL NOT NULL DEFAULT 0,
    adjrw REAL NOT NULL DEFAULT 0,
    claim_amount REAL NOT NULL DEFAULT 0,
    compensation REAL NOT NULL DEFAULT 0,
    deduction REAL NOT NULL DEFAULT 0,
    total_paid REAL NOT NULL DEFAULT 0,
    remark TEXT,
    reconciliation_status TEXT,
    reconciliation_diff REAL,
    reconciled_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (file_id, tran_id)
);
CREATE INDEX IF NOT EXISTS idx_stm_claim_item_tran_id ON stm_claim_item(tran_id);

CREATE TABLE IF NOT EXISTS treasury_transfer (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    vendor_id TEXT NOT NULL,
    transfer_date TEXT NOT NULL,
    amount REAL NOT NULL,
    reference TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_treasury_vendor_date ON treasury_transfer(vendor_id, transfer_date);
"#;

/// 幂等建表并登记 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(BASE_SCHEMA)?;
    conn.execute_batch(&claim_rep_ddl())?;
    conn.execute_batch(&aux_tables_ddl())?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    tracing::debug!(version = CURRENT_SCHEMA_VERSION, "数据库结构已就绪");
    Ok(())
}

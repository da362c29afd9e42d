// ==========================================
// E-Claim 对账核心 - 导入文件生命周期（共用）
// ==========================================
// 职责: eclaim_imported_files / stm_imported_files 的状态流转
//   pending → processing → completed | failed
//   pending → failed（批次取消，未开始的文件）
// 约束: 同一 filename 只有一行；重导入重置状态并清空完成/错误字段
// ==========================================

use crate::domain::types::ImportStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_dialect::{build_upsert_clause, SqlDialect};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, ToSql, Transaction};
use tracing::warn;

/// 文件登记表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileTable {
    Claim,
    Statement,
}

impl FileTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            FileTable::Claim => "eclaim_imported_files",
            FileTable::Statement => "stm_imported_files",
        }
    }
}

// ==========================================
// PagedWrite - 分页写入结果
// ==========================================
// committed: 已提交页中的行数；error: 失败页的错误（该页已回滚）
#[derive(Debug, Default)]
pub struct PagedWrite {
    pub committed: usize,
    pub error: Option<RepositoryError>,
}

impl PagedWrite {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// 逐页写入，每页一个事务；某页失败即停止并返回已提交数
pub(crate) fn write_in_pages<T, F>(
    conn: &Connection,
    rows: &[T],
    batch_size: usize,
    mut write_row: F,
) -> PagedWrite
where
    F: FnMut(&Transaction, &T) -> RepositoryResult<()>,
{
    let mut outcome = PagedWrite::default();

    for (page_no, page) in rows.chunks(batch_size.max(1)).enumerate() {
        let result = (|| -> RepositoryResult<usize> {
            let tx = conn.unchecked_transaction()?;
            for row in page {
                write_row(&tx, row)?;
            }
            tx.commit()?;
            Ok(page.len())
        })();

        match result {
            Ok(n) => outcome.committed += n,
            Err(e) => {
                warn!(page_no, committed = outcome.committed, error = %e, "分页写入失败，本页已回滚");
                outcome.error = Some(e);
                break;
            }
        }
    }

    outcome
}

/// 生成 "开始导入" UPSERT 语句
///
/// 冲突时用本次值覆盖元数据列，并把状态/计数/完成字段重置
pub fn begin_import_sql(dialect: SqlDialect, table: FileTable, meta_columns: &[&str]) -> String {
    let mut columns: Vec<&str> = vec!["filename"];
    columns.extend_from_slice(meta_columns);
    columns.extend_from_slice(&[
        "status",
        "total_records",
        "imported_records",
        "failed_records",
        "error_message",
        "import_started_at",
        "import_completed_at",
        "updated_at",
    ]);

    let placeholders = vec!["?"; columns.len()].join(", ");
    let update_columns: Vec<&str> = columns.iter().skip(1).copied().collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({}) {}",
        table.table_name(),
        columns.join(", "),
        placeholders,
        build_upsert_clause(dialect, &["filename"], &update_columns)
    )
}

/// 开始导入: upsert-by-filename → processing，返回文件 id
///
/// `meta` 与 `meta_columns` 一一对应
pub(crate) fn begin_import(
    conn: &Connection,
    dialect: SqlDialect,
    table: FileTable,
    filename: &str,
    meta_columns: &[&str],
    meta: &[&dyn ToSql],
) -> RepositoryResult<i64> {
    let sql = begin_import_sql(dialect, table, meta_columns);
    let now = Utc::now().to_rfc3339();
    let status = ImportStatus::Processing.as_str();
    let zero: i64 = 0;
    let null: Option<String> = None;

    let mut values: Vec<&dyn ToSql> = vec![&filename];
    values.extend_from_slice(meta);
    values.push(&status);
    values.push(&zero); // total_records
    values.push(&zero); // imported_records
    values.push(&zero); // failed_records
    values.push(&null); // error_message
    values.push(&now);
    values.push(&null); // import_completed_at
    values.push(&now);

    conn.execute(&sql, rusqlite::params_from_iter(values))?;

    let id: i64 = conn.query_row(
        &format!("SELECT id FROM {} WHERE filename = ?1", table.table_name()),
        params![filename],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// 登记为 pending（已存在则不动），返回文件 id
pub(crate) fn register_pending(
    conn: &Connection,
    dialect: SqlDialect,
    table: FileTable,
    filename: &str,
) -> RepositoryResult<i64> {
    let sql = format!(
        "INSERT INTO {} (filename, status) VALUES (?, ?) {}",
        table.table_name(),
        build_upsert_clause(dialect, &["filename"], &[])
    );
    conn.execute(&sql, params![filename, ImportStatus::Pending.as_str()])?;

    let id: i64 = conn.query_row(
        &format!("SELECT id FROM {} WHERE filename = ?1", table.table_name()),
        params![filename],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// 取消未开始的文件: 仍为 pending 的登记行置为 failed
///
/// 已有终态的文件（之前导入过）保持原状，返回 None
pub(crate) fn fail_pending(
    conn: &Connection,
    table: FileTable,
    filename: &str,
    message: &str,
) -> RepositoryResult<Option<i64>> {
    let now = Utc::now().to_rfc3339();
    let affected = conn.execute(
        &format!(
            "UPDATE {} SET status = ?1, error_message = ?2, import_completed_at = ?3, updated_at = ?3
             WHERE filename = ?4 AND status = ?5",
            table.table_name()
        ),
        params![
            ImportStatus::Failed.as_str(),
            message,
            now,
            filename,
            ImportStatus::Pending.as_str()
        ],
    )?;
    if affected == 0 {
        return Ok(None);
    }

    let id = conn
        .query_row(
            &format!("SELECT id FROM {} WHERE filename = ?1", table.table_name()),
            params![filename],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// 终态: completed
pub(crate) fn mark_completed(
    conn: &Connection,
    table: FileTable,
    file_id: i64,
    total: usize,
    imported: usize,
    failed: usize,
) -> RepositoryResult<()> {
    let now = Utc::now().to_rfc3339();
    let affected = conn.execute(
        &format!(
            "UPDATE {} SET status = ?1, total_records = ?2, imported_records = ?3, failed_records = ?4,
                 error_message = NULL, import_completed_at = ?5, updated_at = ?5
             WHERE id = ?6",
            table.table_name()
        ),
        params![
            ImportStatus::Completed.as_str(),
            total as i64,
            imported as i64,
            failed as i64,
            now,
            file_id
        ],
    )?;
    ensure_found(affected, table, file_id)
}

/// 终态: failed（保留已提交计数与错误信息）
pub(crate) fn mark_failed(
    conn: &Connection,
    table: FileTable,
    file_id: i64,
    total: usize,
    imported: usize,
    failed: usize,
    message: &str,
) -> RepositoryResult<()> {
    let now = Utc::now().to_rfc3339();
    let affected = conn.execute(
        &format!(
            "UPDATE {} SET status = ?1, total_records = ?2, imported_records = ?3, failed_records = ?4,
                 error_message = ?5, import_completed_at = ?6, updated_at = ?6
             WHERE id = ?7",
            table.table_name()
        ),
        params![
            ImportStatus::Failed.as_str(),
            total as i64,
            imported as i64,
            failed as i64,
            message,
            now,
            file_id
        ],
    )?;
    ensure_found(affected, table, file_id)
}

/// 查询文件状态
pub(crate) fn get_status(
    conn: &Connection,
    table: FileTable,
    file_id: i64,
) -> RepositoryResult<Option<ImportStatus>> {
    let result = conn.query_row(
        &format!("SELECT status FROM {} WHERE id = ?1", table.table_name()),
        params![file_id],
        |row| row.get::<_, String>(0),
    );
    match result {
        Ok(raw) => Ok(ImportStatus::parse(&raw)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn ensure_found(affected: usize, table: FileTable, file_id: i64) -> RepositoryResult<()> {
    if affected == 0 {
        return Err(RepositoryError::NotFound {
            entity: table.table_name().to_string(),
            id: file_id.to_string(),
        });
    }
    Ok(())
}

/// RFC3339 文本 → UTC 时间（格式不符返回 None）
pub(crate) fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_import_sql_resets_lifecycle_columns() {
        let sql = begin_import_sql(SqlDialect::Sqlite, FileTable::Claim, &["file_type"]);
        assert!(sql.starts_with("INSERT INTO eclaim_imported_files (filename, file_type, status"));
        assert!(sql.contains("ON CONFLICT(filename) DO UPDATE SET file_type = excluded.file_type"));
        assert!(sql.contains("error_message = excluded.error_message"));
        assert!(sql.contains("import_completed_at = excluded.import_completed_at"));
        assert!(!sql.contains("filename = excluded.filename"));
    }

    #[test]
    fn test_begin_import_sql_mysql() {
        let sql = begin_import_sql(SqlDialect::MySql, FileTable::Statement, &["scheme"]);
        assert!(sql.starts_with("INSERT INTO stm_imported_files"));
        assert!(sql.contains("ON DUPLICATE KEY UPDATE scheme = VALUES(scheme)"));
    }

    #[test]
    fn test_write_in_pages_stops_on_failure() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER NOT NULL UNIQUE)").unwrap();

        // 第三页出现重复值 → 第三页回滚
        let rows = vec![1, 2, 3, 4, 4, 5];
        let outcome = write_in_pages(&conn, &rows, 2, |tx, v| {
            tx.execute("INSERT INTO t (v) VALUES (?1)", params![v])?;
            Ok(())
        });

        assert_eq!(outcome.committed, 4);
        assert!(outcome.error.is_some());
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 4);
    }

    fn file_table(conn: &Connection) {
        conn.execute_batch(
            "CREATE TABLE eclaim_imported_files (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 filename TEXT NOT NULL UNIQUE,
                 status TEXT NOT NULL,
                 error_message TEXT,
                 import_completed_at TEXT,
                 updated_at TEXT
             )",
        )
        .unwrap();
    }

    #[test]
    fn test_pending_then_cancelled_ends_failed() {
        let conn = Connection::open_in_memory().unwrap();
        file_table(&conn);

        let id = register_pending(&conn, SqlDialect::Sqlite, FileTable::Claim, "a.xls").unwrap();
        assert_eq!(
            get_status(&conn, FileTable::Claim, id).unwrap(),
            Some(ImportStatus::Pending)
        );

        let failed = fail_pending(&conn, FileTable::Claim, "a.xls", "cancelled").unwrap();
        assert_eq!(failed, Some(id));
        assert_eq!(
            get_status(&conn, FileTable::Claim, id).unwrap(),
            Some(ImportStatus::Failed)
        );
    }

    #[test]
    fn test_pending_does_not_touch_finished_files() {
        let conn = Connection::open_in_memory().unwrap();
        file_table(&conn);
        conn.execute(
            "INSERT INTO eclaim_imported_files (filename, status) VALUES ('b.xls', 'completed')",
            [],
        )
        .unwrap();

        let id = register_pending(&conn, SqlDialect::Sqlite, FileTable::Claim, "b.xls").unwrap();
        assert_eq!(
            get_status(&conn, FileTable::Claim, id).unwrap(),
            Some(ImportStatus::Completed)
        );
        assert_eq!(fail_pending(&conn, FileTable::Claim, "b.xls", "cancelled").unwrap(), None);
        assert_eq!(
            get_status(&conn, FileTable::Claim, id).unwrap(),
            Some(ImportStatus::Completed)
        );
    }
}

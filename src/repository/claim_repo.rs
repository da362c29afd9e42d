// ==========================================
// E-Claim 对账核心 - 理赔数据仓储
// ==========================================
// 职责: eclaim_imported_files 生命周期 + claim_rep upsert + 附加工作表替换
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::claim::{FieldValue, FileMetadata, ImportedFile, MappedRow};
use crate::domain::types::{FileType, ImportStatus};
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_lifecycle::{self, parse_timestamp, FileTable, PagedWrite};
use crate::repository::sql_dialect::{build_upsert_clause, SqlDialect};
use chrono::{NaiveDate, Utc};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params, Connection, ToSql, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// FieldValue → SQL 参数
// ==========================================
impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Null => ToSqlOutput::Owned(Value::Null),
            FieldValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            FieldValue::Date(d) => ToSqlOutput::Owned(Value::Text(d.format("%Y-%m-%d").to_string())),
            FieldValue::DateTime(dt) => {
                ToSqlOutput::Owned(Value::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            }
            FieldValue::Amount(v) => ToSqlOutput::Owned(Value::Real(*v)),
            FieldValue::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
        })
    }
}

/// claim_rep 冲突键
pub const CLAIM_CONFLICT_KEY: &[&str] = &["tran_id", "file_id"];

/// 生成 claim_rep UPSERT 语句（列顺序与 MappedRow.fields 一致）
///
/// 冲突时覆盖全部非键列，updated_at 由参数传入
pub fn claim_upsert_sql(dialect: SqlDialect, field_columns: &[&str]) -> String {
    let mut columns: Vec<&str> = vec!["file_id", "row_number", "scheme"];
    columns.extend_from_slice(field_columns);
    columns.push("updated_at");

    let update_columns: Vec<&str> = columns
        .iter()
        .copied()
        .filter(|c| !CLAIM_CONFLICT_KEY.contains(c))
        .collect();

    format!(
        "INSERT INTO claim_rep ({}) VALUES ({}) {}",
        columns.join(", "),
        vec!["?"; columns.len()].join(", "),
        build_upsert_clause(dialect, CLAIM_CONFLICT_KEY, &update_columns)
    )
}

// ==========================================
// ClaimRepository - 理赔仓储
// ==========================================
pub struct ClaimRepository {
    conn: Arc<Mutex<Connection>>,
    dialect: SqlDialect,
}

impl ClaimRepository {
    /// 创建新的 ClaimRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            dialect: SqlDialect::Sqlite,
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            dialect: SqlDialect::Sqlite,
        }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 文件生命周期 =====

    /// 开始导入（upsert-by-filename → processing），返回 file_id
    pub fn begin_import(
        &self,
        filename: &str,
        meta: &FileMetadata,
        file_type: Option<FileType>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let file_type_str = file_type.map(|t| t.token());
        let scheme = file_type.map(|t| t.scheme_code());
        let file_date = meta.file_date.map(|d| d.format("%Y-%m-%d").to_string());

        import_lifecycle::begin_import(
            &conn,
            self.dialect,
            FileTable::Claim,
            filename,
            &[
                "file_type",
                "scheme",
                "hospital_code",
                "file_date",
                "file_sequence",
            ],
            &[
                &file_type_str as &dyn ToSql,
                &scheme,
                &meta.hospital_code,
                &file_date,
                &meta.sequence,
            ],
        )
    }

    /// 批量调度前登记为 pending
    pub fn register_pending(&self, filename: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        import_lifecycle::register_pending(&conn, self.dialect, FileTable::Claim, filename)
    }

    pub fn fail_pending(&self, filename: &str, message: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        import_lifecycle::fail_pending(&conn, FileTable::Claim, filename, message)
    }

    pub fn mark_completed(
        &self,
        file_id: i64,
        total: usize,
        imported: usize,
        failed: usize,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        import_lifecycle::mark_completed(&conn, FileTable::Claim, file_id, total, imported, failed)
    }

    pub fn mark_failed(
        &self,
        file_id: i64,
        total: usize,
        imported: usize,
        failed: usize,
        message: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        import_lifecycle::mark_failed(
            &conn,
            FileTable::Claim,
            file_id,
            total,
            imported,
            failed,
            message,
        )
    }

    pub fn get_status(&self, file_id: i64) -> RepositoryResult<Option<ImportStatus>> {
        let conn = self.get_conn()?;
        import_lifecycle::get_status(&conn, FileTable::Claim, file_id)
    }

    /// 按文件名查询导入记录
    pub fn find_file_by_name(&self, filename: &str) -> RepositoryResult<Option<ImportedFile>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            r#"
            SELECT id, filename, file_type, scheme, hospital_code, file_date, file_sequence,
                   status, total_records, imported_records, failed_records, error_message,
                   import_started_at, import_completed_at
            FROM eclaim_imported_files
            WHERE filename = ?1
            "#,
            params![filename],
            |row| {
                Ok(ImportedFile {
                    id: row.get(0)?,
                    filename: row.get(1)?,
                    file_type: row.get(2)?,
                    scheme: row.get(3)?,
                    hospital_code: row.get(4)?,
                    file_date: row
                        .get::<_, Option<String>>(5)?
                        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
                    file_sequence: row.get(6)?,
                    status: ImportStatus::parse(&row.get::<_, String>(7)?)
                        .unwrap_or(ImportStatus::Pending),
                    total_records: row.get(8)?,
                    imported_records: row.get(9)?,
                    failed_records: row.get(10)?,
                    error_message: row.get(11)?,
                    import_started_at: parse_timestamp(row.get(12)?),
                    import_completed_at: parse_timestamp(row.get(13)?),
                })
            },
        );

        match result {
            Ok(file) => Ok(Some(file)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 导入文件登记表行数（按文件名）
    pub fn count_files_named(&self, filename: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row(
            "SELECT COUNT(*) FROM eclaim_imported_files WHERE filename = ?1",
            params![filename],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    // ===== 理赔行 =====

    /// 分页 upsert 理赔行（每页一个事务）
    ///
    /// 同一文件的行来自同一映射表，列顺序取第一行
    pub fn upsert_claims_paged(&self, rows: &[MappedRow], batch_size: usize) -> PagedWrite {
        let Some(first) = rows.first() else {
            return PagedWrite::default();
        };
        let field_columns: Vec<&str> = first.fields.iter().map(|(name, _)| *name).collect();
        let sql = claim_upsert_sql(self.dialect, &field_columns);
        let now = Utc::now().to_rfc3339();

        let conn = match self.get_conn() {
            Ok(conn) => conn,
            Err(e) => {
                return PagedWrite {
                    committed: 0,
                    error: Some(e),
                }
            }
        };

        import_lifecycle::write_in_pages(&conn, rows, batch_size, |tx, row| {
            Self::upsert_claim_tx(tx, &sql, row, &now)
        })
    }

    fn upsert_claim_tx(
        tx: &Transaction,
        sql: &str,
        row: &MappedRow,
        now: &str,
    ) -> RepositoryResult<()> {
        let row_number = row.row_number as i64;
        let mut values: Vec<&dyn ToSql> = Vec::with_capacity(row.fields.len() + 4);
        values.push(&row.file_id);
        values.push(&row_number);
        values.push(&row.scheme);
        for (_, value) in &row.fields {
            values.push(value);
        }
        values.push(&now);

        let mut stmt = tx.prepare_cached(sql)?;
        stmt.execute(rusqlite::params_from_iter(values))?;
        Ok(())
    }

    /// 某文件在 claim_rep 中的行数
    pub fn count_claims(&self, file_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row(
            "SELECT COUNT(*) FROM claim_rep WHERE file_id = ?1",
            params![file_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    // ===== 附加工作表 =====

    /// 替换某文件在附加表中的全部行（单事务: 先删后插）
    ///
    /// # 参数
    /// - `table`: 附加表名（来自静态映射表）
    pub fn replace_additional_rows(
        &self,
        table: &str,
        file_id: i64,
        rows: &[MappedRow],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            &format!("DELETE FROM {} WHERE file_id = ?1", table),
            params![file_id],
        )?;

        if let Some(first) = rows.first() {
            let mut columns: Vec<&str> = vec!["file_id", "row_number"];
            columns.extend(first.fields.iter().map(|(name, _)| *name));
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns.join(", "),
                vec!["?"; columns.len()].join(", ")
            );

            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                let row_number = row.row_number as i64;
                let mut values: Vec<&dyn ToSql> = Vec::with_capacity(row.fields.len() + 2);
                values.push(&file_id);
                values.push(&row_number);
                for (_, value) in &row.fields {
                    values.push(value);
                }
                stmt.execute(rusqlite::params_from_iter(values))?;
            }
        }

        tx.commit()?;
        Ok(rows.len())
    }

    /// 某文件在附加表中的行数
    pub fn count_additional_rows(&self, table: &str, file_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE file_id = ?1", table),
            params![file_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn repo() -> ClaimRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ClaimRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn claim_row(file_id: i64, tran_id: &str, amount: f64) -> MappedRow {
        MappedRow {
            file_id,
            row_number: 6,
            scheme: "UCS".to_string(),
            fields: vec![
                ("tran_id", FieldValue::Text(tran_id.to_string())),
                ("hn", FieldValue::Null),
                ("reimbursement_total", FieldValue::Amount(amount)),
            ],
        }
    }

    #[test]
    fn test_claim_upsert_sql_excludes_key_from_updates() {
        let sql = claim_upsert_sql(SqlDialect::Sqlite, &["tran_id", "hn"]);
        assert!(sql.contains("ON CONFLICT(tran_id, file_id) DO UPDATE SET row_number = excluded.row_number"));
        assert!(sql.contains("hn = excluded.hn"));
        assert!(!sql.contains("tran_id = excluded.tran_id"));

        let mysql = claim_upsert_sql(SqlDialect::MySql, &["tran_id", "hn"]);
        assert!(mysql.contains("ON DUPLICATE KEY UPDATE row_number = VALUES(row_number)"));
    }

    #[test]
    fn test_begin_import_same_filename_single_row() {
        let repo = repo();
        let meta = FileMetadata::default();
        let id1 = repo.begin_import("a.xls", &meta, Some(FileType::Op)).unwrap();
        repo.mark_failed(id1, 3, 1, 2, "boom").unwrap();

        let id2 = repo.begin_import("a.xls", &meta, Some(FileType::Op)).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(repo.count_files_named("a.xls").unwrap(), 1);

        let file = repo.find_file_by_name("a.xls").unwrap().unwrap();
        assert_eq!(file.status, ImportStatus::Processing);
        assert_eq!(file.error_message, None);
        assert_eq!(file.import_completed_at, None);
        assert_eq!(file.imported_records, 0);
        assert_eq!(file.scheme.as_deref(), Some("UCS"));
    }

    #[test]
    fn test_upsert_claims_overwrites_on_conflict() {
        let repo = repo();
        let file_id = repo
            .begin_import("b.xls", &FileMetadata::default(), None)
            .unwrap();

        let outcome = repo.upsert_claims_paged(&[claim_row(file_id, "T1", 10.0)], 100);
        assert!(outcome.is_ok());
        let outcome = repo.upsert_claims_paged(&[claim_row(file_id, "T1", 20.0)], 100);
        assert_eq!(outcome.committed, 1);

        assert_eq!(repo.count_claims(file_id).unwrap(), 1);
        let conn = repo.get_conn().unwrap();
        let amount: f64 = conn
            .query_row(
                "SELECT reimbursement_total FROM claim_rep WHERE tran_id = 'T1'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(amount, 20.0);
    }

    #[test]
    fn test_replace_additional_rows_is_idempotent() {
        let repo = repo();
        let file_id = repo
            .begin_import("c.xls", &FileMetadata::default(), None)
            .unwrap();
        let rows = vec![
            MappedRow {
                file_id,
                row_number: 6,
                scheme: "UCS".to_string(),
                fields: vec![
                    ("tran_id", FieldValue::Text("T1".to_string())),
                    ("item_code", FieldValue::Text("D1".to_string())),
                ],
            };
            3
        ];

        repo.replace_additional_rows("claim_rep_drug", file_id, &rows).unwrap();
        repo.replace_additional_rows("claim_rep_drug", file_id, &rows).unwrap();
        assert_eq!(repo.count_additional_rows("claim_rep_drug", file_id).unwrap(), 3);
    }
}

// ==========================================
// E-Claim 对账核心 - 结算单数据仓储
// ==========================================
// 职责: stm_imported_files 生命周期 / stm_summary 追加 / stm_claim_item upsert
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::statement::{
    StatementClaimItem, StatementFileName, StatementHeader, StatementItemView,
    StatementSummaryRow,
};
use crate::domain::types::{ImportStatus, PatientKind, ReconStatus};
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_lifecycle::{self, FileTable, PagedWrite};
use crate::repository::sql_dialect::{build_upsert_clause, SqlDialect};
use chrono::Utc;
use rusqlite::{params, Connection, ToSql, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};

const ITEM_COLUMNS: &[&str] = &[
    "file_id",
    "sheet_name",
    "row_number",
    "data_type",
    "rep_no",
    "tran_id",
    "hn",
    "an",
    "pid",
    "patient_name",
    "admission_date",
    "discharge_date",
    "drg",
    "rw",
    "adjrw",
    "claim_amount",
    "compensation",
    "deduction",
    "total_paid",
    "remark",
    "updated_at",
];

/// 生成 stm_claim_item UPSERT 语句；冲突键 (file_id, tran_id)
///
/// 冲突时不覆盖对账结果列，由下一次对账刷新
pub fn item_upsert_sql(dialect: SqlDialect) -> String {
    let update_columns: Vec<&str> = ITEM_COLUMNS
        .iter()
        .copied()
        .filter(|c| *c != "file_id" && *c != "tran_id")
        .collect();
    format!(
        "INSERT INTO stm_claim_item ({}) VALUES ({}) {}",
        ITEM_COLUMNS.join(", "),
        vec!["?"; ITEM_COLUMNS.len()].join(", "),
        build_upsert_clause(dialect, &["file_id", "tran_id"], &update_columns)
    )
}

// ==========================================
// StatementRepository - 结算单仓储
// ==========================================
pub struct StatementRepository {
    conn: Arc<Mutex<Connection>>,
    dialect: SqlDialect,
}

impl StatementRepository {
    /// 创建新的 StatementRepository 实例
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

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 文件生命周期 =====

    /// 开始导入，文件名元数据先写入；表头块信息在解析后补写
    pub fn begin_import(&self, filename: &str, meta: &StatementFileName) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let patient_kind = meta.patient_kind.map(|k| match k {
            PatientKind::Ip => "IP",
            PatientKind::Op => "OP",
        });
        let scheme = meta.scheme.map(|s| s.as_str());
        let period_month = meta.period_month.map(|d| d.format("%Y-%m-%d").to_string());

        import_lifecycle::begin_import(
            &conn,
            self.dialect,
            FileTable::Statement,
            filename,
            &[
                "hospital_code",
                "patient_kind",
                "scheme",
                "period_month",
                "file_sequence",
            ],
            &[
                &meta.hospital_code as &dyn ToSql,
                &patient_kind,
                &scheme,
                &period_month,
                &meta.sequence,
            ],
        )
    }

    /// 写入表头块信息；医院代码以文件名为准，缺失时才用表头
    pub fn update_header(&self, file_id: i64, header: &StatementHeader) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            UPDATE stm_imported_files
            SET hospital_code = COALESCE(hospital_code, ?1),
                hospital_name = ?2,
                province = ?3,
                document_no = ?4,
                report_date = ?5,
                updated_at = ?6
            WHERE id = ?7
            "#,
            params![
                header.hospital_code,
                header.hospital_name,
                header.province,
                header.document_no,
                header.report_date.map(|d| d.format("%Y-%m-%d").to_string()),
                Utc::now().to_rfc3339(),
                file_id
            ],
        )?;
        Ok(())
    }

    pub fn register_pending(&self, filename: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        import_lifecycle::register_pending(&conn, self.dialect, FileTable::Statement, filename)
    }

    pub fn fail_pending(&self, filename: &str, message: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        import_lifecycle::fail_pending(&conn, FileTable::Statement, filename, message)
    }

    pub fn mark_completed(
        &self,
        file_id: i64,
        total: usize,
        imported: usize,
        failed: usize,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        import_lifecycle::mark_completed(
            &conn,
            FileTable::Statement,
            file_id,
            total,
            imported,
            failed,
        )
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
            FileTable::Statement,
            file_id,
            total,
            imported,
            failed,
            message,
        )
    }

    pub fn get_status(&self, file_id: i64) -> RepositoryResult<Option<ImportStatus>> {
        let conn = self.get_conn()?;
        import_lifecycle::get_status(&conn, FileTable::Statement, file_id)
    }

    // ===== 汇总行（纯追加） =====

    /// 追加汇总行，整批一个事务；snapshot_id 标识本次导入
    pub fn append_summaries(
        &self,
        file_id: i64,
        snapshot_id: &str,
        rows: &[StatementSummaryRow],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO stm_summary (
                    file_id, snapshot_id, sheet_name, row_number, summary_kind, data_type,
                    rep_no, description, case_count, claim_amount, compensation, deduction, net_paid
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )?;
            for row in rows {
                stmt.execute(params![
                    file_id,
                    snapshot_id,
                    row.sheet_name,
                    row.row_number as i64,
                    row.summary_kind.as_str(),
                    row.data_type.as_str(),
                    row.rep_no,
                    row.description,
                    row.case_count,
                    row.claim_amount,
                    row.compensation,
                    row.deduction,
                    row.net_paid,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// 某文件的汇总快照数（每次导入一个）
    pub fn count_snapshots(&self, file_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row(
            "SELECT COUNT(DISTINCT snapshot_id) FROM stm_summary WHERE file_id = ?1",
            params![file_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    // ===== 明细行 =====

    /// 分页 upsert 明细行（每页一个事务）
    pub fn upsert_items_paged(
        &self,
        file_id: i64,
        items: &[StatementClaimItem],
        batch_size: usize,
    ) -> PagedWrite {
        let sql = item_upsert_sql(self.dialect);
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

        import_lifecycle::write_in_pages(&conn, items, batch_size, |tx, item| {
            Self::upsert_item_tx(tx, &sql, file_id, item, &now)
        })
    }

    fn upsert_item_tx(
        tx: &Transaction,
        sql: &str,
        file_id: i64,
        item: &StatementClaimItem,
        now: &str,
    ) -> RepositoryResult<()> {
        let fmt_dt = |dt: Option<chrono::NaiveDateTime>| {
            dt.map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        };
        let mut stmt = tx.prepare_cached(sql)?;
        stmt.execute(params![
            file_id,
            item.sheet_name,
            item.row_number as i64,
            item.data_type.as_str(),
            item.rep_no,
            item.tran_id,
            item.hn,
            item.an,
            item.pid,
            item.patient_name,
            fmt_dt(item.admission_date),
            fmt_dt(item.discharge_date),
            item.drg,
            item.rw,
            item.adjrw,
            item.claim_amount,
            item.compensation,
            item.deduction,
            item.total_paid,
            item.remark,
            now,
        ])?;
        Ok(())
    }

    /// 明细行 + 对账结果（可按文件过滤）
    pub fn list_items_view(&self, file_id: Option<i64>) -> RepositoryResult<Vec<StatementItemView>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT i.file_id, f.filename, i.rep_no, i.tran_id, i.data_type, i.total_paid,
                   i.reconciliation_status, i.reconciliation_diff
            FROM stm_claim_item i
            JOIN stm_imported_files f ON f.id = i.file_id
            WHERE (?1 IS NULL OR i.file_id = ?1)
            ORDER BY i.file_id, i.sheet_name, i.row_number
            "#,
        )?;

        let rows = stmt.query_map(params![file_id], |row| {
            Ok(StatementItemView {
                file_id: row.get(0)?,
                filename: row.get(1)?,
                rep_no: row.get(2)?,
                tran_id: row.get(3)?,
                data_type: row.get(4)?,
                total_paid: row.get(5)?,
                reconciliation_status: row
                    .get::<_, Option<String>>(6)?
                    .and_then(|s| ReconStatus::parse(&s)),
                reconciliation_diff: row.get(7)?,
            })
        })?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// 某文件明细行数
    pub fn count_items(&self, file_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row(
            "SELECT COUNT(*) FROM stm_claim_item WHERE file_id = ?1",
            params![file_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}

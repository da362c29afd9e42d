// ==========================================
// E-Claim 对账核心 - 对账数据仓储
// ==========================================
// 职责:
//   - 明细对账: 单条 UPDATE 语句批量刷新 stm_claim_item 的对账结果
//   - REP 批次: 读时聚合
//   - 国库拨付: 医院 × 月份 汇总比对的原始金额
// 红线: 分类阈值由调用方传入，不在这里硬编码
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::ReconStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_dialect::{month_trunc_expr, SqlDialect};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

/// 明细对账语句
///
/// - 比对对象: 同 tran_id 的最新理赔行（id 最大）
/// - 无理赔 → claim_missing，差额 NULL
/// - ROUND(ABS(diff), 2) < ?1 → matched；否则 amount_differs
/// - diff = 结算实付 − 理赔补偿，保留两位
/// - ?3 为 NULL 时全表刷新
pub const RECONCILE_ITEMS_SQL: &str = r#"
UPDATE stm_claim_item
SET reconciliation_diff = (
        SELECT ROUND(stm_claim_item.total_paid - COALESCE(c.reimbursement_total, 0), 2)
        FROM claim_rep c
        WHERE c.tran_id = stm_claim_item.tran_id
        ORDER BY c.id DESC
        LIMIT 1
    ),
    reconciliation_status = COALESCE(
        (
            SELECT CASE
                       WHEN ROUND(ABS(stm_claim_item.total_paid - COALESCE(c.reimbursement_total, 0)), 2) < ?1
                           THEN 'matched'
                       ELSE 'amount_differs'
                   END
            FROM claim_rep c
            WHERE c.tran_id = stm_claim_item.tran_id
            ORDER BY c.id DESC
            LIMIT 1
        ),
        'claim_missing'
    ),
    reconciled_at = ?2,
    updated_at = ?2
WHERE (?3 IS NULL OR file_id = ?3)
"#;

/// REP 批次聚合: 每个 tran_id 只取最新理赔行
const REP_STATUS_SQL: &str = r#"
WITH latest AS (
    SELECT c.tran_id, c.rep_no
    FROM claim_rep c
    WHERE c.id = (SELECT MAX(c2.id) FROM claim_rep c2 WHERE c2.tran_id = c.tran_id)
),
stm AS (
    SELECT tran_id,
           MAX(CASE WHEN reconciliation_status = 'matched' THEN 1 ELSE 0 END) AS matched
    FROM stm_claim_item
    GROUP BY tran_id
)
SELECT l.rep_no,
       COUNT(*) AS claim_tx,
       COUNT(s.tran_id) AS statement_tx,
       COALESCE(SUM(s.matched), 0) AS matched_tx
FROM latest l
LEFT JOIN stm s ON s.tran_id = l.tran_id
WHERE l.rep_no IS NOT NULL
GROUP BY l.rep_no
ORDER BY l.rep_no
"#;

/// 国库比对查询（结算按文件周期月汇总，拨付按拨付日期所在月汇总）
pub fn treasury_comparison_sql(dialect: SqlDialect) -> String {
    let transfer_month = month_trunc_expr(dialect, "transfer_date");
    format!(
        r#"
WITH stm AS (
    SELECT f.hospital_code AS vendor_id, f.period_month AS month, SUM(i.total_paid) AS amount
    FROM stm_claim_item i
    JOIN stm_imported_files f ON f.id = i.file_id
    WHERE f.hospital_code IS NOT NULL
      AND f.period_month IS NOT NULL
      AND f.status = 'completed'
    GROUP BY f.hospital_code, f.period_month
),
trf AS (
    SELECT vendor_id, {transfer_month} AS month, SUM(amount) AS amount
    FROM treasury_transfer
    GROUP BY vendor_id, {transfer_month}
),
keys AS (
    SELECT vendor_id, month FROM stm
    UNION
    SELECT vendor_id, month FROM trf
)
SELECT k.vendor_id, k.month, s.amount, t.amount
FROM keys k
LEFT JOIN stm s ON s.vendor_id = k.vendor_id AND s.month = k.month
LEFT JOIN trf t ON t.vendor_id = k.vendor_id AND t.month = k.month
ORDER BY k.vendor_id, k.month
"#
    )
}

/// REP 聚合原始计数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepCounts {
    pub rep_no: String,
    pub claim_tx: i64,
    pub statement_tx: i64,
    pub matched_tx: i64,
}

/// 国库比对原始金额（单边缺失为 None）
#[derive(Debug, Clone, PartialEq)]
pub struct TreasuryAmounts {
    pub vendor_id: String,
    pub month: NaiveDate,
    pub statement_amount: Option<f64>,
    pub transfer_amount: Option<f64>,
}

// ==========================================
// ReconciliationRepository - 对账仓储
// ==========================================
pub struct ReconciliationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReconciliationRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量刷新明细对账结果，返回受影响行数
    ///
    /// # 参数
    /// - `file_id`: None 表示全表补对
    pub fn reconcile_items(&self, file_id: Option<i64>, tolerance: f64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let now = Utc::now().to_rfc3339();
        let updated = conn.execute(RECONCILE_ITEMS_SQL, params![tolerance, now, file_id])?;
        Ok(updated)
    }

    /// 按状态统计明细行（可按文件过滤）
    pub fn count_by_status(
        &self,
        file_id: Option<i64>,
    ) -> RepositoryResult<Vec<(Option<ReconStatus>, i64)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT reconciliation_status, COUNT(*)
            FROM stm_claim_item
            WHERE (?1 IS NULL OR file_id = ?1)
            GROUP BY reconciliation_status
            ORDER BY reconciliation_status
            "#,
        )?;
        let rows = stmt.query_map(params![file_id], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?
                    .and_then(|s| ReconStatus::parse(&s)),
                row.get::<_, i64>(1)?,
            ))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    /// REP 批次聚合计数
    pub fn rep_counts(&self) -> RepositoryResult<Vec<RepCounts>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(REP_STATUS_SQL)?;
        let rows = stmt.query_map([], |row| {
            Ok(RepCounts {
                rep_no: row.get(0)?,
                claim_tx: row.get(1)?,
                statement_tx: row.get(2)?,
                matched_tx: row.get(3)?,
            })
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    /// 国库比对原始金额
    pub fn treasury_amounts(&self) -> RepositoryResult<Vec<TreasuryAmounts>> {
        let conn = self.get_conn()?;
        let sql = treasury_comparison_sql(SqlDialect::Sqlite);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, Option<f64>>(3)?,
            ))
        })?;

        let mut amounts = Vec::new();
        for row in rows {
            let (vendor_id, month_raw, statement_amount, transfer_amount) = row?;
            let month = NaiveDate::parse_from_str(&month_raw, "%Y-%m-%d").map_err(|e| {
                RepositoryError::FieldValueError {
                    field: "month".to_string(),
                    message: format!("{}: {}", month_raw, e),
                }
            })?;
            amounts.push(TreasuryAmounts {
                vendor_id,
                month,
                statement_amount,
                transfer_amount,
            });
        }
        Ok(amounts)
    }
}

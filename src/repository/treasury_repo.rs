// ==========================================
// E-Claim 对账核心 - 国库拨付仓储
// ==========================================
// 职责: treasury_transfer 的写入与查询
// 说明: 拨付记录由外部系统提供，本模块只负责落库
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::recon::TreasuryTransfer;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct TreasuryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TreasuryRepository {
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

    /// 批量写入拨付记录（单事务）
    pub fn insert_transfers(&self, transfers: &[TreasuryTransfer]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO treasury_transfer (vendor_id, transfer_date, amount, reference)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for t in transfers {
                stmt.execute(params![
                    t.vendor_id,
                    t.transfer_date.format("%Y-%m-%d").to_string(),
                    t.amount,
                    t.reference
                ])?;
            }
        }
        tx.commit()?;
        Ok(transfers.len())
    }

    /// 某医院的全部拨付记录（按日期升序）
    pub fn list_transfers(&self, vendor_id: &str) -> RepositoryResult<Vec<TreasuryTransfer>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT vendor_id, transfer_date, amount, reference
             FROM treasury_transfer
             WHERE vendor_id = ?1
             ORDER BY transfer_date, id",
        )?;
        let rows = stmt.query_map(params![vendor_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut transfers = Vec::new();
        for row in rows {
            let (vendor_id, raw_date, amount, reference) = row?;
            let transfer_date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d").map_err(|e| {
                RepositoryError::FieldValueError {
                    field: "transfer_date".to_string(),
                    message: format!("{}: {}", raw_date, e),
                }
            })?;
            transfers.push(TreasuryTransfer {
                vendor_id,
                transfer_date,
                amount,
                reference,
            });
        }
        Ok(transfers)
    }
}

// ==========================================
// E-Claim 对账核心 - 对账引擎
// ==========================================
// 职责: 三源对账
//   1. 理赔 ↔ 结算单: 按 tran_id，单条 UPDATE 批量写回
//   2. REP 批次: 读时聚合
//   3. 结算单 ↔ 国库拨付: 按 (医院, 月份) 汇总比对
// 输出: ReconOutcome / RepReconciliation / TreasuryComparison
// 红线: 分类规则集中在 domain::recon，不在此重复
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::recon::{
    classify_amounts, classify_rep, ReconOutcome, RepReconciliation, TreasuryComparison,
};
use crate::domain::types::ReconStatus;
use crate::importer::error::ImportResult;
use crate::repository::ReconciliationRepository;
use std::time::Instant;
use tracing::{error, info, instrument};

/// 按范围批量对账（file_id 为 None 时全表补对）
///
/// 单条 SQL 执行，失败时无部分更新
pub fn reconcile_scope(
    repo: &ReconciliationRepository,
    file_id: Option<i64>,
    tolerance: f64,
) -> ReconOutcome {
    let started = Instant::now();
    match repo.reconcile_items(file_id, tolerance) {
        Ok(updated_rows) => {
            info!(
                file_id = ?file_id,
                tolerance,
                updated_rows,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "明细对账完成"
            );
            ReconOutcome {
                success: true,
                file_id,
                updated_rows,
                error: None,
            }
        }
        Err(e) => {
            error!(file_id = ?file_id, error = %e, "明细对账失败");
            ReconOutcome {
                success: false,
                file_id,
                updated_rows: 0,
                error: Some(e.to_string()),
            }
        }
    }
}

// ==========================================
// ReconciliationEngine - 对账引擎
// ==========================================
pub struct ReconciliationEngine<C>
where
    C: ImportConfigReader,
{
    repo: ReconciliationRepository,
    config: C,
}

impl<C> ReconciliationEngine<C>
where
    C: ImportConfigReader,
{
    pub fn new(repo: ReconciliationRepository, config: C) -> Self {
        Self { repo, config }
    }

    pub fn repository(&self) -> &ReconciliationRepository {
        &self.repo
    }

    fn tolerance(&self) -> ImportResult<f64> {
        self.config.get_recon_tolerance()
    }

    /// 单文件对账
    #[instrument(skip(self))]
    pub fn reconcile_file(&self, file_id: i64) -> ReconOutcome {
        self.reconcile(Some(file_id))
    }

    /// 全表补对
    #[instrument(skip(self))]
    pub fn reconcile_all(&self) -> ReconOutcome {
        self.reconcile(None)
    }

    fn reconcile(&self, file_id: Option<i64>) -> ReconOutcome {
        match self.tolerance() {
            Ok(tolerance) => reconcile_scope(&self.repo, file_id, tolerance),
            Err(e) => {
                error!(file_id = ?file_id, error = %e, "对账容差读取失败");
                ReconOutcome {
                    success: false,
                    file_id,
                    updated_rows: 0,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// REP 批次汇总状态
    ///
    /// - 无任何结算明细 → claim_only
    /// - 全部交易一致 → matched
    /// - 其余 → amount_differs
    pub fn rep_status(&self) -> ImportResult<Vec<RepReconciliation>> {
        let counts = self.repo.rep_counts()?;
        Ok(counts
            .into_iter()
            .map(|c| RepReconciliation {
                status: classify_rep(c.claim_tx, c.statement_tx, c.matched_tx),
                rep_no: c.rep_no,
                claim_transactions: c.claim_tx,
                statement_transactions: c.statement_tx,
                matched_transactions: c.matched_tx,
            })
            .collect())
    }

    /// 结算单 ↔ 国库拨付比对（差额 = 拨付 − 结算）
    pub fn compare_treasury(&self) -> ImportResult<Vec<TreasuryComparison>> {
        let tolerance = self.tolerance()?;
        let amounts = self.repo.treasury_amounts()?;

        Ok(amounts
            .into_iter()
            .map(|a| {
                let (status, diff) = classify_amounts(
                    a.statement_amount,
                    a.transfer_amount,
                    tolerance,
                    ReconStatus::StatementOnly,
                    ReconStatus::TransferOnly,
                );
                TreasuryComparison {
                    vendor_id: a.vendor_id,
                    month: a.month,
                    statement_amount: a.statement_amount,
                    transfer_amount: a.transfer_amount,
                    diff,
                    status,
                }
            })
            .collect())
    }

    /// 明细对账状态分布
    pub fn status_counts(&self, file_id: Option<i64>) -> ImportResult<Vec<(Option<ReconStatus>, i64)>> {
        Ok(self.repo.count_by_status(file_id)?)
    }
}

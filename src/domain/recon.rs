// ==========================================
// E-Claim 对账核心 - 对账领域模型
// ==========================================
// 职责: 对账结果 / REP 批次汇总 / 国库拨付比对
// 差额符号: 结算 − 理赔；拨付 − 结算
// ==========================================

use crate::domain::types::ReconStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 默认容差（货币单位）
pub const DEFAULT_TOLERANCE: f64 = 1.0;

// ==========================================
// ReconOutcome - 一次批量对账的结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconOutcome {
    pub success: bool,
    pub file_id: Option<i64>,
    pub updated_rows: usize,
    pub error: Option<String>,
}

// ==========================================
// RepReconciliation - 按 REP 批次的读时汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepReconciliation {
    pub rep_no: String,
    pub claim_transactions: i64,
    pub statement_transactions: i64,
    pub matched_transactions: i64,
    pub status: ReconStatus,
}

// ==========================================
// TreasuryTransfer - 国库拨付记录
// ==========================================
// 不逐笔对应理赔，只能按 (医院, 月份) 汇总比对
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasuryTransfer {
    pub vendor_id: String,
    pub transfer_date: NaiveDate,
    pub amount: f64,
    pub reference: Option<String>,
}

// ==========================================
// TreasuryComparison - 医院×月份 比对结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasuryComparison {
    pub vendor_id: String,
    pub month: NaiveDate,
    pub statement_amount: Option<f64>,
    pub transfer_amount: Option<f64>,
    pub diff: Option<f64>,
    pub status: ReconStatus,
}

/// 两侧金额按容差分类（缺哪边由调用方给出单边状态）
///
/// - 任一侧缺失 → 对应单边状态
/// - |diff| < tolerance → Matched（差额先四舍五入到分）
/// - 否则 → AmountDiffers（边界值归入不符）
pub fn classify_amounts(
    left: Option<f64>,
    right: Option<f64>,
    tolerance: f64,
    left_only: ReconStatus,
    right_only: ReconStatus,
) -> (ReconStatus, Option<f64>) {
    match (left, right) {
        (Some(l), Some(r)) => {
            let diff = round2(r - l);
            if diff.abs() < tolerance {
                (ReconStatus::Matched, Some(diff))
            } else {
                (ReconStatus::AmountDiffers, Some(diff))
            }
        }
        (Some(_), None) => (left_only, None),
        (None, Some(_)) => (right_only, None),
        (None, None) => (ReconStatus::Matched, None),
    }
}

/// REP 批次状态: 无结算记录 → claim_only；全部一致 → matched；其余 → amount_differs
pub fn classify_rep(claim_tx: i64, statement_tx: i64, matched_tx: i64) -> ReconStatus {
    if statement_tx == 0 {
        ReconStatus::ClaimOnly
    } else if matched_tx >= claim_tx {
        ReconStatus::Matched
    } else {
        ReconStatus::AmountDiffers
    }
}

/// 金额保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_amounts_tolerance_boundary() {
        let (status, diff) = classify_amounts(
            Some(1000.0),
            Some(1000.99),
            1.0,
            ReconStatus::StatementOnly,
            ReconStatus::TransferOnly,
        );
        assert_eq!(status, ReconStatus::Matched);
        assert_eq!(diff, Some(0.99));

        let (status, diff) = classify_amounts(
            Some(1000.0),
            Some(1001.0),
            1.0,
            ReconStatus::StatementOnly,
            ReconStatus::TransferOnly,
        );
        assert_eq!(status, ReconStatus::AmountDiffers);
        assert_eq!(diff, Some(1.0));
    }

    #[test]
    fn test_classify_amounts_one_sided() {
        let (status, diff) = classify_amounts(
            Some(10.0),
            None,
            1.0,
            ReconStatus::StatementOnly,
            ReconStatus::TransferOnly,
        );
        assert_eq!(status, ReconStatus::StatementOnly);
        assert_eq!(diff, None);

        let (status, _) = classify_amounts(
            None,
            Some(10.0),
            1.0,
            ReconStatus::StatementOnly,
            ReconStatus::TransferOnly,
        );
        assert_eq!(status, ReconStatus::TransferOnly);
    }

    #[test]
    fn test_classify_rep() {
        assert_eq!(classify_rep(3, 0, 0), ReconStatus::ClaimOnly);
        assert_eq!(classify_rep(3, 3, 3), ReconStatus::Matched);
        assert_eq!(classify_rep(3, 3, 2), ReconStatus::AmountDiffers);
        assert_eq!(classify_rep(3, 1, 1), ReconStatus::AmountDiffers);
    }
}

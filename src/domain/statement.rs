// ==========================================
// E-Claim 对账核心 - 结算单领域模型
// ==========================================
// 职责: 结算单文件元数据 / 汇总行 / 明细行
// 对齐: stm_imported_files / stm_summary / stm_claim_item 表
// ==========================================

use crate::domain::types::{DataType, PatientKind, ReconStatus, StatementScheme, SummaryKind};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// StatementFileName - 结算单文件名解析结果
// ==========================================
// STM_{hcode}_{IP|OP}{scheme}{BE年}{月}_{seq}.xls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementFileName {
    pub hospital_code: Option<String>,
    pub patient_kind: Option<PatientKind>,
    pub scheme: Option<StatementScheme>,
    pub period_month: Option<NaiveDate>, // 公历月初
    pub sequence: Option<String>,
}

// ==========================================
// StatementHeader - 表头自由文本块
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementHeader {
    pub report_date: Option<NaiveDate>,
    pub hospital_code: Option<String>,
    pub hospital_name: Option<String>,
    pub province: Option<String>,
    pub document_no: Option<String>,
}

impl StatementHeader {
    /// 已有字段优先，缺失字段由 other 补齐
    pub fn merge_missing(&mut self, other: StatementHeader) {
        if self.report_date.is_none() {
            self.report_date = other.report_date;
        }
        if self.hospital_code.is_none() {
            self.hospital_code = other.hospital_code;
        }
        if self.hospital_name.is_none() {
            self.hospital_name = other.hospital_name;
        }
        if self.province.is_none() {
            self.province = other.province;
        }
        if self.document_no.is_none() {
            self.document_no = other.document_no;
        }
    }
}

// ==========================================
// StatementSummaryRow - 汇总行（纯追加）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementSummaryRow {
    pub sheet_name: String,
    pub row_number: usize,
    pub summary_kind: SummaryKind,
    pub data_type: DataType,
    pub rep_no: Option<String>,
    pub description: Option<String>,
    pub case_count: i64,
    pub claim_amount: f64,
    pub compensation: f64,
    pub deduction: f64,
    pub net_paid: f64,
}

// ==========================================
// StatementClaimItem - 明细行
// ==========================================
// 唯一键: (file_id, tran_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementClaimItem {
    pub sheet_name: String,
    pub row_number: usize,
    pub data_type: DataType,
    pub rep_no: Option<String>,
    pub tran_id: String,
    pub hn: Option<String>,
    pub an: Option<String>,
    pub pid: Option<String>,
    pub patient_name: Option<String>,
    pub admission_date: Option<NaiveDateTime>,
    pub discharge_date: Option<NaiveDateTime>,
    pub drg: Option<String>,
    pub rw: f64,
    pub adjrw: f64,
    pub claim_amount: f64,
    pub compensation: f64,
    pub deduction: f64,
    pub total_paid: f64,
    pub remark: Option<String>,
}

// ==========================================
// ParsedStatement - 解析器输出
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedStatement {
    pub header: StatementHeader,
    pub summaries: Vec<StatementSummaryRow>,
    pub items: Vec<StatementClaimItem>,
}

// ==========================================
// StatementItemView - 明细行 + 对账结果（导出/查询用）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementItemView {
    pub file_id: i64,
    pub filename: String,
    pub rep_no: Option<String>,
    pub tran_id: String,
    pub data_type: String,
    pub total_paid: f64,
    pub reconciliation_status: Option<ReconStatus>,
    pub reconciliation_diff: Option<f64>,
}

// ==========================================
// E-Claim 对账核心 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含解析逻辑
// ==========================================

pub mod claim;
pub mod recon;
pub mod statement;
pub mod types;

// 重导出核心类型
pub use claim::{FieldValue, FileMetadata, ImportOutcome, ImportedFile, MappedRow, SheetOutcome};
pub use recon::{
    classify_amounts, classify_rep, ReconOutcome, RepReconciliation, TreasuryComparison,
    TreasuryTransfer, DEFAULT_TOLERANCE,
};
pub use statement::{
    ParsedStatement, StatementClaimItem, StatementFileName, StatementHeader, StatementItemView,
    StatementSummaryRow,
};
pub use types::{
    DataType, FileType, ImportStatus, PatientKind, ReconStatus, SchemaVariant, StatementScheme,
    SummaryKind,
};

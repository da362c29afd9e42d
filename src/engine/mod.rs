// ==========================================
// E-Claim 对账核心 - 引擎层
// ==========================================
// 职责: 对账规则编排与结果导出
// 红线: 引擎不拼 SQL，数据访问全部经由 Repository
// ==========================================

pub mod export;
pub mod reconciliation;

// 重导出核心引擎
pub use export::{export_items_csv, write_items_csv};
pub use reconciliation::{reconcile_scope, ReconciliationEngine};

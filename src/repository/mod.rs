// ==========================================
// E-Claim 对账核心 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 值一律参数化；表名/列名只来自静态映射表
// ==========================================

pub mod claim_repo;
pub mod error;
pub mod import_lifecycle;
pub mod recon_repo;
pub mod sql_dialect;
pub mod statement_repo;
pub mod treasury_repo;

// 重导出核心仓储
pub use claim_repo::ClaimRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use import_lifecycle::{FileTable, PagedWrite};
pub use recon_repo::{ReconciliationRepository, RepCounts, TreasuryAmounts};
pub use sql_dialect::SqlDialect;
pub use statement_repo::StatementRepository;
pub use treasury_repo::TreasuryRepository;

// ==========================================
// E-Claim 对账核心 - 核心库
// ==========================================
// 职责: 理赔报表/结算单导入、字段映射、跨源对账
// 技术栈: Rust + SQLite (rusqlite) + calamine
// 系统定位: 数据导入与核对引擎（UI/下载/调度由外部负责）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 对账与导出
pub mod engine;

// 导入层 - 外部报表
pub mod importer;

// 配置层 - 运行参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::types::{
    DataType, FileType, ImportStatus, ReconStatus, SchemaVariant, StatementScheme,
};

pub use domain::{ImportOutcome, ReconOutcome, SheetOutcome};

pub use importer::{
    BatchImportDispatcher, ClaimImporter, ImportError, ImportResult, StatementImporter,
};

pub use engine::ReconciliationEngine;

pub use repository::{RepositoryError, RepositoryResult, SqlDialect};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "E-Claim 对账核心";

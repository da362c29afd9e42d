// ==========================================
// E-Claim 对账核心 - 配置层
// ==========================================
// 职责: 运行时配置（容差 / 批大小 / 并发数 / 表头扫描）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, defaults, ConfigManager};
pub use import_config_trait::{ImportConfigReader, ImportSettings};

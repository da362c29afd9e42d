// ==========================================
// E-Claim 对账核心 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入/对账所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use crate::repository::sql_dialect::SqlDialect;
use serde::{Deserialize, Serialize};

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入与对账流程的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
// 说明: 导入在阻塞线程中执行，接口为同步
pub trait ImportConfigReader: Send + Sync {
    /// 对账容差（货币单位）
    ///
    /// # 默认值
    /// - 1.0
    fn get_recon_tolerance(&self) -> ImportResult<f64>;

    /// 单个写入事务的行数
    ///
    /// # 默认值
    /// - 100
    fn get_batch_size(&self) -> ImportResult<usize>;

    /// 批量导入的最大并发数
    ///
    /// # 默认值
    /// - 4
    fn get_max_workers(&self) -> ImportResult<usize>;

    /// 表头关键字扫描的行数上限
    ///
    /// # 默认值
    /// - 20
    fn get_header_scan_rows(&self) -> ImportResult<usize>;

    /// 扫描失败时的回退表头行（0 基）
    ///
    /// # 默认值
    /// - 4
    fn get_default_header_row(&self) -> ImportResult<usize>;

    /// 生成 SQL 时使用的方言
    ///
    /// # 默认值
    /// - sqlite
    fn get_sql_dialect(&self) -> ImportResult<SqlDialect>;

    /// 一次性读出全部导入配置
    fn load_settings(&self) -> ImportResult<ImportSettings> {
        Ok(ImportSettings {
            tolerance: self.get_recon_tolerance()?,
            batch_size: self.get_batch_size()?,
            max_workers: self.get_max_workers()?,
            header_scan_rows: self.get_header_scan_rows()?,
            default_header_row: self.get_default_header_row()?,
            dialect: self.get_sql_dialect()?,
        })
    }
}

// ==========================================
// ImportSettings - 导入配置快照
// ==========================================
// 每次导入开始时读取一次，过程中不再访问 config_kv
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImportSettings {
    pub tolerance: f64,
    pub batch_size: usize,
    pub max_workers: usize,
    pub header_scan_rows: usize,
    pub default_header_row: usize,
    pub dialect: SqlDialect,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            tolerance: crate::domain::recon::DEFAULT_TOLERANCE,
            batch_size: 100,
            max_workers: 4,
            header_scan_rows: 20,
            default_header_row: 4,
            dialect: SqlDialect::Sqlite,
        }
    }
}

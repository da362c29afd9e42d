// ==========================================
// E-Claim 对账核心 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::sql_dialect::SqlDialect;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager（对连接重新应用统一 PRAGMA，幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;
            configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ImportError::ConfigReadError {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 解析数值配置；缺失用默认值，格式错误返回 ConfigValueError
    fn get_parsed_or_default<T: FromStr>(&self, key: &str, default: T) -> ImportResult<T> {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|_| ImportError::ConfigValueError {
                    key: key.to_string(),
                    value: raw.clone(),
                    message: "无法解析为数值".to_string(),
                }),
        }
    }

    /// 必须为正数的计数类配置
    fn get_positive_usize(&self, key: &str, default: usize) -> ImportResult<usize> {
        let value = self.get_parsed_or_default::<usize>(key, default)?;
        if value == 0 {
            return Err(ImportError::ConfigValueError {
                key: key.to_string(),
                value: value.to_string(),
                message: "必须大于 0".to_string(),
            });
        }
        Ok(value)
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ImportResult<String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&json!(config_map))
            .map_err(|e| ImportError::InternalError(e.to_string()))
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    fn get_recon_tolerance(&self) -> ImportResult<f64> {
        let value = self.get_parsed_or_default::<f64>(
            config_keys::RECON_TOLERANCE,
            defaults::RECON_TOLERANCE,
        )?;
        if !value.is_finite() || value <= 0.0 {
            return Err(ImportError::ConfigValueError {
                key: config_keys::RECON_TOLERANCE.to_string(),
                value: value.to_string(),
                message: "容差必须为正数".to_string(),
            });
        }
        Ok(value)
    }

    fn get_batch_size(&self) -> ImportResult<usize> {
        self.get_positive_usize(config_keys::BATCH_SIZE, defaults::BATCH_SIZE)
    }

    fn get_max_workers(&self) -> ImportResult<usize> {
        self.get_positive_usize(config_keys::MAX_WORKERS, defaults::MAX_WORKERS)
    }

    fn get_header_scan_rows(&self) -> ImportResult<usize> {
        self.get_positive_usize(config_keys::HEADER_SCAN_ROWS, defaults::HEADER_SCAN_ROWS)
    }

    fn get_default_header_row(&self) -> ImportResult<usize> {
        self.get_parsed_or_default::<usize>(
            config_keys::DEFAULT_HEADER_ROW,
            defaults::DEFAULT_HEADER_ROW,
        )
    }

    fn get_sql_dialect(&self) -> ImportResult<SqlDialect> {
        match self.get_config_value(config_keys::DB_DIALECT)? {
            None => Ok(SqlDialect::default()),
            Some(raw) => SqlDialect::parse(&raw).ok_or_else(|| ImportError::ConfigValueError {
                key: config_keys::DB_DIALECT.to_string(),
                value: raw.clone(),
                message: "仅支持 sqlite / mysql".to_string(),
            }),
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 对账
    pub const RECON_TOLERANCE: &str = "recon.tolerance";

    // 导入
    pub const BATCH_SIZE: &str = "import.batch_size";
    pub const MAX_WORKERS: &str = "import.max_workers";
    pub const HEADER_SCAN_ROWS: &str = "import.header_scan_rows";
    pub const DEFAULT_HEADER_ROW: &str = "import.default_header_row";

    // 数据库
    pub const DB_DIALECT: &str = "db.dialect";
}

pub mod defaults {
    pub const RECON_TOLERANCE: f64 = crate::domain::recon::DEFAULT_TOLERANCE;
    pub const BATCH_SIZE: usize = 100;
    pub const MAX_WORKERS: usize = 4;
    pub const HEADER_SCAN_ROWS: usize = 20;
    pub const DEFAULT_HEADER_ROW: usize = 4;
}

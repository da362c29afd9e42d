// ==========================================
// E-Claim 对账核心 - SQL 方言辅助函数
// ==========================================
// 职责: 两种方言在 UPSERT 语法和月份截断上的差异集中在这里
// 约束: 纯函数，调用点不做 if dialect 分支
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    Sqlite,
    MySql,
}

impl SqlDialect {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "sqlite" => Some(SqlDialect::Sqlite),
            "mysql" | "mariadb" => Some(SqlDialect::MySql),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SqlDialect::Sqlite => "sqlite",
            SqlDialect::MySql => "mysql",
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 构建 UPSERT 冲突子句（拼接在 INSERT ... VALUES (...) 之后）
///
/// # 参数
/// - `conflict_columns`: 唯一键列（MySQL 由表上的 UNIQUE 约束隐式决定）
/// - `update_columns`: 冲突时覆盖的非键列（后写覆盖，不做合并）
///
/// # 示例
/// ```
/// use eclaim_recon::repository::sql_dialect::{build_upsert_clause, SqlDialect};
///
/// let sql = build_upsert_clause(SqlDialect::Sqlite, &["tran_id", "file_id"], &["hn", "an"]);
/// assert_eq!(sql, "ON CONFLICT(tran_id, file_id) DO UPDATE SET hn = excluded.hn, an = excluded.an");
///
/// let sql = build_upsert_clause(SqlDialect::MySql, &["tran_id", "file_id"], &["hn"]);
/// assert_eq!(sql, "ON DUPLICATE KEY UPDATE hn = VALUES(hn)");
/// ```
pub fn build_upsert_clause(
    dialect: SqlDialect,
    conflict_columns: &[&str],
    update_columns: &[&str],
) -> String {
    match dialect {
        SqlDialect::Sqlite => {
            if update_columns.is_empty() {
                return format!("ON CONFLICT({}) DO NOTHING", conflict_columns.join(", "));
            }
            let sets: Vec<String> = update_columns
                .iter()
                .map(|c| format!("{c} = excluded.{c}"))
                .collect();
            format!(
                "ON CONFLICT({}) DO UPDATE SET {}",
                conflict_columns.join(", "),
                sets.join(", ")
            )
        }
        SqlDialect::MySql => {
            // MySQL 无 DO NOTHING，用自赋值代替
            let cols: Vec<&str> = if update_columns.is_empty() {
                conflict_columns.iter().take(1).copied().collect()
            } else {
                update_columns.to_vec()
            };
            let sets: Vec<String> = cols.iter().map(|c| format!("{c} = VALUES({c})")).collect();
            format!("ON DUPLICATE KEY UPDATE {}", sets.join(", "))
        }
    }
}

/// 月份截断表达式，结果为 'YYYY-MM-01' 文本
///
/// # 示例
/// ```
/// use eclaim_recon::repository::sql_dialect::{month_trunc_expr, SqlDialect};
///
/// assert_eq!(month_trunc_expr(SqlDialect::Sqlite, "transfer_date"), "strftime('%Y-%m-01', transfer_date)");
/// assert_eq!(month_trunc_expr(SqlDialect::MySql, "transfer_date"), "DATE_FORMAT(transfer_date, '%Y-%m-01')");
/// ```
pub fn month_trunc_expr(dialect: SqlDialect, column: &str) -> String {
    match dialect {
        SqlDialect::Sqlite => format!("strftime('%Y-%m-01', {column})"),
        SqlDialect::MySql => format!("DATE_FORMAT({column}, '%Y-%m-01')"),
    }
}

/// 执行引擎为 rusqlite，只有 SQLite 方言的语句可以直接执行
pub fn ensure_executable(dialect: SqlDialect) -> RepositoryResult<()> {
    match dialect {
        SqlDialect::Sqlite => Ok(()),
        other => Err(RepositoryError::UnsupportedDialect(format!(
            "{} 方言仅用于生成 SQL，当前连接为 SQLite",
            other
        ))),
    }
}

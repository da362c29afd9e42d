// ==========================================
// E-Claim 对账核心 - 命令行入口
// ==========================================
// 用法:
//   eclaim-recon import-claims [--type OP] <file>...
//   eclaim-recon import-statements <file>...
//   eclaim-recon reconcile [file_id]
//   eclaim-recon rep-status
//   eclaim-recon import-treasury <transfers.csv>
//   eclaim-recon treasury
//   eclaim-recon export-recon <out.csv> [file_id]
// 数据库: ECLAIM_RECON_DB_PATH，否则用户数据目录
// 输出: JSON（stdout）
// ==========================================

use eclaim_recon::config::ConfigManager;
use eclaim_recon::db::{get_default_db_path, init_schema, open_sqlite_connection};
use eclaim_recon::engine::{export_items_csv, ReconciliationEngine};
use eclaim_recon::importer::{import_transfers_csv, BatchImportDispatcher, BatchImporter};
use eclaim_recon::repository::{ReconciliationRepository, StatementRepository, TreasuryRepository};
use eclaim_recon::{logging, FileType};
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const USAGE: &str = "用法: eclaim-recon <import-claims [--type TYPE] FILE.. | import-statements FILE.. | reconcile [FILE_ID] | rep-status | import-treasury FILE.csv | treasury | export-recon OUT.csv [FILE_ID]>";

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_file_id(raw: Option<String>) -> Result<Option<i64>, Box<dyn Error>> {
    match raw {
        Some(s) => Ok(Some(s.trim().parse::<i64>()?)),
        None => Ok(None),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let command = args.next().ok_or(USAGE)?;

    let db_path = get_default_db_path();
    tracing::info!(db_path = %db_path, version = eclaim_recon::VERSION, "使用数据库");

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    match command.as_str() {
        "import-claims" => {
            let mut file_type = None;
            let mut files = Vec::new();
            while let Some(arg) = args.next() {
                if arg == "--type" {
                    let token = args.next().ok_or("--type 需要参数")?;
                    file_type = Some(
                        FileType::from_token(&token)
                            .ok_or_else(|| format!("未知文件类型: {}", token))?,
                    );
                } else {
                    files.push(PathBuf::from(arg));
                }
            }
            let dispatcher = BatchImportDispatcher::from_config(&db_path)?;
            let batch = dispatcher.import_claims(files, file_type).await?;
            print_json(&batch)?;
        }
        "import-statements" => {
            let files: Vec<PathBuf> = args.map(PathBuf::from).collect();
            let dispatcher = BatchImportDispatcher::from_config(&db_path)?;
            let batch = dispatcher.import_statements(files).await?;
            print_json(&batch)?;
        }
        "reconcile" => {
            let file_id = parse_file_id(args.next())?;
            let engine = ReconciliationEngine::new(
                ReconciliationRepository::from_connection(conn.clone()),
                ConfigManager::from_connection(conn)?,
            );
            let outcome = match file_id {
                Some(id) => engine.reconcile_file(id),
                None => engine.reconcile_all(),
            };
            print_json(&outcome)?;
        }
        "rep-status" => {
            let engine = ReconciliationEngine::new(
                ReconciliationRepository::from_connection(conn.clone()),
                ConfigManager::from_connection(conn)?,
            );
            print_json(&engine.rep_status()?)?;
        }
        "import-treasury" => {
            let path = PathBuf::from(args.next().ok_or(USAGE)?);
            let repo = TreasuryRepository::from_connection(conn);
            let rows = import_transfers_csv(&repo, &path)?;
            print_json(&serde_json::json!({ "path": path.display().to_string(), "rows": rows }))?;
        }
        "treasury" => {
            let engine = ReconciliationEngine::new(
                ReconciliationRepository::from_connection(conn.clone()),
                ConfigManager::from_connection(conn)?,
            );
            print_json(&engine.compare_treasury()?)?;
        }
        "export-recon" => {
            let out = PathBuf::from(args.next().ok_or(USAGE)?);
            let file_id = parse_file_id(args.next())?;
            let repo = StatementRepository::from_connection(conn);
            let rows = export_items_csv(&repo, file_id, &out)?;
            print_json(&serde_json::json!({ "path": out.display().to_string(), "rows": rows }))?;
        }
        other => {
            eprintln!("未知命令: {}", other);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}

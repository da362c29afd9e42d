// ==========================================
// E-Claim 对账核心 - 批量导入调度
// ==========================================
// 职责: 有界并发地导入一批文件，全部完成后统一对账
// 约束:
//   - 并发上限 = max_workers（tokio Semaphore）
//   - 每个 worker 在 spawn_blocking 中打开自己的 SQLite 连接
//   - 文件名去重: 批次内按首次出现保留；跨批次由占用表保证同名文件不会同时分给两个 worker
//   - 调度前所有文件登记为 pending；未开始即失败或被取消的文件置为 failed
//   - 取消标记在每个文件开始前检查，批次结束时消费
// ==========================================

use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::claim::ImportOutcome;
use crate::domain::recon::ReconOutcome;
use crate::domain::types::FileType;
use crate::engine::reconciliation::reconcile_scope;
use crate::importer::claim_importer::ClaimImporter;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::filename::base_name;
use crate::importer::statement_importer::StatementImporter;
use crate::repository::error::RepositoryError;
use crate::repository::{ClaimRepository, ReconciliationRepository, StatementRepository};
use async_trait::async_trait;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

// ==========================================
// BatchOutcome - 批次结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub outcomes: Vec<ImportOutcome>,
    pub duplicate_filenames: Vec<String>,
    pub cancelled: bool,
    pub reconciliation: Option<ReconOutcome>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

// ==========================================
// BatchImporter Trait
// ==========================================
#[async_trait]
pub trait BatchImporter: Send + Sync {
    /// 批量导入理赔文件
    ///
    /// # 参数
    /// - `file_type_override`: 对整批生效的文件类型（文件名不合规时使用）
    async fn import_claims(
        &self,
        files: Vec<PathBuf>,
        file_type_override: Option<FileType>,
    ) -> ImportResult<BatchOutcome>;

    /// 批量导入结算单文件
    async fn import_statements(&self, files: Vec<PathBuf>) -> ImportResult<BatchOutcome>;
}

#[derive(Debug, Clone, Copy)]
enum ImportJob {
    Claims(Option<FileType>),
    Statements,
}

// ==========================================
// BatchImportDispatcher - 批量调度器
// ==========================================
pub struct BatchImportDispatcher {
    db_path: String,
    max_workers: usize,
    cancel: Arc<AtomicBool>,
    // 正在导入的文件名（跨批次）
    in_flight: Arc<Mutex<HashSet<String>>>,
    // 同一进程内对账串行
    recon_guard: Arc<tokio::sync::Mutex<()>>,
}

/// 文件名占用；worker 结束（drop）时释放
struct InFlightSlot {
    names: Arc<Mutex<HashSet<String>>>,
    name: String,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        if let Ok(mut names) = self.names.lock() {
            names.remove(&self.name);
        }
    }
}

impl BatchImportDispatcher {
    pub fn new(db_path: &str, max_workers: usize) -> Self {
        Self {
            db_path: db_path.to_string(),
            max_workers: max_workers.max(1),
            cancel: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            recon_guard: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// 并发上限取自 config_kv
    pub fn from_config(db_path: &str) -> ImportResult<Self> {
        let config = ConfigManager::new(db_path)?;
        Ok(Self::new(db_path, config.get_max_workers()?))
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// 请求取消: 作用于进行中的批次（无批次时作用于下一个批次）
    ///
    /// 尚未开始的文件不再导入；批次结束时清除取消标记
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// 按文件名去重，保留第一次出现
    fn dedupe(files: Vec<PathBuf>) -> (Vec<PathBuf>, Vec<String>) {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(files.len());
        let mut duplicates = Vec::new();

        for path in files {
            let name = base_name(&path.to_string_lossy()).to_string();
            if seen.insert(name.clone()) {
                unique.push(path);
            } else {
                duplicates.push(name);
            }
        }
        (unique, duplicates)
    }

    /// 占用文件名；已被其他批次占用的文件跳过并按重名上报
    fn claim_in_flight(
        &self,
        files: Vec<PathBuf>,
    ) -> ImportResult<(Vec<(PathBuf, InFlightSlot)>, Vec<String>)> {
        let mut names = self
            .in_flight
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        let mut claimed = Vec::with_capacity(files.len());
        let mut busy = Vec::new();
        for path in files {
            let name = base_name(&path.to_string_lossy()).to_string();
            if names.insert(name.clone()) {
                let slot = InFlightSlot {
                    names: self.in_flight.clone(),
                    name,
                };
                claimed.push((path, slot));
            } else {
                busy.push(name);
            }
        }
        Ok((claimed, busy))
    }

    async fn run_blocking<T, F>(f: F) -> ImportResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> ImportResult<T> + Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| ImportError::InternalError(format!("任务执行失败: {}", e)))?
    }

    #[instrument(skip(self, files), fields(files = files.len(), max_workers = self.max_workers))]
    async fn run(&self, files: Vec<PathBuf>, job: ImportJob) -> ImportResult<BatchOutcome> {
        let (files, mut duplicate_filenames) = Self::dedupe(files);
        let (jobs, busy) = self.claim_in_flight(files)?;
        if !busy.is_empty() {
            warn!(busy = ?busy, "文件正在其他批次中导入，已跳过");
        }
        duplicate_filenames.extend(busy);
        if !duplicate_filenames.is_empty() {
            warn!(duplicates = ?duplicate_filenames, "存在重名文件，已跳过");
        }

        // 建表幂等，保证 worker 连接可直接写入；随后登记 pending
        let db_path = self.db_path.clone();
        let names: Vec<String> = jobs.iter().map(|(_, slot)| slot.name.clone()).collect();
        Self::run_blocking(move || register_pending(&db_path, &names, job)).await?;

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut handles = Vec::with_capacity(jobs.len());

        for (path, slot) in jobs {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| ImportError::InternalError(format!("信号量已关闭: {}", e)))?;
            let db_path = self.db_path.clone();
            let cancel = self.cancel.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let _slot = slot;
                let filename = base_name(&path.to_string_lossy()).to_string();
                let outcome = if cancel.load(Ordering::SeqCst) {
                    ImportOutcome::failed(
                        &filename,
                        None,
                        ImportError::Cancelled(filename.clone()).to_string(),
                    )
                } else {
                    import_one(&db_path, &path, job)
                };
                settle_pending(&db_path, outcome, job)
            });
            handles.push(handle);
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => outcomes.push(ImportOutcome::failed(
                    "",
                    None,
                    format!("任务执行失败: {}", e),
                )),
            }
        }

        let cancelled = self.cancel.swap(false, Ordering::SeqCst);
        let reconciliation = if cancelled {
            None
        } else {
            Some(self.reconcile_all().await?)
        };

        let batch = BatchOutcome {
            outcomes,
            duplicate_filenames,
            cancelled,
            reconciliation,
        };
        info!(
            succeeded = batch.succeeded(),
            failed = batch.failed(),
            cancelled,
            "批量导入结束"
        );
        Ok(batch)
    }

    /// 全表补对（进程内串行）
    pub async fn reconcile_all(&self) -> ImportResult<ReconOutcome> {
        let _guard = self.recon_guard.lock().await;
        let db_path = self.db_path.clone();
        Self::run_blocking(move || {
            let conn = shared(open_sqlite_connection(&db_path)?);
            let tolerance = ConfigManager::from_connection(conn.clone())?.get_recon_tolerance()?;
            let repo = ReconciliationRepository::from_connection(conn);
            Ok(reconcile_scope(&repo, None, tolerance))
        })
        .await
    }
}

fn shared(conn: Connection) -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(conn))
}

/// 建表并把本批文件登记为 pending
fn register_pending(db_path: &str, names: &[String], job: ImportJob) -> ImportResult<()> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    let conn = shared(conn);

    match job {
        ImportJob::Claims(_) => {
            let repo = ClaimRepository::from_connection(conn);
            for name in names {
                repo.register_pending(name)?;
            }
        }
        ImportJob::Statements => {
            let repo = StatementRepository::from_connection(conn);
            for name in names {
                repo.register_pending(name)?;
            }
        }
    }
    Ok(())
}

/// 未进入导入流程就失败的文件（取消、导入配置不可用）: pending → failed
fn settle_pending(db_path: &str, mut outcome: ImportOutcome, job: ImportJob) -> ImportOutcome {
    if outcome.success || outcome.file_id.is_some() {
        return outcome;
    }
    let message = outcome.error.clone().unwrap_or_default();

    let settled = open_sqlite_connection(db_path)
        .map_err(RepositoryError::from)
        .map(shared)
        .and_then(|conn| match job {
            ImportJob::Claims(_) => {
                ClaimRepository::from_connection(conn).fail_pending(&outcome.filename, &message)
            }
            ImportJob::Statements => StatementRepository::from_connection(conn)
                .fail_pending(&outcome.filename, &message),
        });
    match settled {
        Ok(file_id) => outcome.file_id = file_id,
        Err(e) => warn!(filename = %outcome.filename, error = %e, "pending 状态回写失败"),
    }
    outcome
}

/// worker 内单文件导入（独立连接）
fn import_one(db_path: &str, path: &Path, job: ImportJob) -> ImportOutcome {
    let filename = base_name(&path.to_string_lossy()).to_string();

    let conn = match open_sqlite_connection(db_path) {
        Ok(conn) => shared(conn),
        Err(e) => return ImportOutcome::failed(&filename, None, e.to_string()),
    };
    let config = match ConfigManager::from_connection(conn.clone()) {
        Ok(config) => config,
        Err(e) => return ImportOutcome::failed(&filename, None, e.to_string()),
    };

    match job {
        ImportJob::Claims(file_type_override) => {
            ClaimImporter::new(ClaimRepository::from_connection(conn), config)
                .import_file(path, file_type_override)
        }
        ImportJob::Statements => StatementImporter::new(
            StatementRepository::from_connection(conn.clone()),
            ReconciliationRepository::from_connection(conn),
            config,
        )
        .without_auto_reconcile()
        .import_file(path),
    }
}

#[async_trait]
impl BatchImporter for BatchImportDispatcher {
    async fn import_claims(
        &self,
        files: Vec<PathBuf>,
        file_type_override: Option<FileType>,
    ) -> ImportResult<BatchOutcome> {
        self.run(files, ImportJob::Claims(file_type_override)).await
    }

    async fn import_statements(&self, files: Vec<PathBuf>) -> ImportResult<BatchOutcome> {
        self.run(files, ImportJob::Statements).await
    }
}

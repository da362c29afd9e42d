// ==========================================
// E-Claim 对账核心 - 结算单导入器
// ==========================================
// 职责: 单个结算单文件: 解析 → 表头回填 → 汇总追加 → 明细 upsert → 终态 → 按文件对账
// 约束: 汇总行纯追加（每次导入一个 snapshot_id）；明细按 (file_id, tran_id) 幂等
// ==========================================

use crate::config::{ImportConfigReader, ImportSettings};
use crate::domain::claim::ImportOutcome;
use crate::engine::reconciliation::reconcile_scope;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{ExcelParser, FileParser};
use crate::importer::filename::{base_name, parse_statement_filename};
use crate::importer::statement_parser::parse_statement;
use crate::repository::sql_dialect::ensure_executable;
use crate::repository::{ReconciliationRepository, StatementRepository};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// StatementImporter - 结算单导入器
// ==========================================
pub struct StatementImporter<C>
where
    C: ImportConfigReader,
{
    repo: StatementRepository,
    recon_repo: ReconciliationRepository,
    config: C,
    file_parser: Box<dyn FileParser>,
    // 批量调度时关闭，由调度器在全部完成后统一对账
    auto_reconcile: bool,
}

impl<C> StatementImporter<C>
where
    C: ImportConfigReader,
{
    pub fn new(repo: StatementRepository, recon_repo: ReconciliationRepository, config: C) -> Self {
        Self::with_parser(repo, recon_repo, config, Box::new(ExcelParser))
    }

    pub fn with_parser(
        repo: StatementRepository,
        recon_repo: ReconciliationRepository,
        config: C,
        file_parser: Box<dyn FileParser>,
    ) -> Self {
        Self {
            repo,
            recon_repo,
            config,
            file_parser,
            auto_reconcile: true,
        }
    }

    /// 导入成功后不再自动对账
    pub fn without_auto_reconcile(mut self) -> Self {
        self.auto_reconcile = false;
        self
    }

    pub fn repository(&self) -> &StatementRepository {
        &self.repo
    }

    /// 导入单个结算单文件
    #[instrument(skip(self), fields(file = %file_path.display()))]
    pub fn import_file(&self, file_path: &Path) -> ImportOutcome {
        let started = Instant::now();
        let raw_name = file_path.to_string_lossy();
        let filename = base_name(&raw_name).to_string();

        let settings = match self.load_settings() {
            Ok(settings) => settings,
            Err(e) => {
                error!(filename = %filename, error = %e, "导入配置不可用");
                return ImportOutcome::failed(&filename, None, e.to_string());
            }
        };

        let meta = parse_statement_filename(&filename);
        if meta.hospital_code.is_none() {
            debug!(filename = %filename, "文件名不符合结算单命名规则");
        }

        let file_id = match self.repo.begin_import(&filename, &meta) {
            Ok(id) => id,
            Err(e) => {
                error!(filename = %filename, error = %e, "文件登记失败");
                return ImportOutcome::failed(&filename, None, e.to_string());
            }
        };

        let outcome = match self.import_into(file_id, &filename, file_path, &settings) {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = e.to_string();
                error!(filename = %filename, file_id, error = %message, "结算单导入失败");
                if let Err(mark_err) = self.repo.mark_failed(file_id, 0, 0, 0, &message) {
                    error!(file_id, error = %mark_err, "失败状态写入失败");
                }
                ImportOutcome::failed(&filename, Some(file_id), message)
            }
        };

        if outcome.success && self.auto_reconcile {
            let recon = reconcile_scope(&self.recon_repo, Some(file_id), settings.tolerance);
            if !recon.success {
                warn!(file_id, error = ?recon.error, "导入后对账失败，可稍后全表补对");
            }
        }

        info!(
            filename = %filename,
            file_id,
            success = outcome.success,
            total = outcome.total_records,
            imported = outcome.imported_records,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "结算单导入结束"
        );
        outcome
    }

    fn load_settings(&self) -> ImportResult<ImportSettings> {
        let settings = self.config.load_settings()?;
        ensure_executable(settings.dialect)?;
        Ok(settings)
    }

    fn import_into(
        &self,
        file_id: i64,
        filename: &str,
        file_path: &Path,
        settings: &ImportSettings,
    ) -> ImportResult<ImportOutcome> {
        // === 步骤 1: 解析 ===
        let workbook = self.file_parser.load(file_path)?;
        if workbook.sheets.is_empty() {
            return Err(ImportError::EmptyWorkbook(filename.to_string()));
        }
        let parsed = parse_statement(&workbook);
        debug!(
            file_id,
            summaries = parsed.summaries.len(),
            items = parsed.items.len(),
            "结算单解析完成"
        );

        // === 步骤 2: 表头块回填 ===
        self.repo.update_header(file_id, &parsed.header)?;

        // === 步骤 3: 汇总行追加 ===
        let snapshot_id = Uuid::new_v4().to_string();
        self.repo
            .append_summaries(file_id, &snapshot_id, &parsed.summaries)?;

        // === 步骤 4: 明细分页 upsert ===
        let total = parsed.items.len();
        let write = self
            .repo
            .upsert_items_paged(file_id, &parsed.items, settings.batch_size);
        if let Some(err) = write.error {
            let failed = total - write.committed;
            let message = ImportError::BatchWriteError {
                committed: write.committed,
                message: err.to_string(),
            }
            .to_string();
            self.repo
                .mark_failed(file_id, total, write.committed, failed, &message)?;
            return Ok(ImportOutcome {
                success: false,
                filename: filename.to_string(),
                file_id: Some(file_id),
                total_records: total,
                imported_records: write.committed,
                failed_records: failed,
                additional_sheets: Default::default(),
                error: Some(message),
            });
        }

        // === 步骤 5: 终态 ===
        self.repo.mark_completed(file_id, total, write.committed, 0)?;

        Ok(ImportOutcome {
            success: true,
            filename: filename.to_string(),
            file_id: Some(file_id),
            total_records: total,
            imported_records: write.committed,
            failed_records: 0,
            additional_sheets: Default::default(),
            error: None,
        })
    }
}

// ==========================================
// E-Claim 对账核心 - 理赔报表导入器
// ==========================================
// 职责: 整合单个理赔文件的导入流程，从文件到数据库
// 流程: 文件名解析 → 读取工作簿 → 表头定位 → 字段映射 → 分页 upsert → 附加工作表 → 终态
// 约束: 文件状态必达终态（completed / failed）
// ==========================================

use crate::config::{ImportConfigReader, ImportSettings};
use crate::domain::claim::ImportOutcome;
use crate::domain::types::FileType;
use crate::importer::additional_sheets::import_additional_sheets;
use crate::importer::column_maps::{schema_for, KEY_COLUMN};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{ExcelParser, FileParser};
use crate::importer::filename::{base_name, parse_claim_filename};
use crate::importer::header_locator::{header_index, locate_header};
use crate::repository::sql_dialect::ensure_executable;
use crate::repository::ClaimRepository;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

// ==========================================
// ClaimImporter - 理赔报表导入器
// ==========================================
pub struct ClaimImporter<C>
where
    C: ImportConfigReader,
{
    // 数据访问层
    repo: ClaimRepository,

    // 配置读取器
    config: C,

    // 工作簿读取
    file_parser: Box<dyn FileParser>,
}

impl<C> ClaimImporter<C>
where
    C: ImportConfigReader,
{
    /// 创建导入器（默认使用 calamine 解析）
    pub fn new(repo: ClaimRepository, config: C) -> Self {
        Self::with_parser(repo, config, Box::new(ExcelParser))
    }

    pub fn with_parser(repo: ClaimRepository, config: C, file_parser: Box<dyn FileParser>) -> Self {
        Self {
            repo,
            config,
            file_parser,
        }
    }

    pub fn repository(&self) -> &ClaimRepository {
        &self.repo
    }

    /// 导入单个理赔文件
    ///
    /// # 参数
    /// - `file_path`: 工作簿路径
    /// - `file_type_override`: 文件名不符合规则时由调用方指定类型
    ///
    /// # 返回
    /// 结果对象；失败原因写入 `error`，同时落库到文件记录
    #[instrument(skip(self), fields(file = %file_path.display()))]
    pub fn import_file(&self, file_path: &Path, file_type_override: Option<FileType>) -> ImportOutcome {
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

        // 文件名不匹配不是错误，元数据全空
        let meta = parse_claim_filename(&filename);
        if meta.is_empty() {
            debug!(filename = %filename, "文件名不符合理赔命名规则");
        }
        let file_type = file_type_override.or(meta.file_type);

        let file_id = match self.repo.begin_import(&filename, &meta, file_type) {
            Ok(id) => id,
            Err(e) => {
                error!(filename = %filename, error = %e, "文件登记失败");
                return ImportOutcome::failed(&filename, None, e.to_string());
            }
        };

        let outcome = match self.import_into(file_id, &filename, file_path, file_type, &settings) {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = e.to_string();
                error!(filename = %filename, file_id, error = %message, "理赔文件导入失败");
                if let Err(mark_err) = self.repo.mark_failed(file_id, 0, 0, 0, &message) {
                    error!(file_id, error = %mark_err, "失败状态写入失败");
                }
                ImportOutcome::failed(&filename, Some(file_id), message)
            }
        };

        info!(
            filename = %filename,
            file_id,
            success = outcome.success,
            total = outcome.total_records,
            imported = outcome.imported_records,
            failed = outcome.failed_records,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "理赔文件导入结束"
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
        file_type: Option<FileType>,
        settings: &ImportSettings,
    ) -> ImportResult<ImportOutcome> {
        let file_type = file_type.ok_or_else(|| ImportError::UnknownFileType(filename.to_string()))?;
        let variant = file_type.schema_variant();
        let schema = schema_for(variant);
        let scheme = file_type.scheme_code();

        // === 步骤 1: 读取工作簿 ===
        let workbook = self.file_parser.load(file_path)?;
        let sheet = workbook
            .primary()
            .ok_or_else(|| ImportError::EmptyWorkbook(filename.to_string()))?;

        // === 步骤 2: 表头定位 ===
        let location = locate_header(
            sheet,
            schema.header,
            settings.header_scan_rows,
            settings.default_header_row,
        );
        let headers = if schema.uses_header_names() {
            header_index(sheet, location.header_row)
        } else {
            HashMap::new()
        };

        // === 步骤 3: 字段映射 + 主键过滤 ===
        let mapper = FieldMapper::new(&schema.fields, &headers, KEY_COLUMN, scheme);
        let unresolved = mapper.unresolved_columns();
        if schema.uses_header_names() && !unresolved.is_empty() {
            warn!(file_id, variant = %variant, columns = ?unresolved, "部分表头未找到，对应字段置空");
        }
        let rows = mapper.map_rows(file_id, &sheet.rows, location.data_start_row);
        let total = rows.len();
        debug!(file_id, variant = %variant, data_start_row = location.data_start_row, rows = total, "字段映射完成");

        // === 步骤 4: 分页 upsert ===
        let write = self.repo.upsert_claims_paged(&rows, settings.batch_size);
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

        // === 步骤 5: 附加工作表（失败隔离） ===
        let additional_sheets =
            import_additional_sheets(&self.repo, &workbook, variant, file_id, scheme);

        // === 步骤 6: 终态 ===
        self.repo.mark_completed(file_id, total, write.committed, 0)?;

        Ok(ImportOutcome {
            success: true,
            filename: filename.to_string(),
            file_id: Some(file_id),
            total_records: total,
            imported_records: write.committed,
            failed_records: 0,
            additional_sheets,
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::db::init_schema;
    use crate::domain::types::ImportStatus;
    use crate::importer::file_parser::{RawSheet, RawWorkbook};
    use rusqlite::Connection;
    use std::sync::{Arc, Mutex};

    struct FixedParser(RawWorkbook);

    impl FileParser for FixedParser {
        fn load(&self, _file_path: &Path) -> ImportResult<RawWorkbook> {
            Ok(self.0.clone())
        }
    }

    fn ucs_row(tran_id: &str, amount: &str) -> Vec<String> {
        let mut row = vec![String::new(); 34];
        row[0] = "REP001".to_string();
        row[2] = tran_id.to_string();
        row[10] = amount.to_string();
        row
    }

    fn importer(workbook: RawWorkbook) -> ClaimImporter<ConfigManager> {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        ClaimImporter::with_parser(
            ClaimRepository::from_connection(conn.clone()),
            ConfigManager::from_connection(conn).unwrap(),
            Box::new(FixedParser(workbook)),
        )
    }

    #[test]
    fn test_key_filter_defines_total_records() {
        let mut header = vec![String::new(); 34];
        header[0] = "REP No.".to_string();
        header[2] = "TRAN_ID".to_string();
        header[3] = "HN".to_string();

        let workbook = RawWorkbook {
            sheets: vec![RawSheet {
                name: "main".to_string(),
                rows: vec![
                    vec!["title".to_string()],
                    header,
                    ucs_row("T1", "100"),
                    ucs_row("-", "200"),
                    ucs_row("T3", "1,300.50"),
                ],
            }],
        };
        let importer = importer(workbook);
        let outcome = importer.import_file(Path::new("eclaim_10670_OP_25680913_001.xls"), None);

        assert!(outcome.success, "{:?}", outcome.error);
        assert_eq!(outcome.total_records, 2);
        assert_eq!(outcome.imported_records, 2);
        assert_eq!(outcome.failed_records, 0);
        assert_eq!(outcome.additional_sheets.len(), 5);
    }

    #[test]
    fn test_unknown_file_type_marks_failed() {
        let importer = importer(RawWorkbook::default());
        let outcome = importer.import_file(Path::new("random.xls"), None);

        assert!(!outcome.success);
        let file_id = outcome.file_id.unwrap();
        assert_eq!(
            importer.repository().get_status(file_id).unwrap(),
            Some(ImportStatus::Failed)
        );
        assert!(outcome.error.unwrap().contains("random.xls"));
    }
}

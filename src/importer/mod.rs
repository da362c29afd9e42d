// ==========================================
// E-Claim 对账核心 - 导入层
// ==========================================
// 职责: 外部报表导入,生成内部数据
// 支持: 理赔报表（五种模式变体 + 附加工作表）、结算单、国库拨付 CSV
// ==========================================

// 模块声明
pub mod additional_sheets;
pub mod batch;
pub mod claim_importer;
pub mod column_maps;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod filename;
pub mod header_locator;
pub mod statement_importer;
pub mod statement_parser;
pub mod treasury_csv;

// 重导出核心类型
pub use batch::{BatchImportDispatcher, BatchImporter, BatchOutcome};
pub use claim_importer::ClaimImporter;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{ExcelParser, FileParser, RawSheet, RawWorkbook};
pub use filename::{parse_claim_filename, parse_statement_filename};
pub use statement_importer::StatementImporter;
pub use statement_parser::parse_statement;
pub use treasury_csv::import_transfers_csv;

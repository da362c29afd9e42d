// ==========================================
// E-Claim 对账核心 - 附加工作表导入
// ==========================================
// 职责: 药品 / 器械 / 拒付 / 零支付 / 汇总 五类附加表
// 约束: 每张表独立事务（先删后插）；单表失败只记录，不影响主文件
// ==========================================

use crate::domain::claim::SheetOutcome;
use crate::domain::types::SchemaVariant;
use crate::importer::column_maps::{aux_sheets_for, AuxSheetSpec};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::RawWorkbook;
use crate::repository::ClaimRepository;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// 导入变体对应的全部附加工作表
///
/// 返回 {kind: SheetOutcome}，未找到的工作表 found=false
pub fn import_additional_sheets(
    repo: &ClaimRepository,
    workbook: &RawWorkbook,
    variant: SchemaVariant,
    file_id: i64,
    scheme: &str,
) -> BTreeMap<String, SheetOutcome> {
    aux_sheets_for(variant)
        .iter()
        .map(|spec| {
            let outcome = import_sheet(repo, workbook, spec, file_id, scheme);
            (spec.kind.as_str().to_string(), outcome)
        })
        .collect()
}

fn import_sheet(
    repo: &ClaimRepository,
    workbook: &RawWorkbook,
    spec: &AuxSheetSpec,
    file_id: i64,
    scheme: &str,
) -> SheetOutcome {
    let Some(sheet) = workbook.find_sheet(spec.sheet_keywords) else {
        debug!(kind = spec.kind.as_str(), file_id, "附加工作表不存在，跳过");
        return SheetOutcome::default();
    };

    let mapper = FieldMapper::new(&spec.fields(), &HashMap::new(), spec.key_column, scheme);
    let rows = mapper.map_rows(file_id, &sheet.rows, spec.data_start_row);

    match repo.replace_additional_rows(spec.table, file_id, &rows) {
        Ok(imported) => {
            info!(
                kind = spec.kind.as_str(),
                sheet = %sheet.name,
                file_id,
                rows = imported,
                "附加工作表导入完成"
            );
            SheetOutcome {
                found: true,
                sheet_name: Some(sheet.name.clone()),
                imported_records: imported,
                error: None,
            }
        }
        Err(e) => {
            warn!(
                kind = spec.kind.as_str(),
                sheet = %sheet.name,
                file_id,
                error = %e,
                "附加工作表导入失败"
            );
            SheetOutcome {
                found: true,
                sheet_name: Some(sheet.name.clone()),
                imported_records: 0,
                error: Some(e.to_string()),
            }
        }
    }
}

// ==========================================
// E-Claim 对账核心 - 对账结果导出
// ==========================================
// 职责: 结算明细 + 对账状态 → CSV（供下游报表）
// ==========================================

use crate::domain::statement::StatementItemView;
use crate::importer::error::ImportResult;
use crate::repository::StatementRepository;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// 写出 CSV（首行为列名），返回数据行数
pub fn write_items_csv<W: Write>(writer: W, items: &[StatementItemView]) -> ImportResult<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for item in items {
        csv_writer.serialize(item)?;
    }
    csv_writer.flush()?;
    Ok(items.len())
}

/// 导出明细对账结果到文件
///
/// # 参数
/// - `file_id`: None 时导出全部结算文件
pub fn export_items_csv(
    repo: &StatementRepository,
    file_id: Option<i64>,
    out_path: &Path,
) -> ImportResult<usize> {
    let items = repo.list_items_view(file_id)?;
    let file = File::create(out_path)?;
    let written = write_items_csv(file, &items)?;
    info!(path = %out_path.display(), rows = written, "对账结果已导出");
    Ok(written)
}

// ==========================================
// 批量导入测试
// ==========================================
// 测试目标: 有界并发导入、批内/跨批次去重、pending 登记、批后统一对账、取消
// ==========================================

mod test_helpers;

use eclaim_recon::importer::{BatchImportDispatcher, BatchImporter};
use eclaim_recon::logging;
use eclaim_recon::repository::{ClaimRepository, StatementRepository};
use eclaim_recon::{ImportStatus, ReconStatus};
use std::path::PathBuf;
use tempfile::TempDir;
use test_helpers::*;

#[tokio::test]
async fn test_batch_claim_import_dedupes_and_reconciles() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let conn = shared_connection(&db_path);

    // 结算单先到，此时全部 claim_missing
    let stm_path = write_statement(
        dir.path(),
        "STM_10670_IPUCS256809_01.xlsx",
        &[("REP1", "T100", "500"), ("REP2", "T200", "300")],
    )
    .unwrap();
    let stm = statement_importer(&conn).import_file(&stm_path);
    assert!(stm.success);

    let first = write_ucs_op_claims(
        dir.path(),
        "eclaim_10670_OP_25680913_001.xlsx",
        &[claim_line("REP1", "T100", "500")],
    )
    .unwrap();
    let second = write_ucs_op_claims(
        dir.path(),
        "eclaim_10670_OP_25680913_002.xlsx",
        &[claim_line("REP2", "T200", "300")],
    )
    .unwrap();
    let dup_dir = dir.path().join("copy");
    std::fs::create_dir(&dup_dir).unwrap();
    let duplicate = write_ucs_op_claims(
        &dup_dir,
        "eclaim_10670_OP_25680913_001.xlsx",
        &[claim_line("REP1", "T100", "999")],
    )
    .unwrap();

    let dispatcher = BatchImportDispatcher::new(&db_path, 2);
    let batch = dispatcher
        .import_claims(vec![first, second, duplicate], None)
        .await
        .unwrap();

    assert_eq!(batch.outcomes.len(), 2);
    assert_eq!(batch.succeeded(), 2);
    assert_eq!(
        batch.duplicate_filenames,
        vec!["eclaim_10670_OP_25680913_001.xlsx".to_string()]
    );
    assert!(!batch.cancelled);
    let recon = batch.reconciliation.expect("批后对账结果");
    assert!(recon.success);
    assert_eq!(recon.updated_rows, 2);

    let items = StatementRepository::from_connection(conn.clone())
        .list_items_view(stm.file_id)
        .unwrap();
    assert!(items
        .iter()
        .all(|i| i.reconciliation_status == Some(ReconStatus::Matched)));
}

#[tokio::test]
async fn test_batch_statement_import() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();

    let files: Vec<PathBuf> = ["STM_10670_IPUCS256809_01.xlsx", "STM_10670_OPUCS256809_01.xlsx"]
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let tran_id = format!("T{}", i);
            write_statement(dir.path(), name, &[("REP1", tran_id.as_str(), "100")]).unwrap()
        })
        .collect();

    let dispatcher = BatchImportDispatcher::new(&db_path, 4);
    let batch = dispatcher.import_statements(files).await.unwrap();
    assert_eq!(batch.succeeded(), 2);
    assert_eq!(batch.failed(), 0);

    let conn = shared_connection(&db_path);
    assert_eq!(
        query_i64(
            &conn,
            "SELECT COUNT(*) FROM stm_claim_item WHERE reconciliation_status = 'claim_missing'"
        ),
        2
    );
}

#[tokio::test]
async fn test_cancelled_batch_marks_files_failed_and_next_batch_runs() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();

    let path = write_ucs_op_claims(
        dir.path(),
        "eclaim_10670_OP_25680913_001.xlsx",
        &[claim_line("REP1", "T100", "500")],
    )
    .unwrap();

    let dispatcher = BatchImportDispatcher::new(&db_path, 1);
    dispatcher.cancel();
    let batch = dispatcher.import_claims(vec![path.clone()], None).await.unwrap();

    assert!(batch.cancelled);
    assert!(batch.reconciliation.is_none());
    assert_eq!(batch.failed(), 1);
    let file_id = batch.outcomes[0].file_id.expect("取消的文件仍有登记行");

    let conn = shared_connection(&db_path);
    let repo = ClaimRepository::from_connection(conn.clone());
    assert_eq!(repo.get_status(file_id).unwrap(), Some(ImportStatus::Failed));
    assert_eq!(query_i64(&conn, "SELECT COUNT(*) FROM claim_rep"), 0);

    // 取消标记随批次结束清除
    let retry = dispatcher.import_claims(vec![path], None).await.unwrap();
    assert!(!retry.cancelled);
    assert_eq!(retry.succeeded(), 1);
    assert_eq!(retry.outcomes[0].file_id, Some(file_id));
    assert_eq!(repo.get_status(file_id).unwrap(), Some(ImportStatus::Completed));
}

#[tokio::test]
async fn test_unrecognized_filename_in_batch_ends_failed() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();

    let path =
        write_ucs_op_claims(dir.path(), "report.xlsx", &[claim_line("REP1", "T100", "500")])
            .unwrap();

    let dispatcher = BatchImportDispatcher::new(&db_path, 2);
    let batch = dispatcher.import_claims(vec![path], None).await.unwrap();
    assert_eq!(batch.failed(), 1);

    let conn = shared_connection(&db_path);
    assert_eq!(
        query_i64(
            &conn,
            "SELECT COUNT(*) FROM eclaim_imported_files WHERE filename = 'report.xlsx' AND status = 'failed'"
        ),
        1
    );
    assert_eq!(
        query_i64(&conn, "SELECT COUNT(*) FROM eclaim_imported_files WHERE status = 'pending'"),
        0
    );
}

#[tokio::test]
async fn test_overlapping_batches_never_share_a_filename() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let name = "eclaim_10670_OP_25680913_001.xlsx";

    let first_dir = dir.path().join("a");
    let second_dir = dir.path().join("b");
    std::fs::create_dir(&first_dir).unwrap();
    std::fs::create_dir(&second_dir).unwrap();
    let first_path =
        write_ucs_op_claims(&first_dir, name, &[claim_line("REP1", "T100", "500")]).unwrap();
    let second_path =
        write_ucs_op_claims(&second_dir, name, &[claim_line("REP1", "T100", "700")]).unwrap();

    let dispatcher = BatchImportDispatcher::new(&db_path, 2);
    let (first, second) = tokio::join!(
        dispatcher.import_claims(vec![first_path], None),
        dispatcher.import_claims(vec![second_path.clone()], None)
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.outcomes.len() + second.outcomes.len(), 1);
    let skipped: Vec<&String> = first
        .duplicate_filenames
        .iter()
        .chain(second.duplicate_filenames.iter())
        .collect();
    assert_eq!(skipped, vec![&name.to_string()]);

    // 占用在 worker 结束后释放
    let again = dispatcher.import_claims(vec![second_path], None).await.unwrap();
    assert_eq!(again.succeeded(), 1);
    assert!(again.duplicate_filenames.is_empty());
}

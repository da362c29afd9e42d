// ==========================================
// 对账引擎集成测试
// ==========================================
// 覆盖: 明细三态与容差边界 / 最新理赔行优先 / REP 批次 / 国库拨付（含 CSV 导入）/ 配置容差
// ==========================================

mod test_helpers;

use chrono::NaiveDate;
use eclaim_recon::config::{config_keys, ConfigManager};
use eclaim_recon::domain::recon::TreasuryTransfer;
use eclaim_recon::domain::statement::StatementItemView;
use eclaim_recon::engine::ReconciliationEngine;
use eclaim_recon::importer::import_transfers_csv;
use eclaim_recon::logging;
use eclaim_recon::repository::{ReconciliationRepository, StatementRepository, TreasuryRepository};
use eclaim_recon::ReconStatus;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use test_helpers::*;

const CLAIM_FILE: &str = "eclaim_10670_OP_25680913_001.xlsx";
const STM_FILE: &str = "STM_10670_IPUCS256809_01.xlsx";

fn engine(conn: &Arc<Mutex<Connection>>) -> ReconciliationEngine<ConfigManager> {
    ReconciliationEngine::new(
        ReconciliationRepository::from_connection(conn.clone()),
        ConfigManager::from_connection(conn.clone()).unwrap(),
    )
}

fn import_claims(conn: &Arc<Mutex<Connection>>, dir: &Path, filename: &str, lines: &[ClaimLine]) {
    let path = write_ucs_op_claims(dir, filename, lines).unwrap();
    let outcome = claim_importer(conn).import_file(&path, None);
    assert!(outcome.success, "{:?}", outcome.error);
}

fn import_statement(
    conn: &Arc<Mutex<Connection>>,
    dir: &Path,
    filename: &str,
    items: &[(&str, &str, &str)],
) -> i64 {
    let path = write_statement(dir, filename, items).unwrap();
    let outcome = statement_importer(conn).import_file(&path);
    assert!(outcome.success, "{:?}", outcome.error);
    outcome.file_id.unwrap()
}

fn item<'a>(items: &'a [StatementItemView], tran_id: &str) -> &'a StatementItemView {
    items.iter().find(|i| i.tran_id == tran_id).unwrap()
}

#[test]
fn test_item_status_and_tolerance_boundary() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let conn = shared_connection(&db_path);

    import_claims(
        &conn,
        dir.path(),
        CLAIM_FILE,
        &[
            claim_line("REP1", "T100", "500.50"),
            claim_line("REP1", "T200", "1000"),
            claim_line("REP1", "T300", "1000"),
        ],
    );
    let file_id = import_statement(
        &conn,
        dir.path(),
        STM_FILE,
        &[
            ("REP1", "T100", "500.00"),
            ("REP1", "T200", "1001.00"),
            ("REP1", "T300", "1000.99"),
            ("REP1", "T400", "80"),
        ],
    );

    let items = StatementRepository::from_connection(conn.clone())
        .list_items_view(Some(file_id))
        .unwrap();

    let t100 = item(&items, "T100");
    assert_eq!(t100.reconciliation_status, Some(ReconStatus::Matched));
    assert_eq!(t100.reconciliation_diff, Some(-0.5));

    // 差额恰好等于容差 → 不符
    let t200 = item(&items, "T200");
    assert_eq!(t200.reconciliation_status, Some(ReconStatus::AmountDiffers));
    assert_eq!(t200.reconciliation_diff, Some(1.0));

    let t300 = item(&items, "T300");
    assert_eq!(t300.reconciliation_status, Some(ReconStatus::Matched));
    assert!((t300.reconciliation_diff.unwrap() - 0.99).abs() < 1e-9);

    let t400 = item(&items, "T400");
    assert_eq!(t400.reconciliation_status, Some(ReconStatus::ClaimMissing));
    assert_eq!(t400.reconciliation_diff, None);

    let counts = engine(&conn).status_counts(Some(file_id)).unwrap();
    let matched = counts
        .iter()
        .find(|(status, _)| *status == Some(ReconStatus::Matched))
        .map(|(_, n)| *n);
    assert_eq!(matched, Some(2));
}

#[test]
fn test_latest_claim_row_wins() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let conn = shared_connection(&db_path);

    import_claims(&conn, dir.path(), CLAIM_FILE, &[claim_line("REP1", "T100", "400")]);
    import_claims(
        &conn,
        dir.path(),
        "eclaim_10670_OP_25680914_002.xlsx",
        &[claim_line("REP1", "T100", "500")],
    );
    let file_id = import_statement(&conn, dir.path(), STM_FILE, &[("REP1", "T100", "500")]);

    let items = StatementRepository::from_connection(conn.clone())
        .list_items_view(Some(file_id))
        .unwrap();
    assert_eq!(items[0].reconciliation_status, Some(ReconStatus::Matched));
    assert_eq!(items[0].reconciliation_diff, Some(0.0));
}

#[test]
fn test_claims_imported_after_statement_are_picked_up_by_full_pass() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let conn = shared_connection(&db_path);

    let file_id = import_statement(&conn, dir.path(), STM_FILE, &[("REP1", "T100", "500")]);
    import_claims(&conn, dir.path(), CLAIM_FILE, &[claim_line("REP1", "T100", "500")]);

    let outcome = engine(&conn).reconcile_all();
    assert!(outcome.success);
    assert_eq!(outcome.updated_rows, 1);

    let items = StatementRepository::from_connection(conn.clone())
        .list_items_view(Some(file_id))
        .unwrap();
    assert_eq!(items[0].reconciliation_status, Some(ReconStatus::Matched));
}

#[test]
fn test_rep_status_aggregation() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let conn = shared_connection(&db_path);

    import_claims(
        &conn,
        dir.path(),
        CLAIM_FILE,
        &[
            claim_line("REP_A", "T1", "500"),
            claim_line("REP_A", "T2", "300"),
            claim_line("REP_B", "T3", "100"),
            claim_line("REP_C", "T4", "50"),
        ],
    );
    import_statement(
        &conn,
        dir.path(),
        STM_FILE,
        &[
            ("REP_A", "T1", "500"),
            ("REP_A", "T2", "300"),
            ("REP_B", "T3", "150"),
        ],
    );

    let reps = engine(&conn).rep_status().unwrap();
    let summary: Vec<(&str, i64, i64, i64, ReconStatus)> = reps
        .iter()
        .map(|r| {
            (
                r.rep_no.as_str(),
                r.claim_transactions,
                r.statement_transactions,
                r.matched_transactions,
                r.status,
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("REP_A", 2, 2, 2, ReconStatus::Matched),
            ("REP_B", 1, 1, 0, ReconStatus::AmountDiffers),
            ("REP_C", 1, 0, 0, ReconStatus::ClaimOnly),
        ]
    );
}

#[test]
fn test_treasury_comparison_by_vendor_and_month() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let conn = shared_connection(&db_path);

    import_statement(
        &conn,
        dir.path(),
        STM_FILE,
        &[("REP1", "T100", "500"), ("REP1", "T101", "300")],
    );
    import_statement(
        &conn,
        dir.path(),
        "STM_10671_OPUCS256809_01.xlsx",
        &[("REP9", "T900", "200")],
    );

    let treasury = TreasuryRepository::from_connection(conn.clone());
    let inserted = treasury
        .insert_transfers(&[
            TreasuryTransfer {
                vendor_id: "10670".to_string(),
                transfer_date: NaiveDate::from_ymd_opt(2025, 9, 20).unwrap(),
                amount: 800.40,
                reference: Some("TRF-001".to_string()),
            },
            TreasuryTransfer {
                vendor_id: "10670".to_string(),
                transfer_date: NaiveDate::from_ymd_opt(2025, 10, 5).unwrap(),
                amount: 100.0,
                reference: None,
            },
        ])
        .unwrap();
    assert_eq!(inserted, 2);

    let rows = engine(&conn).compare_treasury().unwrap();
    let summary: Vec<(&str, NaiveDate, ReconStatus)> = rows
        .iter()
        .map(|r| (r.vendor_id.as_str(), r.month, r.status))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("10670", NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(), ReconStatus::Matched),
            ("10670", NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(), ReconStatus::TransferOnly),
            ("10671", NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(), ReconStatus::StatementOnly),
        ]
    );
    assert!((rows[0].diff.unwrap() - 0.4).abs() < 1e-9);
    assert_eq!(rows[0].statement_amount, Some(800.0));
    assert_eq!(rows[1].diff, None);
}

#[test]
fn test_treasury_transfers_loaded_from_csv() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let conn = shared_connection(&db_path);

    import_statement(&conn, dir.path(), STM_FILE, &[("REP1", "T100", "1200")]);

    let csv_path = dir.path().join("transfers.csv");
    std::fs::write(
        &csv_path,
        "vendor_id,transfer_date,amount,reference\n10670,20/09/2568,\"1,000.00\",TRF-1\n10670,25/09/2568,200,TRF-2\n",
    )
    .unwrap();
    let treasury = TreasuryRepository::from_connection(conn.clone());
    assert_eq!(import_transfers_csv(&treasury, &csv_path).unwrap(), 2);
    assert_eq!(treasury.list_transfers("10670").unwrap().len(), 2);

    let rows = engine(&conn).compare_treasury().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, ReconStatus::Matched);
    assert_eq!(rows[0].diff, Some(0.0));
}

#[test]
fn test_configured_tolerance_is_applied() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let conn = shared_connection(&db_path);

    import_claims(&conn, dir.path(), CLAIM_FILE, &[claim_line("REP1", "T100", "500.50")]);
    let file_id = import_statement(&conn, dir.path(), STM_FILE, &[("REP1", "T100", "500")]);

    set_config(&db_path, config_keys::RECON_TOLERANCE, "0.1");
    let outcome = engine(&conn).reconcile_file(file_id);
    assert!(outcome.success);

    let items = StatementRepository::from_connection(conn.clone())
        .list_items_view(Some(file_id))
        .unwrap();
    assert_eq!(items[0].reconciliation_status, Some(ReconStatus::AmountDiffers));
}

#[test]
fn test_reconcile_failure_is_reported() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = shared_connection(&db_path);

    conn.lock()
        .unwrap()
        .execute_batch("DROP TABLE stm_claim_item;")
        .unwrap();

    let outcome = engine(&conn).reconcile_all();
    assert!(!outcome.success);
    assert_eq!(outcome.updated_rows, 0);
    assert!(outcome.error.is_some());
}

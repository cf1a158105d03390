// ==========================================
// 订单簿回填 集成测试
// ==========================================
// 测试目标: 订单状态导出 + 客户订单簿 → 预计交期 / 状态回填 → .xlsx
// ==========================================


use chrono::{Duration, NaiveDateTime};
use production_planner::api::{ApiError, PlanningApi};
use production_planner::domain::CellValue;
use production_planner::importer::{ImportError, UniversalFileParser};
use production_planner::logging;
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use test_helpers::{orderbook_csv, status_export_csv, write_lines, ymd, MockConfig};

const ETA_COL: usize = 23; // X
const STATUS_COL: usize = 31; // AF

fn run_time() -> NaiveDateTime {
    ymd(2024, 1, 20).and_hms_opt(9, 30, 0).unwrap()
}

#[test]
fn test_compile_orderbook_end_to_end() {
    logging::init_test();
    let dir = TempDir::new().unwrap();
    let api = PlanningApi::new(Arc::new(MockConfig::in_dir(dir.path())));
    let today = ymd(2024, 1, 20);

    let response = api
        .compile_orderbook(
            &status_export_csv(dir.path()),
            &orderbook_csv(dir.path()),
            None,
            today,
            run_time(),
        )
        .unwrap();

    assert_eq!(response.stats.updated, 2);
    assert_eq!(response.stats.no_match, 1);
    assert_eq!(response.stats.skipped, 1);
    assert_eq!(response.stats.rows, 4);
    // MAT-03 缺 ODA，不进入匹配表
    assert_eq!(response.planner_entries, 2);
    assert_eq!(response.missing_base_date, 1);
    assert!(response
        .output_path
        .ends_with("orderbook_compilato_20240120_0930.xlsx"));

    let grid = UniversalFileParser.parse(&response.output_path, None).unwrap();

    // 固定状态: 基准日 + 7 天
    assert_eq!(grid.cell(1, ETA_COL), &CellValue::Text("22/01/2024".to_string()));
    assert_eq!(
        grid.cell(1, STATUS_COL),
        &CellValue::Text("SALA METROLOGICA".to_string())
    );

    // 基准日缺失 → 按今天计算，OUTSOURCING 区间 [10, 14]
    let eta = match grid.cell(2, ETA_COL) {
        CellValue::Text(text) => chrono::NaiveDate::parse_from_str(text, "%d/%m/%Y").unwrap(),
        other => panic!("unexpected eta cell: {other:?}"),
    };
    assert!(eta >= today + Duration::days(10) && eta <= today + Duration::days(14));
    assert_eq!(grid.cell(2, STATUS_COL), &CellValue::Text("OUTSOURCING".to_string()));

    // 未匹配 / 键不完整的行保持原样
    assert!(grid.cell(3, ETA_COL).is_empty());
    assert!(grid.cell(4, STATUS_COL).is_empty());
    assert_eq!(grid.cell(3, 0), &CellValue::Text("MAT-09".to_string()));
}

#[test]
fn test_compile_is_reproducible() {
    let dir = TempDir::new().unwrap();
    let api = PlanningApi::new(Arc::new(MockConfig::in_dir(dir.path())));
    let status = status_export_csv(dir.path());
    let orderbook = orderbook_csv(dir.path());
    let first = dir.path().join("a.xlsx");
    let second = dir.path().join("b.xlsx");

    for output in [&first, &second] {
        api.compile_orderbook(&status, &orderbook, Some(output), ymd(2024, 1, 20), run_time())
            .unwrap();
    }

    let a = UniversalFileParser.parse(&first, None).unwrap();
    let b = UniversalFileParser.parse(&second, None).unwrap();
    assert_eq!(a.cell(2, ETA_COL), b.cell(2, ETA_COL));
}

#[test]
fn test_status_export_missing_columns() {
    let dir = TempDir::new().unwrap();
    let api = PlanningApi::new(Arc::new(MockConfig::in_dir(dir.path())));
    let broken = write_lines(
        dir.path(),
        "ORDINI_export.csv",
        &["CODICE;ODA;POS", "MAT-01;4500012345;10"],
    );

    let err = api
        .compile_orderbook(
            &broken,
            &orderbook_csv(dir.path()),
            None,
            ymd(2024, 1, 20),
            run_time(),
        )
        .unwrap_err();

    match err {
        ApiError::ImportError(ImportError::MissingColumns { missing, .. }) => {
            assert_eq!(missing, vec!["STATO", "DATA_PASSAGGIO_PRD"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!dir
        .path()
        .join("orderbook_compilato_20240120_0930.xlsx")
        .exists());
}

#[test]
fn test_missing_orderbook_file() {
    let dir = TempDir::new().unwrap();
    let api = PlanningApi::new(Arc::new(MockConfig::in_dir(dir.path())));

    let err = api
        .compile_orderbook(
            &status_export_csv(dir.path()),
            &dir.path().join("nope.xlsx"),
            None,
            ymd(2024, 1, 20),
            run_time(),
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::ImportError(ImportError::FileNotFound(_))));
}

/// 订单状态导出 .xlsx: ORDINI 不是第一张表，表头从 B2 开始，基准日为原生日期
fn status_export_xlsx(dir: &Path) -> PathBuf {
    let path = dir.join("ORDINI_export.xlsx");
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");

    let summary = workbook.add_worksheet();
    summary.set_name("Riepilogo").unwrap();
    summary.write_string(0, 0, "Totale ordini").unwrap();

    let orders = workbook.add_worksheet();
    orders.set_name("ORDINI").unwrap();
    for (c, header) in ["CODICE", "ODA", "POS", "STATO", "DATA_PASSAGGIO_PRD"]
        .iter()
        .enumerate()
    {
        orders.write_string(1, c as u16 + 1, *header).unwrap();
    }
    orders.write_string(2, 1, "MAT-01").unwrap();
    orders.write_number(2, 2, 4500012345.0).unwrap();
    orders.write_number(2, 3, 10.0).unwrap();
    orders.write_string(2, 4, "SALA METROLOGICA").unwrap();
    orders
        .write_number_with_format(2, 5, 45306.0, &date_format)
        .unwrap();

    workbook.save(&path).unwrap();
    path
}

/// 客户订单簿 .xlsx: 第一张表回填，第二张为说明表
fn orderbook_xlsx(dir: &Path) -> PathBuf {
    let path = dir.join("orderbook.xlsx");
    let mut workbook = Workbook::new();

    let book = workbook.add_worksheet();
    book.set_name("Orderbook").unwrap();
    for (c, header) in ["Materiale", "Descrizione", "Cliente", "Note", "ODA", "Pos"]
        .iter()
        .enumerate()
    {
        book.write_string(0, c as u16, *header).unwrap();
    }
    book.write_string(1, 0, "MAT-01").unwrap();
    book.write_string(1, 1, "Flangia").unwrap();
    book.write_number(1, 4, 4500012345.0).unwrap();
    book.write_number(1, 5, 10.0).unwrap();

    let legend = workbook.add_worksheet();
    legend.set_name("Legenda").unwrap();
    legend.write_string(0, 0, "X = consegna prevista").unwrap();
    legend.write_string(1, 0, "AF = stato").unwrap();

    workbook.save(&path).unwrap();
    path
}

#[test]
fn test_compile_xlsx_inputs_keeps_every_sheet() {
    let dir = TempDir::new().unwrap();
    let api = PlanningApi::new(Arc::new(MockConfig::in_dir(dir.path())));
    let output = dir.path().join("compilato.xlsx");

    let response = api
        .compile_orderbook(
            &status_export_xlsx(dir.path()),
            &orderbook_xlsx(dir.path()),
            Some(&output),
            ymd(2024, 1, 20),
            run_time(),
        )
        .unwrap();

    assert_eq!(response.stats.updated, 1);
    assert_eq!(response.planner_entries, 1);
    // 原生日期单元格被识别为基准日
    assert_eq!(response.missing_base_date, 0);

    let sheets = UniversalFileParser.parse_all(&output).unwrap();
    let names: Vec<&str> = sheets.iter().map(|g| g.sheet_name.as_str()).collect();
    assert_eq!(names, vec!["Orderbook", "Legenda"]);

    let book = &sheets[0];
    assert_eq!(book.cell(1, ETA_COL), &CellValue::Text("22/01/2024".to_string()));
    assert_eq!(
        book.cell(1, STATUS_COL),
        &CellValue::Text("SALA METROLOGICA".to_string())
    );
    assert_eq!(book.cell(1, 1), &CellValue::Text("Flangia".to_string()));

    let legend = &sheets[1];
    assert_eq!(legend.row_count(), 2);
    assert_eq!(legend.cell(1, 0), &CellValue::Text("AF = stato".to_string()));
}

//! End-to-end receipt grid imports against an in-memory database.

use chrono::NaiveDate;
use roque_core::{Cell, Money};
use roque_db::{ClientRepository, Database, DbConfig, ReceiptRepository, SaleRepository};
use roque_import::{
    import_receipt_sheet, import_receipts, ImportError, ReceiptSheetLayout, Sheet, Workbook,
};

async fn db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

fn text(s: &str) -> Cell {
    Cell::from(s)
}

/// Four title rows, the header on row 5, data from row 6.
fn grid(data: Vec<Vec<Cell>>) -> Sheet {
    let mut rows = vec![
        vec![text("DISTRIBUIDORA")],
        vec![text("RELACION DE REMISIONES ENTREGADAS")],
        vec![],
        vec![],
        vec![
            Cell::Empty,
            Cell::Empty,
            text("CLAVE"),
            text("COMERCIO"),
            text("CONTACTO"),
            text("LUN  03/Nov/25"),
            text("MAR  04/Nov/25"),
        ],
    ];
    rows.extend(data);
    Sheet::new("REL REM ENTREG1", rows)
}

fn client_row(key: &str, name: &str, mon: Cell, tue: Cell) -> Vec<Cell> {
    vec![
        Cell::Empty,
        Cell::Empty,
        text(key),
        text(name),
        text("Lupe"),
        mon,
        tue,
    ]
}

#[tokio::test]
async fn single_receipt_creates_empty_sale() {
    let db = db().await;
    let sheet = grid(vec![client_row(
        "PRO0002",
        "Abarrotes Lupita",
        text("Remision K-0070"),
        Cell::Empty,
    )]);

    let summary = import_receipt_sheet(&db, &sheet, &ReceiptSheetLayout::default())
        .await
        .unwrap();
    assert_eq!(summary.receipts_created, 1);
    assert_eq!(summary.sales_created, 1);
    assert_eq!(summary.clients_created, 1);
    assert_eq!(summary.date_columns, 2);

    let mut conn = db.acquire().await.unwrap();
    let client = ClientRepository::new(&mut conn)
        .find_by_provider("PRO0002")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(client.display_name, "Abarrotes Lupita");
    assert_eq!(client.contact, "Lupe");

    let receipt = ReceiptRepository::new(&mut conn)
        .find_by_client_folio(&client.id, "K-0070")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(receipt.date, NaiveDate::from_ymd_opt(2025, 11, 3).unwrap());

    let sale = SaleRepository::new(&mut conn)
        .find_by_receipt(&receipt.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sale.date, receipt.date);
    assert_eq!(sale.total(), Money::zero());
    assert!(SaleRepository::new(&mut conn)
        .get_lines(&sale.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn second_run_creates_nothing() {
    let db = db().await;
    let sheet = grid(vec![
        client_row("PRO0002", "A", text("Remision K-0070"), text("Remisión K-0071")),
        client_row("PRO0003", "B", Cell::Empty, text("remision K-0090")),
        client_row("", "sin clave", text("Remision K-0001"), Cell::Empty),
        vec![],
    ]);
    let layout = ReceiptSheetLayout::default();

    let first = import_receipt_sheet(&db, &sheet, &layout).await.unwrap();
    assert_eq!(first.receipts_created, 3);
    assert_eq!(first.sales_created, 3);
    assert_eq!(first.rows_skipped, 2);

    let second = import_receipt_sheet(&db, &sheet, &layout).await.unwrap();
    assert_eq!(second.receipts_created, 0);
    assert_eq!(second.sales_created, 0);
    assert_eq!(second.clients_created, 0);
    assert_eq!(second.receipts_existing, 3);

    let mut conn = db.acquire().await.unwrap();
    assert_eq!(ReceiptRepository::new(&mut conn).count().await.unwrap(), 3);
    assert_eq!(SaleRepository::new(&mut conn).count().await.unwrap(), 3);
    assert_eq!(ClientRepository::new(&mut conn).count().await.unwrap(), 2);
}

#[tokio::test]
async fn existing_receipt_keeps_first_date() {
    let db = db().await;
    // same folio under both dates for one client
    let sheet = grid(vec![client_row(
        "PRO0002",
        "A",
        text("Remision K-0070"),
        text("Remision K-0070"),
    )]);

    let summary = import_receipt_sheet(&db, &sheet, &ReceiptSheetLayout::default())
        .await
        .unwrap();
    assert_eq!((summary.receipts_created, summary.receipts_existing), (1, 1));

    let mut conn = db.acquire().await.unwrap();
    let listing = ReceiptRepository::new(&mut conn).list(None).await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].date, NaiveDate::from_ymd_opt(2025, 11, 3).unwrap());
}

#[tokio::test]
async fn missing_sheet_names_available_sheets() {
    let db = db().await;
    let workbook = Workbook {
        sheets: vec![Sheet::new("Hoja1", vec![])],
    };

    let err = import_receipts(&db, &workbook, &ReceiptSheetLayout::default())
        .await
        .unwrap_err();
    match err {
        ImportError::MissingSheet { name, available } => {
            assert_eq!(name, "REL REM ENTREG1");
            assert_eq!(available, vec!["Hoja1"]);
        }
        other => panic!("expected MissingSheet, got {:?}", other),
    }
}

#[tokio::test]
async fn header_without_dates_writes_nothing() {
    let db = db().await;
    let mut rows = vec![vec![]; 4];
    rows.push(vec![text("CLAVE"), text("COMERCIO")]);
    rows.push(vec![Cell::Empty, Cell::Empty, text("PRO0002"), text("A"), Cell::Empty, text("Remision K-1")]);
    let sheet = Sheet::new("REL REM ENTREG1", rows);

    let err = import_receipt_sheet(&db, &sheet, &ReceiptSheetLayout::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::NoDateColumns { row: 5 }));

    let mut conn = db.acquire().await.unwrap();
    assert_eq!(ClientRepository::new(&mut conn).count().await.unwrap(), 0);
}

#[tokio::test]
async fn csv_workbook_with_custom_sheet_name() {
    // csv skips empty lines, so the padding rows carry a lone comma
    let db = db().await;
    let csv = "DISTRIBUIDORA\n,\n,\n,\n,,CLAVE,COMERCIO,CONTACTO,LUN 03/Nov/25\n,,PRO0002,A,,Remision K-0070\n";
    let workbook = Workbook::from_bytes(csv.as_bytes(), "csv").unwrap();
    let layout = ReceiptSheetLayout::default().with_sheet("Sheet1");

    let summary = import_receipts(&db, &workbook, &layout).await.unwrap();
    assert_eq!(summary.receipts_created, 1);
}

#[tokio::test]
async fn failure_mid_sheet_rolls_back_earlier_rows() {
    let db = db().await;
    sqlx::query(
        "CREATE TEMP TRIGGER reject_folio BEFORE INSERT ON receipts \
         WHEN NEW.folio = 'K-0090' BEGIN SELECT RAISE(ABORT, 'folio rejected'); END",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let sheet = grid(vec![
        client_row("PRO0002", "A", text("Remision K-0070"), text("Remision K-0071")),
        client_row("PRO0003", "B", Cell::Empty, text("Remision K-0090")),
    ]);

    let err = import_receipt_sheet(&db, &sheet, &ReceiptSheetLayout::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::Db(_)), "got {:?}", err);

    let mut conn = db.acquire().await.unwrap();
    assert_eq!(ClientRepository::new(&mut conn).count().await.unwrap(), 0);
    assert_eq!(ReceiptRepository::new(&mut conn).count().await.unwrap(), 0);
    assert_eq!(SaleRepository::new(&mut conn).count().await.unwrap(), 0);
}

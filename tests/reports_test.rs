mod common;

use common::TestApp;
use hotel_backoffice::services::guests::CheckInInput;
use hotel_backoffice::services::reports::{
    GUEST_HEADERS, INVENTORY_HEADERS, SALES_HEADERS, WALK_IN_CUSTOMER,
};
use hotel_backoffice::services::sales::RecordSaleInput;
use rust_decimal_macros::dec;

#[tokio::test]
async fn workbook_contains_three_sheets_with_fixed_columns() {
    let app = TestApp::new().await;
    let workbook = app
        .state
        .services
        .reports
        .export_workbook()
        .await
        .expect("export");

    assert_eq!(workbook.guests.title, "Guests");
    assert_eq!(workbook.inventory.title, "Inventory");
    assert_eq!(workbook.sales.title, "Sales");
    assert_eq!(workbook.guests.headers, GUEST_HEADERS);
    assert_eq!(workbook.inventory.headers, INVENTORY_HEADERS);
    assert_eq!(workbook.sales.headers, SALES_HEADERS);
    assert!(workbook.guests.rows.is_empty());
    assert_eq!(workbook.sales.to_table().len(), 1);
}

#[tokio::test]
async fn sales_sheet_names_guests_and_walk_in_customers() {
    let app = TestApp::new().await;
    let category = app.seed_category("Minibar").await;
    let soda = app.seed_product("Soda", 10, dec!(1.25), category.id).await;
    let guest = app
        .state
        .services
        .guests
        .check_in(CheckInInput {
            name: "Ana".into(),
            surname: "Lopez".into(),
            national_id: None,
            room_id: None,
            price_paid: None,
        })
        .await
        .unwrap();

    let sales = app.state.services.sales.clone();
    sales
        .record_sale(RecordSaleInput {
            product_id: soda.id,
            quantity: 2,
            guest_id: Some(guest.id),
        })
        .await
        .unwrap();
    sales
        .record_sale(RecordSaleInput {
            product_id: soda.id,
            quantity: 1,
            guest_id: None,
        })
        .await
        .unwrap();

    let sheet = app.state.services.reports.sales_sheet().await.unwrap();
    assert_eq!(sheet.rows.len(), 2);

    let named = sheet.rows.iter().find(|r| r.quantity == 2).unwrap();
    assert_eq!(named.customer, "Ana Lopez");
    assert_eq!(named.product, "Soda");
    assert_eq!(named.total, dec!(2.50));

    let walk_in = sheet.rows.iter().find(|r| r.quantity == 1).unwrap();
    assert_eq!(walk_in.customer, WALK_IN_CUSTOMER);
}

#[tokio::test]
async fn inventory_sheet_reports_category_names_and_stock() {
    let app = TestApp::new().await;
    let category = app.seed_category("Toiletries").await;
    let soap = app.seed_product("Soap", 10, dec!(2.00), category.id).await;
    app.state
        .services
        .sales
        .record_sale(RecordSaleInput {
            product_id: soap.id,
            quantity: 3,
            guest_id: None,
        })
        .await
        .unwrap();

    let sheet = app.state.services.reports.inventory_sheet().await.unwrap();
    assert_eq!(sheet.rows.len(), 1);
    let row = &sheet.rows[0];
    assert_eq!(row.id, soap.id);
    assert_eq!(row.category, "Toiletries");
    assert_eq!(row.quantity, 7);
    assert_eq!(row.price, dec!(2.00));
}

#[tokio::test]
async fn guests_sheet_shows_open_and_closed_stays() {
    let app = TestApp::new().await;
    let room = app.seed_room("101", dec!(50)).await;
    let guests = app.state.services.guests.clone();

    let ana = guests
        .check_in(CheckInInput {
            name: "Ana".into(),
            surname: "Lopez".into(),
            national_id: None,
            room_id: Some(room.id),
            price_paid: Some(dec!(50)),
        })
        .await
        .unwrap();
    guests.check_out(ana.id).await.unwrap();
    guests
        .check_in(CheckInInput {
            name: "Luis".into(),
            surname: "Mora".into(),
            national_id: None,
            room_id: Some(room.id),
            price_paid: None,
        })
        .await
        .unwrap();

    let table = app.state.services.reports.guests_sheet().await.unwrap().to_table();
    assert_eq!(table.len(), 3);
    assert_eq!(table[0], GUEST_HEADERS.to_vec());

    let ana_row = table.iter().find(|r| r[1] == "Ana").unwrap();
    assert!(!ana_row[4].is_empty());
    let luis_row = table.iter().find(|r| r[1] == "Luis").unwrap();
    assert_eq!(luis_row[4], "");
}

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn health_endpoints_report_up() {
    let app = TestApp::new().await;

    let (status, body) = app.request_json(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["details"]["database"]["status"], "up");

    let (status, body) = app.request_json(Method::GET, "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);

    let (status, body) = app.request_json(Method::GET, "/health/live", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alive"], true);

    let (status, body) = app.request_json(Method::GET, "/api/v1/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn every_response_carries_a_request_id() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/rooms", None).await;
    assert!(response.headers().contains_key("x-request-id"));

    let response = app
        .request(
            Method::GET,
            "/api/v1/rooms/00000000-0000-0000-0000-000000000000",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let header = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("request id header");
    let body = response_json(response).await;
    assert_eq!(body["request_id"], header.as_str());
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn guest_stay_over_http() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/rooms",
            Some(json!({ "number": "101", "price": "50.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["available"], true);
    let room_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/guests",
            Some(json!({ "name": "Ana", "surname": "Lopez", "room_id": room_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let guest_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = app
        .request_json(Method::GET, &format!("/api/v1/rooms/{room_id}"), None)
        .await;
    assert_eq!(body["data"]["available"], false);

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/guests",
            Some(json!({ "name": "Luis", "surname": "Mora", "room_id": room_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("101"));

    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/guests/{guest_id}/check-out"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["check_out_time"].is_string());

    let (_, body) = app
        .request_json(Method::GET, "/api/v1/rooms/available", None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn bulk_check_out_requires_a_selection() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/v1/guests/check-out",
            Some(json!({ "guest_ids": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let guest = app
        .request_json(
            Method::POST,
            "/api/v1/guests",
            Some(json!({ "name": "Eva", "surname": "Ruiz" })),
        )
        .await
        .1;
    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/guests/check-out",
            Some(json!({ "guest_ids": [guest["data"]["id"]] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["skipped"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn selling_more_than_stock_is_unprocessable() {
    let app = TestApp::new().await;
    let category = app.seed_category("Toiletries").await;
    let soap = app.seed_product("Soap", 10, dec!(2.00), category.id).await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/sales",
            Some(json!({ "product_id": soap.id, "quantity": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let total: Decimal = body["data"]["total"].as_str().unwrap().parse().unwrap();
    assert_eq!(total, dec!(6.00));

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/sales",
            Some(json!({ "product_id": soap.id, "quantity": 8 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["message"],
        "Insufficient stock for Soap: only 7 available, 8 requested"
    );

    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/v1/sales",
            Some(json!({ "product_id": soap.id, "quantity": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app
        .request_json(Method::GET, &format!("/api/v1/products/{}", soap.id), None)
        .await;
    assert_eq!(body["data"]["quantity"], 7);
}

#[tokio::test]
async fn listings_are_paginated() {
    let app = TestApp::new().await;
    for number in ["101", "102", "103"] {
        app.seed_room(number, dec!(40)).await;
    }

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/rooms?page=2&per_page=2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let page = &body["data"];
    assert_eq!(page["total"], 3);
    assert_eq!(page["page"], 2);
    assert_eq!(page["limit"], 2);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["items"][0]["number"], "103");

    let (status, _) = app
        .request_json(Method::GET, "/api/v1/rooms?page=0", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_filters_apply_over_http() {
    let app = TestApp::new().await;
    let minibar = app.seed_category("Minibar").await;
    let linens = app.seed_category("Linens").await;
    app.seed_product("Soda", 5, dec!(1.25), minibar.id).await;
    app.seed_product("Chips", 0, dec!(1.75), minibar.id).await;
    app.seed_product("Towel", 3, dec!(9.00), linens.id).await;

    let (_, body) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/products?category_id={}&in_stock=true", minibar.id),
            None,
        )
        .await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Soda");

    let (_, body) = app
        .request_json(Method::GET, "/api/v1/products/in-stock", None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn deleting_referenced_records_conflicts() {
    let app = TestApp::new().await;
    let category = app.seed_category("Toiletries").await;
    let soap = app.seed_product("Soap", 10, dec!(2.00), category.id).await;
    app.request_json(
        Method::POST,
        "/api/v1/sales",
        Some(json!({ "product_id": soap.id, "quantity": 1 })),
    )
    .await;

    let response = app
        .request(Method::DELETE, &format!("/api/v1/products/{}", soap.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/categories/{}", category.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn reports_can_be_exported_as_tables() {
    let app = TestApp::new().await;
    let category = app.seed_category("Toiletries").await;
    app.seed_product("Soap", 10, dec!(2.00), category.id).await;

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/reports/inventory?format=table", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let table = body["data"].as_array().unwrap();
    assert_eq!(
        table[0],
        json!(["id", "name", "category", "quantity", "price"])
    );
    assert_eq!(table[1][1], "Soap");
    assert_eq!(table[1][2], "Toiletries");

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/reports/workbook", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sales"]["title"], "Sales");
    assert_eq!(
        body["data"]["sales"]["headers"],
        json!(["timestamp", "product", "quantity", "total", "customer"])
    );
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request_json(Method::GET, "/api-docs/openapi.json", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/sales"].is_object());
}

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use hotel_backoffice::{
    build_router,
    config::AppConfig,
    db,
    entities::{category, product, room},
    events::{self, EventSender},
    services::{
        categories::CategoryInput, products::CreateProductInput, rooms::CreateRoomInput,
    },
    AppState,
};

/// Helper harness for spinning up an application state backed by SQLite.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    // Keeps the database file alive for file-backed apps
    _db_dir: Option<TempDir>,
}

impl TestApp {
    /// Construct a new test application with fresh in-memory database state.
    pub async fn new() -> Self {
        let mut cfg = test_config("sqlite::memory:".to_string());
        // Every pooled connection to `sqlite::memory:` is its own database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        Self::build(cfg, None).await
    }

    /// Test application over a database file shared by `max_connections`
    /// pooled connections, so spawned requests contend for real.
    pub async fn with_connection_pool(max_connections: u32) -> Self {
        let dir = TempDir::new().expect("failed to create database directory");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("hotel.db").display());

        let mut cfg = test_config(url);
        cfg.db_max_connections = max_connections;
        cfg.db_min_connections = 1;

        Self::build(cfg, Some(dir)).await
    }

    async fn build(cfg: AppConfig, db_dir: Option<TempDir>) -> Self {
        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        let router = build_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Send a request against the router, with an optional JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and decodes the JSON response body.
    pub async fn request_json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        (status, response_json(response).await)
    }

    pub async fn seed_room(&self, number: &str, price: Decimal) -> room::Model {
        self.state
            .services
            .rooms
            .create_room(CreateRoomInput {
                number: number.to_string(),
                price,
                has_aircon: false,
            })
            .await
            .expect("seed room for tests")
    }

    pub async fn seed_category(&self, name: &str) -> category::Model {
        self.state
            .services
            .categories
            .create_category(CategoryInput {
                name: name.to_string(),
            })
            .await
            .expect("seed category for tests")
    }

    pub async fn seed_product(
        &self,
        name: &str,
        quantity: i32,
        price: Decimal,
        category_id: Uuid,
    ) -> product::Model {
        self.state
            .services
            .products
            .create_product(CreateProductInput {
                name: name.to_string(),
                description: String::new(),
                quantity,
                price,
                category_id,
            })
            .await
            .expect("seed product for tests")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

fn test_config(database_url: String) -> AppConfig {
    AppConfig::new(
        database_url,
        "127.0.0.1".to_string(),
        18_080,
        "test".to_string(),
    )
}

/// Reads a response body as JSON; an empty body decodes to `Value::Null`.
pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is not JSON")
    }
}

pub mod categories;
pub mod common;
pub mod guests;
pub mod products;
pub mod reports;
pub mod rooms;
pub mod sales;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    categories::CategoryService, guests::GuestService, products::ProductService,
    reports::ReportService, rooms::RoomService, sales::SaleService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub rooms: Arc<RoomService>,
    pub guests: Arc<GuestService>,
    pub categories: Arc<CategoryService>,
    pub products: Arc<ProductService>,
    pub sales: Arc<SaleService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    /// Build every service over one pool and one event channel
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            rooms: Arc::new(RoomService::new(db_pool.clone(), event_sender.clone())),
            guests: Arc::new(GuestService::new(db_pool.clone(), event_sender.clone())),
            categories: Arc::new(CategoryService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            products: Arc::new(ProductService::new(db_pool.clone(), event_sender.clone())),
            sales: Arc::new(SaleService::new(db_pool.clone(), event_sender)),
            reports: Arc::new(ReportService::new(db_pool)),
        }
    }
}

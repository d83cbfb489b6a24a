use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{category, guest, product, sale};
use crate::errors::ServiceError;

/// Customer label for sales without a guest
pub const WALK_IN_CUSTOMER: &str = "general customer";

pub const GUEST_HEADERS: [&str; 5] = ["id", "name", "surname", "check_in", "check_out"];
pub const INVENTORY_HEADERS: [&str; 5] = ["id", "name", "category", "quantity", "price"];
pub const SALES_HEADERS: [&str; 5] = ["timestamp", "product", "quantity", "total", "customer"];

/// A row that can be laid out as spreadsheet cells
pub trait SheetRow {
    /// Cell values in column order
    fn cells(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GuestRow {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
}

impl SheetRow for GuestRow {
    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.surname.clone(),
            self.check_in.to_rfc3339(),
            self.check_out.map(|t| t.to_rfc3339()).unwrap_or_default(),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryRow {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
}

impl SheetRow for InventoryRow {
    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.category.clone(),
            self.quantity.to_string(),
            self.price.to_string(),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SaleRow {
    pub timestamp: DateTime<Utc>,
    pub product: String,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub customer: String,
}

impl SheetRow for SaleRow {
    fn cells(&self) -> Vec<String> {
        vec![
            self.timestamp.to_rfc3339(),
            self.product.clone(),
            self.quantity.to_string(),
            self.total.to_string(),
            self.customer.clone(),
        ]
    }
}

/// One worksheet: a title, its column headers and typed rows
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Sheet<R> {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<R>,
}

impl<R: SheetRow> Sheet<R> {
    fn new(title: &str, headers: &[&str], rows: Vec<R>) -> Self {
        Self {
            title: title.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    /// Header row followed by every data row, as plain cells
    pub fn to_table(&self) -> Vec<Vec<String>> {
        std::iter::once(self.headers.clone())
            .chain(self.rows.iter().map(SheetRow::cells))
            .collect()
    }
}

/// All three sheets of the back-office export
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Workbook {
    pub guests: Sheet<GuestRow>,
    pub inventory: Sheet<InventoryRow>,
    pub sales: Sheet<SaleRow>,
}

/// Read-only exports consumed by the admin layer
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn guests_sheet(&self) -> Result<Sheet<GuestRow>, ServiceError> {
        let guests = guest::Entity::find()
            .order_by_asc(guest::Column::CheckInTime)
            .all(&*self.db)
            .await?;

        let rows = guests
            .into_iter()
            .map(|g| GuestRow {
                id: g.id,
                name: g.name,
                surname: g.surname,
                check_in: g.check_in_time,
                check_out: g.check_out_time,
            })
            .collect();

        Ok(Sheet::new("Guests", &GUEST_HEADERS, rows))
    }

    #[instrument(skip(self))]
    pub async fn inventory_sheet(&self) -> Result<Sheet<InventoryRow>, ServiceError> {
        let products = product::Entity::find()
            .find_also_related(category::Entity)
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?;

        let rows = products
            .into_iter()
            .map(|(p, c)| InventoryRow {
                id: p.id,
                name: p.name,
                category: c.map(|c| c.name).unwrap_or_default(),
                quantity: p.quantity,
                price: p.price,
            })
            .collect();

        Ok(Sheet::new("Inventory", &INVENTORY_HEADERS, rows))
    }

    #[instrument(skip(self))]
    pub async fn sales_sheet(&self) -> Result<Sheet<SaleRow>, ServiceError> {
        let sales = sale::Entity::find()
            .find_also_related(product::Entity)
            .order_by_asc(sale::Column::SoldAt)
            .all(&*self.db)
            .await?;

        let guest_names: HashMap<Uuid, String> = guest::Entity::find()
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|g| (g.id, g.full_name()))
            .collect();

        let rows = sales
            .into_iter()
            .map(|(s, p)| SaleRow {
                timestamp: s.sold_at,
                product: p.map(|p| p.name).unwrap_or_default(),
                quantity: s.quantity,
                total: s.total,
                customer: s
                    .guest_id
                    .and_then(|id| guest_names.get(&id).cloned())
                    .unwrap_or_else(|| WALK_IN_CUSTOMER.to_string()),
            })
            .collect();

        Ok(Sheet::new("Sales", &SALES_HEADERS, rows))
    }

    #[instrument(skip(self))]
    pub async fn export_workbook(&self) -> Result<Workbook, ServiceError> {
        let workbook = Workbook {
            guests: self.guests_sheet().await?,
            inventory: self.inventory_sheet().await?,
            sales: self.sales_sheet().await?,
        };
        info!(
            guests = workbook.guests.rows.len(),
            products = workbook.inventory.rows.len(),
            sales = workbook.sales.rows.len(),
            "Workbook exported"
        );
        Ok(workbook)
    }
}

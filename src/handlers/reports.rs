use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    errors::ApiError,
    handlers::common::{map_service_error, success_response},
    services::reports::{GuestRow, InventoryRow, Sheet, SheetRow, Workbook},
    ApiResponse, AppState,
};

/// Layout of an exported sheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    /// Typed rows with named fields
    #[default]
    Rows,
    /// Header row followed by plain string cells, ready for a spreadsheet
    Table,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SheetQuery {
    pub format: Option<SheetFormat>,
}

fn render<R: SheetRow + Serialize>(sheet: Sheet<R>, query: &SheetQuery) -> Response {
    match query.format.unwrap_or_default() {
        SheetFormat::Rows => success_response(sheet),
        SheetFormat::Table => success_response(sheet.to_table()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/guests",
    summary = "Export the guests sheet",
    params(SheetQuery),
    responses(
        (status = 200, description = "Columns: id, name, surname, check_in, check_out", body = ApiResponse<Sheet<GuestRow>>),
    ),
    tag = "reports"
)]
pub async fn guests_report(
    State(state): State<AppState>,
    Query(query): Query<SheetQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sheet = state
        .services
        .reports
        .guests_sheet()
        .await
        .map_err(map_service_error)?;
    Ok(render(sheet, &query))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/inventory",
    summary = "Export the inventory sheet",
    params(SheetQuery),
    responses(
        (status = 200, description = "Columns: id, name, category, quantity, price", body = ApiResponse<Sheet<InventoryRow>>),
    ),
    tag = "reports"
)]
pub async fn inventory_report(
    State(state): State<AppState>,
    Query(query): Query<SheetQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sheet = state
        .services
        .reports
        .inventory_sheet()
        .await
        .map_err(map_service_error)?;
    Ok(render(sheet, &query))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/sales",
    summary = "Export the sales sheet",
    params(SheetQuery),
    responses(
        (status = 200, description = "Columns: timestamp, product, quantity, total, customer", body = ApiResponse<Sheet<crate::services::reports::SaleRow>>),
    ),
    tag = "reports"
)]
pub async fn sales_report(
    State(state): State<AppState>,
    Query(query): Query<SheetQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sheet = state
        .services
        .reports
        .sales_sheet()
        .await
        .map_err(map_service_error)?;
    Ok(render(sheet, &query))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/workbook",
    summary = "Export all three sheets",
    responses(
        (status = 200, description = "Guests, inventory and sales sheets", body = ApiResponse<Workbook>),
    ),
    tag = "reports"
)]
pub async fn workbook_report(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let workbook = state
        .services
        .reports
        .export_workbook()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(workbook))
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/guests", get(guests_report))
        .route("/inventory", get(inventory_report))
        .route("/sales", get(sales_report))
        .route("/workbook", get(workbook_report))
}

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    entities::sale,
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, paginated, success_response, validate_input,
        PaginationParams,
    },
    services::sales::{RecordSaleInput, SaleFilter, UpdateSaleInput},
    ApiResponse, AppState, PaginatedResponse,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SaleListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub product_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/v1/sales",
    summary = "List sales",
    params(SaleListQuery),
    responses(
        (status = 200, description = "Sales, newest first", body = ApiResponse<PaginatedResponse<sale::Model>>),
        (status = 400, description = "Invalid pagination", body = crate::errors::ErrorResponse),
    ),
    tag = "sales"
)]
pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<SaleListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = PaginationParams::new(query.page, query.per_page).resolve(&state.config)?;
    let filter = SaleFilter {
        product_id: query.product_id,
        guest_id: query.guest_id,
    };

    let (sales, total) = state
        .services
        .sales
        .list_sales(filter, page, limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(paginated(sales, total, page, limit)))
}

#[utoipa::path(
    post,
    path = "/api/v1/sales",
    summary = "Record a sale",
    description = "Takes the units from stock and stores the sale with its total in one transaction.",
    request_body = RecordSaleInput,
    responses(
        (status = 201, description = "Sale recorded", body = ApiResponse<sale::Model>),
        (status = 400, description = "Invalid quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or guest not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not enough stock", body = crate::errors::ErrorResponse),
    ),
    tag = "sales"
)]
pub async fn record_sale(
    State(state): State<AppState>,
    Json(payload): Json<RecordSaleInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let sale = state
        .services
        .sales
        .record_sale(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(sale))
}

#[utoipa::path(
    get,
    path = "/api/v1/sales/{id}",
    summary = "Get sale",
    params(("id" = Uuid, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Sale found", body = ApiResponse<sale::Model>),
        (status = 404, description = "Sale not found", body = crate::errors::ErrorResponse),
    ),
    tag = "sales"
)]
pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = state
        .services
        .sales
        .get_sale(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(sale))
}

#[utoipa::path(
    put,
    path = "/api/v1/sales/{id}",
    summary = "Correct a sale",
    description = "Changes the recorded quantity or customer. Stock and the total are left as recorded.",
    params(("id" = Uuid, Path, description = "Sale ID")),
    request_body = UpdateSaleInput,
    responses(
        (status = 200, description = "Sale updated", body = ApiResponse<sale::Model>),
        (status = 404, description = "Sale or guest not found", body = crate::errors::ErrorResponse),
    ),
    tag = "sales"
)]
pub async fn update_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSaleInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let sale = state
        .services
        .sales
        .update_sale(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(sale))
}

pub fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales).post(record_sale))
        .route("/:id", get(get_sale).put(update_sale))
}

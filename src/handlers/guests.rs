use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::guest,
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, paginated, success_response,
        validate_input, PaginationParams,
    },
    services::guests::{BulkCheckOutResult, CheckInInput, GuestFilter, UpdateGuestInput},
    ApiResponse, AppState, PaginatedResponse,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GuestListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub room_id: Option<Uuid>,
    /// Substring of the first name
    pub name: Option<String>,
    /// Substring of the name, surname or national id
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkCheckOutRequest {
    #[validate(length(min = 1, message = "Select at least one guest"))]
    pub guest_ids: Vec<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/v1/guests",
    summary = "List guests",
    params(GuestListQuery),
    responses(
        (status = 200, description = "Guests, latest check-in first", body = ApiResponse<PaginatedResponse<guest::Model>>),
        (status = 400, description = "Invalid pagination", body = crate::errors::ErrorResponse),
    ),
    tag = "guests"
)]
pub async fn list_guests(
    State(state): State<AppState>,
    Query(query): Query<GuestListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = PaginationParams::new(query.page, query.per_page).resolve(&state.config)?;
    let filter = GuestFilter {
        room_id: query.room_id,
        name: query.name,
        search: query.search,
    };

    let (guests, total) = state
        .services
        .guests
        .list_guests(filter, page, limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(paginated(guests, total, page, limit)))
}

#[utoipa::path(
    post,
    path = "/api/v1/guests",
    summary = "Check a guest in",
    description = "Registers the guest and, when a room is given, marks it occupied in the same transaction.",
    request_body = CheckInInput,
    responses(
        (status = 201, description = "Guest checked in", body = ApiResponse<guest::Model>),
        (status = 400, description = "Invalid guest data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Room not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Room occupied or national id already registered", body = crate::errors::ErrorResponse),
    ),
    tag = "guests"
)]
pub async fn check_in(
    State(state): State<AppState>,
    Json(payload): Json<CheckInInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let guest = state
        .services
        .guests
        .check_in(payload)
        .await
        .map_err(map_service_error)?;

    info!(guest_id = %guest.id, room_id = ?guest.room_id, "Guest checked in via API");
    Ok(created_response(guest))
}

#[utoipa::path(
    get,
    path = "/api/v1/guests/{id}",
    summary = "Get guest",
    params(("id" = Uuid, Path, description = "Guest ID")),
    responses(
        (status = 200, description = "Guest found", body = ApiResponse<guest::Model>),
        (status = 404, description = "Guest not found", body = crate::errors::ErrorResponse),
    ),
    tag = "guests"
)]
pub async fn get_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let guest = state
        .services
        .guests
        .get_guest(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(guest))
}

#[utoipa::path(
    put,
    path = "/api/v1/guests/{id}",
    summary = "Update guest details",
    params(("id" = Uuid, Path, description = "Guest ID")),
    request_body = UpdateGuestInput,
    responses(
        (status = 200, description = "Guest updated", body = ApiResponse<guest::Model>),
        (status = 404, description = "Guest not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "National id already registered", body = crate::errors::ErrorResponse),
    ),
    tag = "guests"
)]
pub async fn update_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGuestInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let guest = state
        .services
        .guests
        .update_guest(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(guest))
}

#[utoipa::path(
    delete,
    path = "/api/v1/guests/{id}",
    summary = "Delete guest",
    description = "Deletes the guest, releasing their room if the stay is still open. Their sales become walk-in sales.",
    params(("id" = Uuid, Path, description = "Guest ID")),
    responses(
        (status = 204, description = "Guest deleted"),
        (status = 404, description = "Guest not found", body = crate::errors::ErrorResponse),
    ),
    tag = "guests"
)]
pub async fn delete_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .guests
        .delete_guest(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

#[utoipa::path(
    post,
    path = "/api/v1/guests/{id}/check-out",
    summary = "Check a guest out",
    description = "Releases the guest's room and stamps the check-out time. A guest without a room is returned unchanged.",
    params(("id" = Uuid, Path, description = "Guest ID")),
    responses(
        (status = 200, description = "Guest checked out", body = ApiResponse<guest::Model>),
        (status = 404, description = "Guest or room not found", body = crate::errors::ErrorResponse),
    ),
    tag = "guests"
)]
pub async fn check_out(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let guest = state
        .services
        .guests
        .check_out(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(guest))
}

#[utoipa::path(
    post,
    path = "/api/v1/guests/check-out",
    summary = "Check out several guests",
    request_body = BulkCheckOutRequest,
    responses(
        (status = 200, description = "Guests checked out", body = ApiResponse<BulkCheckOutResult>),
        (status = 400, description = "No guests selected", body = crate::errors::ErrorResponse),
        (status = 404, description = "A selected guest does not exist", body = crate::errors::ErrorResponse),
    ),
    tag = "guests"
)]
pub async fn check_out_many(
    State(state): State<AppState>,
    Json(payload): Json<BulkCheckOutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let result = state
        .services
        .guests
        .check_out_many(payload.guest_ids)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(result))
}

pub fn guest_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_guests).post(check_in))
        .route("/check-out", post(check_out_many))
        .route(
            "/:id",
            get(get_guest).put(update_guest).delete(delete_guest),
        )
        .route("/:id/check-out", post(check_out))
}

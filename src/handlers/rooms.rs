use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    entities::room,
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, paginated, success_response,
        validate_input, PaginationParams,
    },
    services::rooms::{CreateRoomInput, RoomFilter, UpdateRoomInput},
    ApiResponse, AppState, PaginatedResponse,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoomListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Only free (`true`) or only occupied (`false`) rooms
    pub available: Option<bool>,
    /// Substring of the room number
    pub search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/rooms",
    summary = "List rooms",
    params(RoomListQuery),
    responses(
        (status = 200, description = "Rooms retrieved", body = ApiResponse<PaginatedResponse<room::Model>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid pagination", body = crate::errors::ErrorResponse),
    ),
    tag = "rooms"
)]
pub async fn list_rooms(
    State(state): State<AppState>,
    Query(query): Query<RoomListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = PaginationParams::new(query.page, query.per_page).resolve(&state.config)?;
    let filter = RoomFilter {
        available: query.available,
        search: query.search,
    };

    let (rooms, total) = state
        .services
        .rooms
        .list_rooms(filter, page, limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(paginated(rooms, total, page, limit)))
}

#[utoipa::path(
    get,
    path = "/api/v1/rooms/available",
    summary = "List rooms a guest can check into",
    responses(
        (status = 200, description = "Free rooms", body = ApiResponse<Vec<room::Model>>),
    ),
    tag = "rooms"
)]
pub async fn list_available_rooms(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let rooms = state
        .services
        .rooms
        .list_available_rooms()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(rooms))
}

#[utoipa::path(
    post,
    path = "/api/v1/rooms",
    summary = "Create room",
    request_body = CreateRoomInput,
    responses(
        (status = 201, description = "Room created", body = ApiResponse<room::Model>),
        (status = 400, description = "Invalid room data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Room number already exists", body = crate::errors::ErrorResponse),
    ),
    tag = "rooms"
)]
pub async fn create_room(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoomInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let room = state
        .services
        .rooms
        .create_room(payload)
        .await
        .map_err(map_service_error)?;

    info!(room_id = %room.id, number = %room.number, "Room created via API");
    Ok(created_response(room))
}

#[utoipa::path(
    get,
    path = "/api/v1/rooms/{id}",
    summary = "Get room",
    params(("id" = Uuid, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room found", body = ApiResponse<room::Model>),
        (status = 404, description = "Room not found", body = crate::errors::ErrorResponse),
    ),
    tag = "rooms"
)]
pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let room = state
        .services
        .rooms
        .get_room(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(room))
}

#[utoipa::path(
    put,
    path = "/api/v1/rooms/{id}",
    summary = "Update room",
    params(("id" = Uuid, Path, description = "Room ID")),
    request_body = UpdateRoomInput,
    responses(
        (status = 200, description = "Room updated", body = ApiResponse<room::Model>),
        (status = 404, description = "Room not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Room number already exists", body = crate::errors::ErrorResponse),
    ),
    tag = "rooms"
)]
pub async fn update_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoomInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let room = state
        .services
        .rooms
        .update_room(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(room))
}

#[utoipa::path(
    delete,
    path = "/api/v1/rooms/{id}",
    summary = "Delete room",
    description = "Deletes the room. Guests that stayed in it keep their records without a room.",
    params(("id" = Uuid, Path, description = "Room ID")),
    responses(
        (status = 204, description = "Room deleted"),
        (status = 404, description = "Room not found", body = crate::errors::ErrorResponse),
    ),
    tag = "rooms"
)]
pub async fn delete_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .rooms
        .delete_room(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

pub fn room_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rooms).post(create_room))
        .route("/available", get(list_available_rooms))
        .route("/:id", get(get_room).put(update_room).delete(delete_room))
}

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::category,
    errors::ApiError,
    handlers::common::{created_response, map_service_error, success_response, validate_input},
    services::categories::CategoryInput,
    ApiResponse, AppState,
};

/// Result of deleting a category and its products
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryDeleted {
    pub id: Uuid,
    pub products_removed: u64,
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    summary = "List categories",
    responses(
        (status = 200, description = "Categories ordered by name", body = ApiResponse<Vec<category::Model>>),
    ),
    tag = "inventory"
)]
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let categories = state
        .services
        .categories
        .list_categories()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(categories))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    summary = "Create category",
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<category::Model>),
        (status = 400, description = "Invalid name", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let category = state
        .services
        .categories
        .create_category(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(category))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    summary = "Get category",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<category::Model>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .services
        .categories
        .get_category(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(category))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    summary = "Rename category",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category renamed", body = ApiResponse<category::Model>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn rename_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let category = state
        .services
        .categories
        .rename_category(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(category))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    summary = "Delete category",
    description = "Deletes the category and every product in it, unless one of those products has sales.",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<CategoryDeleted>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Products of this category have sales", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let products_removed = state
        .services
        .categories
        .delete_category(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(CategoryDeleted {
        id,
        products_removed,
    }))
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category)
                .put(rename_category)
                .delete(delete_category),
        )
}

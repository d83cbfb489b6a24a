use crate::config::AppConfig;
use crate::errors::{ApiError, ServiceError};
use crate::{ApiResponse, PaginatedResponse};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Pagination parameters for list operations
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
pub struct PaginationParams {
    /// Page number, starting at 1
    pub page: Option<u64>,
    /// Items per page; clamped to the configured maximum
    pub per_page: Option<u64>,
}

impl PaginationParams {
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self { page, per_page }
    }

    /// Resolves the requested page against the configured page sizes
    pub fn resolve(&self, config: &AppConfig) -> Result<(u64, u64), ApiError> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(ApiError::BadRequest {
                message: "page must be greater than 0".to_string(),
            });
        }
        Ok((page, config.effective_page_size(self.per_page)))
    }
}

/// Number of pages needed for `total` items
pub fn total_pages(total: u64, per_page: u64) -> u64 {
    if total == 0 || per_page == 0 {
        0
    } else {
        (total + per_page - 1) / per_page
    }
}

/// Wraps one page of a listing together with its counts
pub fn paginated<T>(items: Vec<T>, total: u64, page: u64, limit: u64) -> PaginatedResponse<T> {
    PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages: total_pages(total, limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            8080,
            "test".into(),
        )
    }

    #[test]
    fn missing_params_fall_back_to_defaults() {
        let (page, limit) = PaginationParams::default().resolve(&config()).unwrap();
        assert_eq!(page, 1);
        assert_eq!(limit, config().default_page_size);
    }

    #[test]
    fn page_zero_is_rejected() {
        let err = PaginationParams::new(Some(0), None)
            .resolve(&config())
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { .. }));
    }

    #[test]
    fn oversized_pages_are_clamped() {
        let cfg = config();
        let (_, limit) = PaginationParams::new(Some(2), Some(10_000))
            .resolve(&cfg)
            .unwrap();
        assert_eq!(limit, cfg.max_page_size);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
    }
}

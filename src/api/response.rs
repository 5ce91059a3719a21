use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config;
use crate::error::ApiError;

/// Wrapper for API responses that automatically adds the success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self { data, status_code: None, pagination: None }
    }

    /// Create an API response with custom status code
    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self { data, status_code: Some(status_code), pagination: None }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }

    /// Create a list response carrying a pagination block
    pub fn paginated(data: T, page: i64, limit: i64, total: i64) -> Self {
        Self {
            data,
            status_code: None,
            pagination: Some(Pagination::new(page, limit, total)),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        // Convert data to JSON Value for consistent envelope format
        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "Failed to serialize response data"
                    })),
                )
                    .into_response();
            }
        };

        // Wrap in success envelope
        let mut envelope = json!({
            "success": true,
            "data": data_value
        });
        if let Some(pagination) = &self.pagination {
            envelope["pagination"] = json!(pagination);
        }

        (status, Json(envelope)).into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self { total, page, limit, total_pages }
    }
}

/// Pagination query parameters shared by list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Validate and resolve to concrete (page, limit). Non-positive values
    /// are rejected; limit is capped at the configured maximum.
    pub fn resolve(self) -> Result<(i64, i64), ApiError> {
        let cfg = &config::config().api;
        self.resolve_with(cfg.default_page_limit, cfg.max_page_limit)
    }

    fn resolve_with(self, default_limit: i64, max_limit: i64) -> Result<(i64, i64), ApiError> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(default_limit);

        if page < 1 {
            return Err(ApiError::validation("page must be a positive integer"));
        }
        if limit < 1 {
            return Err(ApiError::validation("limit must be a positive integer"));
        }
        if limit > max_limit {
            return Err(ApiError::validation(format!(
                "limit must not exceed {}",
                max_limit
            )));
        }
        Ok((page, limit))
    }

    pub fn offset(page: i64, limit: i64) -> i64 {
        (page - 1) * limit
    }
}

/// Type alias used by every handler: success envelope or mapped error
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rounds_total_pages_up() {
        let p = Pagination::new(1, 20, 41);
        assert_eq!(p.total_pages, 3);
        let p = Pagination::new(1, 20, 40);
        assert_eq!(p.total_pages, 2);
        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.total_pages, 0);
    }

    #[test]
    fn page_params_defaults() {
        let params = PageParams { page: None, limit: None };
        assert_eq!(params.resolve_with(20, 100).unwrap(), (1, 20));
    }

    #[test]
    fn page_params_rejects_non_positive() {
        assert!(PageParams { page: Some(0), limit: None }.resolve_with(20, 100).is_err());
        assert!(PageParams { page: None, limit: Some(-5) }.resolve_with(20, 100).is_err());
    }

    #[test]
    fn page_params_caps_limit() {
        assert!(PageParams { page: None, limit: Some(101) }.resolve_with(20, 100).is_err());
        assert_eq!(
            PageParams { page: Some(2), limit: Some(100) }.resolve_with(20, 100).unwrap(),
            (2, 100)
        );
    }
}

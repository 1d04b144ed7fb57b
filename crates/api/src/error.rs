//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Use case error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        metrics::counter!("api_errors_total", "status" => status.as_u16().to_string())
            .increment(1);

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::OrderNotFound(_)
        | DomainError::ProductNotFound(_)
        | DomainError::ProductNotRegistered(_) => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use common::{OrderId, ProductId};
    use domain::{RepositoryError, ValidationError};

    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        assert_eq!(
            status_of(DomainError::from(ValidationError::NoSandwich).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::OrderNotFound(OrderId::new(1)).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::ProductNotRegistered(ProductId::new(1)).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::Conflict("product 1 already exists".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(
                DomainError::Repository(RepositoryError::infrastructure(
                    "list orders",
                    std::io::Error::other("connection refused"),
                ))
                .into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_bad_request() {
        assert_eq!(
            status_of(ApiError::BadRequest("invalid identifier".into())),
            StatusCode::BAD_REQUEST
        );
    }
}

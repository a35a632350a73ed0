//! HTTP mapping for engine errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::EcommerceError;

impl EcommerceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::OrderNotFound(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::IdSpaceExhausted { .. } | Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for EcommerceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Backend details stay in the logs.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Order request failed");
            "Order storage unavailable".to_string()
        } else {
            self.to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrderId, StoreError};

    #[test]
    fn test_status_codes() {
        let id = OrderId::from_sequence(1);
        assert_eq!(EcommerceError::OrderNotFound(id.clone()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(EcommerceError::Validation("x".into()).status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(EcommerceError::IdSpaceExhausted { start: id, probes: 1 }.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_server_errors_hide_details() {
        let response = EcommerceError::StoreUnavailable(StoreError::Unavailable("pg down at 10.0.0.3".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

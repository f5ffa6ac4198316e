use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_helpers::errors::{ErrorCode, error_response};
use serde_json::json;
use strum::Display;
use thiserror::Error;

use crate::models::Region;

/// Result type for pricing endpoints
pub type PricingResult<T> = Result<T, PricingError>;

/// Which comparison an error belongs to; used in client-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PriceKind {
    Compute,
    Storage,
}

/// Errors the pricing endpoints turn into HTTP responses.
///
/// Provider failures are not represented here: they travel inside the
/// response body as `errors` entries.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Every provider answered and none had a matching price.
    #[error("No matching {kind} prices found {}", scope(.region))]
    NoData { kind: PriceKind, region: Region },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Error comparing {kind} prices: {message}")]
    Internal { kind: PriceKind, message: String },
}

impl From<validator::ValidationErrors> for PricingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        PricingError::InvalidInput(errors.to_string())
    }
}

fn scope(region: &Region) -> String {
    if region.is_all() {
        "in any region".to_string()
    } else {
        format!("in region {}", region)
    }
}

impl IntoResponse for PricingError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        match self {
            PricingError::NoData { region, .. } => {
                tracing::debug!(%region, "{}", message);
                error_response(
                    StatusCode::NOT_FOUND,
                    message,
                    ErrorCode::NotFound,
                    Some(json!({ "region": region })),
                )
            }
            PricingError::InvalidInput(_) => {
                error_response(StatusCode::BAD_REQUEST, message, ErrorCode::BadRequest, None)
            }
            PricingError::Internal { kind, .. } => {
                tracing::error!(%kind, "{}", message);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    message,
                    ErrorCode::InternalError,
                    None,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_message_names_region() {
        let err = PricingError::NoData {
            kind: PriceKind::Compute,
            region: Region::Europe,
        };
        assert_eq!(
            err.to_string(),
            "No matching compute prices found in region europe"
        );

        let err = PricingError::NoData {
            kind: PriceKind::Storage,
            region: Region::All,
        };
        assert_eq!(err.to_string(), "No matching storage prices found in any region");
    }

    #[test]
    fn test_validation_errors_become_invalid_input() {
        use crate::models::ComputeSpecs;
        use validator::Validate;

        let specs = ComputeSpecs {
            vcpu: 0,
            ram_gib: 8.0,
        };
        let err = PricingError::from(specs.validate().unwrap_err());
        assert!(matches!(err, PricingError::InvalidInput(ref msg) if msg.contains("vcpu")));
    }

    #[test]
    fn test_status_codes() {
        let not_found = PricingError::NoData {
            kind: PriceKind::Storage,
            region: Region::Asia,
        };
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let bad = PricingError::InvalidInput("vcpu must be positive".to_string());
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);

        let internal = PricingError::Internal {
            kind: PriceKind::Compute,
            message: "boom".to_string(),
        };
        assert_eq!(internal.to_string(), "Error comparing compute prices: boom");
        assert_eq!(
            internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

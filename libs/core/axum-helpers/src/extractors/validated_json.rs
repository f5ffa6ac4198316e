//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor with automatic validation.
///
/// Both failure modes answer 400 with the standard `ErrorResponse` body:
/// the body does not deserialize (bad JSON, unknown enum value), or
/// `Validate::validate` rejects it (`details` then lists the field errors).
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct ComputeSpecs {
///     #[validate(range(min = 1))]
///     vcpu: i32,
/// }
///
/// async fn handler(ValidatedJson(specs): ValidatedJson<ComputeSpecs>) { /* ... */ }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedJson(data))
    }
}

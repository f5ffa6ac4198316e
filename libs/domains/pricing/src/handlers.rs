//! HTTP handlers for the pricing comparison endpoints

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use axum_helpers::{
    ValidatedJson,
    errors::responses::{BadRequestValidationResponse, InternalServerErrorResponse, NotFoundResponse},
};
use futures::FutureExt;
use utoipa::OpenApi;

use crate::error::{PriceKind, PricingError, PricingResult};
use crate::models::{
    CloudProvider, ComputePrice, ComputePricingRequest, ComputePricingResponse, ComputeSpecs,
    ProviderError, Region, StoragePrice, StoragePricingRequest, StoragePricingResponse,
    StorageSpecs, StorageTier,
};
use crate::service::{PricingService, panic_message};

pub const TAG: &str = "pricing";

/// OpenAPI documentation for the pricing endpoints
#[derive(OpenApi)]
#[openapi(
    paths(compare_compute, compare_storage),
    components(
        schemas(
            CloudProvider,
            Region,
            StorageTier,
            ComputeSpecs,
            StorageSpecs,
            ComputePrice,
            StoragePrice,
            ProviderError,
            ComputePricingRequest,
            ComputePricingResponse,
            StoragePricingRequest,
            StoragePricingResponse,
        ),
        responses(NotFoundResponse, BadRequestValidationResponse, InternalServerErrorResponse)
    ),
    tags((name = TAG, description = "Cross-provider compute and storage price comparison"))
)]
pub struct ApiDoc;

/// Pricing routes, relative to the mount point (`/pricing` in the API server).
pub fn router(service: Arc<PricingService>) -> Router {
    Router::new()
        .route("/compute", post(compare_compute))
        .route("/storage", post(compare_storage))
        .with_state(service)
}

/// Compare on-demand compute prices across providers
///
/// Provider failures are reported in `errors` next to whatever results the
/// other providers returned.
#[utoipa::path(
    post,
    path = "/compute",
    tag = TAG,
    request_body = ComputePricingRequest,
    responses(
        (status = 200, description = "Merged results and per-provider errors", body = ComputePricingResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub async fn compare_compute(
    State(service): State<Arc<PricingService>>,
    ValidatedJson(request): ValidatedJson<ComputePricingRequest>,
) -> PricingResult<Json<ComputePricingResponse>> {
    let response = guarded(
        PriceKind::Compute,
        service.get_compute_pricing(request.region, request.specs),
    )
    .await?;

    if response.is_empty() {
        return Err(PricingError::NoData {
            kind: PriceKind::Compute,
            region: request.region,
        });
    }

    Ok(Json(response))
}

/// Compare storage prices for one tier across providers
#[utoipa::path(
    post,
    path = "/storage",
    tag = TAG,
    request_body = StoragePricingRequest,
    responses(
        (status = 200, description = "Merged results and per-provider errors", body = StoragePricingResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub async fn compare_storage(
    State(service): State<Arc<PricingService>>,
    ValidatedJson(request): ValidatedJson<StoragePricingRequest>,
) -> PricingResult<Json<StoragePricingResponse>> {
    let response = guarded(
        PriceKind::Storage,
        service.get_storage_pricing(request.region, request.specs),
    )
    .await?;

    if response.is_empty() {
        return Err(PricingError::NoData {
            kind: PriceKind::Storage,
            region: request.region,
        });
    }

    Ok(Json(response))
}

/// Turns a panic in the aggregation path itself into a 500. Panics inside
/// provider tasks never get here; the service reports them as `errors`.
async fn guarded<T>(kind: PriceKind, work: impl Future<Output = T>) -> PricingResult<T> {
    AssertUnwindSafe(work).catch_unwind().await.map_err(|payload| {
        PricingError::Internal {
            kind,
            message: panic_message(payload.as_ref())
                .unwrap_or_else(|| "aggregation panicked".to_string()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guarded_passes_value_through() {
        let value = guarded(PriceKind::Compute, async { 7 }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_guarded_converts_panic() {
        let err = guarded(PriceKind::Storage, async {
            panic!("table lookup failed");
        })
        .await
        .map(|_: ()| ())
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error comparing storage prices: table lookup failed"
        );
    }

    #[test]
    fn test_openapi_lists_both_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/compute"));
        assert!(doc.paths.paths.contains_key("/storage"));
    }
}

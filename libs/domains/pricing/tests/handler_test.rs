//! Handler tests for the pricing domain
//!
//! These tests drive the pricing router with stub providers:
//! - Request deserialization and validation (400)
//! - Merged results and per-provider errors (200)
//! - The "nothing matched" response (404)
//!
//! No vendor API is contacted.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use domain_pricing::*;
use http_body_util::BodyExt;
use serde_json::{json, Map, Value};
use tower::ServiceExt; // For oneshot()

enum Behavior {
    Answer,
    Nothing,
    Fail,
    Panic,
}

struct StubProvider {
    provider: CloudProvider,
    behavior: Behavior,
}

#[async_trait]
impl PricingProvider for StubProvider {
    fn provider(&self) -> CloudProvider {
        self.provider
    }

    async fn get_compute_pricing(
        &self,
        _region: Region,
        specs: ComputeSpecs,
    ) -> ProviderResult<Vec<ComputePrice>> {
        match self.behavior {
            Behavior::Answer => Ok(vec![ComputePrice {
                provider: self.provider,
                sku: "SKU-1".to_string(),
                service_name: "general-2".to_string(),
                provider_region: "eu-west-1".to_string(),
                vcpu: specs.vcpu,
                ram_gib: specs.ram_gib,
                hourly_usd: 0.05,
                service_details: Map::new(),
            }]),
            Behavior::Nothing => Ok(Vec::new()),
            Behavior::Fail => Err(ProviderError::new(self.provider, "quota exceeded")),
            Behavior::Panic => panic!("stub provider exploded"),
        }
    }

    async fn get_storage_pricing(
        &self,
        _region: Region,
        specs: StorageSpecs,
    ) -> ProviderResult<Vec<StoragePrice>> {
        match self.behavior {
            Behavior::Answer => Ok(vec![StoragePrice {
                provider: self.provider,
                sku: "SKU-S".to_string(),
                service_name: "standard".to_string(),
                provider_region: "eu-west-1".to_string(),
                tier: specs.tier,
                gb_month_usd: 0.023,
                service_details: Map::new(),
            }]),
            Behavior::Nothing => Ok(Vec::new()),
            Behavior::Fail => Err(ProviderError::new(self.provider, "quota exceeded")),
            Behavior::Panic => panic!("stub provider exploded"),
        }
    }

    async fn close(&self) -> ProviderResult<()> {
        Ok(())
    }
}

fn app(stubs: Vec<(CloudProvider, Behavior)>) -> Router {
    let providers: Vec<Arc<dyn PricingProvider>> = stubs
        .into_iter()
        .map(|(provider, behavior)| {
            Arc::new(StubProvider { provider, behavior }) as Arc<dyn PricingProvider>
        })
        .collect();
    let service = PricingService::new(ProviderFactory::from_providers(providers));
    router(Arc::new(service))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

// Helper to parse JSON response body
async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_compute_returns_200_with_partial_results() {
    let app = app(vec![
        (CloudProvider::Aws, Behavior::Answer),
        (CloudProvider::Azure, Behavior::Fail),
    ]);

    let response = app
        .oneshot(post(
            "/compute",
            json!({"region": "europe", "specs": {"vcpu": 2, "ram_gib": 8.0}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body: ComputePricingResponse =
        serde_json::from_value(json_body(response.into_body()).await).unwrap();
    assert_eq!(body.results.len(), 1);
    assert_eq!(body.results[0].provider, CloudProvider::Aws);
    assert_eq!(body.results[0].hourly_usd, 0.05);
    assert_eq!(body.errors.len(), 1);
    assert_eq!(body.errors[0].provider, "azure");
}

#[tokio::test]
async fn test_compute_total_failure_is_still_200() {
    let app = app(vec![
        (CloudProvider::Aws, Behavior::Fail),
        (CloudProvider::Gcp, Behavior::Fail),
    ]);

    let response = app
        .oneshot(post(
            "/compute",
            json!({"region": "all", "specs": {"vcpu": 2, "ram_gib": 8.0}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_compute_no_match_returns_404() {
    let app = app(vec![
        (CloudProvider::Aws, Behavior::Nothing),
        (CloudProvider::Azure, Behavior::Nothing),
    ]);

    let response = app
        .oneshot(post(
            "/compute",
            json!({"region": "europe", "specs": {"vcpu": 3, "ram_gib": 5.0}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "NOT_FOUND");
    assert_eq!(
        body["message"],
        "No matching compute prices found in region europe"
    );
    assert_eq!(body["details"]["region"], "europe");
}

#[tokio::test]
async fn test_storage_no_providers_returns_404_for_any_region() {
    let app = app(Vec::new());

    let response = app
        .oneshot(post(
            "/storage",
            json!({"region": "all", "specs": {"tier": "LongTermArchive"}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response.into_body()).await;
    assert_eq!(
        body["message"],
        "No matching storage prices found in any region"
    );
}

#[tokio::test]
async fn test_storage_returns_results() {
    let app = app(vec![(CloudProvider::Gcp, Behavior::Answer)]);

    let response = app
        .oneshot(post(
            "/storage",
            json!({"region": "europe", "specs": {"tier": "FrequentAccess"}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: StoragePricingResponse =
        serde_json::from_value(json_body(response.into_body()).await).unwrap();
    assert_eq!(body.results[0].tier, StorageTier::FrequentAccess);
    assert!(body.errors.is_empty());
}

#[tokio::test]
async fn test_compute_rejects_zero_vcpu() {
    let app = app(vec![(CloudProvider::Aws, Behavior::Answer)]);

    let response = app
        .oneshot(post(
            "/compute",
            json!({"region": "europe", "specs": {"vcpu": 0, "ram_gib": 8.0}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["details"]["specs.vcpu"].is_array());
}

#[tokio::test]
async fn test_compute_rejects_non_positive_ram() {
    let app = app(vec![(CloudProvider::Aws, Behavior::Answer)]);

    let response = app
        .oneshot(post(
            "/compute",
            json!({"region": "europe", "specs": {"vcpu": 2, "ram_gib": 0.0}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_region_is_rejected() {
    let app = app(vec![(CloudProvider::Aws, Behavior::Answer)]);

    let response = app
        .oneshot(post(
            "/compute",
            json!({"region": "atlantis", "specs": {"vcpu": 2, "ram_gib": 8.0}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_tier_is_rejected() {
    let app = app(vec![(CloudProvider::Aws, Behavior::Answer)]);

    let response = app
        .oneshot(post(
            "/storage",
            json!({"region": "europe", "specs": {"tier": "Lukewarm"}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_provider_panic_is_reported_not_propagated() {
    let app = app(vec![
        (CloudProvider::Aws, Behavior::Panic),
        (CloudProvider::Azure, Behavior::Answer),
    ]);

    let response = app
        .oneshot(post(
            "/compute",
            json!({"region": "europe", "specs": {"vcpu": 2, "ram_gib": 8.0}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["errors"][0]["provider"], "unknown");
    assert_eq!(body["errors"][0]["details"]["error_type"], "panic");
}

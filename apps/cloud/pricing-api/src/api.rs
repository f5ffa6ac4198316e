use std::sync::Arc;

use axum::{Json, Router, middleware, routing::get};
use domain_pricing::PricingService;
use observability::{metrics_handler, middleware::metrics_middleware};
use serde::Serialize;

#[derive(Serialize)]
struct Liveness {
    status: &'static str,
    message: &'static str,
}

async fn root() -> Json<Liveness> {
    Json(Liveness {
        status: "healthy",
        message: "Cloud Pricing Comparison API is running",
    })
}

/// All application routes. `/health` and the doc UIs are added by the caller.
pub fn routes(service: Arc<PricingService>) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/pricing", domain_pricing::router(service))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(metrics_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use domain_pricing::ProviderFactory;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        routes(Arc::new(PricingService::new(ProviderFactory::default())))
    }

    #[tokio::test]
    async fn test_root_reports_liveness() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({"status": "healthy", "message": "Cloud Pricing Comparison API is running"})
        );
    }

    #[tokio::test]
    async fn test_pricing_routes_are_mounted() {
        let request = Request::post("/pricing/storage")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"region": "europe", "specs": {"tier": "RareAccess"}}).to_string(),
            ))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        // No providers configured: nothing matched anywhere.
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_answers_without_recorder() {
        let response = app()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

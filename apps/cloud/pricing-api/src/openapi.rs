use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Cloud Pricing Comparison API",
        version = "0.1.0",
        description = "Compares on-demand compute and storage prices across AWS, Azure and GCP"
    ),
    nest(
        (path = "/pricing", api = domain_pricing::ApiDoc)
    )
)]
pub struct ApiDoc;

use crate::bridge::CustomerBridge;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{CustomerRequest, GenerateResponse, SapStatus, SearchResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Autoline and SAP clients.
    pub bridge: CustomerBridge,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            bridge: CustomerBridge::new(config)?,
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, search_customer, generate_sap_code),
    components(schemas(CustomerRequest, SearchResponse, GenerateResponse, SapStatus)),
    tags((name = "customers", description = "Autoline to SAP customer reconciliation"))
)]
pub struct ApiDoc;

/// Routes exposed under `/api`. Layers are applied by the caller.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/search/", post(search_customer))
        .route("/api/generate-sap-code/", post(generate_sap_code))
}

/// Swagger UI at `/docs`, backed by `/api-docs/openapi.json`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

/// Health check endpoint.
///
/// Returns the service status and version.
#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is up")))]
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "autoline-sap-bridge",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/search/
///
/// Fetches the Autoline customer and the matching SAP customer code.
/// SAP problems never fail the request; they are reported in `sap_status`.
#[utoipa::path(
    post,
    path = "/api/search/",
    tag = "customers",
    request_body = CustomerRequest,
    responses(
        (status = 200, description = "Autoline record with SAP status", body = SearchResponse),
        (status = 400, description = "Customer MK missing"),
        (status = 500, description = "Autoline data could not be retrieved")
    )
)]
#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn search_customer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let request = parse_request(payload)?;
    let mk = require_mk(&request)?;
    tracing::info!("POST /api/search/ - mk: {}, kind: {}", mk, request.kind().as_str());

    let response = state.bridge.search(mk, request.kind()).await?;
    Ok(Json(response))
}

/// POST /api/generate-sap-code/
///
/// Maps the Autoline customer into SAP's schema and creates it in SAP.
#[utoipa::path(
    post,
    path = "/api/generate-sap-code/",
    tag = "customers",
    request_body = CustomerRequest,
    responses(
        (status = 200, description = "Customer created in SAP", body = GenerateResponse),
        (status = 400, description = "Customer MK missing"),
        (status = 500, description = "Autoline fetch or SAP creation failed")
    )
)]
#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn generate_sap_code(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let request = parse_request(payload)?;
    let mk = require_mk(&request)?;
    tracing::info!(
        "POST /api/generate-sap-code/ - mk: {}, kind: {}",
        mk,
        request.kind().as_str()
    );

    let response = state.bridge.generate_sap_code(mk, request.kind()).await?;
    Ok(Json(response))
}

fn parse_request(
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> Result<CustomerRequest, AppError> {
    payload
        .map(|Json(request)| request)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn require_mk(request: &CustomerRequest) -> Result<&str, AppError> {
    request
        .mk()
        .ok_or_else(|| AppError::BadRequest("Customer MK is required".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_mk() {
        let request = CustomerRequest {
            customer_mk: Some("  ".to_string()),
            is_corporate: false,
        };
        assert!(matches!(require_mk(&request), Err(AppError::BadRequest(_))));

        let request = CustomerRequest {
            customer_mk: Some(" 18643".to_string()),
            is_corporate: true,
        };
        assert_eq!(require_mk(&request).unwrap(), "18643");
    }

    #[test]
    fn test_openapi_lists_endpoints() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/search/"));
        assert!(doc.paths.paths.contains_key("/api/generate-sap-code/"));
    }
}

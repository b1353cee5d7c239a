use axum::{Json, Router, http::HeaderName, routing::get};
use utoipa::OpenApi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod backend;
pub mod config;
pub mod gate;
pub mod handlers;
pub mod models;

// Module for routing segregation (gated pages, API proxy).
pub mod routes;
use routes::{api, pages};

// --- Public Re-exports ---

pub use auth::{JwtVerifier, Role, TokenVerifier, VerifierState};
pub use backend::{BackendState, HttpBackend, MockBackend};
pub use config::AppConfig;
pub use gate::AccessGate;

/// ApiDoc
///
/// OpenAPI document for the `/api` proxy routes, served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::get_order_status, handlers::start_delivery,
        handlers::get_delivery_invoice, handlers::add_delivery_invoice,
        handlers::remove_delivery_invoice, handlers::deliver_invoice
    ),
    components(
        schemas(
            models::LoginRequest, models::DeliverInvoiceRequest, models::GeoPoint,
            models::ApiMessage, auth::Role,
        )
    ),
    tags(
        (name = "dispatch-portal", description = "Delivery tracking dashboard edge API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single shared container for the services and configuration every request
/// needs. Cheap to clone: the services are behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Client for the external delivery backend.
    pub backend: BackendState,
    /// Access gate, holding the token verifier built from `config.jwt_secret`.
    pub gate: AccessGate,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    /// new
    ///
    /// Wires the production verifier from the configured secret. Tests that
    /// need their own verifier build `AppState` directly.
    pub fn new(config: AppConfig, backend: BackendState) -> Self {
        let verifier: VerifierState = std::sync::Arc::new(JwtVerifier::new(&config.jwt_secret));
        Self {
            backend,
            gate: AccessGate::new(verifier),
            config,
        }
    }
}

/// create_router
///
/// Assembles the routing structure, applies scoped and global middleware and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // Everything that is not an API route is a page, served behind the gate.
    let page_service = pages::page_routes(&state);

    // 2. Base Router Assembly
    let base_router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        // Proxy routes, not gated.
        .nest("/api", api::api_routes())
        .fallback_service(page_service)
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span: method, URI and the `x-request-id` set above,
/// so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}

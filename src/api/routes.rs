//! HTTP route definitions

use crate::api::models::*;
use crate::api::{fleet_handlers, handlers};
use axum::{
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cargo Tracking Edge Functions",
        description = "Shipping-company onboarding, Fleet Engine proxy and cargo status notifications.",
        license(name = "MIT"),
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        handlers::create_account,
        fleet_handlers::fleet_engine,
        handlers::notify_status,
        handlers::health_check,
    ),
    components(schemas(
        CreateAccountRequest,
        CreateAccountResponse,
        FleetRequest,
        FleetResponse,
        StatusNotificationRequest,
        StatusNotificationResponse,
        HealthResponse,
        ErrorResponse,
    )),
    tags(
        (name = "Embarcadores", description = "Shipping-company accounts"),
        (name = "Fleet Engine", description = "Vehicle and delivery-task tracking"),
        (name = "Notificações", description = "Cargo status emails"),
        (name = "Health", description = "Health and monitoring endpoints"),
    )
)]
pub struct ApiDoc;

/// Browser callers send these on every function call
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

/// Create the main application router
pub fn create_router(state: Arc<crate::AppState>) -> Router {
    let functions = Router::new()
        .route("/criar-embarcador", post(handlers::create_account))
        .route("/fleet-engine", post(fleet_handlers::fleet_engine))
        .route("/notificar-status-carga", post(handlers::notify_status));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/functions/v1", functions)
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

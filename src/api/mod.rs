//! HTTP layer: route handlers, DTOs, CSV export, and router composition.

pub mod dto;
pub mod export;
pub mod handlers;
pub mod openapi;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::live_stream;

/// Builds the REST router with all endpoints.
pub fn build_router() -> Router<AppState> {
    let router = handlers::routes();

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    router
}

/// Builds the complete application: REST routes, the live WebSocket
/// endpoint, and the tracing and CORS layers.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(build_router())
        .route("/_sub/{user_id}", get(live_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

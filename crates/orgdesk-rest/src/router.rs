//! Main application router.

use crate::{
    controllers::{auth_controller, dashboard_controller, health_controller, resource_controller},
    middleware::{logging_middleware, require_auth, REQUEST_ID_HEADER},
    responses::AppError,
    state::AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use orgdesk_config::ServerConfig;
use orgdesk_core::OrgdeskError;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Creates the main application router.
pub fn create_router(state: AppState, server_config: &ServerConfig) -> Router {
    let resources = state.resources.clone();

    // Everything but the health probes and login requires a bearer token
    let protected = Router::new()
        .route("/me", get(auth_controller::me))
        .route("/logout", post(auth_controller::logout))
        .merge(dashboard_controller::router())
        .nest("/users", resource_controller::router(resources.users))
        .nest("/roles", resource_controller::router_with_active(resources.roles))
        .nest("/divisions", resource_controller::router_with_active(resources.divisions))
        .nest("/positions", resource_controller::router_with_active(resources.positions))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Each layer wraps the routes individually, so `from_fn` always sees a
    // plain `Request<Body>`. The last layer added runs first.
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let router = Router::new()
        .merge(health_controller::router())
        .route("/login", post(auth_controller::login))
        .merge(protected)
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(server_config.max_body_size))
        .layer(DefaultBodyLimit::disable())
        .layer(CompressionLayer::new())
        .layer(create_cors_layer(server_config))
        .layer(TimeoutLayer::new(server_config.request_timeout()))
        .layer(middleware::from_fn(logging_middleware))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state);

    info!("Router created with REST endpoints");
    router
}

/// Creates a CORS layer based on server configuration.
fn create_cors_layer(server_config: &ServerConfig) -> CorsLayer {
    if !server_config.cors_enabled {
        return CorsLayer::new();
    }
    if server_config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = server_config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
}

async fn not_found() -> AppError {
    AppError(OrgdeskError::not_found("Route"))
}

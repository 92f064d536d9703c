use super::{handlers, state::AppState, static_url::STATIC_URL_PREFIX};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

/// Upper bound for one multipart upload of menu pages.
pub const UPLOAD_BODY_LIMIT: usize = 25 * 1024 * 1024;

/// Builds the CORS layer for `/api/*` from the configured frontend origin.
fn cors_layer(frontend_origin: &str) -> CorsLayer {
    let origin = match frontend_origin.trim() {
        "" | "*" => AllowOrigin::any(),
        origin => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!("Invalid frontend origin '{origin}', allowing any: {e}");
                AllowOrigin::any()
            }
        },
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/process",
            post(handlers::process_menu_handler).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/generate-image",
            post(handlers::generate_image_handler),
        )
        .layer(cors_layer(&app_state.config.frontend_origin));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .merge(api)
        .nest_service(STATIC_URL_PREFIX, ServeDir::new(&app_state.static_root))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

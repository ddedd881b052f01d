//! Route configuration and setup

mod health;

use crate::constants::{ALBUM_PATH, API_BASE, API_PREFIX};
use crate::handlers::{albums, uploads};
use crate::state::AppState;
use albums_core::Config;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Multipart framing allowance on top of the largest accepted file
const BODY_LIMIT_OVERHEAD: usize = 1024 * 1024;

/// Build the application router
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);
    tracing::info!(http_concurrency_limit, "HTTP concurrency limit layer enabled");

    let body_limit = config
        .max_archive_size_bytes()
        .max(config.max_image_size_bytes())
        + BODY_LIMIT_OVERHEAD;

    let app = Router::new()
        .route("/health", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
        .route(
            &format!("{}/openapi.json", API_BASE),
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .merge(album_routes())
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn album_routes() -> Router<Arc<AppState>> {
    let album = format!("{}{}", API_PREFIX, ALBUM_PATH);
    let image = format!("{}/images/{{image_id}}", album);

    Router::new()
        .route(&album, get(albums::show_album))
        .route(
            &format!("{}/images", album),
            post(uploads::upload_images),
        )
        .route(
            &image,
            get(albums::show_image)
                .put(albums::update_image)
                .delete(albums::delete_image),
        )
        .route(
            &format!("{}/primary", image),
            post(albums::set_primary_image),
        )
        .route(
            &format!("{}/primary", album),
            delete(albums::clear_primary_image),
        )
        .route(&format!("{}/order", album), post(albums::set_image_order))
        .route(
            &format!("{}/main-image", album),
            post(uploads::upload_main_image),
        )
        .route(&format!("{}/zip", album), post(uploads::upload_zip))
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

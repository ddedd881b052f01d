//! Health check handlers

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Object probed by the storage check; it need not exist
const STORAGE_PROBE_KEY: &str = "albums/.health";

/// Run an async check with a timeout: "healthy", "timeout" or "{prefix}: {error}"
async fn run_check<F, E>(f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(CHECK_TIMEOUT, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(Debug, Serialize)]
pub(super) struct HealthCheckResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    pub storage: String,
}

/// Liveness probe: the process is running
pub async fn liveness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "alive" })))
}

/// Readiness probe: database (when configured) and storage answer
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match &state.db_pool {
        Some(pool) => Some(
            run_check(
                async { sqlx::query("SELECT 1").execute(pool).await.map(|_| ()) },
                "unhealthy",
            )
            .await,
        ),
        None => None,
    };
    let storage = run_check(
        async {
            state
                .albums
                .storage
                .exists(STORAGE_PROBE_KEY)
                .await
                .map(|_| ())
        },
        "unhealthy",
    )
    .await;

    let healthy =
        storage == "healthy" && database.as_deref().map_or(true, |db| db == "healthy");
    let status = if healthy {
        StatusCode::OK
    } else {
        tracing::warn!(?database, storage = %storage, "Readiness check failed");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthCheckResponse {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            database,
            storage,
        }),
    )
}

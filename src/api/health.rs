use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use sqlx::PgPool;

/// Liveness plus a database round trip; 503 when the database is unreachable.
pub async fn health_check(State(db): State<PgPool>) -> (StatusCode, Json<Value>) {
    let database_ok = sqlx::query("SELECT 1").execute(&db).await.is_ok();
    let status = if database_ok {
        StatusCode::OK
    } else {
        tracing::warn!("Health check: database unavailable");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if database_ok { "healthy" } else { "degraded" },
            "database": if database_ok { "ok" } else { "unavailable" },
            "service": "dziennik-treningowy",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}

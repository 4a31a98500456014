use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use concierge_db::{ping, DbPool, SqlMessageQueue};
use serde::Serialize;

#[derive(Clone, Default)]
pub struct HealthState {
    pub db_pool: Option<DbPool>,
    pub queue: Option<SqlMessageQueue>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub queue: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.db_pool {
        Some(pool) => database_check(pool).await,
        None => skipped("memory backend has no database"),
    };
    let queue = match &state.queue {
        Some(queue) => queue_check(queue).await,
        None => skipped("in-process queue"),
    };
    let ready = database.status != "degraded" && queue.status != "degraded";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "concierge-server runtime initialized".to_string(),
        },
        database,
        queue,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn skipped(detail: &str) -> HealthCheck {
    HealthCheck { status: "skipped", detail: detail.to_string() }
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match ping(pool).await {
        Ok(()) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

async fn queue_check(queue: &SqlMessageQueue) -> HealthCheck {
    match queue.depth().await {
        Ok(depth) => HealthCheck {
            status: "ready",
            detail: format!("{} visible, {} in flight", depth.visible, depth.in_flight),
        },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("queue depth query failed: {error}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{extract::State, http::StatusCode, Json};
    use concierge_db::{connect_with_settings, migrations, SqlMessageQueue};

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_reports_queue_depth_when_database_is_reachable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let queue = SqlMessageQueue::new(pool.clone(), Duration::from_secs(30));
        queue.enqueue("{}").await.expect("enqueue");

        let (status, Json(payload)) =
            health(State(HealthState { db_pool: Some(pool.clone()), queue: Some(queue) })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.database.status, "ready");
        assert_eq!(payload.queue.detail, "1 visible, 0 in flight");

        pool.close().await;
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_database_is_closed() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        pool.close().await;

        let (status, Json(payload)) =
            health(State(HealthState { db_pool: Some(pool), queue: None })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.database.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn memory_backend_skips_storage_checks() {
        let (status, Json(payload)) = health(State(HealthState::default())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.database.status, "skipped");
        assert_eq!(payload.queue.status, "skipped");
    }
}

/**
 * Health Routes
 * Liveness, readiness and per-backend checks
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::state::AppState;

lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Pin the uptime origin to process start.
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceCheck {
    fn healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyChecks {
    pub database: ServiceCheck,
    pub storage: ServiceCheck,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub checks: ReadyChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
}

fn check<E: std::fmt::Display>(backend: &str, started: Instant, result: Result<(), E>) -> ServiceCheck {
    match result {
        Ok(()) => ServiceCheck {
            status: "healthy".to_string(),
            backend: backend.to_string(),
            response_time: Some(started.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => {
            tracing::warn!(backend, error = %e, "health check failed");
            ServiceCheck {
                status: "unhealthy".to_string(),
                backend: backend.to_string(),
                response_time: None,
                error: Some(e.to_string()),
            }
        }
    }
}

async fn database_check(state: &AppState) -> ServiceCheck {
    let started = Instant::now();
    check(state.documents.backend(), started, state.documents.ping().await)
}

async fn storage_check(state: &AppState) -> ServiceCheck {
    let started = Instant::now();
    check(state.files.backend(), started, state.files.ping().await)
}

/// GET /health - Liveness ping
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /health/database
pub async fn health_database(State(state): State<AppState>) -> impl IntoResponse {
    Json(database_check(&state).await)
}

/// GET /health/storage
pub async fn health_storage(State(state): State<AppState>) -> impl IntoResponse {
    Json(storage_check(&state).await)
}

/// GET /health/ready - 503 until both backends answer
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let (database, storage) = tokio::join!(database_check(&state), storage_check(&state));
    let ready = database.healthy() && storage.healthy();

    let response = ReadyResponse {
        status: if ready { "ready" } else { "not ready" }.to_string(),
        timestamp: Utc::now(),
        uptime: SERVER_START.elapsed().as_secs(),
        checks: ReadyChecks { database, storage },
    };
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

//! System/health API handlers.
//!
//! # Purpose
//! Lightweight endpoints for service metadata and health checks, used by
//! probes and automation.
use crate::api::error::{api_internal, ApiError};
use crate::api::types::{HealthStatus, SystemInfo};
use crate::app::AppState;
use axum::extract::State;
use axum::Json;

#[utoipa::path(
    get,
    path = "/v1/system/info",
    tag = "system",
    responses(
        (status = 200, description = "Service identity and capabilities", body = SystemInfo)
    )
)]
/// Return service identity and feature flags.
pub(crate) async fn system_info(State(state): State<AppState>) -> Json<SystemInfo> {
    // Built from in-memory configuration, no I/O.
    Json(SystemInfo {
        api_version: state.api_version.clone(),
        backend: state.store.backend_name().to_string(),
        features: state.features.clone(),
    })
}

#[utoipa::path(
    get,
    path = "/v1/system/health",
    tag = "system",
    responses(
        (status = 200, description = "Service health", body = HealthStatus)
    )
)]
/// Probe the backing store and return `ok` if healthy.
pub(crate) async fn system_health(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, ApiError> {
    if let Err(err) = state.store.health_check().await {
        return Err(api_internal("storage unavailable", &err));
    }
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
    }))
}

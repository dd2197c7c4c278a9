//! Tenancy API handlers.
//!
//! # Purpose
//! Lease queries for landlords and tenants, explicit termination, and the
//! tenancy snapshot/changes sync feed. Tenancy records are append-only
//! history; termination closes a record, it never deletes one.
use crate::api::error::{api_not_found, api_store_error, ApiError};
use crate::api::types::{TenancyChangesResponse, TenancyListResponse, TenancySnapshotResponse};
use crate::app::AppState;
use crate::auth::Principal;
use crate::model::{now_ms, Tenancy, UnitKey};
use axum::extract::{Path, State};
use axum::Json;
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/v1/landlords/{landlord_id}/tenancies",
    tag = "tenancies",
    responses(
        (status = 200, description = "All tenancies across the portfolio, newest first", body = TenancyListResponse)
    )
)]
pub(crate) async fn list_landlord_tenancies(
    principal: Principal,
    Path(landlord_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<TenancyListResponse>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let items = state
        .store
        .tenancies_for_landlord(&landlord_id)
        .await
        .map_err(|err| api_store_error("failed to list tenancies", err))?;
    Ok(Json(TenancyListResponse { items }))
}

#[utoipa::path(
    get,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/units/{unit_id}/tenancies",
    tag = "tenancies",
    responses(
        (status = 200, description = "Full tenancy lineage for one unit, newest first", body = TenancyListResponse)
    )
)]
pub(crate) async fn unit_tenancy_history(
    principal: Principal,
    Path((landlord_id, property_id, unit_id)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<Json<TenancyListResponse>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let items = state
        .store
        .tenancy_history_for_unit(&UnitKey {
            landlord_id,
            property_id,
            unit_id,
        })
        .await
        .map_err(|err| api_store_error("failed to load tenancy history", err))?;
    Ok(Json(TenancyListResponse { items }))
}

#[utoipa::path(
    get,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/units/{unit_id}/tenancies/active",
    tag = "tenancies",
    responses(
        (status = 200, description = "The unit's current active tenancy", body = Tenancy),
        (status = 404, description = "No active tenancy for this unit", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn active_unit_tenancy(
    principal: Principal,
    Path((landlord_id, property_id, unit_id)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<Json<Tenancy>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let tenancy = state
        .store
        .active_tenancy_for_unit(&UnitKey {
            landlord_id,
            property_id,
            unit_id,
        })
        .await
        .map_err(|err| api_store_error("failed to load active tenancy", err))?
        .ok_or_else(|| api_not_found("no active tenancy"))?;
    Ok(Json(tenancy))
}

#[utoipa::path(
    post,
    path = "/v1/landlords/{landlord_id}/tenancies/{tenancy_id}/terminate",
    tag = "tenancies",
    responses(
        (status = 200, description = "Tenancy closed (idempotent)", body = Tenancy),
        (status = 404, description = "Tenancy not found", body = crate::api::types::ErrorResponse)
    )
)]
/// Close a lease without touching the unit's occupancy. Use the unit
/// move-out endpoint for the combined flow.
pub(crate) async fn terminate_tenancy(
    principal: Principal,
    Path((landlord_id, tenancy_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<Tenancy>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let tenancy = state
        .store
        .terminate_tenancy(&landlord_id, &tenancy_id, now_ms())
        .await
        .map_err(|err| api_store_error("failed to terminate tenancy", err))?;
    Ok(Json(tenancy))
}

#[utoipa::path(
    get,
    path = "/v1/tenants/me/tenancies",
    tag = "tenancies",
    responses(
        (status = 200, description = "The signed-in tenant's tenancies, newest first", body = TenancyListResponse)
    )
)]
pub(crate) async fn my_tenancies(
    principal: Principal,
    State(state): State<AppState>,
) -> Result<Json<TenancyListResponse>, ApiError> {
    let identity = principal.require_tenant()?;
    let items = state
        .store
        .tenancies_for_tenant(&identity.tenant_id)
        .await
        .map_err(|err| api_store_error("failed to list tenancies", err))?;
    Ok(Json(TenancyListResponse { items }))
}

#[utoipa::path(
    get,
    path = "/v1/tenancies/snapshot",
    tag = "tenancies",
    responses(
        (status = 200, description = "Full tenancy snapshot", body = TenancySnapshotResponse)
    )
)]
pub(crate) async fn tenancy_snapshot(
    State(state): State<AppState>,
) -> Result<Json<TenancySnapshotResponse>, ApiError> {
    let snapshot = state
        .store
        .tenancy_snapshot()
        .await
        .map_err(|err| api_store_error("failed to load tenancy snapshot", err))?;
    Ok(Json(TenancySnapshotResponse {
        items: snapshot.items,
        next_seq: snapshot.next_seq,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/tenancies/changes",
    tag = "tenancies",
    params(
        ("since" = Option<u64>, Query, description = "Last seen sequence")
    ),
    responses(
        (status = 200, description = "Tenancy change list", body = TenancyChangesResponse)
    )
)]
pub(crate) async fn tenancy_changes(
    axum::extract::Query(params): axum::extract::Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<TenancyChangesResponse>, ApiError> {
    let since = params
        .get("since")
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(0);
    let changes = state
        .store
        .tenancy_changes(since)
        .await
        .map_err(|err| api_store_error("failed to load tenancy changes", err))?;
    Ok(Json(TenancyChangesResponse {
        items: changes.items,
        next_seq: changes.next_seq,
    }))
}

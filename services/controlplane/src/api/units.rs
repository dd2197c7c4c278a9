//! Unit API handlers.
//!
//! # Purpose
//! Landlord-facing unit CRUD, the occupancy transitions (approve, decline,
//! move-out, manual assignment), and the unit snapshot/changes sync feed for
//! dashboards.
use crate::api::error::{api_conflict, api_store_error, api_validation_error, ApiError};
use crate::api::types::{
    ApproveResponse, AssignOccupantRequest, AssignOccupantResponse, MoveOutResponse,
    UnitBatchCreateRequest, UnitChangesResponse, UnitCreateRequest, UnitListResponse,
    UnitSnapshotResponse,
};
use crate::app::AppState;
use crate::auth::Principal;
use crate::model::{now_ms, Occupancy, Occupant, Unit, UnitKey};
use crate::store::StoreError;
use crate::workflow;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/units",
    tag = "units",
    responses(
        (status = 200, description = "List units", body = UnitListResponse)
    )
)]
pub(crate) async fn list_units(
    principal: Principal,
    Path((landlord_id, property_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<UnitListResponse>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let items = state
        .store
        .list_units(&crate::model::PropertyKey {
            landlord_id,
            property_id,
        })
        .await
        .map_err(|err| api_store_error("failed to list units", err))?;
    Ok(Json(UnitListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/units",
    tag = "units",
    request_body = UnitCreateRequest,
    responses(
        (status = 201, description = "Unit created", body = Unit),
        (status = 409, description = "Unit already exists", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_unit(
    principal: Principal,
    Path((landlord_id, property_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(body): Json<UnitCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require_landlord(&landlord_id)?;
    if body.unit_id.trim().is_empty() || body.name.trim().is_empty() {
        return Err(api_validation_error("unit_id and name are required"));
    }
    if body.rent_amount < 0 {
        return Err(api_validation_error("rent_amount must not be negative"));
    }
    let unit = Unit {
        landlord_id,
        property_id,
        unit_id: body.unit_id,
        name: body.name,
        occupancy: Occupancy::Vacant,
        occupant: None,
        join_request: None,
        rent_amount: body.rent_amount,
        billing_cycle: body.billing_cycle,
        currency: body.currency,
    };
    match state.store.create_unit(unit).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(StoreError::Conflict(_)) => Err(api_conflict("already_exists", "unit already exists")),
        Err(err) => Err(api_store_error("failed to create unit", err)),
    }
}

#[utoipa::path(
    post,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/units/batch",
    tag = "units",
    request_body = UnitBatchCreateRequest,
    responses(
        (status = 201, description = "All units created", body = UnitListResponse),
        (status = 409, description = "A unit in the batch already exists; nothing was created", body = crate::api::types::ErrorResponse)
    )
)]
/// Create several units at once. The batch is all-or-nothing.
pub(crate) async fn create_units(
    principal: Principal,
    Path((landlord_id, property_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(body): Json<UnitBatchCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require_landlord(&landlord_id)?;
    if body.units.is_empty() {
        return Err(api_validation_error("units must not be empty"));
    }
    let mut batch = Vec::with_capacity(body.units.len());
    for entry in body.units {
        if entry.unit_id.trim().is_empty() || entry.name.trim().is_empty() {
            return Err(api_validation_error("unit_id and name are required"));
        }
        if entry.rent_amount < 0 {
            return Err(api_validation_error("rent_amount must not be negative"));
        }
        batch.push(Unit {
            landlord_id: landlord_id.clone(),
            property_id: property_id.clone(),
            unit_id: entry.unit_id,
            name: entry.name,
            occupancy: Occupancy::Vacant,
            occupant: None,
            join_request: None,
            rent_amount: entry.rent_amount,
            billing_cycle: entry.billing_cycle,
            currency: entry.currency,
        });
    }
    match state.store.create_units(batch).await {
        Ok(items) => Ok((StatusCode::CREATED, Json(UnitListResponse { items }))),
        Err(StoreError::Conflict(_)) => Err(api_conflict("already_exists", "unit already exists")),
        Err(err) => Err(api_store_error("failed to create units", err)),
    }
}

#[utoipa::path(
    get,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/units/{unit_id}",
    tag = "units",
    responses(
        (status = 200, description = "Unit detail", body = Unit),
        (status = 404, description = "Unit not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_unit(
    principal: Principal,
    Path((landlord_id, property_id, unit_id)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<Json<Unit>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let unit = state
        .store
        .get_unit(&UnitKey {
            landlord_id,
            property_id,
            unit_id,
        })
        .await
        .map_err(|err| api_store_error("failed to load unit", err))?;
    Ok(Json(unit))
}

#[utoipa::path(
    delete,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/units/{unit_id}",
    tag = "units",
    responses(
        (status = 204, description = "Unit deleted"),
        (status = 409, description = "Unit has an active tenancy", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_unit(
    principal: Principal,
    Path((landlord_id, property_id, unit_id)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    principal.require_landlord(&landlord_id)?;
    match state
        .store
        .delete_unit(&UnitKey {
            landlord_id,
            property_id,
            unit_id,
        })
        .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(StoreError::Conflict(message)) => Err(api_conflict("active_tenancy", &message)),
        Err(err) => Err(api_store_error("failed to delete unit", err)),
    }
}

#[utoipa::path(
    post,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/units/{unit_id}/approve",
    tag = "units",
    responses(
        (status = 200, description = "Request approved; tenancy opened", body = ApproveResponse),
        (status = 409, description = "No pending request", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn approve_join(
    principal: Principal,
    Path((landlord_id, property_id, unit_id)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<Json<ApproveResponse>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let key = UnitKey {
        landlord_id,
        property_id,
        unit_id,
    };
    let (unit, tenancy) = workflow::approve_join_request(state.store.as_ref(), &key, now_ms())
        .await
        .map_err(|err| api_store_error("failed to approve join request", err))?;
    Ok(Json(ApproveResponse { unit, tenancy }))
}

#[utoipa::path(
    post,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/units/{unit_id}/decline",
    tag = "units",
    responses(
        (status = 200, description = "Request declined; unit back to vacant", body = Unit),
        (status = 409, description = "No pending request", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn decline_join(
    principal: Principal,
    Path((landlord_id, property_id, unit_id)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<Json<Unit>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let unit = state
        .store
        .decline_join(&UnitKey {
            landlord_id,
            property_id,
            unit_id,
        })
        .await
        .map_err(|err| api_store_error("failed to decline join request", err))?;
    Ok(Json(unit))
}

#[utoipa::path(
    post,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/units/{unit_id}/move-out",
    tag = "units",
    responses(
        (status = 200, description = "Move-out recorded; tenancies closed", body = MoveOutResponse),
        (status = 409, description = "Unit is not occupied", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn record_move_out(
    principal: Principal,
    Path((landlord_id, property_id, unit_id)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<Json<MoveOutResponse>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let key = UnitKey {
        landlord_id,
        property_id,
        unit_id,
    };
    let (unit, terminated) = workflow::record_move_out(state.store.as_ref(), &key, now_ms())
        .await
        .map_err(|err| api_store_error("failed to record move-out", err))?;
    Ok(Json(MoveOutResponse { unit, terminated }))
}

#[utoipa::path(
    post,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/units/{unit_id}/occupant",
    tag = "units",
    request_body = AssignOccupantRequest,
    responses(
        (status = 200, description = "Occupant assigned; tenancy opened", body = AssignOccupantResponse),
        (status = 409, description = "Unit is not vacant", body = crate::api::types::ErrorResponse)
    )
)]
/// Manually place an occupant. Ghost tenants (no account) enter here.
pub(crate) async fn assign_occupant(
    principal: Principal,
    Path((landlord_id, property_id, unit_id)): Path<(String, String, String)>,
    State(state): State<AppState>,
    Json(body): Json<AssignOccupantRequest>,
) -> Result<Json<AssignOccupantResponse>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    if body.display_name.trim().is_empty() {
        return Err(api_validation_error("display_name is required"));
    }
    let key = UnitKey {
        landlord_id,
        property_id,
        unit_id,
    };
    let occupant = Occupant {
        tenant_id: body.tenant_id,
        display_name: body.display_name,
        email: body.email,
    };
    let (unit, tenancy) = workflow::assign_and_open(state.store.as_ref(), &key, occupant, now_ms())
        .await
        .map_err(|err| api_store_error("failed to assign occupant", err))?;
    Ok(Json(AssignOccupantResponse { unit, tenancy }))
}

#[utoipa::path(
    get,
    path = "/v1/units/snapshot",
    tag = "units",
    responses(
        (status = 200, description = "Full unit snapshot", body = UnitSnapshotResponse)
    )
)]
pub(crate) async fn unit_snapshot(
    State(state): State<AppState>,
) -> Result<Json<UnitSnapshotResponse>, ApiError> {
    let snapshot = state
        .store
        .unit_snapshot()
        .await
        .map_err(|err| api_store_error("failed to load unit snapshot", err))?;
    Ok(Json(UnitSnapshotResponse {
        items: snapshot.items,
        next_seq: snapshot.next_seq,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/units/changes",
    tag = "units",
    params(
        ("since" = Option<u64>, Query, description = "Last seen sequence")
    ),
    responses(
        (status = 200, description = "Unit change list", body = UnitChangesResponse)
    )
)]
pub(crate) async fn unit_changes(
    axum::extract::Query(params): axum::extract::Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<UnitChangesResponse>, ApiError> {
    let since = params
        .get("since")
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(0);
    let changes = state
        .store
        .unit_changes(since)
        .await
        .map_err(|err| api_store_error("failed to load unit changes", err))?;
    Ok(Json(UnitChangesResponse {
        items: changes.items,
        next_seq: changes.next_seq,
    }))
}

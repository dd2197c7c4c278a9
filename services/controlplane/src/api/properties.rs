//! Property API handlers.
//!
//! # Purpose
//! Landlord-facing property CRUD plus the property-level invite code panel
//! and the notification feed. Every route here is scoped to the landlord's
//! own portfolio.
use crate::api::error::{api_conflict, api_store_error, api_validation_error, ApiError};
use crate::api::types::{
    InviteCodeResponse, NotificationListResponse, PropertyCreateRequest, PropertyListResponse,
};
use crate::app::AppState;
use crate::auth::Principal;
use crate::model::{now_ms, Property, PropertyKey};
use crate::store::StoreError;
use crate::workflow;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/v1/landlords/{landlord_id}/properties",
    tag = "properties",
    params(
        ("landlord_id" = String, Path, description = "Landlord identifier")
    ),
    responses(
        (status = 200, description = "List properties", body = PropertyListResponse)
    )
)]
pub(crate) async fn list_properties(
    principal: Principal,
    Path(landlord_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PropertyListResponse>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let items = state
        .store
        .list_properties(&landlord_id)
        .await
        .map_err(|err| api_store_error("failed to list properties", err))?;
    Ok(Json(PropertyListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/landlords/{landlord_id}/properties",
    tag = "properties",
    request_body = PropertyCreateRequest,
    responses(
        (status = 201, description = "Property created", body = Property),
        (status = 409, description = "Property already exists", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_property(
    principal: Principal,
    Path(landlord_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<PropertyCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require_landlord(&landlord_id)?;
    if body.property_id.trim().is_empty() || body.name.trim().is_empty() {
        return Err(api_validation_error("property_id and name are required"));
    }
    let property = Property {
        landlord_id,
        property_id: body.property_id,
        name: body.name,
        invite_code: None,
        created_at_ms: now_ms(),
    };
    match state.store.create_property(property.clone()).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(StoreError::Conflict(_)) => {
            Err(api_conflict("already_exists", "property already exists"))
        }
        Err(err) => Err(api_store_error("failed to create property", err)),
    }
}

#[utoipa::path(
    get,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}",
    tag = "properties",
    responses(
        (status = 200, description = "Property detail", body = Property),
        (status = 404, description = "Property not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_property(
    principal: Principal,
    Path((landlord_id, property_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<Property>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let property = state
        .store
        .get_property(&PropertyKey {
            landlord_id,
            property_id,
        })
        .await
        .map_err(|err| api_store_error("failed to load property", err))?;
    Ok(Json(property))
}

#[utoipa::path(
    delete,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}",
    tag = "properties",
    responses(
        (status = 204, description = "Property deleted"),
        (status = 409, description = "Property has an active tenancy", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_property(
    principal: Principal,
    Path((landlord_id, property_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    principal.require_landlord(&landlord_id)?;
    match state
        .store
        .delete_property(&PropertyKey {
            landlord_id,
            property_id,
        })
        .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(StoreError::Conflict(message)) => Err(api_conflict("active_tenancy", &message)),
        Err(err) => Err(api_store_error("failed to delete property", err)),
    }
}

#[utoipa::path(
    get,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/invite-code",
    tag = "invites",
    responses(
        (status = 200, description = "Active invite code, minted on first read", body = InviteCodeResponse),
        (status = 404, description = "Property not found", body = crate::api::types::ErrorResponse)
    )
)]
/// Return the property's invite code, provisioning one lazily.
pub(crate) async fn get_invite_code(
    principal: Principal,
    Path((landlord_id, property_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<InviteCodeResponse>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let key = PropertyKey {
        landlord_id,
        property_id,
    };
    let code = workflow::ensure_invite_code(state.store.as_ref(), &key, now_ms())
        .await
        .map_err(|err| api_store_error("failed to provision invite code", err))?;
    Ok(Json(InviteCodeResponse::from_record(code)))
}

#[utoipa::path(
    post,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/invite-code/regenerate",
    tag = "invites",
    responses(
        (status = 200, description = "Fresh invite code; the old one stops resolving", body = InviteCodeResponse),
        (status = 404, description = "Property not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn regenerate_invite_code(
    principal: Principal,
    Path((landlord_id, property_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<InviteCodeResponse>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let key = PropertyKey {
        landlord_id,
        property_id,
    };
    let code = workflow::regenerate_invite_code(state.store.as_ref(), &key, now_ms())
        .await
        .map_err(|err| api_store_error("failed to regenerate invite code", err))?;
    Ok(Json(InviteCodeResponse::from_record(code)))
}

#[utoipa::path(
    delete,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/invite-code",
    tag = "invites",
    responses(
        (status = 204, description = "Invite code revoked; code entry is closed until regenerated"),
        (status = 404, description = "Property not found", body = crate::api::types::ErrorResponse)
    )
)]
/// Revoke the active invite code without minting a replacement. Idempotent:
/// a property with no active code is already in the requested state.
pub(crate) async fn revoke_invite_code(
    principal: Principal,
    Path((landlord_id, property_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let key = PropertyKey {
        landlord_id,
        property_id,
    };
    state
        .store
        .get_property(&key)
        .await
        .map_err(|err| api_store_error("failed to load property", err))?;
    if let Some(active) = state
        .store
        .active_code_for_property(&key)
        .await
        .map_err(|err| api_store_error("failed to look up invite code", err))?
    {
        state
            .store
            .revoke_invite_code(&active.code)
            .await
            .map_err(|err| api_store_error("failed to revoke invite code", err))?;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/landlords/{landlord_id}/notifications",
    tag = "notifications",
    responses(
        (status = 200, description = "Pending notifications, newest first", body = NotificationListResponse)
    )
)]
pub(crate) async fn list_notifications(
    principal: Principal,
    Path(landlord_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let items = state
        .store
        .list_notifications(&landlord_id)
        .await
        .map_err(|err| api_store_error("failed to list notifications", err))?;
    Ok(Json(NotificationListResponse { items }))
}

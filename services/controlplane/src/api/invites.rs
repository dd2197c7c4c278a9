//! Invite API handlers.
//!
//! # Purpose
//! The onboarding surface: public invite-code resolution, tenant join
//! requests, landlord token minting, public link previews, and the trusted
//! token acceptance path.
//!
//! # Security considerations
//! - Code and token lookup endpoints are unauthenticated by design (they
//!   back the pre-sign-in portal screens) and expose no landlord or occupant
//!   identities.
//! - Acceptance and join requests require a signed-in tenant; the identity
//!   written into the tenancy comes from the verified principal, never the
//!   request body.
use crate::api::error::{api_store_error, ApiError};
use crate::api::types::{
    AcceptInviteRequest, AcceptInviteResponse, CodePortalResponse, InvitePreviewResponse,
    InviteTokenResponse, JoinViaCodeRequest, PortalUnit, RevokedInvitesResponse,
};
use crate::app::AppState;
use crate::auth::Principal;
use crate::model::{now_ms, InviteToken, JoinRequest, PropertyKey, UnitKey};
use crate::workflow;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

fn token_response(state: &AppState, token: InviteToken) -> InviteTokenResponse {
    InviteTokenResponse {
        invite_url: state.invite_url(&token.token),
        token: token.token,
        property_name: token.property_name,
        unit_id: token.unit_id,
        unit_name: token.unit_name,
        expires_at_ms: token.expires_at_ms,
        status: token.status,
    }
}

#[utoipa::path(
    get,
    path = "/v1/invite-codes/{code}",
    tag = "invites",
    params(
        ("code" = String, Path, description = "Invite code as entered by the tenant")
    ),
    responses(
        (status = 200, description = "Property portal for a valid code", body = CodePortalResponse),
        (status = 404, description = "Unknown, malformed, or revoked code", body = crate::api::types::ErrorResponse)
    )
)]
/// Resolve an entered invite code to its property portal.
pub(crate) async fn resolve_code(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CodePortalResponse>, ApiError> {
    let (record, units) = workflow::resolve_invite_code(state.store.as_ref(), &code)
        .await
        .map_err(|err| api_store_error("failed to resolve invite code", err))?;
    Ok(Json(CodePortalResponse {
        property_id: record.property_id,
        property_name: record.property_name,
        units: units.iter().map(PortalUnit::from_unit).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/v1/invite-codes/{code}/join",
    tag = "invites",
    request_body = JoinViaCodeRequest,
    responses(
        (status = 202, description = "Join request placed; awaiting landlord approval", body = PortalUnit),
        (status = 404, description = "Unknown, malformed, or revoked code", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Unit is not open for requests", body = crate::api::types::ErrorResponse)
    )
)]
/// Tenant requests to join a unit through an invite code.
pub(crate) async fn join_via_code(
    principal: Principal,
    Path(code): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<JoinViaCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = principal.require_tenant()?;
    let candidate = JoinRequest {
        tenant_id: identity.tenant_id,
        display_name: identity.display_name,
        email: identity.email,
        requested_at_ms: now_ms(),
    };
    let unit = workflow::request_join_via_code(state.store.as_ref(), &code, &body.unit_id, candidate)
        .await
        .map_err(|err| api_store_error("failed to place join request", err))?;
    Ok((StatusCode::ACCEPTED, Json(PortalUnit::from_unit(&unit))))
}

#[utoipa::path(
    post,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/invites",
    tag = "invites",
    responses(
        (status = 201, description = "Property-scoped invite token minted", body = InviteTokenResponse),
        (status = 404, description = "Property not found", body = crate::api::types::ErrorResponse)
    )
)]
/// Mint a property-scoped invite; the tenant picks a vacant unit on accept.
pub(crate) async fn create_property_invite(
    principal: Principal,
    Path((landlord_id, property_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let key = PropertyKey {
        landlord_id,
        property_id,
    };
    let token = workflow::create_property_invite(state.store.as_ref(), &key, now_ms())
        .await
        .map_err(|err| api_store_error("failed to mint property invite", err))?;
    Ok((StatusCode::CREATED, Json(token_response(&state, token))))
}

#[utoipa::path(
    post,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/units/{unit_id}/invites",
    tag = "invites",
    responses(
        (status = 201, description = "Unit-scoped invite token minted; supersedes older pending ones", body = InviteTokenResponse),
        (status = 409, description = "Unit is occupied", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_unit_invite(
    principal: Principal,
    Path((landlord_id, property_id, unit_id)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let key = UnitKey {
        landlord_id,
        property_id,
        unit_id,
    };
    let token = workflow::create_unit_invite(state.store.as_ref(), &key, now_ms())
        .await
        .map_err(|err| api_store_error("failed to mint unit invite", err))?;
    Ok((StatusCode::CREATED, Json(token_response(&state, token))))
}

#[utoipa::path(
    delete,
    path = "/v1/landlords/{landlord_id}/properties/{property_id}/units/{unit_id}/invites",
    tag = "invites",
    responses(
        (status = 200, description = "Pending unit invites revoked", body = RevokedInvitesResponse)
    )
)]
/// Revoke every still-pending invite token for a unit.
pub(crate) async fn revoke_unit_invites(
    principal: Principal,
    Path((landlord_id, property_id, unit_id)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<Json<RevokedInvitesResponse>, ApiError> {
    principal.require_landlord(&landlord_id)?;
    let revoked = state
        .store
        .revoke_pending_tokens_for_unit(&UnitKey {
            landlord_id,
            property_id,
            unit_id,
        })
        .await
        .map_err(|err| api_store_error("failed to revoke unit invites", err))?;
    Ok(Json(RevokedInvitesResponse { revoked }))
}

#[utoipa::path(
    get,
    path = "/v1/invites/{token}",
    tag = "invites",
    params(
        ("token" = String, Path, description = "Invite token slug from the shared link")
    ),
    responses(
        (status = 200, description = "Invite preview for a redeemable token", body = InvitePreviewResponse),
        (status = 404, description = "Unknown token", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Token already used, expired, or unit occupied", body = crate::api::types::ErrorResponse)
    )
)]
/// Preview an invite link before sign-in. Applies lazy expiry.
pub(crate) async fn preview_invite(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<InvitePreviewResponse>, ApiError> {
    let record = state
        .store
        .fetch_invite_token(&token, now_ms())
        .await
        .map_err(|err| api_store_error("failed to load invite token", err))?;
    Ok(Json(InvitePreviewResponse {
        property_name: record.property_name,
        unit_id: record.unit_id,
        unit_name: record.unit_name,
        expires_at_ms: record.expires_at_ms,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/invites/{token}/accept",
    tag = "invites",
    request_body = AcceptInviteRequest,
    responses(
        (status = 200, description = "Invite accepted; unit occupied and tenancy opened", body = AcceptInviteResponse),
        (status = 404, description = "Unknown token", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Token already used, expired, or unit occupied", body = crate::api::types::ErrorResponse)
    )
)]
/// Accept an invite token as the signed-in tenant.
///
/// The store performs this as one atomic transition, so a double submit or a
/// racing second tenant receives `already_used` rather than a broken state.
pub(crate) async fn accept_invite(
    principal: Principal,
    Path(token): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<AcceptInviteRequest>,
) -> Result<Json<AcceptInviteResponse>, ApiError> {
    let identity = principal.require_tenant()?;
    let (_, unit, tenancy) = state
        .store
        .accept_invite_token(&token, identity, body.unit_id, now_ms())
        .await
        .map_err(|err| api_store_error("failed to accept invite", err))?;
    Ok(Json(AcceptInviteResponse { unit, tenancy }))
}

#[utoipa::path(
    delete,
    path = "/v1/landlords/{landlord_id}/invites/{token}",
    tag = "invites",
    responses(
        (status = 204, description = "Pending token revoked (idempotent)"),
        (status = 404, description = "Unknown token", body = crate::api::types::ErrorResponse)
    )
)]
/// Landlord revokes a still-pending invite link. A token owned by another
/// landlord reads as not found.
pub(crate) async fn revoke_invite(
    principal: Principal,
    Path((landlord_id, token)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    principal.require_landlord(&landlord_id)?;
    state
        .store
        .revoke_invite_token(&landlord_id, &token)
        .await
        .map_err(|err| api_store_error("failed to revoke invite", err))?;
    Ok(StatusCode::NO_CONTENT)
}

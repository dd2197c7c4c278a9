//! Multi-step onboarding and tenancy workflows.
//!
//! # Purpose
//! Composes store primitives into the business flows the API exposes:
//! lazy invite-code provisioning, invite-token minting, join-request
//! resolution, manual occupant assignment, and move-out.
//!
//! # Consistency
//! These flows are read-then-write over individual store calls; only token
//! acceptance is atomic, and it lives in the store. Concurrent landlord
//! actions on the same unit can interleave, which the system accepts given
//! per-landlord traffic.
use crate::model::{
    generate_code, normalize_code, token_slug, CodeStatus, InviteCode, InviteToken, JoinRequest,
    NewTenancy, Occupancy, Occupant, Property, PropertyKey, Tenancy, TokenStatus, Unit, UnitKey,
    TOKEN_TTL_MS,
};
use crate::store::{PortfolioStore, StoreError, StoreResult};
use anyhow::anyhow;

/// Attempts before giving up on a colliding random code or token slug.
const MINT_ATTEMPTS: usize = 5;

/// Return the property's active invite code, minting one if none exists.
///
/// Codes are provisioned lazily on first read rather than at property
/// creation, so properties whose landlord never opens the invite panel never
/// consume a code.
pub async fn ensure_invite_code(
    store: &dyn PortfolioStore,
    key: &PropertyKey,
    now_ms: i64,
) -> StoreResult<InviteCode> {
    let property = store.get_property(key).await?;
    if let Some(active) = store.active_code_for_property(key).await? {
        return Ok(active);
    }
    mint_code(store, &property, now_ms).await
}

/// Revoke the current code (if any) and mint a fresh one.
///
/// The old code stops resolving immediately; links and screenshots that
/// captured it go dead.
pub async fn regenerate_invite_code(
    store: &dyn PortfolioStore,
    key: &PropertyKey,
    now_ms: i64,
) -> StoreResult<InviteCode> {
    let property = store.get_property(key).await?;
    if let Some(active) = store.active_code_for_property(key).await? {
        store.revoke_invite_code(&active.code).await?;
    }
    mint_code(store, &property, now_ms).await
}

async fn mint_code(
    store: &dyn PortfolioStore,
    property: &Property,
    now_ms: i64,
) -> StoreResult<InviteCode> {
    for _ in 0..MINT_ATTEMPTS {
        let code = InviteCode {
            code: generate_code(&mut rand::thread_rng()),
            landlord_id: property.landlord_id.clone(),
            property_id: property.property_id.clone(),
            property_name: property.name.clone(),
            status: CodeStatus::Active,
            created_at_ms: now_ms,
        };
        match store.insert_invite_code(code).await {
            Ok(inserted) => return Ok(inserted),
            // Random collision in the 32^6 space; roll again.
            Err(StoreError::Conflict(_)) => continue,
            Err(other) => return Err(other),
        }
    }
    Err(StoreError::Unexpected(anyhow!(
        "could not mint a unique invite code after {MINT_ATTEMPTS} attempts"
    )))
}

/// Resolve a user-entered invite code to its property and unit listing.
///
/// Invalid, unknown, and revoked codes are indistinguishable to the caller:
/// all resolve to `NotFound`, so a revoked code leaks nothing about the
/// property it used to open.
pub async fn resolve_invite_code(
    store: &dyn PortfolioStore,
    input: &str,
) -> StoreResult<(InviteCode, Vec<Unit>)> {
    let code = normalize_code(input).ok_or_else(|| StoreError::NotFound("invite code".into()))?;
    let record = store
        .get_invite_code(&code)
        .await?
        .filter(|record| record.status == CodeStatus::Active)
        .ok_or_else(|| StoreError::NotFound("invite code".into()))?;
    let units = store
        .list_units(&PropertyKey {
            landlord_id: record.landlord_id.clone(),
            property_id: record.property_id.clone(),
        })
        .await?;
    Ok((record, units))
}

/// Tenant joins via invite code: resolve the code, then place a pending
/// request on the chosen unit. The landlord must still approve.
pub async fn request_join_via_code(
    store: &dyn PortfolioStore,
    input: &str,
    unit_id: &str,
    candidate: JoinRequest,
) -> StoreResult<Unit> {
    let (record, _) = resolve_invite_code(store, input).await?;
    let key = UnitKey {
        landlord_id: record.landlord_id,
        property_id: record.property_id,
        unit_id: unit_id.to_string(),
    };
    store.request_join(&key, candidate).await
}

/// Mint a unit-scoped invite token, superseding any pending predecessor for
/// the same unit.
pub async fn create_unit_invite(
    store: &dyn PortfolioStore,
    key: &UnitKey,
    now_ms: i64,
) -> StoreResult<InviteToken> {
    let property = store
        .get_property(&PropertyKey {
            landlord_id: key.landlord_id.clone(),
            property_id: key.property_id.clone(),
        })
        .await?;
    let unit = store.get_unit(key).await?;
    if unit.occupancy == Occupancy::Occupied {
        return Err(StoreError::Conflict(
            "cannot invite to an occupied unit".into(),
        ));
    }
    mint_token(store, &property, Some(&unit), now_ms).await
}

/// Mint a property-scoped invite token; the tenant picks a vacant unit at
/// redemption time.
pub async fn create_property_invite(
    store: &dyn PortfolioStore,
    key: &PropertyKey,
    now_ms: i64,
) -> StoreResult<InviteToken> {
    let property = store.get_property(key).await?;
    mint_token(store, &property, None, now_ms).await
}

async fn mint_token(
    store: &dyn PortfolioStore,
    property: &Property,
    unit: Option<&Unit>,
    now_ms: i64,
) -> StoreResult<InviteToken> {
    for _ in 0..MINT_ATTEMPTS {
        let token = InviteToken {
            token: token_slug(&property.name, &mut rand::thread_rng()),
            landlord_id: property.landlord_id.clone(),
            property_id: property.property_id.clone(),
            unit_id: unit.map(|u| u.unit_id.clone()),
            unit_name: unit.map(|u| u.name.clone()),
            property_name: property.name.clone(),
            created_at_ms: now_ms,
            expires_at_ms: now_ms + TOKEN_TTL_MS,
            status: TokenStatus::Pending,
            accepted_by: None,
        };
        match store.insert_invite_token(token).await {
            Ok(inserted) => return Ok(inserted),
            Err(StoreError::Conflict(_)) => continue,
            Err(other) => return Err(other),
        }
    }
    Err(StoreError::Unexpected(anyhow!(
        "could not mint a unique invite token after {MINT_ATTEMPTS} attempts"
    )))
}

/// Landlord approves a pending join request.
///
/// Promotes the candidate to occupant, then opens the tenancy with
/// terminate-then-insert so at most one active tenancy exists per unit.
pub async fn approve_join_request(
    store: &dyn PortfolioStore,
    key: &UnitKey,
    now_ms: i64,
) -> StoreResult<(Unit, Tenancy)> {
    let unit = store.approve_join(key).await?;
    let occupant = unit
        .occupant
        .clone()
        .ok_or_else(|| StoreError::Invalid("approved unit has no occupant".into()))?;
    let tenancy = open_tenancy(store, &unit, occupant, now_ms).await?;
    Ok((unit, tenancy))
}

/// Landlord manually assigns an occupant to a vacant unit and opens the
/// tenancy. The only entry point for ghost tenants (no account id).
pub async fn assign_and_open(
    store: &dyn PortfolioStore,
    key: &UnitKey,
    occupant: Occupant,
    now_ms: i64,
) -> StoreResult<(Unit, Tenancy)> {
    let unit = store.assign_occupant(key, occupant.clone()).await?;
    let tenancy = open_tenancy(store, &unit, occupant, now_ms).await?;
    Ok((unit, tenancy))
}

async fn open_tenancy(
    store: &dyn PortfolioStore,
    unit: &Unit,
    occupant: Occupant,
    now_ms: i64,
) -> StoreResult<Tenancy> {
    store.terminate_active_for_unit(&unit.key(), now_ms).await?;
    store
        .insert_tenancy(
            NewTenancy {
                landlord_id: unit.landlord_id.clone(),
                property_id: unit.property_id.clone(),
                unit_id: unit.unit_id.clone(),
                tenant_id: occupant.tenant_id,
                tenant_name: occupant.display_name,
                tenant_email: occupant.email,
                rent_amount: unit.rent_amount,
                billing_cycle: unit.billing_cycle,
                currency: unit.currency.clone(),
            },
            now_ms,
        )
        .await
}

/// Landlord records a move-out: the unit returns to vacant and every active
/// tenancy for it is closed. Returns the vacated unit and the number of
/// tenancies terminated.
pub async fn record_move_out(
    store: &dyn PortfolioStore,
    key: &UnitKey,
    now_ms: i64,
) -> StoreResult<(Unit, u64)> {
    let unit = store.record_move_out(key).await?;
    let closed = store.terminate_active_for_unit(key, now_ms).await?;
    Ok((unit, closed))
}

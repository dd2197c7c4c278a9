//! HTTP API request/response types.
//!
//! # Purpose
//! Defines shared payload shapes for the portfolio REST API and OpenAPI
//! schema generation.
use crate::model::{
    BillingCycle, InviteCode, Notification, Occupancy, Property, Tenancy, TenancyChange,
    TokenStatus, Unit, UnitChange,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct FeatureFlags {
    pub durable_storage: bool,
    pub invite_tokens: bool,
    pub invite_codes: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SystemInfo {
    pub api_version: String,
    pub backend: String,
    pub features: FeatureFlags,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct PropertyCreateRequest {
    pub property_id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct PropertyListResponse {
    pub items: Vec<Property>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UnitCreateRequest {
    pub unit_id: String,
    pub name: String,
    /// Rent per billing cycle, in minor currency units.
    pub rent_amount: i64,
    pub billing_cycle: BillingCycle,
    pub currency: String,
}

/// All-or-nothing bulk form of unit creation, for initial property setup.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UnitBatchCreateRequest {
    pub units: Vec<UnitCreateRequest>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UnitListResponse {
    pub items: Vec<Unit>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UnitSnapshotResponse {
    pub items: Vec<Unit>,
    pub next_seq: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UnitChangesResponse {
    pub items: Vec<UnitChange>,
    pub next_seq: u64,
}

/// Landlord-facing view of the property's invite code.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct InviteCodeResponse {
    pub code: String,
    pub property_id: String,
    pub property_name: String,
}

impl InviteCodeResponse {
    pub fn from_record(record: InviteCode) -> Self {
        Self {
            code: record.code,
            property_id: record.property_id,
            property_name: record.property_name,
        }
    }
}

/// Public unit summary shown on the code-entry portal. Deliberately omits
/// occupant and candidate identities.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct PortalUnit {
    pub unit_id: String,
    pub name: String,
    pub occupancy: Occupancy,
}

impl PortalUnit {
    pub fn from_unit(unit: &Unit) -> Self {
        Self {
            unit_id: unit.unit_id.clone(),
            name: unit.name.clone(),
            occupancy: unit.occupancy,
        }
    }
}

/// What a tenant sees after entering a valid invite code.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CodePortalResponse {
    pub property_id: String,
    pub property_name: String,
    pub units: Vec<PortalUnit>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct JoinViaCodeRequest {
    pub unit_id: String,
}

/// Landlord-facing token mint response, including the shareable link.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct InviteTokenResponse {
    pub token: String,
    pub invite_url: String,
    pub property_name: String,
    pub unit_id: Option<String>,
    pub unit_name: Option<String>,
    pub expires_at_ms: i64,
    pub status: TokenStatus,
}

/// Public preview of an invite link, shown before sign-in. Identifies the
/// destination without exposing landlord or occupant identities.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct InvitePreviewResponse {
    pub property_name: String,
    pub unit_id: Option<String>,
    pub unit_name: Option<String>,
    pub expires_at_ms: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AcceptInviteRequest {
    /// Required for property-scoped tokens, ignored for unit-scoped ones.
    pub unit_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RevokedInvitesResponse {
    /// Number of pending tokens newly marked expired.
    pub revoked: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AcceptInviteResponse {
    pub unit: Unit,
    pub tenancy: Tenancy,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ApproveResponse {
    pub unit: Unit,
    pub tenancy: Tenancy,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AssignOccupantRequest {
    /// Omit for ghost tenants entered without a system account.
    pub tenant_id: Option<String>,
    pub display_name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AssignOccupantResponse {
    pub unit: Unit,
    pub tenancy: Tenancy,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct MoveOutResponse {
    pub unit: Unit,
    /// Number of tenancies closed by the move-out (normally 1).
    pub terminated: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct TenancyListResponse {
    pub items: Vec<Tenancy>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct TenancySnapshotResponse {
    pub items: Vec<Tenancy>,
    pub next_seq: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct TenancyChangesResponse {
    pub items: Vec<TenancyChange>,
    pub next_seq: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct NotificationListResponse {
    pub items: Vec<Notification>,
}

//! OpenAPI schema aggregation for the portfolio API.
//!
//! # Purpose
//! Collects all routes and schema types into a single OpenAPI document for
//! docs and client generation.
use crate::api::{
    invites, properties, system, tenancies, units,
    types::{
        AcceptInviteRequest, AcceptInviteResponse, ApproveResponse, AssignOccupantRequest,
        AssignOccupantResponse, CodePortalResponse, ErrorResponse, FeatureFlags, HealthStatus,
        InviteCodeResponse, InvitePreviewResponse, InviteTokenResponse, JoinViaCodeRequest,
        MoveOutResponse, NotificationListResponse, PortalUnit, PropertyCreateRequest,
        PropertyListResponse, RevokedInvitesResponse, SystemInfo, TenancyChangesResponse,
        TenancyListResponse, TenancySnapshotResponse, UnitBatchCreateRequest, UnitChangesResponse,
        UnitCreateRequest, UnitListResponse, UnitSnapshotResponse,
    },
};
use crate::model::{
    BillingCycle, JoinRequest, Notification, NotificationKind, Occupancy, Occupant, Property,
    PropertyKey, Tenancy, TenancyChange, TenancyChangeOp, TenancyStatus, TokenStatus, Unit,
    UnitChange, UnitChangeOp, UnitKey,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "haven-controlplane",
        version = "v1",
        description = "Haven property portfolio HTTP API"
    ),
    paths(
        system::system_info,
        system::system_health,
        properties::list_properties,
        properties::create_property,
        properties::get_property,
        properties::delete_property,
        properties::get_invite_code,
        properties::regenerate_invite_code,
        properties::revoke_invite_code,
        properties::list_notifications,
        units::list_units,
        units::create_unit,
        units::create_units,
        units::get_unit,
        units::delete_unit,
        units::approve_join,
        units::decline_join,
        units::record_move_out,
        units::assign_occupant,
        units::unit_snapshot,
        units::unit_changes,
        invites::resolve_code,
        invites::join_via_code,
        invites::create_property_invite,
        invites::create_unit_invite,
        invites::preview_invite,
        invites::accept_invite,
        invites::revoke_invite,
        invites::revoke_unit_invites,
        tenancies::list_landlord_tenancies,
        tenancies::unit_tenancy_history,
        tenancies::active_unit_tenancy,
        tenancies::terminate_tenancy,
        tenancies::my_tenancies,
        tenancies::tenancy_snapshot,
        tenancies::tenancy_changes
    ),
    components(schemas(
        FeatureFlags,
        SystemInfo,
        HealthStatus,
        ErrorResponse,
        Property,
        PropertyKey,
        PropertyCreateRequest,
        PropertyListResponse,
        Unit,
        UnitKey,
        UnitCreateRequest,
        UnitBatchCreateRequest,
        UnitListResponse,
        UnitSnapshotResponse,
        UnitChange,
        UnitChangesResponse,
        UnitChangeOp,
        Occupancy,
        Occupant,
        JoinRequest,
        BillingCycle,
        InviteCodeResponse,
        CodePortalResponse,
        PortalUnit,
        JoinViaCodeRequest,
        InviteTokenResponse,
        InvitePreviewResponse,
        AcceptInviteRequest,
        AcceptInviteResponse,
        RevokedInvitesResponse,
        TokenStatus,
        ApproveResponse,
        AssignOccupantRequest,
        AssignOccupantResponse,
        MoveOutResponse,
        Tenancy,
        TenancyStatus,
        TenancyListResponse,
        TenancySnapshotResponse,
        TenancyChange,
        TenancyChangesResponse,
        TenancyChangeOp,
        Notification,
        NotificationKind,
        NotificationListResponse
    )),
    tags(
        (name = "system", description = "System and discovery endpoints"),
        (name = "properties", description = "Property management"),
        (name = "units", description = "Unit management and occupancy transitions"),
        (name = "invites", description = "Invite codes and invite tokens"),
        (name = "tenancies", description = "Lease records and history"),
        (name = "notifications", description = "Landlord notification feed")
    )
)]
pub struct ApiDoc;

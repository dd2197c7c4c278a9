//! Portfolio HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Notes
//! This module centralizes route composition to keep `main` small and testable.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::api::types::FeatureFlags;
use crate::store::PortfolioStore;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub api_version: String,
    pub features: FeatureFlags,
    pub store: Arc<dyn PortfolioStore + Send + Sync>,
    /// Base URL stamped into shareable invite links.
    pub public_base_url: String,
}

impl AppState {
    pub fn invite_url(&self, token: &str) -> String {
        format!("{}/invite/{token}", self.public_base_url.trim_end_matches('/'))
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            )
        });

    Router::new()
        .route(
            "/v1/system/info",
            axum::routing::get(api::system::system_info),
        )
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route(
            "/v1/units/snapshot",
            axum::routing::get(api::units::unit_snapshot),
        )
        .route(
            "/v1/units/changes",
            axum::routing::get(api::units::unit_changes),
        )
        .route(
            "/v1/tenancies/snapshot",
            axum::routing::get(api::tenancies::tenancy_snapshot),
        )
        .route(
            "/v1/tenancies/changes",
            axum::routing::get(api::tenancies::tenancy_changes),
        )
        .route(
            "/v1/landlords/:landlord_id/properties",
            axum::routing::get(api::properties::list_properties)
                .post(api::properties::create_property),
        )
        .route(
            "/v1/landlords/:landlord_id/properties/:property_id",
            axum::routing::get(api::properties::get_property)
                .delete(api::properties::delete_property),
        )
        .route(
            "/v1/landlords/:landlord_id/properties/:property_id/invite-code",
            axum::routing::get(api::properties::get_invite_code)
                .delete(api::properties::revoke_invite_code),
        )
        .route(
            "/v1/landlords/:landlord_id/properties/:property_id/invite-code/regenerate",
            axum::routing::post(api::properties::regenerate_invite_code),
        )
        .route(
            "/v1/landlords/:landlord_id/properties/:property_id/invites",
            axum::routing::post(api::invites::create_property_invite),
        )
        .route(
            "/v1/landlords/:landlord_id/properties/:property_id/units",
            axum::routing::get(api::units::list_units).post(api::units::create_unit),
        )
        .route(
            "/v1/landlords/:landlord_id/properties/:property_id/units/batch",
            axum::routing::post(api::units::create_units),
        )
        .route(
            "/v1/landlords/:landlord_id/properties/:property_id/units/:unit_id",
            axum::routing::get(api::units::get_unit).delete(api::units::delete_unit),
        )
        .route(
            "/v1/landlords/:landlord_id/properties/:property_id/units/:unit_id/approve",
            axum::routing::post(api::units::approve_join),
        )
        .route(
            "/v1/landlords/:landlord_id/properties/:property_id/units/:unit_id/decline",
            axum::routing::post(api::units::decline_join),
        )
        .route(
            "/v1/landlords/:landlord_id/properties/:property_id/units/:unit_id/move-out",
            axum::routing::post(api::units::record_move_out),
        )
        .route(
            "/v1/landlords/:landlord_id/properties/:property_id/units/:unit_id/occupant",
            axum::routing::post(api::units::assign_occupant),
        )
        .route(
            "/v1/landlords/:landlord_id/properties/:property_id/units/:unit_id/invites",
            axum::routing::post(api::invites::create_unit_invite)
                .delete(api::invites::revoke_unit_invites),
        )
        .route(
            "/v1/landlords/:landlord_id/properties/:property_id/units/:unit_id/tenancies",
            axum::routing::get(api::tenancies::unit_tenancy_history),
        )
        .route(
            "/v1/landlords/:landlord_id/properties/:property_id/units/:unit_id/tenancies/active",
            axum::routing::get(api::tenancies::active_unit_tenancy),
        )
        .route(
            "/v1/landlords/:landlord_id/tenancies",
            axum::routing::get(api::tenancies::list_landlord_tenancies),
        )
        .route(
            "/v1/tenants/me/tenancies",
            axum::routing::get(api::tenancies::my_tenancies),
        )
        .route(
            "/v1/landlords/:landlord_id/tenancies/:tenancy_id/terminate",
            axum::routing::post(api::tenancies::terminate_tenancy),
        )
        .route(
            "/v1/landlords/:landlord_id/notifications",
            axum::routing::get(api::properties::list_notifications),
        )
        .route(
            "/v1/landlords/:landlord_id/invites/:token",
            axum::routing::delete(api::invites::revoke_invite),
        )
        .route(
            "/v1/invite-codes/:code",
            axum::routing::get(api::invites::resolve_code),
        )
        .route(
            "/v1/invite-codes/:code/join",
            axum::routing::post(api::invites::join_via_code),
        )
        .route(
            "/v1/invites/:token",
            axum::routing::get(api::invites::preview_invite),
        )
        .route(
            "/v1/invites/:token/accept",
            axum::routing::post(api::invites::accept_invite),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/v1/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}

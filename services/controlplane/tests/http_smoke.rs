mod common;
mod http_helpers;

use axum::http::StatusCode;
use common::{read_error_code, read_json};
use controlplane::api::types::FeatureFlags;
use controlplane::app::{build_router, AppState};
use http_helpers::{json_request, request, LANDLORD, OTHER_LANDLORD, OTHER_TENANT, TENANT};
use controlplane::store::PortfolioStore;
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> axum::routing::RouterIntoService<axum::body::Body, ()> {
    let store = controlplane::store::memory::InMemoryStore::new(controlplane::store::StoreConfig {
        changes_limit: 100,
        change_retention_max_rows: Some(100),
    });
    let state = AppState {
        api_version: "v1".to_string(),
        features: FeatureFlags {
            durable_storage: store.is_durable(),
            invite_tokens: true,
            invite_codes: true,
        },
        store: Arc::new(store),
        public_base_url: "https://portal.test".to_string(),
    };
    build_router(state).into_service()
}

async fn seed_property_and_unit(app: &axum::routing::RouterIntoService<axum::body::Body, ()>) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/landlords/l1/properties",
            Some(LANDLORD),
            serde_json::json!({ "property_id": "p1", "name": "Maple Court" }),
        ))
        .await
        .expect("property");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/landlords/l1/properties/p1/units",
            Some(LANDLORD),
            serde_json::json!({
                "unit_id": "u1",
                "name": "Unit 1",
                "rent_amount": 120000,
                "billing_cycle": "monthly",
                "currency": "USD"
            }),
        ))
        .await
        .expect("unit");
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn fetch_invite_code(
    app: &axum::routing::RouterIntoService<axum::body::Body, ()>,
) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/v1/landlords/l1/properties/p1/invite-code",
            Some(LANDLORD),
        ))
        .await
        .expect("invite code");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    payload["code"].as_str().expect("code").to_string()
}

#[tokio::test]
async fn system_endpoints_report_identity_and_health() {
    let app = app();

    let response = app
        .clone()
        .oneshot(request("GET", "/v1/system/info", None))
        .await
        .expect("info");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["api_version"], "v1");
    assert_eq!(payload["backend"], "memory");
    assert_eq!(payload["features"]["durable_storage"], false);

    let response = app
        .clone()
        .oneshot(request("GET", "/v1/system/health", None))
        .await
        .expect("health");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["status"], "ok");
}

#[tokio::test]
async fn identity_and_ownership_are_enforced() {
    let app = app();
    seed_property_and_unit(&app).await;

    // No identity headers at all.
    let response = app
        .clone()
        .oneshot(request("GET", "/v1/landlords/l1/properties", None))
        .await
        .expect("anonymous");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Another landlord cannot read this portfolio.
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/v1/landlords/l1/properties",
            Some(OTHER_LANDLORD),
        ))
        .await
        .expect("foreign landlord");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A tenant cannot use landlord endpoints.
    let response = app
        .clone()
        .oneshot(request("GET", "/v1/landlords/l1/properties", Some(TENANT)))
        .await
        .expect("tenant on landlord route");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A landlord cannot place a tenant join request.
    let code = fetch_invite_code(&app).await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/v1/invite-codes/{code}/join"),
            Some(LANDLORD),
            serde_json::json!({ "unit_id": "u1" }),
        ))
        .await
        .expect("landlord join");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn code_join_approval_flow() {
    let app = app();
    seed_property_and_unit(&app).await;
    let code = fetch_invite_code(&app).await;

    // The code is stable across reads.
    assert_eq!(fetch_invite_code(&app).await, code);

    // Public portal resolution, case-insensitive entry.
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/v1/invite-codes/{}", code.to_ascii_lowercase()),
            None,
        ))
        .await
        .expect("portal");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["property_name"], "Maple Court");
    assert_eq!(payload["units"].as_array().expect("units").len(), 1);

    // Tenant requests to join.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/v1/invite-codes/{code}/join"),
            Some(TENANT),
            serde_json::json!({ "unit_id": "u1" }),
        ))
        .await
        .expect("join");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json(response).await;
    assert_eq!(payload["occupancy"], "pending_approval");

    // The landlord sees the notification.
    let response = app
        .clone()
        .oneshot(request("GET", "/v1/landlords/l1/notifications", Some(LANDLORD)))
        .await
        .expect("notifications");
    let payload = read_json(response).await;
    let items = payload["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["tenant_name"], "Sam Renter");
    assert_eq!(items[0]["kind"], "join_requested");

    // A second tenant cannot pile onto the pending unit.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/v1/invite-codes/{code}/join"),
            Some(OTHER_TENANT),
            serde_json::json!({ "unit_id": "u1" }),
        ))
        .await
        .expect("second join");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Approval occupies the unit and opens the tenancy.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/v1/landlords/l1/properties/p1/units/u1/approve",
            Some(LANDLORD),
        ))
        .await
        .expect("approve");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["unit"]["occupancy"], "occupied");
    assert_eq!(payload["tenancy"]["status"], "active");
    assert_eq!(payload["tenancy"]["tenant_id"], "t1");
    assert_eq!(payload["tenancy"]["rent_amount"], 120000);

    // Notifications are cleared by the approval.
    let response = app
        .clone()
        .oneshot(request("GET", "/v1/landlords/l1/notifications", Some(LANDLORD)))
        .await
        .expect("notifications");
    let payload = read_json(response).await;
    assert!(payload["items"].as_array().expect("items").is_empty());

    // The tenant sees their own tenancy.
    let response = app
        .clone()
        .oneshot(request("GET", "/v1/tenants/me/tenancies", Some(TENANT)))
        .await
        .expect("my tenancies");
    let payload = read_json(response).await;
    assert_eq!(payload["items"].as_array().expect("items").len(), 1);
}

#[tokio::test]
async fn tenant_self_tenancy_listing_is_reachable() {
    let app = app();

    // A fresh tenant gets an empty list, not a missing route.
    let response = app
        .clone()
        .oneshot(request("GET", "/v1/tenants/me/tenancies", Some(TENANT)))
        .await
        .expect("my tenancies");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert!(payload["items"].as_array().expect("items").is_empty());

    // Landlords have their own listing; the self endpoint is tenant-only.
    let response = app
        .clone()
        .oneshot(request("GET", "/v1/tenants/me/tenancies", Some(LANDLORD)))
        .await
        .expect("landlord on tenant route");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn decline_returns_unit_to_vacant() {
    let app = app();
    seed_property_and_unit(&app).await;
    let code = fetch_invite_code(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/v1/invite-codes/{code}/join"),
            Some(TENANT),
            serde_json::json!({ "unit_id": "u1" }),
        ))
        .await
        .expect("join");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/v1/landlords/l1/properties/p1/units/u1/decline",
            Some(LANDLORD),
        ))
        .await
        .expect("decline");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["occupancy"], "vacant");
    assert!(payload["join_request"].is_null());

    // No tenancy was opened.
    let response = app
        .clone()
        .oneshot(request("GET", "/v1/landlords/l1/tenancies", Some(LANDLORD)))
        .await
        .expect("tenancies");
    let payload = read_json(response).await;
    assert!(payload["items"].as_array().expect("items").is_empty());
}

#[tokio::test]
async fn regenerated_code_kills_the_old_one() {
    let app = app();
    seed_property_and_unit(&app).await;
    let old = fetch_invite_code(&app).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/v1/landlords/l1/properties/p1/invite-code/regenerate",
            Some(LANDLORD),
        ))
        .await
        .expect("regenerate");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    let new = payload["code"].as_str().expect("code").to_string();
    assert_ne!(old, new);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/v1/invite-codes/{old}"), None))
        .await
        .expect("old code");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/v1/invite-codes/{new}"), None))
        .await
        .expect("new code");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unit_invite_token_flow_is_single_use() {
    let app = app();
    seed_property_and_unit(&app).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/v1/landlords/l1/properties/p1/units/u1/invites",
            Some(LANDLORD),
        ))
        .await
        .expect("mint");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json(response).await;
    let token = payload["token"].as_str().expect("token").to_string();
    assert!(token.starts_with("maple-court-"));
    assert_eq!(
        payload["invite_url"],
        format!("https://portal.test/invite/{token}")
    );
    assert_eq!(payload["unit_id"], "u1");

    // Public preview without identity.
    let response = app
        .clone()
        .oneshot(request("GET", &format!("/v1/invites/{token}"), None))
        .await
        .expect("preview");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["property_name"], "Maple Court");
    assert_eq!(payload["unit_name"], "Unit 1");

    // Acceptance bypasses landlord review entirely.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/v1/invites/{token}/accept"),
            Some(TENANT),
            serde_json::json!({ "unit_id": null }),
        ))
        .await
        .expect("accept");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["unit"]["occupancy"], "occupied");
    assert_eq!(payload["unit"]["occupant"]["tenant_id"], "t1");
    assert_eq!(payload["tenancy"]["status"], "active");

    // The second tenant is turned away with the precise reason.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/v1/invites/{token}/accept"),
            Some(OTHER_TENANT),
            serde_json::json!({ "unit_id": null }),
        ))
        .await
        .expect("second accept");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(read_error_code(response).await, "already_used");

    // And the preview now reports the same dead end.
    let response = app
        .clone()
        .oneshot(request("GET", &format!("/v1/invites/{token}"), None))
        .await
        .expect("preview after accept");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(read_error_code(response).await, "already_used");
}

#[tokio::test]
async fn property_invite_requires_unit_choice() {
    let app = app();
    seed_property_and_unit(&app).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/v1/landlords/l1/properties/p1/invites",
            Some(LANDLORD),
        ))
        .await
        .expect("mint");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json(response).await;
    let token = payload["token"].as_str().expect("token").to_string();
    assert!(payload["unit_id"].is_null());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/v1/invites/{token}/accept"),
            Some(TENANT),
            serde_json::json!({ "unit_id": null }),
        ))
        .await
        .expect("accept without unit");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/v1/invites/{token}/accept"),
            Some(TENANT),
            serde_json::json!({ "unit_id": "u1" }),
        ))
        .await
        .expect("accept with unit");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["unit"]["unit_id"], "u1");
}

#[tokio::test]
async fn revoked_invite_stops_resolving() {
    let app = app();
    seed_property_and_unit(&app).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/v1/landlords/l1/properties/p1/units/u1/invites",
            Some(LANDLORD),
        ))
        .await
        .expect("mint");
    let payload = read_json(response).await;
    let token = payload["token"].as_str().expect("token").to_string();

    // Another landlord cannot revoke it.
    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/v1/landlords/l2/invites/{token}"),
            Some(OTHER_LANDLORD),
        ))
        .await
        .expect("foreign revoke");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/v1/landlords/l1/invites/{token}"),
            Some(LANDLORD),
        ))
        .await
        .expect("revoke");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/v1/invites/{token}"), None))
        .await
        .expect("preview");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(read_error_code(response).await, "expired");
}

#[tokio::test]
async fn occupancy_guards_and_move_out_cycle() {
    let app = app();
    seed_property_and_unit(&app).await;

    // Manual assignment of a ghost tenant.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/landlords/l1/properties/p1/units/u1/occupant",
            Some(LANDLORD),
            serde_json::json!({
                "tenant_id": null,
                "display_name": "Walk-in",
                "email": "walkin@example.com"
            }),
        ))
        .await
        .expect("assign");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert!(payload["tenancy"]["tenant_id"].is_null());

    // Occupied units cannot be deleted or invited to.
    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            "/v1/landlords/l1/properties/p1/units/u1",
            Some(LANDLORD),
        ))
        .await
        .expect("delete occupied");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(read_error_code(response).await, "active_tenancy");

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/v1/landlords/l1/properties/p1/units/u1/invites",
            Some(LANDLORD),
        ))
        .await
        .expect("invite occupied");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            "/v1/landlords/l1/properties/p1",
            Some(LANDLORD),
        ))
        .await
        .expect("delete property");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Move out closes the tenancy and unblocks deletion.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/v1/landlords/l1/properties/p1/units/u1/move-out",
            Some(LANDLORD),
        ))
        .await
        .expect("move out");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["unit"]["occupancy"], "vacant");
    assert_eq!(payload["terminated"], 1);

    // History survives the move-out.
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/v1/landlords/l1/properties/p1/units/u1/tenancies",
            Some(LANDLORD),
        ))
        .await
        .expect("history");
    let payload = read_json(response).await;
    let items = payload["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["status"], "former");

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            "/v1/landlords/l1/properties/p1/units/u1",
            Some(LANDLORD),
        ))
        .await
        .expect("delete unit");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            "/v1/landlords/l1/properties/p1",
            Some(LANDLORD),
        ))
        .await
        .expect("delete property");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn batch_unit_create_is_all_or_nothing_over_http() {
    let app = app();
    seed_property_and_unit(&app).await;

    let batch = |ids: &[&str]| {
        serde_json::json!({
            "units": ids
                .iter()
                .map(|id| serde_json::json!({
                    "unit_id": id,
                    "name": format!("Unit {id}"),
                    "rent_amount": 90000,
                    "billing_cycle": "monthly",
                    "currency": "USD"
                }))
                .collect::<Vec<_>>()
        })
    };

    // "u1" already exists; the whole batch must bounce.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/landlords/l1/properties/p1/units/batch",
            Some(LANDLORD),
            batch(&["u2", "u1"]),
        ))
        .await
        .expect("colliding batch");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(read_error_code(response).await, "already_exists");

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/v1/landlords/l1/properties/p1/units",
            Some(LANDLORD),
        ))
        .await
        .expect("list");
    let payload = read_json(response).await;
    assert_eq!(payload["items"].as_array().expect("items").len(), 1);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/landlords/l1/properties/p1/units/batch",
            Some(LANDLORD),
            batch(&["u2", "u3"]),
        ))
        .await
        .expect("batch");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json(response).await;
    assert_eq!(payload["items"].as_array().expect("items").len(), 2);
}

#[tokio::test]
async fn code_revoke_closes_entry_until_regenerated() {
    let app = app();
    seed_property_and_unit(&app).await;
    let code = fetch_invite_code(&app).await;

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            "/v1/landlords/l1/properties/p1/invite-code",
            Some(LANDLORD),
        ))
        .await
        .expect("revoke");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Revoking again is a no-op.
    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            "/v1/landlords/l1/properties/p1/invite-code",
            Some(LANDLORD),
        ))
        .await
        .expect("revoke again");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/v1/invite-codes/{code}"), None))
        .await
        .expect("dead code");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The next landlord read lazily mints a fresh code.
    let fresh = fetch_invite_code(&app).await;
    assert_ne!(fresh, code);
}

#[tokio::test]
async fn bulk_unit_invite_revoke_and_active_tenancy_lookup() {
    let app = app();
    seed_property_and_unit(&app).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/v1/landlords/l1/properties/p1/units/u1/invites",
            Some(LANDLORD),
        ))
        .await
        .expect("mint");
    let payload = read_json(response).await;
    let token = payload["token"].as_str().expect("token").to_string();

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            "/v1/landlords/l1/properties/p1/units/u1/invites",
            Some(LANDLORD),
        ))
        .await
        .expect("bulk revoke");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["revoked"], 1);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/v1/invites/{token}"), None))
        .await
        .expect("preview");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(read_error_code(response).await, "expired");

    // No active tenancy yet.
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/v1/landlords/l1/properties/p1/units/u1/tenancies/active",
            Some(LANDLORD),
        ))
        .await
        .expect("active lookup");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/landlords/l1/properties/p1/units/u1/occupant",
            Some(LANDLORD),
            serde_json::json!({
                "tenant_id": "t1",
                "display_name": "Sam Renter",
                "email": "sam@example.com"
            }),
        ))
        .await
        .expect("assign");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/v1/landlords/l1/properties/p1/units/u1/tenancies/active",
            Some(LANDLORD),
        ))
        .await
        .expect("active lookup");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["status"], "active");
    assert_eq!(payload["tenant_id"], "t1");
}

#[tokio::test]
async fn snapshots_and_changes_feed_dashboards() {
    let app = app();
    seed_property_and_unit(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/landlords/l1/properties/p1/units/u1/occupant",
            Some(LANDLORD),
            serde_json::json!({
                "tenant_id": "t1",
                "display_name": "Sam Renter",
                "email": "sam@example.com"
            }),
        ))
        .await
        .expect("assign");
    assert_eq!(response.status(), StatusCode::OK);

    for path in [
        "/v1/units/snapshot",
        "/v1/units/changes?since=0",
        "/v1/tenancies/snapshot",
        "/v1/tenancies/changes?since=0",
    ] {
        let response = app
            .clone()
            .oneshot(request("GET", path, None))
            .await
            .expect("snapshot/changes");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert!(!payload["items"].as_array().expect("items").is_empty());
        assert!(payload["next_seq"].as_u64().expect("next_seq") > 0);
    }
}

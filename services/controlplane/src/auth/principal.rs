//! Authenticated principal model and extraction.
//!
//! # Purpose
//! Defines the caller identity handlers act on and extracts it from the
//! identity headers stamped by the gateway.
//!
//! # Where it fits
//! Sign-in and session management live in the managed identity tier in front
//! of this service; by the time a request arrives here, the gateway has
//! validated the session and forwarded the verified identity as `x-haven-*`
//! headers. This module trusts those headers and only enforces role and
//! ownership rules.
use crate::api::error::{api_forbidden, api_unauthorized, ApiError};
use crate::model::TenantIdentity;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

const ACTOR_HEADER: &str = "x-haven-actor";
const ROLE_HEADER: &str = "x-haven-role";
const NAME_HEADER: &str = "x-haven-name";
const EMAIL_HEADER: &str = "x-haven-email";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Landlord,
    Tenant,
}

/// Verified identity of the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub actor_id: String,
    pub role: Role,
    pub display_name: String,
    pub email: String,
}

impl Principal {
    /// Landlord-only endpoints scoped to the landlord's own resources.
    pub fn require_landlord(&self, landlord_id: &str) -> Result<(), ApiError> {
        if self.role != Role::Landlord {
            return Err(api_forbidden("landlord role required"));
        }
        if self.actor_id != landlord_id {
            // Cross-landlord access reads as forbidden, not as a hint that
            // the resource exists.
            return Err(api_forbidden("not your portfolio"));
        }
        Ok(())
    }

    /// Tenant-only endpoints that act under the tenant's own identity.
    pub fn require_tenant(&self) -> Result<TenantIdentity, ApiError> {
        if self.role != Role::Tenant {
            return Err(api_forbidden("tenant role required"));
        }
        Ok(TenantIdentity {
            tenant_id: self.actor_id.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        })
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor_id = header(parts, ACTOR_HEADER)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| api_unauthorized("missing identity"))?
            .to_string();
        let role = match header(parts, ROLE_HEADER) {
            Some("landlord") => Role::Landlord,
            Some("tenant") => Role::Tenant,
            _ => return Err(api_unauthorized("missing or unknown role")),
        };
        let display_name = header(parts, NAME_HEADER).unwrap_or_default().to_string();
        let email = header(parts, EMAIL_HEADER).unwrap_or_default().to_string();
        Ok(Principal {
            actor_id,
            role,
            display_name,
            email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Principal, ApiError> {
        let (mut parts, _) = request.into_parts();
        Principal::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn extracts_landlord_identity() {
        let request = Request::builder()
            .header("x-haven-actor", "l1")
            .header("x-haven-role", "landlord")
            .header("x-haven-name", "Pat Owner")
            .header("x-haven-email", "pat@example.com")
            .body(())
            .expect("request");
        let principal = extract(request).await.expect("principal");
        assert_eq!(principal.actor_id, "l1");
        assert_eq!(principal.role, Role::Landlord);
        principal.require_landlord("l1").expect("own portfolio");
        assert!(principal.require_landlord("l2").is_err());
        assert!(principal.require_tenant().is_err());
    }

    #[tokio::test]
    async fn tenant_identity_flows_into_acceptance() {
        let request = Request::builder()
            .header("x-haven-actor", "t1")
            .header("x-haven-role", "tenant")
            .header("x-haven-name", "Sam Renter")
            .header("x-haven-email", "sam@example.com")
            .body(())
            .expect("request");
        let principal = extract(request).await.expect("principal");
        let identity = principal.require_tenant().expect("tenant");
        assert_eq!(identity.tenant_id, "t1");
        assert_eq!(identity.display_name, "Sam Renter");
    }

    #[tokio::test]
    async fn missing_or_unknown_headers_are_unauthorized() {
        let missing = Request::builder().body(()).expect("request");
        assert!(extract(missing).await.is_err());

        let unknown_role = Request::builder()
            .header("x-haven-actor", "a1")
            .header("x-haven-role", "admin")
            .body(())
            .expect("request");
        assert!(extract(unknown_role).await.is_err());
    }
}

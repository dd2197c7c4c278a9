//! Portfolio store abstraction.
//!
//! # Purpose
//! Defines the storage trait behind the HTTP API: properties, units, invite
//! codes, invite tokens, tenancies, and notifications, plus the bounded
//! change streams that back dashboard sync.
//!
//! # Notes
//! `accept_invite_token` is the one cross-entity transition that must be
//! atomic (token consumed + unit occupied + tenancy opened as a single
//! effect). Every other multi-step flow is composed read-then-write in the
//! workflow layer, mirroring the accepted low-contention model of the
//! original system.
use crate::model::{
    InviteCode, InviteToken, JoinRequest, NewTenancy, Notification, Occupant, Property,
    PropertyKey, RedemptionReason, Tenancy, TenancyChange, TenantIdentity, Unit, UnitChange,
    UnitKey,
};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Max number of changes returned per `*_changes()` call.
    pub changes_limit: u64,
    /// Retention bound for the in-memory change logs.
    pub change_retention_max_rows: Option<i64>,
}

impl StoreConfig {
    pub fn change_window(&self) -> usize {
        self.change_retention_max_rows
            .unwrap_or(self.changes_limit as i64)
            .max(self.changes_limit as i64) as usize
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub next_seq: u64,
}

#[derive(Debug, Clone)]
pub struct ChangeSet<T> {
    pub items: Vec<T>,
    pub next_seq: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid: {0}")]
    Invalid(String),
    /// Domain-level invite redemption failure. Terminal for that token.
    #[error("redemption failed: {0}")]
    Redemption(RedemptionReason),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait PortfolioStore: Send + Sync {
    async fn list_properties(&self, landlord_id: &str) -> StoreResult<Vec<Property>>;
    async fn create_property(&self, property: Property) -> StoreResult<Property>;
    async fn get_property(&self, key: &PropertyKey) -> StoreResult<Property>;
    /// Guard-then-act delete: rejected while any unit of the property has an
    /// active tenancy. Cascades to the property's units.
    async fn delete_property(&self, key: &PropertyKey) -> StoreResult<()>;

    async fn list_units(&self, key: &PropertyKey) -> StoreResult<Vec<Unit>>;
    async fn create_unit(&self, unit: Unit) -> StoreResult<Unit>;
    /// All-or-nothing batch insert for initial property setup: either every
    /// unit in the batch is created or none are.
    async fn create_units(&self, units: Vec<Unit>) -> StoreResult<Vec<Unit>>;
    async fn get_unit(&self, key: &UnitKey) -> StoreResult<Unit>;
    /// Guard-then-act delete: rejected while the unit has an active tenancy.
    async fn delete_unit(&self, key: &UnitKey) -> StoreResult<()>;

    /// `vacant -> pending_approval`; records the candidate identity and
    /// raises a landlord notification.
    async fn request_join(&self, key: &UnitKey, candidate: JoinRequest) -> StoreResult<Unit>;
    /// `pending_approval -> occupied`; promotes the pending candidate to
    /// occupant and clears the unit's notifications. Tenancy creation is the
    /// workflow's responsibility.
    async fn approve_join(&self, key: &UnitKey) -> StoreResult<Unit>;
    /// `pending_approval -> vacant`; clears pending fields and notifications.
    async fn decline_join(&self, key: &UnitKey) -> StoreResult<Unit>;
    /// `occupied -> vacant`; clears the occupant. Tenancy termination is the
    /// workflow's responsibility.
    async fn record_move_out(&self, key: &UnitKey) -> StoreResult<Unit>;
    /// Manual landlord assignment, `vacant -> occupied`. Ghost tenants
    /// (no `tenant_id`) are allowed here and only here.
    async fn assign_occupant(&self, key: &UnitKey, occupant: Occupant) -> StoreResult<Unit>;
    async fn unit_snapshot(&self) -> StoreResult<Snapshot<Unit>>;
    async fn unit_changes(&self, since: u64) -> StoreResult<ChangeSet<UnitChange>>;

    /// Insert a freshly generated code. Returns `Conflict` when the code
    /// collides with an existing record; the workflow retries generation.
    /// Denormalizes the code onto the owning property.
    async fn insert_invite_code(&self, code: InviteCode) -> StoreResult<InviteCode>;
    async fn get_invite_code(&self, code: &str) -> StoreResult<Option<InviteCode>>;
    /// Active code lookup: primary path scans code records by owner and
    /// status; fallback path follows the denormalized property field and
    /// re-verifies the referenced code is still active.
    async fn active_code_for_property(&self, key: &PropertyKey)
        -> StoreResult<Option<InviteCode>>;
    /// Idempotent: revoking an already revoked code is a no-op.
    async fn revoke_invite_code(&self, code: &str) -> StoreResult<InviteCode>;

    /// Insert a new token. When unit-scoped, first expires all other pending
    /// tokens for the same unit (at most one redeemable token per unit).
    async fn insert_invite_token(&self, token: InviteToken) -> StoreResult<InviteToken>;
    /// Load and validate a token. Applies lazy expiry: a `Pending` record
    /// past its deadline is flipped to `Expired` in storage before the
    /// `expired` reason is returned.
    async fn fetch_invite_token(&self, token: &str, now_ms: i64) -> StoreResult<InviteToken>;
    /// The trusted atomic transition: re-validate, consume the token, occupy
    /// the unit, terminate any stale active tenancy, open the new tenancy,
    /// and clear related notifications — all under one store call.
    ///
    /// `chosen_unit` selects the target for property-scoped tokens and is
    /// ignored for unit-scoped ones.
    async fn accept_invite_token(
        &self,
        token: &str,
        tenant: TenantIdentity,
        chosen_unit: Option<String>,
        now_ms: i64,
    ) -> StoreResult<(InviteToken, Unit, Tenancy)>;
    /// Idempotent expiry-marking of a single token. `NotFound` when the
    /// token does not exist or belongs to another landlord.
    async fn revoke_invite_token(&self, landlord_id: &str, token: &str) -> StoreResult<()>;
    /// Bulk expiry-marking of all pending tokens for a unit. Returns the
    /// number of tokens newly expired.
    async fn revoke_pending_tokens_for_unit(&self, key: &UnitKey) -> StoreResult<u64>;

    /// Plain insert; single-active enforcement is terminate-then-insert in
    /// the workflow (and inside `accept_invite_token`).
    async fn insert_tenancy(&self, tenancy: NewTenancy, now_ms: i64) -> StoreResult<Tenancy>;
    async fn terminate_tenancy(
        &self,
        landlord_id: &str,
        tenancy_id: &str,
        now_ms: i64,
    ) -> StoreResult<Tenancy>;
    /// Defensive bulk close: terminates every active tenancy for the unit
    /// (normally at most one exists). Returns the number closed.
    async fn terminate_active_for_unit(&self, key: &UnitKey, now_ms: i64) -> StoreResult<u64>;
    async fn active_tenancy_for_unit(&self, key: &UnitKey) -> StoreResult<Option<Tenancy>>;
    /// Newest first.
    async fn tenancies_for_landlord(&self, landlord_id: &str) -> StoreResult<Vec<Tenancy>>;
    /// Active and former, newest first.
    async fn tenancies_for_tenant(&self, tenant_id: &str) -> StoreResult<Vec<Tenancy>>;
    /// Full lineage for one unit, newest first.
    async fn tenancy_history_for_unit(&self, key: &UnitKey) -> StoreResult<Vec<Tenancy>>;
    async fn tenancy_snapshot(&self) -> StoreResult<Snapshot<Tenancy>>;
    async fn tenancy_changes(&self, since: u64) -> StoreResult<ChangeSet<TenancyChange>>;

    async fn list_notifications(&self, landlord_id: &str) -> StoreResult<Vec<Notification>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}

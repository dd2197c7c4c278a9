//! Tenancy model definitions and change-log payloads.
//!
//! # Purpose
//! The tenancy is the authoritative lease record linking a tenant to a unit
//! for a bounded time window. Closed tenancies are retained permanently as
//! audit history.
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Placeholder billing schedule: the next invoice is due a fixed 365 days
/// after the tenancy opens. Not a calendar-aware billing engine.
pub const NEXT_INVOICE_OFFSET_MS: i64 = 365 * 24 * 60 * 60 * 1000;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    Yearly,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TenancyStatus {
    Active,
    Former,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Tenancy {
    pub tenancy_id: String,
    pub landlord_id: String,
    pub property_id: String,
    pub unit_id: String,
    /// `None` for ghost tenants entered manually without a system account.
    pub tenant_id: Option<String>,
    pub tenant_name: String,
    pub tenant_email: String,
    /// Rent per billing cycle, in minor currency units.
    pub rent_amount: i64,
    pub billing_cycle: BillingCycle,
    pub currency: String,
    pub status: TenancyStatus,
    pub started_at_ms: i64,
    /// Move-out date. `None` while the tenancy is active.
    pub ended_at_ms: Option<i64>,
    /// When the record was closed. `None` while the tenancy is active.
    pub closed_at_ms: Option<i64>,
    pub next_invoice_at_ms: i64,
}

/// Fields required to open a tenancy. The store assigns the id and stamps
/// `started_at_ms`/`next_invoice_at_ms`.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct NewTenancy {
    pub landlord_id: String,
    pub property_id: String,
    pub unit_id: String,
    pub tenant_id: Option<String>,
    pub tenant_name: String,
    pub tenant_email: String,
    pub rent_amount: i64,
    pub billing_cycle: BillingCycle,
    pub currency: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct TenancyChange {
    pub seq: u64,
    pub op: TenancyChangeOp,
    pub tenancy_id: String,
    pub tenancy: Option<Tenancy>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub enum TenancyChangeOp {
    Opened,
    Terminated,
}

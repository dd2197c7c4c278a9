//! Control-plane data model module.
//!
//! # Purpose
//! Re-exports the property/unit/invite/tenancy/notification models and change
//! payloads used by the API, workflow, and store layers.
mod invite;
mod notification;
mod property;
mod tenancy;
mod unit;

pub use invite::{
    evaluate_token, generate_code, new_record_id, normalize_code, token_slug, CodeStatus,
    InviteCode, InviteToken, RedemptionReason, TenantIdentity, TokenStatus, CODE_ALPHABET,
    CODE_LEN, TOKEN_TTL_MS,
};
pub use notification::{Notification, NotificationKind};
pub use property::{Property, PropertyKey};
pub use tenancy::{
    BillingCycle, NewTenancy, Tenancy, TenancyChange, TenancyChangeOp, TenancyStatus,
    NEXT_INVOICE_OFFSET_MS,
};
pub use unit::{JoinRequest, Occupancy, Occupant, Unit, UnitChange, UnitChangeOp, UnitKey};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as unix milliseconds.
///
/// Handlers compute `now` once per request and thread it through the store so
/// expiry checks stay deterministic in tests.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

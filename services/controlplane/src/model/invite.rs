//! Invite code and invite token models plus pure validity logic.
//!
//! # Purpose
//! Invite codes are short, property-scoped, human-shareable credentials for
//! coarse "join this building" flows. Invite tokens are single-use,
//! time-boxed, optionally unit-scoped credentials for precise "join this
//! unit" flows.
//!
//! # Notes
//! Validity evaluation is a pure function over the stored record, the
//! caller-supplied wall clock, and the live unit occupancy. The persistence
//! side effect of lazy expiry (flipping a stale `Pending` record to
//! `Expired`) lives in the store, not here, so the predicate stays
//! deterministic under test.
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Restricted 32-symbol alphabet for invite codes.
///
/// Excludes visually ambiguous characters (0/O, 1/I) so codes survive being
/// read aloud or copied by hand.
pub const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Invite codes are exactly this many characters.
pub const CODE_LEN: usize = 6;

/// Invite tokens expire this long after creation.
pub const TOKEN_TTL_MS: i64 = 24 * 60 * 60 * 1000;

const TOKEN_SUFFIX_LEN: usize = 6;
const SLUG_PREFIX_MAX: usize = 24;

/// Generate a random invite code from the restricted alphabet.
pub fn generate_code(rng: &mut impl Rng) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Normalize a user-entered invite code: uppercase, exact length.
///
/// Returns `None` when the input cannot be a valid code, so callers can
/// reject it before any store lookup.
pub fn normalize_code(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.chars().count() != CODE_LEN {
        return None;
    }
    Some(trimmed.to_ascii_uppercase())
}

/// Build an invite token slug: a sanitized property-name prefix plus a
/// random 6-character hex suffix.
///
/// Not a raw UUID on purpose: the slug appears in shared links and should be
/// recognizable ("maple-court-3f9a1c") rather than opaque.
pub fn token_slug(property_name: &str, rng: &mut impl Rng) -> String {
    let mut prefix = String::new();
    for ch in property_name.chars() {
        if prefix.len() >= SLUG_PREFIX_MAX {
            break;
        }
        if ch.is_ascii_alphanumeric() {
            prefix.push(ch.to_ascii_lowercase());
        } else if (ch == ' ' || ch == '-' || ch == '_') && !prefix.ends_with('-') {
            prefix.push('-');
        }
    }
    let prefix = prefix.trim_matches('-');
    let prefix = if prefix.is_empty() { "invite" } else { prefix };
    let suffix: String = (0..TOKEN_SUFFIX_LEN)
        .map(|_| {
            let nibble = rng.gen_range(0..16u8);
            char::from_digit(nibble as u32, 16).unwrap_or('0')
        })
        .collect();
    format!("{prefix}-{suffix}")
}

/// Generate a random record id with the given prefix (e.g. `tn-1f3a9c0b`).
pub fn new_record_id(prefix: &str, rng: &mut impl Rng) -> String {
    let suffix: String = (0..8)
        .map(|_| {
            let nibble = rng.gen_range(0..16u8);
            char::from_digit(nibble as u32, 16).unwrap_or('0')
        })
        .collect();
    format!("{prefix}-{suffix}")
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CodeStatus {
    Active,
    Revoked,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct InviteCode {
    pub code: String,
    pub landlord_id: String,
    pub property_id: String,
    pub property_name: String,
    pub status: CodeStatus,
    pub created_at_ms: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    Pending,
    Accepted,
    Expired,
}

/// Identity of the tenant accepting an invite token.
///
/// Token acceptance requires a real account; ghost tenants only enter the
/// system through manual landlord assignment.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct TenantIdentity {
    pub tenant_id: String,
    pub display_name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct InviteToken {
    pub token: String,
    pub landlord_id: String,
    pub property_id: String,
    /// Target unit. `None` means the tenant selects among vacant units at
    /// redemption time.
    pub unit_id: Option<String>,
    pub unit_name: Option<String>,
    pub property_name: String,
    pub created_at_ms: i64,
    pub expires_at_ms: i64,
    pub status: TokenStatus,
    pub accepted_by: Option<TenantIdentity>,
}

impl InviteToken {
    /// Expiry is absolute: a stored `Pending` status does not extend a token
    /// past its deadline.
    pub fn past_deadline(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at_ms
    }
}

/// Why a token cannot be redeemed. Terminal for that token.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionReason {
    #[error("invite token not found")]
    NotFound,
    #[error("invite token already used")]
    AlreadyUsed,
    #[error("invite token expired")]
    Expired,
    #[error("unit already occupied")]
    UnitOccupied,
}

impl RedemptionReason {
    /// Stable machine-readable code returned to API clients.
    pub fn as_code(&self) -> &'static str {
        match self {
            RedemptionReason::NotFound => "not_found",
            RedemptionReason::AlreadyUsed => "already_used",
            RedemptionReason::Expired => "expired",
            RedemptionReason::UnitOccupied => "unit_occupied",
        }
    }
}

/// Evaluate whether a token is redeemable right now.
///
/// Checks in order: consumed, marked expired, past deadline, target unit
/// already occupied. The occupancy check guards the race where two tenants
/// target one unit: the token may still be `Pending`, but redemption must
/// never evict a sitting occupant.
pub fn evaluate_token(
    token: &InviteToken,
    now_ms: i64,
    unit_occupied: bool,
) -> Result<(), RedemptionReason> {
    match token.status {
        TokenStatus::Accepted => return Err(RedemptionReason::AlreadyUsed),
        TokenStatus::Expired => return Err(RedemptionReason::Expired),
        TokenStatus::Pending => {}
    }
    if token.past_deadline(now_ms) {
        return Err(RedemptionReason::Expired);
    }
    if unit_occupied {
        return Err(RedemptionReason::UnitOccupied);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    fn pending_token(expires_at_ms: i64) -> InviteToken {
        InviteToken {
            token: "maple-court-3f9a1c".to_string(),
            landlord_id: "l1".to_string(),
            property_id: "p1".to_string(),
            unit_id: Some("u1".to_string()),
            unit_name: Some("Unit 1".to_string()),
            property_name: "Maple Court".to_string(),
            created_at_ms: 0,
            expires_at_ms,
            status: TokenStatus::Pending,
            accepted_by: None,
        }
    }

    #[test]
    fn generated_codes_use_restricted_alphabet() {
        // Statistical sweep over the 32^6 space: every sample must be exactly
        // six characters from the restricted alphabet.
        let mut rng = thread_rng();
        for _ in 0..10_000 {
            let code = generate_code(&mut rng);
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn normalize_code_uppercases_and_checks_length() {
        assert_eq!(normalize_code(" ab2cd9 "), Some("AB2CD9".to_string()));
        assert_eq!(normalize_code("abc"), None);
        assert_eq!(normalize_code("abcdefg"), None);
    }

    #[test]
    fn token_slug_sanitizes_property_name() {
        let mut rng = thread_rng();
        let slug = token_slug("Maple Court #2!", &mut rng);
        let (prefix, suffix) = slug.rsplit_once('-').expect("suffix");
        assert_eq!(prefix, "maple-court-2");
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn token_slug_falls_back_for_unusable_names() {
        let mut rng = thread_rng();
        let slug = token_slug("!!!", &mut rng);
        assert!(slug.starts_with("invite-"));
    }

    #[test]
    fn evaluate_rejects_consumed_token() {
        let mut token = pending_token(1_000);
        token.status = TokenStatus::Accepted;
        assert_eq!(
            evaluate_token(&token, 10, false),
            Err(RedemptionReason::AlreadyUsed)
        );
    }

    #[test]
    fn evaluate_applies_absolute_expiry() {
        // Stored status still reads Pending, but the deadline has passed.
        let token = pending_token(1_000);
        assert_eq!(
            evaluate_token(&token, 1_001, false),
            Err(RedemptionReason::Expired)
        );
        assert_eq!(evaluate_token(&token, 1_000, false), Ok(()));
    }

    #[test]
    fn evaluate_rejects_occupied_unit() {
        let token = pending_token(1_000);
        assert_eq!(
            evaluate_token(&token, 10, true),
            Err(RedemptionReason::UnitOccupied)
        );
    }
}

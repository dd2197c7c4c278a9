//! Unit model definitions and change-log payloads.
//!
//! # Purpose
//! Defines rentable-unit records, the occupancy state machine, and the change
//! events consumed by dashboard sync clients.
use crate::model::tenancy::BillingCycle;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Occupancy state of a unit.
///
/// Transitions:
/// - `Vacant -> PendingApproval` when a tenant requests to join.
/// - `PendingApproval -> Occupied` when the landlord approves.
/// - `PendingApproval -> Vacant` when the landlord declines.
/// - `Occupied -> Vacant` when the landlord records a move-out.
/// - `Vacant -> Occupied` directly when a unit-scoped invite token is
///   accepted (the invitation itself constitutes approval).
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Occupancy {
    Vacant,
    PendingApproval,
    Occupied,
}

/// Current occupant of a unit.
///
/// `tenant_id` is `None` for ghost tenants: occupants entered manually by the
/// landlord with no backing account.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Occupant {
    pub tenant_id: Option<String>,
    pub display_name: String,
    pub email: String,
}

/// A tenant's pending request to join a unit, awaiting landlord review.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    pub tenant_id: String,
    pub display_name: String,
    pub email: String,
    pub requested_at_ms: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Unit {
    pub landlord_id: String,
    pub property_id: String,
    pub unit_id: String,
    pub name: String,
    pub occupancy: Occupancy,
    pub occupant: Option<Occupant>,
    pub join_request: Option<JoinRequest>,
    /// Rent per billing cycle, in minor currency units.
    pub rent_amount: i64,
    pub billing_cycle: BillingCycle,
    pub currency: String,
}

impl Unit {
    /// Whether the occupancy status agrees with the populated payloads.
    ///
    /// At most one of {occupant, join_request} may be set at a time;
    /// `PendingApproval` requires a join request and `Occupied` requires an
    /// occupant. Enforced on create and on every stored transition.
    pub fn occupancy_consistent(&self) -> bool {
        match self.occupancy {
            Occupancy::Vacant => self.occupant.is_none() && self.join_request.is_none(),
            Occupancy::PendingApproval => self.occupant.is_none() && self.join_request.is_some(),
            Occupancy::Occupied => self.occupant.is_some() && self.join_request.is_none(),
        }
    }

    pub fn key(&self) -> UnitKey {
        UnitKey {
            landlord_id: self.landlord_id.clone(),
            property_id: self.property_id.clone(),
            unit_id: self.unit_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq, Hash)]
pub struct UnitKey {
    pub landlord_id: String,
    pub property_id: String,
    pub unit_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UnitChange {
    pub seq: u64,
    pub op: UnitChangeOp,
    pub key: UnitKey,
    pub unit: Option<Unit>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub enum UnitChangeOp {
    Created,
    Updated,
    Deleted,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vacant_unit() -> Unit {
        Unit {
            landlord_id: "l1".to_string(),
            property_id: "p1".to_string(),
            unit_id: "u1".to_string(),
            name: "Unit 1".to_string(),
            occupancy: Occupancy::Vacant,
            occupant: None,
            join_request: None,
            rent_amount: 95_000,
            billing_cycle: BillingCycle::Monthly,
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn vacant_unit_is_consistent() {
        assert!(vacant_unit().occupancy_consistent());
    }

    #[test]
    fn pending_requires_join_request() {
        let mut unit = vacant_unit();
        unit.occupancy = Occupancy::PendingApproval;
        assert!(!unit.occupancy_consistent());
        unit.join_request = Some(JoinRequest {
            tenant_id: "t1".to_string(),
            display_name: "Tenant One".to_string(),
            email: "t1@example.com".to_string(),
            requested_at_ms: 1,
        });
        assert!(unit.occupancy_consistent());
    }

    #[test]
    fn occupied_allows_ghost_tenant() {
        let mut unit = vacant_unit();
        unit.occupancy = Occupancy::Occupied;
        unit.occupant = Some(Occupant {
            tenant_id: None,
            display_name: "Walk-in".to_string(),
            email: "walkin@example.com".to_string(),
        });
        assert!(unit.occupancy_consistent());
    }

    #[test]
    fn occupant_and_join_request_are_mutually_exclusive() {
        let mut unit = vacant_unit();
        unit.occupancy = Occupancy::Occupied;
        unit.occupant = Some(Occupant {
            tenant_id: Some("t1".to_string()),
            display_name: "Tenant One".to_string(),
            email: "t1@example.com".to_string(),
        });
        unit.join_request = Some(JoinRequest {
            tenant_id: "t2".to_string(),
            display_name: "Tenant Two".to_string(),
            email: "t2@example.com".to_string(),
            requested_at_ms: 1,
        });
        assert!(!unit.occupancy_consistent());
    }
}

//! In-memory implementation of the portfolio store.
//!
//! # Purpose
//! This store implements the `PortfolioStore` trait entirely in memory using
//! `HashMap`s guarded by `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - deployments where durability is not required
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: write locks serialize mutations; the
//!   one cross-entity transition (`accept_invite_token`) takes every
//!   affected lock inside a single call, which is what makes token
//!   redemption atomic.
//! - **No multi-node coordination**.
//!
//! # Change streams
//! Units and tenancies expose a full **snapshot** plus an incremental
//! **change stream** since a sequence number, with a bounded retention
//! window (`StoreConfig::change_window`). Consumers that fall behind past
//! the window must re-bootstrap via snapshot. This is the server-side shape
//! of the dashboards' live listeners.
use super::{ChangeSet, PortfolioStore, Snapshot, StoreConfig, StoreError, StoreResult};
use crate::model::{
    evaluate_token, new_record_id, InviteCode, InviteToken, JoinRequest, NewTenancy, Notification,
    NotificationKind, Occupancy, Occupant, Property, PropertyKey, RedemptionReason, Tenancy,
    TenancyChange, TenancyChangeOp, TenancyStatus, TenantIdentity, TokenStatus, Unit, UnitChange,
    UnitChangeOp, UnitKey, CodeStatus, NEXT_INVOICE_OFFSET_MS,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Bounded, in-memory append-only log of changes for a single entity type.
///
/// `record()` assigns the next sequence number, appends the change, and
/// evicts older items when the configured capacity is exceeded. A consumer
/// that polls too slowly may miss evicted changes and must re-bootstrap via
/// the corresponding `*_snapshot()` call.
#[derive(Debug)]
struct ChangeLog<T> {
    next_seq: u64,
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> ChangeLog<T> {
    fn new(capacity: usize) -> Self {
        Self {
            next_seq: 0,
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    fn record(&mut self, item: impl FnOnce(u64) -> T) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.items.push_back(item(seq));
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
        seq
    }
}

/// In-memory portfolio store.
///
/// Lock order for multi-map operations: tokens, then units, then tenancies,
/// then notifications. `accept_invite_token` and the cascading deletes rely
/// on this order to stay deadlock-free.
pub struct InMemoryStore {
    config: StoreConfig,
    /// Authoritative property records keyed by `(landlord_id, property_id)`.
    properties: Arc<RwLock<HashMap<PropertyKey, Property>>>,
    /// Authoritative unit records keyed by `(landlord_id, property_id, unit_id)`.
    units: Arc<RwLock<HashMap<UnitKey, Unit>>>,
    /// Invite codes keyed by the code itself.
    invite_codes: Arc<RwLock<HashMap<String, InviteCode>>>,
    /// Invite tokens keyed by the token slug. Append-only besides status.
    invite_tokens: Arc<RwLock<HashMap<String, InviteToken>>>,
    /// Tenancy records keyed by tenancy id. Closed records are kept forever.
    tenancies: Arc<RwLock<HashMap<String, Tenancy>>>,
    /// Landlord notifications keyed by notification id.
    notifications: Arc<RwLock<HashMap<String, Notification>>>,
    /// Bounded change log for unit changes.
    unit_changes: Arc<RwLock<ChangeLog<UnitChange>>>,
    /// Bounded change log for tenancy changes.
    tenancy_changes: Arc<RwLock<ChangeLog<TenancyChange>>>,
}

impl InMemoryStore {
    pub fn new(config: StoreConfig) -> Self {
        let capacity = config.change_window();
        Self {
            config,
            properties: Arc::new(RwLock::new(HashMap::new())),
            units: Arc::new(RwLock::new(HashMap::new())),
            invite_codes: Arc::new(RwLock::new(HashMap::new())),
            invite_tokens: Arc::new(RwLock::new(HashMap::new())),
            tenancies: Arc::new(RwLock::new(HashMap::new())),
            notifications: Arc::new(RwLock::new(HashMap::new())),
            unit_changes: Arc::new(RwLock::new(ChangeLog::new(capacity))),
            tenancy_changes: Arc::new(RwLock::new(ChangeLog::new(capacity))),
        }
    }

    fn limit(&self) -> usize {
        self.config.changes_limit as usize
    }
}

fn close_tenancy(tenancy: &mut Tenancy, now_ms: i64) {
    tenancy.status = TenancyStatus::Former;
    tenancy.ended_at_ms = Some(now_ms);
    tenancy.closed_at_ms = Some(now_ms);
}

fn tenancy_from_new(new: NewTenancy, now_ms: i64) -> Tenancy {
    Tenancy {
        tenancy_id: new_record_id("tn", &mut rand::thread_rng()),
        landlord_id: new.landlord_id,
        property_id: new.property_id,
        unit_id: new.unit_id,
        tenant_id: new.tenant_id,
        tenant_name: new.tenant_name,
        tenant_email: new.tenant_email,
        rent_amount: new.rent_amount,
        billing_cycle: new.billing_cycle,
        currency: new.currency,
        status: TenancyStatus::Active,
        started_at_ms: now_ms,
        ended_at_ms: None,
        closed_at_ms: None,
        next_invoice_at_ms: now_ms + NEXT_INVOICE_OFFSET_MS,
    }
}

fn newest_first(mut items: Vec<Tenancy>) -> Vec<Tenancy> {
    items.sort_by(|a, b| b.started_at_ms.cmp(&a.started_at_ms));
    items
}

fn active_gauge(tenancies: &HashMap<String, Tenancy>) {
    let active = tenancies
        .values()
        .filter(|t| t.status == TenancyStatus::Active)
        .count();
    metrics::gauge!("haven_tenancies_active").set(active as f64);
}

/// Close every active tenancy for a unit inside an already-held write guard.
///
/// Shared by the public `terminate_active_for_unit` and the atomic token
/// acceptance, which must do this under its own locks.
fn terminate_actives_locked(
    tenancies: &mut HashMap<String, Tenancy>,
    log: &mut ChangeLog<TenancyChange>,
    key: &UnitKey,
    now_ms: i64,
) -> u64 {
    let mut closed = 0;
    for tenancy in tenancies.values_mut() {
        if tenancy.landlord_id == key.landlord_id
            && tenancy.property_id == key.property_id
            && tenancy.unit_id == key.unit_id
            && tenancy.status == TenancyStatus::Active
        {
            close_tenancy(tenancy, now_ms);
            let snapshot = tenancy.clone();
            log.record(|seq| TenancyChange {
                seq,
                op: TenancyChangeOp::Terminated,
                tenancy_id: snapshot.tenancy_id.clone(),
                tenancy: Some(snapshot.clone()),
            });
            metrics::counter!("haven_tenancy_changes_total", "op" => "terminated").increment(1);
            closed += 1;
        }
    }
    closed
}

fn clear_unit_notifications(notifications: &mut HashMap<String, Notification>, key: &UnitKey) {
    notifications.retain(|_, n| {
        !(n.landlord_id == key.landlord_id
            && n.property_id == key.property_id
            && n.unit_id == key.unit_id)
    });
}

#[async_trait]
impl PortfolioStore for InMemoryStore {
    async fn list_properties(&self, landlord_id: &str) -> StoreResult<Vec<Property>> {
        let items = self
            .properties
            .read()
            .await
            .values()
            .filter(|p| p.landlord_id == landlord_id)
            .cloned()
            .collect();
        Ok(items)
    }

    async fn create_property(&self, property: Property) -> StoreResult<Property> {
        let key = PropertyKey::of(&property);
        let mut properties = self.properties.write().await;
        if properties.contains_key(&key) {
            return Err(StoreError::Conflict("property exists".into()));
        }
        properties.insert(key, property.clone());
        Ok(property)
    }

    async fn get_property(&self, key: &PropertyKey) -> StoreResult<Property> {
        self.properties
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("property".into()))
    }

    async fn delete_property(&self, key: &PropertyKey) -> StoreResult<()> {
        // Guard before any destructive write: an active tenancy anywhere in
        // the property blocks deletion.
        {
            let tenancies = self.tenancies.read().await;
            let blocked = tenancies.values().any(|t| {
                t.landlord_id == key.landlord_id
                    && t.property_id == key.property_id
                    && t.status == TenancyStatus::Active
            });
            if blocked {
                return Err(StoreError::Conflict(
                    "property has an active tenancy".into(),
                ));
            }
        }
        let mut properties = self.properties.write().await;
        if properties.remove(key).is_none() {
            return Err(StoreError::NotFound("property".into()));
        }
        drop(properties);

        // Expire pending tokens targeting the property so stale share links
        // cannot resurrect a deleted building.
        let mut tokens = self.invite_tokens.write().await;
        for token in tokens.values_mut() {
            if token.landlord_id == key.landlord_id
                && token.property_id == key.property_id
                && token.status == TokenStatus::Pending
            {
                token.status = TokenStatus::Expired;
            }
        }
        drop(tokens);

        // Cascading delete: remove the property's units and emit delete
        // changes so incremental consumers can evict their caches.
        let mut units = self.units.write().await;
        let unit_keys: Vec<_> = units
            .keys()
            .filter(|k| k.landlord_id == key.landlord_id && k.property_id == key.property_id)
            .cloned()
            .collect();
        for unit_key in &unit_keys {
            if units.remove(unit_key).is_some() {
                self.unit_changes.write().await.record(|seq| UnitChange {
                    seq,
                    op: UnitChangeOp::Deleted,
                    key: unit_key.clone(),
                    unit: None,
                });
                metrics::counter!("haven_unit_changes_total", "op" => "deleted").increment(1);
            }
        }
        metrics::gauge!("haven_units_total").set(units.len() as f64);
        drop(units);

        let mut notifications = self.notifications.write().await;
        notifications.retain(|_, n| {
            !(n.landlord_id == key.landlord_id && n.property_id == key.property_id)
        });

        let mut codes = self.invite_codes.write().await;
        for code in codes.values_mut() {
            if code.landlord_id == key.landlord_id
                && code.property_id == key.property_id
                && code.status == CodeStatus::Active
            {
                code.status = CodeStatus::Revoked;
            }
        }
        Ok(())
    }

    async fn list_units(&self, key: &PropertyKey) -> StoreResult<Vec<Unit>> {
        let items = self
            .units
            .read()
            .await
            .values()
            .filter(|u| u.landlord_id == key.landlord_id && u.property_id == key.property_id)
            .cloned()
            .collect();
        Ok(items)
    }

    async fn create_unit(&self, unit: Unit) -> StoreResult<Unit> {
        if !unit.occupancy_consistent() {
            return Err(StoreError::Invalid(
                "unit occupancy does not match its payloads".into(),
            ));
        }
        let parent = PropertyKey {
            landlord_id: unit.landlord_id.clone(),
            property_id: unit.property_id.clone(),
        };
        if !self.properties.read().await.contains_key(&parent) {
            return Err(StoreError::NotFound("property".into()));
        }
        let key = unit.key();
        let mut units = self.units.write().await;
        if units.contains_key(&key) {
            return Err(StoreError::Conflict("unit exists".into()));
        }
        units.insert(key.clone(), unit.clone());
        self.unit_changes.write().await.record(|seq| UnitChange {
            seq,
            op: UnitChangeOp::Created,
            key,
            unit: Some(unit.clone()),
        });
        metrics::counter!("haven_unit_changes_total", "op" => "created").increment(1);
        metrics::gauge!("haven_units_total").set(units.len() as f64);
        Ok(unit)
    }

    async fn create_units(&self, batch: Vec<Unit>) -> StoreResult<Vec<Unit>> {
        if batch.is_empty() {
            return Err(StoreError::Invalid("unit batch is empty".into()));
        }
        for unit in &batch {
            if !unit.occupancy_consistent() {
                return Err(StoreError::Invalid(
                    "unit occupancy does not match its payloads".into(),
                ));
            }
        }
        {
            let properties = self.properties.read().await;
            for unit in &batch {
                let parent = PropertyKey {
                    landlord_id: unit.landlord_id.clone(),
                    property_id: unit.property_id.clone(),
                };
                if !properties.contains_key(&parent) {
                    return Err(StoreError::NotFound("property".into()));
                }
            }
        }
        let mut units = self.units.write().await;
        // Validate every key before the first insert so a mid-batch
        // collision cannot leave a partial batch behind.
        let mut incoming = HashSet::new();
        for unit in &batch {
            let key = unit.key();
            if units.contains_key(&key) || !incoming.insert(key) {
                return Err(StoreError::Conflict("unit exists".into()));
            }
        }
        let mut log = self.unit_changes.write().await;
        for unit in &batch {
            units.insert(unit.key(), unit.clone());
            log.record(|seq| UnitChange {
                seq,
                op: UnitChangeOp::Created,
                key: unit.key(),
                unit: Some(unit.clone()),
            });
            metrics::counter!("haven_unit_changes_total", "op" => "created").increment(1);
        }
        metrics::gauge!("haven_units_total").set(units.len() as f64);
        Ok(batch)
    }

    async fn get_unit(&self, key: &UnitKey) -> StoreResult<Unit> {
        self.units
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("unit".into()))
    }

    async fn delete_unit(&self, key: &UnitKey) -> StoreResult<()> {
        if self.active_tenancy_for_unit(key).await?.is_some() {
            return Err(StoreError::Conflict("unit has an active tenancy".into()));
        }
        let mut units = self.units.write().await;
        if units.remove(key).is_none() {
            return Err(StoreError::NotFound("unit".into()));
        }
        self.unit_changes.write().await.record(|seq| UnitChange {
            seq,
            op: UnitChangeOp::Deleted,
            key: key.clone(),
            unit: None,
        });
        metrics::counter!("haven_unit_changes_total", "op" => "deleted").increment(1);
        metrics::gauge!("haven_units_total").set(units.len() as f64);
        drop(units);

        let mut tokens = self.invite_tokens.write().await;
        for token in tokens.values_mut() {
            if token.unit_id.as_deref() == Some(key.unit_id.as_str())
                && token.landlord_id == key.landlord_id
                && token.property_id == key.property_id
                && token.status == TokenStatus::Pending
            {
                token.status = TokenStatus::Expired;
            }
        }
        drop(tokens);

        let mut notifications = self.notifications.write().await;
        clear_unit_notifications(&mut notifications, key);
        Ok(())
    }

    async fn request_join(&self, key: &UnitKey, candidate: JoinRequest) -> StoreResult<Unit> {
        let mut units = self.units.write().await;
        let unit = units
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound("unit".into()))?;
        if unit.occupancy != Occupancy::Vacant {
            return Err(StoreError::Conflict("unit is not open for requests".into()));
        }
        unit.occupancy = Occupancy::PendingApproval;
        unit.join_request = Some(candidate.clone());
        let updated = unit.clone();
        drop(units);

        let notification_id = new_record_id("nt", &mut rand::thread_rng());
        self.notifications.write().await.insert(
            notification_id.clone(),
            Notification {
                notification_id,
                landlord_id: key.landlord_id.clone(),
                property_id: key.property_id.clone(),
                unit_id: key.unit_id.clone(),
                tenant_id: candidate.tenant_id.clone(),
                tenant_name: candidate.display_name.clone(),
                kind: NotificationKind::JoinRequested,
                created_at_ms: candidate.requested_at_ms,
            },
        );
        self.unit_changes.write().await.record(|seq| UnitChange {
            seq,
            op: UnitChangeOp::Updated,
            key: key.clone(),
            unit: Some(updated.clone()),
        });
        metrics::counter!("haven_unit_changes_total", "op" => "updated").increment(1);
        Ok(updated)
    }

    async fn approve_join(&self, key: &UnitKey) -> StoreResult<Unit> {
        let mut units = self.units.write().await;
        let unit = units
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound("unit".into()))?;
        if unit.occupancy != Occupancy::PendingApproval {
            return Err(StoreError::Conflict("unit has no pending request".into()));
        }
        let candidate = unit
            .join_request
            .take()
            .ok_or_else(|| StoreError::Invalid("pending unit missing its request".into()))?;
        unit.occupancy = Occupancy::Occupied;
        unit.occupant = Some(Occupant {
            tenant_id: Some(candidate.tenant_id),
            display_name: candidate.display_name,
            email: candidate.email,
        });
        let updated = unit.clone();
        drop(units);

        let mut notifications = self.notifications.write().await;
        clear_unit_notifications(&mut notifications, key);
        drop(notifications);

        self.unit_changes.write().await.record(|seq| UnitChange {
            seq,
            op: UnitChangeOp::Updated,
            key: key.clone(),
            unit: Some(updated.clone()),
        });
        metrics::counter!("haven_unit_changes_total", "op" => "updated").increment(1);
        Ok(updated)
    }

    async fn decline_join(&self, key: &UnitKey) -> StoreResult<Unit> {
        let mut units = self.units.write().await;
        let unit = units
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound("unit".into()))?;
        if unit.occupancy != Occupancy::PendingApproval {
            return Err(StoreError::Conflict("unit has no pending request".into()));
        }
        unit.occupancy = Occupancy::Vacant;
        unit.join_request = None;
        let updated = unit.clone();
        drop(units);

        let mut notifications = self.notifications.write().await;
        clear_unit_notifications(&mut notifications, key);
        drop(notifications);

        self.unit_changes.write().await.record(|seq| UnitChange {
            seq,
            op: UnitChangeOp::Updated,
            key: key.clone(),
            unit: Some(updated.clone()),
        });
        metrics::counter!("haven_unit_changes_total", "op" => "updated").increment(1);
        Ok(updated)
    }

    async fn record_move_out(&self, key: &UnitKey) -> StoreResult<Unit> {
        let mut units = self.units.write().await;
        let unit = units
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound("unit".into()))?;
        if unit.occupancy != Occupancy::Occupied {
            return Err(StoreError::Conflict("unit is not occupied".into()));
        }
        unit.occupancy = Occupancy::Vacant;
        unit.occupant = None;
        let updated = unit.clone();
        drop(units);

        self.unit_changes.write().await.record(|seq| UnitChange {
            seq,
            op: UnitChangeOp::Updated,
            key: key.clone(),
            unit: Some(updated.clone()),
        });
        metrics::counter!("haven_unit_changes_total", "op" => "updated").increment(1);
        Ok(updated)
    }

    async fn assign_occupant(&self, key: &UnitKey, occupant: Occupant) -> StoreResult<Unit> {
        let mut units = self.units.write().await;
        let unit = units
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound("unit".into()))?;
        if unit.occupancy != Occupancy::Vacant {
            return Err(StoreError::Conflict("unit is not vacant".into()));
        }
        unit.occupancy = Occupancy::Occupied;
        unit.occupant = Some(occupant);
        let updated = unit.clone();
        drop(units);

        self.unit_changes.write().await.record(|seq| UnitChange {
            seq,
            op: UnitChangeOp::Updated,
            key: key.clone(),
            unit: Some(updated.clone()),
        });
        metrics::counter!("haven_unit_changes_total", "op" => "updated").increment(1);
        Ok(updated)
    }

    async fn unit_snapshot(&self) -> StoreResult<Snapshot<Unit>> {
        // `next_seq` is the checkpoint a consumer should use as `since` on
        // its first changes poll.
        let items = self.units.read().await.values().cloned().collect();
        let next_seq = self.unit_changes.read().await.next_seq;
        Ok(Snapshot { items, next_seq })
    }

    async fn unit_changes(&self, since: u64) -> StoreResult<ChangeSet<UnitChange>> {
        let guard = self.unit_changes.read().await;
        let items = guard
            .items
            .iter()
            .filter(|item| item.seq >= since)
            .take(self.limit())
            .cloned()
            .collect();
        Ok(ChangeSet {
            items,
            next_seq: guard.next_seq,
        })
    }

    async fn insert_invite_code(&self, code: InviteCode) -> StoreResult<InviteCode> {
        let parent = PropertyKey {
            landlord_id: code.landlord_id.clone(),
            property_id: code.property_id.clone(),
        };
        let mut properties = self.properties.write().await;
        let property = properties
            .get_mut(&parent)
            .ok_or_else(|| StoreError::NotFound("property".into()))?;
        let mut codes = self.invite_codes.write().await;
        if codes.contains_key(&code.code) {
            return Err(StoreError::Conflict("invite code exists".into()));
        }
        codes.insert(code.code.clone(), code.clone());
        // Denormalize for the fast lookup path on portal views.
        property.invite_code = Some(code.code.clone());
        Ok(code)
    }

    async fn get_invite_code(&self, code: &str) -> StoreResult<Option<InviteCode>> {
        Ok(self.invite_codes.read().await.get(code).cloned())
    }

    async fn active_code_for_property(
        &self,
        key: &PropertyKey,
    ) -> StoreResult<Option<InviteCode>> {
        // Primary path: scan code records for this owner with active status.
        let codes = self.invite_codes.read().await;
        if let Some(found) = codes.values().find(|c| {
            c.landlord_id == key.landlord_id
                && c.property_id == key.property_id
                && c.status == CodeStatus::Active
        }) {
            return Ok(Some(found.clone()));
        }
        // Fallback: follow the denormalized field on the property record and
        // independently verify the referenced code is still active.
        let properties = self.properties.read().await;
        let denormalized = properties.get(key).and_then(|p| p.invite_code.clone());
        if let Some(code) = denormalized {
            if let Some(record) = codes.get(&code) {
                if record.status == CodeStatus::Active {
                    return Ok(Some(record.clone()));
                }
            }
        }
        Ok(None)
    }

    async fn revoke_invite_code(&self, code: &str) -> StoreResult<InviteCode> {
        let mut codes = self.invite_codes.write().await;
        let record = codes
            .get_mut(code)
            .ok_or_else(|| StoreError::NotFound("invite code".into()))?;
        if record.status == CodeStatus::Revoked {
            // Idempotent: revoking twice is the same as revoking once.
            return Ok(record.clone());
        }
        record.status = CodeStatus::Revoked;
        let revoked = record.clone();
        drop(codes);

        let parent = PropertyKey {
            landlord_id: revoked.landlord_id.clone(),
            property_id: revoked.property_id.clone(),
        };
        let mut properties = self.properties.write().await;
        if let Some(property) = properties.get_mut(&parent) {
            if property.invite_code.as_deref() == Some(code) {
                property.invite_code = None;
            }
        }
        Ok(revoked)
    }

    async fn insert_invite_token(&self, token: InviteToken) -> StoreResult<InviteToken> {
        let mut tokens = self.invite_tokens.write().await;
        if tokens.contains_key(&token.token) {
            return Err(StoreError::Conflict("invite token exists".into()));
        }
        // At most one redeemable token per unit: expire the predecessors.
        if let Some(unit_id) = token.unit_id.as_deref() {
            for existing in tokens.values_mut() {
                if existing.landlord_id == token.landlord_id
                    && existing.property_id == token.property_id
                    && existing.unit_id.as_deref() == Some(unit_id)
                    && existing.status == TokenStatus::Pending
                {
                    existing.status = TokenStatus::Expired;
                }
            }
        }
        tokens.insert(token.token.clone(), token.clone());
        Ok(token)
    }

    async fn fetch_invite_token(&self, token: &str, now_ms: i64) -> StoreResult<InviteToken> {
        let mut tokens = self.invite_tokens.write().await;
        let record = tokens
            .get_mut(token)
            .ok_or(StoreError::Redemption(RedemptionReason::NotFound))?;

        let unit_occupied = match record.unit_id.as_deref() {
            Some(unit_id) => {
                let key = UnitKey {
                    landlord_id: record.landlord_id.clone(),
                    property_id: record.property_id.clone(),
                    unit_id: unit_id.to_string(),
                };
                let units = self.units.read().await;
                let unit = units
                    .get(&key)
                    .ok_or_else(|| StoreError::NotFound("unit".into()))?;
                unit.occupancy == Occupancy::Occupied
            }
            None => false,
        };

        match evaluate_token(record, now_ms, unit_occupied) {
            Ok(()) => Ok(record.clone()),
            Err(reason) => {
                // Lazy expiry: correct the stored status on first read past
                // the deadline.
                if reason == RedemptionReason::Expired && record.status == TokenStatus::Pending {
                    record.status = TokenStatus::Expired;
                }
                Err(StoreError::Redemption(reason))
            }
        }
    }

    async fn accept_invite_token(
        &self,
        token: &str,
        tenant: TenantIdentity,
        chosen_unit: Option<String>,
        now_ms: i64,
    ) -> StoreResult<(InviteToken, Unit, Tenancy)> {
        // Single atomic transition: all four maps stay locked until the
        // token, unit, tenancy, and notifications agree. Double submission
        // is safe because the second caller observes `Accepted`.
        let mut tokens = self.invite_tokens.write().await;
        let mut units = self.units.write().await;
        let mut tenancies = self.tenancies.write().await;
        let mut notifications = self.notifications.write().await;

        let record = tokens
            .get_mut(token)
            .ok_or(StoreError::Redemption(RedemptionReason::NotFound))?;

        let unit_id = match record.unit_id.clone().or(chosen_unit) {
            Some(unit_id) => unit_id,
            None => {
                return Err(StoreError::Invalid(
                    "token is property-scoped; a unit must be selected".into(),
                ))
            }
        };
        let unit_key = UnitKey {
            landlord_id: record.landlord_id.clone(),
            property_id: record.property_id.clone(),
            unit_id,
        };
        let unit = units
            .get_mut(&unit_key)
            .ok_or_else(|| StoreError::NotFound("unit".into()))?;

        let occupied = unit.occupancy == Occupancy::Occupied;
        if let Err(reason) = evaluate_token(record, now_ms, occupied) {
            if reason == RedemptionReason::Expired && record.status == TokenStatus::Pending {
                record.status = TokenStatus::Expired;
            }
            metrics::counter!("haven_invite_redemptions_total", "outcome" => reason.as_code())
                .increment(1);
            return Err(StoreError::Redemption(reason));
        }

        record.status = TokenStatus::Accepted;
        record.accepted_by = Some(tenant.clone());
        let accepted = record.clone();

        // The invitation itself constitutes approval: any unrelated pending
        // request on the unit is dropped along with its notifications.
        unit.occupancy = Occupancy::Occupied;
        unit.join_request = None;
        unit.occupant = Some(Occupant {
            tenant_id: Some(tenant.tenant_id.clone()),
            display_name: tenant.display_name.clone(),
            email: tenant.email.clone(),
        });
        let occupied_unit = unit.clone();

        let mut tenancy_log = self.tenancy_changes.write().await;
        // Defensive: normally no active tenancy exists on a vacant unit, but
        // the single-active invariant is enforced here regardless.
        terminate_actives_locked(&mut tenancies, &mut tenancy_log, &unit_key, now_ms);

        let tenancy = tenancy_from_new(
            NewTenancy {
                landlord_id: occupied_unit.landlord_id.clone(),
                property_id: occupied_unit.property_id.clone(),
                unit_id: occupied_unit.unit_id.clone(),
                tenant_id: Some(tenant.tenant_id),
                tenant_name: tenant.display_name,
                tenant_email: tenant.email,
                rent_amount: occupied_unit.rent_amount,
                billing_cycle: occupied_unit.billing_cycle,
                currency: occupied_unit.currency.clone(),
            },
            now_ms,
        );
        tenancies.insert(tenancy.tenancy_id.clone(), tenancy.clone());
        tenancy_log.record(|seq| TenancyChange {
            seq,
            op: TenancyChangeOp::Opened,
            tenancy_id: tenancy.tenancy_id.clone(),
            tenancy: Some(tenancy.clone()),
        });
        metrics::counter!("haven_tenancy_changes_total", "op" => "opened").increment(1);
        active_gauge(&tenancies);
        drop(tenancy_log);

        clear_unit_notifications(&mut notifications, &unit_key);

        self.unit_changes.write().await.record(|seq| UnitChange {
            seq,
            op: UnitChangeOp::Updated,
            key: unit_key,
            unit: Some(occupied_unit.clone()),
        });
        metrics::counter!("haven_unit_changes_total", "op" => "updated").increment(1);
        metrics::counter!("haven_invite_redemptions_total", "outcome" => "accepted").increment(1);
        Ok((accepted, occupied_unit, tenancy))
    }

    async fn revoke_invite_token(&self, landlord_id: &str, token: &str) -> StoreResult<()> {
        let mut tokens = self.invite_tokens.write().await;
        let record = tokens
            .get_mut(token)
            .filter(|record| record.landlord_id == landlord_id)
            .ok_or_else(|| StoreError::NotFound("invite token".into()))?;
        if record.status == TokenStatus::Pending {
            record.status = TokenStatus::Expired;
        }
        // Accepted or already expired tokens are left as-is (idempotent).
        Ok(())
    }

    async fn revoke_pending_tokens_for_unit(&self, key: &UnitKey) -> StoreResult<u64> {
        let mut tokens = self.invite_tokens.write().await;
        let mut revoked = 0;
        for token in tokens.values_mut() {
            if token.landlord_id == key.landlord_id
                && token.property_id == key.property_id
                && token.unit_id.as_deref() == Some(key.unit_id.as_str())
                && token.status == TokenStatus::Pending
            {
                token.status = TokenStatus::Expired;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn insert_tenancy(&self, new: NewTenancy, now_ms: i64) -> StoreResult<Tenancy> {
        let unit_key = UnitKey {
            landlord_id: new.landlord_id.clone(),
            property_id: new.property_id.clone(),
            unit_id: new.unit_id.clone(),
        };
        if !self.units.read().await.contains_key(&unit_key) {
            return Err(StoreError::NotFound("unit".into()));
        }
        let tenancy = tenancy_from_new(new, now_ms);
        let mut tenancies = self.tenancies.write().await;
        tenancies.insert(tenancy.tenancy_id.clone(), tenancy.clone());
        self.tenancy_changes
            .write()
            .await
            .record(|seq| TenancyChange {
                seq,
                op: TenancyChangeOp::Opened,
                tenancy_id: tenancy.tenancy_id.clone(),
                tenancy: Some(tenancy.clone()),
            });
        metrics::counter!("haven_tenancy_changes_total", "op" => "opened").increment(1);
        active_gauge(&tenancies);
        Ok(tenancy)
    }

    async fn terminate_tenancy(
        &self,
        landlord_id: &str,
        tenancy_id: &str,
        now_ms: i64,
    ) -> StoreResult<Tenancy> {
        let mut tenancies = self.tenancies.write().await;
        let tenancy = tenancies
            .get_mut(tenancy_id)
            .filter(|t| t.landlord_id == landlord_id)
            .ok_or_else(|| StoreError::NotFound("tenancy".into()))?;
        if tenancy.status == TenancyStatus::Former {
            // Idempotent: terminating a closed lease is a no-op.
            return Ok(tenancy.clone());
        }
        close_tenancy(tenancy, now_ms);
        let closed = tenancy.clone();
        self.tenancy_changes
            .write()
            .await
            .record(|seq| TenancyChange {
                seq,
                op: TenancyChangeOp::Terminated,
                tenancy_id: closed.tenancy_id.clone(),
                tenancy: Some(closed.clone()),
            });
        metrics::counter!("haven_tenancy_changes_total", "op" => "terminated").increment(1);
        active_gauge(&tenancies);
        Ok(closed)
    }

    async fn terminate_active_for_unit(&self, key: &UnitKey, now_ms: i64) -> StoreResult<u64> {
        let mut tenancies = self.tenancies.write().await;
        let mut log = self.tenancy_changes.write().await;
        let closed = terminate_actives_locked(&mut tenancies, &mut log, key, now_ms);
        active_gauge(&tenancies);
        Ok(closed)
    }

    async fn active_tenancy_for_unit(&self, key: &UnitKey) -> StoreResult<Option<Tenancy>> {
        Ok(self
            .tenancies
            .read()
            .await
            .values()
            .find(|t| {
                t.landlord_id == key.landlord_id
                    && t.property_id == key.property_id
                    && t.unit_id == key.unit_id
                    && t.status == TenancyStatus::Active
            })
            .cloned())
    }

    async fn tenancies_for_landlord(&self, landlord_id: &str) -> StoreResult<Vec<Tenancy>> {
        let items = self
            .tenancies
            .read()
            .await
            .values()
            .filter(|t| t.landlord_id == landlord_id)
            .cloned()
            .collect();
        Ok(newest_first(items))
    }

    async fn tenancies_for_tenant(&self, tenant_id: &str) -> StoreResult<Vec<Tenancy>> {
        let items = self
            .tenancies
            .read()
            .await
            .values()
            .filter(|t| t.tenant_id.as_deref() == Some(tenant_id))
            .cloned()
            .collect();
        Ok(newest_first(items))
    }

    async fn tenancy_history_for_unit(&self, key: &UnitKey) -> StoreResult<Vec<Tenancy>> {
        let items = self
            .tenancies
            .read()
            .await
            .values()
            .filter(|t| {
                t.landlord_id == key.landlord_id
                    && t.property_id == key.property_id
                    && t.unit_id == key.unit_id
            })
            .cloned()
            .collect();
        Ok(newest_first(items))
    }

    async fn tenancy_snapshot(&self) -> StoreResult<Snapshot<Tenancy>> {
        let items = self.tenancies.read().await.values().cloned().collect();
        let next_seq = self.tenancy_changes.read().await.next_seq;
        Ok(Snapshot { items, next_seq })
    }

    async fn tenancy_changes(&self, since: u64) -> StoreResult<ChangeSet<TenancyChange>> {
        let guard = self.tenancy_changes.read().await;
        let items = guard
            .items
            .iter()
            .filter(|item| item.seq >= since)
            .take(self.limit())
            .cloned()
            .collect();
        Ok(ChangeSet {
            items,
            next_seq: guard.next_seq,
        })
    }

    async fn list_notifications(&self, landlord_id: &str) -> StoreResult<Vec<Notification>> {
        let mut items: Vec<_> = self
            .notifications
            .read()
            .await
            .values()
            .filter(|n| n.landlord_id == landlord_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        Ok(items)
    }

    async fn health_check(&self) -> StoreResult<()> {
        // In-memory backend is always "healthy" if the process is running.
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

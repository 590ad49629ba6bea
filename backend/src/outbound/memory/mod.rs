//! In-process adapters for the storage ports.
//!
//! [`InMemoryStore`] implements every repository port over a single mutex so
//! that unique constraints and conditional updates behave as they do in
//! PostgreSQL. It backs the server when no database is configured and the
//! integration tests. [`ScriptedPaymentVerifier`] and [`RecordingNotifier`]
//! stand in for the gateway and the bot when running without them.

mod notifier;
mod verifier;

pub use notifier::RecordingNotifier;
pub use verifier::ScriptedPaymentVerifier;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    ItemRepository, ItemRepositoryError, PurchaseRepository, PurchaseRepositoryError,
    SellerProfileRepository, SellerProfileRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    ExternalId, Item, ItemId, PaymentReference, Purchase, PurchaseId, PurchaseStatus,
    SellerProfile, User, UserId,
};

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    items: HashMap<ItemId, Item>,
    purchases: Vec<Purchase>,
    profiles: HashMap<UserId, SellerProfile>,
}

/// Mutex-guarded store implementing the repository ports.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

const POISONED: &str = "in-memory store lock poisoned";

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Option<MutexGuard<'_, State>> {
        self.state.lock().ok()
    }

    /// Add or replace an item. Items are managed outside this service.
    pub fn put_item(&self, item: Item) {
        if let Some(mut state) = self.lock() {
            state.items.insert(item.id, item);
        }
    }

    /// Add a user directly, bypassing identity resolution.
    pub fn put_user(&self, user: User) {
        if let Some(mut state) = self.lock() {
            state.users.insert(user.id, user);
        }
    }

    /// Snapshot of every stored purchase.
    pub fn purchases(&self) -> Vec<Purchase> {
        self.lock()
            .map(|state| state.purchases.clone())
            .unwrap_or_default()
    }

    /// Number of stored users.
    pub fn user_count(&self) -> usize {
        self.lock().map_or(0, |state| state.users.len())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock().ok_or_else(|| UserRepositoryError::query(POISONED))?;
        Ok(state
            .users
            .values()
            .find(|user| &user.external_id == external_id)
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock().ok_or_else(|| UserRepositoryError::query(POISONED))?;
        Ok(state.users.get(id).cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut state = self.lock().ok_or_else(|| UserRepositoryError::query(POISONED))?;
        if state
            .users
            .values()
            .any(|existing| existing.external_id == user.external_id)
        {
            return Err(UserRepositoryError::duplicate_external_id(
                user.external_id.as_ref(),
            ));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn grant_selling(&self, id: &UserId) -> Result<bool, UserRepositoryError> {
        let mut state = self.lock().ok_or_else(|| UserRepositoryError::query(POISONED))?;
        let Some(user) = state.users.get_mut(id) else {
            return Ok(false);
        };
        let upgraded = user.role.with_selling();
        let changed = upgraded != user.role;
        user.role = upgraded;
        Ok(changed)
    }
}

#[async_trait]
impl ItemRepository for InMemoryStore {
    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, ItemRepositoryError> {
        let state = self.lock().ok_or_else(|| ItemRepositoryError::query(POISONED))?;
        Ok(state.items.get(id).cloned())
    }
}

fn transition(
    state: &mut State,
    id: &PurchaseId,
    to: PurchaseStatus,
    completed_at: Option<DateTime<Utc>>,
) -> bool {
    match state
        .purchases
        .iter_mut()
        .find(|purchase| &purchase.id == id && purchase.status == PurchaseStatus::Pending)
    {
        Some(purchase) => {
            purchase.status = to;
            purchase.completed_at = completed_at;
            true
        }
        None => false,
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryStore {
    async fn insert(&self, purchase: &Purchase) -> Result<(), PurchaseRepositoryError> {
        let mut state = self
            .lock()
            .ok_or_else(|| PurchaseRepositoryError::query(POISONED))?;
        if state
            .purchases
            .iter()
            .any(|existing| existing.reference == purchase.reference)
        {
            return Err(PurchaseRepositoryError::duplicate_reference(
                purchase.reference.as_ref(),
            ));
        }
        if state.purchases.iter().any(|existing| {
            existing.buyer_id == purchase.buyer_id
                && existing.item_id == purchase.item_id
                && existing.status.is_active()
        }) {
            return Err(PurchaseRepositoryError::active_purchase_exists(
                purchase.buyer_id.to_string(),
                purchase.item_id.to_string(),
            ));
        }
        state.purchases.push(purchase.clone());
        Ok(())
    }

    async fn find_by_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Purchase>, PurchaseRepositoryError> {
        let state = self
            .lock()
            .ok_or_else(|| PurchaseRepositoryError::query(POISONED))?;
        Ok(state
            .purchases
            .iter()
            .find(|purchase| &purchase.reference == reference)
            .cloned())
    }

    async fn find_active(
        &self,
        buyer_id: &UserId,
        item_id: &ItemId,
    ) -> Result<Option<Purchase>, PurchaseRepositoryError> {
        let state = self
            .lock()
            .ok_or_else(|| PurchaseRepositoryError::query(POISONED))?;
        Ok(state
            .purchases
            .iter()
            .find(|purchase| {
                &purchase.buyer_id == buyer_id
                    && &purchase.item_id == item_id
                    && purchase.status.is_active()
            })
            .cloned())
    }

    async fn complete_if_pending(
        &self,
        id: &PurchaseId,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, PurchaseRepositoryError> {
        let mut state = self
            .lock()
            .ok_or_else(|| PurchaseRepositoryError::query(POISONED))?;
        Ok(transition(
            &mut state,
            id,
            PurchaseStatus::Completed,
            Some(completed_at),
        ))
    }

    async fn fail_if_pending(&self, id: &PurchaseId) -> Result<bool, PurchaseRepositoryError> {
        let mut state = self
            .lock()
            .ok_or_else(|| PurchaseRepositoryError::query(POISONED))?;
        Ok(transition(&mut state, id, PurchaseStatus::Failed, None))
    }

    async fn has_completed(
        &self,
        buyer_id: &UserId,
        item_id: &ItemId,
    ) -> Result<bool, PurchaseRepositoryError> {
        let state = self
            .lock()
            .ok_or_else(|| PurchaseRepositoryError::query(POISONED))?;
        Ok(state.purchases.iter().any(|purchase| {
            &purchase.buyer_id == buyer_id
                && &purchase.item_id == item_id
                && purchase.status == PurchaseStatus::Completed
        }))
    }

    async fn list_for_buyer(
        &self,
        buyer_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Purchase>, PurchaseRepositoryError> {
        let state = self
            .lock()
            .ok_or_else(|| PurchaseRepositoryError::query(POISONED))?;
        let mut purchases = state
            .purchases
            .iter()
            .filter(|purchase| &purchase.buyer_id == buyer_id)
            .cloned()
            .collect::<Vec<_>>();
        purchases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        purchases.truncate(capacity(limit));
        Ok(purchases)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Purchase>, PurchaseRepositoryError> {
        let state = self
            .lock()
            .ok_or_else(|| PurchaseRepositoryError::query(POISONED))?;
        let mut purchases = state.purchases.clone();
        purchases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        purchases.truncate(capacity(limit));
        Ok(purchases)
    }
}

#[async_trait]
impl SellerProfileRepository for InMemoryStore {
    async fn find(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SellerProfile>, SellerProfileRepositoryError> {
        let state = self
            .lock()
            .ok_or_else(|| SellerProfileRepositoryError::query(POISONED))?;
        Ok(state.profiles.get(user_id).cloned())
    }

    async fn save(&self, profile: &SellerProfile) -> Result<(), SellerProfileRepositoryError> {
        let mut state = self
            .lock()
            .ok_or_else(|| SellerProfileRepositoryError::query(POISONED))?;
        let mut stored = profile.clone();
        if let Some(existing) = state.profiles.get(&profile.user_id) {
            stored.is_approved = existing.is_approved;
            stored.created_at = existing.created_at;
        }
        state.profiles.insert(profile.user_id, stored);
        Ok(())
    }

    async fn approve(&self, user_id: &UserId) -> Result<bool, SellerProfileRepositoryError> {
        let mut state = self
            .lock()
            .ok_or_else(|| SellerProfileRepositoryError::query(POISONED))?;
        Ok(state.profiles.get_mut(user_id).is_some_and(|profile| {
            profile.is_approved = true;
            true
        }))
    }

    async fn list_recent(
        &self,
        limit: u32,
    ) -> Result<Vec<SellerProfile>, SellerProfileRepositoryError> {
        let state = self
            .lock()
            .ok_or_else(|| SellerProfileRepositoryError::query(POISONED))?;
        let mut profiles = state.profiles.values().cloned().collect::<Vec<_>>();
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        profiles.truncate(capacity(limit));
        Ok(profiles)
    }
}

fn capacity(limit: u32) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}

use crate::domain::cond::Conds;
use crate::domain::entity::Record;
use crate::domain::ports::{ChainProxy, EntityStore, LockService, Notification, NotificationSink};
use crate::error::{Result, SchedulerError};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// A thread-safe in-memory entity collection.
///
/// Records are kept in a `BTreeMap` keyed by id so pagination order is
/// stable. Failures can be injected to exercise retry paths.
#[derive(Clone)]
pub struct InMemoryStore<R: Record> {
    rows: Arc<RwLock<BTreeMap<String, R>>>,
    failing_updates: Arc<AtomicUsize>,
    failing_creates: Arc<AtomicUsize>,
    updates: Arc<AtomicUsize>,
}

impl<R: Record> Default for InMemoryStore<R> {
    fn default() -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
            failing_updates: Arc::new(AtomicUsize::new(0)),
            failing_creates: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<R: Record> InMemoryStore<R> {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `rows`.
    pub async fn with_rows(rows: impl IntoIterator<Item = R>) -> Self {
        let store = Self::new();
        for row in rows {
            store.insert(row).await;
        }
        store
    }

    /// Inserts or replaces a record as is.
    pub async fn insert(&self, row: R) {
        self.rows.write().await.insert(row.id().to_string(), row);
    }

    pub async fn all(&self) -> Vec<R> {
        self.rows.read().await.values().cloned().collect()
    }

    /// Number of successful updates served so far.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Makes the next `n` updates fail with a store error.
    pub fn fail_next_updates(&self, n: usize) {
        self.failing_updates.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` creations fail with a store error.
    pub fn fail_next_creates(&self, n: usize) {
        self.failing_creates.store(n, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl<R: Record> EntityStore<R> for InMemoryStore<R> {
    async fn list(&self, conds: &Conds, offset: usize, limit: usize) -> Result<(Vec<R>, usize)> {
        let rows = self.rows.read().await;
        let matching: Vec<&R> = rows.values().filter(|row| conds.matches(*row)).collect();
        let total = matching.len();
        let page = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn get(&self, id: &str) -> Result<Option<R>> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn update(&self, id: &str, req: &R::Req) -> Result<R> {
        if Self::take_failure(&self.failing_updates) {
            return Err(SchedulerError::StoreError(format!("update {id} failed")));
        }
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(id)
            .ok_or_else(|| SchedulerError::StoreError(format!("record {id} not found")))?;
        row.apply(req);
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(row.clone())
    }

    async fn create(&self, req: &R::Req) -> Result<R> {
        if Self::take_failure(&self.failing_creates) {
            return Err(SchedulerError::StoreError("create failed".to_string()));
        }
        let id = R::req_id(req)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut rows = self.rows.write().await;
        if let Some(existing) = rows.get(&id) {
            return Ok(existing.clone());
        }
        let row = R::from_req(id.clone(), req);
        rows.insert(id, row.clone());
        Ok(row)
    }
}

/// In-process lock service; a held key cannot be acquired again until
/// released.
#[derive(Default, Clone)]
pub struct InMemoryLock {
    held: Arc<DashMap<String, ()>>,
}

impl InMemoryLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.held.contains_key(key)
    }
}

#[async_trait]
impl LockService for InMemoryLock {
    async fn lock(&self, key: &str) -> Result<()> {
        match self.held.entry(key.to_string()) {
            Entry::Occupied(_) => {
                Err(SchedulerError::LockError(format!("{key} is already locked")))
            }
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(())
            }
        }
    }

    async fn unlock(&self, key: &str) -> Result<()> {
        self.held.remove(key);
        Ok(())
    }
}

/// Fixed on-chain balances keyed by coin name and address.
#[derive(Default, Clone)]
pub struct InMemoryChain {
    balances: Arc<DashMap<(String, String), Decimal>>,
}

impl InMemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, coin_name: &str, address: &str, balance: Decimal) {
        self.balances
            .insert((coin_name.to_string(), address.to_string()), balance);
    }
}

#[async_trait]
impl ChainProxy for InMemoryChain {
    async fn get_balance(&self, coin_name: &str, address: &str) -> Result<Option<Decimal>> {
        Ok(self
            .balances
            .get(&(coin_name.to_string(), address.to_string()))
            .map(|balance| *balance))
    }
}

/// Keeps every notification it receives.
#[derive(Default, Clone)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, notification: Notification) -> Result<()> {
        tracing::info!(
            subsystem = %notification.subsystem,
            id = %notification.entity_id,
            result = ?notification.result,
            message = %notification.message,
            "notification"
        );
        self.sent.lock().await.push(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::with_lock;
    use crate::domain::tx::{Tx, TxReq, TxState};

    fn tx(id: &str, state: TxState) -> Tx {
        Tx {
            id: id.into(),
            ent_id: id.into(),
            state,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let store = InMemoryStore::with_rows(
            (0..5)
                .map(|i| tx(&format!("t{i}"), TxState::Created))
                .chain([tx("w", TxState::Wait)]),
        )
        .await;

        let conds = Conds::new().eq("state", TxState::Created);
        let (page, total) = store.list(&conds, 0, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, "t0");

        let (page, _) = store.list(&conds, 4, 2).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "t4");
    }

    #[tokio::test]
    async fn test_create_is_idempotent_on_id() {
        let store = InMemoryStore::<Tx>::new();
        let req = TxReq {
            id: Some("candidate".into()),
            amount: Some("1".into()),
            ..Default::default()
        };
        store.create(&req).await.unwrap();
        let again = TxReq {
            amount: Some("2".into()),
            ..req
        };
        let created = store.create(&again).await.unwrap();
        assert_eq!(created.amount, "1");
        assert_eq!(store.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_injected_update_failure() {
        let store = InMemoryStore::with_rows([tx("t1", TxState::Created)]).await;
        store.fail_next_updates(1);
        let req = TxReq {
            state: Some(TxState::Wait),
            ..Default::default()
        };
        assert!(store.update("t1", &req).await.is_err());
        let updated = store.update("t1", &req).await.unwrap();
        assert_eq!(updated.state, TxState::Wait);
        assert_eq!(store.update_count(), 1);
    }

    #[tokio::test]
    async fn test_get_only_rejects_many() {
        let store =
            InMemoryStore::with_rows([tx("a", TxState::Wait), tx("b", TxState::Wait)]).await;
        let conds = Conds::new().eq("state", TxState::Wait);
        let err = store.get_only(&conds).await.unwrap_err();
        assert!(matches!(err, SchedulerError::ValidationError(_)));
        assert!(!err.is_transient());
        let conds = Conds::new().eq("id", "a");
        assert_eq!(store.get_only(&conds).await.unwrap().unwrap().id, "a");
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let locks = InMemoryLock::new();
        locks.lock("acc").await.unwrap();
        assert!(locks.lock("acc").await.is_err());
        locks.unlock("acc").await.unwrap();
        assert!(locks.lock("acc").await.is_ok());
    }

    #[tokio::test]
    async fn test_with_lock_releases_on_error() {
        let locks = InMemoryLock::new();
        let result: Result<()> = with_lock(&locks, "acc", async {
            Err(SchedulerError::ValidationError("boom".into()))
        })
        .await;
        assert!(result.is_err());
        assert!(!locks.is_locked("acc"));
    }
}

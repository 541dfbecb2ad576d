use super::cond::Conds;
use super::entity::Record;
use crate::error::{Result, SchedulerError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

/// Query and update contract of a persisted entity collection.
#[async_trait]
pub trait EntityStore<R: Record>: Send + Sync {
    /// Returns one page of matching records in a stable order, together with
    /// the number of matching records in total.
    async fn list(&self, conds: &Conds, offset: usize, limit: usize) -> Result<(Vec<R>, usize)>;

    async fn get(&self, id: &str) -> Result<Option<R>>;

    /// Writes the `Some` fields of `req` and returns the updated record.
    async fn update(&self, id: &str, req: &R::Req) -> Result<R>;

    /// Creates a record. When `req` carries an id that already exists the
    /// existing record is returned unchanged.
    async fn create(&self, req: &R::Req) -> Result<R>;

    /// Returns the only record matching `conds`. More than one match is a
    /// data fault, not a store outage, and is never retried.
    async fn get_only(&self, conds: &Conds) -> Result<Option<R>> {
        let (mut rows, total) = self.list(conds, 0, 2).await?;
        if total > 1 {
            return Err(SchedulerError::ValidationError(format!(
                "too many records: {total}"
            )));
        }
        Ok(rows.pop())
    }

    async fn exists(&self, conds: &Conds) -> Result<bool> {
        let (_, total) = self.list(conds, 0, 1).await?;
        Ok(total > 0)
    }
}

pub type StoreRef<R> = Arc<dyn EntityStore<R>>;

/// Cross-process mutual exclusion on shared financial accounts.
#[async_trait]
pub trait LockService: Send + Sync {
    /// Acquires `key`, failing with a lock error if someone else holds it.
    async fn lock(&self, key: &str) -> Result<()>;

    /// Releases `key`. Releasing a key that is not held is not an error.
    async fn unlock(&self, key: &str) -> Result<()>;
}

pub type LockRef = Arc<dyn LockService>;

/// Runs `fut` while holding `key`, releasing it on every path.
pub async fn with_lock<T, F>(locks: &dyn LockService, key: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    locks.lock(key).await?;
    let result = fut.await;
    if let Err(e) = locks.unlock(key).await {
        tracing::warn!(key, error = %e, "unlock failed");
    }
    result
}

/// Read access to on-chain balances.
#[async_trait]
pub trait ChainProxy: Send + Sync {
    /// Balance of `address` in coin `coin_name`, `None` if the chain does not
    /// know the address.
    async fn get_balance(&self, coin_name: &str, address: &str) -> Result<Option<Decimal>>;
}

pub type ChainRef = Arc<dyn ChainProxy>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifResult {
    Success,
    Fail,
}

/// Operator alert emitted by a business module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub subsystem: String,
    pub entity_id: String,
    pub ent_id: String,
    pub result: NotifResult,
    pub message: String,
    pub extra: serde_json::Value,
}

/// Destination of operator alerts.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<()>;
}

pub type SinkRef = Arc<dyn NotificationSink>;

use super::feed::cancelable_feed;
use super::running::{Admission, RunningSet};
use crate::domain::cond::Conds;
use crate::domain::entity::{Entity, Record};
use crate::domain::ports::StoreRef;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Page size used when scanning stores.
pub const DEFAULT_ROW_LIMIT: usize = 1000;

/// Discovers entities in an actionable state and feeds them for execution.
#[async_trait]
pub trait Scanner<E: Entity>: Send + Sync {
    /// Periodic scan.
    async fn scan(&self, feeder: &Feeder<E>) -> Result<()>;

    /// Run once at start-up, typically to pick up entities left in an
    /// intermediate marker state by a previous process.
    async fn init_scan(&self, _feeder: &Feeder<E>) -> Result<()> {
        Ok(())
    }

    /// Out-of-band scan restricted by `conds`.
    async fn trigger_scan(&self, conds: &Conds, _feeder: &Feeder<E>) -> Result<()> {
        tracing::debug!(?conds, "trigger scan not supported");
        Ok(())
    }
}

/// Gate between scanners and the executor pool.
///
/// Every entity is admitted into the running set before it is sent, so an
/// entity already in flight is silently skipped.
pub struct Feeder<E> {
    subsystem: String,
    running: Arc<RunningSet>,
    tx: mpsc::Sender<E>,
    cancel: CancellationToken,
}

impl<E: Entity> Feeder<E> {
    pub fn new(
        subsystem: impl Into<String>,
        running: Arc<RunningSet>,
        tx: mpsc::Sender<E>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            subsystem: subsystem.into(),
            running,
            tx,
            cancel,
        }
    }

    /// Dispatches `entity` unless it is already in flight. Returns whether it
    /// was handed to an executor.
    pub async fn feed(&self, entity: E) -> bool {
        let id = entity.id().to_string();
        match self.running.admit(&id, &self.subsystem) {
            Admission::Admitted => {}
            Admission::Running | Admission::Overflow => return false,
        }
        if cancelable_feed(&self.cancel, &self.tx, entity).await.is_err() {
            self.running.release(&id);
            return false;
        }
        true
    }

    /// Like [`Feeder::feed`], but runs `prepare` once the entity is admitted
    /// and dispatches what it returns. Used by scanners that mark an entity
    /// before handing it over; nothing is marked for an entity in flight.
    pub async fn feed_with<F, Fut>(&self, entity: E, prepare: F) -> Result<bool>
    where
        F: FnOnce(E) -> Fut + Send,
        Fut: std::future::Future<Output = Result<E>> + Send,
    {
        let id = entity.id().to_string();
        match self.running.admit(&id, &self.subsystem) {
            Admission::Admitted => {}
            Admission::Running | Admission::Overflow => return Ok(false),
        }
        let prepared = match prepare(entity).await {
            Ok(prepared) => prepared,
            Err(e) => {
                self.running.release(&id);
                return Err(e);
            }
        };
        if cancelable_feed(&self.cancel, &self.tx, prepared).await.is_err() {
            self.running.release(&id);
            return Ok(false);
        }
        Ok(true)
    }

    /// Feeds every entity of `rows`, stopping early on cancellation.
    pub async fn feed_all(&self, rows: Vec<E>) -> usize {
        let mut fed = 0;
        for row in rows {
            if self.is_cancelled() {
                break;
            }
            if self.feed(row).await {
                fed += 1;
            }
        }
        fed
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }
}

/// Offset-based iteration over every record matching some conditions.
///
/// When the caller moves fed records out of the predicate it reports them
/// through [`Pages::consumed`] so no record is skipped.
pub struct Pages<R: Record> {
    store: StoreRef<R>,
    conds: Conds,
    limit: usize,
    offset: usize,
    done: bool,
}

impl<R: Record> Pages<R> {
    pub fn new(store: StoreRef<R>, conds: Conds) -> Self {
        Self {
            store,
            conds,
            limit: DEFAULT_ROW_LIMIT,
            offset: 0,
            done: false,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Fetches the next page, `None` once a page comes back empty.
    pub async fn next_page(&mut self) -> Result<Option<Vec<R>>> {
        if self.done {
            return Ok(None);
        }
        let (rows, _) = self.store.list(&self.conds, self.offset, self.limit).await?;
        if rows.is_empty() {
            self.done = true;
            return Ok(None);
        }
        self.offset += rows.len();
        Ok(Some(rows))
    }

    /// `n` records of the last page no longer match the conditions.
    pub fn consumed(&mut self, n: usize) {
        self.offset = self.offset.saturating_sub(n);
    }
}

/// Feeds every record matching `conds`, page by page.
pub async fn scan_store<R: Record>(
    store: StoreRef<R>,
    conds: Conds,
    feeder: &Feeder<R>,
) -> Result<usize> {
    let mut pages = Pages::new(store, conds);
    let mut fed = 0;
    while let Some(rows) = pages.next_page().await? {
        fed += feeder.feed_all(rows).await;
        if feeder.is_cancelled() {
            break;
        }
    }
    Ok(fed)
}

use super::feed::{async_feed, cancelable_feed};
use super::message::{Message, Persistent, Routing};
use crate::domain::entity::Entity;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Module logic turning an entity into its next state.
///
/// Implementations never fail: errors are captured into the result and the
/// returned [`Routing`] decides what happens next.
#[async_trait]
pub trait Exec<E, P>: Send + Sync {
    async fn exec(&self, entity: E) -> Routing<P>;
}

/// Senders shared by every stage that hands work downstream.
pub(crate) struct Stages<E, P> {
    subsystem: Arc<str>,
    persist_tx: mpsc::Sender<Message<E, P>>,
    notif_tx: Option<mpsc::Sender<P>>,
    done_tx: mpsc::UnboundedSender<Message<E, P>>,
    cancel: CancellationToken,
}

impl<E, P> Clone for Stages<E, P> {
    fn clone(&self) -> Self {
        Self {
            subsystem: self.subsystem.clone(),
            persist_tx: self.persist_tx.clone(),
            notif_tx: self.notif_tx.clone(),
            done_tx: self.done_tx.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<E, P> Stages<E, P>
where
    E: Entity,
    P: Persistent<Entity = E>,
{
    pub(crate) fn new(
        subsystem: Arc<str>,
        persist_tx: mpsc::Sender<Message<E, P>>,
        notif_tx: Option<mpsc::Sender<P>>,
        done_tx: mpsc::UnboundedSender<Message<E, P>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            subsystem,
            persist_tx,
            notif_tx,
            done_tx,
            cancel,
        }
    }

    pub(crate) fn subsystem(&self) -> &str {
        &self.subsystem
    }

    pub(crate) fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) async fn route(&self, routing: Routing<P>) {
        match routing {
            Routing::Done(p) => self.done(Message::Persistent(p)),
            Routing::Persist(p) => self.persist(Message::Persistent(p)).await,
            Routing::Notify(p) => {
                self.notify(p.clone());
                self.done(Message::Persistent(p));
            }
            Routing::PersistAndNotify(p) => {
                self.notify(p.clone());
                self.persist(Message::Persistent(p)).await;
            }
        }
    }

    /// Signals that the entity left the pipeline.
    pub(crate) fn done(&self, msg: Message<E, P>) {
        if self.done_tx.send(msg).is_err() {
            tracing::debug!(subsystem = %self.subsystem, "release loop already stopped");
        }
    }

    pub(crate) async fn persist(&self, msg: Message<E, P>) {
        if let Err(e) = cancelable_feed(&self.cancel, &self.persist_tx, msg).await {
            self.done(e.into_inner());
        }
    }

    /// Best effort; never waits for the notifier.
    pub(crate) fn notify(&self, p: P) {
        if let Some(tx) = &self.notif_tx {
            async_feed(self.cancel.clone(), tx.clone(), p);
        }
    }
}

/// Starts `number` workers sharing the dispatch channel.
pub(crate) fn spawn_workers<E, P>(
    number: usize,
    exec: Arc<dyn Exec<E, P>>,
    rx: mpsc::Receiver<E>,
    stages: Stages<E, P>,
) -> Vec<JoinHandle<()>>
where
    E: Entity,
    P: Persistent<Entity = E>,
{
    let rx = Arc::new(Mutex::new(rx));
    (0..number)
        .map(|worker| {
            let exec = exec.clone();
            let rx = rx.clone();
            let stages = stages.clone();
            tokio::spawn(async move { run_worker(worker, exec, rx, stages).await })
        })
        .collect()
}

async fn run_worker<E, P>(
    worker: usize,
    exec: Arc<dyn Exec<E, P>>,
    rx: Arc<Mutex<mpsc::Receiver<E>>>,
    stages: Stages<E, P>,
) where
    E: Entity,
    P: Persistent<Entity = E>,
{
    tracing::debug!(subsystem = stages.subsystem(), worker, "executor started");
    loop {
        let next = tokio::select! {
            biased;
            _ = stages.cancel().cancelled() => None,
            entity = async { rx.lock().await.recv().await } => entity,
        };
        let Some(entity) = next else { break };
        let routing = exec.exec(entity).await;
        stages.route(routing).await;
    }
    tracing::debug!(subsystem = stages.subsystem(), worker, "executor stopped");
}

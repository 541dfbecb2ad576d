use super::executor::Stages;
use super::message::{Message, Persistent};
use super::retry::{self, RetryPolicy};
use crate::domain::entity::Entity;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Commits an execution result.
///
/// Takes the result mutably so values generated during a failed attempt,
/// such as idempotency candidates, survive into the retry.
#[async_trait]
pub trait Persistenter<P>: Send + Sync {
    async fn update(&self, p: &mut P) -> Result<()>;
}

pub(crate) fn spawn_persistenter<E, P>(
    persistenter: Arc<dyn Persistenter<P>>,
    mut rx: mpsc::Receiver<Message<E, P>>,
    stages: Stages<E, P>,
    policy: RetryPolicy,
) -> JoinHandle<()>
where
    E: Entity,
    P: Persistent<Entity = E>,
{
    tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                biased;
                _ = stages.cancel().cancelled() => break,
                msg = rx.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };
            commit(persistenter.as_ref(), msg, &stages, policy).await;
        }
        tracing::debug!(subsystem = stages.subsystem(), "persistenter stopped");
    })
}

async fn commit<E, P>(
    persistenter: &dyn Persistenter<P>,
    msg: Message<E, P>,
    stages: &Stages<E, P>,
    policy: RetryPolicy,
) where
    E: Entity,
    P: Persistent<Entity = E>,
{
    let (mut p, attempt) = match msg {
        Message::Persistent(p) => (p, 0),
        Message::Retry(p, attempt) => (p, attempt),
        Message::Entity(entity) => {
            tracing::error!(subsystem = stages.subsystem(), id = entity.id(), "raw entity reached persistenter");
            stages.done(Message::Entity(entity));
            return;
        }
    };

    match persistenter.update(&mut p).await {
        Ok(()) => stages.done(Message::Persistent(p)),
        Err(e) if e.is_transient() && policy.allows(attempt) => {
            tracing::warn!(
                subsystem = stages.subsystem(),
                id = p.entity().id(),
                attempt,
                error = %e,
                "commit failed, retrying"
            );
            retry::schedule(stages.clone(), p, attempt + 1, policy.delay);
        }
        Err(e) => {
            tracing::error!(
                subsystem = stages.subsystem(),
                id = p.entity().id(),
                attempt,
                error = %e,
                "commit failed"
            );
            p.record_error(&e);
            stages.notify(p.clone());
            stages.done(Message::Persistent(p));
        }
    }
}

use super::executor::Stages;
use super::message::{Message, Persistent};
use crate::domain::entity::Entity;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How failed commits are attempted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total commit attempts, the first one included.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Whether a commit that already failed `attempt + 1` times may run again.
    pub fn allows(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }
}

/// Re-feeds `p` to the persist stage after `delay`.
///
/// If the handler shuts down first the entity is released instead.
pub(crate) fn schedule<E, P>(stages: Stages<E, P>, p: P, attempt: u32, delay: Duration) -> JoinHandle<()>
where
    E: Entity,
    P: Persistent<Entity = E>,
{
    tokio::spawn(async move {
        let cancel = stages.cancel().clone();
        tokio::select! {
            _ = cancel.cancelled() => stages.done(Message::Retry(p, attempt)),
            _ = tokio::time::sleep(delay) => stages.persist(Message::Retry(p, attempt)).await,
        }
    })
}

use crate::domain::entity::Entity;
use crate::error::SchedulerError;
use std::fmt::Debug;

/// The result of executing an entity, carrying everything the persist and
/// notify stages need.
pub trait Persistent: Clone + Debug + Send + Sync + 'static {
    type Entity: Entity;

    /// The entity this result was computed from.
    fn entity(&self) -> &Self::Entity;

    /// Records a commit failure so a later notification can report it.
    fn record_error(&mut self, _error: &SchedulerError) {}
}

/// Work travelling between pipeline stages.
#[derive(Debug, Clone)]
pub enum Message<E, P> {
    /// A raw entity as discovered by a scan.
    Entity(E),
    /// An execution result.
    Persistent(P),
    /// An execution result whose commit is being attempted again.
    Retry(P, u32),
}

impl<E, P> Message<E, P>
where
    E: Entity,
    P: Persistent<Entity = E>,
{
    pub fn entity(&self) -> &E {
        match self {
            Self::Entity(entity) => entity,
            Self::Persistent(p) | Self::Retry(p, _) => p.entity(),
        }
    }

    /// Deduplication key, whatever stage the work is in.
    pub fn object_id(&self) -> &str {
        self.entity().id()
    }
}

/// Where an executor sends its result.
#[derive(Debug, Clone, PartialEq)]
pub enum Routing<P> {
    /// Nothing to commit or report; release the entity.
    Done(P),
    Persist(P),
    /// Report only, then release.
    Notify(P),
    PersistAndNotify(P),
}

impl<P> Routing<P> {
    pub fn decide(p: P, persist: bool, notify: bool) -> Self {
        match (persist, notify) {
            (false, false) => Self::Done(p),
            (true, false) => Self::Persist(p),
            (false, true) => Self::Notify(p),
            (true, true) => Self::PersistAndNotify(p),
        }
    }

    pub fn persistent(&self) -> &P {
        match self {
            Self::Done(p) | Self::Persist(p) | Self::Notify(p) | Self::PersistAndNotify(p) => p,
        }
    }
}

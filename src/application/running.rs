use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Entries older than this are reported when a scan meets them again.
const STALE_AFTER: Duration = Duration::from_secs(60);
/// Releasing an entry held longer than this is reported as slow.
const SLOW_AFTER: Duration = Duration::from_secs(10);

/// Outcome of asking the running set to admit an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The entity was not in flight and is now owned by the caller.
    Admitted,
    /// Another worker already owns the entity.
    Running,
    /// The set is at capacity; try again on a later scan.
    Overflow,
}

#[derive(Debug)]
struct InFlight {
    subsystem: String,
    admitted_at: Instant,
}

/// Process-wide set of entity ids currently travelling through a pipeline.
///
/// An id is admitted when a scan dispatches it and released when its done
/// signal arrives, which guarantees at most one worker per entity.
#[derive(Debug, Default)]
pub struct RunningSet {
    entries: DashMap<String, InFlight>,
    in_flight: AtomicUsize,
    capacity: Option<usize>,
}

impl RunningSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set admitting at most `capacity` entities at once.
    pub fn with_concurrency(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Atomically inserts `id` if absent.
    pub fn try_acquire(&self, id: &str) -> bool {
        self.admit(id, "") == Admission::Admitted
    }

    pub fn admit(&self, id: &str, subsystem: &str) -> Admission {
        let reserved = match self.capacity {
            Some(capacity) => self
                .in_flight
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    (n < capacity).then_some(n + 1)
                })
                .is_ok(),
            None => {
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                true
            }
        };
        if !reserved {
            tracing::debug!(id, subsystem, "running set at capacity");
            return Admission::Overflow;
        }

        match self.entries.entry(id.to_string()) {
            Entry::Occupied(entry) => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                let held = entry.get();
                let elapsed = held.admitted_at.elapsed();
                if elapsed > STALE_AFTER {
                    tracing::warn!(
                        id,
                        subsystem = %held.subsystem,
                        elapsed_secs = elapsed.as_secs(),
                        "entity in flight for too long"
                    );
                }
                Admission::Running
            }
            Entry::Vacant(slot) => {
                slot.insert(InFlight {
                    subsystem: subsystem.to_string(),
                    admitted_at: Instant::now(),
                });
                Admission::Admitted
            }
        }
    }

    /// Removes `id`. Returns whether it was present; releasing twice is a no-op.
    pub fn release(&self, id: &str) -> bool {
        match self.entries.remove(id) {
            Some((_, held)) => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                let elapsed = held.admitted_at.elapsed();
                if elapsed > SLOW_AFTER {
                    tracing::warn!(
                        id,
                        subsystem = %held.subsystem,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "slow entity"
                    );
                }
                true
            }
            None => false,
        }
    }

    /// Releases every entry admitted on behalf of `subsystem`.
    pub fn release_subsystem(&self, subsystem: &str) -> usize {
        let ids: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().subsystem == subsystem)
            .map(|entry| entry.key().clone())
            .collect();
        ids.iter().filter(|id| self.release(id)).count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_acquire_and_release() {
        let set = RunningSet::new();
        assert!(set.try_acquire("a"));
        assert!(!set.try_acquire("a"));
        assert!(set.contains("a"));
        assert!(set.release("a"));
        assert!(!set.release("a"));
        assert!(set.try_acquire("a"));
    }

    #[test]
    fn test_capacity_overflow() {
        let set = RunningSet::with_concurrency(2);
        assert_eq!(set.admit("a", "s"), Admission::Admitted);
        assert_eq!(set.admit("b", "s"), Admission::Admitted);
        assert_eq!(set.admit("c", "s"), Admission::Overflow);
        set.release("a");
        assert_eq!(set.admit("c", "s"), Admission::Admitted);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_running_does_not_consume_capacity() {
        let set = RunningSet::with_concurrency(1);
        assert_eq!(set.admit("a", "s"), Admission::Admitted);
        set.release("a");
        assert_eq!(set.admit("a", "s"), Admission::Admitted);
        assert_eq!(set.admit("b", "s"), Admission::Overflow);
    }

    #[test]
    fn test_release_subsystem() {
        let set = RunningSet::new();
        set.admit("a", "deposit");
        set.admit("b", "deposit");
        set.admit("c", "benefit");
        assert_eq!(set.release_subsystem("deposit"), 2);
        assert_eq!(set.len(), 1);
        assert!(set.contains("c"));
    }

    #[test]
    fn test_concurrent_admission_is_exclusive() {
        let set = Arc::new(RunningSet::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let set = set.clone();
                std::thread::spawn(move || set.try_acquire("shared"))
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
    }
}

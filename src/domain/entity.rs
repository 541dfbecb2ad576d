use super::cond::Queryable;
use chrono::Utc;
use std::fmt::Debug;

/// A persisted workflow record the scheduler can discover and dispatch.
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    /// Stable key used for scans and in-flight deduplication.
    fn id(&self) -> &str;
    /// External identifier other services refer to.
    fn ent_id(&self) -> &str;
}

/// An entity that can be stored, filtered and sparsely updated.
///
/// Updates and creations are expressed as a request value whose `Some`
/// fields are written and whose `None` fields are left untouched.
pub trait Record: Entity + Queryable + Default {
    type Req: Clone + Debug + Send + Sync;

    /// The id a creation request asks for, if any.
    fn req_id(req: &Self::Req) -> Option<&str>;

    fn set_id(&mut self, id: String);

    fn apply(&mut self, req: &Self::Req);

    /// Builds a fresh record from a creation request.
    fn from_req(id: String, req: &Self::Req) -> Self {
        let mut record = Self::default();
        record.apply(req);
        record.set_id(id);
        record
    }
}

/// Current unix time in seconds.
pub fn unix_now() -> u32 {
    u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX)
}

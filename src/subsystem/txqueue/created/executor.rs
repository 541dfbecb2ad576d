use super::types::PersistentTx;
use super::{SUBSYSTEM, in_flight};
use crate::application::executor::Exec;
use crate::application::message::Routing;
use crate::domain::tx::Tx;
use crate::subsystem::Services;
use async_trait::async_trait;
use std::sync::Arc;

pub struct CreatedExecutor {
    services: Arc<Services>,
}

impl CreatedExecutor {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Exec<Tx, PersistentTx> for CreatedExecutor {
    async fn exec(&self, tx: Tx) -> Routing<PersistentTx> {
        let busy = self.services.txs.exists(&in_flight(&tx)).await;
        let p = PersistentTx::new(tx);
        match busy {
            Ok(busy) => Routing::decide(p, !busy, false),
            Err(e) => {
                tracing::warn!(subsystem = SUBSYSTEM, id = %p.tx.id, error = %e, "exec deferred");
                Routing::Done(p)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tx::TxState;
    use crate::infrastructure::world::InMemoryWorld;

    fn tx(id: &str, from: &str, state: TxState) -> Tx {
        Tx {
            id: id.into(),
            coin_type_id: "usdt".into(),
            from_account_id: from.into(),
            state,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_idle_sender_is_queued() {
        let world = InMemoryWorld::new();
        world.txs.insert(tx("done", "a", TxState::Successful)).await;
        let routing = CreatedExecutor::new(world.services())
            .exec(tx("t1", "a", TxState::Created))
            .await;
        assert!(matches!(routing, Routing::Persist(_)));
    }

    #[tokio::test]
    async fn test_busy_sender_waits() {
        for state in [TxState::Wait, TxState::Transferring] {
            let world = InMemoryWorld::new();
            world.txs.insert(tx("busy", "a", state)).await;
            let routing = CreatedExecutor::new(world.services())
                .exec(tx("t1", "a", TxState::Created))
                .await;
            assert!(matches!(routing, Routing::Done(_)));
        }
    }

    #[tokio::test]
    async fn test_other_sender_does_not_block() {
        let world = InMemoryWorld::new();
        world.txs.insert(tx("busy", "b", TxState::Wait)).await;
        let routing = CreatedExecutor::new(world.services())
            .exec(tx("t1", "a", TxState::Created))
            .await;
        assert!(matches!(routing, Routing::Persist(_)));
    }
}

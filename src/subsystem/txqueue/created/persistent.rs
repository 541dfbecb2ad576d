use super::types::PersistentTx;
use super::{in_flight, lock_key};
use crate::application::persistent::Persistenter;
use crate::domain::ports::with_lock;
use crate::domain::tx::{TxReq, TxState};
use crate::error::Result;
use crate::subsystem::Services;
use async_trait::async_trait;
use std::sync::Arc;

pub struct CreatedPersistent {
    services: Arc<Services>,
}

impl CreatedPersistent {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    async fn enqueue(&self, p: &PersistentTx) -> Result<()> {
        if self.services.txs.exists(&in_flight(&p.tx)).await? {
            tracing::debug!(id = %p.tx.id, "sender became busy");
            return Ok(());
        }
        match self.services.txs.get(&p.tx.id).await? {
            Some(current) if current.state == TxState::Created => {}
            _ => return Ok(()),
        }
        let req = TxReq {
            state: Some(TxState::Wait),
            ..Default::default()
        };
        self.services.txs.update(&p.tx.id, &req).await?;
        Ok(())
    }
}

#[async_trait]
impl Persistenter<PersistentTx> for CreatedPersistent {
    async fn update(&self, p: &mut PersistentTx) -> Result<()> {
        let locks = self.services.locks.clone();
        let key = lock_key(&p.tx);
        with_lock(locks.as_ref(), &key, self.enqueue(p)).await
    }
}

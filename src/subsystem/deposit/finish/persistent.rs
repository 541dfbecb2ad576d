use super::SCAN_DEFERRAL_SECS;
use super::types::PersistentAccount;
use crate::application::persistent::Persistenter;
use crate::domain::deposit::{DepositAccountReq, LockedBy};
use crate::domain::entity::unix_now;
use crate::domain::ports::with_lock;
use crate::error::Result;
use crate::subsystem::Services;
use async_trait::async_trait;
use std::sync::Arc;

pub struct FinishPersistent {
    services: Arc<Services>,
}

impl FinishPersistent {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    async fn unlock(&self, p: &PersistentAccount) -> Result<()> {
        let Some(current) = self.services.deposit_accounts.get(&p.account.id).await? else {
            return Ok(());
        };
        // Already unlocked by an earlier attempt.
        if !current.locked || current.collecting_tid != p.account.collecting_tid {
            return Ok(());
        }
        let req = DepositAccountReq {
            outcoming: Some(p.outcoming.to_string()),
            locked: Some(false),
            locked_by: Some(LockedBy::Nobody),
            collecting_tid: Some(None),
            scannable_at: Some(unix_now().saturating_add(SCAN_DEFERRAL_SECS)),
            ..Default::default()
        };
        self.services.deposit_accounts.update(&p.account.id, &req).await?;
        Ok(())
    }
}

#[async_trait]
impl Persistenter<PersistentAccount> for FinishPersistent {
    async fn update(&self, p: &mut PersistentAccount) -> Result<()> {
        let locks = self.services.locks.clone();
        with_lock(locks.as_ref(), &p.account.account_id, self.unlock(p)).await
    }
}

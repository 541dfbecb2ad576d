use crate::application::scanner::{Feeder, Scanner, scan_store};
use crate::domain::cond::Conds;
use crate::domain::deposit::{DepositAccount, LockedBy};
use crate::domain::entity::unix_now;
use crate::error::Result;
use crate::subsystem::Services;
use async_trait::async_trait;
use std::sync::Arc;

pub struct FinishSentinel {
    services: Arc<Services>,
}

impl FinishSentinel {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    fn conds(now: u32) -> Conds {
        Conds::new()
            .eq("locked", true)
            .eq("locked_by", LockedBy::Collecting)
            .lt("scannable_at", now)
    }
}

#[async_trait]
impl Scanner<DepositAccount> for FinishSentinel {
    async fn scan(&self, feeder: &Feeder<DepositAccount>) -> Result<()> {
        scan_store(
            self.services.deposit_accounts.clone(),
            Self::conds(unix_now()),
            feeder,
        )
        .await?;
        Ok(())
    }

    /// Accounts a previous process left locked are picked up straight away.
    async fn init_scan(&self, feeder: &Feeder<DepositAccount>) -> Result<()> {
        self.scan(feeder).await
    }
}

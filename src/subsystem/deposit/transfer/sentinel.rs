use crate::application::scanner::{Feeder, Scanner, scan_store};
use crate::domain::cond::Conds;
use crate::domain::deposit::DepositAccount;
use crate::domain::entity::unix_now;
use crate::error::Result;
use crate::subsystem::Services;
use async_trait::async_trait;
use std::sync::Arc;

pub struct DepositSentinel {
    services: Arc<Services>,
}

impl DepositSentinel {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    fn conds(now: u32) -> Conds {
        Conds::new().eq("locked", false).lt("scannable_at", now)
    }
}

#[async_trait]
impl Scanner<DepositAccount> for DepositSentinel {
    async fn scan(&self, feeder: &Feeder<DepositAccount>) -> Result<()> {
        let fed = scan_store(
            self.services.deposit_accounts.clone(),
            Self::conds(unix_now()),
            feeder,
        )
        .await?;
        tracing::debug!(subsystem = feeder.subsystem(), fed, "scanned deposit accounts");
        Ok(())
    }

    async fn trigger_scan(&self, conds: &Conds, feeder: &Feeder<DepositAccount>) -> Result<()> {
        scan_store(
            self.services.deposit_accounts.clone(),
            Self::conds(unix_now()).and(conds),
            feeder,
        )
        .await?;
        Ok(())
    }
}

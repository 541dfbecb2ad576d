use crate::application::scanner::{Feeder, Pages, Scanner};
use crate::domain::cond::Conds;
use crate::domain::tx::{Tx, TxState};
use crate::error::Result;
use crate::subsystem::Services;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

pub struct CreatedSentinel {
    services: Arc<Services>,
}

impl CreatedSentinel {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    /// Only the first created transaction of each sending account in a page
    /// is fed, the rest wait for it to leave the queue.
    async fn scan_txs(&self, conds: Conds, feeder: &Feeder<Tx>) -> Result<usize> {
        let mut pages = Pages::new(self.services.txs.clone(), conds);
        let mut fed = 0;
        while let Some(txs) = pages.next_page().await? {
            let mut senders = HashSet::new();
            for tx in txs {
                if feeder.is_cancelled() {
                    return Ok(fed);
                }
                let sender = (tx.coin_type_id.clone(), tx.from_account_id.clone());
                if !senders.insert(sender) {
                    continue;
                }
                if feeder.feed(tx).await {
                    fed += 1;
                }
            }
        }
        Ok(fed)
    }
}

#[async_trait]
impl Scanner<Tx> for CreatedSentinel {
    async fn scan(&self, feeder: &Feeder<Tx>) -> Result<()> {
        let fed = self
            .scan_txs(Conds::new().eq("state", TxState::Created), feeder)
            .await?;
        tracing::debug!(subsystem = feeder.subsystem(), fed, "scanned created txs");
        Ok(())
    }

    async fn trigger_scan(&self, conds: &Conds, feeder: &Feeder<Tx>) -> Result<()> {
        self.scan_txs(Conds::new().eq("state", TxState::Created).and(conds), feeder)
            .await?;
        Ok(())
    }
}

use super::SUBSYSTEM;
use super::types::PersistentAccount;
use crate::application::executor::Exec;
use crate::application::message::Routing;
use crate::domain::amount::parse_decimal;
use crate::domain::deposit::DepositAccount;
use crate::domain::tx::TxState;
use crate::error::Result;
use crate::subsystem::Services;
use async_trait::async_trait;
use std::sync::Arc;

pub struct FinishExecutor {
    services: Arc<Services>,
}

impl FinishExecutor {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Exec<DepositAccount, PersistentAccount> for FinishExecutor {
    async fn exec(&self, account: DepositAccount) -> Routing<PersistentAccount> {
        let mut handler = FinishHandler {
            services: &self.services,
            result: PersistentAccount::new(account),
            finished: false,
        };
        let outcome = handler.exec().await;
        handler.route(outcome)
    }
}

struct FinishHandler<'a> {
    services: &'a Services,
    result: PersistentAccount,
    finished: bool,
}

impl FinishHandler<'_> {
    async fn exec(&mut self) -> Result<()> {
        let outcoming = parse_decimal("outcoming", &self.result.account.outcoming)?;
        self.result.outcoming = outcoming;

        let Some(tid) = self.result.account.collecting_tid.clone() else {
            self.finished = true;
            return Ok(());
        };
        let Some(tx) = self.services.txs.get(&tid).await? else {
            // The collection was reserved but never created.
            self.finished = true;
            return Ok(());
        };
        self.result.collect_state = Some(tx.state);
        match tx.state {
            TxState::Successful => {
                self.result.collected = parse_decimal("amount", &tx.amount)?;
                self.result.outcoming = outcoming + self.result.collected;
                self.finished = true;
            }
            TxState::Fail => self.finished = true,
            TxState::Created | TxState::Wait | TxState::Transferring => {}
        }
        Ok(())
    }

    fn route(mut self, outcome: Result<()>) -> Routing<PersistentAccount> {
        match outcome {
            Ok(()) => Routing::decide(self.result, self.finished, false),
            Err(e) if e.is_transient() => {
                tracing::warn!(subsystem = SUBSYSTEM, id = %self.result.account.id, error = %e, "exec deferred");
                Routing::Done(self.result)
            }
            Err(e) => {
                tracing::error!(subsystem = SUBSYSTEM, id = %self.result.account.id, error = %e, "exec failed");
                self.result.error = Some(e.to_string());
                Routing::Notify(self.result)
            }
        }
    }
}

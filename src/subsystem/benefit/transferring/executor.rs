use super::SUBSYSTEM;
use super::types::{PersistentGood, PlatformTransfer, RewardExtra};
use crate::application::executor::Exec;
use crate::application::message::Routing;
use crate::domain::amount::parse_decimal;
use crate::domain::coin::AccountUsedFor;
use crate::domain::good::{BenefitState, Good};
use crate::domain::tx::{Tx, TxState};
use crate::error::{Result, SchedulerError};
use crate::subsystem::Services;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

pub struct TransferringExecutor {
    services: Arc<Services>,
}

impl TransferringExecutor {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Exec<Good, PersistentGood> for TransferringExecutor {
    async fn exec(&self, good: Good) -> Routing<PersistentGood> {
        let mut handler = GoodHandler {
            services: &self.services,
            result: PersistentGood::new(good),
        };
        let outcome = handler.exec().await;
        handler.route(outcome)
    }
}

struct GoodHandler<'a> {
    services: &'a Services,
    result: PersistentGood,
}

impl GoodHandler<'_> {
    fn fail(&mut self, message: &str) {
        let tid = self.result.good.reward_tid.clone().unwrap_or_default();
        self.result.new_state = BenefitState::Fail;
        self.result.error = Some(format!("{message} ({tid})"));
    }

    /// The reward transaction, once it is final.
    async fn settled_reward(&mut self) -> Result<Option<Tx>> {
        let tx = match &self.result.good.reward_tid {
            Some(tid) => self.services.txs.get(tid).await?,
            None => None,
        };
        let Some(tx) = tx else {
            self.fail("invalid transaction");
            return Ok(None);
        };
        match tx.state {
            TxState::Created | TxState::Wait | TxState::Transferring => {
                self.result.new_state = BenefitState::Transferring;
                Ok(None)
            }
            TxState::Fail => {
                self.fail("transaction fail");
                Ok(None)
            }
            TxState::Successful => Ok(Some(tx)),
        }
    }

    async fn platform_transfer(&self, coin_type_id: &str, reward: &Tx) -> Result<Option<PlatformTransfer>> {
        let extra = RewardExtra::parse(&reward.extra)?;
        let coin = self.services.coin(coin_type_id).await?;
        let least = parse_decimal("least_transfer_amount", &coin.least_transfer_amount)?;
        if least <= Decimal::ZERO {
            return Err(SchedulerError::ValidationError(
                "invalid least transfer amount".to_string(),
            ));
        }
        let amount = extra.to_platform();
        if amount <= least {
            return Ok(None);
        }

        let from = self
            .services
            .platform_account(coin_type_id, AccountUsedFor::UserBenefitHot)
            .await?;
        let to = self
            .services
            .platform_account(coin_type_id, AccountUsedFor::PlatformBenefitCold)
            .await?;
        Ok(Some(PlatformTransfer {
            amount,
            from_account_id: from.account_id,
            to_account_id: to.account_id,
            extra: reward.extra.clone(),
        }))
    }

    async fn exec(&mut self) -> Result<()> {
        let Some(reward) = self.settled_reward().await? else {
            return Ok(());
        };
        let next_start = parse_decimal(
            "next_reward_start_amount",
            &self.result.good.next_reward_start_amount,
        )?;
        let amount = parse_decimal("amount", &reward.amount)?;
        let coin_type_id = self.result.good.coin_type_id.clone();
        self.result.platform_transfer = self.platform_transfer(&coin_type_id, &reward).await?;
        self.result.next_start_amount = Some(next_start - amount);
        self.result.new_state = BenefitState::UserBookKeeping;
        Ok(())
    }

    /// Goods arrive marked as being checked, so every outcome writes a state:
    /// errors put the good back to `Transferring` for the next tick.
    fn route(mut self, outcome: Result<()>) -> Routing<PersistentGood> {
        match outcome {
            Ok(()) if self.result.new_state == BenefitState::Fail => {
                tracing::warn!(
                    subsystem = SUBSYSTEM,
                    id = %self.result.good.id,
                    error = self.result.error.as_deref().unwrap_or_default(),
                    "reward transfer failed"
                );
                Routing::PersistAndNotify(self.result)
            }
            Ok(()) => Routing::Persist(self.result),
            Err(e) => {
                self.result.new_state = BenefitState::Transferring;
                self.result.next_start_amount = None;
                self.result.platform_transfer = None;
                if e.is_transient() {
                    tracing::warn!(subsystem = SUBSYSTEM, id = %self.result.good.id, error = %e, "exec deferred");
                    return Routing::Persist(self.result);
                }
                tracing::error!(subsystem = SUBSYSTEM, id = %self.result.good.id, error = %e, "exec failed");
                self.result.error = Some(e.to_string());
                Routing::PersistAndNotify(self.result)
            }
        }
    }
}

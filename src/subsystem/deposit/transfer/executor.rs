use super::SUBSYSTEM;
use super::types::PersistentAccount;
use crate::application::executor::Exec;
use crate::application::message::Routing;
use crate::domain::amount::parse_decimal;
use crate::domain::coin::{AccountUsedFor, Coin};
use crate::domain::deposit::DepositAccount;
use crate::domain::ports::with_lock;
use crate::error::{Result, SchedulerError};
use crate::subsystem::Services;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

pub struct DepositExecutor {
    services: Arc<Services>,
}

impl DepositExecutor {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Exec<DepositAccount, PersistentAccount> for DepositExecutor {
    async fn exec(&self, account: DepositAccount) -> Routing<PersistentAccount> {
        let mut handler = AccountHandler {
            services: &self.services,
            result: PersistentAccount::new(account),
        };
        let outcome = handler.exec().await;
        handler.route(outcome)
    }
}

struct AccountHandler<'a> {
    services: &'a Services,
    result: PersistentAccount,
}

impl AccountHandler<'_> {
    fn account(&self) -> &DepositAccount {
        &self.result.account
    }

    async fn exec(&mut self) -> Result<()> {
        if self.account().locked {
            return Ok(());
        }
        let incoming = parse_decimal("incoming", &self.account().incoming)?;
        let outcoming = parse_decimal("outcoming", &self.account().outcoming)?;

        let coin = self.services.coin(&self.account().coin_type_id).await?;
        let collector = self
            .services
            .platform_account(&coin.id, AccountUsedFor::PaymentCollector)
            .await?;
        self.check_fee_balance(&coin).await?;

        self.result.collect_account_id = collector.account_id;
        self.result.collect_address = collector.address;

        let account_id = self.account().account_id.clone();
        let locks = self.services.locks.clone();
        with_lock(
            locks.as_ref(),
            &account_id,
            self.check_balance(&coin, incoming, outcoming),
        )
        .await
    }

    /// Transfers of tokens are paid in the chain's native coin, which must
    /// be present on the address.
    async fn check_fee_balance(&self, coin: &Coin) -> Result<()> {
        if coin.fee_coin_type_id.is_empty() || coin.fee_coin_type_id == coin.id {
            return Ok(());
        }
        let balance = self
            .services
            .chain
            .get_balance(&coin.fee_coin_name, &self.account().address)
            .await?
            .ok_or_else(|| {
                SchedulerError::ChainError(format!("no balance for {}", self.account().address))
            })?;
        if balance <= Decimal::ZERO {
            return Err(SchedulerError::ValidationError("insufficient gas".to_string()));
        }
        Ok(())
    }

    async fn check_balance(
        &mut self,
        coin: &Coin,
        incoming: Decimal,
        outcoming: Decimal,
    ) -> Result<()> {
        let current = self
            .services
            .deposit_accounts
            .get(&self.result.account.id)
            .await?
            .ok_or_else(|| SchedulerError::ValidationError("invalid deposit account".to_string()))?;
        if current.locked {
            return Ok(());
        }

        let balance = self
            .services
            .chain
            .get_balance(&coin.name, &self.result.account.address)
            .await?
            .ok_or_else(|| {
                SchedulerError::ChainError(format!(
                    "no balance for {}",
                    self.result.account.address
                ))
            })?;
        let booked = incoming - outcoming;
        // The chain has not caught up with the ledger yet.
        if balance < booked {
            return Ok(());
        }
        let reserved = parse_decimal("reserved_amount", &coin.reserved_amount)?;
        if booked <= reserved {
            return Ok(());
        }
        self.result.collect_amount = booked - reserved;
        Ok(())
    }

    fn route(mut self, outcome: Result<()>) -> Routing<PersistentAccount> {
        match outcome {
            Ok(()) if self.result.collect_amount <= Decimal::ZERO => Routing::Done(self.result),
            Ok(()) => Routing::Persist(self.result),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{EntityStore, LockService};
    use crate::infrastructure::world::{InMemoryWorld, fixtures};
    use rust_decimal_macros::dec;

    async fn setup(balance: Decimal) -> (InMemoryWorld, DepositExecutor, DepositAccount) {
        let world = InMemoryWorld::new();
        fixtures::seed_deposit_world(&world).await;
        let account = fixtures::deposit_account("d1", "10", "0");
        world.deposit_accounts.insert(account.clone()).await;
        world.chain.set_balance("usdt", &account.address, balance);
        let executor = DepositExecutor::new(world.services());
        (world, executor, account)
    }

    #[tokio::test]
    async fn test_collects_above_reserve() {
        let (_world, executor, account) = setup(dec!(10)).await;
        match executor.exec(account).await {
            Routing::Persist(p) => {
                assert_eq!(p.collect_amount, dec!(9));
                assert_eq!(p.collect_account_id, "collector-acc");
                assert!(p.collecting_tid.is_none());
            }
            other => panic!("unexpected routing {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_chain_behind_ledger_is_noop() {
        let (_world, executor, account) = setup(dec!(5)).await;
        assert!(matches!(executor.exec(account).await, Routing::Done(_)));
    }

    #[tokio::test]
    async fn test_within_reserve_is_noop() {
        let (world, executor, mut account) = setup(dec!(10)).await;
        account.incoming = "1".into();
        world.deposit_accounts.insert(account.clone()).await;
        assert!(matches!(executor.exec(account).await, Routing::Done(_)));
    }

    #[tokio::test]
    async fn test_locked_account_is_skipped() {
        let (world, executor, account) = setup(dec!(10)).await;
        let mut locked = account.clone();
        locked.locked = true;
        // Another operation locked the account after the scan.
        world.deposit_accounts.insert(locked).await;
        assert!(matches!(executor.exec(account).await, Routing::Done(_)));
    }

    #[tokio::test]
    async fn test_held_lock_defers() {
        let (world, executor, account) = setup(dec!(10)).await;
        world.locks.lock(&account.account_id).await.unwrap();
        assert!(matches!(executor.exec(account).await, Routing::Done(_)));
    }

    #[tokio::test]
    async fn test_insufficient_gas_notifies() {
        let (world, executor, account) = setup(dec!(10)).await;
        let mut coin = world.coins.get("usdt").await.unwrap().unwrap();
        coin.fee_coin_type_id = "eth".into();
        coin.fee_coin_name = "eth".into();
        world.coins.insert(coin).await;
        world.chain.set_balance("eth", &account.address, Decimal::ZERO);

        match executor.exec(account).await {
            Routing::Notify(p) => assert!(p.error.unwrap().contains("insufficient gas")),
            other => panic!("unexpected routing {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_amount_notifies() {
        let (_world, executor, mut account) = setup(dec!(10)).await;
        account.incoming = "ten".into();
        assert!(matches!(executor.exec(account).await, Routing::Notify(_)));
    }
}

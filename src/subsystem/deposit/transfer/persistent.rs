use super::types::PersistentAccount;
use crate::application::persistent::Persistenter;
use crate::domain::amount::Amount;
use crate::domain::deposit::{DepositAccountReq, LockedBy};
use crate::domain::ports::with_lock;
use crate::domain::tx::{TxReq, TxState, TxType};
use crate::error::{Result, SchedulerError};
use crate::subsystem::Services;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub struct DepositPersistent {
    services: Arc<Services>,
}

impl DepositPersistent {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    async fn collect(&self, p: &PersistentAccount, tid: &str) -> Result<()> {
        let account = &p.account;
        let current = self
            .services
            .deposit_accounts
            .get(&account.id)
            .await?
            .ok_or_else(|| SchedulerError::ValidationError("invalid deposit account".to_string()))?;

        match (current.locked, current.collecting_tid.as_deref()) {
            (false, _) => {
                let req = DepositAccountReq {
                    locked: Some(true),
                    locked_by: Some(LockedBy::Collecting),
                    collecting_tid: Some(Some(tid.to_string())),
                    ..Default::default()
                };
                self.services.deposit_accounts.update(&account.id, &req).await?;
            }
            // Marked by an earlier attempt of this very collection.
            (true, Some(marked)) if marked == tid => {}
            (true, _) => {
                return Err(SchedulerError::ValidationError(format!(
                    "deposit account {} locked by another operation",
                    account.id
                )));
            }
        }

        let amount = Amount::positive(p.collect_amount)?;
        let req = TxReq {
            id: Some(tid.to_string()),
            coin_type_id: Some(account.coin_type_id.clone()),
            from_account_id: Some(account.account_id.clone()),
            to_account_id: Some(p.collect_account_id.clone()),
            amount: Some(amount.to_string()),
            fee_amount: Some("0".to_string()),
            state: Some(TxState::Created),
            tx_type: Some(TxType::PaymentCollect),
            extra: Some(
                json!({
                    "deposit_account_id": account.id,
                    "address": account.address,
                    "collect_address": p.collect_address,
                })
                .to_string(),
            ),
            ..Default::default()
        };
        self.services.txs.create(&req).await?;
        Ok(())
    }
}

#[async_trait]
impl Persistenter<PersistentAccount> for DepositPersistent {
    async fn update(&self, p: &mut PersistentAccount) -> Result<()> {
        let tid = p
            .collecting_tid
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        let locks = self.services.locks.clone();
        let account_id = p.account.account_id.clone();
        with_lock(locks.as_ref(), &account_id, self.collect(p, &tid)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deposit::DepositAccount;
    use crate::domain::ports::EntityStore;
    use crate::infrastructure::world::{InMemoryWorld, fixtures};
    use rust_decimal_macros::dec;

    async fn setup() -> (InMemoryWorld, DepositPersistent, PersistentAccount) {
        let world = InMemoryWorld::new();
        fixtures::seed_deposit_world(&world).await;
        let account = fixtures::deposit_account("d1", "10", "0");
        world.deposit_accounts.insert(account.clone()).await;
        let mut p = PersistentAccount::new(account);
        p.collect_amount = dec!(9);
        p.collect_account_id = "collector-acc".into();
        (world.clone(), DepositPersistent::new(world.services()), p)
    }

    async fn account(world: &InMemoryWorld) -> DepositAccount {
        world.deposit_accounts.get("d1").await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_marks_account_and_creates_tx() {
        let (world, persistent, mut p) = setup().await;
        persistent.update(&mut p).await.unwrap();

        let account = account(&world).await;
        assert!(account.locked);
        assert_eq!(account.locked_by, LockedBy::Collecting);
        assert_eq!(account.collecting_tid, p.collecting_tid);

        let txs = world.txs.all().await;
        assert_eq!(txs.len(), 1);
        assert_eq!(Some(txs[0].id.clone()), p.collecting_tid);
        assert_eq!(txs[0].amount, "9");
        assert_eq!(txs[0].tx_type, TxType::PaymentCollect);
        assert!(!world.locks.is_locked("d1-acc"));
    }

    #[tokio::test]
    async fn test_retry_reuses_candidate() {
        let (world, persistent, mut p) = setup().await;
        world.txs.fail_next_creates(1);

        assert!(persistent.update(&mut p).await.is_err());
        let candidate = p.collecting_tid.clone().unwrap();
        assert_eq!(account(&world).await.collecting_tid.as_deref(), Some(candidate.as_str()));
        assert!(world.txs.all().await.is_empty());

        persistent.update(&mut p).await.unwrap();
        assert_eq!(p.collecting_tid.as_deref(), Some(candidate.as_str()));
        let txs = world.txs.all().await;
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].id, candidate);

        // A third commit changes nothing.
        persistent.update(&mut p).await.unwrap();
        assert_eq!(world.txs.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_foreign_lock_aborts() {
        let (world, persistent, mut p) = setup().await;
        let mut locked = account(&world).await;
        locked.locked = true;
        locked.locked_by = LockedBy::Payment;
        world.deposit_accounts.insert(locked).await;

        let err = persistent.update(&mut p).await.unwrap_err();
        assert!(!err.is_transient());
        assert!(world.txs.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_commits_settle_once() {
        let (world, persistent, p) = setup().await;
        let mut first = p.clone();
        let mut second = p;
        let (a, b) = tokio::join!(persistent.update(&mut first), persistent.update(&mut second));

        assert!(a.is_ok() ^ b.is_ok());
        let txs = world.txs.all().await;
        assert_eq!(txs.len(), 1);
        assert_eq!(account(&world).await.collecting_tid, Some(txs[0].id.clone()));
    }
}

mod common;

use common::{context, eventually, fast_config, scheduler};
use fundflow::domain::coin::AccountUsedFor;
use fundflow::domain::deposit::LockedBy;
use fundflow::domain::ports::{EntityStore, NotifResult};
use fundflow::domain::tx::{Tx, TxState, TxType};
use fundflow::infrastructure::world::{InMemoryWorld, fixtures};
use rust_decimal_macros::dec;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

async fn deposit_world() -> InMemoryWorld {
    let world = InMemoryWorld::new();
    fixtures::seed_deposit_world(&world).await;
    world
        .deposit_accounts
        .insert(fixtures::deposit_account("d1", "10", "0"))
        .await;
    world.chain.set_balance("usdt", "d1-addr", dec!(10));
    world
}

async fn collect_tx(world: &InMemoryWorld) -> Option<Tx> {
    world
        .txs
        .all()
        .await
        .into_iter()
        .find(|tx| tx.tx_type == TxType::PaymentCollect)
}

#[tokio::test]
async fn test_collection_lifecycle() {
    let world = &deposit_world().await;
    let config = fast_config(20, &["deposit_transfer", "txqueue_created", "deposit_finish"]);
    let mut scheduler = scheduler(context(world, &config));
    assert!(scheduler.initialize(&config).is_empty());

    // Collected down to the coin's reserve and queued for the chain.
    assert!(
        eventually(WAIT, || async move {
            matches!(collect_tx(world).await, Some(tx) if tx.state == TxState::Wait)
        })
        .await
    );
    let tx = collect_tx(world).await.unwrap();
    assert_eq!(tx.amount, "9");
    assert_eq!(tx.from_account_id, "d1-acc");
    assert_eq!(tx.to_account_id, "collector-acc");

    let account = world.deposit_accounts.get("d1").await.unwrap().unwrap();
    assert!(account.locked);
    assert_eq!(account.locked_by, LockedBy::Collecting);
    assert_eq!(account.collecting_tid, Some(tx.id.clone()));

    // Pending transactions keep the account locked.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(world.deposit_accounts.get("d1").await.unwrap().unwrap().locked);

    world
        .txs
        .insert(Tx {
            state: TxState::Successful,
            ..tx.clone()
        })
        .await;
    assert!(
        eventually(WAIT, || async move {
            !world.deposit_accounts.get("d1").await.unwrap().unwrap().locked
        })
        .await
    );
    let account = world.deposit_accounts.get("d1").await.unwrap().unwrap();
    assert_eq!(account.outcoming, "9");
    assert_eq!(account.locked_by, LockedBy::Nobody);
    assert_eq!(account.collecting_tid, None);

    scheduler.finalize().await;
    assert_eq!(world.txs.all().await.len(), 1);
}

#[tokio::test]
async fn test_failed_collection_unlocks_without_booking() {
    let world = &deposit_world().await;
    let config = fast_config(20, &["deposit_transfer", "deposit_finish"]);
    let mut scheduler = scheduler(context(world, &config));
    scheduler.initialize(&config);

    assert!(eventually(WAIT, || async move { collect_tx(world).await.is_some() }).await);
    let tx = collect_tx(world).await.unwrap();
    world
        .txs
        .insert(Tx {
            state: TxState::Fail,
            ..tx
        })
        .await;

    assert!(
        eventually(WAIT, || async move {
            !world.deposit_accounts.get("d1").await.unwrap().unwrap().locked
        })
        .await
    );
    scheduler.finalize().await;
    let account = world.deposit_accounts.get("d1").await.unwrap().unwrap();
    assert_eq!(account.outcoming, "0");
    // Deferred, so no second collection started right away.
    assert_eq!(world.txs.all().await.len(), 1);
}

#[tokio::test]
async fn test_balance_at_reserve_is_left_alone() {
    let world = &InMemoryWorld::new();
    fixtures::seed_deposit_world(world).await;
    world
        .deposit_accounts
        .insert(fixtures::deposit_account("d1", "1", "0"))
        .await;
    world.chain.set_balance("usdt", "d1-addr", dec!(1));
    let config = fast_config(20, &["deposit_transfer"]);
    let mut scheduler = scheduler(context(world, &config));
    scheduler.initialize(&config);

    tokio::time::sleep(Duration::from_millis(150)).await;
    scheduler.finalize().await;
    assert!(world.txs.all().await.is_empty());
    assert_eq!(world.deposit_accounts.update_count(), 0);
}

#[tokio::test]
async fn test_duplicate_collector_is_reported() {
    let world = &deposit_world().await;
    world
        .platform_accounts
        .insert(fixtures::platform_account(
            "usdt",
            AccountUsedFor::PaymentCollector,
            "collector-2",
        ))
        .await;
    let config = fast_config(20, &["deposit_transfer"]);
    let mut scheduler = scheduler(context(world, &config));
    scheduler.initialize(&config);

    assert!(
        eventually(WAIT, || async move { !world.sink.notifications().await.is_empty() }).await
    );
    scheduler.finalize().await;

    let notification = world.sink.notifications().await.remove(0);
    assert_eq!(notification.subsystem, "deposit_transfer");
    assert_eq!(notification.entity_id, "d1");
    assert_eq!(notification.result, NotifResult::Fail);
    assert!(notification.message.contains("too many records"));
    assert!(world.txs.all().await.is_empty());
    assert!(!world.deposit_accounts.get("d1").await.unwrap().unwrap().locked);
}

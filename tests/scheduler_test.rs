mod common;

use common::{ALL_SUBSYSTEMS, context, eventually, fast_config, scheduler};
use fundflow::config::ModuleConfig;
use fundflow::domain::cond::Conds;
use fundflow::domain::ports::EntityStore;
use fundflow::domain::tx::{Tx, TxState};
use fundflow::infrastructure::world::InMemoryWorld;
use std::time::Duration;

fn created(id: &str, from: &str) -> Tx {
    Tx {
        id: id.into(),
        ent_id: id.into(),
        coin_type_id: "usdt".into(),
        from_account_id: from.into(),
        state: TxState::Created,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_initialize_starts_configured_subsystems() {
    let world = InMemoryWorld::new();
    let config = fast_config(1_000, &["deposit_finish", "no_such_module"]);
    let mut scheduler = scheduler(context(&world, &config));

    let mut all = ALL_SUBSYSTEMS.to_vec();
    all.sort();
    assert_eq!(scheduler.registered(), all);
    assert!(scheduler.initialize(&config).is_empty());
    assert_eq!(scheduler.enabled(), vec!["deposit_finish"]);

    scheduler.finalize().await;
    assert!(scheduler.enabled().is_empty());
}

#[tokio::test]
async fn test_empty_selection_starts_everything() {
    let world = InMemoryWorld::new();
    let config = fast_config(1_000, &[]);
    let mut scheduler = scheduler(context(&world, &config));

    assert!(scheduler.initialize(&config).is_empty());
    assert_eq!(scheduler.enabled().len(), ALL_SUBSYSTEMS.len());
    scheduler.finalize().await;
}

#[tokio::test]
async fn test_invalid_module_fails_alone() {
    let world = InMemoryWorld::new();
    let mut config = fast_config(1_000, &["deposit_finish", "txqueue_created"]);
    config
        .modules
        .insert("txqueue_created".to_string(), ModuleConfig::new(1_000, 0));
    let mut scheduler = scheduler(context(&world, &config));

    assert_eq!(scheduler.initialize(&config), vec!["txqueue_created".to_string()]);
    assert_eq!(scheduler.enabled(), vec!["deposit_finish"]);
    scheduler.finalize().await;
}

#[tokio::test]
async fn test_enable_and_disable() {
    let world = InMemoryWorld::new();
    let config = fast_config(1_000, &["deposit_finish"]);
    let mut scheduler = scheduler(context(&world, &config));

    assert!(scheduler.enable("no_such_module").is_err());
    scheduler.enable("deposit_transfer").unwrap();
    // Enabling twice is harmless.
    scheduler.enable("deposit_transfer").unwrap();
    assert_eq!(scheduler.enabled(), vec!["deposit_transfer"]);

    scheduler.disable("deposit_transfer").await;
    scheduler.disable("deposit_transfer").await;
    assert!(scheduler.enabled().is_empty());
    assert!(
        scheduler
            .trigger("deposit_transfer", Conds::new())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_trigger_scans_out_of_band() {
    let world = &InMemoryWorld::new();
    // Long enough that only the startup scan runs during the test.
    let config = fast_config(60_000, &["txqueue_created"]);
    let mut scheduler = scheduler(context(world, &config));
    scheduler.initialize(&config);
    tokio::time::sleep(Duration::from_millis(100)).await;

    world.txs.insert(created("t1", "a")).await;
    world.txs.insert(created("t2", "b")).await;
    scheduler
        .trigger("txqueue_created", Conds::new().eq("id", "t2"))
        .await
        .unwrap();

    assert!(
        eventually(Duration::from_secs(2), || async move {
            world.txs.get("t2").await.unwrap().unwrap().state == TxState::Wait
        })
        .await
    );
    assert_eq!(
        world.txs.get("t1").await.unwrap().unwrap().state,
        TxState::Created
    );
    scheduler.finalize().await;
}

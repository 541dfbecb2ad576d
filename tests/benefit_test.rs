mod common;

use common::{context, eventually, fast_config, scheduler};
use fundflow::domain::good::{BenefitState, Good};
use fundflow::domain::order::OrderBenefitState;
use fundflow::domain::ports::EntityStore;
use fundflow::domain::tx::{Tx, TxState, TxType};
use fundflow::infrastructure::world::{InMemoryWorld, fixtures};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

async fn good_state(world: &InMemoryWorld, id: &str) -> BenefitState {
    world.goods.get(id).await.unwrap().unwrap().reward_state
}

#[tokio::test]
async fn test_bookkeeping_splits_by_units() {
    let world = &InMemoryWorld::new();
    world
        .goods
        .insert(fixtures::good("g1", "100", "100", BenefitState::UserBookKeeping))
        .await;
    let a = fixtures::app_good("ag-a", "app-a", "g1");
    let b = fixtures::app_good("ag-b", "app-b", "g1");
    world.orders.insert(fixtures::order("o1", &a, "20")).await;
    world.orders.insert(fixtures::order("o2", &a, "10")).await;
    world.orders.insert(fixtures::order("o3", &b, "70")).await;
    world.app_goods.insert(a).await;
    world.app_goods.insert(b).await;

    let config = fast_config(20, &["benefit_bookkeeping"]);
    let mut scheduler = scheduler(context(world, &config));
    scheduler.initialize(&config);
    assert!(
        eventually(WAIT, || async move {
            good_state(world, "g1").await == BenefitState::Done
        })
        .await
    );
    scheduler.finalize().await;

    let booked: HashMap<String, String> = world
        .statements
        .all()
        .await
        .into_iter()
        .map(|s| (s.user_id, s.amount))
        .collect();
    assert_eq!(booked.len(), 3);
    assert_eq!(booked["user-o1"], "20");
    assert_eq!(booked["user-o2"], "10");
    assert_eq!(booked["user-o3"], "70");
    for order in world.orders.all().await {
        assert_eq!(order.benefit_state, OrderBenefitState::BookKept);
    }
}

#[tokio::test]
async fn test_bookkeeping_never_books_more_than_the_reward() {
    let mut rng = rand::thread_rng();
    let reward = Decimal::new(rng.gen_range(1..10_000_000), 3);
    let world = &InMemoryWorld::new();
    world
        .goods
        .insert(fixtures::good(
            "g1",
            "1000",
            &reward.to_string(),
            BenefitState::UserBookKeeping,
        ))
        .await;
    let app_goods: Vec<_> = (0..3)
        .map(|i| fixtures::app_good(&format!("ag-{i}"), &format!("app-{i}"), "g1"))
        .collect();
    let mut sold = 0u32;
    for i in 0..45 {
        let units = rng.gen_range(1..=20u32);
        sold += units;
        let app_good = &app_goods[rng.gen_range(0..app_goods.len())];
        world
            .orders
            .insert(fixtures::order(&format!("o{i:02}"), app_good, &units.to_string()))
            .await;
    }
    for app_good in app_goods {
        world.app_goods.insert(app_good).await;
    }

    let config = fast_config(10, &["benefit_bookkeeping"]);
    let mut scheduler = scheduler(context(world, &config));
    scheduler.initialize(&config);
    assert!(
        eventually(WAIT, || async move {
            good_state(world, "g1").await == BenefitState::Done
        })
        .await
    );
    scheduler.finalize().await;

    let statements = world.statements.all().await;
    assert_eq!(statements.len(), 45);
    let booked: Decimal = statements
        .iter()
        .map(|s| Decimal::from_str(&s.amount).unwrap())
        .sum();
    let expected = reward * Decimal::from(sold) / dec!(1000);
    assert!(booked <= reward, "booked {booked} of {reward}");
    assert!(
        (expected - booked).abs() < dec!(0.000000000001),
        "booked {booked}, expected {expected}"
    );
}

#[tokio::test]
async fn test_settled_reward_flows_into_bookkeeping() {
    let world = &InMemoryWorld::new();
    fixtures::seed_deposit_world(world).await;
    world
        .txs
        .insert(Tx {
            id: "reward".into(),
            coin_type_id: "usdt".into(),
            amount: "8".into(),
            state: TxState::Successful,
            tx_type: TxType::UserBenefit,
            extra: r#"{"PlatformReward":"1.5","TechniqueServiceFee":"0.5"}"#.into(),
            ..Default::default()
        })
        .await;
    world
        .goods
        .insert(Good {
            reward_tid: Some("reward".into()),
            ..fixtures::good("g1", "100", "10", BenefitState::Transferring)
        })
        .await;

    let config = fast_config(20, &["benefit_transferring", "benefit_bookkeeping"]);
    let mut scheduler = scheduler(context(world, &config));
    scheduler.initialize(&config);
    assert!(
        eventually(WAIT, || async move {
            good_state(world, "g1").await == BenefitState::Done
        })
        .await
    );
    scheduler.finalize().await;

    let good = world.goods.get("g1").await.unwrap().unwrap();
    assert_eq!(good.next_reward_start_amount, "2");
    let platform: Vec<Tx> = world
        .txs
        .all()
        .await
        .into_iter()
        .filter(|tx| tx.tx_type == TxType::PlatformBenefit)
        .collect();
    assert_eq!(platform.len(), 1);
    assert_eq!(platform[0].amount, "2");
    assert_eq!(platform[0].from_account_id, "user-hot-acc");
    assert_eq!(platform[0].to_account_id, "platform-cold-acc");
    assert_eq!(good.platform_tid, Some(platform[0].id.clone()));
}

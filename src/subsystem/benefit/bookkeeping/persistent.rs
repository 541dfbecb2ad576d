use super::types::PersistentGood;
use crate::application::persistent::Persistenter;
use crate::domain::good::{Good, GoodReq};
use crate::domain::ledger::{IoSubType, IoType, StatementReq};
use crate::domain::order::{OrderBenefitState, OrderReq};
use crate::error::Result;
use crate::subsystem::Services;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Deterministic statement id, so a retried commit books nothing twice.
pub fn statement_id(good: &Good, order_id: &str) -> String {
    let name = format!("{}:{}:{}", good.id, good.last_reward_at, order_id);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

pub struct BookKeepingPersistent {
    services: Arc<Services>,
}

impl BookKeepingPersistent {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Persistenter<PersistentGood> for BookKeepingPersistent {
    async fn update(&self, p: &mut PersistentGood) -> Result<()> {
        let good = &p.good;
        for reward in &p.order_rewards {
            if reward.amount > Decimal::ZERO {
                let req = StatementReq {
                    id: Some(statement_id(good, &reward.order_id)),
                    app_id: Some(reward.app_id.clone()),
                    user_id: Some(reward.user_id.clone()),
                    coin_type_id: Some(good.coin_type_id.clone()),
                    io_type: Some(IoType::Incoming),
                    io_sub_type: Some(IoSubType::MiningBenefit),
                    amount: Some(reward.amount.normalize().to_string()),
                    io_extra: Some(reward.extra.clone()),
                    created_at: Some(good.last_reward_at),
                };
                self.services.statements.create(&req).await?;
            }
            let req = OrderReq {
                benefit_state: Some(OrderBenefitState::BookKept),
                ..Default::default()
            };
            self.services.orders.update(&reward.order_id, &req).await?;
        }

        if let Some(state) = p.new_state {
            let req = GoodReq {
                reward_state: Some(state),
                ..Default::default()
            };
            self.services.goods.update(&good.id, &req).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::good::BenefitState;
    use crate::domain::ports::EntityStore;
    use crate::infrastructure::world::{InMemoryWorld, fixtures};
    use crate::subsystem::benefit::bookkeeping::types::OrderReward;
    use rust_decimal_macros::dec;

    fn reward(order_id: &str, amount: Decimal) -> OrderReward {
        OrderReward {
            order_id: order_id.into(),
            app_id: "app".into(),
            user_id: format!("user-{order_id}"),
            amount,
            extra: "{}".into(),
        }
    }

    #[tokio::test]
    async fn test_retry_books_once() {
        let world = InMemoryWorld::new();
        let good = fixtures::good("g1", "10", "10", BenefitState::UserBookKeeping);
        let app_good = fixtures::app_good("ag", "app", "g1");
        world.orders.insert(fixtures::order("o1", &app_good, "1")).await;
        world.orders.insert(fixtures::order("o2", &app_good, "1")).await;
        world.goods.insert(good.clone()).await;

        let mut p = PersistentGood::new(good);
        p.order_rewards = vec![reward("o1", dec!(1.5)), reward("o2", dec!(0))];
        let persistent = BookKeepingPersistent::new(world.services());

        world.orders.fail_next_updates(1);
        assert!(persistent.update(&mut p).await.is_err());
        persistent.update(&mut p).await.unwrap();

        let statements = world.statements.all().await;
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].id, statement_id(&p.good, "o1"));
        assert_eq!(statements[0].amount, "1.5");
        assert_eq!(statements[0].created_at, 100);
        for id in ["o1", "o2"] {
            let order = world.orders.get(id).await.unwrap().unwrap();
            assert_eq!(order.benefit_state, OrderBenefitState::BookKept);
        }
        let stored = world.goods.get("g1").await.unwrap().unwrap();
        assert_eq!(stored.reward_state, BenefitState::UserBookKeeping);
    }

    #[tokio::test]
    async fn test_final_batch_marks_done() {
        let world = InMemoryWorld::new();
        let good = fixtures::good("g1", "10", "10", BenefitState::UserBookKeeping);
        world.goods.insert(good.clone()).await;
        let mut p = PersistentGood::new(good);
        p.new_state = Some(BenefitState::Done);

        BookKeepingPersistent::new(world.services())
            .update(&mut p)
            .await
            .unwrap();
        let stored = world.goods.get("g1").await.unwrap().unwrap();
        assert_eq!(stored.reward_state, BenefitState::Done);
    }

    #[test]
    fn test_statement_id_is_per_period() {
        let mut good = fixtures::good("g1", "10", "10", BenefitState::UserBookKeeping);
        let first = statement_id(&good, "o1");
        assert_eq!(first, statement_id(&good, "o1"));
        assert_ne!(first, statement_id(&good, "o2"));
        good.last_reward_at += 86_400;
        assert_ne!(first, statement_id(&good, "o1"));
    }
}

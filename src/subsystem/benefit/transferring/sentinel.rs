use crate::application::scanner::{DEFAULT_ROW_LIMIT, Feeder, Pages, Scanner, scan_store};
use crate::domain::cond::Conds;
use crate::domain::good::{BenefitState, Good, GoodReq};
use crate::error::Result;
use crate::subsystem::Services;
use async_trait::async_trait;
use std::sync::Arc;

pub struct TransferringSentinel {
    services: Arc<Services>,
    page_limit: usize,
}

impl TransferringSentinel {
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            services,
            page_limit: DEFAULT_ROW_LIMIT,
        }
    }

    pub fn page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit;
        self
    }

    /// Marks every good of `conds` as being checked and feeds it. Marked goods
    /// leave the predicate, so the page offset is rewound by their number.
    async fn mark_and_feed(&self, conds: Conds, feeder: &Feeder<Good>) -> Result<usize> {
        let mut pages = Pages::new(self.services.goods.clone(), conds).limit(self.page_limit);
        let mut fed = 0;
        while let Some(goods) = pages.next_page().await? {
            let mut marked = 0;
            for good in goods {
                if feeder.is_cancelled() {
                    return Ok(fed);
                }
                let services = self.services.clone();
                let sent = feeder
                    .feed_with(good, move |good| async move {
                        let req = GoodReq {
                            reward_state: Some(BenefitState::CheckTransferring),
                            ..Default::default()
                        };
                        services.goods.update(&good.id, &req).await
                    })
                    .await?;
                if sent {
                    marked += 1;
                }
            }
            fed += marked;
            pages.consumed(marked);
        }
        Ok(fed)
    }

    fn conds(state: BenefitState) -> Conds {
        Conds::new().eq("reward_state", state)
    }
}

#[async_trait]
impl Scanner<Good> for TransferringSentinel {
    async fn scan(&self, feeder: &Feeder<Good>) -> Result<()> {
        let fed = self
            .mark_and_feed(Self::conds(BenefitState::Transferring), feeder)
            .await?;
        tracing::debug!(subsystem = feeder.subsystem(), fed, "scanned transferring goods");
        Ok(())
    }

    /// Goods a previous process marked but never settled.
    async fn init_scan(&self, feeder: &Feeder<Good>) -> Result<()> {
        scan_store(
            self.services.goods.clone(),
            Self::conds(BenefitState::CheckTransferring),
            feeder,
        )
        .await?;
        Ok(())
    }

    async fn trigger_scan(&self, conds: &Conds, feeder: &Feeder<Good>) -> Result<()> {
        self.mark_and_feed(Self::conds(BenefitState::Transferring).and(conds), feeder)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::running::RunningSet;
    use crate::domain::ports::EntityStore;
    use crate::infrastructure::world::{InMemoryWorld, fixtures};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_scan_marks_every_good_across_pages() {
        let world = InMemoryWorld::new();
        for i in 0..5 {
            world
                .goods
                .insert(fixtures::good(&format!("g{i}"), "1", "1", BenefitState::Transferring))
                .await;
        }
        let sentinel = TransferringSentinel::new(world.services()).page_limit(2);
        let (tx, mut rx) = mpsc::channel(16);
        let running = Arc::new(RunningSet::new());
        let feeder = Feeder::new("benefit_transferring", running.clone(), tx, CancellationToken::new());

        sentinel.scan(&feeder).await.unwrap();
        // Nothing is left to mark the second time.
        sentinel.scan(&feeder).await.unwrap();
        drop(feeder);

        let mut received = Vec::new();
        while let Some(good) = rx.recv().await {
            assert_eq!(good.reward_state, BenefitState::CheckTransferring);
            received.push(good.id);
        }
        assert_eq!(received.len(), 5);
        for good in world.goods.all().await {
            assert_eq!(good.reward_state, BenefitState::CheckTransferring);
        }
        assert_eq!(running.len(), 5);
    }

    #[tokio::test]
    async fn test_in_flight_good_is_not_marked() {
        let world = InMemoryWorld::new();
        world
            .goods
            .insert(fixtures::good("g1", "1", "1", BenefitState::Transferring))
            .await;
        let running = Arc::new(RunningSet::new());
        running.admit("g1", "benefit_transferring");
        let (tx, _rx) = mpsc::channel(1);
        let feeder = Feeder::new("benefit_transferring", running, tx, CancellationToken::new());

        TransferringSentinel::new(world.services())
            .scan(&feeder)
            .await
            .unwrap();
        let good = world.goods.get("g1").await.unwrap().unwrap();
        assert_eq!(good.reward_state, BenefitState::Transferring);
    }

    #[tokio::test]
    async fn test_init_scan_resumes_marked_goods() {
        let world = InMemoryWorld::new();
        world
            .goods
            .insert(fixtures::good("g1", "1", "1", BenefitState::CheckTransferring))
            .await;
        world
            .goods
            .insert(fixtures::good("g2", "1", "1", BenefitState::Done))
            .await;
        let (tx, mut rx) = mpsc::channel(4);
        let feeder = Feeder::new(
            "benefit_transferring",
            Arc::new(RunningSet::new()),
            tx,
            CancellationToken::new(),
        );

        TransferringSentinel::new(world.services())
            .init_scan(&feeder)
            .await
            .unwrap();
        drop(feeder);
        assert_eq!(rx.recv().await.unwrap().id, "g1");
        assert!(rx.recv().await.is_none());
    }
}

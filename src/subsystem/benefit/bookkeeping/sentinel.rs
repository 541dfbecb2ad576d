use crate::application::scanner::{Feeder, Scanner, scan_store};
use crate::domain::cond::Conds;
use crate::domain::good::{BenefitState, Good};
use crate::error::Result;
use crate::subsystem::Services;
use async_trait::async_trait;
use std::sync::Arc;

pub struct BookKeepingSentinel {
    services: Arc<Services>,
}

impl BookKeepingSentinel {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    fn conds() -> Conds {
        Conds::new().eq("reward_state", BenefitState::UserBookKeeping)
    }
}

#[async_trait]
impl Scanner<Good> for BookKeepingSentinel {
    async fn scan(&self, feeder: &Feeder<Good>) -> Result<()> {
        scan_store(self.services.goods.clone(), Self::conds(), feeder).await?;
        Ok(())
    }

    async fn trigger_scan(&self, conds: &Conds, feeder: &Feeder<Good>) -> Result<()> {
        scan_store(self.services.goods.clone(), Self::conds().and(conds), feeder).await?;
        Ok(())
    }
}

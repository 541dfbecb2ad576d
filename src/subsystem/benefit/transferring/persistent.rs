use super::types::PersistentGood;
use crate::application::persistent::Persistenter;
use crate::domain::amount::Amount;
use crate::domain::good::GoodReq;
use crate::domain::tx::{TxReq, TxState, TxType};
use crate::error::Result;
use crate::subsystem::Services;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub struct TransferringPersistent {
    services: Arc<Services>,
}

impl TransferringPersistent {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Persistenter<PersistentGood> for TransferringPersistent {
    async fn update(&self, p: &mut PersistentGood) -> Result<()> {
        // The transfer goes first so a failed good update retries with the
        // same transaction id.
        if let Some(transfer) = &p.platform_transfer {
            let tid = p
                .platform_tid
                .get_or_insert_with(|| Uuid::new_v4().to_string())
                .clone();
            let amount = Amount::positive(transfer.amount)?;
            let req = TxReq {
                id: Some(tid),
                coin_type_id: Some(p.good.coin_type_id.clone()),
                from_account_id: Some(transfer.from_account_id.clone()),
                to_account_id: Some(transfer.to_account_id.clone()),
                amount: Some(amount.to_string()),
                fee_amount: Some("0".to_string()),
                state: Some(TxState::Created),
                tx_type: Some(TxType::PlatformBenefit),
                extra: Some(transfer.extra.clone()),
                ..Default::default()
            };
            self.services.txs.create(&req).await?;
        }

        let req = GoodReq {
            reward_state: Some(p.new_state),
            next_reward_start_amount: p.next_start_amount.map(|v| v.normalize().to_string()),
            platform_tid: p.platform_tid.clone(),
            ..Default::default()
        };
        self.services.goods.update(&p.good.id, &req).await?;
        Ok(())
    }
}

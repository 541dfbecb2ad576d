use crate::domain::coin::{Coin, PlatformAccount};
use crate::domain::deposit::DepositAccount;
use crate::domain::good::{AppGood, Good, RequiredGood};
use crate::domain::order::Order;
use crate::domain::tx::Tx;
use crate::error::Result;
use crate::infrastructure::world::InMemoryWorld;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// On-chain balance of an address.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Balance {
    pub coin_name: String,
    pub address: String,
    pub amount: Decimal,
}

/// Initial contents of every in-memory store, read from JSON.
///
/// Every collection is optional, and so is every field of a record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldFixture {
    pub coins: Vec<Coin>,
    pub platform_accounts: Vec<PlatformAccount>,
    pub deposit_accounts: Vec<DepositAccount>,
    pub goods: Vec<Good>,
    pub app_goods: Vec<AppGood>,
    pub required_goods: Vec<RequiredGood>,
    pub orders: Vec<Order>,
    pub txs: Vec<Tx>,
    pub balances: Vec<Balance>,
}

impl WorldFixture {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Builds a world holding exactly this fixture.
    pub async fn into_world(self) -> InMemoryWorld {
        let world = InMemoryWorld::new();
        for row in self.coins {
            world.coins.insert(row).await;
        }
        for row in self.platform_accounts {
            world.platform_accounts.insert(row).await;
        }
        for row in self.deposit_accounts {
            world.deposit_accounts.insert(row).await;
        }
        for row in self.goods {
            world.goods.insert(row).await;
        }
        for row in self.app_goods {
            world.app_goods.insert(row).await;
        }
        for row in self.required_goods {
            world.required_goods.insert(row).await;
        }
        for row in self.orders {
            world.orders.insert(row).await;
        }
        for row in self.txs {
            world.txs.insert(row).await;
        }
        for balance in self.balances {
            world
                .chain
                .set_balance(&balance.coin_name, &balance.address, balance.amount);
        }
        world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deposit::LockedBy;
    use crate::domain::ports::{ChainProxy, EntityStore};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_sparse_fixture() {
        let raw = r#"{
            "deposit_accounts": [{"id": "d1", "incoming": "10", "locked_by": "Collecting"}],
            "balances": [{"coin_name": "usdt", "address": "d1-addr", "amount": "10"}]
        }"#;
        let world = WorldFixture::from_json(raw).unwrap().into_world().await;

        let account = world.deposit_accounts.get("d1").await.unwrap().unwrap();
        assert_eq!(account.incoming, "10");
        assert_eq!(account.outcoming, "");
        assert_eq!(account.locked_by, LockedBy::Collecting);
        assert!(world.goods.all().await.is_empty());
        assert_eq!(
            world.chain.get_balance("usdt", "d1-addr").await.unwrap(),
            Some(dec!(10))
        );
    }

    #[test]
    fn test_malformed_fixture() {
        assert!(WorldFixture::from_json(r#"{"coins": 3}"#).is_err());
    }
}

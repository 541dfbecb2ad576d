use super::in_memory::{InMemoryChain, InMemoryLock, InMemoryStore, RecordingSink};
use crate::domain::coin::{Coin, PlatformAccount};
use crate::domain::deposit::DepositAccount;
use crate::domain::good::{AppGood, Good, RequiredGood};
use crate::domain::ledger::Statement;
use crate::domain::order::Order;
use crate::domain::tx::Tx;
use crate::subsystem::Services;
use std::sync::Arc;

/// Every collaborator of the business modules backed by memory.
#[derive(Default, Clone)]
pub struct InMemoryWorld {
    pub goods: InMemoryStore<Good>,
    pub app_goods: InMemoryStore<AppGood>,
    pub required_goods: InMemoryStore<RequiredGood>,
    pub orders: InMemoryStore<Order>,
    pub statements: InMemoryStore<Statement>,
    pub txs: InMemoryStore<Tx>,
    pub coins: InMemoryStore<Coin>,
    pub platform_accounts: InMemoryStore<PlatformAccount>,
    pub deposit_accounts: InMemoryStore<DepositAccount>,
    pub locks: InMemoryLock,
    pub chain: InMemoryChain,
    pub sink: RecordingSink,
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Services view sharing this world's state.
    pub fn services(&self) -> Arc<Services> {
        Arc::new(Services {
            goods: Arc::new(self.goods.clone()),
            app_goods: Arc::new(self.app_goods.clone()),
            required_goods: Arc::new(self.required_goods.clone()),
            orders: Arc::new(self.orders.clone()),
            statements: Arc::new(self.statements.clone()),
            txs: Arc::new(self.txs.clone()),
            coins: Arc::new(self.coins.clone()),
            platform_accounts: Arc::new(self.platform_accounts.clone()),
            deposit_accounts: Arc::new(self.deposit_accounts.clone()),
            locks: Arc::new(self.locks.clone()),
            chain: Arc::new(self.chain.clone()),
            sink: Arc::new(self.sink.clone()),
        })
    }
}

/// Ready-made records for tests and demos.
pub mod fixtures {
    use super::*;
    use crate::domain::coin::AccountUsedFor;
    use crate::domain::good::BenefitState;
    use crate::domain::order::OrderBenefitState;
    use crate::subsystem::benefit::reward::LEGACY_TECHNIQUE_FEE_TIMESTAMP;

    pub fn coin(id: &str) -> Coin {
        Coin {
            id: id.to_string(),
            ent_id: id.to_string(),
            name: id.to_string(),
            reserved_amount: "1".to_string(),
            least_transfer_amount: "0.5".to_string(),
            fee_coin_type_id: String::new(),
            fee_coin_name: String::new(),
        }
    }

    pub fn platform_account(coin_type_id: &str, used_for: AccountUsedFor, name: &str) -> PlatformAccount {
        PlatformAccount {
            id: format!("{name}-{coin_type_id}"),
            ent_id: format!("{name}-{coin_type_id}"),
            coin_type_id: coin_type_id.to_string(),
            used_for,
            account_id: format!("{name}-acc"),
            address: format!("{name}-addr"),
            backup: false,
            active: true,
            locked: false,
            blocked: false,
        }
    }

    pub fn deposit_account(id: &str, incoming: &str, outcoming: &str) -> DepositAccount {
        DepositAccount {
            id: id.to_string(),
            ent_id: id.to_string(),
            app_id: "app".to_string(),
            user_id: format!("user-{id}"),
            coin_type_id: "usdt".to_string(),
            account_id: format!("{id}-acc"),
            address: format!("{id}-addr"),
            incoming: incoming.to_string(),
            outcoming: outcoming.to_string(),
            ..Default::default()
        }
    }

    /// A `usdt` coin with its collector, user benefit and platform cold
    /// accounts.
    pub async fn seed_deposit_world(world: &InMemoryWorld) {
        world.coins.insert(coin("usdt")).await;
        for (used_for, name) in [
            (AccountUsedFor::PaymentCollector, "collector"),
            (AccountUsedFor::UserBenefitHot, "user-hot"),
            (AccountUsedFor::PlatformBenefitCold, "platform-cold"),
        ] {
            world
                .platform_accounts
                .insert(platform_account("usdt", used_for, name))
                .await;
        }
    }

    /// A good in `state` rewarding `reward` over `total_units` at time 100.
    pub fn good(id: &str, total_units: &str, reward: &str, state: BenefitState) -> Good {
        Good {
            id: id.to_string(),
            ent_id: id.to_string(),
            coin_type_id: "usdt".to_string(),
            total_units: total_units.to_string(),
            created_at: LEGACY_TECHNIQUE_FEE_TIMESTAMP + 1,
            reward_state: state,
            last_reward_at: 100,
            last_reward_amount: reward.to_string(),
            next_reward_start_amount: reward.to_string(),
            ..Default::default()
        }
    }

    pub fn app_good(id: &str, app_id: &str, good_id: &str) -> AppGood {
        AppGood {
            id: id.to_string(),
            ent_id: id.to_string(),
            app_id: app_id.to_string(),
            good_id: good_id.to_string(),
            technical_fee_ratio: "0".to_string(),
            ..Default::default()
        }
    }

    /// A calculated order of `app_good` for the reward at time 100.
    pub fn order(id: &str, app_good: &AppGood, units: &str) -> Order {
        Order {
            id: id.to_string(),
            ent_id: id.to_string(),
            app_id: app_good.app_id.clone(),
            user_id: format!("user-{id}"),
            good_id: app_good.good_id.clone(),
            app_good_id: app_good.id.clone(),
            units: units.to_string(),
            benefit_state: OrderBenefitState::Calculated,
            last_benefit_at: 100,
        }
    }
}

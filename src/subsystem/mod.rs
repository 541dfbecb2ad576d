//! Business modules running on the pipeline engine.
//!
//! Each module is a scanner, executor, persistenter and notifier for one
//! actionable state. [`register_all`] wires them into a
//! [`Scheduler`](crate::application::scheduler::Scheduler).

pub mod benefit;
pub mod deposit;
pub mod notif;
pub mod txqueue;

use crate::application::running::RunningSet;
use crate::application::scheduler::{Scheduler, Subsystem};
use crate::config::SchedulerConfig;
use crate::domain::coin::{AccountUsedFor, Coin, PlatformAccount};
use crate::domain::cond::Conds;
use crate::domain::deposit::DepositAccount;
use crate::domain::good::{AppGood, Good, RequiredGood};
use crate::domain::ledger::Statement;
use crate::domain::order::Order;
use crate::domain::ports::{ChainRef, LockRef, SinkRef, StoreRef};
use crate::domain::tx::Tx;
use crate::error::{Result, SchedulerError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// External collaborators shared by every module.
#[derive(Clone)]
pub struct Services {
    pub goods: StoreRef<Good>,
    pub app_goods: StoreRef<AppGood>,
    pub required_goods: StoreRef<RequiredGood>,
    pub orders: StoreRef<Order>,
    pub statements: StoreRef<Statement>,
    pub txs: StoreRef<Tx>,
    pub coins: StoreRef<Coin>,
    pub platform_accounts: StoreRef<PlatformAccount>,
    pub deposit_accounts: StoreRef<DepositAccount>,
    pub locks: LockRef,
    pub chain: ChainRef,
    pub sink: SinkRef,
}

impl Services {
    pub async fn coin(&self, coin_type_id: &str) -> Result<Coin> {
        self.coins
            .get(coin_type_id)
            .await?
            .ok_or_else(|| SchedulerError::ValidationError(format!("invalid coin {coin_type_id}")))
    }

    /// The usable platform account of `coin_type_id` dedicated to `used_for`.
    pub async fn platform_account(
        &self,
        coin_type_id: &str,
        used_for: AccountUsedFor,
    ) -> Result<PlatformAccount> {
        let conds = Conds::new()
            .eq("coin_type_id", coin_type_id)
            .eq("used_for", used_for)
            .eq("backup", false)
            .eq("active", true)
            .eq("locked", false)
            .eq("blocked", false);
        self.platform_accounts.get_only(&conds).await?.ok_or_else(|| {
            SchedulerError::ValidationError(format!(
                "invalid {used_for:?} account for coin {coin_type_id}"
            ))
        })
    }
}

/// Everything a module factory needs.
#[derive(Clone)]
pub struct Context {
    pub services: Arc<Services>,
    pub config: Arc<SchedulerConfig>,
    pub running: Arc<RunningSet>,
}

type BuildFn = fn(&Context, &CancellationToken) -> Result<Box<dyn Subsystem>>;

/// Registers every business module with `scheduler`.
pub fn register_all(scheduler: &mut Scheduler, ctx: Context) {
    let modules: [(&str, BuildFn); 5] = [
        (benefit::bookkeeping::SUBSYSTEM, benefit::bookkeeping::subsystem),
        (benefit::transferring::SUBSYSTEM, benefit::transferring::subsystem),
        (deposit::transfer::SUBSYSTEM, deposit::transfer::subsystem),
        (deposit::finish::SUBSYSTEM, deposit::finish::subsystem),
        (txqueue::created::SUBSYSTEM, txqueue::created::subsystem),
    ];
    for (name, build) in modules {
        let ctx = ctx.clone();
        scheduler.register(name, Box::new(move |cancel| build(&ctx, cancel)));
    }
}

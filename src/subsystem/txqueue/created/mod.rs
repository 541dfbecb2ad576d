//! Releases created transactions to the sending queue one account at a time.

pub mod executor;
pub mod persistent;
pub mod sentinel;
pub mod types;

use crate::application::handler::{Handler, HandlerBuilder};
use crate::application::scheduler::Subsystem;
use crate::config::ModuleConfig;
use crate::domain::cond::Conds;
use crate::domain::tx::{Tx, TxState};
use crate::error::Result;
use crate::subsystem::Context;
use crate::subsystem::notif::SinkNotifier;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use types::PersistentTx;

pub const SUBSYSTEM: &str = "txqueue_created";

pub const DEFAULTS: ModuleConfig = ModuleConfig::new(10_000, 1);

/// Transactions of the same coin and sending account that block a new one.
pub(crate) fn in_flight(tx: &Tx) -> Conds {
    Conds::new()
        .eq("coin_type_id", tx.coin_type_id.as_str())
        .eq("from_account_id", tx.from_account_id.as_str())
        .is_in("state", vec![TxState::Wait, TxState::Transferring])
}

pub(crate) fn lock_key(tx: &Tx) -> String {
    format!("txqueue:{}:{}", tx.coin_type_id, tx.from_account_id)
}

pub fn handler(ctx: &Context, cancel: &CancellationToken) -> Result<Handler<Tx, PersistentTx>> {
    let module = ctx.config.module(SUBSYSTEM, DEFAULTS);
    HandlerBuilder::new(SUBSYSTEM)
        .scanner(Arc::new(sentinel::CreatedSentinel::new(ctx.services.clone())))
        .exec(Arc::new(executor::CreatedExecutor::new(ctx.services.clone())))
        .persistenter(Arc::new(persistent::CreatedPersistent::new(
            ctx.services.clone(),
        )))
        .notify(Arc::new(SinkNotifier::new(ctx.services.sink.clone())))
        .running(ctx.running.clone())
        .scan_interval(module.scan_interval())
        .executor_number(module.executor_number)
        .retry(ctx.config.retry_policy())
        .shutdown_timeout(ctx.config.shutdown_timeout())
        .build(cancel)
}

pub fn subsystem(ctx: &Context, cancel: &CancellationToken) -> Result<Box<dyn Subsystem>> {
    Ok(Box::new(handler(ctx, cancel)?))
}

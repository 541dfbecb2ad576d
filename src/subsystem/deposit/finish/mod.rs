//! Unlocks deposit accounts once their collection transaction is final.

pub mod executor;
pub mod persistent;
pub mod sentinel;
pub mod types;

use crate::application::handler::{Handler, HandlerBuilder};
use crate::application::scheduler::Subsystem;
use crate::config::ModuleConfig;
use crate::domain::deposit::DepositAccount;
use crate::error::Result;
use crate::subsystem::Context;
use crate::subsystem::notif::SinkNotifier;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use types::PersistentAccount;

pub const SUBSYSTEM: &str = "deposit_finish";

pub const DEFAULTS: ModuleConfig = ModuleConfig::new(30_000, 1);

/// Seconds an unlocked account waits before it is considered for
/// collection again.
pub const SCAN_DEFERRAL_SECS: u32 = 60 * 60;

pub fn handler(
    ctx: &Context,
    cancel: &CancellationToken,
) -> Result<Handler<DepositAccount, PersistentAccount>> {
    let module = ctx.config.module(SUBSYSTEM, DEFAULTS);
    HandlerBuilder::new(SUBSYSTEM)
        .scanner(Arc::new(sentinel::FinishSentinel::new(ctx.services.clone())))
        .exec(Arc::new(executor::FinishExecutor::new(ctx.services.clone())))
        .persistenter(Arc::new(persistent::FinishPersistent::new(
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

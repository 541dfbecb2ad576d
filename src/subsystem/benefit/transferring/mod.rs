//! Follows a good's reward transaction to completion and sweeps the
//! platform's share to cold storage.

pub mod executor;
pub mod persistent;
pub mod sentinel;
pub mod types;

use crate::application::handler::{Handler, HandlerBuilder};
use crate::application::scheduler::Subsystem;
use crate::config::ModuleConfig;
use crate::domain::good::Good;
use crate::error::Result;
use crate::subsystem::Context;
use crate::subsystem::notif::SinkNotifier;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use types::PersistentGood;

pub const SUBSYSTEM: &str = "benefit_transferring";

pub const DEFAULTS: ModuleConfig = ModuleConfig::new(30_000, 1);

pub fn handler(ctx: &Context, cancel: &CancellationToken) -> Result<Handler<Good, PersistentGood>> {
    let module = ctx.config.module(SUBSYSTEM, DEFAULTS);
    HandlerBuilder::new(SUBSYSTEM)
        .scanner(Arc::new(sentinel::TransferringSentinel::new(
            ctx.services.clone(),
        )))
        .exec(Arc::new(executor::TransferringExecutor::new(
            ctx.services.clone(),
        )))
        .persistenter(Arc::new(persistent::TransferringPersistent::new(
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

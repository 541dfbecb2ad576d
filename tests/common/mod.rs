#![allow(dead_code)]

use fundflow::application::running::RunningSet;
use fundflow::application::scheduler::Scheduler;
use fundflow::config::{ModuleConfig, RetryConfig, SchedulerConfig};
use fundflow::infrastructure::world::InMemoryWorld;
use fundflow::subsystem::{Context, register_all};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const ALL_SUBSYSTEMS: [&str; 5] = [
    "benefit_bookkeeping",
    "benefit_transferring",
    "deposit_transfer",
    "deposit_finish",
    "txqueue_created",
];

/// Every subsystem scanning every `interval_ms`, with fast retries.
pub fn fast_config(interval_ms: u64, subsystems: &[&str]) -> SchedulerConfig {
    SchedulerConfig {
        subsystems: subsystems.iter().map(|s| s.to_string()).collect(),
        modules: ALL_SUBSYSTEMS
            .iter()
            .map(|name| (name.to_string(), ModuleConfig::new(interval_ms, 2)))
            .collect(),
        retry: RetryConfig {
            max_attempts: 3,
            delay_ms: 10,
        },
        running_concurrency: None,
        shutdown_timeout_ms: 1_000,
    }
}

pub fn context(world: &InMemoryWorld, config: &SchedulerConfig) -> Context {
    Context {
        services: world.services(),
        config: Arc::new(config.clone()),
        running: Arc::new(RunningSet::new()),
    }
}

/// A scheduler over `world` with every module registered but none started.
pub fn scheduler(ctx: Context) -> Scheduler {
    let mut scheduler = Scheduler::new(CancellationToken::new());
    register_all(&mut scheduler, ctx);
    scheduler
}

/// Polls `check` until it holds or `timeout` elapses.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

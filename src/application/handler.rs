use super::executor::{Exec, Stages, spawn_workers};
use super::feed::{FeedError, cancelable_feed};
use super::message::{Message, Persistent};
use super::notif::{Notify, spawn_notifier};
use super::persistent::{Persistenter, spawn_persistenter};
use super::retry::RetryPolicy;
use super::running::RunningSet;
use super::scanner::{Feeder, Scanner};
use crate::domain::cond::Conds;
use crate::domain::entity::Entity;
use crate::error::{Result, SchedulerError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

const TRIGGER_CAPACITY: usize = 16;

/// Collects the collaborators of a [`Handler`].
pub struct HandlerBuilder<E, P> {
    subsystem: String,
    scanner: Option<Arc<dyn Scanner<E>>>,
    exec: Option<Arc<dyn Exec<E, P>>>,
    persistenter: Option<Arc<dyn Persistenter<P>>>,
    notify: Option<Arc<dyn Notify<P>>>,
    running: Option<Arc<RunningSet>>,
    scan_interval: Duration,
    executor_number: usize,
    retry: RetryPolicy,
    shutdown_timeout: Duration,
}

impl<E, P> HandlerBuilder<E, P>
where
    E: Entity,
    P: Persistent<Entity = E>,
{
    pub fn new(subsystem: impl Into<String>) -> Self {
        Self {
            subsystem: subsystem.into(),
            scanner: None,
            exec: None,
            persistenter: None,
            notify: None,
            running: None,
            scan_interval: Duration::from_secs(30),
            executor_number: 1,
            retry: RetryPolicy::default(),
            shutdown_timeout: Duration::from_secs(5),
        }
    }

    pub fn scanner(mut self, scanner: Arc<dyn Scanner<E>>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    pub fn exec(mut self, exec: Arc<dyn Exec<E, P>>) -> Self {
        self.exec = Some(exec);
        self
    }

    pub fn persistenter(mut self, persistenter: Arc<dyn Persistenter<P>>) -> Self {
        self.persistenter = Some(persistenter);
        self
    }

    pub fn notify(mut self, notify: Arc<dyn Notify<P>>) -> Self {
        self.notify = Some(notify);
        self
    }

    pub fn running(mut self, running: Arc<RunningSet>) -> Self {
        self.running = Some(running);
        self
    }

    pub fn scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    pub fn executor_number(mut self, number: usize) -> Self {
        self.executor_number = number;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Validates the configuration and wires the handler's channels.
    ///
    /// # Arguments
    ///
    /// * `cancel` - Parent token; the handler stops when it or the handler's
    ///   own child token is cancelled.
    pub fn build(self, cancel: &CancellationToken) -> Result<Handler<E, P>> {
        let missing = |what: &str| {
            SchedulerError::ConfigError(format!("{}: missing {what}", self.subsystem))
        };
        let scanner = self.scanner.clone().ok_or_else(|| missing("scanner"))?;
        let exec = self.exec.clone().ok_or_else(|| missing("executor"))?;
        let persistenter = self
            .persistenter
            .clone()
            .ok_or_else(|| missing("persistenter"))?;
        let running = self.running.clone().ok_or_else(|| missing("running set"))?;
        if self.executor_number == 0 {
            return Err(SchedulerError::ConfigError(format!(
                "{}: executor number must be positive",
                self.subsystem
            )));
        }
        if self.scan_interval.is_zero() {
            return Err(SchedulerError::ConfigError(format!(
                "{}: scan interval must be positive",
                self.subsystem
            )));
        }

        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_CAPACITY);
        Ok(Handler {
            subsystem: Arc::from(self.subsystem.as_str()),
            cancel: cancel.child_token(),
            running,
            trigger_tx,
            shutdown_timeout: self.shutdown_timeout,
            wiring: Some(Wiring {
                scanner,
                exec,
                persistenter,
                notify: self.notify,
                scan_interval: self.scan_interval,
                executor_number: self.executor_number,
                retry: self.retry,
                trigger_rx,
            }),
            tasks: Vec::new(),
        })
    }
}

struct Wiring<E, P> {
    scanner: Arc<dyn Scanner<E>>,
    exec: Arc<dyn Exec<E, P>>,
    persistenter: Arc<dyn Persistenter<P>>,
    notify: Option<Arc<dyn Notify<P>>>,
    scan_interval: Duration,
    executor_number: usize,
    retry: RetryPolicy,
    trigger_rx: mpsc::Receiver<Conds>,
}

/// One business module's pipeline: scan, execute, persist, notify, release.
pub struct Handler<E, P> {
    subsystem: Arc<str>,
    cancel: CancellationToken,
    running: Arc<RunningSet>,
    trigger_tx: mpsc::Sender<Conds>,
    shutdown_timeout: Duration,
    wiring: Option<Wiring<E, P>>,
    tasks: Vec<JoinHandle<()>>,
}

impl<E, P> Handler<E, P>
where
    E: Entity,
    P: Persistent<Entity = E>,
{
    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    /// Starts every loop of the pipeline. A handler runs at most once.
    pub fn run(&mut self) -> Result<()> {
        let wiring = self.wiring.take().ok_or_else(|| {
            SchedulerError::ConfigError(format!("{}: handler already started", self.subsystem))
        })?;

        let (dispatch_tx, dispatch_rx) = mpsc::channel::<E>(1);
        let (persist_tx, persist_rx) = mpsc::channel::<Message<E, P>>(1);
        let (done_tx, done_rx) = mpsc::unbounded_channel::<Message<E, P>>();

        let notif_tx = wiring.notify.map(|notify| {
            let (notif_tx, notif_rx) = mpsc::channel::<P>(1);
            self.tasks.push(spawn_notifier(
                self.subsystem.clone(),
                notify,
                notif_rx,
                self.cancel.clone(),
            ));
            notif_tx
        });

        let stages = Stages::new(
            self.subsystem.clone(),
            persist_tx,
            notif_tx,
            done_tx,
            self.cancel.clone(),
        );

        self.tasks.push(spawn_releaser(
            self.subsystem.clone(),
            self.running.clone(),
            done_rx,
        ));
        self.tasks.push(spawn_persistenter(
            wiring.persistenter,
            persist_rx,
            stages.clone(),
            wiring.retry,
        ));
        self.tasks.extend(spawn_workers(
            wiring.executor_number,
            wiring.exec,
            dispatch_rx,
            stages,
        ));

        let feeder = Feeder::new(
            self.subsystem.to_string(),
            self.running.clone(),
            dispatch_tx,
            self.cancel.clone(),
        );
        self.tasks.push(spawn_scanner(
            self.subsystem.clone(),
            wiring.scanner,
            feeder,
            wiring.scan_interval,
            wiring.trigger_rx,
            self.cancel.clone(),
        ));

        tracing::info!(
            subsystem = %self.subsystem,
            executors = wiring.executor_number,
            interval_ms = wiring.scan_interval.as_millis() as u64,
            "subsystem started"
        );
        Ok(())
    }

    /// Queues an out-of-band scan restricted by `conds`.
    pub async fn trigger(&self, conds: Conds) -> Result<()> {
        cancelable_feed(&self.cancel, &self.trigger_tx, conds)
            .await
            .map_err(|e| match e {
                FeedError::Cancelled(_) => SchedulerError::Cancelled,
                FeedError::Closed(_) => SchedulerError::ChannelClosed,
            })
    }

    /// Stops every loop, waiting up to the shutdown timeout, and releases
    /// whatever the subsystem still holds in the running set.
    ///
    /// Safe to call on a handler that never ran, and more than once.
    pub async fn finalize(&mut self) {
        self.cancel.cancel();
        let deadline = tokio::time::Instant::now() + self.shutdown_timeout;
        for task in self.tasks.drain(..) {
            let abort = task.abort_handle();
            if tokio::time::timeout_at(deadline, task).await.is_err() {
                tracing::warn!(subsystem = %self.subsystem, "task did not stop in time");
                abort.abort();
            }
        }
        let released = self.running.release_subsystem(&self.subsystem);
        if released > 0 {
            tracing::info!(subsystem = %self.subsystem, released, "released in-flight entities");
        }
        tracing::info!(subsystem = %self.subsystem, "subsystem stopped");
    }
}

/// Finalizes `handler` if there is one.
pub async fn finalize_opt<E, P>(handler: Option<&mut Handler<E, P>>)
where
    E: Entity,
    P: Persistent<Entity = E>,
{
    if let Some(handler) = handler {
        handler.finalize().await;
    }
}

fn spawn_releaser<E, P>(
    subsystem: Arc<str>,
    running: Arc<RunningSet>,
    mut done_rx: mpsc::UnboundedReceiver<Message<E, P>>,
) -> JoinHandle<()>
where
    E: Entity,
    P: Persistent<Entity = E>,
{
    // Runs until every sender is gone so late done signals are still honoured.
    tokio::spawn(async move {
        while let Some(msg) = done_rx.recv().await {
            running.release(msg.object_id());
        }
        tracing::debug!(subsystem = %subsystem, "releaser stopped");
    })
}

fn spawn_scanner<E: Entity>(
    subsystem: Arc<str>,
    scanner: Arc<dyn Scanner<E>>,
    feeder: Feeder<E>,
    interval: Duration,
    mut trigger_rx: mpsc::Receiver<Conds>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = scanner.init_scan(&feeder).await {
            tracing::warn!(subsystem = %subsystem, error = %e, "init scan failed");
        }
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(conds) = trigger_rx.recv() => {
                    if let Err(e) = scanner.trigger_scan(&conds, &feeder).await {
                        tracing::warn!(subsystem = %subsystem, error = %e, "trigger scan failed");
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = scanner.scan(&feeder).await {
                        tracing::warn!(subsystem = %subsystem, error = %e, "scan failed");
                    }
                }
            }
        }
        tracing::debug!(subsystem = %subsystem, "scanner stopped");
    })
}

use super::handler::Handler;
use super::message::Persistent;
use crate::config::SchedulerConfig;
use crate::domain::cond::Conds;
use crate::domain::entity::Entity;
use crate::error::{Result, SchedulerError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

/// A handler with its entity types erased, as held by the [`Scheduler`].
#[async_trait]
pub trait Subsystem: Send + Sync {
    fn name(&self) -> &str;
    fn run(&mut self) -> Result<()>;
    async fn trigger(&self, conds: Conds) -> Result<()>;
    async fn finalize(&mut self);
}

#[async_trait]
impl<E, P> Subsystem for Handler<E, P>
where
    E: Entity,
    P: Persistent<Entity = E>,
{
    fn name(&self) -> &str {
        self.subsystem()
    }

    fn run(&mut self) -> Result<()> {
        Handler::run(self)
    }

    async fn trigger(&self, conds: Conds) -> Result<()> {
        Handler::trigger(self, conds).await
    }

    async fn finalize(&mut self) {
        Handler::finalize(self).await
    }
}

/// Builds a subsystem's handler under the given parent token.
pub type SubsystemFactory =
    Box<dyn Fn(&CancellationToken) -> Result<Box<dyn Subsystem>> + Send + Sync>;

/// Owns one handler per enabled subsystem.
pub struct Scheduler {
    cancel: CancellationToken,
    factories: BTreeMap<String, SubsystemFactory>,
    enabled: BTreeMap<String, Box<dyn Subsystem>>,
}

impl Scheduler {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            factories: BTreeMap::new(),
            enabled: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, factory: SubsystemFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Starts every registered subsystem `config` supports.
    ///
    /// A subsystem that fails to build is logged and left stopped; the others
    /// still start. Returns the names that failed.
    pub fn initialize(&mut self, config: &SchedulerConfig) -> Vec<String> {
        for name in &config.subsystems {
            if !self.factories.contains_key(name) {
                tracing::warn!(subsystem = %name, "unknown subsystem in configuration");
            }
        }
        let names: Vec<String> = self
            .factories
            .keys()
            .filter(|name| config.supports(name))
            .cloned()
            .collect();
        let mut failed = Vec::new();
        for name in names {
            if let Err(e) = self.enable(&name) {
                tracing::error!(subsystem = %name, error = %e, "subsystem not started");
                failed.push(name);
            }
        }
        failed
    }

    /// Builds and starts `name`. Enabling a running subsystem is a no-op.
    pub fn enable(&mut self, name: &str) -> Result<()> {
        if self.enabled.contains_key(name) {
            return Ok(());
        }
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| SchedulerError::ConfigError(format!("unknown subsystem {name}")))?;
        let mut subsystem = factory(&self.cancel)?;
        subsystem.run()?;
        self.enabled.insert(name.to_string(), subsystem);
        Ok(())
    }

    /// Stops `name` if it is running.
    pub async fn disable(&mut self, name: &str) {
        if let Some(mut subsystem) = self.enabled.remove(name) {
            subsystem.finalize().await;
        }
    }

    pub async fn trigger(&self, name: &str, conds: Conds) -> Result<()> {
        let subsystem = self
            .enabled
            .get(name)
            .ok_or_else(|| SchedulerError::ConfigError(format!("subsystem {name} is not enabled")))?;
        subsystem.trigger(conds).await
    }

    pub fn enabled(&self) -> Vec<&str> {
        self.enabled.keys().map(String::as_str).collect()
    }

    pub fn registered(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Stops every subsystem.
    pub async fn finalize(&mut self) {
        self.cancel.cancel();
        for (_, mut subsystem) in std::mem::take(&mut self.enabled) {
            subsystem.finalize().await;
        }
    }
}

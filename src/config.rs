use crate::application::retry::RetryPolicy;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Scan cadence and parallelism of one subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    pub scan_interval_ms: u64,
    pub executor_number: usize,
}

impl ModuleConfig {
    pub const fn new(scan_interval_ms: u64, executor_number: usize) -> Self {
        Self {
            scan_interval_ms,
            executor_number,
        }
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self::new(30_000, 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            delay_ms: policy.delay.as_millis() as u64,
        }
    }
}

/// Scheduler settings, usually read from a JSON file.
///
/// Every field is optional in the file:
///
/// ```json
/// {
///   "subsystems": ["deposit_transfer", "deposit_finish"],
///   "modules": { "deposit_transfer": { "scan_interval_ms": 5000 } },
///   "retry": { "max_attempts": 5 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Subsystems to start; empty starts all of them.
    pub subsystems: Vec<String>,
    pub modules: BTreeMap<String, ModuleConfig>,
    pub retry: RetryConfig,
    /// Cap on entities in flight across all subsystems.
    pub running_concurrency: Option<usize>,
    pub shutdown_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            subsystems: Vec::new(),
            modules: BTreeMap::new(),
            retry: RetryConfig::default(),
            running_concurrency: None,
            shutdown_timeout_ms: 5_000,
        }
    }
}

impl SchedulerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn supports(&self, subsystem: &str) -> bool {
        self.subsystems.is_empty() || self.subsystems.iter().any(|s| s == subsystem)
    }

    /// Settings of `subsystem`, falling back to the module's own defaults.
    pub fn module(&self, subsystem: &str, default: ModuleConfig) -> ModuleConfig {
        self.modules.get(subsystem).copied().unwrap_or(default)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            delay: Duration::from_millis(self.retry.delay_ms),
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

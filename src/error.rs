use thiserror::Error;

/// Errors raised by the scheduler, its stages and the business modules.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Store error: {0}")]
    StoreError(String),
    #[error("Lock error: {0}")]
    LockError(String),
    #[error("Chain error: {0}")]
    ChainError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Invalid {field}: {value}")]
    DecimalError { field: &'static str, value: String },
    #[error("Notification error: {0}")]
    NotificationError(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Channel closed")]
    ChannelClosed,
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SchedulerError {
    /// Whether the failure comes from an external system and the same work
    /// may succeed when attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::StoreError(_)
                | Self::LockError(_)
                | Self::ChainError(_)
                | Self::NotificationError(_)
                | Self::IoError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

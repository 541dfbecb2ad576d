use super::SUBSYSTEM;
use crate::application::message::Persistent;
use crate::domain::deposit::DepositAccount;
use crate::domain::ports::{NotifResult, Notification};
use crate::domain::tx::TxState;
use crate::error::SchedulerError;
use crate::subsystem::notif::Notifiable;
use rust_decimal::Decimal;
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
pub struct PersistentAccount {
    pub account: DepositAccount,
    /// State of the collection transaction, `None` when it does not exist.
    pub collect_state: Option<TxState>,
    /// Amount the collection moved off the address.
    pub collected: Decimal,
    /// `outcoming` after the collection is accounted for.
    pub outcoming: Decimal,
    pub error: Option<String>,
}

impl PersistentAccount {
    pub fn new(account: DepositAccount) -> Self {
        Self {
            account,
            collect_state: None,
            collected: Decimal::ZERO,
            outcoming: Decimal::ZERO,
            error: None,
        }
    }
}

impl Persistent for PersistentAccount {
    type Entity = DepositAccount;

    fn entity(&self) -> &DepositAccount {
        &self.account
    }

    fn record_error(&mut self, error: &SchedulerError) {
        self.error = Some(error.to_string());
    }
}

impl Notifiable for PersistentAccount {
    fn notification(&self) -> Notification {
        Notification {
            subsystem: SUBSYSTEM.to_string(),
            entity_id: self.account.id.clone(),
            ent_id: self.account.ent_id.clone(),
            result: if self.error.is_some() {
                NotifResult::Fail
            } else {
                NotifResult::Success
            },
            message: self.error.clone().unwrap_or_default(),
            extra: json!({
                "collecting_tid": self.account.collecting_tid,
                "collected": self.collected.to_string(),
            }),
        }
    }
}

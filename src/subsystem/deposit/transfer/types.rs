use super::SUBSYSTEM;
use crate::application::message::Persistent;
use crate::domain::deposit::DepositAccount;
use crate::domain::ports::{NotifResult, Notification};
use crate::error::SchedulerError;
use crate::subsystem::notif::Notifiable;
use rust_decimal::Decimal;
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
pub struct PersistentAccount {
    pub account: DepositAccount,
    pub collect_account_id: String,
    pub collect_address: String,
    pub collect_amount: Decimal,
    /// Reserved id of the collection transaction, shared by every attempt.
    pub collecting_tid: Option<String>,
    pub error: Option<String>,
}

impl PersistentAccount {
    pub fn new(account: DepositAccount) -> Self {
        Self {
            account,
            collect_account_id: String::new(),
            collect_address: String::new(),
            collect_amount: Decimal::ZERO,
            collecting_tid: None,
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
            result: match self.error {
                Some(_) => NotifResult::Fail,
                None => NotifResult::Success,
            },
            message: self.error.clone().unwrap_or_default(),
            extra: json!({
                "address": self.account.address,
                "collect_amount": self.collect_amount.to_string(),
                "collecting_tid": self.collecting_tid,
            }),
        }
    }
}

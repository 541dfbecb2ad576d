use super::SUBSYSTEM;
use crate::application::message::Persistent;
use crate::domain::ports::{NotifResult, Notification};
use crate::domain::tx::Tx;
use crate::error::SchedulerError;
use crate::subsystem::notif::Notifiable;
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
pub struct PersistentTx {
    pub tx: Tx,
    pub error: Option<String>,
}

impl PersistentTx {
    pub fn new(tx: Tx) -> Self {
        Self { tx, error: None }
    }
}

impl Persistent for PersistentTx {
    type Entity = Tx;

    fn entity(&self) -> &Tx {
        &self.tx
    }

    fn record_error(&mut self, error: &SchedulerError) {
        self.error = Some(error.to_string());
    }
}

impl Notifiable for PersistentTx {
    fn notification(&self) -> Notification {
        Notification {
            subsystem: SUBSYSTEM.to_string(),
            entity_id: self.tx.id.clone(),
            ent_id: self.tx.ent_id.clone(),
            result: match self.error {
                Some(_) => NotifResult::Fail,
                None => NotifResult::Success,
            },
            message: self.error.clone().unwrap_or_default(),
            extra: json!({
                "coin_type_id": self.tx.coin_type_id,
                "from_account_id": self.tx.from_account_id,
            }),
        }
    }
}

use super::cond::{Queryable, Value};
use super::entity::{Entity, Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum LockedBy {
    #[default]
    Nobody,
    Collecting,
    Payment,
}

impl From<LockedBy> for Value {
    fn from(by: LockedBy) -> Self {
        Value::U32(by as u32)
    }
}

/// A user deposit address whose balance is periodically swept to the
/// payment collector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepositAccount {
    pub id: String,
    pub ent_id: String,
    pub app_id: String,
    pub user_id: String,
    pub coin_type_id: String,
    /// Underlying account the lock service and transactions refer to.
    pub account_id: String,
    pub address: String,
    pub incoming: String,
    pub outcoming: String,
    pub locked: bool,
    pub locked_by: LockedBy,
    pub collecting_tid: Option<String>,
    pub scannable_at: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepositAccountReq {
    pub id: Option<String>,
    pub outcoming: Option<String>,
    pub locked: Option<bool>,
    pub locked_by: Option<LockedBy>,
    /// `Some(None)` clears the collecting transaction.
    pub collecting_tid: Option<Option<String>>,
    pub scannable_at: Option<u32>,
}

impl Entity for DepositAccount {
    fn id(&self) -> &str {
        &self.id
    }

    fn ent_id(&self) -> &str {
        &self.ent_id
    }
}

impl Queryable for DepositAccount {
    fn field(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.as_str().into()),
            "ent_id" => Some(self.ent_id.as_str().into()),
            "app_id" => Some(self.app_id.as_str().into()),
            "coin_type_id" => Some(self.coin_type_id.as_str().into()),
            "account_id" => Some(self.account_id.as_str().into()),
            "locked" => Some(self.locked.into()),
            "locked_by" => Some(self.locked_by.into()),
            "scannable_at" => Some(self.scannable_at.into()),
            _ => None,
        }
    }
}

impl Record for DepositAccount {
    type Req = DepositAccountReq;

    fn req_id(req: &DepositAccountReq) -> Option<&str> {
        req.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        if self.ent_id.is_empty() {
            self.ent_id = id.clone();
        }
        self.id = id;
    }

    fn apply(&mut self, req: &DepositAccountReq) {
        if let Some(v) = &req.outcoming {
            self.outcoming = v.clone();
        }
        if let Some(v) = req.locked {
            self.locked = v;
        }
        if let Some(v) = req.locked_by {
            self.locked_by = v;
        }
        if let Some(v) = &req.collecting_tid {
            self.collecting_tid = v.clone();
        }
        if let Some(v) = req.scannable_at {
            self.scannable_at = v;
        }
    }
}

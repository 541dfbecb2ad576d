use super::cond::{Queryable, Value};
use super::entity::{Entity, Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IoType {
    #[default]
    Incoming,
    Outcoming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IoSubType {
    #[default]
    MiningBenefit,
    Payment,
}

/// A ledger entry crediting or debiting a user's balance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statement {
    pub id: String,
    pub ent_id: String,
    pub app_id: String,
    pub user_id: String,
    pub coin_type_id: String,
    pub io_type: IoType,
    pub io_sub_type: IoSubType,
    pub amount: String,
    /// JSON describing where the amount came from.
    pub io_extra: String,
    pub created_at: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementReq {
    pub id: Option<String>,
    pub app_id: Option<String>,
    pub user_id: Option<String>,
    pub coin_type_id: Option<String>,
    pub io_type: Option<IoType>,
    pub io_sub_type: Option<IoSubType>,
    pub amount: Option<String>,
    pub io_extra: Option<String>,
    pub created_at: Option<u32>,
}

impl Entity for Statement {
    fn id(&self) -> &str {
        &self.id
    }

    fn ent_id(&self) -> &str {
        &self.ent_id
    }
}

impl Queryable for Statement {
    fn field(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.as_str().into()),
            "app_id" => Some(self.app_id.as_str().into()),
            "user_id" => Some(self.user_id.as_str().into()),
            "coin_type_id" => Some(self.coin_type_id.as_str().into()),
            _ => None,
        }
    }
}

impl Record for Statement {
    type Req = StatementReq;

    fn req_id(req: &StatementReq) -> Option<&str> {
        req.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        if self.ent_id.is_empty() {
            self.ent_id = id.clone();
        }
        self.id = id;
    }

    fn apply(&mut self, req: &StatementReq) {
        if let Some(v) = &req.app_id {
            self.app_id = v.clone();
        }
        if let Some(v) = &req.user_id {
            self.user_id = v.clone();
        }
        if let Some(v) = &req.coin_type_id {
            self.coin_type_id = v.clone();
        }
        if let Some(v) = req.io_type {
            self.io_type = v;
        }
        if let Some(v) = req.io_sub_type {
            self.io_sub_type = v;
        }
        if let Some(v) = &req.amount {
            self.amount = v.clone();
        }
        if let Some(v) = &req.io_extra {
            self.io_extra = v.clone();
        }
        if let Some(v) = req.created_at {
            self.created_at = v;
        }
    }
}

use super::cond::{Queryable, Value};
use super::entity::{Entity, Record};
use serde::{Deserialize, Serialize};

/// Chain coin settings relevant to settlement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coin {
    pub id: String,
    pub ent_id: String,
    pub name: String,
    /// Amount kept on a deposit address after collection.
    pub reserved_amount: String,
    /// Smallest amount worth an on-chain transfer.
    pub least_transfer_amount: String,
    /// Coin paying the gas of transfers of this coin.
    pub fee_coin_type_id: String,
    pub fee_coin_name: String,
}

impl Entity for Coin {
    fn id(&self) -> &str {
        &self.id
    }

    fn ent_id(&self) -> &str {
        &self.ent_id
    }
}

impl Queryable for Coin {
    fn field(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.as_str().into()),
            "name" => Some(self.name.as_str().into()),
            _ => None,
        }
    }
}

impl Record for Coin {
    type Req = Coin;

    fn req_id(req: &Coin) -> Option<&str> {
        Some(req.id.as_str()).filter(|id| !id.is_empty())
    }

    fn set_id(&mut self, id: String) {
        if self.ent_id.is_empty() {
            self.ent_id = id.clone();
        }
        self.id = id;
    }

    fn apply(&mut self, req: &Coin) {
        *self = req.clone();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum AccountUsedFor {
    #[default]
    UserBenefitHot,
    PlatformBenefitCold,
    PaymentCollector,
    GasProvider,
}

impl From<AccountUsedFor> for Value {
    fn from(used_for: AccountUsedFor) -> Self {
        Value::U32(used_for as u32)
    }
}

/// An account owned by the platform rather than a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformAccount {
    pub id: String,
    pub ent_id: String,
    pub coin_type_id: String,
    pub used_for: AccountUsedFor,
    pub account_id: String,
    pub address: String,
    pub backup: bool,
    pub active: bool,
    pub locked: bool,
    pub blocked: bool,
}

impl Entity for PlatformAccount {
    fn id(&self) -> &str {
        &self.id
    }

    fn ent_id(&self) -> &str {
        &self.ent_id
    }
}

impl Queryable for PlatformAccount {
    fn field(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.as_str().into()),
            "coin_type_id" => Some(self.coin_type_id.as_str().into()),
            "used_for" => Some(self.used_for.into()),
            "account_id" => Some(self.account_id.as_str().into()),
            "backup" => Some(self.backup.into()),
            "active" => Some(self.active.into()),
            "locked" => Some(self.locked.into()),
            "blocked" => Some(self.blocked.into()),
            _ => None,
        }
    }
}

impl Record for PlatformAccount {
    type Req = PlatformAccount;

    fn req_id(req: &PlatformAccount) -> Option<&str> {
        Some(req.id.as_str()).filter(|id| !id.is_empty())
    }

    fn set_id(&mut self, id: String) {
        if self.ent_id.is_empty() {
            self.ent_id = id.clone();
        }
        self.id = id;
    }

    fn apply(&mut self, req: &PlatformAccount) {
        *self = req.clone();
    }
}

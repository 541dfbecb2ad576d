use super::cond::{Queryable, Value};
use super::entity::{Entity, Record};
use serde::{Deserialize, Serialize};

/// Lifecycle of a good's daily benefit distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum BenefitState {
    #[default]
    Wait,
    Transferring,
    CheckTransferring,
    BookKeeping,
    UserBookKeeping,
    Done,
    Fail,
}

impl From<BenefitState> for Value {
    fn from(state: BenefitState) -> Self {
        Value::U32(state as u32)
    }
}

/// A mining good whose rewards are distributed to the orders holding it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Good {
    pub id: String,
    pub ent_id: String,
    pub coin_type_id: String,
    /// Total sellable units of the good.
    pub total_units: String,
    pub created_at: u32,
    pub reward_state: BenefitState,
    pub last_reward_at: u32,
    pub last_reward_amount: String,
    pub next_reward_start_amount: String,
    /// Transaction that moved the day's reward into the user benefit account.
    pub reward_tid: Option<String>,
    /// Transaction moving the platform share out of the user benefit account.
    pub platform_tid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoodReq {
    pub id: Option<String>,
    pub reward_state: Option<BenefitState>,
    pub next_reward_start_amount: Option<String>,
    pub platform_tid: Option<String>,
}

impl Entity for Good {
    fn id(&self) -> &str {
        &self.id
    }

    fn ent_id(&self) -> &str {
        &self.ent_id
    }
}

impl Queryable for Good {
    fn field(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.as_str().into()),
            "ent_id" => Some(self.ent_id.as_str().into()),
            "coin_type_id" => Some(self.coin_type_id.as_str().into()),
            "reward_state" => Some(self.reward_state.into()),
            "last_reward_at" => Some(self.last_reward_at.into()),
            _ => None,
        }
    }
}

impl Record for Good {
    type Req = GoodReq;

    fn req_id(req: &GoodReq) -> Option<&str> {
        req.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        if self.ent_id.is_empty() {
            self.ent_id = id.clone();
        }
        self.id = id;
    }

    fn apply(&mut self, req: &GoodReq) {
        if let Some(state) = req.reward_state {
            self.reward_state = state;
        }
        if let Some(amount) = &req.next_reward_start_amount {
            self.next_reward_start_amount = amount.clone();
        }
        if let Some(tid) = &req.platform_tid {
            self.platform_tid = Some(tid.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GoodType {
    #[default]
    PowerRental,
    TechniqueServiceFee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SettlementType {
    #[default]
    SettledByPaymentAmount,
    SettledByProfit,
}

/// A good as listed by one application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppGood {
    pub id: String,
    pub ent_id: String,
    pub app_id: String,
    pub good_id: String,
    pub good_type: GoodType,
    pub settlement_type: SettlementType,
    /// Percentage charged when the good is a technique fee settled by profit.
    pub unit_price: String,
    /// Percentage charged under the legacy fee regime.
    pub technical_fee_ratio: String,
}

impl Entity for AppGood {
    fn id(&self) -> &str {
        &self.id
    }

    fn ent_id(&self) -> &str {
        &self.ent_id
    }
}

impl Queryable for AppGood {
    fn field(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.as_str().into()),
            "ent_id" => Some(self.ent_id.as_str().into()),
            "app_id" => Some(self.app_id.as_str().into()),
            "good_id" => Some(self.good_id.as_str().into()),
            "good_type" => Some(Value::U32(self.good_type as u32)),
            _ => None,
        }
    }
}

impl Record for AppGood {
    type Req = AppGood;

    fn req_id(req: &AppGood) -> Option<&str> {
        Some(req.id.as_str()).filter(|id| !id.is_empty())
    }

    fn set_id(&mut self, id: String) {
        if self.ent_id.is_empty() {
            self.ent_id = id.clone();
        }
        self.id = id;
    }

    fn apply(&mut self, req: &AppGood) {
        *self = req.clone();
    }
}

/// Binds a main good to a good that must be bought along with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequiredGood {
    pub id: String,
    pub ent_id: String,
    pub main_good_id: String,
    pub required_good_id: String,
}

impl Entity for RequiredGood {
    fn id(&self) -> &str {
        &self.id
    }

    fn ent_id(&self) -> &str {
        &self.ent_id
    }
}

impl Queryable for RequiredGood {
    fn field(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.as_str().into()),
            "main_good_id" => Some(self.main_good_id.as_str().into()),
            "required_good_id" => Some(self.required_good_id.as_str().into()),
            _ => None,
        }
    }
}

impl Record for RequiredGood {
    type Req = RequiredGood;

    fn req_id(req: &RequiredGood) -> Option<&str> {
        Some(req.id.as_str()).filter(|id| !id.is_empty())
    }

    fn set_id(&mut self, id: String) {
        if self.ent_id.is_empty() {
            self.ent_id = id.clone();
        }
        self.id = id;
    }

    fn apply(&mut self, req: &RequiredGood) {
        *self = req.clone();
    }
}

use super::cond::{Queryable, Value};
use super::entity::{Entity, Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum OrderBenefitState {
    #[default]
    Wait,
    Calculated,
    BookKept,
}

impl From<OrderBenefitState> for Value {
    fn from(state: OrderBenefitState) -> Self {
        Value::U32(state as u32)
    }
}

/// A user's holding of some units of an app good.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub id: String,
    pub ent_id: String,
    pub app_id: String,
    pub user_id: String,
    pub good_id: String,
    pub app_good_id: String,
    pub units: String,
    pub benefit_state: OrderBenefitState,
    /// Reward period the order last took part in.
    pub last_benefit_at: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderReq {
    pub id: Option<String>,
    pub benefit_state: Option<OrderBenefitState>,
}

impl Entity for Order {
    fn id(&self) -> &str {
        &self.id
    }

    fn ent_id(&self) -> &str {
        &self.ent_id
    }
}

impl Queryable for Order {
    fn field(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.as_str().into()),
            "ent_id" => Some(self.ent_id.as_str().into()),
            "app_id" => Some(self.app_id.as_str().into()),
            "good_id" => Some(self.good_id.as_str().into()),
            "app_good_id" => Some(self.app_good_id.as_str().into()),
            "benefit_state" => Some(self.benefit_state.into()),
            "last_benefit_at" => Some(self.last_benefit_at.into()),
            _ => None,
        }
    }
}

impl Record for Order {
    type Req = OrderReq;

    fn req_id(req: &OrderReq) -> Option<&str> {
        req.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        if self.ent_id.is_empty() {
            self.ent_id = id.clone();
        }
        self.id = id;
    }

    fn apply(&mut self, req: &OrderReq) {
        if let Some(state) = req.benefit_state {
            self.benefit_state = state;
        }
    }
}

use super::cond::{Queryable, Value};
use super::entity::{Entity, Record};
use serde::{Deserialize, Serialize};

/// On-chain transaction lifecycle as tracked by the transaction queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum TxState {
    #[default]
    Created,
    Wait,
    Transferring,
    Successful,
    Fail,
}

impl TxState {
    /// Whether the chain has not reached a final outcome yet.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Created | Self::Wait | Self::Transferring)
    }
}

impl From<TxState> for Value {
    fn from(state: TxState) -> Self {
        Value::U32(state as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TxType {
    #[default]
    Withdraw,
    PaymentCollect,
    UserBenefit,
    PlatformBenefit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tx {
    pub id: String,
    pub ent_id: String,
    pub coin_type_id: String,
    pub from_account_id: String,
    pub to_account_id: String,
    pub amount: String,
    pub fee_amount: String,
    pub chain_tx_id: Option<String>,
    pub state: TxState,
    pub tx_type: TxType,
    /// Free-form JSON attached by the creator.
    pub extra: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TxReq {
    pub id: Option<String>,
    pub coin_type_id: Option<String>,
    pub from_account_id: Option<String>,
    pub to_account_id: Option<String>,
    pub amount: Option<String>,
    pub fee_amount: Option<String>,
    pub chain_tx_id: Option<String>,
    pub state: Option<TxState>,
    pub tx_type: Option<TxType>,
    pub extra: Option<String>,
}

impl Entity for Tx {
    fn id(&self) -> &str {
        &self.id
    }

    fn ent_id(&self) -> &str {
        &self.ent_id
    }
}

impl Queryable for Tx {
    fn field(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.as_str().into()),
            "ent_id" => Some(self.ent_id.as_str().into()),
            "coin_type_id" => Some(self.coin_type_id.as_str().into()),
            "from_account_id" => Some(self.from_account_id.as_str().into()),
            "to_account_id" => Some(self.to_account_id.as_str().into()),
            "state" => Some(self.state.into()),
            "tx_type" => Some(Value::U32(self.tx_type as u32)),
            _ => None,
        }
    }
}

impl Record for Tx {
    type Req = TxReq;

    fn req_id(req: &TxReq) -> Option<&str> {
        req.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        if self.ent_id.is_empty() {
            self.ent_id = id.clone();
        }
        self.id = id;
    }

    fn apply(&mut self, req: &TxReq) {
        if let Some(v) = &req.coin_type_id {
            self.coin_type_id = v.clone();
        }
        if let Some(v) = &req.from_account_id {
            self.from_account_id = v.clone();
        }
        if let Some(v) = &req.to_account_id {
            self.to_account_id = v.clone();
        }
        if let Some(v) = &req.amount {
            self.amount = v.clone();
        }
        if let Some(v) = &req.fee_amount {
            self.fee_amount = v.clone();
        }
        if let Some(v) = &req.chain_tx_id {
            self.chain_tx_id = Some(v.clone());
        }
        if let Some(v) = req.state {
            self.state = v;
        }
        if let Some(v) = req.tx_type {
            self.tx_type = v;
        }
        if let Some(v) = &req.extra {
            self.extra = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_states() {
        assert!(TxState::Created.is_pending());
        assert!(TxState::Wait.is_pending());
        assert!(TxState::Transferring.is_pending());
        assert!(!TxState::Successful.is_pending());
        assert!(!TxState::Fail.is_pending());
    }

    #[test]
    fn test_from_req_defaults_to_created() {
        let tx = Tx::from_req(
            "t1".into(),
            &TxReq {
                amount: Some("5".into()),
                tx_type: Some(TxType::PaymentCollect),
                ..Default::default()
            },
        );
        assert_eq!(tx.id, "t1");
        assert_eq!(tx.ent_id, "t1");
        assert_eq!(tx.state, TxState::Created);
        assert_eq!(tx.tx_type, TxType::PaymentCollect);
    }
}

use super::SUBSYSTEM;
use crate::application::message::Persistent;
use crate::domain::good::{BenefitState, Good};
use crate::domain::ports::{NotifResult, Notification};
use crate::error::SchedulerError;
use crate::subsystem::notif::Notifiable;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

/// Split recorded on a reward transaction by whoever created it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RewardExtra {
    pub platform_reward: Decimal,
    pub technique_service_fee: Decimal,
}

impl RewardExtra {
    pub fn parse(extra: &str) -> Result<Self, SchedulerError> {
        if extra.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(extra)?)
    }

    pub fn to_platform(&self) -> Decimal {
        self.platform_reward + self.technique_service_fee
    }
}

/// Transfer of the platform's share of a reward.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformTransfer {
    pub amount: Decimal,
    pub from_account_id: String,
    pub to_account_id: String,
    pub extra: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersistentGood {
    pub good: Good,
    pub new_state: BenefitState,
    /// `next_reward_start_amount` once the reward left the good's address.
    pub next_start_amount: Option<Decimal>,
    pub platform_transfer: Option<PlatformTransfer>,
    /// Id reserved for the platform transfer, reused by every commit attempt.
    pub platform_tid: Option<String>,
    pub error: Option<String>,
}

impl PersistentGood {
    pub fn new(good: Good) -> Self {
        Self {
            new_state: good.reward_state,
            good,
            next_start_amount: None,
            platform_transfer: None,
            platform_tid: None,
            error: None,
        }
    }
}

impl Persistent for PersistentGood {
    type Entity = Good;

    fn entity(&self) -> &Good {
        &self.good
    }

    fn record_error(&mut self, error: &SchedulerError) {
        self.error = Some(error.to_string());
    }
}

impl Notifiable for PersistentGood {
    fn notification(&self) -> Notification {
        Notification {
            subsystem: SUBSYSTEM.to_string(),
            entity_id: self.good.id.clone(),
            ent_id: self.good.ent_id.clone(),
            result: match (&self.error, self.new_state) {
                (None, state) if state != BenefitState::Fail => NotifResult::Success,
                _ => NotifResult::Fail,
            },
            message: self.error.clone().unwrap_or_default(),
            extra: json!({
                "reward_tid": self.good.reward_tid,
                "new_state": format!("{:?}", self.new_state),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_extra_accepts_strings_and_numbers() {
        let extra = RewardExtra::parse(r#"{"PlatformReward":"3.5","TechniqueServiceFee":1}"#).unwrap();
        assert_eq!(extra.to_platform(), dec!(4.5));
        assert_eq!(RewardExtra::parse("").unwrap(), RewardExtra::default());
        assert!(RewardExtra::parse("{").is_err());
    }
}

use super::SUBSYSTEM;
use crate::application::message::Persistent;
use crate::domain::good::{BenefitState, Good};
use crate::domain::ports::{NotifResult, Notification};
use crate::error::SchedulerError;
use crate::subsystem::notif::Notifiable;
use rust_decimal::Decimal;
use serde_json::json;

/// One order's share of the reward.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReward {
    pub order_id: String,
    pub app_id: String,
    pub user_id: String,
    pub amount: Decimal,
    /// Statement `io_extra`.
    pub extra: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersistentGood {
    pub good: Good,
    pub user_reward: Decimal,
    pub order_rewards: Vec<OrderReward>,
    /// Set once every order of the period is booked.
    pub new_state: Option<BenefitState>,
    pub error: Option<String>,
}

impl PersistentGood {
    pub fn new(good: Good) -> Self {
        Self {
            good,
            user_reward: Decimal::ZERO,
            order_rewards: Vec::new(),
            new_state: None,
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
            result: if self.error.is_some() {
                NotifResult::Fail
            } else {
                NotifResult::Success
            },
            message: self.error.clone().unwrap_or_default(),
            extra: json!({
                "last_reward_at": self.good.last_reward_at,
                "user_reward": self.user_reward.to_string(),
                "orders": self.order_rewards.len(),
            }),
        }
    }
}

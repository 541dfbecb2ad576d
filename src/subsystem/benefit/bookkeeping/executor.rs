use super::types::{OrderReward, PersistentGood};
use super::{ORDERS_PER_EXEC, SUBSYSTEM};
use crate::application::executor::Exec;
use crate::application::message::Routing;
use crate::application::scanner::Pages;
use crate::domain::amount::parse_decimal;
use crate::domain::cond::Conds;
use crate::domain::good::{AppGood, BenefitState, Good, GoodType};
use crate::domain::order::{Order, OrderBenefitState};
use crate::error::{Result, SchedulerError};
use crate::subsystem::Services;
use crate::subsystem::benefit::reward::{
    LEGACY_TECHNIQUE_FEE_TIMESTAMP, fee_percent, order_reward, unit_reward, user_reward,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

pub struct BookKeepingExecutor {
    services: Arc<Services>,
}

impl BookKeepingExecutor {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Exec<Good, PersistentGood> for BookKeepingExecutor {
    async fn exec(&self, good: Good) -> Routing<PersistentGood> {
        let mut handler = GoodHandler {
            services: &self.services,
            result: PersistentGood::new(good),
        };
        let outcome = handler.exec().await;
        handler.route(outcome)
    }
}

/// Units ordered through one app good.
struct AppGoodUnits {
    app_id: String,
    units: Decimal,
}

struct GoodHandler<'a> {
    services: &'a Services,
    result: PersistentGood,
}

impl GoodHandler<'_> {
    fn good(&self) -> &Good {
        &self.result.good
    }

    fn period_conds(&self, states: Vec<OrderBenefitState>) -> Conds {
        Conds::new()
            .eq("good_id", self.good().id.as_str())
            .eq("last_benefit_at", self.good().last_reward_at)
            .is_in("benefit_state", states)
    }

    /// Units of every order rewarded in this period, booked or not, so the
    /// split does not drift between batches.
    async fn period_units(&self) -> Result<(HashMap<String, AppGoodUnits>, Decimal)> {
        let conds = self.period_conds(vec![OrderBenefitState::Calculated, OrderBenefitState::BookKept]);
        let mut pages = Pages::new(self.services.orders.clone(), conds);
        let mut by_app_good: HashMap<String, AppGoodUnits> = HashMap::new();
        let mut total = Decimal::ZERO;
        while let Some(orders) = pages.next_page().await? {
            for order in orders {
                let units = parse_decimal("units", &order.units)?;
                total += units;
                by_app_good
                    .entry(order.app_good_id.clone())
                    .or_insert_with(|| AppGoodUnits {
                        app_id: order.app_id.clone(),
                        units: Decimal::ZERO,
                    })
                    .units += units;
            }
        }
        Ok((by_app_good, total))
    }

    async fn app_goods(&self) -> Result<HashMap<String, AppGood>> {
        let conds = Conds::new().eq("good_id", self.good().id.as_str());
        let mut pages = Pages::new(self.services.app_goods.clone(), conds);
        let mut app_goods = HashMap::new();
        while let Some(rows) = pages.next_page().await? {
            app_goods.extend(rows.into_iter().map(|g| (g.id.clone(), g)));
        }
        Ok(app_goods)
    }

    /// The technique-fee app good each app bound to this good.
    async fn technique_fee_goods(&self) -> Result<HashMap<String, AppGood>> {
        let conds = Conds::new().eq("main_good_id", self.good().id.as_str());
        let mut pages = Pages::new(self.services.required_goods.clone(), conds);
        let mut required_ids = Vec::new();
        while let Some(rows) = pages.next_page().await? {
            required_ids.extend(rows.into_iter().map(|r| r.required_good_id));
        }
        let mut fees = HashMap::new();
        if required_ids.is_empty() {
            return Ok(fees);
        }

        let conds = Conds::new()
            .is_in("good_id", required_ids)
            .eq("good_type", GoodType::TechniqueServiceFee as u32);
        let mut pages = Pages::new(self.services.app_goods.clone(), conds);
        while let Some(rows) = pages.next_page().await? {
            for app_good in rows {
                if fees.contains_key(&app_good.app_id) {
                    return Err(SchedulerError::ValidationError(format!(
                        "too many technique fee goods for app {}",
                        app_good.app_id
                    )));
                }
                fees.insert(app_good.app_id.clone(), app_good);
            }
        }
        Ok(fees)
    }

    async fn unit_rewards(&mut self) -> Result<HashMap<String, Decimal>> {
        let mut rewards = HashMap::new();
        let total_reward = parse_decimal("last_reward_amount", &self.good().last_reward_amount)?;
        let good_units = parse_decimal("total_units", &self.good().total_units)?;
        let (by_app_good, total_order_units) = self.period_units().await?;
        if total_reward <= Decimal::ZERO || total_order_units <= Decimal::ZERO {
            return Ok(rewards);
        }

        let user = user_reward(total_reward, total_order_units, good_units)?;
        self.result.user_reward = user;
        let created_at = self.good().created_at;
        let (app_goods, fees) = if created_at <= LEGACY_TECHNIQUE_FEE_TIMESTAMP {
            (self.app_goods().await?, HashMap::new())
        } else {
            (HashMap::new(), self.technique_fee_goods().await?)
        };

        for (app_good_id, units) in by_app_good {
            let percent = fee_percent(
                created_at,
                app_goods.get(&app_good_id),
                fees.get(&units.app_id),
            )?;
            let reward = unit_reward(user, units.units, total_order_units, percent)?;
            rewards.insert(app_good_id, reward);
        }
        Ok(rewards)
    }

    fn reward_of(&self, order: &Order, unit_rewards: &HashMap<String, Decimal>) -> Result<OrderReward> {
        let units = parse_decimal("units", &order.units)?;
        let amount = match unit_rewards.get(&order.app_good_id) {
            Some(unit) => order_reward(*unit, units)?,
            None => Decimal::ZERO,
        };
        let extra = json!({
            "GoodID": self.good().id,
            "AppGoodID": order.app_good_id,
            "OrderID": order.id,
            "Units": order.units,
            "BenefitDate": self.good().last_reward_at,
        });
        Ok(OrderReward {
            order_id: order.id.clone(),
            app_id: order.app_id.clone(),
            user_id: order.user_id.clone(),
            amount,
            extra: extra.to_string(),
        })
    }

    async fn exec(&mut self) -> Result<()> {
        let conds = self.period_conds(vec![OrderBenefitState::Calculated]);
        let (batch, _) = self.services.orders.list(&conds, 0, ORDERS_PER_EXEC).await?;
        if batch.is_empty() {
            self.result.new_state = Some(BenefitState::Done);
            return Ok(());
        }

        let unit_rewards = self.unit_rewards().await?;
        for order in &batch {
            let reward = self.reward_of(order, &unit_rewards)?;
            self.result.order_rewards.push(reward);
        }
        Ok(())
    }

    fn route(mut self, outcome: Result<()>) -> Routing<PersistentGood> {
        match outcome {
            Ok(()) => Routing::Persist(self.result),
            Err(e) if e.is_transient() => {
                tracing::warn!(subsystem = SUBSYSTEM, id = %self.result.good.id, error = %e, "exec deferred");
                Routing::Done(self.result)
            }
            Err(e) => {
                tracing::error!(
                    subsystem = SUBSYSTEM,
                    id = %self.result.good.id,
                    user_reward = %self.result.user_reward,
                    error = %e,
                    "exec failed"
                );
                self.result.error = Some(e.to_string());
                Routing::Notify(self.result)
            }
        }
    }
}

//! Splitting a good's daily reward between the orders holding it.

use crate::domain::amount::parse_decimal;
use crate::domain::good::{AppGood, SettlementType};
use crate::error::{Result, SchedulerError};
use rust_decimal::{Decimal, RoundingStrategy};

/// Goods created up to this instant pay the technique fee as a ratio of
/// their own app good instead of through a bound technique-fee good.
pub const LEGACY_TECHNIQUE_FEE_TIMESTAMP: u32 = 1_704_009_402;

/// Decimal places kept on a unit reward; truncation never over-distributes.
pub const REWARD_SCALE: u32 = 18;

fn overflow() -> SchedulerError {
    SchedulerError::ValidationError("reward arithmetic overflow".to_string())
}

/// The users' share of `total_reward`: the fraction of the good's units
/// held by orders.
pub fn user_reward(
    total_reward: Decimal,
    total_order_units: Decimal,
    good_total_units: Decimal,
) -> Result<Decimal> {
    if good_total_units <= Decimal::ZERO {
        return Err(SchedulerError::ValidationError(format!(
            "invalid good total units {good_total_units}"
        )));
    }
    total_reward
        .checked_mul(total_order_units)
        .and_then(|v| v.checked_div(good_total_units))
        .ok_or_else(overflow)
}

/// Percentage of an app good's reward share withheld as technique fee.
///
/// # Arguments
///
/// * `good_created_at` - Creation time of the good, selecting the fee regime.
/// * `app_good` - The app good whose orders are rewarded. Only the legacy
///   regime reads it and fails without it.
/// * `technique_fee` - The app's technique-fee app good bound to the good, if any.
pub fn fee_percent(
    good_created_at: u32,
    app_good: Option<&AppGood>,
    technique_fee: Option<&AppGood>,
) -> Result<Decimal> {
    if good_created_at <= LEGACY_TECHNIQUE_FEE_TIMESTAMP {
        let app_good = app_good.ok_or_else(|| {
            SchedulerError::ValidationError("app good required by legacy technique fee".to_string())
        })?;
        return parse_decimal("technical_fee_ratio", &app_good.technical_fee_ratio);
    }
    match technique_fee {
        Some(fee) if fee.settlement_type == SettlementType::SettledByProfit => {
            parse_decimal("unit_price", &fee.unit_price)
        }
        _ => Ok(Decimal::ZERO),
    }
}

/// Net reward per unit for an app good holding `app_good_units` of the
/// `total_order_units` ordered.
pub fn unit_reward(
    user_reward: Decimal,
    app_good_units: Decimal,
    total_order_units: Decimal,
    fee_percent: Decimal,
) -> Result<Decimal> {
    if app_good_units <= Decimal::ZERO || total_order_units <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    if fee_percent < Decimal::ZERO || fee_percent > Decimal::ONE_HUNDRED {
        return Err(SchedulerError::ValidationError(format!(
            "invalid fee percent {fee_percent}"
        )));
    }
    let share = user_reward
        .checked_mul(app_good_units)
        .and_then(|v| v.checked_div(total_order_units))
        .ok_or_else(overflow)?;
    let fee = share
        .checked_mul(fee_percent)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(overflow)?;
    let unit = (share - fee)
        .checked_div(app_good_units)
        .ok_or_else(overflow)?;
    Ok(unit.round_dp_with_strategy(REWARD_SCALE, RoundingStrategy::ToZero))
}

pub fn order_reward(unit_reward: Decimal, units: Decimal) -> Result<Decimal> {
    unit_reward.checked_mul(units).ok_or_else(overflow)
}

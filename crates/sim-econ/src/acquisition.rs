//! New-subscriber model.

use crate::MarketConditions;
use rust_decimal::prelude::ToPrimitive;
use sim_core::{RandomSource, VpsPlan};

/// Plans below this population get the cold-start amplifier.
pub const COLD_START_USERS: u64 = 50;
const COLD_START_MULTIPLIER: f64 = 10.0;
const BASE_CONVERSION: f64 = 0.005;

/// Price/performance heuristic of a plan.
pub fn value_score(plan: &VpsPlan) -> f64 {
    let resources = f64::from(plan.cpu_cores) * 10.0
        + f64::from(plan.ram_gb) * 5.0
        + f64::from(plan.disk_gb) * 0.5
        + f64::from(plan.bandwidth_mbps) * 0.1;
    let price = plan.price_monthly.to_f64().unwrap_or(0.0);
    resources / (price + 0.1)
}

fn load_penalty(overselling_ratio: f64) -> f64 {
    if overselling_ratio > 1.5 {
        0.1
    } else if overselling_ratio > 1.0 {
        0.5
    } else {
        1.0
    }
}

/// Per-tick signup probability. Not clamped; values above 1 always succeed.
pub fn acquisition_chance(plan: &VpsPlan, market: &MarketConditions) -> f64 {
    let rep_factor = market.reputation.max(0.0) / 50.0;
    let marketing_factor = market.marketing_boost.max(1.0);
    let research_boost = 1.0 + market.marketing_research;
    let mut chance = value_score(plan)
        * rep_factor
        * load_penalty(market.overselling_ratio)
        * marketing_factor
        * research_boost
        * BASE_CONVERSION;
    if plan.active_users < COLD_START_USERS {
        chance *= COLD_START_MULTIPLIER;
    }
    chance
}

/// Subscribers gained by `plan` this tick: 1..=3 on a successful trial,
/// otherwise 0. No online CPU means no signups and no draws.
pub fn new_subscribers<R: RandomSource + ?Sized>(
    plan: &VpsPlan,
    market: &MarketConditions,
    rng: &mut R,
) -> u64 {
    if market.cpu_capacity == 0 {
        return 0;
    }
    if rng.chance(acquisition_chance(plan, market)) {
        u64::from(rng.int_inclusive(1, 3))
    } else {
        0
    }
}

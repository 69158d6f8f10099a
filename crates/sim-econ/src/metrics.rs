//! Capacity, usage and cash-flow aggregation.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use sim_core::{Catalogs, GameState, RandomSource, ResearchEffect};

/// Overselling ratio reported when every node is offline but plans still
/// carry demand.
pub const SATURATED_OVERSELL: f64 = 999.0;

/// Share of a plan's bandwidth allocation an average subscriber consumes.
const BANDWIDTH_UTILIZATION: f64 = 0.1;

/// Derived snapshot of the business. Never stored back into the state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameMetrics {
    pub total_income_daily: Decimal,
    pub total_upkeep_daily: Decimal,
    pub total_users: u64,
    /// Randomized concurrency estimate, display only.
    pub online_users: u64,
    pub cpu_used: f64,
    pub ram_used: f64,
    pub disk_used: f64,
    pub bandwidth_used: f64,
    pub cpu_capacity: u64,
    pub ram_capacity: u64,
    pub disk_capacity: u64,
    pub bandwidth_capacity: u64,
    pub overselling_ratio: f64,
}

impl GameMetrics {
    pub fn net_daily(&self) -> Decimal {
        self.total_income_daily.saturating_sub(self.total_upkeep_daily)
    }
}

fn ratio(used: f64, capacity: u64) -> f64 {
    if capacity == 0 {
        0.0
    } else {
        used / capacity as f64
    }
}

/// Aggregate the metrics for `state`.
///
/// Capacity counts online servers only; usage counts every plan. The only
/// random draw is the online-users sample.
pub fn compute_metrics<R: RandomSource + ?Sized>(
    state: &GameState,
    catalogs: &Catalogs,
    rng: &mut R,
) -> GameMetrics {
    let upkeep_reduction =
        catalogs.research_effect_total(&state.research, ResearchEffect::UpkeepReduction);
    let upkeep_factor = Decimal::from_f64(1.0 - upkeep_reduction).unwrap_or(Decimal::ONE);
    let thirty = Decimal::from(30);

    let mut income = Decimal::ZERO;
    let mut total_users = 0u64;
    let (mut cpu_used, mut ram_used, mut disk_used, mut bandwidth_used) = (0.0, 0.0, 0.0, 0.0);
    for plan in &state.plans {
        let users = plan.active_users;
        // Saturates instead of overflowing on absurd loaded prices.
        let plan_income = (plan.price_monthly / thirty).saturating_mul(Decimal::from(users));
        income = income.saturating_add(plan_income);
        total_users = total_users.saturating_add(users);
        let u = users as f64;
        cpu_used += f64::from(plan.cpu_cores) * u;
        ram_used += f64::from(plan.ram_gb) * u;
        disk_used += f64::from(plan.disk_gb) * u;
        bandwidth_used += f64::from(plan.bandwidth_mbps) * BANDWIDTH_UTILIZATION * u;
    }
    let online_users = (total_users as f64 * rng.uniform(0.4, 0.8)).floor() as u64;

    let mut upkeep = Decimal::ZERO;
    let (mut cpu_capacity, mut ram_capacity, mut disk_capacity, mut bandwidth_capacity) =
        (0u64, 0u64, 0u64, 0u64);
    for server in state.servers.iter().filter(|s| s.is_online) {
        let Some(model) = catalogs.hardware(&server.model) else {
            continue;
        };
        upkeep += model.daily_upkeep * upkeep_factor;
        cpu_capacity += u64::from(model.cpu_cores);
        ram_capacity += u64::from(model.ram_gb);
        disk_capacity += u64::from(model.disk_gb);
        bandwidth_capacity += u64::from(model.bandwidth_mbps);
    }

    let resistance =
        catalogs.research_effect_total(&state.research, ResearchEffect::DdosResistance);
    let severity = state.ddos_severity * (1.0 - resistance);
    if severity > 0.0 {
        cpu_used *= 1.0 + severity;
        ram_used *= 1.0 + 0.5 * severity;
        bandwidth_used *= 1.0 + 2.0 * severity;
    }

    let overselling_ratio = if cpu_capacity == 0 && cpu_used > 0.0 {
        SATURATED_OVERSELL
    } else {
        ratio(cpu_used, cpu_capacity)
            .max(ratio(ram_used, ram_capacity))
            .max(ratio(bandwidth_used, bandwidth_capacity))
    };

    GameMetrics {
        total_income_daily: income.round_dp(4),
        total_upkeep_daily: upkeep.round_dp(4),
        total_users,
        online_users,
        cpu_used,
        ram_used,
        disk_used,
        bandwidth_used,
        cpu_capacity,
        ram_capacity,
        disk_capacity,
        bandwidth_capacity,
        overselling_ratio,
    }
}

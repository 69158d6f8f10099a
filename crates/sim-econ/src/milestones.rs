//! Milestone condition interpreter.

use rust_decimal::Decimal;
use sim_core::{Catalogs, GameState, MilestoneCondition, MilestoneId};
use std::collections::BTreeSet;

/// Milestones newly achieved by a state and the cash they pay out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MilestoneOutcome {
    pub achieved: Vec<MilestoneId>,
    pub reward: Decimal,
}

/// Raw CPU demand over the CPU of every owned server, online or not.
fn cpu_oversell(state: &GameState, catalogs: &Catalogs) -> f64 {
    let used: u64 = state
        .plans
        .iter()
        .map(|p| u64::from(p.cpu_cores) * p.active_users)
        .sum();
    let capacity: u64 = state
        .servers
        .iter()
        .filter_map(|s| catalogs.hardware(&s.model))
        .map(|h| u64::from(h.cpu_cores))
        .sum();
    if capacity == 0 {
        0.0
    } else {
        used as f64 / capacity as f64
    }
}

/// Evaluate one condition. Pure.
pub fn condition_holds(
    condition: &MilestoneCondition,
    state: &GameState,
    catalogs: &Catalogs,
) -> bool {
    match condition {
        MilestoneCondition::AnyPlanHasUsers => state.plans.iter().any(|p| p.active_users > 0),
        MilestoneCondition::ServerCountAtLeast(n) => state.servers.len() >= *n,
        MilestoneCondition::PlanCountAtLeast(n) => state.plans.len() >= *n,
        MilestoneCondition::CashAtLeast(amount) => state.cash >= *amount,
        MilestoneCondition::UserCountAtLeast(n) => state.total_users() >= *n,
        MilestoneCondition::ReputationAtLeast(r) => state.reputation >= *r,
        MilestoneCondition::CpuOversellAtLeast(r) => cpu_oversell(state, catalogs) >= *r,
        MilestoneCondition::DayAtLeast(d) => state.day >= *d,
        MilestoneCondition::ResearchCountAtLeast(n) => state.research.len() >= *n,
        MilestoneCondition::DistinctRegionsAtLeast(n) => {
            let regions: BTreeSet<_> = state
                .servers
                .iter()
                .filter_map(|s| catalogs.hardware(&s.model))
                .map(|h| h.region)
                .collect();
            regions.len() >= *n
        }
    }
}

/// Scan every unachieved milestone of `state`. Already-achieved milestones
/// are skipped, so a reward is reported at most once.
pub fn evaluate_milestones(state: &GameState, catalogs: &Catalogs) -> MilestoneOutcome {
    state
        .milestones
        .iter()
        .filter(|m| !m.achieved && condition_holds(&m.condition, state, catalogs))
        .fold(MilestoneOutcome::default(), |mut out, m| {
            out.achieved.push(m.id.clone());
            out.reward += m.reward_cash;
            out
        })
}

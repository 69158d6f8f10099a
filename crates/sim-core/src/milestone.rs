use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MilestoneId(pub String);

/// Achievement predicate stored as plain data so it survives persistence.
///
/// Evaluated by `sim_econ::milestones`; every variant is a pure function of
/// the game state and the catalogs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MilestoneCondition {
    /// At least one plan has a subscriber.
    AnyPlanHasUsers,
    ServerCountAtLeast(usize),
    PlanCountAtLeast(usize),
    CashAtLeast(Decimal),
    /// Total subscribers across all plans.
    UserCountAtLeast(u64),
    ReputationAtLeast(f64),
    /// Raw CPU demand over the CPU of every owned server, online or not.
    CpuOversellAtLeast(f64),
    DayAtLeast(u32),
    ResearchCountAtLeast(usize),
    DistinctRegionsAtLeast(usize),
}

/// An achievement with a one-off cash reward. `achieved` is write-once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub name: String,
    pub description: String,
    pub reward_cash: Decimal,
    pub condition: MilestoneCondition,
    #[serde(default)]
    pub achieved: bool,
}

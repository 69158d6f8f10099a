#![deny(warnings)]

//! Economic models for VPS Tycoon.
//!
//! Pure calculators that the tick orchestrator composes:
//! - Metrics aggregation (capacity, usage, cash flow, overselling)
//! - Subscriber acquisition and churn/renewal
//! - Ticket and review generation
//! - Milestone evaluation
//! - Forum, ad and influencer resolution
//! - Plan naming and pricing suggestions
//!
//! Every stochastic function takes a [`sim_core::RandomSource`].

pub mod acquisition;
pub mod churn;
pub mod marketing;
pub mod metrics;
pub mod milestones;
pub mod pricing;
pub mod reviews;
pub mod tickets;

pub use acquisition::{acquisition_chance, new_subscribers};
pub use churn::{churn, renewal_rate, NEWBIE_SHIELD_DAYS};
pub use marketing::{
    ad_campaign, influencer_campaign, resolve_forum_post, CampaignEffect, ContentStrategy,
    ForumOutcome,
};
pub use metrics::{compute_metrics, GameMetrics, SATURATED_OVERSELL};
pub use milestones::{condition_holds, evaluate_milestones, MilestoneOutcome};
pub use pricing::{suggest_plan, suggested_price, PlanShape, PlanSpec};
pub use reviews::generate_review;
pub use tickets::generate_ticket;

use rust_decimal::Decimal;
use sim_core::{Catalogs, GameState, ResearchEffect};
use thiserror::Error;

/// Errors produced by economic helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// The player cannot afford the action.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },
    /// A plan needs at least one core and one GB of RAM.
    #[error("plan shape must allocate cpu and ram")]
    EmptyShape,
}

/// Market inputs shared by the acquisition and churn models, read from the
/// prior state of a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct MarketConditions {
    pub day: u32,
    pub reputation: f64,
    pub overselling_ratio: f64,
    pub marketing_boost: f64,
    pub ddos_severity: f64,
    /// Online CPU cores.
    pub cpu_capacity: u64,
    /// Summed "marketing boost" research.
    pub marketing_research: f64,
    /// Summed "churn reduction" research.
    pub churn_research: f64,
}

impl MarketConditions {
    pub fn from_state(state: &GameState, metrics: &GameMetrics, catalogs: &Catalogs) -> Self {
        Self {
            day: state.day,
            reputation: state.reputation,
            overselling_ratio: metrics.overselling_ratio,
            marketing_boost: state.marketing_boost,
            ddos_severity: state.ddos_severity,
            cpu_capacity: metrics.cpu_capacity,
            marketing_research: catalogs
                .research_effect_total(&state.research, ResearchEffect::MarketingBoost),
            churn_research: catalogs
                .research_effect_total(&state.research, ResearchEffect::ChurnReduction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{ResearchId, ScriptedRng};

    #[test]
    fn conditions_sum_research() {
        let c = Catalogs::standard();
        let mut s = GameState::new_game(&c);
        s.research.insert(ResearchId::from("churn_algo"));
        s.research.insert(ResearchId::from("anycast_dns"));
        s.research.insert(ResearchId::from("seo_mastery"));
        let m = compute_metrics(&s, &c, &mut ScriptedRng::constant(0.5));
        let market = MarketConditions::from_state(&s, &m, &c);
        assert!((market.churn_research - 0.25).abs() < 1e-9);
        assert!((market.marketing_research - 0.2).abs() < 1e-9);
        assert_eq!(market.cpu_capacity, m.cpu_capacity);
        assert_eq!(market.day, 1);
    }

    #[test]
    fn research_raises_renewal() {
        let c = Catalogs::standard();
        let mut s = GameState::new_game(&c);
        s.day = 40;
        let m = compute_metrics(&s, &c, &mut ScriptedRng::constant(0.5));
        let plain = renewal_rate(&MarketConditions::from_state(&s, &m, &c));
        s.research.insert(ResearchId::from("churn_algo"));
        let boosted = renewal_rate(&MarketConditions::from_state(&s, &m, &c));
        assert!((boosted - plain - 0.1).abs() < 1e-9);
    }
}

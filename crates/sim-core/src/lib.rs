#![deny(warnings)]

//! Core domain models and invariants for VPS Tycoon.
//!
//! This crate defines the serializable game state, the read-only reference
//! catalogs, and the random-source abstraction shared by the calculators and
//! the runtime, with validation helpers to guarantee basic invariants.

mod catalog;
mod config;
mod milestone;
mod rng;
mod state;

pub use catalog::{
    AdPlatform, Catalogs, Forum, ForumKind, HardwareId, HardwareModel, Influencer, IpType, Region,
    ResearchEffect, ResearchId, ResearchItem, ReviewPools,
};
pub use config::SimConfig;
pub use milestone::{Milestone, MilestoneCondition, MilestoneId};
pub use rng::{RandomSource, ScriptedRng, SimRng};
pub use state::{
    clamp_reputation, EventKind, GameEvent, GameState, IssueType, PlanId, PlanLevel, Sentiment,
    ServerId, ServerNode, SupportTicket, TicketId, UserReview, VpsPlan, INITIAL_CASH_USD,
    INITIAL_REPUTATION, MAX_EVENTS, MAX_REVIEWS, STANDARD_EXPIRY_TICKS, VIP_EXPIRY_TICKS,
};

use rust_decimal::Decimal;
use std::collections::BTreeSet;
use thiserror::Error;

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Reputation must be within [0, 100].
    #[error("reputation {0} is outside [0, 100]")]
    ReputationOutOfRange(f64),
    /// Probability-like field outside [0, 1].
    #[error("{0} must be within [0,1]")]
    InvalidProbability(String),
    /// Numeric field must be finite.
    #[error("non-finite numeric value encountered")]
    NonFinite,
    /// Price or cost must be non-negative.
    #[error("negative monetary value is invalid")]
    NegativeMoney,
    /// Marketing boost must stay at or above the neutral 1.0.
    #[error("marketing boost {0} is below 1.0")]
    MarketingBoostBelowNeutral(f64),
    /// DDoS severity must be non-negative.
    #[error("ddos severity {0} is negative")]
    NegativeDdosSeverity(f64),
    /// A bounded log grew past its limit.
    #[error("{log} holds {len} entries, limit is {limit}")]
    LogOverflow {
        log: &'static str,
        len: usize,
        limit: usize,
    },
    /// Reference to an id missing from the catalogs or the state.
    #[error("unknown reference: {0}")]
    UnknownReference(String),
    /// Two catalog entries share an id.
    #[error("duplicate catalog id: {0}")]
    DuplicateId(String),
}

fn check_probability(name: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite);
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::InvalidProbability(name.to_string()));
    }
    Ok(())
}

fn check_money(value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney);
    }
    Ok(())
}

fn check_unique<'a>(ids: impl Iterator<Item = &'a str>) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId(id.to_string()));
        }
    }
    Ok(())
}

/// Validate the reference tables.
pub fn validate_catalogs(c: &Catalogs) -> Result<(), ValidationError> {
    check_unique(c.hardware.iter().map(|h| h.id.0.as_str()))?;
    check_unique(c.research.iter().map(|r| r.id.0.as_str()))?;
    check_unique(c.forums.iter().map(|f| f.id.as_str()))?;
    check_unique(c.ads.iter().map(|a| a.id.as_str()))?;
    check_unique(c.influencers.iter().map(|k| k.id.as_str()))?;
    check_unique(c.milestones.iter().map(|m| m.id.0.as_str()))?;

    for h in &c.hardware {
        check_money(h.purchase_cost)?;
        check_money(h.daily_upkeep)?;
        check_probability("hardware reliability", h.reliability)?;
    }
    for r in &c.research {
        check_money(r.cost)?;
        if !r.effect_value.is_finite() {
            return Err(ValidationError::NonFinite);
        }
    }
    for f in &c.forums {
        check_probability("forum risk", f.risk)?;
        check_probability("forum user quality", f.user_quality)?;
        if !f.traffic_potential.is_finite() {
            return Err(ValidationError::NonFinite);
        }
    }
    for a in &c.ads {
        check_money(a.cost)?;
    }
    for k in &c.influencers {
        check_money(k.cost)?;
    }
    for m in &c.milestones {
        check_money(m.reward_cash)?;
    }
    if c.hardware(&c.starter_hardware).is_none() {
        return Err(ValidationError::UnknownReference(c.starter_hardware.0.clone()));
    }
    Ok(())
}

/// Validate a game state against the catalogs it was built from.
pub fn validate_state(s: &GameState, c: &Catalogs) -> Result<(), ValidationError> {
    if !s.reputation.is_finite() || !(0.0..=100.0).contains(&s.reputation) {
        return Err(ValidationError::ReputationOutOfRange(s.reputation));
    }
    if !s.marketing_boost.is_finite() || !s.ddos_severity.is_finite() {
        return Err(ValidationError::NonFinite);
    }
    if s.marketing_boost < 1.0 {
        return Err(ValidationError::MarketingBoostBelowNeutral(s.marketing_boost));
    }
    if s.ddos_severity < 0.0 {
        return Err(ValidationError::NegativeDdosSeverity(s.ddos_severity));
    }
    if s.events.len() > MAX_EVENTS {
        return Err(ValidationError::LogOverflow {
            log: "events",
            len: s.events.len(),
            limit: MAX_EVENTS,
        });
    }
    if s.reviews.len() > MAX_REVIEWS {
        return Err(ValidationError::LogOverflow {
            log: "reviews",
            len: s.reviews.len(),
            limit: MAX_REVIEWS,
        });
    }
    for id in &s.research {
        if c.research_item(id).is_none() {
            return Err(ValidationError::UnknownReference(id.0.clone()));
        }
    }
    for server in &s.servers {
        if c.hardware(&server.model).is_none() {
            return Err(ValidationError::UnknownReference(server.model.0.clone()));
        }
    }
    for plan in &s.plans {
        if s.server(plan.node).is_none() {
            return Err(ValidationError::UnknownReference(format!(
                "server {} of plan {}",
                plan.node.0, plan.name
            )));
        }
    }
    Ok(())
}

//! The per-day state transition.

use sim_core::{Catalogs, GameState, IssueType, RandomSource, ResearchEffect, TicketId};
use sim_econ::{
    churn, compute_metrics, evaluate_milestones, generate_review, generate_ticket,
    new_subscribers, MarketConditions,
};
use tracing::{debug, info};

/// Marketing boost lost per tick, floored at 1.0.
pub const BOOST_DECAY: f64 = 0.05;
/// DDoS severity lost per tick, floored at 0.0.
pub const DDOS_DECAY: f64 = 0.1;
pub const EXPIRY_PENALTY: f64 = 2.0;
pub const VIP_EXPIRY_PENALTY: f64 = 3.0;
pub const AUTO_SUPPORT_REPUTATION: f64 = 0.1;

/// Advance `prior` by one day.
///
/// Every calculator reads the same prior snapshot; the result is a new
/// state. A paused state is returned unchanged and consumes no draws. The
/// event log is never touched here.
pub fn tick<R: RandomSource + ?Sized>(
    prior: &GameState,
    catalogs: &Catalogs,
    rng: &mut R,
) -> GameState {
    if prior.paused {
        return prior.clone();
    }

    let metrics = compute_metrics(prior, catalogs, rng);
    let market = MarketConditions::from_state(prior, &metrics, catalogs);
    let mut next = prior.clone();

    next.marketing_boost = (prior.marketing_boost - BOOST_DECAY).max(1.0);
    next.ddos_severity = (prior.ddos_severity - DDOS_DECAY).max(0.0);
    next.cash = next.cash.saturating_add(metrics.net_daily());

    let milestones = evaluate_milestones(prior, catalogs);
    if !milestones.achieved.is_empty() {
        next.cash = next.cash.saturating_add(milestones.reward);
        for m in next
            .milestones
            .iter_mut()
            .filter(|m| milestones.achieved.contains(&m.id))
        {
            m.achieved = true;
            info!(
                day = prior.day,
                milestone = %m.id.0,
                reward = %m.reward_cash,
                "milestone achieved"
            );
        }
    }

    let (mut gained, mut lost) = (0u64, 0u64);
    for plan in next.plans.iter_mut() {
        let new = new_subscribers(plan, &market, rng);
        let churned = churn(plan.active_users, &market, rng);
        plan.active_users = plan.active_users.saturating_add(new).saturating_sub(churned);
        gained += new;
        lost += churned;
    }

    let auto_support =
        catalogs.research_effect_total(&prior.research, ResearchEffect::AutoSupport);
    if auto_support > 0.0 {
        let before = next.tickets.len();
        next.tickets.retain(|t| {
            let eligible = t.issue_type == IssueType::Question && t.difficulty == 1;
            !(eligible && rng.chance(auto_support))
        });
        let solved = before - next.tickets.len();
        next.adjust_reputation(AUTO_SUPPORT_REPUTATION * solved as f64);
    }

    for t in next.tickets.iter_mut() {
        t.expires_in_ticks = t.expires_in_ticks.saturating_sub(1);
    }
    let (expired, open): (Vec<_>, Vec<_>) = std::mem::take(&mut next.tickets)
        .into_iter()
        .partition(|t| t.expires_in_ticks <= 0);
    next.tickets = open;
    if !expired.is_empty() {
        let vip = expired.iter().filter(|t| t.is_vip).count();
        next.adjust_reputation(
            -(EXPIRY_PENALTY * expired.len() as f64 + VIP_EXPIRY_PENALTY * vip as f64),
        );
    }

    if let Some(ticket) = generate_ticket(
        TicketId(next.next_id),
        prior.day,
        metrics.total_users,
        metrics.overselling_ratio,
        prior.ddos_severity,
        rng,
    ) {
        next.next_id += 1;
        next.tickets.push(ticket);
    }

    let review = generate_review(
        next.next_id,
        next.reputation,
        metrics.overselling_ratio,
        prior.calendar_date(),
        &catalogs.reviews,
        rng,
    );
    if let Some(review) = review.filter(|_| metrics.total_users > 0) {
        next.next_id += 1;
        next.push_review(review);
    }

    next.day += 1;
    debug!(
        day = next.day,
        cash = %next.cash,
        reputation = next.reputation,
        users = next.total_users(),
        gained,
        lost,
        expired = expired.len(),
        tickets = next.tickets.len(),
        oversell = metrics.overselling_ratio,
        "tick"
    );
    next
}

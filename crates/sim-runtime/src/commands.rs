//! Player commands.
//!
//! Each command validates its preconditions against the current state and
//! either returns a new state with one event appended or a [`CommandError`].
//! A rejected command never changes anything.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{
    Catalogs, EventKind, GameState, HardwareId, PlanId, RandomSource, Region, ResearchId,
    ServerId, ServerNode, TicketId, VpsPlan,
};
use sim_econ::{
    ad_campaign, influencer_campaign, resolve_forum_post, ContentStrategy, EconError,
    ForumOutcome, PlanSpec,
};
use thiserror::Error;
use tracing::{info, warn};

pub const REPAIR_COST_USD: i64 = 100;
pub const DDOS_MITIGATION_COST_USD: i64 = 200;
pub const REFUND_COST_USD: i64 = 15;
/// Highest monthly price a plan may be listed at.
pub const MAX_PLAN_PRICE_USD: i64 = 100_000;
/// Marketing boost gained per unit of forum traffic.
pub const FORUM_TRAFFIC_TO_BOOST: f64 = 0.1;
pub const FORUM_BAN_PENALTY: f64 = 10.0;
pub const FORUM_DDOS_SEVERITY: f64 = 1.5;

/// Reasons a command is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },
    /// The plan's node does not exist.
    #[error("no node selected for the plan")]
    NoNodeSelected,
    #[error("a plan named {0:?} already exists")]
    DuplicatePlanName(String),
    #[error("plan {name:?} still has {users} active users")]
    PlanHasActiveUsers { name: String, users: u64 },
    #[error("unknown catalog id: {0}")]
    UnknownCatalogId(String),
    #[error("no servers available")]
    NoServersAvailable,
    #[error("unknown server {0:?}")]
    UnknownServer(ServerId),
    #[error("unknown plan {0:?}")]
    UnknownPlan(PlanId),
    #[error("unknown ticket {0:?}")]
    UnknownTicket(TicketId),
    #[error("research {0:?} is already unlocked")]
    ResearchAlreadyUnlocked(ResearchId),
    #[error("plan name must not be empty")]
    EmptyPlanName,
    #[error("hardware {0:?} cannot be purchased")]
    NotPurchasable(HardwareId),
    #[error("invalid plan: {0}")]
    InvalidPlan(&'static str),
}

impl From<EconError> for CommandError {
    fn from(e: EconError) -> Self {
        match e {
            EconError::InsufficientFunds { needed, available } => {
                CommandError::InsufficientFunds { needed, available }
            }
            EconError::EmptyShape => CommandError::InvalidPlan("cpu and ram must be non-zero"),
        }
    }
}

/// How the player closes a ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketAction {
    /// Fix the problem: +1 reputation, +3 for a VIP.
    Solve,
    /// Pay the customer off and cancel one subscription.
    Refund,
    /// Ban the customer, losing one subscription.
    Ban,
}

/// A command as data, for queues and scripts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    PurchaseServer { model: HardwareId },
    RepairServer { server: ServerId },
    MitigateDdos,
    ResolveTicket { ticket: TicketId, action: TicketAction },
    UnlockResearch { research: ResearchId },
    CreatePlan { spec: PlanSpec },
    DeletePlan { plan: PlanId },
    PostToForum { forum: String, strategy: ContentStrategy },
    BuyAd { ad: String },
    HireInfluencer { influencer: String },
    SetPaused { paused: bool },
}

/// Dispatch `command` to its handler.
pub fn apply<R: RandomSource + ?Sized>(
    state: &GameState,
    catalogs: &Catalogs,
    command: &Command,
    rng: &mut R,
) -> Result<GameState, CommandError> {
    let result = match command {
        Command::PurchaseServer { model } => purchase_server(state, catalogs, model),
        Command::RepairServer { server } => repair_server(state, *server),
        Command::MitigateDdos => mitigate_ddos(state),
        Command::ResolveTicket { ticket, action } => resolve_ticket(state, *ticket, *action),
        Command::UnlockResearch { research } => unlock_research(state, catalogs, research),
        Command::CreatePlan { spec } => create_plan(state, catalogs, spec),
        Command::DeletePlan { plan } => delete_plan(state, *plan),
        Command::PostToForum { forum, strategy } => {
            post_to_forum(state, catalogs, forum, *strategy, rng)
        }
        Command::BuyAd { ad } => buy_ad(state, catalogs, ad),
        Command::HireInfluencer { influencer } => hire_influencer(state, catalogs, influencer),
        Command::SetPaused { paused } => Ok(set_paused(state, *paused)),
    };
    match &result {
        Ok(next) => info!(day = next.day, ?command, "command applied"),
        Err(e) => warn!(day = state.day, ?command, error = %e, "command rejected"),
    }
    result
}

fn charge(state: &mut GameState, cost: Decimal) -> Result<(), CommandError> {
    if state.cash < cost {
        return Err(CommandError::InsufficientFunds {
            needed: cost,
            available: state.cash,
        });
    }
    state.cash -= cost;
    Ok(())
}

pub fn purchase_server(
    state: &GameState,
    catalogs: &Catalogs,
    model_id: &HardwareId,
) -> Result<GameState, CommandError> {
    let model = catalogs
        .hardware(model_id)
        .ok_or_else(|| CommandError::UnknownCatalogId(model_id.0.clone()))?;
    if !model.purchasable {
        return Err(CommandError::NotPurchasable(model_id.clone()));
    }
    let mut next = state.clone();
    charge(&mut next, model.purchase_cost)?;
    let id = ServerId(next.allocate_id());
    let name = format!("{}-{}", model.region.as_str(), next.servers.len() + 1);
    next.servers.push(ServerNode {
        id,
        model: model.id.clone(),
        name,
        purchase_day: next.day,
        health: 100,
        is_online: true,
    });
    next.push_event(
        format!("Purchased: {} ({}) online", model.name, model.region.as_str()),
        EventKind::Success,
    );
    Ok(next)
}

pub fn repair_server(state: &GameState, server: ServerId) -> Result<GameState, CommandError> {
    if state.server(server).is_none() {
        return Err(CommandError::UnknownServer(server));
    }
    let mut next = state.clone();
    charge(&mut next, Decimal::from(REPAIR_COST_USD))?;
    let mut repaired = String::new();
    if let Some(node) = next.servers.iter_mut().find(|s| s.id == server) {
        node.is_online = true;
        node.health = 100;
        repaired = node.name.clone();
    }
    next.push_event(format!("Server {repaired} repaired"), EventKind::Success);
    Ok(next)
}

pub fn mitigate_ddos(state: &GameState) -> Result<GameState, CommandError> {
    let mut next = state.clone();
    charge(&mut next, Decimal::from(DDOS_MITIGATION_COST_USD))?;
    next.ddos_severity = 0.0;
    next.push_event("DDoS traffic scrubbed", EventKind::Success);
    Ok(next)
}

/// Remove one subscriber from the most populated plan, if any.
fn drop_one_subscriber(state: &mut GameState) {
    if let Some(plan) = state.most_populated_plan_mut() {
        plan.active_users = plan.active_users.saturating_sub(1);
    }
}

pub fn resolve_ticket(
    state: &GameState,
    ticket: TicketId,
    action: TicketAction,
) -> Result<GameState, CommandError> {
    let open = state
        .tickets
        .iter()
        .find(|t| t.id == ticket)
        .ok_or(CommandError::UnknownTicket(ticket))?;
    let mut next = state.clone();
    match action {
        TicketAction::Solve => next.adjust_reputation(if open.is_vip { 3.0 } else { 1.0 }),
        TicketAction::Refund => {
            next.cash -= Decimal::from(REFUND_COST_USD);
            next.adjust_reputation(2.0);
            drop_one_subscriber(&mut next);
        }
        TicketAction::Ban => {
            next.adjust_reputation(-5.0);
            drop_one_subscriber(&mut next);
        }
    }
    next.tickets.retain(|t| t.id != ticket);
    next.push_event(
        format!("Ticket from {} closed ({action:?})", open.user_id),
        EventKind::Info,
    );
    Ok(next)
}

pub fn unlock_research(
    state: &GameState,
    catalogs: &Catalogs,
    research: &ResearchId,
) -> Result<GameState, CommandError> {
    let item = catalogs
        .research_item(research)
        .ok_or_else(|| CommandError::UnknownCatalogId(research.0.clone()))?;
    if state.research.contains(research) {
        return Err(CommandError::ResearchAlreadyUnlocked(research.clone()));
    }
    let mut next = state.clone();
    charge(&mut next, item.cost)?;
    next.research.insert(research.clone());
    next.push_event(format!("Research unlocked: {}", item.name), EventKind::Success);
    Ok(next)
}

pub fn create_plan(
    state: &GameState,
    catalogs: &Catalogs,
    spec: &PlanSpec,
) -> Result<GameState, CommandError> {
    if state.servers.is_empty() {
        return Err(CommandError::NoServersAvailable);
    }
    let name = spec.name.trim();
    if name.is_empty() {
        return Err(CommandError::EmptyPlanName);
    }
    let node = state.server(spec.node).ok_or(CommandError::NoNodeSelected)?;
    if state.plans.iter().any(|p| p.name == name) {
        return Err(CommandError::DuplicatePlanName(name.to_string()));
    }
    if spec.shape.cpu_cores == 0 || spec.shape.ram_gb == 0 {
        return Err(EconError::EmptyShape.into());
    }
    if spec.price_monthly < Decimal::ZERO {
        return Err(CommandError::InvalidPlan("price must not be negative"));
    }
    if spec.price_monthly > Decimal::from(MAX_PLAN_PRICE_USD) {
        return Err(CommandError::InvalidPlan("price is above the listing limit"));
    }
    let region = catalogs
        .hardware(&node.model)
        .map(|h| h.region)
        .unwrap_or(Region::US);

    let mut next = state.clone();
    let id = PlanId(next.allocate_id());
    next.plans.push(VpsPlan {
        id,
        node: spec.node,
        level: spec.level,
        name: name.to_string(),
        cpu_cores: spec.shape.cpu_cores,
        ram_gb: spec.shape.ram_gb,
        disk_gb: spec.shape.disk_gb,
        bandwidth_mbps: spec.shape.bandwidth_mbps,
        price_monthly: spec.price_monthly,
        active_users: 0,
        region,
    });
    next.push_event(format!("New plan: {name}"), EventKind::Info);
    Ok(next)
}

pub fn delete_plan(state: &GameState, plan: PlanId) -> Result<GameState, CommandError> {
    let existing = state.plan(plan).ok_or(CommandError::UnknownPlan(plan))?;
    if existing.active_users > 0 {
        return Err(CommandError::PlanHasActiveUsers {
            name: existing.name.clone(),
            users: existing.active_users,
        });
    }
    let mut next = state.clone();
    next.plans.retain(|p| p.id != plan);
    next.push_event(format!("Plan retired: {}", existing.name), EventKind::Info);
    Ok(next)
}

pub fn post_to_forum<R: RandomSource + ?Sized>(
    state: &GameState,
    catalogs: &Catalogs,
    forum_id: &str,
    strategy: ContentStrategy,
    rng: &mut R,
) -> Result<GameState, CommandError> {
    let forum = catalogs
        .forum(forum_id)
        .ok_or_else(|| CommandError::UnknownCatalogId(forum_id.to_string()))?;
    let mut next = state.clone();
    let outcome = resolve_forum_post(forum, strategy, rng);
    info!(forum = %forum.id, ?strategy, ?outcome, "forum post resolved");
    match outcome {
        ForumOutcome::Banned => {
            next.adjust_reputation(-FORUM_BAN_PENALTY);
            next.push_event(format!("Banned on {}!", forum.name), EventKind::Error);
        }
        ForumOutcome::DdosTriggered => {
            next.ddos_severity += FORUM_DDOS_SEVERITY;
            next.push_event(
                format!("DDoS attack triggered from {}", forum.name),
                EventKind::Error,
            );
        }
        ForumOutcome::Success { traffic } => {
            next.marketing_boost += traffic * FORUM_TRAFFIC_TO_BOOST;
            next.push_event(format!("Viral post on {}", forum.name), EventKind::Success);
        }
        ForumOutcome::Ignored => {
            next.push_event(format!("Post ignored on {}", forum.name), EventKind::Warning);
        }
    }
    Ok(next)
}

pub fn buy_ad(
    state: &GameState,
    catalogs: &Catalogs,
    ad_id: &str,
) -> Result<GameState, CommandError> {
    let ad = catalogs
        .ad(ad_id)
        .ok_or_else(|| CommandError::UnknownCatalogId(ad_id.to_string()))?;
    let effect = ad_campaign(state.cash, ad)?;
    let mut next = state.clone();
    next.cash -= effect.cost;
    next.marketing_boost += effect.marketing_boost;
    next.push_event(format!("Ad running: {}", ad.name), EventKind::Success);
    Ok(next)
}

pub fn hire_influencer(
    state: &GameState,
    catalogs: &Catalogs,
    influencer_id: &str,
) -> Result<GameState, CommandError> {
    let influencer = catalogs
        .influencer(influencer_id)
        .ok_or_else(|| CommandError::UnknownCatalogId(influencer_id.to_string()))?;
    let effect = influencer_campaign(state.cash, influencer)?;
    let mut next = state.clone();
    next.cash -= effect.cost;
    next.marketing_boost += effect.marketing_boost;
    next.adjust_reputation(effect.reputation_delta);
    next.push_event(format!("Sponsored review by {}", influencer.name), EventKind::Success);
    Ok(next)
}

/// Start or stop the clock. Never fails.
pub fn set_paused(state: &GameState, paused: bool) -> GameState {
    let mut next = state.clone();
    next.paused = paused;
    let message = if paused {
        "Simulation paused"
    } else {
        "Simulation running"
    };
    next.push_event(message, EventKind::Info);
    next
}

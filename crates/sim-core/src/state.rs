//! The single game-state aggregate and the entities it owns.

use crate::catalog::{Catalogs, HardwareId, Region, ResearchId};
use crate::milestone::Milestone;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// Most recent events retained in the log.
pub const MAX_EVENTS: usize = 50;
/// Most recent reviews retained in the feed.
pub const MAX_REVIEWS: usize = 20;
pub const INITIAL_CASH_USD: i64 = 1500;
pub const INITIAL_REPUTATION: f64 = 50.0;
/// Ticks a VIP ticket stays open.
pub const VIP_EXPIRY_TICKS: i32 = 30;
/// Ticks a regular ticket stays open.
pub const STANDARD_EXPIRY_TICKS: i32 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TicketId(pub u64);

fn full_health() -> u8 {
    100
}

fn online_default() -> bool {
    true
}

/// A purchased machine. Never deleted; may go offline and be repaired.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerNode {
    pub id: ServerId,
    pub model: HardwareId,
    pub name: String,
    pub purchase_day: u32,
    /// Health in [0,100].
    #[serde(default = "full_health")]
    pub health: u8,
    #[serde(default = "online_default")]
    pub is_online: bool,
}

/// Marketing tier of a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanLevel {
    Intro,
    SE,
    Plus,
    Pro,
    Ultra,
    Max,
}

impl PlanLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanLevel::Intro => "Intro",
            PlanLevel::SE => "SE",
            PlanLevel::Plus => "Plus",
            PlanLevel::Pro => "Pro",
            PlanLevel::Ultra => "Ultra",
            PlanLevel::Max => "Max",
        }
    }
}

/// A subscription product carved out of a node.
///
/// Allocations are independent of the node's physical capacity; overselling
/// is allowed. `region` is a snapshot taken when the plan was created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VpsPlan {
    pub id: PlanId,
    pub node: ServerId,
    pub level: PlanLevel,
    pub name: String,
    pub cpu_cores: u32,
    pub ram_gb: u32,
    pub disk_gb: u32,
    pub bandwidth_mbps: u32,
    pub price_monthly: Decimal,
    pub active_users: u64,
    pub region: Region,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: u64,
    pub day: u32,
    pub message: String,
    pub kind: EventKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Slow,
    Down,
    Refund,
    Question,
    Attack,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: TicketId,
    pub user_id: String,
    pub is_vip: bool,
    pub issue_type: IssueType,
    pub created_on_day: u32,
    /// Counts down once per tick; the ticket expires at zero.
    pub expires_in_ticks: i32,
    /// 1..=3
    pub difficulty: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserReview {
    pub id: u64,
    pub username: String,
    pub content: String,
    pub sentiment: Sentiment,
    pub timestamp: NaiveDate,
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Clamp a reputation value into [0, 100]. NaN collapses to 0.
pub fn clamp_reputation(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Complete game state. Transition functions take it by reference and return
/// a new value; nothing mutates a shared instance in place.
///
/// Missing fields in a persisted blob default from [`GameState::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    /// Simulated day, starts at 1.
    pub day: u32,
    /// Calendar date of day 1.
    pub start_date: NaiveDate,
    /// May go negative.
    pub cash: Decimal,
    /// Always within [0, 100].
    pub reputation: f64,
    pub servers: Vec<ServerNode>,
    pub plans: Vec<VpsPlan>,
    /// Oldest first, at most [`MAX_EVENTS`].
    pub events: Vec<GameEvent>,
    pub tickets: Vec<SupportTicket>,
    pub milestones: Vec<Milestone>,
    /// Newest first, at most [`MAX_REVIEWS`].
    pub reviews: Vec<UserReview>,
    pub research: BTreeSet<ResearchId>,
    pub paused: bool,
    /// >= 1.0, decays toward 1.0.
    pub marketing_boost: f64,
    /// >= 0.0, decays toward 0.0.
    pub ddos_severity: f64,
    /// Next free entity id.
    pub next_id: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            day: 1,
            start_date: default_start_date(),
            cash: Decimal::from(INITIAL_CASH_USD),
            reputation: INITIAL_REPUTATION,
            servers: Vec::new(),
            plans: Vec::new(),
            events: Vec::new(),
            tickets: Vec::new(),
            milestones: Vec::new(),
            reviews: Vec::new(),
            research: BTreeSet::new(),
            paused: true,
            marketing_boost: 1.0,
            ddos_severity: 0.0,
            next_id: 1,
        }
    }
}

impl GameState {
    /// A fresh game with the free starter node and plan already deployed.
    pub fn new_game(catalogs: &Catalogs) -> Self {
        let mut state = GameState {
            milestones: catalogs.milestones.clone(),
            ..GameState::default()
        };
        let starter = catalogs
            .hardware(&catalogs.starter_hardware)
            .or_else(|| catalogs.hardware.first());
        if let Some(model) = starter {
            let server = ServerId(state.allocate_id());
            state.servers.push(ServerNode {
                id: server,
                model: model.id.clone(),
                name: "STARTER-NODE-01".to_string(),
                purchase_day: 1,
                health: 100,
                is_online: true,
            });
            let plan = PlanId(state.allocate_id());
            state.plans.push(VpsPlan {
                id: plan,
                node: server,
                level: PlanLevel::Intro,
                name: "STARTER KVM 1G".to_string(),
                cpu_cores: 1,
                ram_gb: 1,
                disk_gb: 10,
                bandwidth_mbps: 100,
                price_monthly: Decimal::new(199, 2),
                active_users: 0,
                region: model.region,
            });
            state.push_event(
                "Welcome! A free starter node has been deployed for you.",
                EventKind::Success,
            );
        }
        state.push_event(
            "System initialized. Newbie shield active (30 days without churn).",
            EventKind::Info,
        );
        state
    }

    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append to the event log, dropping the oldest beyond [`MAX_EVENTS`].
    pub fn push_event(&mut self, message: impl Into<String>, kind: EventKind) {
        let id = self.allocate_id();
        self.events.push(GameEvent {
            id,
            day: self.day,
            message: message.into(),
            kind,
        });
        if self.events.len() > MAX_EVENTS {
            let excess = self.events.len() - MAX_EVENTS;
            self.events.drain(..excess);
        }
    }

    /// Prepend to the review feed, keeping the newest [`MAX_REVIEWS`].
    pub fn push_review(&mut self, review: UserReview) {
        self.reviews.insert(0, review);
        self.reviews.truncate(MAX_REVIEWS);
    }

    pub fn set_reputation(&mut self, value: f64) {
        self.reputation = clamp_reputation(value);
    }

    pub fn adjust_reputation(&mut self, delta: f64) {
        self.set_reputation(self.reputation + delta);
    }

    pub fn total_users(&self) -> u64 {
        self.plans.iter().map(|p| p.active_users).sum()
    }

    pub fn server(&self, id: ServerId) -> Option<&ServerNode> {
        self.servers.iter().find(|s| s.id == id)
    }

    pub fn plan(&self, id: PlanId) -> Option<&VpsPlan> {
        self.plans.iter().find(|p| p.id == id)
    }

    /// Plan with the most subscribers; ties resolve to the later plan.
    pub fn most_populated_plan_mut(&mut self) -> Option<&mut VpsPlan> {
        self.plans.iter_mut().max_by_key(|p| p.active_users)
    }

    /// Calendar date of the current simulated day.
    pub fn calendar_date(&self) -> NaiveDate {
        let offset = u64::from(self.day.saturating_sub(1));
        self.start_date
            .checked_add_days(Days::new(offset))
            .unwrap_or(self.start_date)
    }

    /// Repair a state restored from storage so every invariant holds again.
    ///
    /// Milestones are rebuilt from the catalog (keeping saved `achieved`
    /// flags), unknown research is dropped, scalars are clamped, logs are
    /// truncated, the id counter is advanced past every existing id and the
    /// game is paused.
    pub fn normalize(mut self, catalogs: &Catalogs) -> Self {
        if self.day == 0 {
            self.day = 1;
        }
        let reputation = clamp_reputation(self.reputation);
        if reputation != self.reputation {
            warn!(saved = self.reputation, reputation, "clamped reputation on load");
            self.reputation = reputation;
        }
        if !self.marketing_boost.is_finite() || self.marketing_boost < 1.0 {
            self.marketing_boost = 1.0;
        }
        if !self.ddos_severity.is_finite() || self.ddos_severity < 0.0 {
            self.ddos_severity = 0.0;
        }

        let before = self.research.len();
        self.research.retain(|id| catalogs.research_item(id).is_some());
        if self.research.len() != before {
            warn!(
                dropped = before - self.research.len(),
                "dropped unknown research on load"
            );
        }

        let achieved: HashMap<_, _> = self
            .milestones
            .iter()
            .map(|m| (m.id.clone(), m.achieved))
            .collect();
        self.milestones = catalogs
            .milestones
            .iter()
            .map(|m| Milestone {
                achieved: achieved.get(&m.id).copied().unwrap_or(false),
                ..m.clone()
            })
            .collect();

        for ticket in self.tickets.iter_mut() {
            let expires = ticket.expires_in_ticks.clamp(0, STANDARD_EXPIRY_TICKS);
            let difficulty = ticket.difficulty.clamp(1, 3);
            if expires != ticket.expires_in_ticks || difficulty != ticket.difficulty {
                warn!(ticket = ticket.id.0, "repaired ticket on load");
                ticket.expires_in_ticks = expires;
                ticket.difficulty = difficulty;
            }
        }

        if self.events.len() > MAX_EVENTS {
            let excess = self.events.len() - MAX_EVENTS;
            self.events.drain(..excess);
        }
        self.reviews.truncate(MAX_REVIEWS);

        let highest = self
            .servers
            .iter()
            .map(|s| s.id.0)
            .chain(self.plans.iter().map(|p| p.id.0))
            .chain(self.tickets.iter().map(|t| t.id.0))
            .chain(self.events.iter().map(|e| e.id))
            .chain(self.reviews.iter().map(|r| r.id))
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(highest + 1);

        self.paused = true;
        self
    }
}

//! Read-only reference tables: hardware, research, marketing channels,
//! milestones and review phrase pools.

use crate::milestone::{Milestone, MilestoneCondition, MilestoneId};
use crate::state::Sentiment;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier of a hardware model, e.g. "jp-sb".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HardwareId(pub String);

impl From<&str> for HardwareId {
    fn from(s: &str) -> Self {
        HardwareId(s.to_string())
    }
}

/// Identifier of a research upgrade, e.g. "seo_mastery".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResearchId(pub String);

impl From<&str> for ResearchId {
    fn from(s: &str) -> Self {
        ResearchId(s.to_string())
    }
}

/// Datacenter region of a hardware model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    US,
    HK,
    JP,
    SG,
    DE,
}

impl Region {
    pub fn as_str(self) -> &'static str {
        match self {
            Region::US => "US",
            Region::HK => "HK",
            Region::JP => "JP",
            Region::SG => "SG",
            Region::DE => "DE",
        }
    }

    /// Regional price multiplier applied by plan suggestions.
    pub fn price_multiplier(self) -> Decimal {
        match self {
            Region::HK => Decimal::new(25, 1),
            Region::JP => Decimal::new(15, 1),
            Region::SG => Decimal::new(18, 1),
            Region::US | Region::DE => Decimal::ONE,
        }
    }
}

/// Addressing type of the uplink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpType {
    Native,
    Broadcast,
}

fn purchasable_default() -> bool {
    true
}

/// A server model offered on the hardware market.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HardwareModel {
    pub id: HardwareId,
    pub name: String,
    pub cpu_cores: u32,
    pub ram_gb: u32,
    pub disk_gb: u32,
    pub bandwidth_mbps: u32,
    /// One-off purchase price.
    pub purchase_cost: Decimal,
    /// Upkeep charged every simulated day while online.
    pub daily_upkeep: Decimal,
    /// Reliability in [0,1].
    pub reliability: f64,
    pub description: String,
    pub region: Region,
    pub network_route: String,
    pub ip_type: IpType,
    /// Free starter hardware cannot be bought.
    #[serde(default = "purchasable_default")]
    pub purchasable: bool,
}

/// Kind of passive bonus granted by a research upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchEffect {
    UpkeepReduction,
    MarketingBoost,
    AutoSupport,
    DdosResistance,
    ChurnReduction,
}

/// A permanent upgrade purchasable in the lab.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResearchItem {
    pub id: ResearchId,
    pub name: String,
    pub description: String,
    pub cost: Decimal,
    pub effect: ResearchEffect,
    pub effect_value: f64,
}

/// Moderation style of a forum, which changes how posts resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForumKind {
    Standard,
    /// High traffic, doubled impact and a chance of provoking a DDoS.
    Chaotic,
    /// Bans affiliate spam outright.
    Strict,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Forum {
    pub id: String,
    pub name: String,
    /// Chance of a hostile outcome in [0,1].
    pub risk: f64,
    pub traffic_potential: f64,
    pub user_quality: f64,
    pub kind: ForumKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdPlatform {
    pub id: String,
    pub name: String,
    pub cost: Decimal,
    pub traffic_boost: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Influencer {
    pub id: String,
    pub name: String,
    pub cost: Decimal,
    pub traffic_boost: f64,
    pub reputation_impact: f64,
}

/// Usernames and review phrases, keyed by sentiment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewPools {
    pub usernames: Vec<String>,
    pub positive: Vec<String>,
    pub neutral: Vec<String>,
    pub negative: Vec<String>,
}

impl ReviewPools {
    pub fn templates(&self, sentiment: Sentiment) -> &[String] {
        match sentiment {
            Sentiment::Positive => &self.positive,
            Sentiment::Neutral => &self.neutral,
            Sentiment::Negative => &self.negative,
        }
    }
}

/// All static tables the engine reads. Immutable for the process lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Catalogs {
    pub hardware: Vec<HardwareModel>,
    pub research: Vec<ResearchItem>,
    pub forums: Vec<Forum>,
    pub ads: Vec<AdPlatform>,
    pub influencers: Vec<Influencer>,
    pub milestones: Vec<Milestone>,
    pub reviews: ReviewPools,
    /// Model deployed for free when a new game starts.
    pub starter_hardware: HardwareId,
}

impl Catalogs {
    pub fn hardware(&self, id: &HardwareId) -> Option<&HardwareModel> {
        self.hardware.iter().find(|h| &h.id == id)
    }

    pub fn research_item(&self, id: &ResearchId) -> Option<&ResearchItem> {
        self.research.iter().find(|r| &r.id == id)
    }

    pub fn forum(&self, id: &str) -> Option<&Forum> {
        self.forums.iter().find(|f| f.id == id)
    }

    pub fn ad(&self, id: &str) -> Option<&AdPlatform> {
        self.ads.iter().find(|a| a.id == id)
    }

    pub fn influencer(&self, id: &str) -> Option<&Influencer> {
        self.influencers.iter().find(|k| k.id == id)
    }

    /// Sum of effect values over the unlocked research items with `effect`.
    /// Unknown ids contribute nothing.
    pub fn research_effect_total<'a, I>(&self, unlocked: I, effect: ResearchEffect) -> f64
    where
        I: IntoIterator<Item = &'a ResearchId>,
    {
        unlocked
            .into_iter()
            .filter_map(|id| self.research_item(id))
            .filter(|r| r.effect == effect)
            .map(|r| r.effect_value)
            .sum()
    }

    /// The built-in tables.
    pub fn standard() -> Self {
        Catalogs {
            hardware: standard_hardware(),
            research: standard_research(),
            forums: standard_forums(),
            ads: vec![
                AdPlatform {
                    id: "google".into(),
                    name: "Google Ads".into(),
                    cost: Decimal::new(250, 0),
                    traffic_boost: 2.0,
                },
                AdPlatform {
                    id: "telegram".into(),
                    name: "Telegram Channel".into(),
                    cost: Decimal::new(150, 0),
                    traffic_boost: 1.5,
                },
                AdPlatform {
                    id: "adult".into(),
                    name: "Adult Site Banner".into(),
                    cost: Decimal::new(350, 0),
                    traffic_boost: 2.5,
                },
            ],
            influencers: vec![
                Influencer {
                    id: "small".into(),
                    name: "Indie Tech Blogger".into(),
                    cost: Decimal::new(250, 0),
                    traffic_boost: 1.8,
                    reputation_impact: 3.0,
                },
                Influencer {
                    id: "medium".into(),
                    name: "Affiliate Man".into(),
                    cost: Decimal::new(400, 0),
                    traffic_boost: 3.5,
                    reputation_impact: -3.0,
                },
                Influencer {
                    id: "large".into(),
                    name: "Top Benchmark Reviewer".into(),
                    cost: Decimal::new(1500, 0),
                    traffic_boost: 5.0,
                    reputation_impact: 8.0,
                },
            ],
            milestones: standard_milestones(),
            reviews: standard_review_pools(),
            starter_hardware: HardwareId::from("starter-kvm"),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn model(
    id: &str,
    name: &str,
    (cpu_cores, ram_gb, disk_gb, bandwidth_mbps): (u32, u32, u32, u32),
    purchase_cost: Decimal,
    daily_upkeep: Decimal,
    reliability: f64,
    region: Region,
    network_route: &str,
    ip_type: IpType,
    description: &str,
) -> HardwareModel {
    HardwareModel {
        id: HardwareId::from(id),
        name: name.to_string(),
        cpu_cores,
        ram_gb,
        disk_gb,
        bandwidth_mbps,
        purchase_cost,
        daily_upkeep,
        reliability,
        description: description.to_string(),
        region,
        network_route: network_route.to_string(),
        ip_type,
        purchasable: true,
    }
}

fn standard_hardware() -> Vec<HardwareModel> {
    let mut starter = model(
        "starter-kvm",
        "Starter KVM",
        (2, 4, 60, 500),
        Decimal::ZERO,
        Decimal::ZERO,
        0.99,
        Region::US,
        "Cogent",
        IpType::Native,
        "A free starter server to get you going.",
    );
    starter.purchasable = false;
    vec![
        starter,
        model(
            "us-scrap",
            "US Backyard E5",
            (8, 16, 500, 1000),
            Decimal::new(200, 0),
            Decimal::ONE,
            0.8,
            Region::US,
            "Cogent",
            IpType::Native,
            "Hosted in a garage in LA. Cheap, dirty, high bandwidth.",
        ),
        model(
            "hk-lite",
            "HK BGP Lite",
            (4, 8, 120, 50),
            Decimal::new(400, 0),
            Decimal::new(4, 0),
            0.9,
            Region::HK,
            "BGP",
            IpType::Broadcast,
            "Entry level Hong Kong server. Low latency for mainland, but bandwidth is expensive.",
        ),
        model(
            "jp-sb",
            "JP Softbank Line",
            (16, 32, 1000, 500),
            Decimal::new(800, 0),
            Decimal::new(8, 0),
            0.95,
            Region::JP,
            "Softbank",
            IpType::Native,
            "Excellent Softbank line, great for connectivity.",
        ),
        model(
            "us-9929",
            "US CU 9929 VIP",
            (24, 64, 2000, 200),
            Decimal::new(1500, 0),
            Decimal::new(12, 0),
            0.98,
            Region::US,
            "AS9929",
            IpType::Native,
            "Premium China Unicom 9929 route. Very stable.",
        ),
        model(
            "hk-cn2",
            "HK CN2 GIA Enterprise",
            (32, 128, 4000, 20),
            Decimal::new(3000, 0),
            Decimal::new(25, 0),
            0.99,
            Region::HK,
            "CN2 GIA",
            IpType::Native,
            "The holy grail of routes. Extremely low latency, extremely low bandwidth.",
        ),
        model(
            "sg-aws",
            "SG High-Perf Node",
            (64, 256, 5000, 5000),
            Decimal::new(5000, 0),
            Decimal::new(40, 0),
            0.99,
            Region::SG,
            "BGP",
            IpType::Broadcast,
            "Top tier hardware in Singapore. Great for SE Asia users.",
        ),
    ]
}

fn research(
    id: &str,
    name: &str,
    description: &str,
    cost: i64,
    effect: ResearchEffect,
    effect_value: f64,
) -> ResearchItem {
    ResearchItem {
        id: ResearchId::from(id),
        name: name.to_string(),
        description: description.to_string(),
        cost: Decimal::new(cost, 0),
        effect,
        effect_value,
    }
}

fn standard_research() -> Vec<ResearchItem> {
    vec![
        research(
            "auto_bot_v1",
            "Auto Support Bot",
            "A simple script auto-answers 30% of basic questions.",
            500,
            ResearchEffect::AutoSupport,
            0.3,
        ),
        research(
            "liquid_cooling",
            "Liquid Cooling",
            "Better datacenter cooling cuts server upkeep by 15%.",
            800,
            ResearchEffect::UpkeepReduction,
            0.15,
        ),
        research(
            "seo_mastery",
            "SEO Mastery",
            "Search ranking boost, marketing 20% more effective.",
            1200,
            ResearchEffect::MarketingBoost,
            0.2,
        ),
        research(
            "churn_algo",
            "Loyalty Program",
            "Happier, stickier customers renew 10% more often.",
            1500,
            ResearchEffect::ChurnReduction,
            0.1,
        ),
        research(
            "anycast_dns",
            "Anycast DNS",
            "Global resolution speedup, far fewer slowness complaints.",
            2000,
            ResearchEffect::ChurnReduction,
            0.15,
        ),
        research(
            "ddos_shield_pro",
            "DDoS Shield Pro",
            "Passive filtering that mitigates 30% of attack impact.",
            3000,
            ResearchEffect::DdosResistance,
            0.3,
        ),
    ]
}

fn standard_forums() -> Vec<Forum> {
    let forum = |id: &str, name: &str, risk, traffic_potential, user_quality, kind| Forum {
        id: id.to_string(),
        name: name.to_string(),
        risk,
        traffic_potential,
        user_quality,
        kind,
    };
    vec![
        forum("linuxdo", "Linux.do", 0.1, 3.0, 0.9, ForumKind::Standard),
        forum("nodeseek", "NodeSeek", 0.3, 5.0, 0.7, ForumKind::Standard),
        forum("v2ex", "V2EX", 0.5, 4.0, 0.8, ForumKind::Strict),
        forum("hostloc", "HostLoc", 0.8, 8.0, 0.4, ForumKind::Chaotic),
    ]
}

fn milestone(
    id: &str,
    name: &str,
    description: &str,
    reward: i64,
    condition: MilestoneCondition,
) -> Milestone {
    Milestone {
        id: MilestoneId(id.to_string()),
        name: name.to_string(),
        description: description.to_string(),
        reward_cash: Decimal::new(reward, 0),
        condition,
        achieved: false,
    }
}

fn standard_milestones() -> Vec<Milestone> {
    use MilestoneCondition::*;
    vec![
        milestone("first_user", "Hello World", "Get your first subscriber", 50, AnyPlanHasUsers),
        milestone("first_server", "Server Room Founded", "Buy your first server", 100, ServerCountAtLeast(2)),
        milestone("first_plan", "Product Manager", "Publish your first VPS plan", 80, PlanCountAtLeast(2)),
        milestone("cash_1k", "Seed Capital", "Hold $1,000 in cash", 200, CashAtLeast(Decimal::new(1_000, 0))),
        milestone("users_10", "Team of Ten", "Reach 10 subscribers", 150, UserCountAtLeast(10)),
        milestone("users_50", "Traffic Master", "Reach 50 subscribers", 500, UserCountAtLeast(50)),
        milestone("users_100", "Hundred Club", "Reach 100 subscribers", 1000, UserCountAtLeast(100)),
        milestone("server_3", "Cluster Admin", "Own 3 servers", 300, ServerCountAtLeast(3)),
        milestone("reputation_70", "Good Word of Mouth", "Reach 70 reputation", 400, ReputationAtLeast(70.0)),
        milestone("reputation_90", "Legendary Host", "Reach 90 reputation", 1000, ReputationAtLeast(90.0)),
        milestone("cash_10k", "Comfortable Living", "Hold $10,000 in cash", 1500, CashAtLeast(Decimal::new(10_000, 0))),
        milestone("users_200", "Double Century", "Reach 200 subscribers", 2000, UserCountAtLeast(200)),
        milestone("server_5", "Datacenter Expansion", "Own 5 servers", 800, ServerCountAtLeast(5)),
        milestone("reputation_100", "Five Stars", "Reach a perfect 100 reputation", 2000, ReputationAtLeast(100.0)),
        milestone("plans_5", "Product Matrix", "Sell 5 plans at once", 600, PlanCountAtLeast(5)),
        milestone("overselling_master", "Overselling Master", "Oversell CPU 8.0x", 1500, CpuOversellAtLeast(8.0)),
        milestone("day_30", "First Anniversary", "Stay in business for 365 days", 300, DayAtLeast(365)),
        milestone("day_3650", "Ten Year Shop", "Stay in business for 3650 days", 2000, DayAtLeast(3650)),
        milestone("research_3", "Tech Pioneer", "Unlock 3 research upgrades", 1000, ResearchCountAtLeast(3)),
        milestone("multi_region", "Global Footprint", "Deploy servers in 3 regions", 1200, DistinctRegionsAtLeast(3)),
    ]
}

fn standard_review_pools() -> ReviewPools {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    ReviewPools {
        usernames: owned(&[
            "mjj_king",
            "host_lover",
            "linux_fan",
            "py_coder",
            "node_master",
            "cheap_vps",
            "server_hunter",
            "uptime_robot",
            "cloud_native",
            "docker_boy",
            "zhuji_player",
            "404_not_found",
            "admin_root",
            "sudo_user",
        ]),
        positive: owned(&[
            "Speeds are flying!",
            "Unbeatable value.",
            "Provisioned in seconds, love it.",
            "Latency to Shanghai is tiny.",
            "Support was friendly.",
            "Rock solid.",
        ]),
        neutral: owned(&[
            "Fair price for the specs.",
            "Nothing special.",
            "A bit jittery at peak hours.",
            "Waiting for a restock.",
            "Panel is ugly but it works.",
        ]),
        negative: owned(&[
            "Garbage host!",
            "Down again?",
            "Give me my money back!",
            "Disk I/O slower than a floppy.",
            "Offline around the clock.",
            "Ticket unanswered for three days.",
            "Overselling maniac.",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_lookups() {
        let c = Catalogs::standard();
        let starter = c.hardware(&c.starter_hardware).unwrap();
        assert!(!starter.purchasable);
        assert_eq!(starter.daily_upkeep, Decimal::ZERO);
        assert_eq!(c.forum("v2ex").unwrap().kind, ForumKind::Strict);
        assert_eq!(c.forum("hostloc").unwrap().kind, ForumKind::Chaotic);
        assert!(c.ad("google").is_some());
        assert!(c.influencer("nobody").is_none());
        assert_eq!(c.milestones.len(), 20);
    }

    #[test]
    fn research_totals_only_count_matching_effects() {
        let c = Catalogs::standard();
        let unlocked = [
            ResearchId::from("churn_algo"),
            ResearchId::from("anycast_dns"),
            ResearchId::from("seo_mastery"),
            ResearchId::from("not_a_thing"),
        ];
        let churn = c.research_effect_total(&unlocked, ResearchEffect::ChurnReduction);
        assert!((churn - 0.25).abs() < 1e-9);
        let marketing = c.research_effect_total(&unlocked, ResearchEffect::MarketingBoost);
        assert!((marketing - 0.2).abs() < 1e-9);
        assert_eq!(
            c.research_effect_total(&unlocked, ResearchEffect::UpkeepReduction),
            0.0
        );
    }

    #[test]
    fn region_multipliers() {
        assert_eq!(Region::HK.price_multiplier(), Decimal::new(25, 1));
        assert_eq!(Region::DE.price_multiplier(), Decimal::ONE);
    }
}

//! Forum, ad and influencer resolution.

use crate::EconError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{AdPlatform, Forum, ForumKind, Influencer, RandomSource};

/// Kind of forum post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStrategy {
    /// Technical write-up: safe, modest reach.
    Tech,
    /// Referral spam: risky, large reach.
    Affiliate,
    /// Hard-luck story.
    Sympathy,
}

impl ContentStrategy {
    /// (success-rate delta, impact multiplier)
    fn modifiers(self) -> (f64, f64) {
        match self {
            ContentStrategy::Tech => (0.2, 1.2),
            ContentStrategy::Affiliate => (-0.3, 3.0),
            ContentStrategy::Sympathy => (0.1, 1.5),
        }
    }
}

/// What a forum post did. Exactly one outcome per post.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ForumOutcome {
    Banned,
    DdosTriggered,
    Success { traffic: f64 },
    Ignored,
}

const BASE_SUCCESS_RATE: f64 = 0.5;

/// Resolve a post on `forum`.
///
/// Chaotic forums double the impact and roll a DDoS trigger at their risk
/// before the success roll; strict forums ban affiliate posts outright. A ban
/// wins over every other outcome, then a DDoS, then success.
pub fn resolve_forum_post<R: RandomSource + ?Sized>(
    forum: &Forum,
    strategy: ContentStrategy,
    rng: &mut R,
) -> ForumOutcome {
    let (rate_delta, mut impact) = strategy.modifiers();
    let success_rate = BASE_SUCCESS_RATE + rate_delta;
    let mut ddos = false;
    let mut banned = false;

    match forum.kind {
        ForumKind::Chaotic => {
            impact *= 2.0;
            ddos = rng.chance(forum.risk);
        }
        ForumKind::Strict => banned = strategy == ContentStrategy::Affiliate,
        ForumKind::Standard => {}
    }

    let success = rng.chance(success_rate) && !banned;
    if banned {
        ForumOutcome::Banned
    } else if ddos {
        ForumOutcome::DdosTriggered
    } else if success {
        ForumOutcome::Success {
            traffic: forum.traffic_potential * impact,
        }
    } else {
        ForumOutcome::Ignored
    }
}

/// Paid campaign effect to apply to the state.
#[derive(Clone, Debug, PartialEq)]
pub struct CampaignEffect {
    pub cost: Decimal,
    pub marketing_boost: f64,
    pub reputation_delta: f64,
}

fn ensure_funds(cash: Decimal, cost: Decimal) -> Result<(), EconError> {
    if cash < cost {
        return Err(EconError::InsufficientFunds {
            needed: cost,
            available: cash,
        });
    }
    Ok(())
}

/// Price and boost of an ad buy.
pub fn ad_campaign(cash: Decimal, ad: &AdPlatform) -> Result<CampaignEffect, EconError> {
    ensure_funds(cash, ad.cost)?;
    Ok(CampaignEffect {
        cost: ad.cost,
        marketing_boost: ad.traffic_boost,
        reputation_delta: 0.0,
    })
}

/// Price, boost and reputation swing of an influencer hire.
pub fn influencer_campaign(
    cash: Decimal,
    influencer: &Influencer,
) -> Result<CampaignEffect, EconError> {
    ensure_funds(cash, influencer.cost)?;
    Ok(CampaignEffect {
        cost: influencer.cost,
        marketing_boost: influencer.traffic_boost,
        reputation_delta: influencer.reputation_impact,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::{Catalogs, ScriptedRng};

    fn forum(id: &str) -> Forum {
        Catalogs::standard().forum(id).unwrap().clone()
    }

    proptest! {
        #[test]
        fn strict_forum_always_bans_affiliate(draw in 0.0f64..1.0) {
            let outcome = resolve_forum_post(
                &forum("v2ex"),
                ContentStrategy::Affiliate,
                &mut ScriptedRng::constant(draw),
            );
            prop_assert_eq!(outcome, ForumOutcome::Banned);
        }
    }

    #[test]
    fn strict_forum_accepts_tech() {
        let outcome = resolve_forum_post(
            &forum("v2ex"),
            ContentStrategy::Tech,
            &mut ScriptedRng::constant(0.1),
        );
        assert_eq!(outcome, ForumOutcome::Success { traffic: 4.0 * 1.2 });
    }

    #[test]
    fn chaotic_forum_rolls_ddos_first() {
        let hostloc = forum("hostloc");
        // ddos roll hits even though the success roll would too
        let mut rng = ScriptedRng::new(vec![0.1, 0.1]);
        assert_eq!(
            resolve_forum_post(&hostloc, ContentStrategy::Tech, &mut rng),
            ForumOutcome::DdosTriggered
        );
        assert_eq!(rng.consumed(), 2);

        let mut rng = ScriptedRng::new(vec![0.9, 0.1]);
        assert_eq!(
            resolve_forum_post(&hostloc, ContentStrategy::Sympathy, &mut rng),
            ForumOutcome::Success {
                traffic: 8.0 * 1.5 * 2.0
            }
        );
    }

    #[test]
    fn missed_roll_is_ignored() {
        let outcome = resolve_forum_post(
            &forum("linuxdo"),
            ContentStrategy::Affiliate,
            &mut ScriptedRng::constant(0.25),
        );
        assert_eq!(outcome, ForumOutcome::Ignored);
    }

    #[test]
    fn campaigns_check_funds() {
        let c = Catalogs::standard();
        let google = c.ad("google").unwrap();
        let effect = ad_campaign(Decimal::from(300), google).unwrap();
        assert_eq!(effect.cost, Decimal::from(250));
        assert_eq!(effect.marketing_boost, 2.0);
        assert!(matches!(
            ad_campaign(Decimal::from(100), google),
            Err(EconError::InsufficientFunds { .. })
        ));

        let medium = c.influencer("medium").unwrap();
        let effect = influencer_campaign(Decimal::from(400), medium).unwrap();
        assert_eq!(effect.reputation_delta, -3.0);
    }
}

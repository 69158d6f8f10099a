//! Subscription renewal and rage-quit model.
//!
//! Subscribers are spread evenly over a 30-day billing cycle, so roughly a
//! thirtieth of them face a renewal decision each day.

use crate::MarketConditions;
use sim_core::RandomSource;

/// No subscriber leaves before this day.
pub const NEWBIE_SHIELD_DAYS: u32 = 30;
const BILLING_CYCLE_DAYS: u64 = 30;
const JITTER_PROBABILITY: f64 = 0.15;

/// Cumulative renewal penalties by overselling threshold.
const OVERSELL_PENALTIES: [(f64, f64); 5] = [
    (1.2, 0.08),
    (1.5, 0.15),
    (2.0, 0.25),
    (3.0, 0.35),
    (5.0, 0.50),
];

/// Probability that an expiring subscription renews, in [0, 1].
pub fn renewal_rate(market: &MarketConditions) -> f64 {
    let mut rate = 0.50 + (market.reputation / 100.0) * 0.40;
    rate += market.churn_research;
    for (threshold, penalty) in OVERSELL_PENALTIES {
        if market.overselling_ratio > threshold {
            rate -= penalty;
        }
    }
    if market.ddos_severity > 0.0 {
        rate -= 0.15 * market.ddos_severity;
    }
    rate.clamp(0.0, 1.0)
}

/// Whether service is bad enough for subscribers to leave mid-cycle.
pub fn is_rage_quit(market: &MarketConditions) -> bool {
    market.overselling_ratio > 6.0 || market.ddos_severity > 2.5
}

/// Subscribers lost by a plan with `active_users` this tick. Never exceeds
/// `active_users`.
pub fn churn<R: RandomSource + ?Sized>(
    active_users: u64,
    market: &MarketConditions,
    rng: &mut R,
) -> u64 {
    if active_users == 0 || market.day < NEWBIE_SHIELD_DAYS {
        return 0;
    }
    let expiring = active_users.div_ceil(BILLING_CYCLE_DAYS);
    let mut churned = (expiring as f64 * (1.0 - renewal_rate(market))).floor() as u64;

    if rng.chance(JITTER_PROBABILITY) {
        if rng.chance(0.5) {
            churned += 1;
        } else {
            churned = churned.saturating_sub(1);
        }
    }

    let rage_quit = if is_rage_quit(market) {
        (active_users as f64 * 0.05).ceil() as u64
    } else {
        0
    };

    (churned + rage_quit).min(active_users)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::ScriptedRng;

    fn market(day: u32, reputation: f64, ratio: f64, ddos: f64) -> MarketConditions {
        MarketConditions {
            day,
            reputation,
            overselling_ratio: ratio,
            marketing_boost: 1.0,
            ddos_severity: ddos,
            cpu_capacity: 8,
            marketing_research: 0.0,
            churn_research: 0.0,
        }
    }

    #[test]
    fn renewal_cycle_example() {
        let m = market(30, 80.0, 1.0, 0.0);
        assert!((renewal_rate(&m) - 0.82).abs() < 1e-9);
        // jitter roll misses
        assert_eq!(churn(300, &m, &mut ScriptedRng::constant(0.9)), 1);
        // jitter roll hits, then the coin adds one
        assert_eq!(churn(300, &m, &mut ScriptedRng::new(vec![0.1, 0.2])), 2);
        // jitter roll hits, then the coin removes one
        assert_eq!(churn(300, &m, &mut ScriptedRng::new(vec![0.1, 0.7])), 0);
    }

    #[test]
    fn oversell_penalties_stack() {
        let base = renewal_rate(&market(40, 100.0, 1.0, 0.0));
        let mild = renewal_rate(&market(40, 100.0, 1.3, 0.0));
        let heavy = renewal_rate(&market(40, 100.0, 2.5, 0.0));
        assert!((base - 0.9).abs() < 1e-9);
        assert!((mild - 0.82).abs() < 1e-9);
        assert!((heavy - 0.42).abs() < 1e-9);
        assert_eq!(renewal_rate(&market(40, 100.0, 5.5, 0.0)), 0.0);
    }

    #[test]
    fn rage_quit_takes_five_percent() {
        let m = market(40, 100.0, 7.0, 0.0);
        // renewal is 0: ceil(100/30)=4 expiring all churn, plus ceil(5)
        assert_eq!(churn(100, &m, &mut ScriptedRng::constant(0.9)), 9);
        let ddos = market(40, 100.0, 0.5, 3.0);
        assert!(is_rage_quit(&ddos));
    }

    #[test]
    fn churn_capped_by_population() {
        let m = market(40, 0.0, 999.0, 5.0);
        assert_eq!(churn(1, &m, &mut ScriptedRng::new(vec![0.1, 0.1])), 1);
    }

    proptest! {
        #[test]
        fn newbie_shield_blocks_all_churn(
            users in 0u64..1_000_000,
            day in 0u32..NEWBIE_SHIELD_DAYS,
            rep in 0.0f64..=100.0,
            ratio in 0.0f64..1000.0,
            ddos in 0.0f64..10.0,
            draw in 0.0f64..1.0,
        ) {
            let m = market(day, rep, ratio, ddos);
            prop_assert_eq!(churn(users, &m, &mut ScriptedRng::constant(draw)), 0);
        }

        #[test]
        fn churn_never_exceeds_users(
            users in 0u64..1_000_000,
            day in 30u32..5000,
            rep in 0.0f64..=100.0,
            ratio in 0.0f64..1000.0,
            ddos in 0.0f64..10.0,
            draw in 0.0f64..1.0,
        ) {
            let m = market(day, rep, ratio, ddos);
            prop_assert!(churn(users, &m, &mut ScriptedRng::constant(draw)) <= users);
            let r = renewal_rate(&m);
            prop_assert!((0.0..=1.0).contains(&r));
        }
    }
}

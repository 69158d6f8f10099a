//! Public review feed generation.

use chrono::NaiveDate;
use sim_core::{RandomSource, ReviewPools, Sentiment, UserReview};

const REVIEW_PROBABILITY: f64 = 0.05;

/// Sentiment of a review given the service conditions. Consumes a draw only
/// in the mixed band between the forced outcomes.
pub fn review_sentiment<R: RandomSource + ?Sized>(
    reputation: f64,
    overselling_ratio: f64,
    rng: &mut R,
) -> Sentiment {
    if overselling_ratio > 2.0 || reputation < 30.0 {
        Sentiment::Negative
    } else if overselling_ratio < 1.0 && reputation > 70.0 {
        Sentiment::Positive
    } else if rng.uniform(0.0, 100.0) < reputation {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}

/// Possibly write one review. Returns `None` on a missed roll or when the
/// pools for the chosen sentiment are empty.
pub fn generate_review<R: RandomSource + ?Sized>(
    id: u64,
    reputation: f64,
    overselling_ratio: f64,
    date: NaiveDate,
    pools: &ReviewPools,
    rng: &mut R,
) -> Option<UserReview> {
    if !rng.chance(REVIEW_PROBABILITY) {
        return None;
    }
    let sentiment = review_sentiment(reputation, overselling_ratio, rng);
    let templates = pools.templates(sentiment);
    let content = templates.get(rng.index(templates.len()))?.clone();
    let username = pools.usernames.get(rng.index(pools.usernames.len()))?.clone();
    Some(UserReview {
        id,
        username,
        content,
        sentiment,
        timestamp: date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{Catalogs, ScriptedRng};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn missed_roll_writes_nothing() {
        let pools = Catalogs::standard().reviews;
        let mut rng = ScriptedRng::constant(0.5);
        assert!(generate_review(1, 50.0, 1.0, date(), &pools, &mut rng).is_none());
        assert_eq!(rng.consumed(), 1);
    }

    #[test]
    fn forced_sentiments() {
        let mut rng = ScriptedRng::constant(0.0);
        assert_eq!(review_sentiment(90.0, 2.5, &mut rng), Sentiment::Negative);
        assert_eq!(review_sentiment(20.0, 0.1, &mut rng), Sentiment::Negative);
        assert_eq!(review_sentiment(80.0, 0.5, &mut rng), Sentiment::Positive);
        assert_eq!(rng.consumed(), 0);
    }

    #[test]
    fn mixed_band_is_reputation_weighted() {
        assert_eq!(
            review_sentiment(60.0, 1.5, &mut ScriptedRng::constant(0.59)),
            Sentiment::Positive
        );
        assert_eq!(
            review_sentiment(60.0, 1.5, &mut ScriptedRng::constant(0.61)),
            Sentiment::Neutral
        );
    }

    #[test]
    fn review_draws_from_pools() {
        let pools = Catalogs::standard().reviews;
        let mut rng = ScriptedRng::new(vec![0.01, 0.0, 0.0]);
        let r = generate_review(7, 80.0, 0.5, date(), &pools, &mut rng).unwrap();
        assert_eq!(r.sentiment, Sentiment::Positive);
        assert_eq!(r.content, pools.positive[0]);
        assert_eq!(r.username, pools.usernames[0]);
        assert_eq!(r.timestamp, date());
        assert_eq!(r.id, 7);
    }

    #[test]
    fn empty_pool_yields_none() {
        let mut pools = Catalogs::standard().reviews;
        pools.negative.clear();
        let mut rng = ScriptedRng::constant(0.0);
        assert!(generate_review(1, 10.0, 3.0, date(), &pools, &mut rng).is_none());
    }
}

use rand::Rng;
use serde::{Deserialize, Serialize};

// Bonus cards drop from cumulative wager volume, not from the round hash.
// The commitment scheme only covers win/lose/draw; card draws use ordinary
// process randomness and stay outside the audit trail.

/// Threshold = this factor times the average stake of recent rounds.
pub const DROP_THRESHOLD_FACTOR: f64 = 100.0;
/// Stake assumed before any betting history exists.
pub const DEFAULT_BET: f64 = 100.0;
pub const DEFAULT_DROP_THRESHOLD: f64 = DROP_THRESHOLD_FACTOR * DEFAULT_BET;
/// How many of the most recent rounds feed the threshold recompute.
pub const THRESHOLD_WINDOW: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BonusCard {
    pub name: String,
    pub multiplier: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardCatalog(pub Vec<BonusCard>);

impl CardCatalog {
    /// Fixed catalog, smallest multiplier first. Weights sum to 1.0.
    pub fn standard() -> Self {
        Self(vec![
            BonusCard {
                name: "120% boost".into(),
                multiplier: 1.2,
                weight: 0.5,
            },
            BonusCard {
                name: "150% boost".into(),
                multiplier: 1.5,
                weight: 0.4,
            },
            BonusCard {
                name: "2000% boost".into(),
                multiplier: 20.0,
                weight: 0.1,
            },
        ])
    }

    /// Weighted draw: uniform r in [0,1), cumulative-weight scan, first card
    /// whose running total exceeds r. The first entry is the fallback if
    /// float rounding lets r slip past every weight.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> BonusCard {
        let r: f64 = rng.gen();
        let mut acc = 0.0;
        for card in &self.0 {
            acc += card.weight;
            if r < acc {
                return card.clone();
            }
        }
        self.0[0].clone()
    }
}

/// Next drop threshold from the most recent bets (newest-or-oldest order is
/// irrelevant, only the average matters). Empty history means the default.
pub fn drop_threshold(recent_bets: &[f64]) -> f64 {
    if recent_bets.is_empty() {
        return DEFAULT_DROP_THRESHOLD;
    }
    let avg = recent_bets.iter().sum::<f64>() / recent_bets.len() as f64;
    avg * DROP_THRESHOLD_FACTOR
}

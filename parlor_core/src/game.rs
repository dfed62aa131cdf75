use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cards::{self, BonusCard, CardCatalog};
use crate::rng::{derive_hash_hex, FairRoundRng};
use crate::signs::{classify, HandSign, Outcome};

pub const STARTING_BALANCE: f64 = 10_000.0;
/// Winnings are bet * 0.88 * card multiplier; the stake rides on top.
pub const WIN_PAYOUT_FACTOR: f64 = 0.88;

const SEED_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SEED_LEN: usize = 8;

/// Short alphanumeric seed, the shape authenticator-style demo seeds take.
pub fn random_seed() -> String {
    let mut rng = rand::thread_rng();
    (0..SEED_LEN)
        .map(|_| SEED_ALPHABET[rng.gen_range(0..SEED_ALPHABET.len())] as char)
        .collect()
}

/// Derive the system's sign for one round. Pure; the returned hash is the
/// audit artifact a third party recomputes to check the round.
pub fn derive_system_sign(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
) -> (HandSign, String) {
    let rng = FairRoundRng::new(server_seed, client_seed, nonce);
    let (index, hash) = rng.roll(3);
    (HandSign::from_index(index as u8), hash)
}

/// One completed round. Append-only; never touched again after `play` returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundRecord {
    /// Hash input for this round; exactly 0, 1, 2, ... in play order.
    pub nonce: u64,
    pub player: HandSign,
    pub system: HandSign,
    pub bet: f64,
    pub outcome: Outcome,
    pub payout: f64,
    /// Name of the card consumed this round, if one was active.
    pub bonus_card: Option<String>,
    pub hash: String,
}

/// What one accepted round produced, for callers that render or log it.
#[derive(Debug, Clone)]
pub struct RoundReceipt {
    pub record: RoundRecord,
    pub balance: f64,
    pub dropped_card: Option<BonusCard>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    #[error("bet must be a positive finite amount")]
    InvalidBet,
    #[error("bet exceeds current balance")]
    BetExceedsBalance,
    #[error("session is busted; reset to play again")]
    Busted,
    #[error("server seed was revealed; session is closed")]
    Revealed,
}

/// One player's game state. Owned by the caller and passed into every
/// operation explicitly; nothing here is ambient or global.
///
/// Lifecycle: Active (balance > 0) -> Busted (balance <= 0, terminal) or
/// Revealed (seed disclosed, terminal). Only `reset` re-enters play, and it
/// mints a fresh session identity.
#[derive(Debug, Clone)]
pub struct Session {
    server_seed: String,
    client_seed: String,
    balance: f64,
    inventory: Vec<BonusCard>,
    session_wager: f64,
    drop_threshold: f64,
    history: Vec<RoundRecord>,
    catalog: CardCatalog,
    revealed: bool,
}

impl Session {
    pub fn new(server_seed: impl Into<String>, client_seed: impl Into<String>) -> Self {
        Self {
            server_seed: server_seed.into(),
            client_seed: client_seed.into(),
            balance: STARTING_BALANCE,
            inventory: Vec::new(),
            session_wager: 0.0,
            drop_threshold: cards::DEFAULT_DROP_THRESHOLD,
            history: Vec::new(),
            catalog: CardCatalog::standard(),
            revealed: false,
        }
    }

    /// Fresh session with random seeds.
    pub fn generate() -> Self {
        Self::new(random_seed(), random_seed())
    }

    pub fn client_seed(&self) -> &str {
        &self.client_seed
    }

    /// The commitment published at session start. The raw server seed stays
    /// private until `reveal`.
    pub fn server_seed_hash(&self) -> String {
        derive_hash_hex(self.server_seed.as_bytes())
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn inventory(&self) -> &[BonusCard] {
        &self.inventory
    }

    pub fn session_wager(&self) -> f64 {
        self.session_wager
    }

    pub fn drop_threshold(&self) -> f64 {
        self.drop_threshold
    }

    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    pub fn rounds_played(&self) -> u64 {
        self.history.len() as u64
    }

    pub fn busted(&self) -> bool {
        self.balance <= 0.0
    }

    pub fn revealed(&self) -> bool {
        self.revealed
    }

    /// Resolve one round. Rejections leave every piece of state untouched.
    ///
    /// `active_card` designates an inventory slot to consume this round; the
    /// card is spent win or lose. An out-of-range slot counts as no card.
    pub fn play(
        &mut self,
        player: HandSign,
        bet: f64,
        active_card: Option<usize>,
    ) -> Result<RoundReceipt, PlayError> {
        if self.revealed {
            return Err(PlayError::Revealed);
        }
        if self.busted() {
            return Err(PlayError::Busted);
        }
        if !bet.is_finite() || bet <= 0.0 {
            return Err(PlayError::InvalidBet);
        }
        if bet > self.balance {
            return Err(PlayError::BetExceedsBalance);
        }

        let nonce = self.history.len() as u64;
        let (system, hash) = derive_system_sign(&self.server_seed, &self.client_seed, nonce);
        let outcome = classify(player, system);

        let used_card = active_card
            .filter(|&slot| slot < self.inventory.len())
            .map(|slot| self.inventory.remove(slot));
        // No active card means multiplier 0: an unboosted win returns the
        // stake and nothing more.
        let multiplier = used_card.as_ref().map_or(0.0, |card| card.multiplier);

        let payout = match outcome {
            Outcome::Win => bet * WIN_PAYOUT_FACTOR * multiplier + bet,
            Outcome::Draw => bet,
            Outcome::Lose => 0.0,
        };

        self.balance = self.balance - bet + payout;
        self.session_wager += bet;

        let record = RoundRecord {
            nonce,
            player,
            system,
            bet,
            outcome,
            payout,
            bonus_card: used_card.map(|card| card.name),
            hash,
        };
        self.history.push(record.clone());

        let dropped_card = self.maybe_drop_bonus_card();

        Ok(RoundReceipt {
            record,
            balance: self.balance,
            dropped_card,
        })
    }

    /// Called after every accepted round. Crossing the threshold awards one
    /// weighted draw, zeroes the accumulator, and recomputes the threshold
    /// from the most recent betting history.
    fn maybe_drop_bonus_card(&mut self) -> Option<BonusCard> {
        if self.session_wager < self.drop_threshold {
            return None;
        }
        let card = self.catalog.draw(&mut rand::thread_rng());
        self.inventory.push(card.clone());
        self.session_wager = 0.0;
        let window = self.history.len().saturating_sub(cards::THRESHOLD_WINDOW);
        let recent: Vec<f64> = self.history[window..].iter().map(|r| r.bet).collect();
        self.drop_threshold = cards::drop_threshold(&recent);
        Some(card)
    }

    /// Close the session and disclose the server seed. Every recorded hash can
    /// now be recomputed from `seed:client_seed:nonce` by anyone.
    pub fn reveal(&mut self) -> String {
        self.revealed = true;
        self.server_seed.clone()
    }

    /// Fresh identity: new seeds, starting balance, cleared inventory,
    /// accumulator, and history.
    pub fn reset(&mut self) {
        *self = Session::generate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The sign that defeats `system`.
    fn beater_of(system: HandSign) -> HandSign {
        match system {
            HandSign::Paper => HandSign::Scissors,
            HandSign::Scissors => HandSign::Rock,
            HandSign::Rock => HandSign::Paper,
        }
    }

    fn forced(session: &Session, outcome: Outcome) -> HandSign {
        let nonce = session.rounds_played();
        let (system, _) = derive_system_sign("server", "client", nonce);
        match outcome {
            Outcome::Win => beater_of(system),
            Outcome::Draw => system,
            Outcome::Lose => system.beats(),
        }
    }

    #[test]
    fn test_payout_win_without_card_returns_stake() {
        let mut session = Session::new("server", "client");
        let sign = forced(&session, Outcome::Win);
        let receipt = session.play(sign, 100.0, None).unwrap();
        assert_eq!(receipt.record.outcome, Outcome::Win);
        assert_eq!(receipt.record.payout, 100.0);
        assert_eq!(session.balance(), STARTING_BALANCE);
    }

    #[test]
    fn test_payout_win_with_unit_multiplier() {
        let mut session = Session::new("server", "client");
        session.inventory.push(BonusCard {
            name: "100% boost".into(),
            multiplier: 1.0,
            weight: 1.0,
        });
        let sign = forced(&session, Outcome::Win);
        let receipt = session.play(sign, 100.0, Some(0)).unwrap();
        assert_eq!(receipt.record.payout, 188.0);
        assert_eq!(session.balance(), STARTING_BALANCE + 88.0);
        assert!(session.inventory().is_empty());
    }

    #[test]
    fn test_payout_win_with_top_card() {
        let mut session = Session::new("server", "client");
        session.inventory.push(BonusCard {
            name: "2000% boost".into(),
            multiplier: 20.0,
            weight: 0.1,
        });
        let sign = forced(&session, Outcome::Win);
        let receipt = session.play(sign, 100.0, Some(0)).unwrap();
        assert_eq!(receipt.record.payout, 1_860.0);
        assert_eq!(receipt.record.bonus_card.as_deref(), Some("2000% boost"));
    }

    #[test]
    fn test_payout_draw_refunds_and_lose_forfeits() {
        let mut session = Session::new("server", "client");
        let draw_sign = forced(&session, Outcome::Draw);
        let receipt = session.play(draw_sign, 100.0, None).unwrap();
        assert_eq!(receipt.record.outcome, Outcome::Draw);
        assert_eq!(receipt.record.payout, 100.0);
        assert_eq!(session.balance(), STARTING_BALANCE);

        let lose_sign = forced(&session, Outcome::Lose);
        let receipt = session.play(lose_sign, 100.0, None).unwrap();
        assert_eq!(receipt.record.outcome, Outcome::Lose);
        assert_eq!(receipt.record.payout, 0.0);
        assert_eq!(session.balance(), STARTING_BALANCE - 100.0);
    }

    #[test]
    fn test_card_consumed_even_on_loss() {
        let mut session = Session::new("server", "client");
        session.inventory.push(BonusCard {
            name: "150% boost".into(),
            multiplier: 1.5,
            weight: 0.4,
        });
        let sign = forced(&session, Outcome::Lose);
        let receipt = session.play(sign, 100.0, Some(0)).unwrap();
        assert_eq!(receipt.record.payout, 0.0);
        assert_eq!(receipt.record.bonus_card.as_deref(), Some("150% boost"));
        assert!(session.inventory().is_empty());
    }

    #[test]
    fn test_out_of_range_card_slot_means_no_card() {
        let mut session = Session::new("server", "client");
        let sign = forced(&session, Outcome::Win);
        let receipt = session.play(sign, 100.0, Some(5)).unwrap();
        assert_eq!(receipt.record.bonus_card, None);
        assert_eq!(receipt.record.payout, 100.0);
    }

    #[test]
    fn test_oversized_bet_is_a_no_op() {
        let mut session = Session::new("server", "client");
        let before = session.clone();
        let err = session
            .play(HandSign::Rock, STARTING_BALANCE + 1.0, None)
            .unwrap_err();
        assert_eq!(err, PlayError::BetExceedsBalance);
        assert_eq!(session.balance(), before.balance());
        assert_eq!(session.history().len(), before.history().len());
        assert_eq!(session.session_wager(), before.session_wager());
    }

    #[test]
    fn test_invalid_bets_rejected() {
        let mut session = Session::new("server", "client");
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = session.play(HandSign::Rock, bad, None).unwrap_err();
            assert_eq!(err, PlayError::InvalidBet);
        }
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_nonces_increase_from_zero() {
        let mut session = Session::new("server", "client");
        for _ in 0..5 {
            session.play(HandSign::Rock, 10.0, None).unwrap();
        }
        let nonces: Vec<u64> = session.history().iter().map(|r| r.nonce).collect();
        assert_eq!(nonces, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_history_records_are_never_rewritten() {
        let mut session = Session::new("server", "client");
        session.play(HandSign::Rock, 10.0, None).unwrap();
        let first = session.history()[0].clone();
        for _ in 0..10 {
            session.play(HandSign::Paper, 25.0, None).unwrap();
        }
        assert_eq!(session.history()[0], first);
    }

    #[test]
    fn test_threshold_crossing_drops_exactly_one_card() {
        let mut session = Session::new("server", "client");
        assert_eq!(session.drop_threshold(), 10_000.0);
        // One max bet crosses the default threshold in a single round.
        let receipt = session.play(HandSign::Rock, 10_000.0, None).unwrap();
        assert!(receipt.dropped_card.is_some());
        assert_eq!(session.inventory().len(), 1);
        assert_eq!(session.session_wager(), 0.0);
        // Threshold recomputed from the only round on record.
        assert_eq!(session.drop_threshold(), 10_000.0 * 100.0);
    }

    #[test]
    fn test_threshold_recompute_uses_recent_average() {
        let mut session = Session::new("server", "client");
        session.drop_threshold = 50.0 * 100.0;
        // 100 rounds at 50 cannot bust a 10_000 balance, and the accumulator
        // crosses 5_000 exactly on the last one.
        for _ in 0..100 {
            session.play(HandSign::Rock, 50.0, None).unwrap();
        }
        // Accumulator crossed 5000 along the way; each recompute saw only
        // bet-50 rounds, so the threshold stays at 100 * 50.
        assert_eq!(session.drop_threshold(), 5_000.0);
        assert!(!session.inventory().is_empty());
    }

    #[test]
    fn test_busted_is_terminal_until_reset() {
        let mut session = Session::new("server", "client");
        // Keep betting everything; a loss eventually zeroes the balance.
        for _ in 0..200 {
            let balance = session.balance();
            if session.busted() {
                break;
            }
            let sign = forced(&session, Outcome::Lose);
            session.play(sign, balance, None).unwrap();
        }
        assert!(session.busted());
        let err = session.play(HandSign::Rock, 1.0, None).unwrap_err();
        assert_eq!(err, PlayError::Busted);

        let old_commit = session.server_seed_hash();
        session.reset();
        assert!(!session.busted());
        assert_eq!(session.balance(), STARTING_BALANCE);
        assert!(session.history().is_empty());
        assert!(session.inventory().is_empty());
        assert_ne!(session.server_seed_hash(), old_commit);
    }

    #[test]
    fn test_reveal_closes_the_session_and_matches_commit() {
        let mut session = Session::new("server", "client");
        session.play(HandSign::Rock, 100.0, None).unwrap();
        let commit = session.server_seed_hash();
        let seed = session.reveal();
        assert_eq!(crate::rng::derive_hash_hex(seed.as_bytes()), commit);
        let err = session.play(HandSign::Rock, 100.0, None).unwrap_err();
        assert_eq!(err, PlayError::Revealed);

        // Every recorded round replays from the disclosed seed.
        for record in session.history() {
            let (system, hash) =
                derive_system_sign(&seed, session.client_seed(), record.nonce);
            assert_eq!(system, record.system);
            assert_eq!(hash, record.hash);
        }
    }
}

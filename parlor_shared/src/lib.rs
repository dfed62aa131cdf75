use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Hand signs cross the wire as indices in derivation order:
// 0 = scissors, 1 = rock, 2 = paper.

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewSessionRequest {
    /// Client-chosen seed; the server generates one when absent.
    pub client_seed: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewSessionResponse {
    pub session_id: String,
    /// SHA-256 commit of the server seed; the raw seed comes only on reveal.
    pub server_seed_hash: String,
    pub client_seed: String,
    pub balance: f64,
    pub drop_threshold: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlayRequest {
    pub sign: u8,
    pub bet: f64,
    /// Inventory slot of a bonus card to consume this round.
    pub active_card: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CardView {
    pub name: String,
    pub multiplier: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlayResponse {
    pub nonce: u64,
    pub player_sign: u8,
    pub system_sign: u8,
    pub outcome: String,
    pub payout: f64,
    pub balance: f64,
    pub hash: String,
    /// Name of the card consumed this round, if any.
    pub bonus_card: Option<String>,
    /// Card awarded by crossing the wager threshold, if one dropped.
    pub dropped_card: Option<CardView>,
    pub inventory: Vec<CardView>,
    pub busted: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionSummary {
    pub session_id: String,
    pub server_seed_hash: String,
    pub client_seed: String,
    pub balance: f64,
    pub rounds_played: u64,
    pub session_wager: f64,
    pub drop_threshold: f64,
    pub inventory: Vec<CardView>,
    pub busted: bool,
    pub revealed: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RevealResponse {
    pub server_seed: String,
    pub server_seed_hash: String,
    pub rounds_played: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WhoamiResponse {
    pub ip: String,
    pub user_agent: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoundLogEntry {
    pub id: i64,
    pub ts: DateTime<Utc>,
    pub session_id: String,
    pub client_seed: String,
    pub nonce: i64,
    pub server_seed_hash: String,
    pub player_sign: u8,
    pub system_sign: u8,
    pub bet: f64,
    pub outcome: String,
    pub payout: f64,
    pub bonus_card: Option<String>,
    pub round_hash: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("session not found")]
    SessionNotFound,
    #[error("internal server error")]
    Internal,
}

pub type ApiResult<T> = Result<T, ApiError>;

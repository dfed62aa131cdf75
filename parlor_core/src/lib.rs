pub mod cards;
pub mod game;
pub mod otp;
pub mod rng;
pub mod signs;

pub use crate::cards::{drop_threshold, BonusCard, CardCatalog};
pub use crate::game::{
    derive_system_sign, random_seed, PlayError, RoundReceipt, RoundRecord, Session,
    STARTING_BALANCE, WIN_PAYOUT_FACTOR,
};
pub use crate::otp::{
    decode_base32, hotp, seconds_remaining, totp, OtpError, DEFAULT_TIME_STEP_SECS,
};
pub use crate::rng::{derive_hash_hex, FairRoundRng};
pub use crate::signs::{classify, HandSign, Outcome};

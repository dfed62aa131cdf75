use serde::{Deserialize, Serialize};

/// Index order is fixed by the derivation scheme (hash head mod 3):
/// 0 = Scissors, 1 = Rock, 2 = Paper.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HandSign {
    Scissors,
    Rock,
    Paper,
}

impl HandSign {
    pub fn from_index(i: u8) -> Self {
        match i % 3 {
            0 => HandSign::Scissors,
            1 => HandSign::Rock,
            _ => HandSign::Paper,
        }
    }

    pub fn to_index(self) -> u8 {
        match self {
            HandSign::Scissors => 0,
            HandSign::Rock => 1,
            HandSign::Paper => 2,
        }
    }

    /// The sign this one defeats. Each sign beats exactly one other.
    pub fn beats(self) -> HandSign {
        match self {
            HandSign::Scissors => HandSign::Paper,
            HandSign::Rock => HandSign::Scissors,
            HandSign::Paper => HandSign::Rock,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HandSign::Scissors => "scissors",
            HandSign::Rock => "rock",
            HandSign::Paper => "paper",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Outcome {
    Win,
    Lose,
    Draw,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Lose => "lose",
            Outcome::Draw => "draw",
        }
    }
}

/// Classify one round from the player's point of view.
pub fn classify(player: HandSign, system: HandSign) -> Outcome {
    if player == system {
        Outcome::Draw
    } else if player.beats() == system {
        Outcome::Win
    } else {
        Outcome::Lose
    }
}

//! Turn-game session - A dice game reconstructed from chat roll lines
//!
//! Players alternate rolling against a shrinking cap; whoever rolls a 1 loses.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::PlayerName;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnGameState {
    /// Waiting for an opponent
    Open,
    /// Opponent joined, rolls alternate
    Active,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnGameSession {
    pub initializer: PlayerName,
    pub opponent: Option<PlayerName>,
    pub current_roll_cap: u32,
    pub last_roller: PlayerName,
    pub last_roll_time: DateTime<Utc>,
    pub is_complete: bool,
}

impl TurnGameSession {
    pub fn open(initializer: PlayerName, cap: u32, now: DateTime<Utc>) -> Self {
        Self {
            last_roller: initializer.clone(),
            initializer,
            opponent: None,
            current_roll_cap: cap,
            last_roll_time: now,
            is_complete: false,
        }
    }

    pub fn state(&self) -> TurnGameState {
        if self.is_complete {
            TurnGameState::Complete
        } else if self.opponent.is_some() {
            TurnGameState::Active
        } else {
            TurnGameState::Open
        }
    }

    pub fn involves(&self, player: &PlayerName) -> bool {
        &self.initializer == player || self.opponent.as_ref() == Some(player)
    }

    /// The party that is not `player`, if both parties are known
    pub fn other_party(&self, player: &PlayerName) -> Option<&PlayerName> {
        if &self.initializer == player {
            self.opponent.as_ref()
        } else if self.opponent.as_ref() == Some(player) {
            Some(&self.initializer)
        } else {
            None
        }
    }

    /// Whether `sender` may roll next in this session
    pub fn accepts_roll_from(&self, sender: &PlayerName, cap: u32) -> bool {
        if self.is_complete || self.current_roll_cap != cap || &self.last_roller == sender {
            return false;
        }
        match &self.opponent {
            None => true,
            Some(_) => self.involves(sender),
        }
    }

    /// Record a roll; returns true when the roll ends the game
    pub fn record_roll(&mut self, sender: &PlayerName, roll: u32, now: DateTime<Utc>) -> bool {
        if self.opponent.is_none() && &self.initializer != sender {
            self.opponent = Some(sender.clone());
        }
        self.last_roller = sender.clone();
        self.last_roll_time = now;
        self.current_roll_cap = roll;
        if roll == 1 {
            self.is_complete = true;
        }
        self.is_complete
    }
}

/// Numbers extracted from one chat roll line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollMessage {
    /// Absent on a cap-only line, which starts a session
    pub roll: Option<u32>,
    pub cap: u32,
}

impl RollMessage {
    /// Extract up to two integers; one is a cap, two are (lower roll, higher cap)
    pub fn parse(text: &str) -> Option<Self> {
        static NUMBERS: OnceLock<Option<Regex>> = OnceLock::new();
        let numbers = NUMBERS.get_or_init(|| Regex::new(r"\d+").ok()).as_ref()?;

        let mut values = numbers
            .find_iter(text)
            .take(2)
            .map(|m| m.as_str().parse::<u32>());

        let first = values.next()?.ok()?;
        match values.next() {
            None => Some(Self {
                roll: None,
                cap: first,
            }),
            Some(second) => {
                let second = second.ok()?;
                Some(Self {
                    roll: Some(first.min(second)),
                    cap: first.max(second),
                })
            }
        }
    }
}

//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{
    GameSettings,
    constants::{
        DEFAULT_FINISHED_CLOSE_DELAY_MS, DEFAULT_SHOWDOWN_DELAY_MS, DEFAULT_START_DELAY_MS,
        DEFAULT_TURN_TIMEOUT_MS, MAX_PLAYERS, MAX_SEATS_PER_DECK,
    },
    entities::{Chips, DEFAULT_BIG_BLIND, DEFAULT_SMALL_BLIND, DEFAULT_STARTING_CHIPS},
};

/// Table speed variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSpeed {
    Normal,
    Turbo,
    Hyper,
}

impl std::fmt::Display for TableSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableSpeed::Normal => write!(f, "normal"),
            TableSpeed::Turbo => write!(f, "turbo"),
            TableSpeed::Hyper => write!(f, "hyper"),
        }
    }
}

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Number of seats (default: 8)
    pub max_players: usize,

    /// Small blind amount
    pub small_blind: Chips,

    /// Big blind amount
    pub big_blind: Chips,

    /// Stack every player sits down with
    pub starting_chips: Chips,

    /// Table speed, picks the turn time limit
    pub speed: TableSpeed,

    /// Turn time limit in milliseconds, overriding the speed preset
    pub turn_timeout_ms: Option<u64>,

    /// Pause before a hand is dealt
    pub start_delay_ms: u64,

    /// How long the showdown stays on screen before the next hand
    pub showdown_delay_ms: u64,

    /// How long a finished table lingers before its actor stops
    pub finished_close_delay_ms: u64,

    /// Deal hands automatically once two players are seated
    pub auto_start: bool,

    /// Seed for the shuffle RNG (deterministic tables for tests)
    pub seed: Option<u64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Default Table".to_string(),
            max_players: MAX_PLAYERS,
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            starting_chips: DEFAULT_STARTING_CHIPS,
            speed: TableSpeed::Normal,
            turn_timeout_ms: None,
            start_delay_ms: DEFAULT_START_DELAY_MS,
            showdown_delay_ms: DEFAULT_SHOWDOWN_DELAY_MS,
            finished_close_delay_ms: DEFAULT_FINISHED_CLOSE_DELAY_MS,
            auto_start: true,
            seed: None,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.small_blind == 0 {
            return Err("Small blind must be positive".to_string());
        }

        if self.big_blind <= self.small_blind {
            return Err("Big blind must be greater than small blind".to_string());
        }

        if self.max_players < 2 || self.max_players > MAX_SEATS_PER_DECK {
            return Err(format!(
                "Max players must be between 2 and {MAX_SEATS_PER_DECK}"
            ));
        }

        if self.starting_chips < self.big_blind {
            return Err("Starting chips must cover the big blind".to_string());
        }

        if u64::from(self.starting_chips) * self.max_players as u64 > u64::from(Chips::MAX) {
            return Err("Starting chips for a full table exceed the chip limit".to_string());
        }

        if self.turn_timeout_ms == Some(0) {
            return Err("Turn timeout must be positive".to_string());
        }

        Ok(())
    }

    /// Get action timeout based on table speed
    pub fn action_timeout_ms(&self) -> u64 {
        match self.speed {
            TableSpeed::Normal => DEFAULT_TURN_TIMEOUT_MS,
            TableSpeed::Turbo => DEFAULT_TURN_TIMEOUT_MS / 2,
            TableSpeed::Hyper => DEFAULT_TURN_TIMEOUT_MS / 6,
        }
    }

    /// Turn time limit, the explicit override if set.
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_ms.unwrap_or_else(|| self.action_timeout_ms()))
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    pub fn showdown_delay(&self) -> Duration {
        Duration::from_millis(self.showdown_delay_ms)
    }

    pub fn finished_close_delay(&self) -> Duration {
        Duration::from_millis(self.finished_close_delay_ms)
    }
}

impl From<&TableConfig> for GameSettings {
    fn from(config: &TableConfig) -> Self {
        GameSettings::new(
            config.small_blind,
            config.big_blind,
            config.starting_chips,
            config.max_players,
            config.seed,
        )
    }
}

//! Game Configuration
//!
//! Session-wide settings. Fixed before round 1 and constant afterwards.

use std::time::Duration;
use thiserror::Error;

use crate::game::state::RoundNumber;
use crate::{
    DEFAULT_GROUP_SIZE, DEFAULT_NUM_ROUNDS,
    DEFAULT_GUESS_WINDOW_SECS, DEFAULT_RESULT_WINDOW_SECS,
};

/// Configuration for a game session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Players per group (at least 2).
    pub group_size: usize,
    /// Rounds per session (at least 1).
    pub num_rounds: RoundNumber,
    /// Time players have to guess in each round.
    pub guess_window: Duration,
    /// Time results stay on screen before the next round.
    pub result_window: Duration,
    /// Players the lobby waits for before grouping.
    pub expected_players: usize,
    /// Seed for targets and grouping. Random when absent.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            num_rounds: DEFAULT_NUM_ROUNDS,
            guess_window: Duration::from_secs(DEFAULT_GUESS_WINDOW_SECS),
            result_window: Duration::from_secs(DEFAULT_RESULT_WINDOW_SECS),
            expected_players: DEFAULT_GROUP_SIZE,
            seed: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Groups need at least two players.
    #[error("group size must be at least 2 (got {0})")]
    GroupSizeTooSmall(usize),

    /// A session needs at least one round.
    #[error("number of rounds must be at least 1")]
    NoRounds,

    /// Guess window must be positive.
    #[error("guess window must be longer than zero")]
    EmptyGuessWindow,

    /// Lobby size must fill whole groups.
    #[error("expected players ({expected}) must be a positive multiple of the group size ({group_size})")]
    ExpectedPlayers {
        /// Configured player count.
        expected: usize,
        /// Configured group size.
        group_size: usize,
    },

    /// Environment variable could not be parsed.
    #[error("invalid value for {name}: {value}")]
    InvalidVar {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
}

impl GameConfig {
    /// Create config from environment variables, falling back to defaults
    /// for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let group_size = env_or("GUESS_GROUP_SIZE", defaults.group_size)?;

        Ok(Self {
            group_size,
            num_rounds: env_or("GUESS_NUM_ROUNDS", defaults.num_rounds)?,
            guess_window: Duration::from_secs(
                env_or("GUESS_WINDOW_SECS", DEFAULT_GUESS_WINDOW_SECS)?,
            ),
            result_window: Duration::from_secs(
                env_or("GUESS_RESULT_SECS", DEFAULT_RESULT_WINDOW_SECS)?,
            ),
            expected_players: env_or("GUESS_EXPECTED_PLAYERS", group_size)?,
            seed: match std::env::var("GUESS_SEED") {
                Ok(raw) => Some(parse_var("GUESS_SEED", &raw)?),
                Err(_) => None,
            },
        })
    }

    /// Check the invariants the coordinator relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group_size < 2 {
            return Err(ConfigError::GroupSizeTooSmall(self.group_size));
        }
        if self.num_rounds < 1 {
            return Err(ConfigError::NoRounds);
        }
        if self.guess_window.is_zero() {
            return Err(ConfigError::EmptyGuessWindow);
        }
        if self.expected_players == 0 || self.expected_players % self.group_size != 0 {
            return Err(ConfigError::ExpectedPlayers {
                expected: self.expected_players,
                group_size: self.group_size,
            });
        }
        Ok(())
    }

    /// Whether `round` is the last round of the session.
    pub fn is_final_round(&self, round: RoundNumber) -> bool {
        round == self.num_rounds
    }
}

pub(crate) fn env_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => parse_var(name, &raw),
        Err(_) => Ok(default),
    }
}

pub(crate) fn parse_var<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidVar {
        name,
        value: raw.to_string(),
    })
}

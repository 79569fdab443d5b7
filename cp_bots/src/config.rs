//! Bot runner configuration.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use casino_poker::{TableConfig, constants::MAX_SEATS_PER_DECK, table::TableSpeed};

/// Complete runner configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct BotsConfig {
    /// Number of tables to fill with bots
    pub num_tables: usize,
    /// Bots seated at each table
    pub bots_per_table: usize,
    /// Stop a table once this many hands have been played
    pub target_hands: u32,
    /// Chance that a bot lets its turn timer run out instead of acting
    pub stall_chance: f64,
    /// Upper bound of the random pause before a bot acts
    pub think_time_ms: u64,
    /// Monte Carlo iterations for equity estimates
    pub equity_iterations: usize,
    /// Seed for tables and bots. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Template for every table the runner opens
    pub table: TableConfig,
}

impl BotsConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `num_tables_override` - Optional number of tables (from CLI args)
    /// * `bots_override` - Optional bots per table (from CLI args)
    /// * `hands_override` - Optional target hand count (from CLI args)
    /// * `seed_override` - Optional RNG seed (from CLI args)
    pub fn from_env(
        num_tables_override: Option<usize>,
        bots_override: Option<usize>,
        hands_override: Option<u32>,
        seed_override: Option<u64>,
    ) -> Self {
        let defaults = TableConfig::default();
        let bots_per_table = bots_override.unwrap_or_else(|| parse_env_or("BOTS_PER_TABLE", 6));

        let table = TableConfig {
            name: "Bot Table".to_string(),
            max_players: parse_env_or("TABLE_MAX_PLAYERS", defaults.max_players.max(bots_per_table)),
            small_blind: parse_env_or("TABLE_SMALL_BLIND", defaults.small_blind),
            big_blind: parse_env_or("TABLE_BIG_BLIND", defaults.big_blind),
            starting_chips: parse_env_or("TABLE_STARTING_CHIPS", defaults.starting_chips),
            speed: TableSpeed::Hyper,
            turn_timeout_ms: Some(parse_env_or("TURN_TIMEOUT_MS", 2_000)),
            start_delay_ms: parse_env_or("START_DELAY_MS", 500),
            showdown_delay_ms: parse_env_or("SHOWDOWN_DELAY_MS", 1_000),
            finished_close_delay_ms: parse_env_or(
                "FINISHED_CLOSE_DELAY_MS",
                defaults.finished_close_delay_ms,
            ),
            auto_start: true,
            seed: None,
        };

        Self {
            num_tables: num_tables_override.unwrap_or_else(|| parse_env_or("BOT_TABLES", 1)),
            bots_per_table,
            target_hands: hands_override.unwrap_or_else(|| parse_env_or("TARGET_HANDS", 50)),
            stall_chance: parse_env_or("BOT_STALL_CHANCE", 0.02),
            think_time_ms: parse_env_or("BOT_THINK_TIME_MS", 150),
            equity_iterations: parse_env_or("BOT_EQUITY_ITERATIONS", 200),
            seed: seed_override.or_else(|| std::env::var("BOT_SEED").ok().and_then(|v| v.parse().ok())),
            table,
        }
    }

    /// Config for the `index`-th table, with its own name and seed
    pub fn table_config(&self, index: usize) -> TableConfig {
        TableConfig {
            name: format!("Bot Table {}", index + 1),
            seed: self.seed.map(|seed| seed.wrapping_add(index as u64)),
            ..self.table.clone()
        }
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_tables == 0 {
            return Err(ConfigError::Invalid {
                var: "BOT_TABLES".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.bots_per_table < 2 {
            return Err(ConfigError::Invalid {
                var: "BOTS_PER_TABLE".to_string(),
                reason: "Must be at least 2".to_string(),
            });
        }

        if self.bots_per_table > self.table.max_players {
            return Err(ConfigError::Invalid {
                var: "BOTS_PER_TABLE".to_string(),
                reason: format!("Cannot exceed max players ({})", self.table.max_players),
            });
        }

        if self.table.max_players > MAX_SEATS_PER_DECK {
            return Err(ConfigError::Invalid {
                var: "TABLE_MAX_PLAYERS".to_string(),
                reason: format!("Must be at most {MAX_SEATS_PER_DECK} (max players with 52-card deck)"),
            });
        }

        if !(0.0..=1.0).contains(&self.stall_chance) {
            return Err(ConfigError::Invalid {
                var: "BOT_STALL_CHANCE".to_string(),
                reason: "Must be between 0.0 and 1.0".to_string(),
            });
        }

        if self.target_hands == 0 {
            return Err(ConfigError::Invalid {
                var: "TARGET_HANDS".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        self.table.validate().map_err(|reason| ConfigError::Invalid {
            var: "TABLE_*".to_string(),
            reason,
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

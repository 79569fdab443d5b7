//! # Casino Poker
//!
//! Texas Hold'em hand evaluation and a betting-round state machine, hosted
//! one table per async actor.
//!
//! ## Core Modules
//!
//! - [`game`]: Entities, hand evaluation, analysis and the [`PokerTable`]
//!   state machine
//! - [`table`]: Tokio actors that own a table each, turn timers and the
//!   multi-table registry
//!
//! ## Example
//!
//! ```
//! use casino_poker::{Action, Phase, PokerTable, entities::Username};
//!
//! let mut table = PokerTable::new();
//! table.join(1, Username::new("alice")).unwrap();
//! table.join(2, Username::new("bob")).unwrap();
//! table.start_new_hand().unwrap();
//!
//! let first = table.current_turn().unwrap();
//! table.apply_action(first, Action::Fold).unwrap();
//! assert_eq!(table.phase(), Phase::Showdown);
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    GameEvent, GameSettings, PokerTable, UserError,
    analysis::{self, HandAnalysis, StrengthTier, analyze_hand, estimate_equity},
    constants::{self, MAX_PLAYERS},
    entities::{
        self, Action, ActionChoice, Card, Chips, DEFAULT_BIG_BLIND, DEFAULT_SMALL_BLIND,
        DEFAULT_STARTING_CHIPS, HandCategory, HandRanking, Phase, PlayerId, TableView,
    },
    functional::{self, EvalError, compare_hands, evaluate_best_hand, evaluate_hand, hand_strength},
};

/// Multi-table actors and registry.
pub mod table;
pub use table::{TableConfig, TableHandle, TableManager};

//! Poker game engine: hand evaluation and the betting state machine.
//!
//! This module provides:
//! - Card, deck, player and pot entities
//! - Pure 5 and 7 card hand evaluation plus strength analysis
//! - The hold'em table state machine and its betting rounds
//! - Event generation and per-viewer table views

pub mod analysis;
mod betting;
pub mod constants;
pub mod entities;
pub mod functional;
mod state_machine;

pub use state_machine::{GameEvent, GameSettings, PokerTable, UserError};

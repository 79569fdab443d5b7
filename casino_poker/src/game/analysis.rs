//! Hand analysis hints for players and bots: strength tiers, open draws and
//! a Monte Carlo equity estimate.

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt};

use super::constants::{BOARD_SIZE, HOLE_CARDS};
use super::entities::{ACE, Card, Deck, HandCategory, HandRanking, Suit, Value};
use super::functional::{EvalError, evaluate_best_hand, validate};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrengthTier {
    /// High card or a pair.
    Weak,
    /// Two pair up to a straight.
    Medium,
    /// Flush or full house.
    Strong,
    /// Four of a kind or better.
    VeryStrong,
}

impl From<HandCategory> for StrengthTier {
    fn from(category: HandCategory) -> Self {
        match category.rank() {
            8.. => Self::VeryStrong,
            6..=7 => Self::Strong,
            3..=5 => Self::Medium,
            _ => Self::Weak,
        }
    }
}

impl fmt::Display for StrengthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Weak => "weak",
            Self::Medium => "medium",
            Self::Strong => "strong",
            Self::VeryStrong => "very strong",
        };
        write!(f, "{repr}")
    }
}

/// An improvement still reachable while the board is incomplete.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Draw {
    AnyPair,
    Flush,
    Straight,
}

impl fmt::Display for Draw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::AnyPair => "Any pair",
            Self::Flush => "Flush",
            Self::Straight => "Straight",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HandAnalysis {
    pub best: HandRanking,
    pub category: HandCategory,
    pub tier: StrengthTier,
    pub draws: Vec<Draw>,
}

fn has_flush_draw(cards: &[Card]) -> bool {
    Suit::ALL
        .iter()
        .any(|suit| cards.iter().filter(|c| c.1 == *suit).count() == 4)
}

/// Four distinct values inside a five-value window, open-ended or gutshot.
/// An ace also counts low.
fn has_straight_draw(cards: &[Card]) -> bool {
    let mut values: Vec<Value> = cards.iter().map(|c| c.0).collect();
    if values.contains(&ACE) {
        values.push(1);
    }
    values.sort_unstable();
    values.dedup();
    values.windows(4).any(|w| w[3] - w[0] <= 4)
}

/// Best current hand plus the draws still open. Needs five cards in total,
/// so it is meaningful from the flop on.
pub fn analyze_hand(hole: &[Card], board: &[Card]) -> Result<HandAnalysis, EvalError> {
    if board.len() > BOARD_SIZE {
        return Err(EvalError::BoardTooLarge(board.len()));
    }
    let cards: Vec<Card> = hole.iter().chain(board).copied().collect();
    let best = evaluate_best_hand(&cards)?;
    let category = best.category;

    let mut draws = Vec::new();
    if board.len() < BOARD_SIZE {
        if category == HandCategory::HighCard {
            draws.push(Draw::AnyPair);
        }
        if category < HandCategory::Flush && has_flush_draw(&cards) {
            draws.push(Draw::Flush);
        }
        if category < HandCategory::Straight && has_straight_draw(&cards) {
            draws.push(Draw::Straight);
        }
    }

    Ok(HandAnalysis {
        tier: category.into(),
        category,
        best,
        draws,
    })
}

/// Estimates the share of the pot `hole` wins against `opponents` random
/// hands by dealing out the rest of the board `iterations` times. Ties
/// count as a split share.
pub fn estimate_equity<R: Rng + ?Sized>(
    hole: &[Card],
    board: &[Card],
    opponents: usize,
    iterations: usize,
    rng: &mut R,
) -> Result<f64, EvalError> {
    if hole.len() != HOLE_CARDS {
        return Err(EvalError::WrongHoleCount(hole.len()));
    }
    if board.len() > BOARD_SIZE {
        return Err(EvalError::BoardTooLarge(board.len()));
    }
    let known: Vec<Card> = hole.iter().chain(board).copied().collect();
    validate(&known)?;
    if opponents == 0 {
        return Ok(1.0);
    }

    let known_set: HashSet<Card> = known.iter().copied().collect();
    let mut deck = Deck::default();
    let mut unseen = Vec::with_capacity(52 - known.len());
    while let Ok(card) = deck.deal_card() {
        if !known_set.contains(&card) {
            unseen.push(card);
        }
    }

    let missing_board = BOARD_SIZE - board.len();
    let needed = missing_board + HOLE_CARDS * opponents;
    if needed > unseen.len() {
        return Err(EvalError::DeckTooSmall(needed));
    }

    let iterations = iterations.max(1);
    let mut won = 0.0;
    for _ in 0..iterations {
        let (drawn, _) = unseen.partial_shuffle(rng, needed);
        let mut full_board = board.to_vec();
        full_board.extend_from_slice(&drawn[..missing_board]);

        let mine: Vec<Card> = hole.iter().chain(&full_board).copied().collect();
        let my_hand = evaluate_best_hand(&mine)?;

        let mut best_other: Option<HandRanking> = None;
        let mut tied = 0usize;
        for holes in drawn[missing_board..].chunks(HOLE_CARDS) {
            let theirs: Vec<Card> = holes.iter().chain(&full_board).copied().collect();
            let hand = evaluate_best_hand(&theirs)?;
            if hand == my_hand {
                tied += 1;
            }
            if best_other.as_ref().is_none_or(|b| hand > *b) {
                best_other = Some(hand);
            }
        }

        match best_other {
            Some(other) if other > my_hand => {}
            _ => won += 1.0 / (tied + 1) as f64,
        }
    }
    Ok(won / iterations as f64)
}

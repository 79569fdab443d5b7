//! Bot decision-making: a rough strength score picks the line, equity
//! against the pot price settles marginal calls.

use casino_poker::{
    ActionChoice, Card, Chips, HandCategory, analyze_hand, entities::Action, estimate_equity,
    game::analysis::Draw,
};
use rand::{Rng, rngs::StdRng};
use std::fmt;

// === Made Hand Base Values ===

const STRENGTH_HIGH_CARD: f32 = 0.1;
const STRENGTH_PAIR: f32 = 0.3;
const STRENGTH_TWO_PAIR: f32 = 0.45;
const STRENGTH_THREE_OF_A_KIND: f32 = 0.6;
const STRENGTH_STRAIGHT: f32 = 0.7;
const STRENGTH_FLUSH: f32 = 0.75;
const STRENGTH_FULL_HOUSE: f32 = 0.85;
const STRENGTH_FOUR_OF_A_KIND: f32 = 0.95;
const STRENGTH_STRAIGHT_FLUSH: f32 = 0.99;

/// Added per open flush or straight draw.
const DRAW_BONUS: f32 = 0.08;

/// Playing style of a bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotStyle {
    /// Plays many hands, rarely raises, never bluffs.
    Loose,
    /// Balanced.
    Standard,
    /// Few hands, played hard.
    Tight,
}

impl BotStyle {
    pub const ALL: [Self; 3] = [Self::Loose, Self::Standard, Self::Tight];

    pub fn params(self) -> StyleParams {
        match self {
            Self::Loose => StyleParams {
                fold_threshold: 0.14,
                raise_threshold: 0.6,
                call_probability: 0.6,
                raise_probability: 0.35,
                bluff_frequency: 0.0,
                raise_pot_fraction: 0.5,
            },
            Self::Standard => StyleParams {
                fold_threshold: 0.22,
                raise_threshold: 0.5,
                call_probability: 0.35,
                raise_probability: 0.6,
                bluff_frequency: 0.05,
                raise_pot_fraction: 0.75,
            },
            Self::Tight => StyleParams {
                fold_threshold: 0.3,
                raise_threshold: 0.55,
                call_probability: 0.2,
                raise_probability: 0.85,
                bluff_frequency: 0.0,
                raise_pot_fraction: 1.0,
            },
        }
    }
}

impl fmt::Display for BotStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Loose => "loose",
            Self::Standard => "standard",
            Self::Tight => "tight",
        };
        write!(f, "{repr}")
    }
}

/// Thresholds and frequencies for one style
#[derive(Debug, Clone, Copy)]
pub struct StyleParams {
    /// Strength below this folds unless checking is free.
    pub fold_threshold: f32,
    /// Strength at or above this considers raising.
    pub raise_threshold: f32,
    /// Chance to call a medium hand the pot price doesn't justify.
    pub call_probability: f64,
    /// Chance to raise a strong hand rather than flat call.
    pub raise_probability: f64,
    /// Chance to raise with a hand that would fold.
    pub bluff_frequency: f64,
    /// Raise size as a share of the pot.
    pub raise_pot_fraction: f32,
}

/// Everything a bot sees when it is asked to act
#[derive(Debug, Clone)]
pub struct DecisionContext<'a> {
    pub hole_cards: &'a [Card],
    pub board_cards: &'a [Card],
    pub pot_size: Chips,
    /// Opponents still holding cards.
    pub opponents: usize,
    /// What the table will accept right now.
    pub choices: &'a [ActionChoice],
}

impl DecisionContext<'_> {
    fn to_call(&self) -> Chips {
        self.choices
            .iter()
            .find_map(|choice| match choice {
                ActionChoice::Call(amount) => Some(*amount),
                _ => None,
            })
            .unwrap_or(0)
    }

    fn can_check(&self) -> bool {
        self.choices.contains(&ActionChoice::Check)
    }

    fn raise_bounds(&self) -> Option<(Chips, Chips)> {
        self.choices.iter().find_map(|choice| match choice {
            ActionChoice::Raise { min, max } => Some((*min, *max)),
            _ => None,
        })
    }

    fn can_call(&self) -> bool {
        self.choices
            .iter()
            .any(|choice| matches!(choice, ActionChoice::Call(_)))
    }

    fn can_go_all_in(&self) -> bool {
        self.choices
            .iter()
            .any(|choice| matches!(choice, ActionChoice::AllIn(_)))
    }
}

/// Bot decision maker
pub struct DecisionMaker {
    style: BotStyle,
    params: StyleParams,
    equity_iterations: usize,
    rng: StdRng,
}

impl DecisionMaker {
    pub fn new(style: BotStyle, equity_iterations: usize, rng: StdRng) -> Self {
        Self {
            style,
            params: style.params(),
            equity_iterations,
            rng,
        }
    }

    pub fn style(&self) -> BotStyle {
        self.style
    }

    /// Pick one of `ctx.choices`. Always returns an action the table
    /// accepts as long as the choices are current.
    pub fn decide(&mut self, ctx: &DecisionContext) -> Action {
        let strength = estimate_strength(ctx.hole_cards, ctx.board_cards);
        let to_call = ctx.to_call();

        if strength < self.params.fold_threshold {
            if ctx.can_check() {
                return Action::Check;
            }
            if self.params.bluff_frequency > 0.0 && self.rng.random_bool(self.params.bluff_frequency)
            {
                if let Some(action) = self.raise(ctx) {
                    return action;
                }
            }
            return Action::Fold;
        }

        if strength < self.params.raise_threshold {
            if ctx.can_check() {
                return Action::Check;
            }
            let equity = self.equity(ctx);
            if equity >= required_equity(ctx.pot_size, to_call)
                || self.rng.random_bool(self.params.call_probability)
            {
                return self.call(ctx);
            }
            return Action::Fold;
        }

        if self.rng.random_bool(self.params.raise_probability) {
            if let Some(action) = self.raise(ctx) {
                return action;
            }
        }
        if ctx.can_check() {
            Action::Check
        } else {
            self.call(ctx)
        }
    }

    /// Call, or shove when calling isn't on offer because the stack is short.
    fn call(&self, ctx: &DecisionContext) -> Action {
        if ctx.can_call() {
            Action::Call
        } else if ctx.can_go_all_in() {
            Action::AllIn
        } else {
            Action::Fold
        }
    }

    fn raise(&mut self, ctx: &DecisionContext) -> Option<Action> {
        match ctx.raise_bounds() {
            Some((min, max)) => {
                let variance = self.rng.random_range(0.8..=1.2);
                let target =
                    (ctx.pot_size as f32 * self.params.raise_pot_fraction * variance) as Chips;
                let amount = target.clamp(min, max);
                Some(if amount == max {
                    Action::AllIn
                } else {
                    Action::Raise(amount)
                })
            }
            None if ctx.can_go_all_in() => Some(Action::AllIn),
            None => None,
        }
    }

    fn equity(&mut self, ctx: &DecisionContext) -> f64 {
        match estimate_equity(
            ctx.hole_cards,
            ctx.board_cards,
            ctx.opponents,
            self.equity_iterations,
            &mut self.rng,
        ) {
            Ok(equity) => equity,
            Err(e) => {
                log::warn!("Equity estimate failed: {}", e);
                0.0
            }
        }
    }
}

/// Share of the final pot a call has to win to break even
pub fn required_equity(pot_size: Chips, to_call: Chips) -> f64 {
    if to_call == 0 {
        return 0.0;
    }
    f64::from(to_call) / f64::from(pot_size + to_call)
}

/// Rough strength in `[0.0, 1.0]`: a card-based heuristic before the flop,
/// the made hand plus open draws after it.
pub fn estimate_strength(hole_cards: &[Card], board_cards: &[Card]) -> f32 {
    if board_cards.is_empty() {
        return preflop_strength(hole_cards);
    }
    let Ok(analysis) = analyze_hand(hole_cards, board_cards) else {
        return 0.0;
    };

    let base = match analysis.category {
        HandCategory::HighCard => STRENGTH_HIGH_CARD,
        HandCategory::Pair => STRENGTH_PAIR,
        HandCategory::TwoPair => STRENGTH_TWO_PAIR,
        HandCategory::ThreeOfAKind => STRENGTH_THREE_OF_A_KIND,
        HandCategory::Straight => STRENGTH_STRAIGHT,
        HandCategory::Flush => STRENGTH_FLUSH,
        HandCategory::FullHouse => STRENGTH_FULL_HOUSE,
        HandCategory::FourOfAKind => STRENGTH_FOUR_OF_A_KIND,
        HandCategory::StraightFlush | HandCategory::RoyalFlush => STRENGTH_STRAIGHT_FLUSH,
    };

    // Normalize the top card (2-14) to a 0.0-0.1 kicker bonus
    let kicker_bonus = analysis
        .best
        .cards
        .first()
        .map_or(0.0, |card| f32::from(card.0) / 14.0 * 0.1);

    let draws = analysis
        .draws
        .iter()
        .filter(|draw| matches!(draw, Draw::Flush | Draw::Straight))
        .count();

    (base + kicker_bonus + DRAW_BONUS * draws as f32).min(1.0)
}

fn preflop_strength(hole_cards: &[Card]) -> f32 {
    let [a, b] = hole_cards else {
        return 0.0;
    };
    let (high, low) = if a.0 >= b.0 { (a.0, b.0) } else { (b.0, a.0) };

    let mut strength = f32::from(high + low) / 28.0 * 0.5;
    if high == low {
        strength += 0.3 + f32::from(low) / 14.0 * 0.2;
    }
    if a.1 == b.1 {
        strength += 0.05;
    }
    match high - low {
        1 => strength += 0.04,
        2 => strength += 0.02,
        _ => {}
    }
    strength.clamp(0.0, 1.0)
}

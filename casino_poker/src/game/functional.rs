//! Pure hand evaluation.
//!
//! Every function here is side-effect free and safe to call from any task.
//! Hands are ranked by category first and then by a tiebreaker that packs
//! the decisive card values (primary group first, then kickers) into a
//! base-15 integer, so hands of the same category compare as integers.

use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::HashSet};
use thiserror::Error;

use super::constants::HAND_SIZE;
use super::entities::{ACE, Card, HandCategory, HandRanking, Value};

const TIEBREAKER_BASE: u32 = 15;

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum EvalError {
    #[error("need exactly 5 cards, got {0}")]
    WrongHandSize(usize),
    #[error("need at least 5 cards to evaluate a hand, got {0}")]
    NotEnoughCards(usize),
    #[error("{0} appears more than once")]
    DuplicateCard(Card),
    #[error("invalid card value {0}")]
    InvalidValue(Value),
    #[error("need exactly 2 hole cards, got {0}")]
    WrongHoleCount(usize),
    #[error("the board holds at most 5 cards, got {0}")]
    BoardTooLarge(usize),
    #[error("not enough cards left to deal {0} more")]
    DeckTooSmall(usize),
}

pub(crate) fn validate(cards: &[Card]) -> Result<(), EvalError> {
    let mut seen = HashSet::with_capacity(cards.len());
    for card in cards {
        if !card.is_valid() {
            return Err(EvalError::InvalidValue(card.0));
        }
        if !seen.insert(*card) {
            return Err(EvalError::DuplicateCard(*card));
        }
    }
    Ok(())
}

/// Spoken name of a card value as used in hand descriptions.
#[must_use]
pub fn value_name(value: Value) -> String {
    match value {
        14 => "Ace".to_string(),
        13 => "King".to_string(),
        12 => "Queen".to_string(),
        11 => "Jack".to_string(),
        v => v.to_string(),
    }
}

fn plural(value: Value) -> String {
    format!("{}s", value_name(value))
}

fn encode(values: &[Value]) -> u32 {
    values
        .iter()
        .fold(0, |acc, v| acc * TIEBREAKER_BASE + u32::from(*v))
}

/// High card of the straight formed by five distinct descending values.
fn straight_high(values: &[Value]) -> Option<Value> {
    if values.len() != HAND_SIZE {
        return None;
    }
    if values[0] - values[4] == 4 {
        return Some(values[0]);
    }
    // The wheel: A-2-3-4-5 plays as a five-high straight.
    (*values == [ACE, 5, 4, 3, 2]).then_some(5)
}

/// Rank exactly five unique, valid cards.
pub fn evaluate_hand(cards: &[Card]) -> Result<HandRanking, EvalError> {
    if cards.len() != HAND_SIZE {
        return Err(EvalError::WrongHandSize(cards.len()));
    }
    validate(cards)?;
    Ok(rank_five(cards))
}

fn rank_five(cards: &[Card]) -> HandRanking {
    let mut sorted = cards.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let is_flush = sorted.iter().all(|c| c.1 == sorted[0].1);

    let mut counts = [0u8; ACE as usize + 1];
    for card in &sorted {
        counts[card.0 as usize] += 1;
    }
    // (count, value) groups, biggest group first, then highest value.
    let mut groups: Vec<(u8, Value)> = (2..=ACE)
        .rev()
        .filter(|v| counts[*v as usize] > 0)
        .map(|v| (counts[v as usize], v))
        .collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));

    let distinct: Vec<Value> = groups.iter().map(|(_, v)| *v).collect();
    let straight = if groups.len() == HAND_SIZE {
        let mut desc = distinct.clone();
        desc.sort_unstable_by(|a, b| b.cmp(a));
        straight_high(&desc)
    } else {
        None
    };

    let (category, tiebreaker, description) = match (is_flush, straight, groups.as_slice()) {
        (true, Some(ACE), _) => (
            HandCategory::RoyalFlush,
            0,
            format!("Royal Flush ({})", sorted[0].1),
        ),
        (true, Some(high), _) => (
            HandCategory::StraightFlush,
            encode(&[high]),
            format!("Straight Flush, {} high", value_name(high)),
        ),
        (_, _, [(4, quad), (1, kicker)]) => (
            HandCategory::FourOfAKind,
            encode(&[*quad, *kicker]),
            format!("Four {}", plural(*quad)),
        ),
        (_, _, [(3, trip), (2, pair)]) => (
            HandCategory::FullHouse,
            encode(&[*trip, *pair]),
            format!("{} full of {}", plural(*trip), plural(*pair)),
        ),
        (true, None, _) => (
            HandCategory::Flush,
            encode(&distinct),
            format!("{} high flush", value_name(distinct[0])),
        ),
        (false, Some(high), _) => (
            HandCategory::Straight,
            encode(&[high]),
            format!("Straight, {} high", value_name(high)),
        ),
        (_, _, [(3, trip), (1, k1), (1, k2)]) => (
            HandCategory::ThreeOfAKind,
            encode(&[*trip, *k1, *k2]),
            format!("Three {}", plural(*trip)),
        ),
        (_, _, [(2, high), (2, low), (1, kicker)]) => (
            HandCategory::TwoPair,
            encode(&[*high, *low, *kicker]),
            format!("{} and {}", plural(*high), plural(*low)),
        ),
        (_, _, [(2, pair), (1, k1), (1, k2), (1, k3)]) => (
            HandCategory::Pair,
            encode(&[*pair, *k1, *k2, *k3]),
            format!("Pair of {}", plural(*pair)),
        ),
        _ => (
            HandCategory::HighCard,
            encode(&distinct),
            format!("{} high", value_name(distinct[0])),
        ),
    };

    HandRanking {
        category,
        tiebreaker,
        description,
        cards: sorted,
    }
}

/// Every 5-card combination of `cards`, in lexicographic index order.
fn combinations(cards: &[Card]) -> Vec<[Card; 5]> {
    let n = cards.len();
    let mut combos = Vec::new();
    for a in 0..n {
        for b in a + 1..n {
            for c in b + 1..n {
                for d in c + 1..n {
                    for e in d + 1..n {
                        combos.push([cards[a], cards[b], cards[c], cards[d], cards[e]]);
                    }
                }
            }
        }
    }
    combos
}

/// Best 5-card hand out of five or more unique cards (2 hole + up to 5
/// board in hold'em).
pub fn evaluate_best_hand(cards: &[Card]) -> Result<HandRanking, EvalError> {
    if cards.len() < HAND_SIZE {
        return Err(EvalError::NotEnoughCards(cards.len()));
    }
    validate(cards)?;
    combinations(cards)
        .iter()
        .map(|combo| rank_five(combo))
        .max()
        .ok_or(EvalError::NotEnoughCards(cards.len()))
}

/// Every 5-card hand that can be made from `cards`, strongest first.
pub fn all_possible_hands(cards: &[Card]) -> Result<Vec<HandRanking>, EvalError> {
    if cards.len() < HAND_SIZE {
        return Err(EvalError::NotEnoughCards(cards.len()));
    }
    validate(cards)?;
    let mut hands: Vec<HandRanking> = combinations(cards)
        .iter()
        .map(|combo| rank_five(combo))
        .collect();
    hands.sort_by(|a, b| b.cmp(a));
    Ok(hands)
}

/// `Equal` only for a true tie.
#[must_use]
pub fn compare_hands(a: &HandRanking, b: &HandRanking) -> Ordering {
    a.cmp(b)
}

#[must_use]
pub fn hand_strength(hand: &HandRanking) -> u64 {
    hand.strength()
}

/// Indices of every hand tied for best. Empty input gives an empty result.
#[must_use]
pub fn argmax(hands: &[HandRanking]) -> Vec<usize> {
    let Some(best) = hands.iter().max() else {
        return Vec::new();
    };
    hands
        .iter()
        .enumerate()
        .filter(|(_, hand)| *hand == best)
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit;

    fn cards(s: &str) -> Vec<Card> {
        s.split_whitespace().map(|c| c.parse().unwrap()).collect()
    }

    fn best(s: &str) -> HandRanking {
        evaluate_best_hand(&cards(s)).unwrap()
    }

    // === Category Tests ===

    #[test]
    fn test_royal_flush() {
        let hand = best("As Ks Qs Js 10s 2d 3c");
        assert_eq!(hand.category, HandCategory::RoyalFlush);
        assert_eq!(hand.tiebreaker, 0);
        assert_eq!(hand.description, "Royal Flush (♠)");
    }

    #[test]
    fn test_straight_flush() {
        let hand = best("9h 8h 7h 6h 5h Ad Ac");
        assert_eq!(hand.category, HandCategory::StraightFlush);
        assert_eq!(hand.description, "Straight Flush, 9 high");
    }

    #[test]
    fn test_four_of_a_kind() {
        let hand = best("Ks Kh Kd Kc 2s 3d 9h");
        assert_eq!(hand.category, HandCategory::FourOfAKind);
        assert_eq!(hand.description, "Four Kings");
    }

    #[test]
    fn test_full_house_prefers_higher_trips() {
        let hand = best("7s 7h 7d 2c 2s 9h 9d");
        assert_eq!(hand.category, HandCategory::FullHouse);
        assert_eq!(hand.description, "7s full of 9s");
    }

    #[test]
    fn test_flush() {
        let hand = best("Ah 9h 7h 4h 2h Ks Qd");
        assert_eq!(hand.category, HandCategory::Flush);
        assert_eq!(hand.description, "Ace high flush");
    }

    #[test]
    fn test_straight() {
        let hand = best("10s 9h 8d 7c 6s 2h 2d");
        assert_eq!(hand.category, HandCategory::Straight);
        assert_eq!(hand.description, "Straight, 10 high");
    }

    #[test]
    fn test_three_of_a_kind() {
        let hand = best("Qs Qh Qd 9c 4s 3h 2d");
        assert_eq!(hand.category, HandCategory::ThreeOfAKind);
        assert_eq!(hand.description, "Three Queens");
    }

    #[test]
    fn test_two_pair() {
        let hand = best("Js Jh 4d 4c 9s 3h 2d");
        assert_eq!(hand.category, HandCategory::TwoPair);
        assert_eq!(hand.description, "Jacks and 4s");
    }

    #[test]
    fn test_pair() {
        let hand = best("10s 10h 8d 6c 4s 3h 2d");
        assert_eq!(hand.category, HandCategory::Pair);
        assert_eq!(hand.description, "Pair of 10s");
    }

    #[test]
    fn test_high_card() {
        let hand = best("As Jh 8d 6c 4s 3h 2d");
        assert_eq!(hand.category, HandCategory::HighCard);
        assert_eq!(hand.description, "Ace high");
    }

    // === Wheel Tests ===

    #[test]
    fn test_wheel_is_five_high_straight() {
        let hand = best("As 2d 3c 4h 5s Kd Qc");
        assert_eq!(hand.category, HandCategory::Straight);
        assert_eq!(hand.description, "Straight, 5 high");
    }

    #[test]
    fn test_six_high_straight_beats_wheel() {
        let wheel = best("As 2d 3c 4h 5s");
        let six = best("2s 3d 4c 5h 6s");
        assert_eq!(compare_hands(&six, &wheel), Ordering::Greater);
    }

    #[test]
    fn test_steel_wheel_is_straight_flush_not_royal() {
        let hand = best("Ad 2d 3d 4d 5d");
        assert_eq!(hand.category, HandCategory::StraightFlush);
        assert_eq!(hand.description, "Straight Flush, 5 high");
    }

    #[test]
    fn test_ace_does_not_wrap() {
        let hand = best("Qs Kd Ac 2h 3s");
        assert_eq!(hand.category, HandCategory::HighCard);
    }

    // === Tiebreaker Tests ===

    #[test]
    fn test_kickers_break_pair_ties() {
        let a = best("Ks Kh 9d 5c 2s");
        let b = best("Kd Kc 9s 4c 3s");
        assert_eq!(compare_hands(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_quads_kicker() {
        let a = best("7s 7h 7d 7c As");
        let b = best("7s 7h 7d 7c Ks");
        assert!(a > b);
    }

    #[test]
    fn test_true_tie_across_suits() {
        let a = best("Ks Qh 9d 5c 2s");
        let b = best("Kd Qc 9s 5h 2d");
        assert_eq!(compare_hands(&a, &b), Ordering::Equal);
        assert_eq!(hand_strength(&a), hand_strength(&b));
    }

    #[test]
    fn test_tiebreakers_stay_below_category_step() {
        let top_high_card = best("As Kh Qd Jc 9s");
        let low_pair = best("2s 2h 3d 4c 5s");
        assert!(top_high_card.tiebreaker < 1_000_000);
        assert!(hand_strength(&low_pair) > hand_strength(&top_high_card));
    }

    #[test]
    fn test_hand_strength_formula() {
        let hand = best("As Ks Qs Js 10s");
        assert_eq!(hand_strength(&hand), 10_000_000);
    }

    // === Error Tests ===

    #[test]
    fn test_evaluate_hand_requires_five_cards() {
        assert_eq!(
            evaluate_hand(&cards("As Ks Qs Js")),
            Err(EvalError::WrongHandSize(4))
        );
        assert_eq!(
            evaluate_hand(&cards("As Ks Qs Js 10s 9s")),
            Err(EvalError::WrongHandSize(6))
        );
    }

    #[test]
    fn test_best_hand_requires_five_cards() {
        assert_eq!(
            evaluate_best_hand(&cards("As Ks")),
            Err(EvalError::NotEnoughCards(2))
        );
    }

    #[test]
    fn test_duplicate_cards_rejected() {
        assert_eq!(
            evaluate_best_hand(&cards("As As Qs Js 10s")),
            Err(EvalError::DuplicateCard(Card(14, Suit::Spade)))
        );
    }

    #[test]
    fn test_invalid_value_rejected() {
        let mut hand = cards("As Ks Qs Js");
        hand.push(Card(1, Suit::Heart));
        assert_eq!(evaluate_hand(&hand), Err(EvalError::InvalidValue(1)));
    }

    // === Helper Tests ===

    #[test]
    fn test_all_possible_hands_sorted_and_complete() {
        let hands = all_possible_hands(&cards("As Ks Qs Js 10s 2d 3c")).unwrap();
        assert_eq!(hands.len(), 21);
        assert_eq!(hands[0].category, HandCategory::RoyalFlush);
        assert!(hands.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_argmax_keeps_ties() {
        let hands = vec![
            best("Ks Qh 9d 5c 2s"),
            best("As 2h 3d 4c 5s"),
            best("Ad 2c 3s 4h 5d"),
        ];
        assert_eq!(argmax(&hands), vec![1, 2]);
        assert!(argmax(&[]).is_empty());
    }

    #[test]
    fn test_cards_sorted_descending() {
        let hand = best("2s 9h 5d Kc 7s");
        let values: Vec<Value> = hand.cards.iter().map(|c| c.0).collect();
        assert_eq!(values, vec![13, 9, 7, 5, 2]);
    }
}

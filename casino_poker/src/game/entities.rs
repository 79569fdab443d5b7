use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
    str::FromStr,
};
use thiserror::Error;

use super::constants;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values.
pub type Value = u8;

pub const MIN_VALUE: Value = 2;
pub const ACE: Value = 14;

/// Short rank label for a card value (`2`..`10`, `J`, `Q`, `K`, `A`).
#[must_use]
pub fn rank_label(value: Value) -> &'static str {
    match value {
        2 => "2",
        3 => "3",
        4 => "4",
        5 => "5",
        6 => "6",
        7 => "7",
        8 => "8",
        9 => "9",
        10 => "10",
        11 => "J",
        12 => "Q",
        13 => "K",
        14 => "A",
        _ => "?",
    }
}

/// A card is a tuple of a value (two=2u8 ... ace=14u8) and a suit.
/// Aces only play low inside the wheel straight.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl Card {
    #[must_use]
    pub const fn new(value: Value, suit: Suit) -> Self {
        Self(value, suit)
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.0 >= MIN_VALUE && self.0 <= ACE
    }

    #[must_use]
    pub fn rank_label(&self) -> &'static str {
        rank_label(self.0)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank_label(), self.1)
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("can't parse card {0:?}")]
pub struct CardParseError(pub String);

impl FromStr for Card {
    type Err = CardParseError;

    /// Parses short forms like `As`, `10h`, `Td` or `K♦`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || CardParseError(trimmed.to_string());
        let mut chars = trimmed.chars();
        let suit = match chars.next_back().ok_or_else(err)? {
            'c' | 'C' | '♣' => Suit::Club,
            's' | 'S' | '♠' => Suit::Spade,
            'd' | 'D' | '♦' => Suit::Diamond,
            'h' | 'H' | '♥' => Suit::Heart,
            _ => return Err(err()),
        };
        let value = match chars.as_str().to_ascii_uppercase().as_str() {
            "A" => ACE,
            "K" => 13,
            "Q" => 12,
            "J" => 11,
            "T" | "10" => 10,
            other => other
                .parse::<Value>()
                .ok()
                .filter(|v| (MIN_VALUE..=9).contains(v))
                .ok_or_else(err)?,
        };
        Ok(Self(value, suit))
    }
}

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum DeckError {
    #[error("deck is exhausted")]
    Exhausted,
    #[error("{0} appears twice in the deck")]
    DuplicateCard(Card),
    #[error("{0:?} is not a valid card")]
    InvalidCard(Card),
}

/// A 52-card deck consumed strictly in order. One deck lives for a whole
/// hand so no card can be dealt twice.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
    deck_idx: usize,
}

impl Deck {
    pub fn deal_card(&mut self) -> Result<Card, DeckError> {
        let card = *self.cards.get(self.deck_idx).ok_or(DeckError::Exhausted)?;
        self.deck_idx += 1;
        Ok(card)
    }

    /// Fisher-Yates shuffle of the full deck. Resets the deal position.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
        self.deck_idx = 0;
    }

    /// Builds a deck whose first cards are `top` in the given order, followed
    /// by the remaining cards of a fresh deck. Used for replays and tests.
    pub fn stacked(top: &[Card]) -> Result<Self, DeckError> {
        let mut seen = HashSet::with_capacity(top.len());
        for card in top {
            if !card.is_valid() {
                return Err(DeckError::InvalidCard(*card));
            }
            if !seen.insert(*card) {
                return Err(DeckError::DuplicateCard(*card));
            }
        }
        let mut cards = top.to_vec();
        cards.extend(Self::default().cards.into_iter().filter(|c| !seen.contains(c)));
        Ok(Self { cards, deck_idx: 0 })
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.deck_idx
    }
}

impl Default for Deck {
    fn default() -> Self {
        let cards = (MIN_VALUE..=ACE)
            .flat_map(|value| Suit::ALL.into_iter().map(move |suit| Card(value, suit)))
            .collect();
        Self { cards, deck_idx: 0 }
    }
}

/// Type alias for whole chips. Stacks, bets and pots never carry fractions.
pub type Chips = u32;

/// Identifier the platform assigns to a connected player.
pub type PlayerId = i64;

/// Type alias for seat positions during the game.
pub type SeatIndex = usize;

pub const DEFAULT_STARTING_CHIPS: Chips = 1000;
pub const DEFAULT_SMALL_BLIND: Chips = 10;
pub const DEFAULT_BIG_BLIND: Chips = 20;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Self {
        let username: String = s
            .chars()
            .take(constants::MAX_USER_INPUT_LENGTH / 2)
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .collect();
        Self(username)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for Username {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for Username {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Blinds {
    pub small: Chips,
    pub big: Chips,
}

impl fmt::Display for Blinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}/{}", self.small, self.big)
    }
}

/// A betting decision. `Raise` carries the increase over the current
/// table bet, not the new total.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Action {
    Fold,
    Check,
    Call,
    Raise(Chips),
    AllIn,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Fold => write!(f, "folds"),
            Self::Check => write!(f, "checks"),
            Self::Call => write!(f, "calls"),
            Self::Raise(amount) => write!(f, "raises ${amount}"),
            Self::AllIn => write!(f, "goes all-in"),
        }
    }
}

/// What the player holding the turn may legally do, with the amounts
/// involved.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ActionChoice {
    Fold,
    Check,
    Call(Chips),
    Raise { min: Chips, max: Chips },
    AllIn(Chips),
}

impl fmt::Display for ActionChoice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Fold => write!(f, "fold"),
            Self::Check => write!(f, "check"),
            Self::Call(amount) => write!(f, "call (== ${amount})"),
            Self::Raise { min, max } => write!(f, "raise (${min}..=${max})"),
            Self::AllIn(amount) => write!(f, "all-in (${amount})"),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Waiting,
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
    Finished,
}

impl Phase {
    /// Whether players are expected to bet in this phase.
    #[must_use]
    pub const fn is_betting(self) -> bool {
        matches!(self, Self::PreFlop | Self::Flop | Self::Turn | Self::River)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::PreFlop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: Username,
    pub chips: Chips,
    pub cards: Vec<Card>,
    /// Chips put in during the current street only.
    pub bet: Chips,
    pub folded: bool,
    pub all_in: bool,
    pub has_acted: bool,
    pub connected: bool,
    pub seat_idx: SeatIndex,
    pub is_dealer: bool,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: Username, chips: Chips, seat_idx: SeatIndex) -> Self {
        Self {
            id,
            name,
            chips,
            cards: Vec::with_capacity(constants::HOLE_CARDS),
            bet: 0,
            folded: false,
            all_in: false,
            has_acted: false,
            connected: true,
            seat_idx,
            is_dealer: false,
        }
    }

    pub fn reset(&mut self) {
        self.cards.clear();
        self.bet = 0;
        self.folded = false;
        self.all_in = false;
        self.has_acted = false;
        self.is_dealer = false;
    }

    /// Still has betting decisions to make this hand.
    #[must_use]
    pub fn can_act(&self) -> bool {
        !self.folded && !self.all_in && self.connected
    }

    /// Still contesting the pot.
    #[must_use]
    pub fn is_contender(&self) -> bool {
        !self.folded && !self.cards.is_empty()
    }
}

/// One layer of the pot and the players who may win it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SidePot {
    pub amount: Chips,
    pub eligible: Vec<PlayerId>,
}

/// Result of splitting a pot at the end of a hand. Every chip invested is
/// either in one of `pots` or refunded to its owner.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Settlement {
    pub pots: Vec<SidePot>,
    pub refunds: BTreeMap<PlayerId, Chips>,
}

#[derive(Clone, Debug, Default)]
pub struct Pot {
    // Map players to their investment in the pot over the whole hand.
    pub investments: HashMap<PlayerId, Chips>,
}

impl Pot {
    #[must_use]
    pub fn new(max_players: usize) -> Self {
        Self {
            investments: HashMap::with_capacity(max_players),
        }
    }

    pub fn bet(&mut self, player_id: PlayerId, amount: Chips) {
        let investment = self.investments.entry(player_id).or_default();
        *investment += amount;
    }

    /// Return the amount the player has invested in the pot.
    #[must_use]
    pub fn get_investment(&self, player_id: PlayerId) -> Chips {
        self.investments.get(&player_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn get_size(&self) -> Chips {
        self.investments.values().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.get_size() == 0
    }

    pub fn clear(&mut self) {
        self.investments.clear();
    }

    /// Splits the pot into layers by the investment levels of `contenders`.
    ///
    /// A layer only its single eligible player paid into is an uncalled bet
    /// and is refunded to them. Folded chips above the highest contender
    /// level stay in the last pot.
    #[must_use]
    pub fn settle(&self, contenders: &HashSet<PlayerId>) -> Settlement {
        let mut levels: Vec<Chips> = contenders
            .iter()
            .map(|id| self.get_investment(*id))
            .filter(|amount| *amount > 0)
            .collect();
        levels.sort_unstable();
        levels.dedup();

        let mut settlement = Settlement::default();
        let mut prev = 0;
        for level in levels {
            let mut amount = 0;
            let mut contributors = Vec::new();
            for (id, investment) in &self.investments {
                let part = (*investment).min(level).saturating_sub(prev);
                if part > 0 {
                    amount += part;
                    contributors.push(*id);
                }
            }
            let mut eligible: Vec<PlayerId> = contenders
                .iter()
                .copied()
                .filter(|id| self.get_investment(*id) >= level)
                .collect();
            eligible.sort_unstable();

            if let [only] = eligible.as_slice()
                && contributors.iter().all(|id| id == only)
            {
                *settlement.refunds.entry(*only).or_default() += amount;
            } else if amount > 0 {
                settlement.pots.push(SidePot { amount, eligible });
            }
            prev = level;
        }

        // Only folded players can have put in more than the top contender.
        // Their chips are dead and go to the last pot.
        let dead: Chips = self
            .investments
            .values()
            .map(|investment| investment.saturating_sub(prev))
            .sum();
        if dead > 0 {
            match settlement.pots.last_mut() {
                Some(last) => last.amount += dead,
                None => {
                    let mut eligible: Vec<PlayerId> = contenders.iter().copied().collect();
                    eligible.sort_unstable();
                    settlement.pots.push(SidePot {
                        amount: dead,
                        eligible,
                    });
                }
            }
        }
        settlement
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum HandCategory {
    HighCard = 1,
    Pair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl HandCategory {
    /// Numeric rank, 1 for high card up to 10 for a royal flush.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HighCard => "High Card",
            Self::Pair => "Pair",
            Self::TwoPair => "Two Pair",
            Self::ThreeOfAKind => "Three of a Kind",
            Self::Straight => "Straight",
            Self::Flush => "Flush",
            Self::FullHouse => "Full House",
            Self::FourOfAKind => "Four of a Kind",
            Self::StraightFlush => "Straight Flush",
            Self::RoyalFlush => "Royal Flush",
        }
    }
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Evaluated 5-card hand. Equality and ordering only look at the category
/// and tiebreaker, so two hands with different suits can tie.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HandRanking {
    pub category: HandCategory,
    pub tiebreaker: u32,
    pub description: String,
    /// The five cards making the hand, highest value first.
    pub cards: Vec<Card>,
}

impl HandRanking {
    /// Single integer ordering every hand: `rank * 1_000_000 + tiebreaker`.
    #[must_use]
    pub fn strength(&self) -> u64 {
        u64::from(self.category.rank()) * 1_000_000 + u64::from(self.tiebreaker)
    }
}

impl PartialEq for HandRanking {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category && self.tiebreaker == other.tiebreaker
    }
}

impl Eq for HandRanking {}

impl PartialOrd for HandRanking {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandRanking {
    fn cmp(&self, other: &Self) -> Ordering {
        self.category
            .cmp(&other.category)
            .then(self.tiebreaker.cmp(&other.tiebreaker))
    }
}

impl fmt::Display for HandRanking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Winner {
    pub player_id: PlayerId,
    pub name: Username,
    pub hand: String,
    pub amount: Chips,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: Username,
    pub chips: Chips,
    pub bet: Chips,
    pub seat_idx: SeatIndex,
    pub folded: bool,
    pub all_in: bool,
    pub connected: bool,
    pub is_dealer: bool,
    /// Whether the player was dealt into the current hand.
    pub in_hand: bool,
    /// Empty unless the viewer owns these cards or they were revealed.
    pub cards: Vec<Card>,
}

/// Snapshot of a table from one viewer's point of view.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TableView {
    pub phase: Phase,
    pub hand_number: u32,
    pub blinds: Blinds,
    pub board: Vec<Card>,
    pub pot: Chips,
    pub current_bet: Chips,
    pub current_turn: Option<PlayerId>,
    pub turn_generation: u64,
    pub dealer: Option<PlayerId>,
    pub players: Vec<PlayerView>,
    pub winners: Vec<Winner>,
}

impl TableView {
    #[must_use]
    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    // === Card Tests ===

    #[test]
    fn test_card_display() {
        assert_eq!(Card(14, Suit::Spade).to_string(), "A♠");
        assert_eq!(Card(10, Suit::Heart).to_string(), "10♥");
        assert_eq!(Card(2, Suit::Club).to_string(), "2♣");
    }

    #[test]
    fn test_card_parse_short_forms() {
        assert_eq!(card("As"), Card(14, Suit::Spade));
        assert_eq!(card("10h"), Card(10, Suit::Heart));
        assert_eq!(card("Td"), Card(10, Suit::Diamond));
        assert_eq!(card("K♦"), Card(13, Suit::Diamond));
        assert_eq!(card("2c"), Card(2, Suit::Club));
    }

    #[test]
    fn test_card_parse_rejects_garbage() {
        assert!("".parse::<Card>().is_err());
        assert!("1s".parse::<Card>().is_err());
        assert!("Ax".parse::<Card>().is_err());
        assert!("11h".parse::<Card>().is_err());
    }

    #[test]
    fn test_card_validity() {
        assert!(Card(2, Suit::Heart).is_valid());
        assert!(Card(14, Suit::Heart).is_valid());
        assert!(!Card(1, Suit::Heart).is_valid());
        assert!(!Card(15, Suit::Heart).is_valid());
    }

    // === Deck Tests ===

    #[test]
    fn test_deck_has_52_unique_cards() {
        let mut deck = Deck::default();
        let mut seen = HashSet::new();
        while let Ok(card) = deck.deal_card() {
            assert!(card.is_valid());
            assert!(seen.insert(card));
        }
        assert_eq!(seen.len(), 52);
    }

    #[test]
    fn test_deck_exhaustion() {
        let mut deck = Deck::default();
        for _ in 0..52 {
            deck.deal_card().unwrap();
        }
        assert_eq!(deck.remaining(), 0);
        assert_eq!(deck.deal_card(), Err(DeckError::Exhausted));
    }

    #[test]
    fn test_deck_shuffle_resets_and_keeps_cards() {
        let mut deck = Deck::default();
        deck.deal_card().unwrap();
        deck.shuffle(&mut StdRng::seed_from_u64(7));
        assert_eq!(deck.remaining(), 52);
        let mut dealt: Vec<Card> = (0..52).map(|_| deck.deal_card().unwrap()).collect();
        dealt.sort();
        let mut fresh: Vec<Card> = Deck::default().cards;
        fresh.sort();
        assert_eq!(dealt, fresh);
    }

    #[test]
    fn test_deck_seeded_shuffle_is_reproducible() {
        let mut a = Deck::default();
        let mut b = Deck::default();
        a.shuffle(&mut StdRng::seed_from_u64(42));
        b.shuffle(&mut StdRng::seed_from_u64(42));
        assert_eq!(a.cards, b.cards);
    }

    #[test]
    fn test_stacked_deck_deals_top_first() {
        let mut deck = Deck::stacked(&[card("As"), card("Kd")]).unwrap();
        assert_eq!(deck.deal_card().unwrap(), card("As"));
        assert_eq!(deck.deal_card().unwrap(), card("Kd"));
        assert_eq!(deck.remaining(), 50);
    }

    #[test]
    fn test_stacked_deck_rejects_duplicates() {
        assert_eq!(
            Deck::stacked(&[card("As"), card("As")]).unwrap_err(),
            DeckError::DuplicateCard(card("As"))
        );
        assert!(matches!(
            Deck::stacked(&[Card(1, Suit::Club)]),
            Err(DeckError::InvalidCard(_))
        ));
    }

    // === Username Tests ===

    #[test]
    fn test_username_sanitizes_whitespace() {
        let username = Username::new("big slick");
        assert_eq!(username.as_str(), "big_slick");
    }

    #[test]
    fn test_username_truncates() {
        let username = Username::new("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(username.as_str().len(), constants::MAX_USER_INPUT_LENGTH / 2);
    }

    #[test]
    fn test_username_truncates_multibyte_names() {
        let username = Username::new("abcdefghijklmnoé");
        assert_eq!(username.as_str(), "abcdefghijklmnoé");

        let username = Username::new("ééééééééééééééééééé");
        assert_eq!(
            username.as_str().chars().count(),
            constants::MAX_USER_INPUT_LENGTH / 2
        );
    }

    // === Pot Tests ===

    #[test]
    fn test_pot_accumulates_investments() {
        let mut pot = Pot::default();
        pot.bet(1, 10);
        pot.bet(2, 20);
        pot.bet(1, 10);
        assert_eq!(pot.get_investment(1), 20);
        assert_eq!(pot.get_size(), 40);
        assert!(!pot.is_empty());
        pot.clear();
        assert!(pot.is_empty());
    }

    #[test]
    fn test_settle_single_pot_when_everyone_matches() {
        let mut pot = Pot::default();
        for id in 1..=3 {
            pot.bet(id, 100);
        }
        let settlement = pot.settle(&HashSet::from([1, 2, 3]));
        assert_eq!(
            settlement.pots,
            vec![SidePot {
                amount: 300,
                eligible: vec![1, 2, 3]
            }]
        );
        assert!(settlement.refunds.is_empty());
    }

    #[test]
    fn test_settle_layers_short_all_in() {
        let mut pot = Pot::default();
        pot.bet(1, 50);
        pot.bet(2, 100);
        pot.bet(3, 100);
        let settlement = pot.settle(&HashSet::from([1, 2, 3]));
        assert_eq!(settlement.pots.len(), 2);
        assert_eq!(settlement.pots[0].amount, 150);
        assert_eq!(settlement.pots[0].eligible, vec![1, 2, 3]);
        assert_eq!(settlement.pots[1].amount, 100);
        assert_eq!(settlement.pots[1].eligible, vec![2, 3]);
    }

    #[test]
    fn test_settle_refunds_uncalled_excess() {
        let mut pot = Pot::default();
        pot.bet(1, 300);
        pot.bet(2, 100);
        let settlement = pot.settle(&HashSet::from([1, 2]));
        assert_eq!(settlement.pots.len(), 1);
        assert_eq!(settlement.pots[0].amount, 200);
        assert_eq!(settlement.refunds.get(&1), Some(&200));
    }

    #[test]
    fn test_settle_folded_money_is_dead() {
        let mut pot = Pot::default();
        pot.bet(1, 40);
        pot.bet(2, 40);
        pot.bet(3, 25);
        let settlement = pot.settle(&HashSet::from([1, 2]));
        assert_eq!(settlement.pots.len(), 1);
        assert_eq!(settlement.pots[0].amount, 105);
        assert_eq!(settlement.pots[0].eligible, vec![1, 2]);
    }

    #[test]
    fn test_settle_dead_money_above_contenders_goes_to_pot() {
        let mut pot = Pot::default();
        pot.bet(1, 20);
        pot.bet(2, 10);
        let settlement = pot.settle(&HashSet::from([2]));
        assert_eq!(
            settlement.pots,
            vec![SidePot {
                amount: 30,
                eligible: vec![2]
            }]
        );
        assert!(settlement.refunds.is_empty());
    }

    #[test]
    fn test_settle_conserves_chips() {
        let mut pot = Pot::default();
        pot.bet(1, 25);
        pot.bet(2, 75);
        pot.bet(3, 150);
        pot.bet(4, 160);
        pot.bet(5, 10);
        let settlement = pot.settle(&HashSet::from([1, 2, 3]));
        let pots: Chips = settlement.pots.iter().map(|p| p.amount).sum();
        let refunds: Chips = settlement.refunds.values().sum();
        assert_eq!(pots + refunds, pot.get_size());
    }

    // === Hand Ranking Tests ===

    #[test]
    fn test_hand_ranking_ignores_description_for_equality() {
        let a = HandRanking {
            category: HandCategory::Flush,
            tiebreaker: 12,
            description: "one".to_string(),
            cards: vec![],
        };
        let b = HandRanking {
            description: "two".to_string(),
            ..a.clone()
        };
        assert_eq!(a, b);
        assert_eq!(a.strength(), 6_000_012);
    }

    #[test]
    fn test_category_ranks() {
        assert_eq!(HandCategory::HighCard.rank(), 1);
        assert_eq!(HandCategory::RoyalFlush.rank(), 10);
        assert!(HandCategory::FullHouse > HandCategory::Flush);
    }

    // === Phase Tests ===

    #[test]
    fn test_phase_betting() {
        assert!(Phase::PreFlop.is_betting());
        assert!(Phase::River.is_betting());
        assert!(!Phase::Waiting.is_betting());
        assert!(!Phase::Showdown.is_betting());
        assert_eq!(Phase::PreFlop.to_string(), "pre-flop");
    }
}

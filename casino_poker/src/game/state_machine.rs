//! Poker table state machine.
//!
//! A [`PokerTable`] owns everything one hold'em game needs: seats, stacks,
//! the deck, the board and the pot. It moves through
//! `waiting -> pre-flop -> flop -> turn -> river -> showdown -> waiting`,
//! with `finished` as the terminal state once fewer than two players are
//! left. Every mutating call validates before it changes anything and
//! returns the [`GameEvent`]s it produced.

use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fmt};
use thiserror::Error;

use super::constants::{HOLE_CARDS, MAX_PLAYERS};
use super::entities::{
    Action, Blinds, Card, Chips, DEFAULT_BIG_BLIND, DEFAULT_SMALL_BLIND, DEFAULT_STARTING_CHIPS,
    Deck, DeckError, Phase, Player, PlayerId, PlayerView, Pot, SeatIndex, TableView, Username,
    Winner,
};
use super::functional::EvalError;

/// Errors that can occur during user operations
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum UserError {
    #[error("table is full")]
    CapacityReached,
    #[error("game already in progress")]
    GameAlreadyInProgress,
    #[error("game is over")]
    GameFinished,
    #[error("need 2+ players with chips")]
    NotEnoughPlayers,
    #[error("no betting round in progress")]
    NoBettingRound,
    #[error("not your turn")]
    OutOfTurnAction,
    #[error("can't check with ${to_call} to call")]
    CannotCheck { to_call: Chips },
    #[error("nothing to call")]
    NothingToCall,
    #[error("raise must be at least ${min}")]
    RaiseTooSmall { min: Chips },
    #[error("need ${needed} but only have ${available}")]
    InsufficientChips { needed: Chips, available: Chips },
    #[error("no chips left to bet")]
    NoChips,
    #[error("hand is not at showdown")]
    NotAtShowdown,
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("table can't hold any more chips")]
    ChipLimitReached,
    #[error("user does not exist")]
    UserDoesNotExist,
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error(transparent)]
    Evaluation(#[from] EvalError),
}

/// Events that occur during gameplay
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum GameEvent {
    PlayerJoined(Username),
    PlayerLeft(Username),
    HandStarted { hand_number: u32, dealer: Username },
    BlindPosted { player: Username, amount: Chips },
    ActionTaken {
        player: Username,
        action: Action,
        amount: Chips,
    },
    TurnTimedOut(Username),
    TurnChanged(Username),
    StreetDealt { phase: Phase, cards: Vec<Card> },
    HandRevealed { player: Username, hand: String },
    UncalledBetReturned { player: Username, amount: Chips },
    PotAwarded {
        player: Username,
        amount: Chips,
        hand: String,
    },
    PlayerBusted(Username),
    HandEnded { hand_number: u32 },
    GameFinished,
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayerJoined(username) => write!(f, "{username} joined the table"),
            Self::PlayerLeft(username) => write!(f, "{username} left the table"),
            Self::HandStarted {
                hand_number,
                dealer,
            } => write!(f, "hand #{hand_number} started, {dealer} has the button"),
            Self::BlindPosted { player, amount } => write!(f, "{player} posts ${amount}"),
            Self::ActionTaken {
                player,
                action: Action::Raise(_),
                amount,
            } => write!(f, "{player} raises, putting in ${amount}"),
            Self::ActionTaken {
                player,
                action,
                amount: 0,
            } => write!(f, "{player} {action}"),
            Self::ActionTaken {
                player,
                action,
                amount,
            } => write!(f, "{player} {action} (${amount})"),
            Self::TurnTimedOut(username) => write!(f, "{username} ran out of time"),
            Self::TurnChanged(username) => write!(f, "{username}'s turn"),
            Self::StreetDealt { phase, cards } => {
                let cards = cards
                    .iter()
                    .map(Card::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(f, "{phase}: {cards}")
            }
            Self::HandRevealed { player, hand } => write!(f, "{player} shows {hand}"),
            Self::UncalledBetReturned { player, amount } => {
                write!(f, "${amount} uncalled returned to {player}")
            }
            Self::PotAwarded {
                player,
                amount,
                hand,
            } => write!(f, "{player} won ${amount} with {hand}"),
            Self::PlayerBusted(username) => write!(f, "{username} is out of chips"),
            Self::HandEnded { hand_number } => write!(f, "hand #{hand_number} is over"),
            Self::GameFinished => write!(f, "game over"),
        }
    }
}

/// Game configuration settings
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameSettings {
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub starting_chips: Chips,
    pub max_players: usize,
    /// Seed for the shuffle RNG. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::new(
            DEFAULT_SMALL_BLIND,
            DEFAULT_BIG_BLIND,
            DEFAULT_STARTING_CHIPS,
            MAX_PLAYERS,
            None,
        )
    }
}

impl GameSettings {
    #[must_use]
    pub const fn new(
        small_blind: Chips,
        big_blind: Chips,
        starting_chips: Chips,
        max_players: usize,
        seed: Option<u64>,
    ) -> Self {
        Self {
            small_blind,
            big_blind,
            starting_chips,
            max_players,
            seed,
        }
    }
}

/// One hold'em table and the hand currently being played on it.
#[derive(Debug)]
pub struct PokerTable {
    pub(super) settings: GameSettings,
    pub(super) rng: StdRng,
    /// Deck for the hand in progress. Replaced at every deal.
    pub(super) deck: Deck,
    /// Pre-arranged deck for the next deal, if any.
    pub(super) stacked: Option<Deck>,
    /// Seated players, ordered by seat.
    pub(super) players: Vec<Player>,
    pub(super) open_seats: VecDeque<SeatIndex>,
    /// Community cards shared amongst all players.
    pub(super) board: Vec<Card>,
    pub(super) pot: Pot,
    /// Highest street bet; what everyone still in must match.
    pub(super) current_bet: Chips,
    /// Index into `players` of whoever must act.
    pub(super) turn: Option<usize>,
    pub(super) dealer_idx: usize,
    pub(super) blinds: Blinds,
    pub(super) phase: Phase,
    pub(super) hand_number: u32,
    /// Bumped on every turn assignment so stale timeouts can be told apart.
    pub(super) turn_generation: u64,
    pub(super) winners: Vec<Winner>,
}

impl Default for PokerTable {
    fn default() -> Self {
        GameSettings::default().into()
    }
}

impl From<GameSettings> for PokerTable {
    fn from(value: GameSettings) -> Self {
        let rng = match value.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            deck: Deck::default(),
            stacked: None,
            players: Vec::with_capacity(value.max_players),
            open_seats: VecDeque::from_iter(0..value.max_players),
            board: Vec::with_capacity(5),
            pot: Pot::new(value.max_players),
            current_bet: 0,
            turn: None,
            dealer_idx: 0,
            blinds: Blinds {
                small: value.small_blind,
                big: value.big_blind,
            },
            phase: Phase::Waiting,
            hand_number: 0,
            turn_generation: 0,
            winners: Vec::new(),
            settings: value,
        }
    }
}

impl PokerTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Accessors ===

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn hand_number(&self) -> u32 {
        self.hand_number
    }

    #[must_use]
    pub fn blinds(&self) -> Blinds {
        self.blinds
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn board(&self) -> &[Card] {
        &self.board
    }

    #[must_use]
    pub fn pot_size(&self) -> Chips {
        self.pot.get_size()
    }

    #[must_use]
    pub fn current_bet(&self) -> Chips {
        self.current_bet
    }

    #[must_use]
    pub fn current_turn(&self) -> Option<PlayerId> {
        self.turn.map(|idx| self.players[idx].id)
    }

    #[must_use]
    pub fn turn_generation(&self) -> u64 {
        self.turn_generation
    }

    #[must_use]
    pub fn dealer(&self) -> Option<PlayerId> {
        self.players.get(self.dealer_idx).map(|p| p.id)
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    #[must_use]
    pub fn winners(&self) -> &[Winner] {
        &self.winners
    }

    #[must_use]
    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.open_seats.is_empty()
    }

    /// Chips on the table: every stack plus the pot. Constant for the
    /// length of a hand.
    #[must_use]
    pub fn total_chips(&self) -> Chips {
        self.players.iter().map(|p| p.chips).sum::<Chips>() + self.pot.get_size()
    }

    /// Arrange the deck for the next deal: `top` is dealt first, in order,
    /// hole cards round-robin from the seat left of the dealer, then the
    /// board.
    pub fn stack_next_deck(&mut self, top: &[Card]) -> Result<(), DeckError> {
        self.stacked = Some(Deck::stacked(top)?);
        Ok(())
    }

    // === Seating ===

    pub(super) fn find_idx(&self, player_id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    /// The first player after `from` (wrapping, `from` itself last) that
    /// satisfies `pred`.
    pub(super) fn next_idx(&self, from: usize, pred: impl Fn(&Player) -> bool) -> Option<usize> {
        let n = self.players.len();
        (1..=n)
            .map(|offset| (from + offset) % n)
            .find(|idx| pred(&self.players[*idx]))
    }

    fn remove_player_at(&mut self, idx: usize) -> Player {
        let player = self.players.remove(idx);
        self.open_seats.push_back(player.seat_idx);
        if idx < self.dealer_idx {
            self.dealer_idx -= 1;
        }
        if self.dealer_idx >= self.players.len() {
            self.dealer_idx = 0;
        }
        player
    }

    /// Seat a new player with the configured starting stack. Only allowed
    /// between hands.
    pub fn join(&mut self, player_id: PlayerId, name: Username) -> Result<Vec<GameEvent>, UserError> {
        match self.phase {
            Phase::Waiting => {}
            Phase::Finished => return Err(UserError::GameFinished),
            _ => return Err(UserError::GameAlreadyInProgress),
        }
        if self.find_idx(player_id).is_some() {
            return Err(UserError::UserAlreadyExists);
        }
        if u64::from(self.total_chips()) + u64::from(self.settings.starting_chips)
            > u64::from(Chips::MAX)
        {
            return Err(UserError::ChipLimitReached);
        }
        let seat_idx = self
            .open_seats
            .pop_front()
            .ok_or(UserError::CapacityReached)?;

        let pos = self.players.partition_point(|p| p.seat_idx < seat_idx);
        if !self.players.is_empty() && pos <= self.dealer_idx {
            self.dealer_idx += 1;
        }
        let player = Player::new(player_id, name.clone(), self.settings.starting_chips, seat_idx);
        self.players.insert(pos, player);
        info!("{name} took seat {seat_idx}");
        Ok(vec![GameEvent::PlayerJoined(name)])
    }

    /// A player leaving or dropping their connection.
    ///
    /// Between hands they are removed outright. Mid-hand they are folded
    /// (advancing the turn if it was theirs) and removed once the hand
    /// ends. If fewer than two connected players remain the pot goes to
    /// the survivor and the table finishes.
    pub fn leave(&mut self, player_id: PlayerId) -> Result<Vec<GameEvent>, UserError> {
        let idx = self
            .find_idx(player_id)
            .ok_or(UserError::UserDoesNotExist)?;
        let mut events = Vec::new();

        match self.phase {
            Phase::Waiting | Phase::Finished => {
                let player = self.remove_player_at(idx);
                info!("{} left the table", player.name);
                events.push(GameEvent::PlayerLeft(player.name));
                if self.phase == Phase::Waiting && self.hand_number > 0 && self.players.len() < 2 {
                    self.finish(&mut events);
                }
            }
            Phase::Showdown => {
                self.players[idx].connected = false;
                events.push(GameEvent::PlayerLeft(self.players[idx].name.clone()));
            }
            Phase::PreFlop | Phase::Flop | Phase::Turn | Phase::River => {
                self.players[idx].connected = false;
                let name = self.players[idx].name.clone();
                info!("{name} disconnected during hand #{}", self.hand_number);
                events.push(GameEvent::PlayerLeft(name));

                if !self.players[idx].folded {
                    if self.turn == Some(idx) {
                        self.commit_action(idx, Action::Fold, &mut events)?;
                        self.after_action(idx, &mut events)?;
                    } else {
                        self.players[idx].folded = true;
                        self.players[idx].has_acted = true;
                        self.after_passive_fold(&mut events)?;
                    }
                }

                let connected = self.players.iter().filter(|p| p.connected).count();
                if connected < 2 {
                    self.finish(&mut events);
                }
            }
        }
        Ok(events)
    }

    pub(super) fn finish(&mut self, events: &mut Vec<GameEvent>) {
        self.phase = Phase::Finished;
        self.turn = None;
        info!("table finished after {} hands", self.hand_number);
        events.push(GameEvent::GameFinished);
    }

    // === Hand lifecycle ===

    /// Shuffle, deal two hole cards each, post blinds and hand the turn to
    /// the first player after the big blind.
    pub fn start_new_hand(&mut self) -> Result<Vec<GameEvent>, UserError> {
        match self.phase {
            Phase::Waiting => {}
            Phase::Finished => return Err(UserError::GameFinished),
            _ => return Err(UserError::GameAlreadyInProgress),
        }
        let ready = self
            .players
            .iter()
            .filter(|p| p.connected && p.chips > 0)
            .count();
        if ready < 2 {
            return Err(UserError::NotEnoughPlayers);
        }

        let mut deck = match self.stacked.take() {
            Some(deck) => deck,
            None => {
                let mut deck = Deck::default();
                deck.shuffle(&mut self.rng);
                deck
            }
        };

        self.board.clear();
        self.pot.clear();
        self.winners.clear();
        self.current_bet = 0;
        self.turn = None;
        for player in &mut self.players {
            player.reset();
            // Sitting out: not dealt in and skipped like a folded player.
            if !player.connected || player.chips == 0 {
                player.folded = true;
            }
        }
        if self.players[self.dealer_idx].folded {
            self.dealer_idx = self
                .next_idx(self.dealer_idx, |p| !p.folded)
                .unwrap_or(0);
        }
        self.players[self.dealer_idx].is_dealer = true;

        let n = self.players.len();
        for _ in 0..HOLE_CARDS {
            for offset in 1..=n {
                let idx = (self.dealer_idx + offset) % n;
                if !self.players[idx].folded {
                    let card = deck.deal_card()?;
                    self.players[idx].cards.push(card);
                }
            }
        }
        self.deck = deck;
        self.hand_number += 1;
        self.phase = Phase::PreFlop;

        let dealer = self.players[self.dealer_idx].name.clone();
        info!("hand #{} started, {dealer} has the button", self.hand_number);
        let mut events = vec![GameEvent::HandStarted {
            hand_number: self.hand_number,
            dealer,
        }];

        let sb_idx = self
            .next_idx(self.dealer_idx, |p| !p.folded)
            .ok_or(UserError::NotEnoughPlayers)?;
        let bb_idx = self
            .next_idx(sb_idx, |p| !p.folded)
            .ok_or(UserError::NotEnoughPlayers)?;
        self.post_blind(sb_idx, self.blinds.small, &mut events);
        self.post_blind(bb_idx, self.blinds.big, &mut events);
        self.current_bet = self.blinds.big;

        self.open_action(bb_idx, &mut events)?;
        Ok(events)
    }

    /// Move the button, drop busted and disconnected players and get ready
    /// for the next deal. Only valid once a hand has been settled.
    pub fn end_hand(&mut self) -> Result<Vec<GameEvent>, UserError> {
        if self.phase != Phase::Showdown {
            return Err(UserError::NotAtShowdown);
        }
        let mut events = Vec::new();

        let next_dealer = self
            .next_idx(self.dealer_idx, |p| p.connected && p.chips > 0)
            .map(|idx| self.players[idx].id);

        let mut idx = 0;
        while idx < self.players.len() {
            let player = &self.players[idx];
            if player.chips == 0 || !player.connected {
                let player = self.remove_player_at(idx);
                if player.chips == 0 {
                    info!("{} busted out", player.name);
                    events.push(GameEvent::PlayerBusted(player.name));
                } else {
                    events.push(GameEvent::PlayerLeft(player.name));
                }
            } else {
                idx += 1;
            }
        }
        self.dealer_idx = next_dealer
            .and_then(|id| self.find_idx(id))
            .unwrap_or(0);

        for player in &mut self.players {
            player.reset();
        }
        self.board.clear();
        self.current_bet = 0;
        self.turn = None;
        debug!("hand #{} cleaned up", self.hand_number);
        events.push(GameEvent::HandEnded {
            hand_number: self.hand_number,
        });

        if self.players.len() >= 2 {
            self.phase = Phase::Waiting;
        } else {
            self.finish(&mut events);
        }
        Ok(events)
    }

    // === Views ===

    /// Snapshot for `viewer`. Hole cards are hidden except the viewer's own
    /// and those shown at a contested showdown.
    #[must_use]
    pub fn view(&self, viewer: Option<PlayerId>) -> TableView {
        let contenders = self.players.iter().filter(|p| p.is_contender()).count();
        let revealed = self.phase == Phase::Showdown && contenders >= 2;
        let players = self
            .players
            .iter()
            .map(|p| {
                let visible = viewer == Some(p.id) || (revealed && p.is_contender());
                PlayerView {
                    id: p.id,
                    name: p.name.clone(),
                    chips: p.chips,
                    bet: p.bet,
                    seat_idx: p.seat_idx,
                    folded: p.folded,
                    all_in: p.all_in,
                    connected: p.connected,
                    is_dealer: p.is_dealer,
                    in_hand: !p.cards.is_empty(),
                    cards: if visible { p.cards.clone() } else { Vec::new() },
                }
            })
            .collect();

        TableView {
            phase: self.phase,
            hand_number: self.hand_number,
            blinds: self.blinds,
            board: self.board.clone(),
            pot: self.pot.get_size(),
            current_bet: self.current_bet,
            current_turn: self.current_turn(),
            turn_generation: self.turn_generation,
            dealer: self.dealer(),
            players,
            winners: self.winners.clone(),
        }
    }
}

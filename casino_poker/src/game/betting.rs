//! Betting rounds: action validation, turn order, street advancement and
//! pot settlement.

use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

use super::entities::{Action, ActionChoice, Chips, HandRanking, Phase, PlayerId, Winner};
use super::functional::{argmax, evaluate_best_hand};
use super::state_machine::{GameEvent, PokerTable, UserError};

const UNCONTESTED: &str = "Uncontested";

impl PokerTable {
    /// Apply `action` for the player holding the turn.
    ///
    /// Illegal actions are rejected with the state untouched. Accepted
    /// actions move the turn, close the betting round, deal the next street
    /// or settle the hand as needed.
    pub fn apply_action(
        &mut self,
        player_id: PlayerId,
        action: Action,
    ) -> Result<Vec<GameEvent>, UserError> {
        if !self.phase.is_betting() {
            return Err(UserError::NoBettingRound);
        }
        let idx = self
            .find_idx(player_id)
            .ok_or(UserError::UserDoesNotExist)?;
        if self.turn != Some(idx) {
            return Err(UserError::OutOfTurnAction);
        }

        let mut events = Vec::new();
        self.commit_action(idx, action, &mut events)?;
        self.after_action(idx, &mut events)?;
        Ok(events)
    }

    /// Fold the player holding the turn if `generation` still identifies
    /// their turn. Anything else is a stale timer and does nothing.
    pub fn handle_turn_timeout(&mut self, generation: u64) -> Result<Vec<GameEvent>, UserError> {
        let Some(idx) = self.turn else {
            return Ok(Vec::new());
        };
        if !self.phase.is_betting() || generation != self.turn_generation {
            debug!("ignoring stale turn timeout {generation}");
            return Ok(Vec::new());
        }

        let name = self.players[idx].name.clone();
        warn!("{name} timed out in hand #{}", self.hand_number);
        let mut events = vec![GameEvent::TurnTimedOut(name)];
        self.commit_action(idx, Action::Fold, &mut events)?;
        self.after_action(idx, &mut events)?;
        Ok(events)
    }

    /// Legal choices for `player_id`. Empty unless it is their turn.
    #[must_use]
    pub fn legal_actions(&self, player_id: PlayerId) -> Vec<ActionChoice> {
        let Some(idx) = self.find_idx(player_id) else {
            return Vec::new();
        };
        if !self.phase.is_betting() || self.turn != Some(idx) {
            return Vec::new();
        }
        let player = &self.players[idx];
        let to_call = self.current_bet.saturating_sub(player.bet);

        let mut choices = vec![ActionChoice::Fold];
        if to_call == 0 {
            choices.push(ActionChoice::Check);
        } else {
            choices.push(ActionChoice::Call(to_call.min(player.chips)));
        }
        let min = self.blinds.big;
        if player.chips >= to_call.saturating_add(min) {
            choices.push(ActionChoice::Raise {
                min,
                max: player.chips - to_call,
            });
        }
        if player.chips > 0 {
            choices.push(ActionChoice::AllIn(player.chips));
        }
        choices
    }

    pub(super) fn post_blind(&mut self, idx: usize, amount: Chips, events: &mut Vec<GameEvent>) {
        let player = &mut self.players[idx];
        let paid = amount.min(player.chips);
        player.chips -= paid;
        player.bet += paid;
        if player.chips == 0 {
            player.all_in = true;
        }
        self.pot.bet(player.id, paid);
        events.push(GameEvent::BlindPosted {
            player: player.name.clone(),
            amount: paid,
        });
    }

    /// Validate and then apply one action. Nothing changes on error.
    pub(super) fn commit_action(
        &mut self,
        idx: usize,
        action: Action,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), UserError> {
        let player = &self.players[idx];
        let to_call = self.current_bet.saturating_sub(player.bet);
        let amount = match action {
            Action::Fold => 0,
            Action::Check if to_call > 0 => return Err(UserError::CannotCheck { to_call }),
            Action::Check => 0,
            Action::Call if to_call == 0 => return Err(UserError::NothingToCall),
            Action::Call => to_call.min(player.chips),
            Action::Raise(raise) => {
                let min = self.blinds.big;
                if raise < min {
                    return Err(UserError::RaiseTooSmall { min });
                }
                let needed = to_call.saturating_add(raise);
                if needed > player.chips {
                    return Err(UserError::InsufficientChips {
                        needed,
                        available: player.chips,
                    });
                }
                needed
            }
            Action::AllIn if player.chips == 0 => return Err(UserError::NoChips),
            Action::AllIn => player.chips,
        };

        let player = &mut self.players[idx];
        player.chips -= amount;
        player.bet += amount;
        player.has_acted = true;
        if action == Action::Fold {
            player.folded = true;
        }
        if amount > 0 && player.chips == 0 {
            player.all_in = true;
        }
        let (id, bet, name) = (player.id, player.bet, player.name.clone());
        self.pot.bet(id, amount);

        if bet > self.current_bet {
            self.current_bet = bet;
            for (other_idx, other) in self.players.iter_mut().enumerate() {
                if other_idx != idx && other.can_act() {
                    other.has_acted = false;
                }
            }
        }
        debug!("{name} {action} for ${amount} in hand #{}", self.hand_number);
        events.push(GameEvent::ActionTaken {
            player: name,
            action,
            amount,
        });
        Ok(())
    }

    /// Move play along after the player at `idx` acted.
    pub(super) fn after_action(
        &mut self,
        idx: usize,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), UserError> {
        if self.contender_count() <= 1 {
            self.award_uncontested(events);
            return Ok(());
        }
        if self.is_round_complete() {
            return self.advance_street(events);
        }
        match self.next_idx(idx, |p| p.can_act()) {
            Some(next) => {
                self.set_turn(next, events);
                Ok(())
            }
            None => self.advance_street(events),
        }
    }

    /// A fold by someone not holding the turn (a disconnect).
    pub(super) fn after_passive_fold(&mut self, events: &mut Vec<GameEvent>) -> Result<(), UserError> {
        if self.contender_count() <= 1 {
            self.award_uncontested(events);
            Ok(())
        } else if self.is_round_complete() {
            self.advance_street(events)
        } else {
            Ok(())
        }
    }

    /// Start a betting round with the first able player after `after`.
    pub(super) fn open_action(
        &mut self,
        after: usize,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), UserError> {
        if self.is_round_complete() {
            return self.advance_street(events);
        }
        match self.next_idx(after, |p| p.can_act()) {
            Some(idx) => {
                self.set_turn(idx, events);
                Ok(())
            }
            None => self.advance_street(events),
        }
    }

    fn set_turn(&mut self, idx: usize, events: &mut Vec<GameEvent>) {
        self.turn = Some(idx);
        self.turn_generation += 1;
        events.push(GameEvent::TurnChanged(self.players[idx].name.clone()));
    }

    fn contender_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_contender()).count()
    }

    /// The round is over once every player who can still bet has acted
    /// and matched the table bet. A lone player who already covers the bet
    /// has nobody left to bet against.
    fn is_round_complete(&self) -> bool {
        let able: Vec<_> = self.players.iter().filter(|p| p.can_act()).collect();
        match able.as_slice() {
            [] => true,
            [only] if only.bet >= self.current_bet => true,
            _ => able
                .iter()
                .all(|p| p.has_acted && p.bet == self.current_bet),
        }
    }

    /// Deal the next street. When fewer than two players can still bet the
    /// remaining streets are dealt straight through to showdown.
    fn advance_street(&mut self, events: &mut Vec<GameEvent>) -> Result<(), UserError> {
        loop {
            for player in &mut self.players {
                player.bet = 0;
                player.has_acted = false;
            }
            self.current_bet = 0;
            self.turn = None;

            let (next, count) = match self.phase {
                Phase::PreFlop => (Phase::Flop, 3),
                Phase::Flop => (Phase::Turn, 1),
                Phase::Turn => (Phase::River, 1),
                _ => return self.showdown(events),
            };
            let mut cards = Vec::with_capacity(count);
            for _ in 0..count {
                cards.push(self.deck.deal_card()?);
            }
            self.board.extend_from_slice(&cards);
            self.phase = next;
            debug!("{next}: board is now {:?}", self.board);
            events.push(GameEvent::StreetDealt { phase: next, cards });

            if self.players.iter().filter(|p| p.can_act()).count() >= 2 {
                if let Some(idx) = self.next_idx(self.dealer_idx, |p| p.can_act()) {
                    self.set_turn(idx, events);
                }
                return Ok(());
            }
        }
    }

    fn showdown(&mut self, events: &mut Vec<GameEvent>) -> Result<(), UserError> {
        let mut rankings = HashMap::new();
        for player in self.players.iter().filter(|p| p.is_contender()) {
            let cards: Vec<_> = player.cards.iter().chain(&self.board).copied().collect();
            let ranking = evaluate_best_hand(&cards)?;
            events.push(GameEvent::HandRevealed {
                player: player.name.clone(),
                hand: ranking.description.clone(),
            });
            rankings.insert(player.id, ranking);
        }
        self.settle(&rankings, events);
        Ok(())
    }

    fn award_uncontested(&mut self, events: &mut Vec<GameEvent>) {
        self.settle(&HashMap::new(), events);
    }

    /// Player ids in seat order starting left of the dealer. Odd chips go
    /// out in this order.
    fn seat_order_from_dealer(&self) -> Vec<PlayerId> {
        let n = self.players.len();
        (1..=n)
            .map(|offset| self.players[(self.dealer_idx + offset) % n].id)
            .collect()
    }

    /// Split the pot into side pots, pay each to its best eligible hands
    /// and return uncalled chips.
    fn settle(&mut self, rankings: &HashMap<PlayerId, HandRanking>, events: &mut Vec<GameEvent>) {
        self.phase = Phase::Showdown;
        self.turn = None;
        for player in &mut self.players {
            player.bet = 0;
        }

        let contenders: HashSet<PlayerId> = self
            .players
            .iter()
            .filter(|p| p.is_contender())
            .map(|p| p.id)
            .collect();
        let settlement = self.pot.settle(&contenders);
        let order = self.seat_order_from_dealer();
        let seat_rank = |id: &PlayerId| order.iter().position(|o| o == id).unwrap_or(usize::MAX);

        let mut won: HashMap<PlayerId, Chips> = HashMap::new();
        for side_pot in &settlement.pots {
            let mut pot_winners: Vec<PlayerId> = if side_pot.eligible.len() == 1 {
                side_pot.eligible.clone()
            } else {
                let ranked: Vec<(PlayerId, HandRanking)> = side_pot
                    .eligible
                    .iter()
                    .filter_map(|id| rankings.get(id).map(|r| (*id, r.clone())))
                    .collect();
                let hands: Vec<HandRanking> = ranked.iter().map(|(_, r)| r.clone()).collect();
                argmax(&hands).into_iter().map(|i| ranked[i].0).collect()
            };
            if pot_winners.is_empty() {
                pot_winners = side_pot.eligible.clone();
            }
            if pot_winners.is_empty() {
                warn!("nobody is eligible for a ${} pot", side_pot.amount);
                continue;
            }
            pot_winners.sort_by_key(seat_rank);

            let count = pot_winners.len() as Chips;
            let share = side_pot.amount / count;
            let mut odd_chips = side_pot.amount % count;
            for id in pot_winners {
                let mut amount = share;
                if odd_chips > 0 {
                    amount += 1;
                    odd_chips -= 1;
                }
                *won.entry(id).or_default() += amount;
            }
        }

        let mut winners = Vec::with_capacity(won.len());
        for id in &order {
            let Some(amount) = won.get(id).copied() else {
                continue;
            };
            let Some(player) = self.players.iter_mut().find(|p| p.id == *id) else {
                continue;
            };
            player.chips += amount;
            let hand = rankings
                .get(id)
                .map_or_else(|| UNCONTESTED.to_string(), |r| r.description.clone());
            info!("{} won ${amount} with {hand}", player.name);
            events.push(GameEvent::PotAwarded {
                player: player.name.clone(),
                amount,
                hand: hand.clone(),
            });
            winners.push(Winner {
                player_id: *id,
                name: player.name.clone(),
                hand,
                amount,
            });
        }

        for (id, amount) in &settlement.refunds {
            if let Some(player) = self.players.iter_mut().find(|p| p.id == *id) {
                player.chips += amount;
                events.push(GameEvent::UncalledBetReturned {
                    player: player.name.clone(),
                    amount: *amount,
                });
            }
        }

        self.pot.clear();
        self.winners = winners;
    }
}

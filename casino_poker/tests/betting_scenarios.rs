//! End-to-end hands driven through the public `PokerTable` API.
//!
//! Decks are stacked so every scenario is deterministic: hole cards are
//! dealt round-robin starting left of the dealer, then the board.

use casino_poker::{
    GameEvent, GameSettings, PokerTable, UserError,
    entities::{Action, ActionChoice, Card, Chips, Phase, PlayerId, Username},
};
use proptest::prelude::*;

fn cards(s: &str) -> Vec<Card> {
    s.split_whitespace().map(|c| c.parse().unwrap()).collect()
}

fn table_with(n: PlayerId, seed: u64) -> PokerTable {
    let mut table = PokerTable::from(GameSettings::new(10, 20, 1000, 8, Some(seed)));
    for id in 1..=n {
        table.join(id, Username::new(&format!("p{id}"))).unwrap();
    }
    table
}

fn chips(table: &PokerTable, id: PlayerId) -> Chips {
    table.player(id).unwrap().chips
}

// === Heads-up ===

#[test]
fn test_heads_up_check_down() {
    let mut table = table_with(2, 1);
    // p1 has the button and the big blind, p2 posts the small blind.
    table
        .stack_next_deck(&cards("As 2c Ah 7d Kd 9s 4h 3c Jd"))
        .unwrap();
    table.start_new_hand().unwrap();

    assert_eq!(table.phase(), Phase::PreFlop);
    assert_eq!(table.pot_size(), 30);
    assert_eq!(table.current_bet(), 20);
    assert_eq!(table.player(2).unwrap().bet, 10);
    assert_eq!(table.player(1).unwrap().bet, 20);
    assert_eq!(table.current_turn(), Some(2));

    table.apply_action(2, Action::Call).unwrap();
    assert_eq!(table.pot_size(), 40);
    // The big blind still has the option.
    table.apply_action(1, Action::Check).unwrap();
    assert_eq!(table.phase(), Phase::Flop);
    assert_eq!(table.board(), cards("Kd 9s 4h").as_slice());

    for phase in [Phase::Turn, Phase::River, Phase::Showdown] {
        table.apply_action(2, Action::Check).unwrap();
        table.apply_action(1, Action::Check).unwrap();
        assert_eq!(table.phase(), phase);
    }

    assert_eq!(table.board().len(), 5);
    let winners = table.winners();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].player_id, 2);
    assert_eq!(winners[0].amount, 40);
    assert!(winners[0].hand.starts_with("Pair"), "{}", winners[0].hand);
    assert_eq!(chips(&table, 2), 1020);
    assert_eq!(chips(&table, 1), 980);
    assert_eq!(table.pot_size(), 0);
}

#[test]
fn test_board_plays_splits_pot() {
    let mut table = table_with(2, 1);
    table
        .stack_next_deck(&cards("2c 3d 2h 3s As Ks Qs Js 10s"))
        .unwrap();
    table.start_new_hand().unwrap();
    table.apply_action(2, Action::Call).unwrap();
    table.apply_action(1, Action::Check).unwrap();
    for _ in 0..3 {
        table.apply_action(2, Action::Check).unwrap();
        table.apply_action(1, Action::Check).unwrap();
    }

    assert_eq!(table.phase(), Phase::Showdown);
    assert_eq!(table.winners().len(), 2);
    assert!(table.winners().iter().all(|w| w.amount == 20));
    assert_eq!(chips(&table, 1), 1000);
    assert_eq!(chips(&table, 2), 1000);
}

#[test]
fn test_showdown_reveals_contenders_only() {
    let mut table = table_with(3, 1);
    table.start_new_hand().unwrap();
    table.apply_action(1, Action::Fold).unwrap();
    table.apply_action(2, Action::Call).unwrap();
    table.apply_action(3, Action::Check).unwrap();
    for _ in 0..3 {
        table.apply_action(2, Action::Check).unwrap();
        table.apply_action(3, Action::Check).unwrap();
    }
    assert_eq!(table.phase(), Phase::Showdown);

    let view = table.view(None);
    assert_eq!(view.player(2).unwrap().cards.len(), 2);
    assert_eq!(view.player(3).unwrap().cards.len(), 2);
    assert!(view.player(1).unwrap().cards.is_empty());
}

// === Rejections ===

#[test]
fn test_check_facing_bet_leaves_state_unchanged() {
    let mut table = table_with(3, 4);
    table.start_new_hand().unwrap();
    let before = table.view(Some(1)).to_json().unwrap();

    assert_eq!(
        table.apply_action(1, Action::Check),
        Err(UserError::CannotCheck { to_call: 20 })
    );
    assert_eq!(table.view(Some(1)).to_json().unwrap(), before);
}

#[test]
fn test_folded_player_cannot_act_again() {
    let mut table = table_with(3, 4);
    table.start_new_hand().unwrap();
    table.apply_action(1, Action::Fold).unwrap();
    assert_eq!(
        table.apply_action(1, Action::Call),
        Err(UserError::OutOfTurnAction)
    );
}

#[test]
fn test_raise_requires_everyone_to_act_again() {
    let mut table = table_with(4, 2);
    table.start_new_hand().unwrap();
    // p4 is first to act after the big blind.
    table.apply_action(4, Action::Call).unwrap();
    table.apply_action(1, Action::Call).unwrap();
    table.apply_action(2, Action::Raise(60)).unwrap();
    assert_eq!(table.current_bet(), 80);

    for id in [3, 4, 1] {
        assert!(!table.player(id).unwrap().has_acted);
    }
    table.apply_action(3, Action::Call).unwrap();
    table.apply_action(4, Action::Fold).unwrap();
    assert_eq!(table.phase(), Phase::PreFlop);
    table.apply_action(1, Action::Call).unwrap();
    assert_eq!(table.phase(), Phase::Flop);
    assert_eq!(table.pot_size(), 80 * 3 + 20);
}

// === Timeouts and disconnects ===

#[test]
fn test_timeout_folds_and_stale_timer_is_ignored() {
    let mut table = table_with(3, 6);
    table.start_new_hand().unwrap();
    let generation = table.turn_generation();

    let events = table.handle_turn_timeout(generation).unwrap();
    assert!(events.contains(&GameEvent::TurnTimedOut(Username::new("p1"))));
    assert!(table.player(1).unwrap().folded);
    assert_eq!(table.current_turn(), Some(2));

    // The same timer firing again must not fold p2.
    assert!(table.handle_turn_timeout(generation).unwrap().is_empty());
    assert!(!table.player(2).unwrap().folded);
}

#[test]
fn test_disconnect_on_turn_folds_and_advances() {
    let mut table = table_with(4, 8);
    table.start_new_hand().unwrap();
    assert_eq!(table.current_turn(), Some(4));

    table.leave(4).unwrap();
    let p4 = table.player(4).unwrap();
    assert!(p4.folded);
    assert!(!p4.connected);
    assert_eq!(table.current_turn(), Some(1));
    assert_eq!(table.phase(), Phase::PreFlop);
}

#[test]
fn test_disconnect_out_of_turn_is_skipped() {
    let mut table = table_with(4, 8);
    table.start_new_hand().unwrap();
    table.leave(2).unwrap();
    table.apply_action(4, Action::Call).unwrap();
    table.apply_action(1, Action::Call).unwrap();
    // p2 is skipped; the big blind gets the option.
    assert_eq!(table.current_turn(), Some(3));
}

#[test]
fn test_last_opponent_leaving_finishes_table() {
    let mut table = table_with(2, 8);
    table.start_new_hand().unwrap();
    let events = table.leave(1).unwrap();

    assert_eq!(table.phase(), Phase::Finished);
    assert!(events.contains(&GameEvent::GameFinished));
    assert_eq!(chips(&table, 2), 1020);
    assert_eq!(table.total_chips(), 2000);
}

#[test]
fn test_leaving_before_start_removes_player() {
    let mut table = table_with(3, 8);
    table.leave(3).unwrap();
    assert_eq!(table.num_players(), 2);
    assert_eq!(table.phase(), Phase::Waiting);
    table.start_new_hand().unwrap();
}

// === Multi-hand ===

#[test]
fn test_button_rotates_over_hands() {
    let mut table = table_with(3, 10);
    let mut dealers = Vec::new();
    for _ in 0..3 {
        table.start_new_hand().unwrap();
        dealers.push(table.dealer().unwrap());
        while table.phase().is_betting() {
            let turn = table.current_turn().unwrap();
            table.apply_action(turn, Action::Fold).unwrap();
        }
        table.end_hand().unwrap();
    }
    assert_eq!(dealers, vec![1, 2, 3]);
}

#[test]
fn test_busted_player_is_removed_and_table_finishes() {
    let mut table = table_with(2, 12);
    // p2 holds aces against p1's seven-deuce on a blank board.
    table
        .stack_next_deck(&cards("As 7d Ah 2c Kd 9s 4h 3c Jd"))
        .unwrap();
    table.start_new_hand().unwrap();
    table.apply_action(2, Action::AllIn).unwrap();
    table.apply_action(1, Action::Call).unwrap();

    assert_eq!(table.phase(), Phase::Showdown);
    assert_eq!(chips(&table, 2), 2000);
    let events = table.end_hand().unwrap();
    assert!(events.contains(&GameEvent::PlayerBusted(Username::new("p1"))));
    assert!(events.contains(&GameEvent::GameFinished));
    assert_eq!(table.phase(), Phase::Finished);
    assert_eq!(
        table.start_new_hand(),
        Err(UserError::GameFinished)
    );
}

// === Chip conservation ===

fn choose(choices: &[ActionChoice], pick: usize) -> Action {
    match choices[pick % choices.len()] {
        ActionChoice::Fold => Action::Fold,
        ActionChoice::Check => Action::Check,
        ActionChoice::Call(_) => Action::Call,
        ActionChoice::Raise { min, max } => Action::Raise(min + (max - min) / 3),
        ActionChoice::AllIn(_) => Action::AllIn,
    }
}

proptest! {
    #[test]
    fn test_chips_are_conserved(
        seed in any::<u64>(),
        players in 2i64..=6,
        picks in prop::collection::vec(any::<usize>(), 1..200),
    ) {
        let mut table = table_with(players, seed);
        let total = table.total_chips();
        let mut picks = picks.into_iter().cycle();

        for _ in 0..3 {
            if table.phase() != Phase::Waiting {
                break;
            }
            table.start_new_hand().unwrap();
            let stacks_at_start: Chips = table
                .players()
                .iter()
                .map(|p| p.chips)
                .sum::<Chips>()
                + table.pot_size();

            while table.phase().is_betting() {
                let turn = table.current_turn().unwrap();
                let choices = table.legal_actions(turn);
                let action = choose(&choices, picks.next().unwrap());
                table.apply_action(turn, action).unwrap();

                prop_assert_eq!(table.total_chips(), total);
                let in_stacks: Chips = table.players().iter().map(|p| p.chips).sum();
                prop_assert_eq!(table.pot_size(), stacks_at_start - in_stacks);
                for player in table.players() {
                    prop_assert!(player.bet <= table.current_bet());
                }
            }

            prop_assert_eq!(table.phase(), Phase::Showdown);
            prop_assert_eq!(table.pot_size(), 0);
            prop_assert_eq!(table.total_chips(), total);
            table.end_hand().unwrap();
        }
    }
}

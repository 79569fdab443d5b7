//! Table actors and the registry driven through their async API, with the
//! tokio clock paused so timers fire deterministically.

use casino_poker::{
    GameEvent,
    entities::{Action, Phase, Username},
    table::{ManagerError, TableConfig, TableManager, TableResponse},
};
use tokio::{
    sync::mpsc,
    time::{Duration, sleep},
};

fn config() -> TableConfig {
    TableConfig {
        name: "Test Table".to_string(),
        auto_start: false,
        turn_timeout_ms: Some(1_000),
        seed: Some(42),
        ..TableConfig::default()
    }
}

async fn seated_table(manager: &TableManager, players: i64) -> i64 {
    let table_id = manager.create_table(config()).await.unwrap();
    for id in 1..=players {
        let response = manager
            .join_table(table_id, id, format!("p{id}"))
            .await
            .unwrap();
        assert!(response.is_success());
    }
    table_id
}

#[tokio::test(start_paused = true)]
async fn test_turn_timeout_folds_idle_player() {
    let manager = TableManager::new(config());
    let table_id = seated_table(&manager, 2).await;
    assert!(manager.start_hand(table_id).await.unwrap().is_success());

    let view = manager.get_view(table_id, None).await.unwrap();
    assert_eq!(view.current_turn, Some(2));

    sleep(Duration::from_millis(1_100)).await;
    let view = manager.get_view(table_id, None).await.unwrap();
    assert_eq!(view.phase, Phase::Showdown);
    assert!(view.player(2).unwrap().folded);
    assert_eq!(view.winners[0].player_id, 1);
}

#[tokio::test(start_paused = true)]
async fn test_action_rearms_turn_timer() {
    let manager = TableManager::new(config());
    let table_id = seated_table(&manager, 3).await;
    manager.start_hand(table_id).await.unwrap();

    sleep(Duration::from_millis(600)).await;
    assert!(manager.take_action(1, Action::Call).await.unwrap().is_success());

    // The first timer would have fired at 1000ms; the re-armed one fires at 1600ms.
    sleep(Duration::from_millis(600)).await;
    let view = manager.get_view(table_id, None).await.unwrap();
    assert_eq!(view.current_turn, Some(2));
    assert!(!view.player(2).unwrap().folded);

    sleep(Duration::from_millis(500)).await;
    let view = manager.get_view(table_id, None).await.unwrap();
    assert!(view.player(2).unwrap().folded);
    assert_eq!(view.current_turn, Some(3));
}

#[tokio::test(start_paused = true)]
async fn test_showdown_delay_returns_to_waiting() {
    let manager = TableManager::new(config());
    let table_id = seated_table(&manager, 2).await;
    manager.start_hand(table_id).await.unwrap();
    manager.take_action(2, Action::Fold).await.unwrap();

    let state = manager.get_table_state(table_id).await.unwrap();
    assert_eq!(state.phase, Phase::Showdown);

    sleep(Duration::from_millis(5_100)).await;
    let state = manager.get_table_state(table_id).await.unwrap();
    assert_eq!(state.phase, Phase::Waiting);
    assert_eq!(state.hand_number, 1);
}

#[tokio::test(start_paused = true)]
async fn test_auto_start_notifies_subscribers() {
    let manager = TableManager::new(config());
    let table_id = manager
        .create_table(TableConfig {
            auto_start: true,
            ..config()
        })
        .await
        .unwrap();
    let (tx, mut rx) = mpsc::channel(64);
    manager.subscribe(table_id, 1, tx).await.unwrap();
    manager
        .join_table(table_id, 1, "p1".to_string())
        .await
        .unwrap();
    manager
        .join_table(table_id, 2, "p2".to_string())
        .await
        .unwrap();

    sleep(Duration::from_millis(3_100)).await;

    let mut saw_start = false;
    let mut own_cards = 0;
    while let Ok(notification) = rx.try_recv() {
        if notification
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::HandStarted { hand_number: 1, .. }))
        {
            saw_start = true;
            own_cards = notification.view.player(1).unwrap().cards.len();
            assert!(notification.view.player(2).unwrap().cards.is_empty());
        }
    }
    assert!(saw_start);
    assert_eq!(own_cards, 2);
}

#[tokio::test]
async fn test_rejected_action_reaches_only_the_caller() {
    let manager = TableManager::new(config());
    let table_id = seated_table(&manager, 3).await;
    manager.start_hand(table_id).await.unwrap();

    let response = manager.take_action(2, Action::Call).await.unwrap();
    assert!(!response.is_success());
    assert_eq!(response.error_message(), Some("not your turn".to_string()));

    let response = manager.take_action(1, Action::Check).await.unwrap();
    assert_eq!(
        response.error_message(),
        Some("can't check with $20 to call".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_finishes_table_and_prunes() {
    let manager = TableManager::new(config());
    let table_id = seated_table(&manager, 2).await;
    manager.start_hand(table_id).await.unwrap();

    let response = manager.disconnect(1).await.unwrap();
    assert!(response.events().contains(&GameEvent::GameFinished));
    assert_eq!(manager.table_for_player(1).await, None);

    let state = manager.get_table_state(table_id).await.unwrap();
    assert_eq!(state.phase, Phase::Finished);
    assert!(!state.is_active);

    sleep(Duration::from_millis(10_100)).await;
    assert_eq!(manager.prune_closed().await, 1);
    assert_eq!(manager.active_table_count().await, 0);
    assert_eq!(
        manager.take_action(2, Action::Fold).await.unwrap_err(),
        ManagerError::PlayerNotSeated(2)
    );
}

#[tokio::test]
async fn test_tables_are_independent() {
    let manager = TableManager::new(config());
    let first = seated_table(&manager, 2).await;
    let second = manager.create_table(config()).await.unwrap();
    manager
        .join_table(second, 3, "p3".to_string())
        .await
        .unwrap();
    manager
        .join_table(second, 4, "p4".to_string())
        .await
        .unwrap();

    manager.start_hand(first).await.unwrap();
    manager.take_action(2, Action::Fold).await.unwrap();

    let first_state = manager.get_table_state(first).await.unwrap();
    let second_state = manager.get_table_state(second).await.unwrap();
    assert_eq!(first_state.phase, Phase::Showdown);
    assert_eq!(second_state.phase, Phase::Waiting);
    assert_ne!(first_state.code, second_state.code);
}

#[tokio::test]
async fn test_join_by_room_code() {
    let manager = TableManager::new(config());
    let table_id = manager.create_table(config()).await.unwrap();
    let code = manager.get_table_state(table_id).await.unwrap().code;

    let (joined, response) = manager
        .join_or_create(7, "lucky".to_string(), Some(&code.to_lowercase()))
        .await
        .unwrap();
    assert_eq!(joined, table_id);
    assert_eq!(
        response,
        TableResponse::Applied(vec![GameEvent::PlayerJoined(Username::new("lucky"))])
    );
}

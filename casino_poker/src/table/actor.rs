//! Table actor implementation with async message handling.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Duration, sleep},
};

use super::{
    TableId,
    config::TableConfig,
    messages::{TableMessage, TableNotification, TableResponse, TableStateResponse},
};
use crate::game::{
    GameEvent, GameSettings, PokerTable, UserError,
    entities::{Action, ActionChoice, Phase, PlayerId, Username},
};

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: TableId,
    code: String,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, table_id: TableId, code: String) -> Self {
        Self {
            sender,
            table_id,
            code,
        }
    }

    /// Get table ID
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Room code players join with
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Whether the actor behind this handle has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Table is closed".to_string())
    }
}

/// What the single between-hands timer is armed for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum HandTimer {
    Deal { last_hand: u32 },
    Showdown { hand_number: u32 },
    Close,
}

/// Table actor managing a single poker table
pub struct TableActor {
    /// Table ID
    id: TableId,

    /// Room code
    code: String,

    /// Table configuration
    config: TableConfig,

    /// Game state machine
    table: PokerTable,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Timers post back into the inbox through this without keeping it open
    timer_sender: mpsc::WeakSender<TableMessage>,

    /// Pending turn timer and the turn generation it guards
    turn_timer: Option<(u64, JoinHandle<()>)>,

    /// Pending deal, showdown or close timer
    hand_timer: Option<(HandTimer, JoinHandle<()>)>,

    /// Is table closed
    is_closed: bool,

    created_at: DateTime<Utc>,

    /// Subscribers for state change notifications
    subscribers: HashMap<i64, mpsc::Sender<TableNotification>>,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Arguments
    ///
    /// * `id` - Table ID
    /// * `code` - Room code
    /// * `config` - Table configuration, assumed validated
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(id: TableId, code: String, config: TableConfig) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let table = PokerTable::from(GameSettings::from(&config));

        let actor = Self {
            id,
            code: code.clone(),
            config,
            table,
            inbox,
            timer_sender: sender.downgrade(),
            turn_timer: None,
            hand_timer: None,
            is_closed: false,
            created_at: Utc::now(),
            subscribers: HashMap::new(),
        };

        let handle = TableHandle::new(sender, id, code);

        (actor, handle)
    }

    /// Run the table actor event loop until closed or every handle is gone
    pub async fn run(mut self) {
        log::info!(
            "Table {} '{}' ({}) starting",
            self.id,
            self.config.name,
            self.code
        );

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
            if self.is_closed {
                break;
            }
            self.sync_timers();
        }

        self.cancel_timers();
        log::info!("Table {} '{}' closed", self.id, self.config.name);
    }

    /// Handle a table message
    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::JoinTable {
                player_id,
                username,
                response,
            } => {
                let result = self.handle_join(player_id, &username);
                let _ = response.send(result);
            }

            TableMessage::LeaveTable {
                player_id,
                response,
            } => {
                let result = self.handle_leave(player_id);
                let _ = response.send(result);
            }

            TableMessage::Disconnect {
                player_id,
                response,
            } => {
                log::warn!("Player {} disconnected from table {}", player_id, self.id);
                let result = self.handle_leave(player_id);
                let _ = response.send(result);
            }

            TableMessage::TakeAction {
                player_id,
                action,
                response,
            } => {
                let result = self.handle_action(player_id, action);
                let _ = response.send(result);
            }

            TableMessage::StartHand { response } => {
                let result = self.apply(PokerTable::start_new_hand);
                let _ = response.send(result);
            }

            TableMessage::GetState { response } => {
                let _ = response.send(self.get_state());
            }

            TableMessage::GetView { viewer, response } => {
                let _ = response.send(self.table.view(viewer));
            }

            TableMessage::GetLegalActions {
                player_id,
                response,
            } => {
                let _ = response.send(self.legal_actions(player_id));
            }

            TableMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(TableResponse::Success);
            }

            TableMessage::Subscribe {
                subscriber_id,
                sender,
            } => {
                let snapshot = TableNotification {
                    table_id: self.id,
                    view: self.table.view(Some(subscriber_id)),
                    events: Vec::new(),
                };
                if sender.try_send(snapshot).is_ok() {
                    self.subscribers.insert(subscriber_id, sender);
                    log::debug!(
                        "Subscriber {} subscribed to table {} state changes",
                        subscriber_id,
                        self.id
                    );
                }
            }

            TableMessage::Unsubscribe { subscriber_id } => {
                self.subscribers.remove(&subscriber_id);
                log::debug!(
                    "Subscriber {} unsubscribed from table {} state changes",
                    subscriber_id,
                    self.id
                );
            }

            TableMessage::TurnTimeout { generation } => {
                self.turn_timer = None;
                let _ = self.apply(|table| table.handle_turn_timeout(generation));
            }

            TableMessage::DealTimer { last_hand } => {
                self.hand_timer = None;
                if self.table.phase() == Phase::Waiting && self.table.hand_number() == last_hand {
                    if let TableResponse::Rejected(e) = self.apply(PokerTable::start_new_hand) {
                        log::debug!("Table {}: could not deal: {}", self.id, e);
                    }
                }
            }

            TableMessage::ShowdownTimer { hand_number } => {
                self.hand_timer = None;
                if self.table.phase() == Phase::Showdown && self.table.hand_number() == hand_number
                {
                    let _ = self.apply(PokerTable::end_hand);
                }
            }

            TableMessage::CloseTimer => {
                self.hand_timer = None;
                if self.table.phase() == Phase::Finished {
                    log::info!("Table {} finished, shutting down", self.id);
                    self.is_closed = true;
                }
            }
        }
    }

    /// Run a state machine operation and broadcast whatever it produced
    fn apply<F>(&mut self, operation: F) -> TableResponse
    where
        F: FnOnce(&mut PokerTable) -> Result<Vec<GameEvent>, UserError>,
    {
        match operation(&mut self.table) {
            Ok(events) => {
                if !events.is_empty() {
                    for event in &events {
                        log::debug!("Table {}: {}", self.id, event);
                    }
                    self.notify_state_change(&events);
                }
                TableResponse::Applied(events)
            }
            Err(e) => e.into(),
        }
    }

    /// Broadcast the new state, as each subscriber may see it, to all
    /// subscribers
    fn notify_state_change(&mut self, events: &[GameEvent]) {
        let table = &self.table;
        let table_id = self.id;
        self.subscribers.retain(|subscriber_id, sender| {
            let notification = TableNotification {
                table_id,
                view: table.view(Some(*subscriber_id)),
                events: events.to_vec(),
            };
            match sender.try_send(notification) {
                Ok(_) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!(
                        "Subscriber {} channel full, dropping notification",
                        subscriber_id
                    );
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {} disconnected, removing", subscriber_id);
                    false
                }
            }
        });
    }

    /// Handle join table request
    fn handle_join(&mut self, player_id: PlayerId, username: &str) -> TableResponse {
        let name = Username::new(username);
        let response = self.apply(|table| table.join(player_id, name));
        if response.is_success() {
            log::info!(
                "Player {} ({}) joined table {} with {} chips",
                player_id,
                username,
                self.id,
                self.config.starting_chips
            );
        }
        response
    }

    /// Handle leave table request
    fn handle_leave(&mut self, player_id: PlayerId) -> TableResponse {
        let chips = self.table.player(player_id).map(|p| p.chips);
        let response = self.apply(|table| table.leave(player_id));
        if let Some(chips) = chips
            && response.is_success()
        {
            log::info!(
                "Player {} left table {} with {} chips",
                player_id,
                self.id,
                chips
            );
        }
        response
    }

    /// Handle player action
    fn handle_action(&mut self, player_id: PlayerId, action: Action) -> TableResponse {
        if self.table.player(player_id).is_none() {
            return TableResponse::NotAtTable;
        }
        let response = self.apply(|table| table.apply_action(player_id, action));
        if let TableResponse::Rejected(e) = &response {
            log::debug!(
                "Table {}: rejected {} from player {}: {}",
                self.id,
                action,
                player_id,
                e
            );
        }
        response
    }

    fn legal_actions(&self, player_id: PlayerId) -> Vec<ActionChoice> {
        self.table.legal_actions(player_id)
    }

    /// Get current table state
    fn get_state(&self) -> TableStateResponse {
        TableStateResponse {
            table_id: self.id,
            code: self.code.clone(),
            table_name: self.config.name.clone(),
            player_count: self.table.num_players(),
            max_players: self.config.max_players,
            small_blind: self.config.small_blind,
            big_blind: self.config.big_blind,
            pot_size: self.table.pot_size(),
            phase: self.table.phase(),
            hand_number: self.table.hand_number(),
            players: self
                .table
                .players()
                .iter()
                .map(|p| p.name.to_string())
                .collect(),
            speed: self.config.speed.to_string(),
            is_active: self.table.phase() != Phase::Finished,
            created_at: self.created_at,
        }
    }

    // === Timers ===

    /// Post `message` back into the inbox after `delay`
    fn schedule(&self, delay: Duration, message: TableMessage) -> JoinHandle<()> {
        let sender = self.timer_sender.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            if let Some(sender) = sender.upgrade() {
                let _ = sender.send(message).await;
            }
        })
    }

    /// Arm, re-arm or cancel timers to match the table's current state
    fn sync_timers(&mut self) {
        let wanted_turn = (self.table.phase().is_betting() && self.table.current_turn().is_some())
            .then(|| self.table.turn_generation());
        let armed_turn = self.turn_timer.as_ref().map(|(generation, _)| *generation);
        if wanted_turn != armed_turn {
            if let Some((_, handle)) = self.turn_timer.take() {
                handle.abort();
            }
            if let Some(generation) = wanted_turn {
                let handle = self.schedule(
                    self.config.turn_timeout(),
                    TableMessage::TurnTimeout { generation },
                );
                self.turn_timer = Some((generation, handle));
            }
        }

        let wanted_hand = self.wanted_hand_timer();
        let armed_hand = self.hand_timer.as_ref().map(|(timer, _)| *timer);
        if wanted_hand != armed_hand {
            if let Some((_, handle)) = self.hand_timer.take() {
                handle.abort();
            }
            if let Some(timer) = wanted_hand {
                let (delay, message) = match timer {
                    HandTimer::Deal { last_hand } => (
                        self.config.start_delay(),
                        TableMessage::DealTimer { last_hand },
                    ),
                    HandTimer::Showdown { hand_number } => (
                        self.config.showdown_delay(),
                        TableMessage::ShowdownTimer { hand_number },
                    ),
                    HandTimer::Close => (
                        self.config.finished_close_delay(),
                        TableMessage::CloseTimer,
                    ),
                };
                let handle = self.schedule(delay, message);
                self.hand_timer = Some((timer, handle));
            }
        }
    }

    fn wanted_hand_timer(&self) -> Option<HandTimer> {
        match self.table.phase() {
            Phase::Waiting if self.config.auto_start => {
                let ready = self
                    .table
                    .players()
                    .iter()
                    .filter(|p| p.connected && p.chips > 0)
                    .count();
                (ready >= 2).then_some(HandTimer::Deal {
                    last_hand: self.table.hand_number(),
                })
            }
            Phase::Showdown => Some(HandTimer::Showdown {
                hand_number: self.table.hand_number(),
            }),
            Phase::Finished => Some(HandTimer::Close),
            _ => None,
        }
    }

    fn cancel_timers(&mut self) {
        if let Some((_, handle)) = self.turn_timer.take() {
            handle.abort();
        }
        if let Some((_, handle)) = self.hand_timer.take() {
            handle.abort();
        }
    }
}

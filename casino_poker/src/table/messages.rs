//! Table actor message types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use super::TableId;
use crate::game::{
    GameEvent, UserError,
    entities::{Action, ActionChoice, Chips, Phase, PlayerId, TableView},
};

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Join table request
    JoinTable {
        player_id: PlayerId,
        username: String,
        response: oneshot::Sender<TableResponse>,
    },

    /// Leave table request
    LeaveTable {
        player_id: PlayerId,
        response: oneshot::Sender<TableResponse>,
    },

    /// Connection dropped; folds the player if a hand is running
    Disconnect {
        player_id: PlayerId,
        response: oneshot::Sender<TableResponse>,
    },

    /// Player action (fold, check, call, raise, all-in)
    TakeAction {
        player_id: PlayerId,
        action: Action,
        response: oneshot::Sender<TableResponse>,
    },

    /// Deal the next hand now instead of waiting for the start timer
    StartHand {
        response: oneshot::Sender<TableResponse>,
    },

    /// Get table summary
    GetState {
        response: oneshot::Sender<TableStateResponse>,
    },

    /// Get the table as seen by `viewer` (public view for `None`)
    GetView {
        viewer: Option<PlayerId>,
        response: oneshot::Sender<TableView>,
    },

    /// Get the choices open to a player, empty unless it is their turn
    GetLegalActions {
        player_id: PlayerId,
        response: oneshot::Sender<Vec<ActionChoice>>,
    },

    /// Close table
    Close {
        response: oneshot::Sender<TableResponse>,
    },

    /// Subscribe to state change notifications
    Subscribe {
        subscriber_id: i64,
        sender: mpsc::Sender<TableNotification>,
    },

    /// Unsubscribe from state change notifications
    Unsubscribe { subscriber_id: i64 },

    /// Internal: the turn timer for `generation` ran out
    TurnTimeout { generation: u64 },

    /// Internal: time to deal the hand after `last_hand`
    DealTimer { last_hand: u32 },

    /// Internal: the showdown of `hand_number` has been shown long enough
    ShowdownTimer { hand_number: u32 },

    /// Internal: a finished table has lingered long enough
    CloseTimer,
}

/// Notification sent to subscribers after every accepted change
#[derive(Debug, Clone, Serialize)]
pub struct TableNotification {
    pub table_id: TableId,
    /// The table as the subscriber is allowed to see it
    pub view: TableView,
    /// What happened since the previous notification
    pub events: Vec<GameEvent>,
}

/// Response from table operations
#[derive(Debug, Clone, PartialEq)]
pub enum TableResponse {
    /// Operation succeeded
    Success,

    /// Operation succeeded and produced these events
    Applied(Vec<GameEvent>),

    /// The game refused the request
    Rejected(UserError),

    /// Table is full
    TableFull,

    /// Player not at table
    NotAtTable,

    /// Operation failed
    Error(String),
}

impl From<UserError> for TableResponse {
    fn from(error: UserError) -> Self {
        match error {
            UserError::CapacityReached => TableResponse::TableFull,
            UserError::UserDoesNotExist => TableResponse::NotAtTable,
            other => TableResponse::Rejected(other),
        }
    }
}

/// Table state response
#[derive(Debug, Clone, Serialize)]
pub struct TableStateResponse {
    /// Table ID
    pub table_id: TableId,

    /// Room code players join with
    pub code: String,

    /// Table name
    pub table_name: String,

    /// Current player count
    pub player_count: usize,

    /// Maximum players
    pub max_players: usize,

    /// Small blind
    pub small_blind: Chips,

    /// Big blind
    pub big_blind: Chips,

    /// Current pot size
    pub pot_size: Chips,

    /// Current game phase
    pub phase: Phase,

    /// Hands dealt so far
    pub hand_number: u32,

    /// Player usernames at table
    pub players: Vec<String>,

    /// Table speed
    pub speed: String,

    /// False once the game is finished
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

impl TableResponse {
    /// Check if response is success
    pub fn is_success(&self) -> bool {
        matches!(self, TableResponse::Success | TableResponse::Applied(_))
    }

    /// Events carried by a successful response
    pub fn events(&self) -> &[GameEvent] {
        match self {
            TableResponse::Applied(events) => events,
            _ => &[],
        }
    }

    /// Get error message if response is error
    pub fn error_message(&self) -> Option<String> {
        match self {
            TableResponse::Rejected(error) => Some(error.to_string()),
            TableResponse::TableFull => Some("Table is full".to_string()),
            TableResponse::NotAtTable => Some("Not at table".to_string()),
            TableResponse::Error(msg) => Some(msg.clone()),
            _ => None,
        }
    }
}

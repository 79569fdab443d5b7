//! Table manager for spawning and managing multiple table actors.

use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::sync::{RwLock, mpsc, oneshot};
use uuid::Uuid;

use super::{
    TableId,
    actor::{TableActor, TableHandle},
    config::TableConfig,
    messages::{TableMessage, TableNotification, TableResponse, TableStateResponse},
};
use crate::game::{
    constants::ROOM_CODE_LENGTH,
    entities::{Action, ActionChoice, Chips, Phase, PlayerId, TableView},
};

/// Errors from routing requests to tables
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManagerError {
    #[error("invalid table config: {0}")]
    InvalidConfig(String),
    #[error("table {0} not found")]
    TableNotFound(TableId),
    #[error("no room with code {0}")]
    RoomNotFound(String),
    #[error("player {0} is not seated at any table")]
    PlayerNotSeated(PlayerId),
    #[error("player {player_id} is already seated at table {table_id}")]
    AlreadySeated { player_id: PlayerId, table_id: TableId },
    #[error("table is closed")]
    ChannelClosed,
    #[error("table dropped the request")]
    NoResponse,
}

/// Table metadata for discovery
#[derive(Debug, Clone)]
pub struct TableMetadata {
    pub id: TableId,
    pub code: String,
    pub name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub speed: String,
    pub phase: Phase,
    pub is_active: bool,
}

impl From<TableStateResponse> for TableMetadata {
    fn from(state: TableStateResponse) -> Self {
        Self {
            id: state.table_id,
            code: state.code,
            name: state.table_name,
            player_count: state.player_count,
            max_players: state.max_players,
            small_blind: state.small_blind,
            big_blind: state.big_blind,
            speed: state.speed,
            phase: state.phase,
            is_active: state.is_active,
        }
    }
}

impl TableMetadata {
    /// Whether a new player could sit down right now
    pub fn is_joinable(&self) -> bool {
        self.is_active && self.phase == Phase::Waiting && self.player_count < self.max_players
    }
}

/// Table manager for managing multiple table instances
pub struct TableManager {
    /// Config used by `join_or_create` when it has to open a table
    default_config: TableConfig,

    /// Active table handles
    tables: Arc<RwLock<HashMap<TableId, TableHandle>>>,

    /// Room code to table
    codes: Arc<RwLock<HashMap<String, TableId>>>,

    /// Where each player is seated
    seats: Arc<RwLock<HashMap<PlayerId, TableId>>>,

    /// Next table ID
    next_table_id: Arc<RwLock<TableId>>,
}

impl Default for TableManager {
    fn default() -> Self {
        Self::new(TableConfig::default())
    }
}

impl TableManager {
    /// Create a new table manager
    pub fn new(default_config: TableConfig) -> Self {
        Self {
            default_config,
            tables: Arc::new(RwLock::new(HashMap::new())),
            codes: Arc::new(RwLock::new(HashMap::new())),
            seats: Arc::new(RwLock::new(HashMap::new())),
            next_table_id: Arc::new(RwLock::new(1)),
        }
    }

    /// Send a request built around a fresh oneshot and wait for the reply
    async fn request<T>(
        &self,
        table_id: TableId,
        message: impl FnOnce(oneshot::Sender<T>) -> TableMessage,
    ) -> Result<T, ManagerError> {
        let handle = self
            .get_table(table_id)
            .await
            .ok_or(ManagerError::TableNotFound(table_id))?;

        let (tx, rx) = oneshot::channel();
        handle
            .send(message(tx))
            .await
            .map_err(|_| ManagerError::ChannelClosed)?;
        rx.await.map_err(|_| ManagerError::NoResponse)
    }

    /// Pick a room code not used by any live table and claim it for `table_id`
    async fn reserve_code(&self, table_id: TableId) -> String {
        let mut codes = self.codes.write().await;
        loop {
            let code: String = Uuid::new_v4()
                .simple()
                .to_string()
                .to_uppercase()
                .chars()
                .take(ROOM_CODE_LENGTH)
                .collect();
            if !codes.contains_key(&code) {
                codes.insert(code.clone(), table_id);
                return code;
            }
        }
    }

    /// Create and spawn a new table
    ///
    /// # Arguments
    ///
    /// * `config` - Table configuration
    ///
    /// # Returns
    ///
    /// * `Result<TableId, ManagerError>` - Table ID or error
    pub async fn create_table(&self, config: TableConfig) -> Result<TableId, ManagerError> {
        config.validate().map_err(ManagerError::InvalidConfig)?;

        let mut next_id = self.next_table_id.write().await;
        let table_id = *next_id;
        *next_id += 1;
        drop(next_id);

        let code = self.reserve_code(table_id).await;
        let (actor, handle) = TableActor::new(table_id, code.clone(), config);

        let mut tables = self.tables.write().await;
        tables.insert(table_id, handle);
        drop(tables);

        tokio::spawn(async move {
            actor.run().await;
        });

        log::info!("Created and spawned table {} ({})", table_id, code);

        Ok(table_id)
    }

    /// Get a table handle
    pub async fn get_table(&self, table_id: TableId) -> Option<TableHandle> {
        let tables = self.tables.read().await;
        tables.get(&table_id).cloned()
    }

    /// Look a table up by room code, case-insensitively
    pub async fn find_by_code(&self, code: &str) -> Option<TableId> {
        let codes = self.codes.read().await;
        codes.get(&code.trim().to_uppercase()).copied()
    }

    /// Table the player is seated at, if any
    pub async fn table_for_player(&self, player_id: PlayerId) -> Option<TableId> {
        let seats = self.seats.read().await;
        seats.get(&player_id).copied()
    }

    /// Join a table
    ///
    /// # Arguments
    ///
    /// * `table_id` - Table ID
    /// * `player_id` - Player ID
    /// * `username` - Display name
    ///
    /// # Returns
    ///
    /// * `Result<TableResponse, ManagerError>` - Response or error
    pub async fn join_table(
        &self,
        table_id: TableId,
        player_id: PlayerId,
        username: String,
    ) -> Result<TableResponse, ManagerError> {
        self.ensure_unseated(player_id).await?;

        let response = self
            .request(table_id, |response| TableMessage::JoinTable {
                player_id,
                username,
                response,
            })
            .await?;

        if response.is_success() {
            let mut seats = self.seats.write().await;
            seats.insert(player_id, table_id);
        }

        Ok(response)
    }

    /// Seats recorded here can go stale when a table removes a busted
    /// player or shuts down on its own. Drop those before refusing a join.
    async fn ensure_unseated(&self, player_id: PlayerId) -> Result<(), ManagerError> {
        let Some(table_id) = self.table_for_player(player_id).await else {
            return Ok(());
        };
        let still_seated = match self
            .request(table_id, |response| TableMessage::GetView {
                viewer: None,
                response,
            })
            .await
        {
            Ok(view) => view.player(player_id).is_some(),
            Err(_) => false,
        };
        if still_seated {
            return Err(ManagerError::AlreadySeated {
                player_id,
                table_id,
            });
        }
        let mut seats = self.seats.write().await;
        seats.remove(&player_id);
        Ok(())
    }

    /// Join the room with `code`, or when no code is given the first table
    /// still waiting for players, creating one with the default config if
    /// none is.
    pub async fn join_or_create(
        &self,
        player_id: PlayerId,
        username: String,
        code: Option<&str>,
    ) -> Result<(TableId, TableResponse), ManagerError> {
        let table_id = match code {
            Some(code) => self
                .find_by_code(code)
                .await
                .ok_or_else(|| ManagerError::RoomNotFound(code.to_string()))?,
            None => {
                let open = self
                    .list_tables()
                    .await
                    .into_iter()
                    .filter(TableMetadata::is_joinable)
                    .min_by_key(|table| table.id);
                match open {
                    Some(table) => table.id,
                    None => self.create_table(self.default_config.clone()).await?,
                }
            }
        };

        let response = self.join_table(table_id, player_id, username).await?;
        Ok((table_id, response))
    }

    /// Leave a table
    ///
    /// Closes the table once its last player is gone.
    pub async fn leave_table(
        &self,
        table_id: TableId,
        player_id: PlayerId,
    ) -> Result<TableResponse, ManagerError> {
        let response = self
            .request(table_id, |response| TableMessage::LeaveTable {
                player_id,
                response,
            })
            .await?;
        self.after_departure(table_id, player_id, &response).await?;
        Ok(response)
    }

    /// Handle a dropped connection for whichever table the player is at
    pub async fn disconnect(&self, player_id: PlayerId) -> Result<TableResponse, ManagerError> {
        let table_id = self
            .table_for_player(player_id)
            .await
            .ok_or(ManagerError::PlayerNotSeated(player_id))?;
        let response = self
            .request(table_id, |response| TableMessage::Disconnect {
                player_id,
                response,
            })
            .await?;
        self.after_departure(table_id, player_id, &response).await?;
        Ok(response)
    }

    async fn after_departure(
        &self,
        table_id: TableId,
        player_id: PlayerId,
        response: &TableResponse,
    ) -> Result<(), ManagerError> {
        if !response.is_success() && *response != TableResponse::NotAtTable {
            return Ok(());
        }
        let mut seats = self.seats.write().await;
        if seats.get(&player_id) == Some(&table_id) {
            seats.remove(&player_id);
        }
        drop(seats);

        let state = self.get_table_state(table_id).await?;
        if state.player_count == 0 {
            log::info!("Table {} is empty", table_id);
            self.close_table(table_id).await?;
        }
        Ok(())
    }

    /// Route a player action to the table the player is seated at
    pub async fn take_action(
        &self,
        player_id: PlayerId,
        action: Action,
    ) -> Result<TableResponse, ManagerError> {
        let table_id = self
            .table_for_player(player_id)
            .await
            .ok_or(ManagerError::PlayerNotSeated(player_id))?;
        self.request(table_id, |response| TableMessage::TakeAction {
            player_id,
            action,
            response,
        })
        .await
    }

    /// Choices open to the player right now
    pub async fn legal_actions(&self, player_id: PlayerId) -> Result<Vec<ActionChoice>, ManagerError> {
        let table_id = self
            .table_for_player(player_id)
            .await
            .ok_or(ManagerError::PlayerNotSeated(player_id))?;
        self.request(table_id, |response| TableMessage::GetLegalActions {
            player_id,
            response,
        })
        .await
    }

    /// Deal the next hand without waiting for the start timer
    pub async fn start_hand(&self, table_id: TableId) -> Result<TableResponse, ManagerError> {
        self.request(table_id, |response| TableMessage::StartHand { response })
            .await
    }

    /// Get table state
    pub async fn get_table_state(
        &self,
        table_id: TableId,
    ) -> Result<TableStateResponse, ManagerError> {
        self.request(table_id, |response| TableMessage::GetState { response })
            .await
    }

    /// Get the table as `viewer` sees it
    pub async fn get_view(
        &self,
        table_id: TableId,
        viewer: Option<PlayerId>,
    ) -> Result<TableView, ManagerError> {
        self.request(table_id, |response| TableMessage::GetView { viewer, response })
            .await
    }

    /// Register `sender` for notifications from a table
    pub async fn subscribe(
        &self,
        table_id: TableId,
        subscriber_id: i64,
        sender: mpsc::Sender<TableNotification>,
    ) -> Result<(), ManagerError> {
        let handle = self
            .get_table(table_id)
            .await
            .ok_or(ManagerError::TableNotFound(table_id))?;
        handle
            .send(TableMessage::Subscribe {
                subscriber_id,
                sender,
            })
            .await
            .map_err(|_| ManagerError::ChannelClosed)
    }

    /// List all live tables, ordered by ID
    pub async fn list_tables(&self) -> Vec<TableMetadata> {
        let ids: Vec<TableId> = {
            let tables = self.tables.read().await;
            tables.keys().copied().collect()
        };

        let mut metadata_list = Vec::with_capacity(ids.len());
        for table_id in ids {
            if let Ok(state) = self.get_table_state(table_id).await {
                metadata_list.push(TableMetadata::from(state));
            }
        }
        metadata_list.sort_by_key(|table| table.id);
        metadata_list
    }

    /// Close a table
    pub async fn close_table(&self, table_id: TableId) -> Result<(), ManagerError> {
        match self
            .request(table_id, |response| TableMessage::Close { response })
            .await
        {
            Ok(_) | Err(ManagerError::ChannelClosed) | Err(ManagerError::NoResponse) => {}
            Err(e) => return Err(e),
        }
        self.forget(&[table_id]).await;
        log::info!("Closed table {}", table_id);
        Ok(())
    }

    /// Drop handles of tables whose actors have stopped on their own.
    /// Returns how many were removed.
    pub async fn prune_closed(&self) -> usize {
        let closed: Vec<TableId> = {
            let tables = self.tables.read().await;
            tables
                .values()
                .filter(|handle| handle.is_closed())
                .map(TableHandle::table_id)
                .collect()
        };
        if !closed.is_empty() {
            self.forget(&closed).await;
            log::debug!("Pruned {} closed tables", closed.len());
        }
        closed.len()
    }

    async fn forget(&self, table_ids: &[TableId]) {
        let mut tables = self.tables.write().await;
        tables.retain(|id, _| !table_ids.contains(id));
        drop(tables);

        let mut codes = self.codes.write().await;
        codes.retain(|_, id| !table_ids.contains(id));
        drop(codes);

        let mut seats = self.seats.write().await;
        seats.retain(|_, id| !table_ids.contains(id));
    }

    /// Get active table count
    pub async fn active_table_count(&self) -> usize {
        let tables = self.tables.read().await;
        tables.len()
    }
}

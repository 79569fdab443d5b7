//! Table module providing multi-table support with async actor model.
//!
//! This module implements:
//! - TableActor: Async actor owning a single [`PokerTable`](crate::PokerTable)
//! - TableManager: Registry spawning and routing to table actors
//! - Message-based communication with tokio channels
//! - Turn, deal and showdown timers
//!
//! ## Architecture
//!
//! Each table runs in a separate Tokio task with an mpsc message inbox, so
//! every mutation of a table is applied strictly one at a time. Timers are
//! tasks that post back into the inbox through a weak sender and are
//! aborted when the state they were armed for moves on.
//!
//! ## Example
//!
//! ```no_run
//! use casino_poker::table::{TableConfig, TableManager};
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = TableManager::new(TableConfig::default());
//!     let table_id = manager.create_table(TableConfig::default()).await.unwrap();
//!     manager.join_table(table_id, 1, "alice".to_string()).await.unwrap();
//!     manager.join_table(table_id, 2, "bob".to_string()).await.unwrap();
//! }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;

/// Registry-wide table identifier.
pub type TableId = i64;

pub use actor::{TableActor, TableHandle};
pub use config::{TableConfig, TableSpeed};
pub use manager::{ManagerError, TableManager, TableMetadata};
pub use messages::{TableMessage, TableNotification, TableResponse, TableStateResponse};

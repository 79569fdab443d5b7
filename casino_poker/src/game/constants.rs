/// Seats at a default table.
pub const MAX_PLAYERS: usize = 8;

/// Hard seat limit. Two hole cards per seat plus a full board must fit in
/// one 52-card deck.
pub const MAX_SEATS_PER_DECK: usize = 23;

pub const MAX_USER_INPUT_LENGTH: usize = 32;

pub const HOLE_CARDS: usize = 2;
pub const BOARD_SIZE: usize = 5;
pub const HAND_SIZE: usize = 5;

/// Default time a player has to act before being folded.
pub const DEFAULT_TURN_TIMEOUT_MS: u64 = 30_000;

/// Pause between enough players being seated and the first deal.
pub const DEFAULT_START_DELAY_MS: u64 = 3_000;

/// How long a showdown stays on screen before the next hand.
pub const DEFAULT_SHOWDOWN_DELAY_MS: u64 = 5_000;

/// A finished table lingers this long before its actor shuts down.
pub const DEFAULT_FINISHED_CLOSE_DELAY_MS: u64 = 10_000;

/// Length of the shareable room code handed out by the registry.
pub const ROOM_CODE_LENGTH: usize = 6;

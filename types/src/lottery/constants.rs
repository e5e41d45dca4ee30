/// Base units per coin.
pub const COIN: u64 = 1_000_000_000;

/// Minimum stake required to enter a round (0.01 coin).
pub const MINIMUM_ENTRY: u64 = COIN / 100;

/// Maximum entrants per round (bounds the encoded players list).
pub const MAX_PLAYERS: usize = 1024;

/// Maximum length for error event messages.
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 128;

/// Error codes for LotteryError events
pub const ERROR_INSUFFICIENT_STAKE: u8 = 1;
pub const ERROR_INSUFFICIENT_FUNDS: u8 = 2;
pub const ERROR_UNAUTHORIZED: u8 = 3;
pub const ERROR_EMPTY_POOL: u8 = 4;
pub const ERROR_NOT_DEPLOYED: u8 = 5;
pub const ERROR_ALREADY_DEPLOYED: u8 = 6;
pub const ERROR_ROUND_FULL: u8 = 7;

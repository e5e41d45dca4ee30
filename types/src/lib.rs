pub mod execution;
pub mod lottery;

pub use execution::{
    transaction_namespace, Account, Event, Identity, Instruction, Key, Output, Seed, Transaction,
    Value, NAMESPACE,
};
pub use lottery::{winner_index, LotteryState, MAX_PLAYERS, MINIMUM_ENTRY};

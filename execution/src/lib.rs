//! Jackpot execution layer.
//!
//! This crate contains the deterministic transaction execution logic
//! (`Layer`) for the pooled-wagering round: entry validation, player-set
//! accumulation, manager-gated winner selection, payout, and reset.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution.
//! - Do not use non-deterministic randomness; only derive randomness from the provided seed.
//! - Avoid iteration order of hash-based collections influencing outputs.
//!
//! ## Execution pipeline
//! The host hands [`Layer`] a state snapshot, the block seed, and the block
//! height. `execute` applies a batch of signed transactions against a
//! pending overlay; `commit` yields the ordered change set, which the host
//! applies atomically via [`State::apply`]. A transaction whose
//! preconditions fail contributes only a `LotteryError` event and leaves
//! every state key untouched.

pub mod query;

mod layer;

mod state;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


pub use layer::Layer;
pub use query::{query_balance, query_manager, query_players, query_pot, QueryError};
pub use state::{nonce, Adb, PrepareError, State, Status};

#[cfg(any(test, feature = "mocks"))]
pub use state::Memory;

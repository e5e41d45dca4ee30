//! Lottery domain types.
//!
//! Defines the round state and constants used by the execution layer and
//! clients.

mod constants;
mod pool;

pub use constants::*;
pub use pool::*;

//! Read-only views over lottery state.
//!
//! These queries are callable by anyone (including non-entrants), cost no
//! nonce, and never mutate state.

use commonware_cryptography::ed25519::PublicKey;
use jackpot_types::execution::{Key, Value};
use jackpot_types::lottery::LotteryState;

use crate::state::{load_account, State};

/// Error during lottery queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The lottery has not been deployed.
    NotDeployed,
    /// State access error.
    StateError(String),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotDeployed => write!(f, "lottery not deployed"),
            Self::StateError(msg) => write!(f, "state error: {msg}"),
        }
    }
}

impl std::error::Error for QueryError {}

async fn lottery<S: State>(state: &S) -> Result<LotteryState, QueryError> {
    match state
        .get(&Key::Lottery)
        .await
        .map_err(|err| QueryError::StateError(err.to_string()))?
    {
        Some(Value::Lottery(lottery)) => Ok(lottery),
        _ => Err(QueryError::NotDeployed),
    }
}

/// Current entrants, in entry order, duplicates included.
pub async fn query_players<S: State>(state: &S) -> Result<Vec<PublicKey>, QueryError> {
    Ok(lottery(state).await?.players)
}

/// The identity that deployed the lottery.
pub async fn query_manager<S: State>(state: &S) -> Result<PublicKey, QueryError> {
    Ok(lottery(state).await?.manager)
}

/// The contract's pooled balance.
pub async fn query_pot<S: State>(state: &S) -> Result<u64, QueryError> {
    Ok(match state
        .get(&Key::Pot)
        .await
        .map_err(|err| QueryError::StateError(err.to_string()))?
    {
        Some(Value::Pot(amount)) => amount,
        _ => 0,
    })
}

/// An account's balance in the ledger's native base unit.
pub async fn query_balance<S: State>(state: &S, public: &PublicKey) -> Result<u64, QueryError> {
    load_account(state, public)
        .await
        .map(|account| account.balance)
        .map_err(|err| QueryError::StateError(err.to_string()))
}

use bytes::{Buf, BufMut};
use commonware_codec::{Encode, EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::{ed25519::PublicKey, sha256::Sha256, Hasher};
use commonware_utils::modulo;
use thiserror::Error as ThisError;

use super::MAX_PLAYERS;
use crate::execution::Seed;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum LotteryInvariantError {
    #[error("too many players (len={len}, max={max})")]
    TooManyPlayers { len: usize, max: usize },
}

/// Singleton round state for the lottery.
///
/// `manager` is fixed at deployment and never changes. `players` is the
/// ordered entrant list for the current round; an account that enters more
/// than once appears more than once. The pot itself is not a field here: the
/// contract's balance lives in the ledger's own accounting (`Key::Pot`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LotteryState {
    pub manager: PublicKey,
    pub players: Vec<PublicKey>,
}

impl LotteryState {
    pub fn new(manager: PublicKey) -> Self {
        Self {
            manager,
            players: Vec::new(),
        }
    }

    pub fn validate_invariants(&self) -> Result<(), LotteryInvariantError> {
        if self.players.len() > MAX_PLAYERS {
            return Err(LotteryInvariantError::TooManyPlayers {
                len: self.players.len(),
                max: MAX_PLAYERS,
            });
        }
        Ok(())
    }
}

impl Write for LotteryState {
    fn write(&self, writer: &mut impl BufMut) {
        self.manager.write(writer);
        self.players.write(writer);
    }
}

impl Read for LotteryState {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            manager: PublicKey::read(reader)?,
            players: Vec::<PublicKey>::read_range(reader, 0..=MAX_PLAYERS)?,
        })
    }
}

impl EncodeSize for LotteryState {
    fn encode_size(&self) -> usize {
        self.manager.encode_size() + self.players.encode_size()
    }
}

/// Derive the winning index for a round with the given entrants.
///
/// Entropy is the block seed (a threshold signature produced by the block
/// producers) mixed with the block height and the entrant list, reduced
/// modulo the entrant count. Producers influence the seed and the manager
/// chooses the block in which to pick, so the outcome is not unbiasable;
/// this is a documented property of the scheme. A deployment that needs
/// fairness guarantees should use a VRF or a commit-reveal scheme instead.
///
/// Panics when `players` is empty; callers must reject empty rounds first.
pub fn winner_index(seed: &Seed, height: u64, players: &[PublicKey]) -> usize {
    assert!(!players.is_empty());

    let mut hasher = Sha256::new();
    hasher.update(seed.encode().as_ref());
    hasher.update(height.to_be_bytes().as_ref());
    for player in players {
        hasher.update(player.as_ref());
    }
    let digest = hasher.finalize();

    modulo(digest.as_ref(), players.len() as u64) as usize
}

use bytes::{Buf, BufMut};
use commonware_codec::{Encode, EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_consensus::threshold_simplex::types::Seed as CSeed;
use commonware_cryptography::{
    bls12381::primitives::variant::{MinSig, Variant},
    ed25519::{self, PublicKey},
    sha256::{Digest, Sha256},
    Digestible, Hasher, Signer, Verifier,
};
use commonware_utils::union;

use crate::lottery::{LotteryState, MAX_ERROR_MESSAGE_LENGTH};

pub const NAMESPACE: &[u8] = b"_JACKPOT";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";

/// Per-block entropy handed to the execution layer by the host: a threshold
/// signature over the view, produced by the block producers.
pub type Seed = CSeed<MinSig>;

/// Public identity of the network producing seeds.
pub type Identity = <MinSig as Variant>::Public;

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(nonce: &u64, instruction: &Instruction) -> Vec<u8> {
        let mut payload = Vec::new();
        nonce.write(&mut payload);
        instruction.write(&mut payload);

        payload
    }

    pub fn sign(private: &ed25519::PrivateKey, nonce: u64, instruction: Instruction) -> Self {
        let signature = private.sign(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&nonce, &instruction),
        );

        Self {
            nonce,
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&self.nonce, &self.instruction),
            &self.signature,
        )
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let nonce = u64::read(reader)?;
        let instruction = Instruction::read(reader)?;
        let public = ed25519::PublicKey::read(reader)?;
        let signature = ed25519::Signature::read(reader)?;

        Ok(Self {
            nonce,
            instruction,
            public,
            signature,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.instruction.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

impl Digestible for Transaction {
    type Digest = Digest;

    fn digest(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.nonce.to_be_bytes().as_ref());
        hasher.update(self.instruction.encode().as_ref());
        hasher.update(self.public.as_ref());
        // We don't include the signature as part of the digest (any valid
        // signature will be valid for the transaction)
        hasher.finalize()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Create the lottery; the sender becomes the immutable manager.
    /// Binary: [0]
    Deploy,

    /// Credit the sender's account (dev/testing faucet).
    /// Binary: [1] [amount:u64 BE]
    Deposit { amount: u64 },

    /// Enter the current round, attaching `amount` base units as stake.
    /// Binary: [2] [amount:u64 BE]
    Enter { amount: u64 },

    /// Pay the whole pot to a pseudo-randomly selected entrant and reset
    /// the round. Manager only.
    /// Binary: [3]
    PickWinner,
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Deploy => 0u8.write(writer),
            Self::Deposit { amount } => {
                1u8.write(writer);
                amount.write(writer);
            }
            Self::Enter { amount } => {
                2u8.write(writer);
                amount.write(writer);
            }
            Self::PickWinner => 3u8.write(writer),
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match reader.get_u8() {
            0 => Self::Deploy,
            1 => Self::Deposit {
                amount: u64::read(reader)?,
            },
            2 => Self::Enter {
                amount: u64::read(reader)?,
            },
            3 => Self::PickWinner,

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Deploy | Self::PickWinner => 0,
                Self::Deposit { amount } | Self::Enter { amount } => amount.encode_size(),
            }
    }
}

/// Ledger account: transaction nonce for replay protection and the balance
/// held in the ledger's native base unit.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Account {
    pub nonce: u64,
    pub balance: u64,
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.balance.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
            balance: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size() + self.balance.encode_size()
    }
}

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    /// Per-account nonce and balance (tag 0)
    Account(PublicKey),

    /// Singleton round state: manager and entrants (tag 1)
    Lottery,

    /// The contract's own balance in the ledger's accounting (tag 2)
    Pot,
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(public) => {
                0u8.write(writer);
                public.write(writer);
            }
            Self::Lottery => 1u8.write(writer),
            Self::Pot => 2u8.write(writer),
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match reader.get_u8() {
            0 => Self::Account(PublicKey::read(reader)?),
            1 => Self::Lottery,
            2 => Self::Pot,

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(public) => public.encode_size(),
                Self::Lottery | Self::Pot => 0,
            }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Account(Account),
    Lottery(LotteryState),
    Pot(u64),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(account) => {
                0u8.write(writer);
                account.write(writer);
            }
            Self::Lottery(lottery) => {
                1u8.write(writer);
                lottery.write(writer);
            }
            Self::Pot(amount) => {
                2u8.write(writer);
                amount.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match reader.get_u8() {
            0 => Self::Account(Account::read(reader)?),
            1 => Self::Lottery(LotteryState::read(reader)?),
            2 => Self::Pot(u64::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(account) => account.encode_size(),
                Self::Lottery(lottery) => lottery.encode_size(),
                Self::Pot(amount) => amount.encode_size(),
            }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The lottery was created (tag 0).
    LotteryDeployed { manager: PublicKey },

    /// A faucet deposit was credited (tag 1).
    Deposited {
        account: PublicKey,
        amount: u64,
        balance: u64,
    },

    /// An entrant joined the current round (tag 2).
    PlayerEntered {
        player: PublicKey,
        amount: u64,
        pot: u64,
        entrants: u32,
    },

    /// The whole pot was paid out and the round reset (tag 3).
    WinnerPicked {
        winner: PublicKey,
        amount: u64,
        entrants: u32,
    },

    /// A call aborted without touching state (tag 4).
    LotteryError {
        player: PublicKey,
        error_code: u8,
        message: String,
    },
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::LotteryDeployed { manager } => {
                0u8.write(writer);
                manager.write(writer);
            }
            Self::Deposited {
                account,
                amount,
                balance,
            } => {
                1u8.write(writer);
                account.write(writer);
                amount.write(writer);
                balance.write(writer);
            }
            Self::PlayerEntered {
                player,
                amount,
                pot,
                entrants,
            } => {
                2u8.write(writer);
                player.write(writer);
                amount.write(writer);
                pot.write(writer);
                entrants.write(writer);
            }
            Self::WinnerPicked {
                winner,
                amount,
                entrants,
            } => {
                3u8.write(writer);
                winner.write(writer);
                amount.write(writer);
                entrants.write(writer);
            }
            Self::LotteryError {
                player,
                error_code,
                message,
            } => {
                4u8.write(writer);
                player.write(writer);
                error_code.write(writer);
                (message.len() as u32).write(writer);
                writer.put_slice(message.as_bytes());
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match reader.get_u8() {
            0 => Self::LotteryDeployed {
                manager: PublicKey::read(reader)?,
            },
            1 => Self::Deposited {
                account: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
                balance: u64::read(reader)?,
            },
            2 => Self::PlayerEntered {
                player: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
                pot: u64::read(reader)?,
                entrants: u32::read(reader)?,
            },
            3 => Self::WinnerPicked {
                winner: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
                entrants: u32::read(reader)?,
            },
            4 => {
                let player = PublicKey::read(reader)?;
                let error_code = u8::read(reader)?;
                let message_len = u32::read(reader)? as usize;
                if message_len > MAX_ERROR_MESSAGE_LENGTH {
                    return Err(Error::Invalid("Event", "error message too long"));
                }
                if reader.remaining() < message_len {
                    return Err(Error::EndOfBuffer);
                }
                let mut message_bytes = vec![0u8; message_len];
                reader.copy_to_slice(&mut message_bytes);
                let message = String::from_utf8(message_bytes)
                    .map_err(|_| Error::Invalid("Event", "invalid UTF-8 in error message"))?;
                Self::LotteryError {
                    player,
                    error_code,
                    message,
                }
            }

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::LotteryDeployed { manager } => manager.encode_size(),
                Self::Deposited {
                    account,
                    amount,
                    balance,
                } => account.encode_size() + amount.encode_size() + balance.encode_size(),
                Self::PlayerEntered {
                    player,
                    amount,
                    pot,
                    entrants,
                } => {
                    player.encode_size()
                        + amount.encode_size()
                        + pot.encode_size()
                        + entrants.encode_size()
                }
                Self::WinnerPicked {
                    winner,
                    amount,
                    entrants,
                } => winner.encode_size() + amount.encode_size() + entrants.encode_size(),
                Self::LotteryError {
                    player,
                    error_code,
                    message,
                } => player.encode_size() + error_code.encode_size() + 4 + message.len(),
            }
    }
}

/// Everything the execution layer appends to the event log for one block:
/// the events a transaction produced, followed by the transaction itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    Event(Event),
    Transaction(Transaction),
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Event(event) => {
                0u8.write(writer);
                event.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
        }
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let output = match reader.get_u8() {
            0 => Self::Event(Event::read(reader)?),
            1 => Self::Transaction(Transaction::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(output)
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Event(event) => event.encode_size(),
                Self::Transaction(transaction) => transaction.encode_size(),
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_cryptography::{ed25519::PrivateKey, PrivateKeyExt};
    use rand::{rngs::StdRng, SeedableRng};

    fn test_signer(seed: u64) -> PrivateKey {
        let mut rng = StdRng::seed_from_u64(seed);
        PrivateKey::from_rng(&mut rng)
    }

    #[test]
    fn test_instruction_roundtrip() {
        for instruction in [
            Instruction::Deploy,
            Instruction::Deposit { amount: 42 },
            Instruction::Enter {
                amount: crate::lottery::MINIMUM_ENTRY,
            },
            Instruction::PickWinner,
        ] {
            let encoded = instruction.encode();
            assert_eq!(encoded.len(), instruction.encode_size());
            let decoded = Instruction::read(&mut &encoded[..]).unwrap();
            assert_eq!(instruction, decoded);
        }
    }

    #[test]
    fn test_transaction_sign_verify() {
        let signer = test_signer(1);
        let transaction = Transaction::sign(&signer, 0, Instruction::Deploy);
        assert!(transaction.verify());

        // Any change to the signed payload invalidates the signature.
        let mut tampered = transaction.clone();
        tampered.nonce = 1;
        assert!(!tampered.verify());

        let mut tampered = transaction;
        tampered.instruction = Instruction::PickWinner;
        assert!(!tampered.verify());
    }

    #[test]
    fn test_transaction_roundtrip() {
        let signer = test_signer(1);
        let transaction = Transaction::sign(&signer, 3, Instruction::Enter { amount: 100 });

        let encoded = transaction.encode();
        let decoded = Transaction::read(&mut &encoded[..]).unwrap();
        assert_eq!(transaction, decoded);
        assert!(decoded.verify());
    }

    #[test]
    fn test_transaction_digest_ignores_signature() {
        let signer = test_signer(1);
        let transaction = Transaction::sign(&signer, 0, Instruction::Deploy);

        let mut resigned = transaction.clone();
        resigned.signature = Transaction::sign(&signer, 0, Instruction::Deploy).signature;
        assert_eq!(transaction.digest(), resigned.digest());

        let different = Transaction::sign(&signer, 1, Instruction::Deploy);
        assert_ne!(transaction.digest(), different.digest());
    }

    #[test]
    fn test_key_value_roundtrip() {
        let public = test_signer(2).public_key();

        let key = Key::Account(public.clone());
        let decoded = Key::read(&mut &key.encode()[..]).unwrap();
        assert_eq!(key, decoded);

        let value = Value::Account(Account {
            nonce: 7,
            balance: 1_000,
        });
        let decoded = Value::read(&mut &value.encode()[..]).unwrap();
        assert_eq!(value, decoded);
    }

    #[test]
    fn test_event_roundtrip() {
        let public = test_signer(3).public_key();
        for event in [
            Event::LotteryDeployed {
                manager: public.clone(),
            },
            Event::PlayerEntered {
                player: public.clone(),
                amount: 20_000_000,
                pot: 20_000_000,
                entrants: 1,
            },
            Event::LotteryError {
                player: public.clone(),
                error_code: 3,
                message: "only the manager can pick a winner".to_string(),
            },
        ] {
            let encoded = event.encode();
            assert_eq!(encoded.len(), event.encode_size());
            let decoded = Event::read(&mut &encoded[..]).unwrap();
            assert_eq!(event, decoded);
        }
    }

    #[test]
    fn test_event_rejects_oversized_error_message() {
        let public = test_signer(3).public_key();
        let event = Event::LotteryError {
            player: public,
            error_code: 1,
            message: "x".repeat(MAX_ERROR_MESSAGE_LENGTH + 1),
        };

        let encoded = event.encode();
        assert!(Event::read(&mut &encoded[..]).is_err());
    }
}

use anyhow::{Context as _, Result};
use commonware_cryptography::ed25519::PublicKey;
use jackpot_types::execution::{Event, Instruction, Key, Output, Seed, Transaction, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::state::{load_account, validate_and_increment_nonce, PrepareError, State, Status};

mod handlers;

pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,

    seed: Seed,
    height: u64,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, seed: Seed, height: u64) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),

            seed,
            height,
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    async fn prepare(&mut self, transaction: &Transaction) -> Result<(), PrepareError> {
        let mut account = load_account(self, &transaction.public)
            .await
            .map_err(PrepareError::State)?;
        validate_and_increment_nonce(&mut account, transaction.nonce)?;
        self.insert(
            Key::Account(transaction.public.clone()),
            Value::Account(account),
        );

        Ok(())
    }

    async fn apply(&mut self, transaction: &Transaction) -> Result<Vec<Event>> {
        let instruction = &transaction.instruction;
        let public = &transaction.public;

        match instruction {
            Instruction::Deploy => self.handle_deploy(public).await,
            Instruction::Deposit { amount } => self.handle_deposit(public, *amount).await,
            Instruction::Enter { amount } => self.handle_enter(public, *amount).await,
            Instruction::PickWinner => self.handle_pick_winner(public).await,
        }
    }

    pub async fn execute(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> Result<(Vec<Output>, BTreeMap<PublicKey, u64>)> {
        let mut processed_nonces = BTreeMap::new();
        let mut outputs = Vec::new();

        for tx in transactions {
            match self.prepare(&tx).await {
                Ok(()) => {}
                Err(PrepareError::NonceMismatch { expected, got }) => {
                    debug!(
                        public = ?tx.public,
                        expected,
                        got,
                        "nonce mismatch; dropping transaction"
                    );
                    continue;
                }
                Err(PrepareError::State(err)) => {
                    return Err(err).context("state error during prepare");
                }
            }
            processed_nonces.insert(tx.public.clone(), tx.nonce.saturating_add(1));
            outputs.extend(self.apply(&tx).await?.into_iter().map(Output::Event));
            outputs.push(Output::Transaction(tx));
        }

        Ok((outputs, processed_nonces))
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await?,
        })
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.pending.insert(key, Status::Update(value));
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.pending.insert(key.clone(), Status::Delete);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{create_account_keypair, create_network_keypair, create_seed};
    use crate::state::Memory;
    use commonware_runtime::deterministic::Runner;
    use commonware_runtime::Runner as _;
    use jackpot_types::lottery::{ERROR_NOT_DEPLOYED, MINIMUM_ENTRY};

    #[test]
    fn test_nonce_validation() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();
            let (network_secret, _) = create_network_keypair();
            let seed = create_seed(&network_secret, 1);
            let mut layer = Layer::new(&state, seed, 1);

            let (signer, _) = create_account_keypair(1);

            // Wrong nonce should fail
            let tx = Transaction::sign(&signer, 1, Instruction::Deploy);
            assert!(layer.prepare(&tx).await.is_err());

            // Correct nonce should succeed
            let tx = Transaction::sign(&signer, 0, Instruction::Deploy);
            assert!(layer.prepare(&tx).await.is_ok());

            let _ = layer.commit();
        });
    }

    #[test]
    fn test_replayed_transaction_is_dropped() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();
            let (network_secret, _) = create_network_keypair();
            let seed = create_seed(&network_secret, 1);
            let mut layer = Layer::new(&state, seed, 1);

            let (signer, public) = create_account_keypair(1);

            let tx = Transaction::sign(&signer, 0, Instruction::Deposit { amount: 100 });
            let (outputs, nonces) = layer.execute(vec![tx.clone(), tx]).await.unwrap();

            // One deposit event and one transaction echo; the replay is gone.
            assert_eq!(outputs.len(), 2);
            assert_eq!(nonces.get(&public), Some(&1));
            if let Some(Value::Account(account)) =
                layer.get(&Key::Account(public.clone())).await.unwrap()
            {
                assert_eq!(account.nonce, 1);
                assert_eq!(account.balance, 100);
            } else {
                panic!("Account not found");
            }

            let _ = layer.commit();
        });
    }

    #[test]
    fn test_deploy_sets_manager() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();
            let (network_secret, _) = create_network_keypair();
            let seed = create_seed(&network_secret, 1);
            let mut layer = Layer::new(&state, seed, 1);

            let (signer, public) = create_account_keypair(1);

            let tx = Transaction::sign(&signer, 0, Instruction::Deploy);
            assert!(layer.prepare(&tx).await.is_ok());
            let events = layer.apply(&tx).await.unwrap();

            assert_eq!(events.len(), 1);
            assert!(matches!(
                &events[0],
                Event::LotteryDeployed { manager } if manager == &public
            ));

            if let Some(Value::Lottery(lottery)) = layer.get(&Key::Lottery).await.unwrap() {
                assert_eq!(lottery.manager, public);
                assert!(lottery.players.is_empty());
            } else {
                panic!("Lottery not found");
            }
            assert!(matches!(
                layer.get(&Key::Pot).await.unwrap(),
                Some(Value::Pot(0))
            ));

            let _ = layer.commit();
        });
    }

    #[test]
    fn test_enter_before_deploy_aborts() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();
            let (network_secret, _) = create_network_keypair();
            let seed = create_seed(&network_secret, 1);
            let mut layer = Layer::new(&state, seed, 1);

            let (signer, public) = create_account_keypair(1);

            let tx = Transaction::sign(
                &signer,
                0,
                Instruction::Enter {
                    amount: MINIMUM_ENTRY,
                },
            );
            assert!(layer.prepare(&tx).await.is_ok());
            let events = layer.apply(&tx).await.unwrap();

            assert!(matches!(
                &events[0],
                Event::LotteryError { player, error_code, .. }
                    if player == &public && *error_code == ERROR_NOT_DEPLOYED
            ));
            assert!(layer.get(&Key::Lottery).await.unwrap().is_none());

            let _ = layer.commit();
        });
    }

    #[test]
    fn test_execute_is_deterministic_for_identical_inputs() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state1 = Memory::default();
            let state2 = Memory::default();

            let (network_secret, _) = create_network_keypair();
            let seed = create_seed(&network_secret, 1);

            let (manager, _) = create_account_keypair(1);
            let (player, _) = create_account_keypair(2);

            let txs = vec![
                Transaction::sign(&manager, 0, Instruction::Deploy),
                Transaction::sign(
                    &player,
                    0,
                    Instruction::Deposit {
                        amount: MINIMUM_ENTRY,
                    },
                ),
                Transaction::sign(
                    &player,
                    1,
                    Instruction::Enter {
                        amount: MINIMUM_ENTRY,
                    },
                ),
                Transaction::sign(&manager, 1, Instruction::PickWinner),
            ];

            let mut layer1 = Layer::new(&state1, seed.clone(), 1);
            let mut layer2 = Layer::new(&state2, seed, 1);

            let (outputs1, nonces1) = layer1.execute(txs.clone()).await.unwrap();
            let (outputs2, nonces2) = layer2.execute(txs).await.unwrap();

            assert_eq!(outputs1, outputs2);
            assert_eq!(nonces1, nonces2);
            assert!(layer1.commit() == layer2.commit());
        });
    }
}

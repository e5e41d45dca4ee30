use super::super::*;
use super::lottery_error_vec;
use jackpot_types::lottery::{
    winner_index, LotteryState, ERROR_ALREADY_DEPLOYED, ERROR_EMPTY_POOL, ERROR_INSUFFICIENT_FUNDS,
    ERROR_INSUFFICIENT_STAKE, ERROR_NOT_DEPLOYED, ERROR_ROUND_FULL, ERROR_UNAUTHORIZED,
    MAX_PLAYERS, MINIMUM_ENTRY,
};

impl<'a, S: State> Layer<'a, S> {
    async fn lottery_or_error(
        &mut self,
        public: &PublicKey,
    ) -> anyhow::Result<Result<LotteryState, Vec<Event>>> {
        Ok(match self.get(&Key::Lottery).await? {
            Some(Value::Lottery(lottery)) => Ok(lottery),
            _ => Err(lottery_error_vec(
                public,
                ERROR_NOT_DEPLOYED,
                "Lottery not deployed",
            )),
        })
    }

    async fn pot(&mut self) -> anyhow::Result<u64> {
        Ok(match self.get(&Key::Pot).await? {
            Some(Value::Pot(amount)) => amount,
            _ => 0,
        })
    }

    pub(in crate::layer) async fn handle_deploy(
        &mut self,
        public: &PublicKey,
    ) -> anyhow::Result<Vec<Event>> {
        if self.get(&Key::Lottery).await?.is_some() {
            return Ok(lottery_error_vec(
                public,
                ERROR_ALREADY_DEPLOYED,
                "Lottery already deployed",
            ));
        }

        self.insert(
            Key::Lottery,
            Value::Lottery(LotteryState::new(public.clone())),
        );
        self.insert(Key::Pot, Value::Pot(0));

        Ok(vec![Event::LotteryDeployed {
            manager: public.clone(),
        }])
    }

    pub(in crate::layer) async fn handle_deposit(
        &mut self,
        public: &PublicKey,
        amount: u64,
    ) -> anyhow::Result<Vec<Event>> {
        let mut account = load_account(self, public).await?;
        account.balance = account.balance.saturating_add(amount);
        let balance = account.balance;
        self.insert(Key::Account(public.clone()), Value::Account(account));

        Ok(vec![Event::Deposited {
            account: public.clone(),
            amount,
            balance,
        }])
    }

    pub(in crate::layer) async fn handle_enter(
        &mut self,
        public: &PublicKey,
        amount: u64,
    ) -> anyhow::Result<Vec<Event>> {
        let mut lottery = match self.lottery_or_error(public).await? {
            Ok(lottery) => lottery,
            Err(events) => return Ok(events),
        };

        if amount < MINIMUM_ENTRY {
            return Ok(lottery_error_vec(
                public,
                ERROR_INSUFFICIENT_STAKE,
                format!("Entry requires at least {MINIMUM_ENTRY} base units"),
            ));
        }

        if lottery.players.len() >= MAX_PLAYERS {
            return Ok(lottery_error_vec(public, ERROR_ROUND_FULL, "Round is full"));
        }

        let mut account = load_account(self, public).await?;
        if account.balance < amount {
            return Ok(lottery_error_vec(
                public,
                ERROR_INSUFFICIENT_FUNDS,
                "Insufficient funds",
            ));
        }

        // The attached value moves from the sender to the contract's own
        // balance; the entrant list keeps duplicates and insertion order.
        account.balance -= amount;
        let pot = self.pot().await?.saturating_add(amount);
        lottery.players.push(public.clone());
        let entrants = lottery.players.len() as u32;

        self.insert(Key::Account(public.clone()), Value::Account(account));
        self.insert(Key::Pot, Value::Pot(pot));
        self.insert(Key::Lottery, Value::Lottery(lottery));

        Ok(vec![Event::PlayerEntered {
            player: public.clone(),
            amount,
            pot,
            entrants,
        }])
    }

    pub(in crate::layer) async fn handle_pick_winner(
        &mut self,
        public: &PublicKey,
    ) -> anyhow::Result<Vec<Event>> {
        let mut lottery = match self.lottery_or_error(public).await? {
            Ok(lottery) => lottery,
            Err(events) => return Ok(events),
        };

        // Authorization is independent of round size.
        if *public != lottery.manager {
            return Ok(lottery_error_vec(
                public,
                ERROR_UNAUTHORIZED,
                "Only the manager can pick a winner",
            ));
        }

        if lottery.players.is_empty() {
            return Ok(lottery_error_vec(
                public,
                ERROR_EMPTY_POOL,
                "No entrants in the current round",
            ));
        }

        let index = winner_index(&self.seed, self.height, &lottery.players);
        let winner = lottery.players[index].clone();
        let entrants = lottery.players.len() as u32;
        let amount = self.pot().await?;

        // Payout and reset land in the same change set; neither is ever
        // observable without the other.
        let mut account = load_account(self, &winner).await?;
        account.balance = account.balance.saturating_add(amount);
        self.insert(Key::Account(winner.clone()), Value::Account(account));
        self.insert(Key::Pot, Value::Pot(0));
        lottery.players.clear();
        self.insert(Key::Lottery, Value::Lottery(lottery));

        Ok(vec![Event::WinnerPicked {
            winner,
            amount,
            entrants,
        }])
    }
}

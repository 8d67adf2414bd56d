use chia_bls::Signature;
use chia_protocol::{Bytes32, Coin, CoinSpend, Program, SpendBundle};
use message_singleton_test::{to_puzzle, MockLedger};
use message_singleton_types::Conditions;
use thiserror::Error;

use crate::{DriverError, SpendContext, Wallet};

#[derive(Debug, Error)]
pub(crate) enum TestWalletError {
    #[error("no coin worth at least {0} mojos")]
    InsufficientFunds(u64),
}

/// Spends coins locked by the `1` puzzle, whose solution is its output conditions.
/// Nothing needs a signature, so signing only assembles the bundle.
#[derive(Debug, Clone)]
pub(crate) struct TestWallet<'a> {
    ledger: &'a MockLedger,
    puzzle_hash: Bytes32,
    puzzle_reveal: Program,
}

impl<'a> TestWallet<'a> {
    pub(crate) fn new(ledger: &'a MockLedger) -> anyhow::Result<Self> {
        let (puzzle_hash, puzzle_reveal) = to_puzzle(1)?;

        Ok(Self {
            ledger,
            puzzle_hash,
            puzzle_reveal,
        })
    }
}

impl Wallet for TestWallet<'_> {
    type Error = TestWalletError;

    async fn select_coin(&self, amount: u64) -> Result<Coin, Self::Error> {
        self.ledger
            .unspent_coins(self.puzzle_hash)
            .into_iter()
            .find(|coin| coin.amount >= amount)
            .ok_or(TestWalletError::InsufficientFunds(amount))
    }

    fn change_puzzle_hash(&self) -> Bytes32 {
        self.puzzle_hash
    }

    fn spend_coin(
        &self,
        ctx: &mut SpendContext,
        coin: Coin,
        conditions: Conditions,
    ) -> Result<(), DriverError> {
        let solution = ctx.serialize(&conditions)?;
        ctx.insert(CoinSpend::new(coin, self.puzzle_reveal.clone(), solution));
        Ok(())
    }

    async fn sign(
        &self,
        coin_spends: Vec<CoinSpend>,
        _genesis_challenge: Bytes32,
    ) -> Result<SpendBundle, Self::Error> {
        Ok(SpendBundle::new(coin_spends, Signature::default()))
    }
}

use std::{error::Error, future::Future};

use chia_protocol::{Bytes32, Coin, CoinSpend, SpendBundle};
use message_singleton_types::Conditions;

use crate::{DriverError, SpendContext};

/// Funds launches and fees, and signs the assembled bundle.
///
/// Key management and coin selection stay behind this trait.
pub trait Wallet {
    type Error: Error + Send + Sync + 'static;

    /// Picks a spendable coin worth at least `amount`.
    fn select_coin(&self, amount: u64) -> impl Future<Output = Result<Coin, Self::Error>>;

    /// Where leftover value from [`Wallet::select_coin`] is sent.
    fn change_puzzle_hash(&self) -> Bytes32;

    /// Adds a spend of one of the wallet's coins that outputs `conditions`.
    fn spend_coin(
        &self,
        ctx: &mut SpendContext,
        coin: Coin,
        conditions: Conditions,
    ) -> Result<(), DriverError>;

    fn sign(
        &self,
        coin_spends: Vec<CoinSpend>,
        genesis_challenge: Bytes32,
    ) -> impl Future<Output = Result<SpendBundle, Self::Error>>;
}

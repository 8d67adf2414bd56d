use chia_protocol::{Bytes32, Coin};
use chia_puzzle_types::singleton::LauncherSolution;
use clvm_traits::ToClvm;
use clvm_utils::TreeHash;
use clvmr::Allocator;
use message_singleton_types::{Conditions, SingletonTemplates};

use crate::{DriverError, Spend, SpendContext};

/// A singleton launcher is a coin that is spent within the same block to create a singleton.
/// The first coin that is created is known as an "eve" singleton.
/// The [`Launcher`] type allows you to get the launcher id before committing to creating the singleton.
#[derive(Debug, Clone)]
#[must_use]
pub struct Launcher {
    coin: Coin,
    conditions: Conditions,
}

impl Launcher {
    /// The parent coin will have to output the conditions returned by [`Launcher::spend`].
    pub fn new(templates: &SingletonTemplates, parent_coin_id: Bytes32, amount: u64) -> Self {
        let launcher_puzzle_hash = templates.launcher.hash().into();

        Self {
            coin: Coin::new(parent_coin_id, launcher_puzzle_hash, amount),
            conditions: Conditions::new().create_coin(launcher_puzzle_hash, amount),
        }
    }

    pub fn coin(&self) -> Coin {
        self.coin
    }

    /// The launcher id identifies the singleton for its whole lifetime.
    pub fn launcher_id(&self) -> Bytes32 {
        self.coin.coin_id()
    }

    /// Spends the launcher coin to create the eve singleton.
    ///
    /// Returns the conditions the parent must output and the eve coin.
    /// The parent asserts the launcher's announcement so that the launcher can't be spent any other way.
    pub fn spend<T>(
        self,
        ctx: &mut SpendContext,
        singleton_inner_puzzle_hash: TreeHash,
        key_value_list: T,
    ) -> Result<(Conditions, Coin), DriverError>
    where
        T: ToClvm<Allocator>,
    {
        let launcher_id = self.launcher_id();
        let singleton_puzzle_hash: Bytes32 = ctx
            .templates()
            .singleton_puzzle_hash(launcher_id, singleton_inner_puzzle_hash)
            .into();

        let puzzle = ctx.singleton_launcher()?;
        let solution = ctx.alloc(&LauncherSolution {
            singleton_puzzle_hash,
            amount: self.coin.amount,
            key_value_list,
        })?;
        let announcement = ctx.tree_hash(solution);

        ctx.spend(self.coin, Spend::new(puzzle, solution))?;

        let eve_coin = Coin::new(launcher_id, singleton_puzzle_hash, self.coin.amount);

        Ok((
            self.conditions
                .assert_coin_announcement(launcher_id, announcement.to_bytes()),
            eve_coin,
        ))
    }
}

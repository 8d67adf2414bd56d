use chia_protocol::{Bytes32, Coin, CoinSpend, Program};
use chia_puzzle_types::{singleton::SingletonSolution, EveProof, LineageProof, Proof};
use clvm_traits::{FromClvm, ToClvm};
use clvm_utils::{ToTreeHash, TreeHash};
use clvmr::{Allocator, NodePtr};
use message_singleton_types::{Conditions, MessageSolution};
use tracing::debug;

use crate::{
    DriverError, Launcher, Layer, MessageLayer, Puzzle, SingletonLayer, Spend, SpendContext,
};

/// The current coin of a message singleton and everything needed to spend it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingletonState {
    /// Identifies the lineage. It never changes after launch.
    pub launcher_id: Bytes32,

    /// The message the coin's puzzle is curried with. It's replaced wholesale by every spend.
    pub message: Program,

    /// The coin that created [`SingletonState::coin`]. For the eve singleton this is the launcher.
    pub parent_coin: Coin,

    pub coin: Coin,

    /// Proves to the singleton puzzle that the parent belonged to the same lineage.
    /// This is an [`EveProof`] when the parent is the launcher.
    pub proof: Proof,
}

impl SingletonState {
    /// Creates a launcher from the parent coin, spends it to create the eve singleton,
    /// and spends the eve singleton to commit the initial message.
    ///
    /// Returns the conditions the parent coin's spend must output and the state after the eve spend.
    pub fn launch<M>(
        ctx: &mut SpendContext,
        parent_coin_id: Bytes32,
        amount: u64,
        initial_message: M,
    ) -> Result<(Conditions, Self), DriverError>
    where
        M: ToClvm<Allocator>,
    {
        if amount % 2 == 0 {
            return Err(DriverError::EvenAmount(amount));
        }

        let launcher = Launcher::new(ctx.templates(), parent_coin_id, amount);
        let launcher_coin = launcher.coin();
        let eve_inner_puzzle_hash = ctx.templates().message_puzzle_hash(().tree_hash());

        let (conditions, eve_coin) = launcher.spend(ctx, eve_inner_puzzle_hash, ())?;

        let eve = Self {
            launcher_id: launcher_coin.coin_id(),
            message: ctx.serialize(&())?,
            parent_coin: launcher_coin,
            coin: eve_coin,
            proof: Proof::Eve(EveProof {
                parent_parent_coin_info: parent_coin_id,
                parent_amount: amount,
            }),
        };

        debug!("launching singleton {}", eve.launcher_id);

        let state = eve.set_message(ctx, initial_message, amount)?;

        Ok((conditions, state))
    }

    /// Recovers the state of `coin` from the spend of its parent.
    ///
    /// The parent's puzzle reveal commits to the previous message. The current message is the one
    /// the parent's solution passed on, which is only trusted once it reproduces the puzzle hash of `coin`.
    pub fn from_parent_spend(
        ctx: &mut SpendContext,
        parent_spend: &CoinSpend,
        coin: Coin,
    ) -> Result<Self, DriverError> {
        let parent_coin = parent_spend.coin;

        let puzzle_ptr = ctx.alloc(&parent_spend.puzzle_reveal)?;
        let parent_puzzle_hash: Bytes32 = ctx.tree_hash(puzzle_ptr).into();

        if parent_puzzle_hash != parent_coin.puzzle_hash {
            return Err(DriverError::PuzzleHashMismatch {
                expected: parent_coin.puzzle_hash,
                actual: parent_puzzle_hash,
            });
        }

        if ctx.templates().is_launcher(parent_coin.puzzle_hash) {
            return Err(DriverError::NotLaunched(parent_coin.coin_id()));
        }

        let puzzle = Puzzle::parse(&ctx.allocator, puzzle_ptr);

        let Some(singleton) =
            SingletonLayer::<Puzzle>::parse_puzzle(ctx.templates(), &ctx.allocator, puzzle)?
        else {
            return Err(DriverError::TemplateMismatch {
                expected: ctx.templates().singleton.hash().into(),
                found: puzzle.mod_hash().into(),
            });
        };

        if MessageLayer::<NodePtr>::parse_puzzle(
            ctx.templates(),
            &ctx.allocator,
            singleton.inner_puzzle,
        )?
        .is_none()
        {
            return Err(DriverError::TemplateMismatch {
                expected: ctx.templates().message.hash().into(),
                found: singleton.inner_puzzle.mod_hash().into(),
            });
        }

        let solution_ptr = ctx.alloc(&parent_spend.solution)?;
        let solution =
            SingletonLayer::<MessageLayer<NodePtr>>::parse_solution(&ctx.allocator, solution_ptr)?;
        let MessageSolution {
            new_message,
            amount,
        } = solution.inner_solution;

        let inner_puzzle_hash = ctx
            .templates()
            .message_puzzle_hash(ctx.tree_hash(new_message));
        let puzzle_hash: Bytes32 = ctx
            .templates()
            .singleton_puzzle_hash(singleton.launcher_id, inner_puzzle_hash)
            .into();

        if puzzle_hash != coin.puzzle_hash {
            return Err(DriverError::PuzzleHashMismatch {
                expected: puzzle_hash,
                actual: coin.puzzle_hash,
            });
        }

        if coin.parent_coin_info != parent_coin.coin_id() {
            return Err(DriverError::OrphanChild {
                parent_id: parent_coin.coin_id(),
                child_id: coin.coin_id(),
            });
        }

        if coin.amount != amount {
            return Err(DriverError::AmountMismatch {
                expected: amount,
                actual: coin.amount,
            });
        }

        debug!(
            "parsed spend of {} in lineage {}",
            parent_coin.coin_id(),
            singleton.launcher_id
        );

        Ok(Self {
            launcher_id: singleton.launcher_id,
            message: ctx.serialize(&new_message)?,
            parent_coin,
            coin,
            proof: Proof::Lineage(LineageProof {
                parent_parent_coin_info: parent_coin.parent_coin_info,
                parent_inner_puzzle_hash: singleton.inner_puzzle.curried_puzzle_hash().into(),
                parent_amount: parent_coin.amount,
            }),
        })
    }

    /// Decodes the message as any CLVM type.
    pub fn parse_message<T>(&self, ctx: &mut SpendContext) -> Result<T, DriverError>
    where
        T: FromClvm<Allocator>,
    {
        let message = ctx.alloc(&self.message)?;
        ctx.extract(message)
    }

    /// The puzzle hash of the message layer inside the singleton.
    pub fn inner_puzzle_hash(&self, ctx: &mut SpendContext) -> Result<TreeHash, DriverError> {
        let message = ctx.alloc(&self.message)?;
        Ok(ctx.templates().message_puzzle_hash(ctx.tree_hash(message)))
    }

    /// Spends the coin to replace the message, and returns the state of the child it creates.
    ///
    /// The puzzle is rebuilt from the message held in this state and must hash to the coin's puzzle hash.
    /// Nothing is added to the [`SpendContext`] if it doesn't.
    pub fn set_message<M>(
        &self,
        ctx: &mut SpendContext,
        new_message: M,
        amount: u64,
    ) -> Result<Self, DriverError>
    where
        M: ToClvm<Allocator>,
    {
        if amount % 2 == 0 {
            return Err(DriverError::EvenAmount(amount));
        }

        let message = ctx.alloc(&self.message)?;
        let layer = SingletonLayer::new(self.launcher_id, MessageLayer::new(message));

        let puzzle = layer.construct_puzzle(ctx)?;
        let puzzle_hash: Bytes32 = ctx.tree_hash(puzzle).into();

        if puzzle_hash != self.coin.puzzle_hash {
            return Err(DriverError::PuzzleHashMismatch {
                expected: self.coin.puzzle_hash,
                actual: puzzle_hash,
            });
        }

        let new_message = ctx.alloc(&new_message)?;
        let solution = layer.construct_solution(
            ctx,
            SingletonSolution {
                lineage_proof: self.proof,
                amount: self.coin.amount,
                inner_solution: MessageSolution::new(new_message, amount),
            },
        )?;

        ctx.spend(self.coin, Spend::new(puzzle, solution))?;

        let inner_puzzle_hash = ctx.templates().message_puzzle_hash(ctx.tree_hash(message));
        let child_inner_puzzle_hash = ctx
            .templates()
            .message_puzzle_hash(ctx.tree_hash(new_message));
        let child_puzzle_hash = ctx
            .templates()
            .singleton_puzzle_hash(self.launcher_id, child_inner_puzzle_hash);

        Ok(Self {
            launcher_id: self.launcher_id,
            message: ctx.serialize(&new_message)?,
            parent_coin: self.coin,
            coin: Coin::new(self.coin.coin_id(), child_puzzle_hash.into(), amount),
            proof: Proof::Lineage(LineageProof {
                parent_parent_coin_info: self.coin.parent_coin_info,
                parent_inner_puzzle_hash: inner_puzzle_hash.into(),
                parent_amount: self.coin.amount,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use chia_bls::Signature;
    use chia_protocol::SpendBundle;
    use message_singleton_test::{message_templates, to_program, to_puzzle, MockLedger};

    use super::*;

    fn launch(
        ledger: &MockLedger,
        ctx: &mut SpendContext,
        message: &str,
    ) -> anyhow::Result<SingletonState> {
        let (puzzle_hash, puzzle_reveal) = to_puzzle(1)?;
        let parent = ledger.mint_coin(puzzle_hash, 1);

        let (conditions, state) = SingletonState::launch(ctx, parent.coin_id(), 1, message)?;
        ctx.insert(CoinSpend::new(parent, puzzle_reveal, to_program(conditions)?));

        ledger.new_transaction(SpendBundle::new(ctx.take(), Signature::default()))?;

        Ok(state)
    }

    #[test]
    fn test_launch() -> anyhow::Result<()> {
        let ledger = MockLedger::new();
        let mut ctx = SpendContext::new(message_templates()?);

        let state = launch(&ledger, &mut ctx, "Hello, world!")?;

        assert_eq!(state.parse_message::<String>(&mut ctx)?, "Hello, world!");
        assert_eq!(state.parent_coin.parent_coin_info, state.launcher_id);
        assert_eq!(
            ledger.unspent_coins(state.coin.puzzle_hash),
            vec![state.coin]
        );

        let record = ledger
            .coin_record(state.launcher_id)
            .expect("missing launcher");
        assert!(record.spent);

        Ok(())
    }

    #[test]
    fn test_spends_match_tip_puzzle_hash() -> anyhow::Result<()> {
        let ledger = MockLedger::new();
        let mut ctx = SpendContext::new(message_templates()?);

        let mut state = launch(&ledger, &mut ctx, "first")?;

        for message in ["second", "third", "fourth"] {
            let child = state.set_message(&mut ctx, message, 1)?;

            let coin_spends = ctx.take();
            assert_eq!(coin_spends.len(), 1);
            assert_eq!(coin_spends[0].coin, state.coin);
            let puzzle_reveal = ctx.alloc(&coin_spends[0].puzzle_reveal)?;
            assert_eq!(
                Bytes32::from(ctx.tree_hash(puzzle_reveal)),
                state.coin.puzzle_hash
            );

            ledger.new_transaction(SpendBundle::new(coin_spends, Signature::default()))?;

            let parent_spend = ledger
                .coin_spend(state.coin.coin_id())
                .expect("missing spend");
            let parsed = SingletonState::from_parent_spend(&mut ctx, &parent_spend, child.coin)?;
            assert_eq!(parsed, child);
            assert_eq!(parsed.parse_message::<String>(&mut ctx)?, message);

            state = child;
        }

        Ok(())
    }

    #[test]
    fn test_even_amount() -> anyhow::Result<()> {
        let mut ctx = SpendContext::new(message_templates()?);

        assert!(matches!(
            SingletonState::launch(&mut ctx, Bytes32::default(), 2, "hi"),
            Err(DriverError::EvenAmount(2))
        ));
        assert_eq!(ctx.iter().count(), 0);

        Ok(())
    }

    #[test]
    fn test_stale_state_emits_nothing() -> anyhow::Result<()> {
        let ledger = MockLedger::new();
        let mut ctx = SpendContext::new(message_templates()?);

        let mut state = launch(&ledger, &mut ctx, "Hello, world!")?;
        state.message = to_program("something else")?;

        let result = state.set_message(&mut ctx, "Goodbye, world!", 1);

        assert!(matches!(
            result,
            Err(DriverError::PuzzleHashMismatch { expected, .. }) if expected == state.coin.puzzle_hash
        ));
        assert_eq!(ctx.iter().count(), 0);

        Ok(())
    }

    #[test]
    fn test_launcher_spend_is_not_launched() -> anyhow::Result<()> {
        let ledger = MockLedger::new();
        let mut ctx = SpendContext::new(message_templates()?);

        let state = launch(&ledger, &mut ctx, "Hello, world!")?;

        let launcher_spend = ledger
            .coin_spend(state.launcher_id)
            .expect("missing launcher spend");

        let result = SingletonState::from_parent_spend(&mut ctx, &launcher_spend, state.parent_coin);
        assert!(matches!(result, Err(DriverError::NotLaunched(id)) if id == state.launcher_id));

        Ok(())
    }

    #[test]
    fn test_tip_must_match_parent_solution() -> anyhow::Result<()> {
        let ledger = MockLedger::new();
        let mut ctx = SpendContext::new(message_templates()?);

        let state = launch(&ledger, &mut ctx, "Hello, world!")?;
        let parent_spend = ledger
            .coin_spend(state.parent_coin.coin_id())
            .expect("missing eve spend");

        let wrong_amount = Coin::new(state.coin.parent_coin_info, state.coin.puzzle_hash, 3);
        assert!(matches!(
            SingletonState::from_parent_spend(&mut ctx, &parent_spend, wrong_amount),
            Err(DriverError::AmountMismatch {
                expected: 1,
                actual: 3
            })
        ));

        let wrong_parent = Coin::new(Bytes32::default(), state.coin.puzzle_hash, 1);
        assert!(matches!(
            SingletonState::from_parent_spend(&mut ctx, &parent_spend, wrong_parent),
            Err(DriverError::OrphanChild { .. })
        ));

        let wrong_puzzle = Coin::new(state.coin.parent_coin_info, Bytes32::default(), 1);
        assert!(matches!(
            SingletonState::from_parent_spend(&mut ctx, &parent_spend, wrong_puzzle),
            Err(DriverError::PuzzleHashMismatch { .. })
        ));

        Ok(())
    }

    #[test]
    fn test_reveal_must_match_parent() -> anyhow::Result<()> {
        let ledger = MockLedger::new();
        let mut ctx = SpendContext::new(message_templates()?);

        let state = launch(&ledger, &mut ctx, "Hello, world!")?;
        let mut parent_spend = ledger
            .coin_spend(state.parent_coin.coin_id())
            .expect("missing eve spend");
        parent_spend.puzzle_reveal = to_program(1)?;

        assert!(matches!(
            SingletonState::from_parent_spend(&mut ctx, &parent_spend, state.coin),
            Err(DriverError::PuzzleHashMismatch { .. })
        ));

        Ok(())
    }

    #[test]
    fn test_plain_coin_is_template_mismatch() -> anyhow::Result<()> {
        let ledger = MockLedger::new();
        let mut ctx = SpendContext::new(message_templates()?);

        let (puzzle_hash, puzzle_reveal) = to_puzzle(1)?;
        let parent = ledger.mint_coin(puzzle_hash, 1);
        let parent_spend = CoinSpend::new(
            parent,
            puzzle_reveal,
            to_program(Conditions::new().create_coin(puzzle_hash, 1))?,
        );

        let error = SingletonState::from_parent_spend(
            &mut ctx,
            &parent_spend,
            Coin::new(parent.coin_id(), puzzle_hash, 1),
        )
        .expect_err("plain coins are not singletons");

        assert_eq!(error.kind(), crate::ErrorKind::TemplateMismatch);

        Ok(())
    }
}

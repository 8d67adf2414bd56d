use chia_protocol::Bytes32;
use message_singleton_coinset::{CoinRecord, Ledger};
use tracing::{debug, info};

use crate::{DriverError, SingletonState, SpendContext};

/// The progress of a walk from an anchor coin down to the tip of its lineage.
///
/// A walk starts with `parent` and `current` both set to the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    Walking {
        parent: CoinRecord,
        current: CoinRecord,
    },
    Synced {
        parent: CoinRecord,
        current: CoinRecord,
    },
}

impl WalkState {
    pub fn new(anchor: CoinRecord) -> Self {
        Self::Walking {
            parent: anchor,
            current: anchor,
        }
    }

    /// The coin whose children should be queried next, or [`None`] once synced.
    pub fn pending(&self) -> Option<Bytes32> {
        match self {
            Self::Walking { current, .. } => Some(current.coin.coin_id()),
            Self::Synced { .. } => None,
        }
    }

    /// Advances the walk given every child of the current coin.
    pub fn step(self, children: &[CoinRecord]) -> Result<Self, DriverError> {
        let Self::Walking { parent, current } = self else {
            return Ok(self);
        };

        let coin_id = current.coin.coin_id();

        match children {
            [] => Ok(Self::Synced { parent, current }),
            [child] => {
                if child.coin.parent_coin_info != coin_id {
                    return Err(DriverError::OrphanChild {
                        parent_id: coin_id,
                        child_id: child.coin.coin_id(),
                    });
                }

                Ok(Self::Walking {
                    parent: current,
                    current: *child,
                })
            }
            _ => Err(DriverError::MultipleChildren {
                coin_id,
                count: children.len(),
            }),
        }
    }
}

/// The end of a walk. `parent` and `tip` are both the anchor if it has no children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncedChain {
    pub anchor: CoinRecord,
    pub parent: CoinRecord,
    pub tip: CoinRecord,
}

/// Follows the lineage from the anchor until a coin with no children is found.
///
/// Makes one child query per coin in the lineage, including the tip.
pub async fn walk_lineage<L>(ledger: &L, anchor: Bytes32) -> Result<SyncedChain, DriverError>
where
    L: Ledger,
{
    let Some(anchor_record) = ledger.coin_record_by_id(anchor).await? else {
        return Err(DriverError::NotLaunched(anchor));
    };

    let mut state = WalkState::new(anchor_record);
    let mut depth = 0;

    while let Some(coin_id) = state.pending() {
        let children = ledger
            .coin_records_by_parent_ids(vec![coin_id], true)
            .await?;

        debug!(
            "coin {coin_id} at depth {depth} has {} children",
            children.len()
        );

        state = state.step(&children)?;
        depth += 1;
    }

    let (WalkState::Walking { parent, current } | WalkState::Synced { parent, current }) = state;

    Ok(SyncedChain {
        anchor: anchor_record,
        parent,
        tip: current,
    })
}

/// Walks from the anchor to the tip and recovers the tip's message and lineage proof.
///
/// The anchor is usually the launcher id, but any coin in the lineage works.
pub async fn sync<L>(
    ledger: &L,
    ctx: &mut SpendContext,
    anchor: Bytes32,
) -> Result<SingletonState, DriverError>
where
    L: Ledger,
{
    let chain = walk_lineage(ledger, anchor).await?;
    let tip = chain.tip;

    if ctx.templates().is_launcher(tip.coin.puzzle_hash) {
        return Err(DriverError::NotLaunched(tip.coin.coin_id()));
    }

    if tip.spent {
        return Err(DriverError::LineageTerminated(tip.coin.coin_id()));
    }

    let parent = if chain.parent == tip {
        ledger
            .coin_record_by_id(tip.coin.parent_coin_info)
            .await?
            .ok_or(DriverError::UnknownCoin(tip.coin.parent_coin_info))?
    } else {
        chain.parent
    };

    if !parent.spent {
        return Err(DriverError::UnspentParent(parent.coin.coin_id()));
    }

    let parent_spend = ledger
        .spend_record(parent.coin.coin_id(), parent.spent_block_index)
        .await?;

    let state = SingletonState::from_parent_spend(ctx, &parent_spend, tip.coin)?;

    if ctx.templates().is_launcher(chain.anchor.coin.puzzle_hash) && state.launcher_id != anchor {
        return Err(DriverError::LauncherMismatch {
            expected: anchor,
            found: state.launcher_id,
        });
    }

    info!(
        "synced singleton {} to coin {}",
        state.launcher_id,
        state.coin.coin_id()
    );

    Ok(state)
}

#[cfg(test)]
mod tests {
    use chia_bls::Signature;
    use chia_protocol::{Coin, CoinSpend, SpendBundle};
    use chia_puzzle_types::Proof;
    use message_singleton_test::{message_templates, to_program, to_puzzle, MockLedger};

    use crate::ErrorKind;

    use super::*;

    fn record(coin: Coin, spent: bool) -> CoinRecord {
        CoinRecord {
            coin,
            coinbase: false,
            confirmed_block_index: 1,
            spent,
            spent_block_index: u32::from(spent) * 2,
            timestamp: 0,
        }
    }

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

    fn update(
        ledger: &MockLedger,
        ctx: &mut SpendContext,
        state: &SingletonState,
        message: &str,
    ) -> anyhow::Result<SingletonState> {
        let child = state.set_message(ctx, message, 1)?;
        ledger.new_transaction(SpendBundle::new(ctx.take(), Signature::default()))?;
        Ok(child)
    }

    #[test]
    fn test_step() {
        let anchor = Coin::new(Bytes32::default(), Bytes32::new([1; 32]), 1);
        let child = Coin::new(anchor.coin_id(), Bytes32::new([2; 32]), 1);

        let state = WalkState::new(record(anchor, true));
        assert_eq!(state.pending(), Some(anchor.coin_id()));

        let state = state.step(&[record(child, false)]).expect("single child");
        assert_eq!(
            state,
            WalkState::Walking {
                parent: record(anchor, true),
                current: record(child, false),
            }
        );

        let state = state.step(&[]).expect("no children");
        assert_eq!(state.pending(), None);
        assert_eq!(
            state,
            WalkState::Synced {
                parent: record(anchor, true),
                current: record(child, false),
            }
        );
    }

    #[test]
    fn test_step_rejects_foreign_child() {
        let anchor = Coin::new(Bytes32::default(), Bytes32::new([1; 32]), 1);
        let stranger = Coin::new(Bytes32::new([9; 32]), Bytes32::new([2; 32]), 1);

        let result = WalkState::new(record(anchor, true)).step(&[record(stranger, false)]);
        assert!(matches!(result, Err(DriverError::OrphanChild { .. })));
    }

    #[tokio::test]
    async fn test_sync_end_to_end() -> anyhow::Result<()> {
        let ledger = MockLedger::new();
        let mut ctx = SpendContext::new(message_templates()?);

        let launched = launch(&ledger, &mut ctx, "Hello, world!")?;

        let state = sync(&ledger, &mut ctx, launched.launcher_id).await?;
        assert_eq!(state, launched);
        assert_eq!(state.parse_message::<String>(&mut ctx)?, "Hello, world!");

        update(&ledger, &mut ctx, &state, "Goodbye, world!")?;

        let next = sync(&ledger, &mut ctx, launched.launcher_id).await?;
        assert_eq!(next.parse_message::<String>(&mut ctx)?, "Goodbye, world!");
        assert_eq!(next.launcher_id, launched.launcher_id);
        assert_eq!(next.parent_coin, state.coin);
        assert_eq!(next.coin.parent_coin_info, state.coin.coin_id());

        let Proof::Lineage(proof) = next.proof else {
            panic!("expected a lineage proof");
        };
        assert_eq!(proof.parent_parent_coin_info, state.coin.parent_coin_info);
        assert_eq!(proof.parent_amount, state.coin.amount);
        assert_eq!(
            Bytes32::from(state.inner_puzzle_hash(&mut ctx)?),
            proof.parent_inner_puzzle_hash
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_walk_queries_once_per_coin() -> anyhow::Result<()> {
        let ledger = MockLedger::new();
        let mut ctx = SpendContext::new(message_templates()?);

        let mut state = launch(&ledger, &mut ctx, "0")?;

        for i in 1..=3 {
            state = update(&ledger, &mut ctx, &state, &i.to_string())?;
        }

        let before = ledger.children_queries();
        let chain = walk_lineage(&ledger, state.launcher_id).await?;

        // Launcher, eve, three updates, and the tip itself.
        assert_eq!(ledger.children_queries() - before, 6);
        assert_eq!(chain.tip.coin, state.coin);
        assert_eq!(chain.parent.coin, state.parent_coin);

        Ok(())
    }

    #[tokio::test]
    async fn test_zero_length_chain() -> anyhow::Result<()> {
        let ledger = MockLedger::new();
        let mut ctx = SpendContext::new(message_templates()?);

        let state = launch(&ledger, &mut ctx, "Hello, world!")?;

        let chain = walk_lineage(&ledger, state.coin.coin_id()).await?;
        assert_eq!(chain.parent, chain.anchor);
        assert_eq!(chain.tip, chain.anchor);
        assert_eq!(chain.tip.coin, state.coin);

        let synced = sync(&ledger, &mut ctx, state.coin.coin_id()).await?;
        assert_eq!(synced, state);

        Ok(())
    }

    #[tokio::test]
    async fn test_multiple_children() -> anyhow::Result<()> {
        let ledger = MockLedger::new();
        let mut ctx = SpendContext::new(message_templates()?);

        let state = launch(&ledger, &mut ctx, "Hello, world!")?;
        let eve_id = state.parent_coin.coin_id();
        ledger.insert_coin(Coin::new(eve_id, Bytes32::new([7; 32]), 3));

        let error = sync(&ledger, &mut ctx, state.launcher_id)
            .await
            .expect_err("two children must not be resolved");

        assert!(matches!(
            error,
            DriverError::MultipleChildren { coin_id, count: 2 } if coin_id == eve_id
        ));
        assert_eq!(error.kind(), ErrorKind::ProtocolInconsistency);

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_anchor() -> anyhow::Result<()> {
        let ledger = MockLedger::new();
        let mut ctx = SpendContext::new(message_templates()?);

        let error = sync(&ledger, &mut ctx, Bytes32::new([3; 32]))
            .await
            .expect_err("nothing was launched");
        assert_eq!(error.kind(), ErrorKind::NotLaunched);

        Ok(())
    }

    #[tokio::test]
    async fn test_unspent_launcher() -> anyhow::Result<()> {
        let ledger = MockLedger::new();
        let mut ctx = SpendContext::new(message_templates()?);

        let launcher = ledger.mint_coin(ctx.templates().launcher.hash().into(), 1);

        let error = sync(&ledger, &mut ctx, launcher.coin_id())
            .await
            .expect_err("the launcher has not been spent");
        assert!(matches!(error, DriverError::NotLaunched(id) if id == launcher.coin_id()));

        Ok(())
    }

    #[tokio::test]
    async fn test_eve_not_spent() -> anyhow::Result<()> {
        let ledger = MockLedger::new();
        let mut ctx = SpendContext::new(message_templates()?);

        let (puzzle_hash, puzzle_reveal) = to_puzzle(1)?;
        let parent = ledger.mint_coin(puzzle_hash, 1);

        let launcher = crate::Launcher::new(ctx.templates(), parent.coin_id(), 1);
        let launcher_id = launcher.launcher_id();
        let eve_inner_puzzle_hash = ctx
            .templates()
            .message_puzzle_hash(clvm_utils::ToTreeHash::tree_hash(&()));
        let (conditions, _eve) = launcher.spend(&mut ctx, eve_inner_puzzle_hash, ())?;
        ctx.insert(CoinSpend::new(parent, puzzle_reveal, to_program(conditions)?));
        ledger.new_transaction(SpendBundle::new(ctx.take(), Signature::default()))?;

        let error = sync(&ledger, &mut ctx, launcher_id)
            .await
            .expect_err("the eve singleton has no message yet");
        assert!(matches!(error, DriverError::NotLaunched(id) if id == launcher_id));

        Ok(())
    }

    #[tokio::test]
    async fn test_offline_ledger() -> anyhow::Result<()> {
        let ledger = MockLedger::new();
        let mut ctx = SpendContext::new(message_templates()?);

        let state = launch(&ledger, &mut ctx, "Hello, world!")?;
        ledger.set_offline(true);

        let error = sync(&ledger, &mut ctx, state.launcher_id)
            .await
            .expect_err("the ledger is offline");
        assert_eq!(error.kind(), ErrorKind::LedgerQueryFailure);

        ledger.set_offline(false);
        assert_eq!(sync(&ledger, &mut ctx, state.launcher_id).await?, state);

        Ok(())
    }
}

use chia_protocol::Bytes32;
use chia_puzzle_types::singleton::{SingletonArgs, SingletonSolution};
use clvm_traits::FromClvm;
use clvm_utils::CurriedProgram;
use clvmr::{Allocator, NodePtr};
use message_singleton_types::SingletonTemplates;

use crate::{DriverError, Layer, Puzzle, SpendContext};

/// The singleton top layer, which guarantees a single live descendant per generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingletonLayer<I> {
    pub launcher_id: Bytes32,
    pub inner_puzzle: I,
}

impl<I> SingletonLayer<I> {
    pub fn new(launcher_id: Bytes32, inner_puzzle: I) -> Self {
        Self {
            launcher_id,
            inner_puzzle,
        }
    }
}

impl<I> Layer for SingletonLayer<I>
where
    I: Layer,
{
    type Solution = SingletonSolution<I::Solution>;

    fn parse_puzzle(
        templates: &SingletonTemplates,
        allocator: &Allocator,
        puzzle: Puzzle,
    ) -> Result<Option<Self>, DriverError> {
        let Some(puzzle) = puzzle.as_curried() else {
            return Ok(None);
        };

        if puzzle.mod_hash != templates.singleton.hash() {
            return Ok(None);
        }

        let args = SingletonArgs::<NodePtr>::from_clvm(allocator, puzzle.args)?;

        if args.singleton_struct.mod_hash != templates.singleton.hash().into()
            || args.singleton_struct.launcher_puzzle_hash != templates.launcher.hash().into()
        {
            return Err(DriverError::InvalidSingletonStruct);
        }

        let Some(inner_puzzle) = I::parse_puzzle(
            templates,
            allocator,
            Puzzle::parse(allocator, args.inner_puzzle),
        )?
        else {
            return Ok(None);
        };

        Ok(Some(Self {
            launcher_id: args.singleton_struct.launcher_id,
            inner_puzzle,
        }))
    }

    fn parse_solution(
        allocator: &Allocator,
        solution: NodePtr,
    ) -> Result<Self::Solution, DriverError> {
        let solution = SingletonSolution::<NodePtr>::from_clvm(allocator, solution)?;
        let inner_solution = I::parse_solution(allocator, solution.inner_solution)?;
        Ok(SingletonSolution {
            lineage_proof: solution.lineage_proof,
            amount: solution.amount,
            inner_solution,
        })
    }

    fn construct_puzzle(&self, ctx: &mut SpendContext) -> Result<NodePtr, DriverError> {
        let inner_puzzle = self.inner_puzzle.construct_puzzle(ctx)?;
        let curried = CurriedProgram {
            program: ctx.singleton_top_layer()?,
            args: SingletonArgs {
                singleton_struct: ctx.templates().singleton_struct(self.launcher_id),
                inner_puzzle,
            },
        };
        ctx.alloc(&curried)
    }

    fn construct_solution(
        &self,
        ctx: &mut SpendContext,
        solution: Self::Solution,
    ) -> Result<NodePtr, DriverError> {
        let inner_solution = self
            .inner_puzzle
            .construct_solution(ctx, solution.inner_solution)?;
        ctx.alloc(&SingletonSolution {
            lineage_proof: solution.lineage_proof,
            amount: solution.amount,
            inner_solution,
        })
    }
}

#[cfg(test)]
mod tests {
    use chia_puzzle_types::{EveProof, Proof};
    use message_singleton_test::message_templates;

    use super::*;

    #[test]
    fn test_singleton_layer_round_trip() -> anyhow::Result<()> {
        let mut ctx = SpendContext::new(message_templates()?);
        let launcher_id = Bytes32::new([1; 32]);

        let inner = ctx.alloc(&1)?;
        let layer = SingletonLayer::new(launcher_id, Puzzle::parse(&ctx.allocator, inner));
        let puzzle = layer.construct_puzzle(&mut ctx)?;

        assert_eq!(
            ctx.tree_hash(puzzle),
            ctx.templates()
                .singleton_puzzle_hash(launcher_id, ctx.tree_hash(inner))
        );

        let parsed = SingletonLayer::<Puzzle>::parse_puzzle(
            ctx.templates(),
            &ctx.allocator,
            Puzzle::parse(&ctx.allocator, puzzle),
        )?
        .expect("not a singleton");

        assert_eq!(parsed.launcher_id, launcher_id);
        assert_eq!(parsed.inner_puzzle, layer.inner_puzzle);

        let proof = Proof::Eve(EveProof {
            parent_parent_coin_info: Bytes32::new([2; 32]),
            parent_amount: 1,
        });
        let inner_solution = ctx.alloc(&())?;
        let solution = layer.construct_solution(
            &mut ctx,
            SingletonSolution {
                lineage_proof: proof,
                amount: 1,
                inner_solution,
            },
        )?;

        let parsed = SingletonLayer::<Puzzle>::parse_solution(&ctx.allocator, solution)?;
        assert_eq!(parsed.lineage_proof, proof);
        assert_eq!(parsed.amount, 1);

        Ok(())
    }

    #[test]
    fn test_other_template_is_not_a_singleton() -> anyhow::Result<()> {
        let mut ctx = SpendContext::new(message_templates()?);

        let launcher = ctx.singleton_launcher()?;
        let puzzle = Puzzle::parse(&ctx.allocator, launcher);

        assert!(
            SingletonLayer::<Puzzle>::parse_puzzle(ctx.templates(), &ctx.allocator, puzzle)?
                .is_none()
        );

        Ok(())
    }

    #[test]
    fn test_invalid_singleton_struct() -> anyhow::Result<()> {
        let mut ctx = SpendContext::new(message_templates()?);

        let program = ctx.singleton_top_layer()?;
        let mut singleton_struct = ctx.templates().singleton_struct(Bytes32::default());
        singleton_struct.launcher_puzzle_hash = Bytes32::new([9; 32]);

        let puzzle = ctx.alloc(&CurriedProgram {
            program,
            args: SingletonArgs {
                singleton_struct,
                inner_puzzle: 1,
            },
        })?;

        assert!(matches!(
            SingletonLayer::<Puzzle>::parse_puzzle(
                ctx.templates(),
                &ctx.allocator,
                Puzzle::parse(&ctx.allocator, puzzle)
            ),
            Err(DriverError::InvalidSingletonStruct)
        ));

        Ok(())
    }
}

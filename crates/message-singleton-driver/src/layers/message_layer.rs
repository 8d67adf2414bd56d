use clvm_traits::{FromClvm, ToClvm};
use clvm_utils::CurriedProgram;
use clvmr::{Allocator, NodePtr};
use message_singleton_types::{MessageArgs, MessageSolution, SingletonTemplates};

use crate::{DriverError, Layer, Puzzle, SpendContext};

/// The inner puzzle that holds the message and recreates itself with a new one when spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLayer<M> {
    pub message: M,
}

impl<M> MessageLayer<M> {
    pub fn new(message: M) -> Self {
        Self { message }
    }
}

impl<M> Layer for MessageLayer<M>
where
    M: ToClvm<Allocator> + FromClvm<Allocator>,
{
    type Solution = MessageSolution<M>;

    fn parse_puzzle(
        templates: &SingletonTemplates,
        allocator: &Allocator,
        puzzle: Puzzle,
    ) -> Result<Option<Self>, DriverError> {
        let Some(puzzle) = puzzle.as_curried() else {
            return Ok(None);
        };

        if puzzle.mod_hash != templates.message.hash() {
            return Ok(None);
        }

        let args = MessageArgs::<M>::from_clvm(allocator, puzzle.args)?;

        if args.mod_hash != templates.message.hash().into() {
            return Err(DriverError::TemplateMismatch {
                expected: templates.message.hash().into(),
                found: args.mod_hash,
            });
        }

        Ok(Some(Self::new(args.message)))
    }

    fn parse_solution(
        allocator: &Allocator,
        solution: NodePtr,
    ) -> Result<Self::Solution, DriverError> {
        Ok(MessageSolution::<M>::from_clvm(allocator, solution)?)
    }

    fn construct_puzzle(&self, ctx: &mut SpendContext) -> Result<NodePtr, DriverError> {
        let message = ctx.alloc(&self.message)?;
        let curried = CurriedProgram {
            program: ctx.message_puzzle()?,
            args: MessageArgs::new(ctx.templates().message.hash().into(), message),
        };
        ctx.alloc(&curried)
    }

    fn construct_solution(
        &self,
        ctx: &mut SpendContext,
        solution: Self::Solution,
    ) -> Result<NodePtr, DriverError> {
        ctx.alloc(&solution)
    }
}

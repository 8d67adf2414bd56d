use clvmr::{Allocator, NodePtr};
use message_singleton_types::SingletonTemplates;

use crate::{DriverError, Puzzle, Spend, SpendContext};

/// An individual layer in a puzzle's hierarchy.
pub trait Layer {
    /// Usually the CLVM type of the solution, but it can be any helper that
    /// [`Layer::construct_solution`] and [`Layer::parse_solution`] know how to convert.
    type Solution;

    /// Parses this layer from the given puzzle, returning [`None`] if the puzzle wasn't curried from this layer's template.
    /// An error is returned if the template matched but its arguments are wrong.
    fn parse_puzzle(
        templates: &SingletonTemplates,
        allocator: &Allocator,
        puzzle: Puzzle,
    ) -> Result<Option<Self>, DriverError>
    where
        Self: Sized;

    fn parse_solution(
        allocator: &Allocator,
        solution: NodePtr,
    ) -> Result<Self::Solution, DriverError>;

    /// Constructs the full curried puzzle for this layer from the templates in the [`SpendContext`].
    fn construct_puzzle(&self, ctx: &mut SpendContext) -> Result<NodePtr, DriverError>;

    fn construct_solution(
        &self,
        ctx: &mut SpendContext,
        solution: Self::Solution,
    ) -> Result<NodePtr, DriverError>;

    /// Constructs the puzzle and solution together.
    fn construct_spend(
        &self,
        ctx: &mut SpendContext,
        solution: Self::Solution,
    ) -> Result<Spend, DriverError> {
        let puzzle = self.construct_puzzle(ctx)?;
        let solution = self.construct_solution(ctx, solution)?;
        Ok(Spend::new(puzzle, solution))
    }
}

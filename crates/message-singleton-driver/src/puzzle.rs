use clvm_traits::{FromClvm, FromClvmError, MatchByte};
use clvm_utils::{tree_hash, CurriedProgram, ToTreeHash, TreeHash};
use clvmr::{Allocator, NodePtr};
use message_singleton_types::SingletonTemplates;

use crate::{DriverError, Layer, SpendContext};

/// A puzzle that has been split into its template and curried arguments, if it has any.
/// Equality is by tree hash.
#[derive(Debug, Clone, Copy)]
pub enum Puzzle {
    Curried(CurriedPuzzle),
    Raw(RawPuzzle),
}

impl Puzzle {
    pub fn parse(allocator: &Allocator, puzzle: NodePtr) -> Self {
        CurriedPuzzle::parse(allocator, puzzle).map_or_else(
            || {
                Self::Raw(RawPuzzle {
                    puzzle_hash: tree_hash(allocator, puzzle),
                    ptr: puzzle,
                })
            },
            Self::Curried,
        )
    }

    pub fn curried_puzzle_hash(&self) -> TreeHash {
        match self {
            Self::Curried(curried) => curried.curried_puzzle_hash,
            Self::Raw(raw) => raw.puzzle_hash,
        }
    }

    /// The hash of the template, which is the puzzle itself when nothing is curried.
    pub fn mod_hash(&self) -> TreeHash {
        match self {
            Self::Curried(curried) => curried.mod_hash,
            Self::Raw(raw) => raw.puzzle_hash,
        }
    }

    pub fn ptr(&self) -> NodePtr {
        match self {
            Self::Curried(curried) => curried.curried_ptr,
            Self::Raw(raw) => raw.ptr,
        }
    }

    pub fn as_curried(&self) -> Option<CurriedPuzzle> {
        match self {
            Self::Curried(curried) => Some(*curried),
            Self::Raw(_raw) => None,
        }
    }
}

impl PartialEq for Puzzle {
    fn eq(&self, other: &Self) -> bool {
        self.curried_puzzle_hash() == other.curried_puzzle_hash()
    }
}

impl Eq for Puzzle {}

impl FromClvm<Allocator> for Puzzle {
    fn from_clvm(allocator: &Allocator, puzzle: NodePtr) -> Result<Self, FromClvmError> {
        Ok(Self::parse(allocator, puzzle))
    }
}

impl ToTreeHash for Puzzle {
    fn tree_hash(&self) -> TreeHash {
        self.curried_puzzle_hash()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CurriedPuzzle {
    pub curried_puzzle_hash: TreeHash,
    pub curried_ptr: NodePtr,
    pub mod_hash: TreeHash,
    pub args: NodePtr,
}

impl CurriedPuzzle {
    pub fn parse(allocator: &Allocator, puzzle: NodePtr) -> Option<Self> {
        let curried = CurriedProgram::<NodePtr, NodePtr>::from_clvm(allocator, puzzle).ok()?;
        let mod_hash = tree_hash(allocator, curried.program);
        let curried_puzzle_hash = CurriedProgram {
            program: mod_hash,
            args: tree_hash(allocator, curried.args),
        }
        .tree_hash();

        Some(Self {
            curried_puzzle_hash,
            curried_ptr: puzzle,
            mod_hash,
            args: curried.args,
        })
    }

    /// The curried arguments in order, or [`None`] if the environment was not built by currying.
    pub fn arg_list(&self, allocator: &Allocator) -> Option<Vec<NodePtr>> {
        let mut args = Vec::new();
        let mut env = self.args;

        while MatchByte::<1>::from_clvm(allocator, env).is_err() {
            let (_, ((_, arg), (rest, ()))) =
                <(MatchByte<4>, ((MatchByte<1>, NodePtr), (NodePtr, ())))>::from_clvm(
                    allocator, env,
                )
                .ok()?;
            args.push(arg);
            env = rest;
        }

        Some(args)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RawPuzzle {
    pub puzzle_hash: TreeHash,
    pub ptr: NodePtr,
}

/// Binds the arguments to the template in order.
pub fn curry(
    ctx: &mut SpendContext,
    template: NodePtr,
    args: &[NodePtr],
) -> Result<NodePtr, DriverError> {
    let mut env = ctx.alloc(&1u8)?;

    for &arg in args.iter().rev() {
        env = ctx.alloc(&(4u8, ((1u8, arg), (env, ()))))?;
    }

    ctx.alloc(&CurriedProgram {
        program: template,
        args: env,
    })
}

/// Recovers the template hash and argument list of a curried puzzle.
/// Returns [`None`] if the puzzle is not a curried instance of anything.
pub fn uncurry(allocator: &Allocator, puzzle: NodePtr) -> Option<(TreeHash, Vec<NodePtr>)> {
    let curried = CurriedPuzzle::parse(allocator, puzzle)?;
    let args = curried.arg_list(allocator)?;
    Some((curried.mod_hash, args))
}

impl Layer for Puzzle {
    type Solution = NodePtr;

    fn parse_puzzle(
        _templates: &SingletonTemplates,
        _allocator: &Allocator,
        puzzle: Puzzle,
    ) -> Result<Option<Self>, DriverError>
    where
        Self: Sized,
    {
        Ok(Some(puzzle))
    }

    fn parse_solution(
        _allocator: &Allocator,
        solution: NodePtr,
    ) -> Result<Self::Solution, DriverError> {
        Ok(solution)
    }

    fn construct_puzzle(&self, _ctx: &mut SpendContext) -> Result<NodePtr, DriverError> {
        Ok(self.ptr())
    }

    fn construct_solution(
        &self,
        _ctx: &mut SpendContext,
        solution: Self::Solution,
    ) -> Result<NodePtr, DriverError> {
        Ok(solution)
    }
}

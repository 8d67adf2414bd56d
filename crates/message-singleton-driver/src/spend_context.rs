use std::collections::HashMap;

use chia_protocol::{Coin, CoinSpend, Program};
use clvm_traits::{FromClvm, ToClvm};
use clvm_utils::{tree_hash, TreeHash};
use clvmr::{run_program, serde::node_from_bytes, Allocator, ChiaDialect, NodePtr};
use message_singleton_types::{PuzzleTemplate, SingletonTemplates};

use crate::{DriverError, Spend};

const MAX_COST: u64 = 11_000_000_000;

/// A wrapper around [`Allocator`] that caches template puzzles and keeps track of a list of [`CoinSpend`].
/// It also carries the templates every puzzle in the lineage is curried from.
#[derive(Debug)]
pub struct SpendContext {
    pub allocator: Allocator,
    templates: SingletonTemplates,
    puzzles: HashMap<TreeHash, NodePtr>,
    coin_spends: Vec<CoinSpend>,
}

impl SpendContext {
    pub fn new(templates: SingletonTemplates) -> Self {
        Self {
            allocator: Allocator::new(),
            templates,
            puzzles: HashMap::new(),
            coin_spends: Vec::new(),
        }
    }

    pub fn templates(&self) -> &SingletonTemplates {
        &self.templates
    }

    pub fn iter(&self) -> impl Iterator<Item = &CoinSpend> {
        self.coin_spends.iter()
    }

    /// Remove all of the [`CoinSpend`] that have been collected so far.
    pub fn take(&mut self) -> Vec<CoinSpend> {
        std::mem::take(&mut self.coin_spends)
    }

    /// Adds a [`CoinSpend`] to the collection.
    pub fn insert(&mut self, coin_spend: CoinSpend) {
        self.coin_spends.push(coin_spend);
    }

    /// Serializes a [`Spend`] and adds it to the list of [`CoinSpend`].
    pub fn spend(&mut self, coin: Coin, spend: Spend) -> Result<(), DriverError> {
        let puzzle_reveal = self.serialize(&spend.puzzle)?;
        let solution = self.serialize(&spend.solution)?;
        self.insert(CoinSpend::new(coin, puzzle_reveal, solution));
        Ok(())
    }

    pub fn alloc<T>(&mut self, value: &T) -> Result<NodePtr, DriverError>
    where
        T: ToClvm<Allocator>,
    {
        Ok(value.to_clvm(&mut self.allocator)?)
    }

    pub fn extract<T>(&self, ptr: NodePtr) -> Result<T, DriverError>
    where
        T: FromClvm<Allocator>,
    {
        Ok(T::from_clvm(&self.allocator, ptr)?)
    }

    pub fn tree_hash(&self, ptr: NodePtr) -> TreeHash {
        tree_hash(&self.allocator, ptr)
    }

    /// Run a puzzle with a solution and return the output.
    pub fn run(&mut self, puzzle: NodePtr, solution: NodePtr) -> Result<NodePtr, DriverError> {
        Ok(run_program(
            &mut self.allocator,
            &ChiaDialect::new(0),
            puzzle,
            solution,
            MAX_COST,
        )?
        .1)
    }

    pub fn serialize<T>(&mut self, value: &T) -> Result<Program, DriverError>
    where
        T: ToClvm<Allocator>,
    {
        let ptr = value.to_clvm(&mut self.allocator)?;
        Ok(Program::from_clvm(&self.allocator, ptr)?)
    }

    pub fn singleton_launcher(&mut self) -> Result<NodePtr, DriverError> {
        self.template_puzzle(|templates| &templates.launcher)
    }

    pub fn singleton_top_layer(&mut self) -> Result<NodePtr, DriverError> {
        self.template_puzzle(|templates| &templates.singleton)
    }

    pub fn message_puzzle(&mut self) -> Result<NodePtr, DriverError> {
        self.template_puzzle(|templates| &templates.message)
    }

    /// Get a template puzzle from the cache or allocate it.
    fn template_puzzle(
        &mut self,
        select: fn(&SingletonTemplates) -> &PuzzleTemplate,
    ) -> Result<NodePtr, DriverError> {
        let template = select(&self.templates);

        if let Some(puzzle) = self.puzzles.get(&template.hash()) {
            return Ok(*puzzle);
        }

        let puzzle = node_from_bytes(&mut self.allocator, template.reveal())?;
        self.puzzles.insert(template.hash(), puzzle);
        Ok(puzzle)
    }
}

impl IntoIterator for SpendContext {
    type Item = CoinSpend;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.coin_spends.into_iter()
    }
}

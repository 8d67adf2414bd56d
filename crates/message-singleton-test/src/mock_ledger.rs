use std::collections::HashSet;

use chia_protocol::{Bytes, Bytes32, Coin, CoinSpend, SpendBundle};
use clvm_traits::{FromClvm, ToClvm};
use clvm_utils::{tree_hash, TreeHash};
use clvmr::{run_program, Allocator, ChiaDialect, NodePtr};
use indexmap::IndexMap;
use message_singleton_coinset::{CoinRecord, Ledger, LedgerError};
use message_singleton_types::announcement_id;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::LedgerSimError;

const MAX_COST: u64 = 11_000_000_000;

#[derive(Debug, Default, Clone)]
struct LedgerData {
    height: u32,
    coin_records: IndexMap<Bytes32, CoinRecord>,
    coin_spends: IndexMap<Bytes32, CoinSpend>,
    children_queries: usize,
    offline: bool,
}

impl LedgerData {
    fn create_coin(&mut self, coin: Coin) {
        self.coin_records.insert(
            coin.coin_id(),
            CoinRecord {
                coin,
                coinbase: false,
                confirmed_block_index: self.height,
                spent: false,
                spent_block_index: 0,
                timestamp: 1_700_000_000 + u64::from(self.height) * 18,
            },
        );
    }
}

/// An in-memory ledger that runs every puzzle reveal it is given.
///
/// Coin creation, coin announcements and the `ASSERT_MY_*` conditions are checked.
/// Signatures are not.
#[derive(Debug)]
pub struct MockLedger {
    rng: Mutex<ChaCha8Rng>,
    data: Mutex<LedgerData>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(0)),
            data: Mutex::new(LedgerData::default()),
        }
    }

    pub fn height(&self) -> u32 {
        self.data.lock().height
    }

    /// Creates a coin out of thin air with a random parent.
    pub fn mint_coin(&self, puzzle_hash: Bytes32, amount: u64) -> Coin {
        let coin = Coin::new(Bytes32::new(self.rng.lock().gen()), puzzle_hash, amount);
        self.data.lock().create_coin(coin);
        coin
    }

    /// Records a coin as confirmed without any spend creating it.
    pub fn insert_coin(&self, coin: Coin) {
        self.data.lock().create_coin(coin);
    }

    pub fn coin_record(&self, coin_id: Bytes32) -> Option<CoinRecord> {
        self.data.lock().coin_records.get(&coin_id).copied()
    }

    pub fn coin_spend(&self, coin_id: Bytes32) -> Option<CoinSpend> {
        self.data.lock().coin_spends.get(&coin_id).cloned()
    }

    pub fn children(&self, coin_id: Bytes32) -> Vec<CoinRecord> {
        self.data
            .lock()
            .coin_records
            .values()
            .filter(|record| record.coin.parent_coin_info == coin_id)
            .copied()
            .collect()
    }

    pub fn unspent_coins(&self, puzzle_hash: Bytes32) -> Vec<Coin> {
        self.data
            .lock()
            .coin_records
            .values()
            .filter(|record| !record.spent && record.coin.puzzle_hash == puzzle_hash)
            .map(|record| record.coin)
            .collect()
    }

    /// How many child lookups have been served so far.
    pub fn children_queries(&self) -> usize {
        self.data.lock().children_queries
    }

    /// While offline, every query fails as a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.data.lock().offline = offline;
    }

    /// Validates the spend bundle and applies it as a new block.
    /// Returns the coins it created.
    pub fn new_transaction(&self, spend_bundle: SpendBundle) -> Result<Vec<Coin>, LedgerSimError> {
        let mut data = self.data.lock();

        if spend_bundle.coin_spends.is_empty() {
            return Err(LedgerSimError::EmptyBundle);
        }

        let mut removals = IndexMap::new();
        let mut additions = IndexMap::new();
        let mut created_announcements = HashSet::new();
        let mut asserted_announcements = Vec::new();
        let mut fee = 0;

        for coin_spend in &spend_bundle.coin_spends {
            let coin_id = coin_spend.coin.coin_id();

            if removals.insert(coin_id, coin_spend.coin).is_some() {
                return Err(LedgerSimError::DoubleSpend(coin_id));
            }

            for condition in run_spend(coin_spend)? {
                match condition {
                    SpendCondition::CreateCoin {
                        puzzle_hash,
                        amount,
                    } => {
                        let coin = Coin::new(coin_id, puzzle_hash, amount);
                        additions.insert(coin.coin_id(), coin);
                    }
                    SpendCondition::ReserveFee(amount) => fee += amount,
                    SpendCondition::CreateCoinAnnouncement(message) => {
                        created_announcements.insert(announcement_id(coin_id, message));
                    }
                    SpendCondition::AssertCoinAnnouncement(id) => asserted_announcements.push(id),
                    SpendCondition::AssertMy { opcode, holds } => {
                        if !holds(&coin_spend.coin) {
                            return Err(LedgerSimError::AssertionFailed { coin_id, opcode });
                        }
                    }
                }
            }
        }

        for id in asserted_announcements {
            if !created_announcements.contains(&id) {
                return Err(LedgerSimError::MissingAnnouncement(id));
            }
        }

        for coin_id in removals.keys() {
            match data.coin_records.get(coin_id) {
                Some(record) if record.spent => return Err(LedgerSimError::DoubleSpend(*coin_id)),
                Some(_) => {}
                None if additions.contains_key(coin_id) => {}
                None => return Err(LedgerSimError::UnknownCoin(*coin_id)),
            }
        }

        let input: u64 = removals.values().map(|coin| coin.amount).sum();
        let output: u64 = additions.values().map(|coin| coin.amount).sum();

        if input < output + fee {
            return Err(LedgerSimError::InsufficientInput { input, output, fee });
        }

        data.height += 1;
        let height = data.height;

        for coin in additions.values() {
            data.create_coin(*coin);
        }

        for coin_spend in spend_bundle.coin_spends {
            let coin_id = coin_spend.coin.coin_id();

            if let Some(record) = data.coin_records.get_mut(&coin_id) {
                record.spent = true;
                record.spent_block_index = height;
            }

            data.coin_spends.insert(coin_id, coin_spend);
        }

        Ok(additions.into_values().collect())
    }

    fn ensure_online(&self) -> Result<(), LedgerError> {
        if self.data.lock().offline {
            return Err(LedgerError::Transport(Box::new(LedgerSimError::Offline)));
        }
        Ok(())
    }
}

enum SpendCondition {
    CreateCoin { puzzle_hash: Bytes32, amount: u64 },
    ReserveFee(u64),
    CreateCoinAnnouncement(Bytes),
    AssertCoinAnnouncement(Bytes32),
    AssertMy { opcode: u32, holds: Box<dyn Fn(&Coin) -> bool> },
}

fn clvm_error(error: impl std::fmt::Display) -> LedgerSimError {
    LedgerSimError::Clvm(error.to_string())
}

fn run_spend(coin_spend: &CoinSpend) -> Result<Vec<SpendCondition>, LedgerSimError> {
    let mut allocator = Allocator::new();

    let puzzle = coin_spend
        .puzzle_reveal
        .to_clvm(&mut allocator)
        .map_err(clvm_error)?;
    let solution = coin_spend
        .solution
        .to_clvm(&mut allocator)
        .map_err(clvm_error)?;

    if tree_hash(&allocator, puzzle) != TreeHash::from(coin_spend.coin.puzzle_hash) {
        return Err(LedgerSimError::WrongPuzzleHash(coin_spend.coin.coin_id()));
    }

    let output = run_program(
        &mut allocator,
        &ChiaDialect::new(0),
        puzzle,
        solution,
        MAX_COST,
    )
    .map_err(|error| LedgerSimError::Clvm(format!("{error:?}")))?
    .1;

    let mut conditions = Vec::new();

    for condition in Vec::<NodePtr>::from_clvm(&allocator, output).map_err(clvm_error)? {
        let (opcode, rest) = <(u32, NodePtr)>::from_clvm(&allocator, condition).map_err(clvm_error)?;

        let condition = match opcode {
            51 => {
                let (puzzle_hash, (amount, _)) =
                    <(Bytes32, (u64, NodePtr))>::from_clvm(&allocator, rest).map_err(clvm_error)?;
                SpendCondition::CreateCoin {
                    puzzle_hash,
                    amount,
                }
            }
            52 => {
                let (amount, _) = <(u64, NodePtr)>::from_clvm(&allocator, rest).map_err(clvm_error)?;
                SpendCondition::ReserveFee(amount)
            }
            60 => {
                let (message, _) =
                    <(Bytes, NodePtr)>::from_clvm(&allocator, rest).map_err(clvm_error)?;
                SpendCondition::CreateCoinAnnouncement(message)
            }
            61 => {
                let (id, _) = <(Bytes32, NodePtr)>::from_clvm(&allocator, rest).map_err(clvm_error)?;
                SpendCondition::AssertCoinAnnouncement(id)
            }
            70..=72 => {
                let (expected, _) =
                    <(Bytes32, NodePtr)>::from_clvm(&allocator, rest).map_err(clvm_error)?;
                let holds: Box<dyn Fn(&Coin) -> bool> = match opcode {
                    70 => Box::new(move |coin| coin.coin_id() == expected),
                    71 => Box::new(move |coin| coin.parent_coin_info == expected),
                    _ => Box::new(move |coin| coin.puzzle_hash == expected),
                };
                SpendCondition::AssertMy { opcode, holds }
            }
            73 => {
                let (expected, _) =
                    <(u64, NodePtr)>::from_clvm(&allocator, rest).map_err(clvm_error)?;
                SpendCondition::AssertMy {
                    opcode,
                    holds: Box::new(move |coin| coin.amount == expected),
                }
            }
            _ => continue,
        };

        conditions.push(condition);
    }

    Ok(conditions)
}

impl Ledger for MockLedger {
    async fn coin_records_by_parent_ids(
        &self,
        parent_ids: Vec<Bytes32>,
        include_spent: bool,
    ) -> Result<Vec<CoinRecord>, LedgerError> {
        self.ensure_online()?;

        let mut data = self.data.lock();
        data.children_queries += 1;

        Ok(data
            .coin_records
            .values()
            .filter(|record| parent_ids.contains(&record.coin.parent_coin_info))
            .filter(|record| include_spent || !record.spent)
            .copied()
            .collect())
    }

    async fn coin_record_by_id(&self, coin_id: Bytes32) -> Result<Option<CoinRecord>, LedgerError> {
        self.ensure_online()?;
        Ok(self.coin_record(coin_id))
    }

    async fn spend_record(
        &self,
        coin_id: Bytes32,
        spent_height: u32,
    ) -> Result<CoinSpend, LedgerError> {
        self.ensure_online()?;

        let data = self.data.lock();

        match data.coin_records.get(&coin_id) {
            Some(record) if record.spent && record.spent_block_index == spent_height => data
                .coin_spends
                .get(&coin_id)
                .cloned()
                .ok_or(LedgerError::MissingSpend(coin_id, spent_height)),
            _ => Err(LedgerError::MissingSpend(coin_id, spent_height)),
        }
    }

    async fn submit_spend_bundle(&self, spend_bundle: SpendBundle) -> Result<String, LedgerError> {
        self.ensure_online()?;

        self.new_transaction(spend_bundle)
            .map_err(|error| LedgerError::Rejected(error.to_string()))?;

        Ok("SUCCESS".to_string())
    }
}

pub use chia_protocol::{Bytes, Bytes32, Coin, CoinSpend, Program, SpendBundle};
pub use clvm_traits::{FromClvm, ToClvm};
pub use clvm_utils::{ToTreeHash, TreeHash};
pub use clvmr::{Allocator, NodePtr};

pub use message_singleton_coinset::{CoinRecord, CoinsetClient, Ledger, LedgerError, RpcLedger};
pub use message_singleton_driver::{
    sync, DriverError, ErrorKind, Launcher, MessageSingletonClient, SingletonConfig,
    SingletonState, SpendContext, Wallet,
};
pub use message_singleton_test::{LedgerSimError, MockLedger};
pub use message_singleton_types::{
    load_template, message_template, Conditions, PuzzleTemplate, SingletonTemplates,
};

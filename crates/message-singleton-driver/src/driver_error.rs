use std::error::Error;

use chia_protocol::Bytes32;
use clvm_traits::{FromClvmError, ToClvmError};
use clvmr::reduction::EvalErr;
use message_singleton_coinset::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize clvm value: {0}")]
    ToClvm(#[from] ToClvmError),

    #[error("failed to deserialize clvm value: {0}")]
    FromClvm(#[from] FromClvmError),

    #[error("clvm eval error: {0}")]
    Eval(#[from] EvalErr),

    #[error("singleton {0} has not been launched yet")]
    NotLaunched(Bytes32),

    #[error("coin {0} is not known to the ledger")]
    UnknownCoin(Bytes32),

    #[error("coin {coin_id} has {count} children")]
    MultipleChildren { coin_id: Bytes32, count: usize },

    #[error("coin {child_id} was returned as a child of {parent_id} but has another parent")]
    OrphanChild { parent_id: Bytes32, child_id: Bytes32 },

    #[error("expected puzzle hash {expected}, but found {actual}")]
    PuzzleHashMismatch { expected: Bytes32, actual: Bytes32 },

    #[error("expected launcher id {expected}, but found {found}")]
    LauncherMismatch { expected: Bytes32, found: Bytes32 },

    #[error("expected amount {expected}, but found {actual}")]
    AmountMismatch { expected: u64, actual: u64 },

    #[error("coin {0} was spent without creating a child")]
    LineageTerminated(Bytes32),

    #[error("coin {0} created a child but is not spent")]
    UnspentParent(Bytes32),

    #[error("expected puzzle template {expected}, but found {found}")]
    TemplateMismatch { expected: Bytes32, found: Bytes32 },

    #[error("invalid singleton struct")]
    InvalidSingletonStruct,

    #[error("singleton amount {0} is even")]
    EvenAmount(u64),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("wallet error: {0}")]
    Wallet(Box<dyn Error + Send + Sync>),
}

/// Groups [`DriverError`] by how a caller can react to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Nothing is confirmed past the launcher yet. Retrying later can succeed.
    NotLaunched,
    /// The chain disagrees with what a singleton lineage must look like.
    ProtocolInconsistency,
    LedgerQueryFailure,
    /// A layer was not curried from the template it should have been.
    TemplateMismatch,
    Wallet,
    Malformed,
}

impl DriverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotLaunched(_) => ErrorKind::NotLaunched,
            Self::UnknownCoin(_)
            | Self::MultipleChildren { .. }
            | Self::OrphanChild { .. }
            | Self::PuzzleHashMismatch { .. }
            | Self::LauncherMismatch { .. }
            | Self::AmountMismatch { .. }
            | Self::LineageTerminated(_)
            | Self::UnspentParent(_) => ErrorKind::ProtocolInconsistency,
            Self::TemplateMismatch { .. } | Self::InvalidSingletonStruct => {
                ErrorKind::TemplateMismatch
            }
            Self::Ledger(_) => ErrorKind::LedgerQueryFailure,
            Self::Wallet(_) => ErrorKind::Wallet,
            Self::Io(_)
            | Self::ToClvm(_)
            | Self::FromClvm(_)
            | Self::Eval(_)
            | Self::EvenAmount(_) => ErrorKind::Malformed,
        }
    }
}

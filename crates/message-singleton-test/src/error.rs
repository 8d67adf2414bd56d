use chia_protocol::Bytes32;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerSimError {
    #[error("spend bundle is empty")]
    EmptyBundle,

    #[error("coin {0} does not exist")]
    UnknownCoin(Bytes32),

    #[error("coin {0} is already spent")]
    DoubleSpend(Bytes32),

    #[error("puzzle reveal does not match the puzzle hash of coin {0}")]
    WrongPuzzleHash(Bytes32),

    #[error("clvm error: {0}")]
    Clvm(String),

    #[error("condition {opcode} failed for coin {coin_id}")]
    AssertionFailed { coin_id: Bytes32, opcode: u32 },

    #[error("asserted coin announcement {0} was never created")]
    MissingAnnouncement(Bytes32),

    #[error("spends output {output} mojos and reserve {fee} in fees from only {input}")]
    InsufficientInput { input: u64, output: u64, fee: u64 },

    #[error("ledger is offline")]
    Offline,
}

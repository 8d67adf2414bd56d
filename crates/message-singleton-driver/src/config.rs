use chia_protocol::Bytes32;
use message_singleton_types::{
    SingletonTemplates, DEFAULT_FEE, DEFAULT_SINGLETON_AMOUNT, MAINNET_GENESIS_CHALLENGE,
    TESTNET11_GENESIS_CHALLENGE,
};

/// Everything the client needs to know about the network and the lineage it manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingletonConfig {
    pub templates: SingletonTemplates,
    /// Signatures are bound to the network by its genesis challenge.
    pub genesis_challenge: Bytes32,
    /// The amount of newly launched singletons. Must be odd.
    /// Updates keep the amount of the coin being spent.
    pub amount: u64,
    pub fee: u64,
}

impl SingletonConfig {
    pub fn new(templates: SingletonTemplates, genesis_challenge: Bytes32) -> Self {
        Self {
            templates,
            genesis_challenge,
            amount: DEFAULT_SINGLETON_AMOUNT,
            fee: DEFAULT_FEE,
        }
    }

    pub fn mainnet(templates: SingletonTemplates) -> Self {
        Self::new(templates, MAINNET_GENESIS_CHALLENGE)
    }

    pub fn testnet11(templates: SingletonTemplates) -> Self {
        Self::new(templates, TESTNET11_GENESIS_CHALLENGE)
    }

    #[must_use]
    pub fn with_fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    #[must_use]
    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }
}

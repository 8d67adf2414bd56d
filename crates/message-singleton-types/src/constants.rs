use chia_protocol::Bytes32;
use hex_literal::hex;

pub const MAINNET_GENESIS_CHALLENGE: Bytes32 = Bytes32::new(hex!(
    "ccd5bb71183532bff220ba46c268991a3ff07eb358e8255a65c30a2dce0e5fbb"
));

pub const TESTNET11_GENESIS_CHALLENGE: Bytes32 = Bytes32::new(hex!(
    "37a90eb5185a9c4439a91ddc98bbadce7b4feba060d50116a067de66bf236615"
));

/// Singletons must always have an odd amount, the smallest of which is a single mojo.
pub const DEFAULT_SINGLETON_AMOUNT: u64 = 1;

/// The fee attached to launches and message updates, in mojos.
pub const DEFAULT_FEE: u64 = 50_000_000;

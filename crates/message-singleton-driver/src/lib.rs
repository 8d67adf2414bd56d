mod chain_walker;
mod client;
mod config;
mod driver_error;
mod layer;
mod layers;
mod primitives;
mod puzzle;
mod spend;
mod spend_context;
mod wallet;

pub use chain_walker::*;
pub use client::*;
pub use config::*;
pub use driver_error::*;
pub use layer::*;
pub use layers::*;
pub use primitives::*;
pub use puzzle::*;
pub use spend::*;
pub use spend_context::*;
pub use wallet::*;

#[cfg(test)]
mod test_wallet;

#[cfg(test)]
pub(crate) use test_wallet::*;

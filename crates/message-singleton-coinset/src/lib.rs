mod chia_rpc_client;
mod coinset_client;
mod ledger;
mod mock_client;
mod models;
mod types;

pub use chia_rpc_client::*;
pub use coinset_client::*;
pub use ledger::*;
pub use mock_client::*;
pub use models::*;
pub use types::*;

#[cfg(any(feature = "native-tls", feature = "rustls"))]
mod full_node_client;

#[cfg(any(feature = "native-tls", feature = "rustls"))]
pub use full_node_client::*;

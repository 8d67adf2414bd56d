use std::path::PathBuf;

use chia_protocol::{Bytes, Bytes32};
use clap::{Args, Parser, Subcommand, ValueEnum};
use message_singleton_types::DEFAULT_SINGLETON_AMOUNT;

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// The network to connect to when no RPC URL or chia root is given.
    #[arg(long, value_enum, default_value_t = Network::Testnet11, global = true)]
    pub network: Network,

    /// A coinset compatible RPC endpoint, or the full node URL when used with `--chia-root`.
    #[arg(long, env = "MESSAGE_SINGLETON_RPC_URL", global = true)]
    pub rpc_url: Option<String>,

    /// Connect to a local full node using the SSL certificates under this chia root.
    #[arg(long, env = "CHIA_ROOT", global = true)]
    pub chia_root: Option<PathBuf>,

    /// A `.clsp` source or `.hex` file for the message puzzle. Defaults to the bundled puzzle.
    #[arg(long, env = "MESSAGE_PUZZLE", global = true)]
    pub message_puzzle: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Network {
    Mainnet,
    Testnet11,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Prints the current message of a singleton.
    Show(ShowCommand),
    /// Builds the spend that replaces the message.
    Update(UpdateCommand),
    /// Builds the spends that launch a new singleton.
    Launch(LaunchCommand),
}

#[derive(Debug, Args)]
pub struct ShowCommand {
    #[arg(short, long, env = "LAUNCHER_ID", value_parser = parse_bytes32)]
    pub launcher_id: Bytes32,
}

#[derive(Debug, Args)]
pub struct UpdateCommand {
    #[arg(short, long, env = "LAUNCHER_ID", value_parser = parse_bytes32)]
    pub launcher_id: Bytes32,

    /// The new message.
    pub message: String,

    /// Treat the message as hex rather than text.
    #[arg(long)]
    pub hex: bool,

    /// Push the spend to the network instead of only printing it.
    #[arg(long)]
    pub submit: bool,
}

#[derive(Debug, Args)]
pub struct LaunchCommand {
    /// The coin that will create the launcher.
    #[arg(value_parser = parse_bytes32)]
    pub parent_coin_id: Bytes32,

    pub message: String,

    #[arg(long)]
    pub hex: bool,

    #[arg(long, default_value_t = DEFAULT_SINGLETON_AMOUNT)]
    pub amount: u64,
}

pub fn parse_bytes32(text: &str) -> Result<Bytes32, String> {
    let bytes = hex::decode(text.trim_start_matches("0x")).map_err(|error| error.to_string())?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| format!("expected 32 bytes, found {}", bytes.len()))?;
    Ok(Bytes32::new(bytes))
}

pub fn parse_message(message: &str, is_hex: bool) -> anyhow::Result<Bytes> {
    if is_hex {
        Ok(Bytes::new(hex::decode(message.trim_start_matches("0x"))?))
    } else {
        Ok(Bytes::new(message.as_bytes().to_vec()))
    }
}

mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use message_singleton_coinset::{CoinsetClient, FullNodeClient, Ledger, RpcLedger};
use message_singleton_types::{load_template, message_template, SingletonTemplates};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Command, Network};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let message = match &cli.message_puzzle {
        Some(path) => load_template(path)?,
        None => message_template()?,
    };
    let templates = SingletonTemplates::new(message);

    if let Some(chia_root) = &cli.chia_root {
        let mut client = FullNodeClient::from_chia_root(chia_root)?;

        if let Some(rpc_url) = &cli.rpc_url {
            client = client.with_base_url(rpc_url.clone());
        }

        debug!("using the full node under {}", chia_root.display());

        return run(RpcLedger::new(client), templates, cli.command).await;
    }

    let client = match (&cli.rpc_url, cli.network) {
        (Some(rpc_url), _) => CoinsetClient::new(rpc_url.clone()),
        (None, Network::Mainnet) => CoinsetClient::mainnet(),
        (None, Network::Testnet11) => CoinsetClient::testnet11(),
    };

    run(RpcLedger::new(client), templates, cli.command).await
}

async fn run<L>(ledger: L, templates: SingletonTemplates, command: Command) -> Result<()>
where
    L: Ledger,
{
    match command {
        Command::Show(args) => commands::show(&ledger, templates, &args).await?,
        Command::Update(args) => commands::update(&ledger, templates, &args).await?,
        Command::Launch(args) => commands::launch(templates, &args)?,
    }

    Ok(())
}

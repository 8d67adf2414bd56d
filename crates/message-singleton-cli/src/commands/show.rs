use anyhow::Result;
use message_singleton_coinset::Ledger;
use message_singleton_driver::{sync, SpendContext};
use message_singleton_types::SingletonTemplates;

use crate::args::ShowCommand;

use super::describe_message;

pub async fn show<L>(ledger: &L, templates: SingletonTemplates, args: &ShowCommand) -> Result<()>
where
    L: Ledger,
{
    let mut ctx = SpendContext::new(templates);
    let state = sync(ledger, &mut ctx, args.launcher_id).await?;

    println!("launcher id: {}", state.launcher_id);
    println!("coin id: {}", state.coin.coin_id());
    println!("message: {}", describe_message(&mut ctx, &state));

    Ok(())
}

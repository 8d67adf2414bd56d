use anyhow::Result;
use chia_bls::Signature;
use chia_protocol::SpendBundle;
use message_singleton_coinset::Ledger;
use message_singleton_driver::{sync, SpendContext};
use message_singleton_types::SingletonTemplates;
use serde_json::json;

use crate::args::{parse_message, UpdateCommand};

use super::describe_message;

pub async fn update<L>(
    ledger: &L,
    templates: SingletonTemplates,
    args: &UpdateCommand,
) -> Result<()>
where
    L: Ledger,
{
    let message = parse_message(&args.message, args.hex)?;

    let mut ctx = SpendContext::new(templates);
    let state = sync(ledger, &mut ctx, args.launcher_id).await?;
    let child = state.set_message(&mut ctx, message, state.coin.amount)?;

    eprintln!(
        "replacing {:?} with {:?}",
        describe_message(&mut ctx, &state),
        describe_message(&mut ctx, &child)
    );

    // The message puzzle asserts nothing that needs a signature.
    let spend_bundle = SpendBundle::new(ctx.take(), Signature::default());

    if args.submit {
        let status = ledger.submit_spend_bundle(spend_bundle).await?;
        println!("{status}");
        println!("new coin id: {}", child.coin.coin_id());
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "spend_bundle": spend_bundle,
                "new_coin_id": child.coin.coin_id(),
            }))?
        );
    }

    Ok(())
}

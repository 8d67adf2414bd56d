use anyhow::Result;
use message_singleton_driver::{SingletonState, SpendContext};
use message_singleton_types::SingletonTemplates;
use serde_json::json;

use crate::args::{parse_message, LaunchCommand};

/// Prints the launcher and eve spends, and the conditions the parent coin has to output.
/// The parent coin is spent by whatever wallet holds it.
pub fn launch(templates: SingletonTemplates, args: &LaunchCommand) -> Result<()> {
    let message = parse_message(&args.message, args.hex)?;

    let mut ctx = SpendContext::new(templates);
    let (conditions, state) =
        SingletonState::launch(&mut ctx, args.parent_coin_id, args.amount, message)?;
    let conditions = ctx.serialize(&conditions)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "launcher_id": state.launcher_id,
            "parent_conditions": conditions,
            "coin_spends": ctx.take(),
            "coin_id": state.coin.coin_id(),
        }))?
    );

    Ok(())
}

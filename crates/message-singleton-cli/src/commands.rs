mod launch;
mod show;
mod update;

pub use launch::*;
pub use show::*;
pub use update::*;

use chia_protocol::Bytes;
use message_singleton_driver::{SingletonState, SpendContext};

/// Text when the message is a printable string, hex otherwise.
fn describe_message(ctx: &mut SpendContext, state: &SingletonState) -> String {
    match state.parse_message::<Bytes>(ctx) {
        Ok(bytes) => match String::from_utf8(bytes.to_vec()) {
            Ok(text) if !text.chars().any(char::is_control) => text,
            _ => format!("0x{}", hex::encode(bytes)),
        },
        Err(_) => format!("0x{}", hex::encode(&state.message)),
    }
}

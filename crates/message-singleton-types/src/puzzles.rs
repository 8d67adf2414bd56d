use chia_protocol::Bytes32;
use clvm_traits::{FromClvm, ToClvm};

/// The curried arguments of the message puzzle.
/// The puzzle needs its own uncurried hash to recreate itself with a new message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ToClvm, FromClvm)]
#[clvm(curry)]
pub struct MessageArgs<M> {
    pub mod_hash: Bytes32,
    pub message: M,
}

impl<M> MessageArgs<M> {
    pub fn new(mod_hash: Bytes32, message: M) -> Self {
        Self { mod_hash, message }
    }
}

/// Replaces the message and sets the amount of the recreated coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ToClvm, FromClvm)]
#[clvm(list)]
pub struct MessageSolution<M> {
    pub new_message: M,
    pub amount: u64,
}

impl<M> MessageSolution<M> {
    pub fn new(new_message: M, amount: u64) -> Self {
        Self {
            new_message,
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use chia_protocol::Bytes;
    use clvm_utils::{CurriedProgram, ToTreeHash, TreeHash};
    use clvmr::{serde::node_to_bytes, Allocator};
    use hex_literal::hex;

    use super::*;

    #[test]
    fn test_message_args_curry_shape() -> anyhow::Result<()> {
        let mut allocator = Allocator::new();

        let ptr = CurriedProgram {
            program: 1,
            args: MessageArgs::new(Bytes32::new([0; 32]), ()),
        }
        .to_clvm(&mut allocator)?;

        assert_eq!(
            hex::encode(node_to_bytes(&allocator, ptr)?),
            concat!(
                "ff02ffff0101ffff04ffff01a0",
                "0000000000000000000000000000000000000000000000000000000000000000",
                "ffff04ffff0180ff01808080"
            )
        );

        Ok(())
    }

    #[test]
    fn test_message_solution_layout() -> anyhow::Result<()> {
        let mut allocator = Allocator::new();
        let message = Bytes::new(hex!("cafe").to_vec());
        let ptr = MessageSolution::new(message.clone(), 1).to_clvm(&mut allocator)?;
        assert_eq!(hex::encode(node_to_bytes(&allocator, ptr)?), "ff82cafeff0180");

        let parsed = MessageSolution::<Bytes>::from_clvm(&allocator, ptr)?;
        assert_eq!(parsed.new_message, message);
        assert_eq!(parsed.amount, 1);

        Ok(())
    }

    #[test]
    fn test_curried_hash_depends_on_message() {
        let first = CurriedProgram {
            program: TreeHash::new([1; 32]),
            args: MessageArgs::new(Bytes32::new([1; 32]), "a".tree_hash()),
        }
        .tree_hash();

        let second = CurriedProgram {
            program: TreeHash::new([1; 32]),
            args: MessageArgs::new(Bytes32::new([1; 32]), "b".tree_hash()),
        }
        .tree_hash();

        assert_ne!(first, second);
    }
}

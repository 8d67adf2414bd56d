use std::io;

use chia_protocol::Bytes32;
use chia_puzzle_types::singleton::{SingletonArgs, SingletonStruct};
use chia_puzzles::{
    SINGLETON_LAUNCHER, SINGLETON_LAUNCHER_HASH, SINGLETON_TOP_LAYER_V1_1,
    SINGLETON_TOP_LAYER_V1_1_HASH,
};
use clvm_utils::{curry_tree_hash, tree_hash, CurriedProgram, ToTreeHash, TreeHash};
use clvmr::{serde::node_from_bytes, Allocator};
use thiserror::Error;

use crate::MessageArgs;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("malformed serialized program: {0}")]
    Malformed(String),

    #[error("invalid file name")]
    InvalidFileName,

    #[error("compiler error: {0}")]
    Compiler(String),
}

/// A serialized program that is curried with arguments to produce puzzles.
/// Two templates are equal exactly when their serializations are.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PuzzleTemplate {
    reveal: Vec<u8>,
    hash: TreeHash,
}

impl PuzzleTemplate {
    /// Parses the serialized program once to compute its tree hash.
    pub fn new(reveal: Vec<u8>) -> Result<Self, TemplateError> {
        let hash = template_hash(&reveal)?;
        Ok(Self { reveal, hash })
    }

    /// Accepts the contents of a `.hex` file, with or without a `0x` prefix.
    pub fn from_hex(text: &str) -> Result<Self, TemplateError> {
        let text = text.trim();
        let text = text.strip_prefix("0x").unwrap_or(text);
        Self::new(hex::decode(text)?)
    }

    fn known(reveal: &[u8], hash: [u8; 32]) -> Self {
        Self {
            reveal: reveal.to_vec(),
            hash: TreeHash::new(hash),
        }
    }

    /// The singleton launcher puzzle from `chia-puzzles`.
    pub fn singleton_launcher() -> Self {
        Self::known(&SINGLETON_LAUNCHER, SINGLETON_LAUNCHER_HASH)
    }

    /// Version 1.1 of the singleton top layer from `chia-puzzles`.
    pub fn singleton_top_layer() -> Self {
        Self::known(&SINGLETON_TOP_LAYER_V1_1, SINGLETON_TOP_LAYER_V1_1_HASH)
    }

    pub fn reveal(&self) -> &[u8] {
        &self.reveal
    }

    pub fn hash(&self) -> TreeHash {
        self.hash
    }

    /// The hash of this template curried with arguments whose tree hashes are already known.
    pub fn curry_tree_hash(&self, arg_hashes: &[TreeHash]) -> TreeHash {
        curry_tree_hash(self.hash, arg_hashes)
    }
}

/// Computes the tree hash of a serialized program.
pub fn template_hash(reveal: &[u8]) -> Result<TreeHash, TemplateError> {
    let mut allocator = Allocator::new();
    let ptr = node_from_bytes(&mut allocator, reveal)
        .map_err(|error| TemplateError::Malformed(error.to_string()))?;
    Ok(tree_hash(&allocator, ptr))
}

/// The three templates a message singleton lineage is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingletonTemplates {
    pub launcher: PuzzleTemplate,
    pub singleton: PuzzleTemplate,
    pub message: PuzzleTemplate,
}

impl SingletonTemplates {
    /// Uses the standard launcher and singleton top layer with the given message template.
    pub fn new(message: PuzzleTemplate) -> Self {
        Self {
            launcher: PuzzleTemplate::singleton_launcher(),
            singleton: PuzzleTemplate::singleton_top_layer(),
            message,
        }
    }

    pub fn singleton_struct(&self, launcher_id: Bytes32) -> SingletonStruct {
        SingletonStruct {
            mod_hash: self.singleton.hash().into(),
            launcher_id,
            launcher_puzzle_hash: self.launcher.hash().into(),
        }
    }

    /// The message puzzle committing to a message with the given tree hash.
    pub fn message_puzzle_hash(&self, message_hash: TreeHash) -> TreeHash {
        CurriedProgram {
            program: self.message.hash(),
            args: MessageArgs::new(self.message.hash().into(), message_hash),
        }
        .tree_hash()
    }

    /// The full singleton puzzle wrapping the given inner puzzle.
    pub fn singleton_puzzle_hash(
        &self,
        launcher_id: Bytes32,
        inner_puzzle_hash: TreeHash,
    ) -> TreeHash {
        CurriedProgram {
            program: self.singleton.hash(),
            args: SingletonArgs {
                singleton_struct: self.singleton_struct(launcher_id),
                inner_puzzle: inner_puzzle_hash,
            },
        }
        .tree_hash()
    }

    pub fn is_launcher(&self, puzzle_hash: Bytes32) -> bool {
        puzzle_hash == Bytes32::from(self.launcher.hash())
    }
}

use std::{collections::HashMap, fs, path::Path, rc::Rc};

use clvm_tools_rs::{
    classic::clvm_tools::clvmc::compile_clvm_text,
    compiler::{compiler::DefaultCompilerOpts, comptypes::CompilerOpts},
};
use clvmr::{serde::node_to_bytes, Allocator};

use crate::{PuzzleTemplate, TemplateError};

/// Chialisp source of the message puzzle shipped with this crate.
pub const MESSAGE_PUZZLE_SOURCE: &str = include_str!("../puzzles/message.clsp");

/// Compiles chialisp source text into a template.
pub fn compile_chialisp(
    source: &str,
    file_name: &str,
    include_paths: &[String],
) -> Result<PuzzleTemplate, TemplateError> {
    let mut allocator = Allocator::new();

    let opts = Rc::new(DefaultCompilerOpts::new(file_name)).set_search_paths(include_paths);

    let ptr = compile_clvm_text(
        &mut allocator,
        opts,
        &mut HashMap::new(),
        source,
        file_name,
        false,
    )
    .map_err(|error| TemplateError::Compiler(format!("{error:?}")))?;

    let reveal = node_to_bytes(&allocator, ptr)?;

    PuzzleTemplate::new(reveal)
}

/// Compiles the bundled message puzzle.
pub fn message_template() -> Result<PuzzleTemplate, TemplateError> {
    compile_chialisp(MESSAGE_PUZZLE_SOURCE, "message.clsp", &[])
}

/// Loads a template from disk.
///
/// Files ending in `.clsp` are compiled, with their directory on the include path.
/// Anything else is read as the hex encoding of an already serialized program.
pub fn load_template<P: AsRef<Path>>(path: P) -> Result<PuzzleTemplate, TemplateError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;

    if path.extension().is_some_and(|extension| extension == "clsp") {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or(TemplateError::InvalidFileName)?;

        let include_paths = path
            .parent()
            .and_then(Path::to_str)
            .map(|parent| vec![parent.to_string()])
            .unwrap_or_default();

        compile_chialisp(&text, file_name, &include_paths)
    } else {
        PuzzleTemplate::from_hex(&text)
    }
}

//! SIMPL-2021 compiler library.
//!
//! Compiles SIMPL source to textual Jasmin assembly and hands the result to
//! an external assembler (spec §1, §6). There is no persistent AST (§3):
//! lexing, parsing, type checking, and code emission all happen in one pass
//! over the token stream.

pub mod assembler;
pub mod config;
pub mod emitter;
pub mod error;
pub mod hashtable;
pub mod lexer;
pub mod parser;
pub mod source_pos;
pub mod symtab;
pub mod token;
pub mod types;

pub use config::Config;
pub use emitter::Emitter;
pub use error::{CompileError, CompileResult};

use assembler::Assembler;
use std::fs;
use std::path::Path;
use tracing::info;

/// Compiles `source_path` and writes `<ClassName>.j` (and, once assembled,
/// `<ClassName>.class`) into `out_dir`. Returns the path of the `.j` file.
pub fn compile_file(
    source_path: &Path,
    out_dir: &Path,
    config: &Config,
    assembler: &dyn Assembler,
) -> CompileResult<std::path::PathBuf> {
    info!(source = %source_path.display(), "reading source file");
    let source = fs::read_to_string(source_path).map_err(|source_err| CompileError::CannotOpenSource {
        path: source_path.to_path_buf(),
        source: source_err,
    })?;

    info!("compiling");
    let (class_name, emitter) = parser::compile(&source, config)?;
    info!(class = %class_name, "emitting assembly");

    let j_path = emitter.serialize(out_dir)?;

    info!(jasmin_file = %j_path.display(), "invoking external assembler");
    assembler.assemble(&j_path)?;

    Ok(j_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assembler::NoopAssembler;

    #[test]
    fn compiles_hello_world_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("hello.simpl");
        fs::write(&source_path, r#"program Hello begin write "hello, world" end"#).unwrap();

        let config = Config::new();
        let j_path = compile_file(&source_path, dir.path(), &config, &NoopAssembler).unwrap();
        let text = fs::read_to_string(&j_path).unwrap();
        assert!(text.contains(".class public Hello"));
        assert!(text.contains("println"));
    }

    #[test]
    fn missing_source_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.simpl");
        let config = Config::new();
        let err = compile_file(&missing, dir.path(), &config, &NoopAssembler).unwrap_err();
        assert!(matches!(err, CompileError::CannotOpenSource { .. }));
    }

    #[test]
    fn syntax_error_is_reported_with_position() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("bad.simpl");
        fs::write(&source_path, "program P begin write end").unwrap();

        let config = Config::new();
        let err = compile_file(&source_path, dir.path(), &config, &NoopAssembler).unwrap_err();
        let rendered = err.render(&source_path.display().to_string());
        assert!(rendered.contains(':'));
    }
}

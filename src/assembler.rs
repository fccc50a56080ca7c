//! Invocation of the external assembler (spec §6): the last, deliberately
//! out-of-core step of the pipeline, abstracted behind a trait so tests
//! never need a real `java`/Jasmin install on the machine running them.

use crate::config::Config;
use crate::error::CompileError;
use std::path::Path;
use std::process::Command;

pub trait Assembler {
    /// Assembles the `.j` file at `source` into a `.class` file alongside
    /// it. Returns an error carrying the assembler's stderr on nonzero
    /// exit.
    fn assemble(&self, source: &Path) -> Result<(), CompileError>;
}

/// Shells out to `java -jar <JASMIN_JAR> <file>`, the invocation the spec
/// names explicitly.
#[derive(Debug)]
pub struct JasminAssembler {
    jar: std::path::PathBuf,
    java_bin: String,
}

impl JasminAssembler {
    pub fn from_config(config: &Config) -> Result<Self, CompileError> {
        let jar = config
            .jasmin_jar
            .clone()
            .ok_or(CompileError::MissingJasminJar)?;
        Ok(JasminAssembler {
            jar,
            java_bin: config.java_bin.clone(),
        })
    }
}

impl Assembler for JasminAssembler {
    fn assemble(&self, source: &Path) -> Result<(), CompileError> {
        let dir = source.parent().unwrap_or_else(|| Path::new("."));
        let output = Command::new(&self.java_bin)
            .arg("-jar")
            .arg(&self.jar)
            .arg(source)
            .arg("-d")
            .arg(dir)
            .output()
            .map_err(CompileError::AssemblerInvocation)?;

        if !output.status.success() {
            return Err(CompileError::AssemblerFailed(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        Ok(())
    }
}

/// Does nothing; used by integration tests that only need to verify the
/// `.j` text the compiler produced, not a real class file.
pub struct NoopAssembler;

impl Assembler for NoopAssembler {
    fn assemble(&self, _source: &Path) -> Result<(), CompileError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_jar_is_reported_before_any_process_spawn() {
        let config = Config::new();
        let err = JasminAssembler::from_config(&config).unwrap_err();
        assert!(matches!(err, CompileError::MissingJasminJar));
    }

    #[test]
    fn noop_assembler_always_succeeds() {
        let a = NoopAssembler;
        assert!(a.assemble(Path::new("/nonexistent/Foo.j")).is_ok());
    }
}

//! The closed catalogue of compiler diagnostics (spec §7).
//!
//! Every semantic or syntactic miss the compiler can make is one variant
//! here; there is no "error not yet implemented" escape hatch. Each variant
//! that can be attributed to a source location carries a [`SourcePos`]. The
//! single reporting routine is [`Diagnostic::render`], which produces the
//! `<source>:<line>:<col>: <message>` line the spec mandates.

use crate::source_pos::SourcePos;
use crate::types::ValType;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    // --- Lexical ---
    #[error("illegal character '{ch}'")]
    IllegalCharacter { pos: SourcePos, ch: char },

    #[error("number too large")]
    NumberTooLarge { pos: SourcePos },

    #[error("identifier too long (max {max} characters)")]
    IdentifierTooLong { pos: SourcePos, max: usize },

    #[error("non-printable character in string")]
    NonPrintableInString { pos: SourcePos },

    #[error("unknown escape sequence '\\{ch}'")]
    UnknownEscape { pos: SourcePos, ch: char },

    #[error("unterminated string")]
    UnterminatedString { pos: SourcePos },

    #[error("unterminated comment")]
    UnterminatedComment { pos: SourcePos },

    // --- Syntactic ---
    #[error("expected {expected} but found {found}")]
    ExpectedButFound {
        pos: SourcePos,
        expected: String,
        found: String,
    },

    #[error("statement expected")]
    StatementExpected { pos: SourcePos },

    #[error("type expected")]
    TypeExpected { pos: SourcePos },

    #[error("factor expected")]
    FactorExpected { pos: SourcePos },

    #[error("expression or string expected")]
    ExpressionOrStringExpected { pos: SourcePos },

    #[error("argument list or assignment expected")]
    ArgListOrAssignmentExpected { pos: SourcePos },

    #[error("array allocation or expression expected")]
    ArrayAllocOrExpressionExpected { pos: SourcePos },

    // --- Declaration ---
    #[error("multiple definition of '{name}'")]
    MultipleDefinition { pos: SourcePos, name: String },

    // --- Scope ---
    #[error("unknown identifier '{name}'")]
    UnknownIdentifier { pos: SourcePos, name: String },

    // --- Kind ---
    #[error("'{name}' is not a function")]
    NotAFunction { pos: SourcePos, name: String },

    #[error("'{name}' is not a procedure")]
    NotAProcedure { pos: SourcePos, name: String },

    #[error("'{name}' is not a variable")]
    NotAVariable { pos: SourcePos, name: String },

    #[error("'{name}' is not an array")]
    NotAnArray { pos: SourcePos, name: String },

    #[error("scalar variable expected")]
    ScalarVariableExpected { pos: SourcePos },

    #[error("missing argument list for function '{name}'")]
    MissingArgumentList { pos: SourcePos, name: String },

    // --- Arity ---
    #[error("too few arguments for call to '{name}'")]
    TooFewArguments { pos: SourcePos, name: String },

    #[error("too many arguments for call to '{name}'")]
    TooManyArguments { pos: SourcePos, name: String },

    // --- Type ---
    #[error("incompatible types (expected {expected}, found {found}) for {context}")]
    IncompatibleTypes {
        pos: SourcePos,
        expected: ValType,
        found: ValType,
        context: String,
    },

    // --- Control ---
    #[error("exit expression not allowed for procedure")]
    ExitExpressionInProcedure { pos: SourcePos },

    #[error("missing exit expression for function")]
    MissingExitExpression { pos: SourcePos },

    #[error("{op} is an illegal array operation")]
    IllegalArrayOperation { pos: SourcePos, op: String },

    // --- Environment ---
    #[error("environment variable JASMIN_JAR is not set")]
    MissingJasminJar,

    #[error("cannot open source file '{path}': {source}")]
    CannotOpenSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write output file '{path}': {source}")]
    CannotWriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to invoke external assembler: {0}")]
    AssemblerInvocation(std::io::Error),

    #[error("external assembler failed:\n{0}")]
    AssemblerFailed(String),
}

impl CompileError {
    /// The position most helpful to the user, where one exists. Errors that
    /// originate before any source position is meaningful (e.g. a missing
    /// environment variable) return `None`.
    pub fn pos(&self) -> Option<SourcePos> {
        use CompileError::*;
        match self {
            IllegalCharacter { pos, .. }
            | NumberTooLarge { pos }
            | IdentifierTooLong { pos, .. }
            | NonPrintableInString { pos }
            | UnknownEscape { pos, .. }
            | UnterminatedString { pos }
            | UnterminatedComment { pos }
            | ExpectedButFound { pos, .. }
            | StatementExpected { pos }
            | TypeExpected { pos }
            | FactorExpected { pos }
            | ExpressionOrStringExpected { pos }
            | ArgListOrAssignmentExpected { pos }
            | ArrayAllocOrExpressionExpected { pos }
            | MultipleDefinition { pos, .. }
            | UnknownIdentifier { pos, .. }
            | NotAFunction { pos, .. }
            | NotAProcedure { pos, .. }
            | NotAVariable { pos, .. }
            | NotAnArray { pos, .. }
            | ScalarVariableExpected { pos }
            | MissingArgumentList { pos, .. }
            | TooFewArguments { pos, .. }
            | TooManyArguments { pos, .. }
            | IncompatibleTypes { pos, .. }
            | ExitExpressionInProcedure { pos }
            | MissingExitExpression { pos }
            | IllegalArrayOperation { pos, .. } => Some(*pos),
            MissingJasminJar
            | CannotOpenSource { .. }
            | CannotWriteOutput { .. }
            | AssemblerInvocation(_)
            | AssemblerFailed(_) => None,
        }
    }

    /// Render the diagnostic as `<source>:<line>:<col>: <message>`, or, for
    /// position-less environment errors, as a bare message (there is no
    /// source span to anchor them to).
    pub fn render(&self, source_name: &str) -> String {
        match self.pos() {
            Some(pos) => format!("{}:{}: {}", source_name, pos, self),
            None => format!("{}: {}", source_name, self),
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_position_prefixed_message() {
        let err = CompileError::UnknownIdentifier {
            pos: SourcePos { line: 3, column: 7 },
            name: "x".to_string(),
        };
        assert_eq!(err.render("foo.simpl"), "foo.simpl:3:7: unknown identifier 'x'");
    }

    #[test]
    fn renders_positionless_message() {
        let err = CompileError::MissingJasminJar;
        assert_eq!(
            err.render("foo.simpl"),
            "foo.simpl: environment variable JASMIN_JAR is not set"
        );
    }

    #[test]
    fn incompatible_types_message() {
        let err = CompileError::IncompatibleTypes {
            pos: SourcePos::start(),
            expected: ValType::BOOLEAN,
            found: ValType::INTEGER,
            context: "'exit' statement".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("expected boolean"));
        assert!(msg.contains("found integer"));
        assert!(msg.contains("'exit' statement"));
    }
}

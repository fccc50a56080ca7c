//! Source position tracking.
//!
//! One-based line/column pair, mutated by the lexer as it scans and read by
//! every diagnostic the compiler reports.

use std::fmt;

/// A 1-based (line, column) pair identifying a point in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourcePos {
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    pub const fn start() -> Self {
        SourcePos { line: 1, column: 0 }
    }

    /// Advance past a single non-newline character.
    pub fn advance(&mut self) {
        self.column += 1;
    }

    /// Advance past a newline: bump the line, reset the column.
    pub fn newline(&mut self) {
        self.line += 1;
        self.column = 0;
    }
}

impl Default for SourcePos {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_within_line() {
        let mut pos = SourcePos::start();
        pos.advance();
        pos.advance();
        assert_eq!(pos, SourcePos { line: 1, column: 2 });
    }

    #[test]
    fn newline_resets_column() {
        let mut pos = SourcePos::start();
        pos.advance();
        pos.newline();
        assert_eq!(pos, SourcePos { line: 2, column: 0 });
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = SourcePos { line: 1, column: 5 };
        let b = SourcePos { line: 2, column: 0 };
        assert!(a < b);
    }
}

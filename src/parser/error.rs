use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::lexer::{LexError, Token};

/// What made a parse fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// No rule matched; the only kind alternatives backtrack over
    Syntax,
    Lexical,
    LimitExceeded,
}

// Parse error
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}:{line}:{column}: {message}", .file_path.display())]
pub struct ParseError {
    pub file_path: PathBuf,
    pub line: usize,
    pub column: usize,
    /// Name of the grammar rule that was expected
    pub rule: &'static str,
    pub message: String,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(super) fn expected(rule: &'static str, token: &Token, file_path: &Path) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
            line: token.line,
            column: token.column,
            rule,
            message: format!("Expected {}, found {}", rule, token.kind.describe()),
            kind: ParseErrorKind::Syntax,
        }
    }

    pub(super) fn limit_exceeded(message: String, token: &Token, file_path: &Path) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
            line: token.line,
            column: token.column,
            rule: "nesting limit",
            message,
            kind: ParseErrorKind::LimitExceeded,
        }
    }

    pub(super) fn from_lex(error: LexError, file_path: &Path) -> Self {
        let kind = if error.limit_exceeded {
            ParseErrorKind::LimitExceeded
        } else {
            ParseErrorKind::Lexical
        };
        Self {
            file_path: file_path.to_path_buf(),
            line: error.line,
            column: error.column,
            rule: "token",
            message: error.message,
            kind,
        }
    }

    pub fn is_syntax(&self) -> bool {
        self.kind == ParseErrorKind::Syntax
    }
}

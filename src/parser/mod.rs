// Parser module - splits the JASS grammar into logical components
//
// The grammar is an ordered choice: every alternative is tried in turn and
// the first one that matches wins. A failing alternative rewinds the token
// cursor (see `attempt`), so only `Syntax` errors are ever backtracked over.
// Declarations are registered in the session's symbol tables as soon as they
// are matched, which lets later rules resolve references to them.
mod declarations;
mod error;
mod expressions;
mod helpers;
mod statements;

// Public exports
pub use error::{ParseError, ParseErrorKind};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::ast::{Expression, File};
use crate::lexer::{Token, TokenKind, lex};
use crate::limits::CompilerLimits;
use crate::symbols::{SymbolTables, VarId};

pub(crate) type ParseResult<T> = Result<T, ParseError>;

// Parser structure
pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    file_path: PathBuf,
    tables: &'a mut SymbolTables,
    limits: &'a CompilerLimits,
    depth: usize,
    /// Parameters and locals of the function being parsed
    scope: HashMap<String, VarId>,
    /// Syntax failure at the furthest token reached so far
    furthest: Option<(usize, ParseError)>,
}

impl<'a> Parser<'a> {
    pub fn new(
        tokens: Vec<Token>,
        file_path: PathBuf,
        tables: &'a mut SymbolTables,
        limits: &'a CompilerLimits,
    ) -> Self {
        Self {
            tokens,
            current: 0,
            file_path,
            tables,
            limits,
            depth: 0,
            scope: HashMap::new(),
            furthest: None,
        }
    }

    // Main parsing entry point
    pub fn parse_file(mut self) -> ParseResult<File> {
        let result = self.parse_file_inner();
        result.map_err(|error| self.furthest_error(error))
    }

    fn parse_file_inner(&mut self) -> ParseResult<File> {
        self.skip_newlines();
        let declarations = self.parse_declarations()?;

        let mut functions = Vec::new();
        while let Some(function) = self.attempt(Self::parse_function)? {
            debug!(
                function = self.tables.functions.get(function.declaration).identifier,
                "parsed function"
            );
            functions.push(function);
        }

        self.expect_end_of_input()?;

        Ok(File {
            path: self.file_path.clone(),
            declarations,
            functions,
        })
    }

    /// Parse a single expression spanning the whole input
    pub fn parse_standalone_expression(mut self) -> ParseResult<Expression> {
        let result = self.parse_expression().and_then(|expression| {
            self.expect_end_of_input()?;
            Ok(expression)
        });
        result.map_err(|error| self.furthest_error(error))
    }

    fn expect_end_of_input(&mut self) -> ParseResult<()> {
        self.skip_newlines();
        if self.check(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.expected("end of file"))
        }
    }

    /// Ordered-choice step: run `rule`, rewinding on a syntax failure
    ///
    /// Returns `Ok(None)` when the rule did not match. Lexical and limit
    /// errors are not alternatives' business and propagate unchanged.
    pub(super) fn attempt<T>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Option<T>> {
        let start = self.current;
        match rule(self) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.is_syntax() => {
                self.current = start;
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// First alternative that matches, or a failure naming `rule`
    pub(super) fn choice<T>(
        &mut self,
        rule: &'static str,
        alternatives: &[fn(&mut Self) -> ParseResult<T>],
    ) -> ParseResult<T> {
        for alternative in alternatives {
            if let Some(value) = self.attempt(*alternative)? {
                return Ok(value);
            }
        }
        Err(self.expected(rule))
    }

    /// Syntax failure at the current token, remembered if it is the furthest one
    pub(super) fn expected(&mut self, rule: &'static str) -> ParseError {
        let error = ParseError::expected(rule, self.current_token(), &self.file_path);
        let is_further = self
            .furthest
            .as_ref()
            .is_none_or(|(position, _)| self.current >= *position);
        if is_further {
            self.furthest = Some((self.current, error.clone()));
        }
        error
    }

    /// Syntax failures are reported at the furthest point the parse reached
    fn furthest_error(&mut self, error: ParseError) -> ParseError {
        match (error.kind, self.furthest.take()) {
            (ParseErrorKind::Syntax, Some((_, furthest))) => furthest,
            _ => error,
        }
    }
}

// Public API function
#[instrument(skip_all, fields(path = %file_path.as_ref().display()))]
pub fn parse(
    source: &str,
    file_path: impl AsRef<Path>,
    tables: &mut SymbolTables,
    limits: &CompilerLimits,
) -> Result<File, ParseError> {
    let file_path = file_path.as_ref();
    let tokens = lex(source, limits).map_err(|error| ParseError::from_lex(error, file_path))?;
    debug!(tokens = tokens.len(), "lexed");
    Parser::new(tokens, file_path.to_path_buf(), tables, limits).parse_file()
}

/// Parse one expression, resolving names against `tables`
pub fn parse_expression(
    source: &str,
    tables: &mut SymbolTables,
    limits: &CompilerLimits,
) -> Result<Expression, ParseError> {
    let file_path = Path::new("<expression>");
    let tokens = lex(source, limits).map_err(|error| ParseError::from_lex(error, file_path))?;
    Parser::new(tokens, file_path.to_path_buf(), tables, limits).parse_standalone_expression()
}

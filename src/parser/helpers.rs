use super::ParseResult;
use super::error::ParseError;
use crate::ast::SourceLocation;
use crate::lexer::{Token, TokenKind};
use crate::symbols::{FunctionReference, Reference, TypeReference, VarReference};

// Parser helper methods
impl<'a> super::Parser<'a> {
    // Helper: Get current token (the trailing Eof once input is exhausted)
    pub(super) fn current_token(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.current.min(last)]
    }

    pub(super) fn peek_kind(&self) -> &TokenKind {
        &self.current_token().kind
    }

    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(super) fn location(&self) -> SourceLocation {
        let token = self.current_token();
        SourceLocation::new(token.line, token.column)
    }

    /// Helper: Advance to the next token
    pub(super) fn advance(&mut self) {
        self.current = (self.current + 1).min(self.tokens.len());
    }

    /// Helper: Consume a specific token kind or fail naming `rule`
    pub(super) fn consume(&mut self, kind: TokenKind, rule: &'static str) -> ParseResult<()> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.expected(rule))
        }
    }

    /// Helper: Consume the token if it matches
    pub(super) fn eat(&mut self, kind: &TokenKind) -> bool {
        let matched = self.check(kind);
        if matched {
            self.advance();
        }
        matched
    }

    pub(super) fn consume_identifier(&mut self, rule: &'static str) -> ParseResult<String> {
        match self.peek_kind() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.expected(rule)),
        }
    }

    // Helper: Skip consecutive newlines
    pub(super) fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    /// One or more line breaks; the end of input also ends a line
    pub(super) fn line_break(&mut self) -> ParseResult<()> {
        if self.check(&TokenKind::Eof) {
            return Ok(());
        }
        self.consume(TokenKind::Newline, "newline")?;
        self.skip_newlines();
        Ok(())
    }

    /// Run `rule` one nesting level deeper, enforcing `max_expr_depth`
    pub(super) fn nested<T>(&mut self, rule: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= self.limits.max_expr_depth {
            return Err(ParseError::limit_exceeded(
                format!(
                    "Parsing nesting too deep: {} levels (max {}). Consider simplifying.",
                    self.depth, self.limits.max_expr_depth
                ),
                self.current_token(),
                &self.file_path,
            ));
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    // Name resolution against the session tables

    pub(super) fn resolve_type(&self, name: &str) -> TypeReference {
        self.tables.types.resolve(name)
    }

    /// Function scope first, then globals
    pub(super) fn resolve_var(&self, name: &str) -> VarReference {
        match self.scope.get(name) {
            Some(id) => Reference::Resolved(*id),
            None => self.tables.vars.resolve(name),
        }
    }

    pub(super) fn resolve_function(&self, name: &str) -> FunctionReference {
        self.tables.functions.resolve(name)
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::{TokenKind, lex};
    use crate::limits::CompilerLimits;
    use crate::parser::Parser;
    use crate::symbols::SymbolTables;

    #[test]
    fn test_line_break_accepts_end_of_input() {
        let limits = CompilerLimits::default();
        let mut tables = SymbolTables::new();
        let tokens = lex("x\n\n\ny", &limits).unwrap();
        let mut parser = Parser::new(tokens, "t.j".into(), &mut tables, &limits);

        assert_eq!(parser.consume_identifier("name").unwrap(), "x");
        assert!(parser.line_break().is_ok());
        assert_eq!(parser.consume_identifier("name").unwrap(), "y");
        assert!(parser.line_break().is_ok());
        assert!(parser.check(&TokenKind::Eof));
    }

    #[test]
    fn test_consume_reports_rule() {
        let limits = CompilerLimits::default();
        let mut tables = SymbolTables::new();
        let tokens = lex("endif", &limits).unwrap();
        let mut parser = Parser::new(tokens, "t.j".into(), &mut tables, &limits);

        let error = parser.consume(TokenKind::Then, "'then'").unwrap_err();
        assert_eq!(error.rule, "'then'");
        assert_eq!(error.message, "Expected 'then', found 'endif'");
        assert!(parser.eat(&TokenKind::EndIf));
    }

    #[test]
    fn test_local_scope_shadows_globals() {
        use crate::ast::SourceLocation;
        use crate::symbols::{Reference, VarDeclaration};

        let limits = CompilerLimits::default();
        let mut tables = SymbolTables::new();
        let make = |tables: &SymbolTables| VarDeclaration {
            type_ref: tables.types.resolve("integer"),
            is_array: false,
            identifier: "x".into(),
            initializer: None,
            location: SourceLocation::new(1, 1),
        };
        let global = make(&tables);
        let global = tables.vars.insert(global);
        let local = make(&tables);
        let local = tables.vars.push(local);

        let tokens = lex("", &limits).unwrap();
        let mut parser = Parser::new(tokens, "t.j".into(), &mut tables, &limits);
        assert_eq!(parser.resolve_var("x"), Reference::Resolved(global));
        parser.scope.insert("x".into(), local);
        assert_eq!(parser.resolve_var("x"), Reference::Resolved(local));
        assert_eq!(parser.resolve_var("y"), Reference::Unresolved("y".into()));
    }
}

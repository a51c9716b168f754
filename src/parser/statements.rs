use super::ParseResult;
use crate::ast::{DebugStatement, ElseIf, FunctionCall, If, Loop, Set, Statement, StatementKind};
use crate::lexer::TokenKind;

// Statement parsing
//
// A statement occupies one line (blocks span several); statements are
// separated by one or more line breaks.
impl<'a> super::Parser<'a> {
    /// `(statement NL+)*`
    pub(super) fn parse_statements(&mut self) -> ParseResult<Vec<Statement>> {
        let mut statements = Vec::new();
        while let Some(statement) = self.attempt(Self::parse_statement)? {
            statements.push(statement);
            self.line_break()?;
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        let location = self.location();
        let kind: StatementKind = self.choice(
            "statement",
            &[
                Self::parse_set_statement,
                Self::parse_call_statement,
                Self::parse_if_statement,
                Self::parse_loop_statement,
                Self::parse_exitwhen_statement,
                Self::parse_return_statement,
                Self::parse_debug_statement,
            ],
        )?;
        Ok(Statement { kind, location })
    }

    fn parse_set_statement(&mut self) -> ParseResult<StatementKind> {
        self.parse_set().map(StatementKind::Set)
    }

    fn parse_call_statement(&mut self) -> ParseResult<StatementKind> {
        self.parse_call().map(StatementKind::Call)
    }

    fn parse_if_statement(&mut self) -> ParseResult<StatementKind> {
        self.parse_if().map(StatementKind::If)
    }

    fn parse_loop_statement(&mut self) -> ParseResult<StatementKind> {
        self.parse_loop().map(StatementKind::Loop)
    }

    fn parse_exitwhen_statement(&mut self) -> ParseResult<StatementKind> {
        self.consume(TokenKind::ExitWhen, "'exitwhen'")?;
        Ok(StatementKind::ExitWhen(self.parse_expression()?))
    }

    fn parse_return_statement(&mut self) -> ParseResult<StatementKind> {
        self.consume(TokenKind::Return, "'return'")?;
        let value = self.attempt(Self::parse_expression)?;
        Ok(StatementKind::Return(value))
    }

    /// `'debug' (set | call | if | loop)`
    fn parse_debug_statement(&mut self) -> ParseResult<StatementKind> {
        self.consume(TokenKind::Debug, "'debug'")?;

        let statement = if let Some(set) = self.attempt(Self::parse_set)? {
            DebugStatement::Set(set)
        } else if let Some(call) = self.attempt(Self::parse_call)? {
            DebugStatement::Call(call)
        } else if let Some(branch) = self.attempt(Self::parse_if)? {
            DebugStatement::If(branch)
        } else if let Some(body) = self.attempt(Self::parse_loop)? {
            DebugStatement::Loop(body)
        } else {
            return Err(self.expected("set, call, if or loop after 'debug'"));
        };

        Ok(StatementKind::Debug(statement))
    }

    /// `'set' var_ref ['[' expression ']'] '=' expression`
    fn parse_set(&mut self) -> ParseResult<Set> {
        self.consume(TokenKind::Set, "'set'")?;
        let name = self.consume_identifier("variable name")?;
        let var = self.resolve_var(&name);

        let index = if self.eat(&TokenKind::LBracket) {
            let index = self.parse_expression()?;
            self.consume(TokenKind::RBracket, "']'")?;
            Some(index)
        } else {
            None
        };

        self.consume(TokenKind::Assign, "'='")?;
        let value = self.parse_expression()?;

        Ok(Set { var, index, value })
    }

    fn parse_call(&mut self) -> ParseResult<FunctionCall> {
        self.consume(TokenKind::Call, "'call'")?;
        self.parse_function_call()
    }

    fn parse_if(&mut self) -> ParseResult<If> {
        self.nested(|parser| {
            parser.consume(TokenKind::If, "'if'")?;
            let condition = parser.parse_expression()?;
            parser.consume(TokenKind::Then, "'then'")?;
            parser.line_break()?;
            let then_statements = parser.parse_statements()?;

            let mut else_ifs = Vec::new();
            while parser.eat(&TokenKind::ElseIf) {
                let condition = parser.parse_expression()?;
                parser.consume(TokenKind::Then, "'then'")?;
                parser.line_break()?;
                let statements = parser.parse_statements()?;
                else_ifs.push(ElseIf {
                    condition,
                    statements,
                });
            }

            let else_statements = if parser.eat(&TokenKind::Else) {
                parser.line_break()?;
                Some(parser.parse_statements()?)
            } else {
                None
            };

            parser.consume(TokenKind::EndIf, "'endif'")?;

            Ok(If {
                condition,
                then_statements,
                else_ifs,
                else_statements,
            })
        })
    }

    fn parse_loop(&mut self) -> ParseResult<Loop> {
        self.nested(|parser| {
            parser.consume(TokenKind::Loop, "'loop'")?;
            parser.line_break()?;
            let statements = parser.parse_statements()?;
            parser.consume(TokenKind::EndLoop, "'endloop'")?;
            Ok(Loop { statements })
        })
    }
}

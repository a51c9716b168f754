use super::ParseResult;
use crate::ast::{
    ArrayReference, BinaryOperation, BinaryOperator, Const, Expression, FunctionCall,
    UnaryOperation, UnaryOperator,
};
use crate::lexer::TokenKind;

// Expression parsing
//
// expression := binary_operation | unary_operation | function_call
//             | array_reference | function_ref | constant | var_reference
//             | parentheses
//
// The left operand of a binary operation is any alternative except another
// binary operation, so `a + b + c` is `a + (b + c)` and a left-nested
// operation must be written with parentheses. There is no precedence.
// Every right operand is parsed one level deeper, so a chain of n
// operators uses n levels of `max_expr_depth`.
impl<'a> super::Parser<'a> {
    pub(super) fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.nested(|parser| {
            // The operand is shared by binary_operation and the other
            // alternatives, so it is matched once
            let left = parser.parse_operand()?;
            match parser.attempt(Self::parse_binary_tail)? {
                Some((operator, right)) => Ok(Expression::Binary(Box::new(BinaryOperation {
                    left,
                    operator,
                    right,
                }))),
                None => Ok(left),
            }
        })
    }

    fn parse_binary_tail(&mut self) -> ParseResult<(BinaryOperator, Expression)> {
        let operator = self.parse_binary_operator()?;
        let right = self.parse_expression()?;
        Ok((operator, right))
    }

    /// `binary_operation_expression`: every alternative but binary_operation
    fn parse_operand(&mut self) -> ParseResult<Expression> {
        self.choice(
            "expression",
            &[
                Self::parse_unary_operation,
                Self::parse_function_call_expression,
                Self::parse_array_reference,
                Self::parse_function_reference,
                Self::parse_constant_expression,
                Self::parse_var_reference,
                Self::parse_parentheses,
            ],
        )
    }

    fn parse_binary_operator(&mut self) -> ParseResult<BinaryOperator> {
        let operator = match self.peek_kind() {
            TokenKind::Plus => BinaryOperator::Add,
            TokenKind::Minus => BinaryOperator::Subtract,
            TokenKind::Star => BinaryOperator::Multiply,
            TokenKind::Slash => BinaryOperator::Divide,
            TokenKind::Gt => BinaryOperator::Greater,
            TokenKind::Lt => BinaryOperator::Less,
            TokenKind::EqEq => BinaryOperator::Equal,
            TokenKind::NotEq => BinaryOperator::NotEqual,
            TokenKind::GtEq => BinaryOperator::GreaterOrEqual,
            TokenKind::LtEq => BinaryOperator::LessOrEqual,
            TokenKind::And => BinaryOperator::And,
            TokenKind::Or => BinaryOperator::Or,
            _ => return Err(self.expected("binary operator")),
        };
        self.advance();
        Ok(operator)
    }

    /// `('+' | '-' | 'not') expression`
    fn parse_unary_operation(&mut self) -> ParseResult<Expression> {
        let operator = match self.peek_kind() {
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Minus => UnaryOperator::Minus,
            TokenKind::Not => UnaryOperator::Not,
            _ => return Err(self.expected("unary operator")),
        };
        self.advance();
        let operand = self.parse_expression()?;
        Ok(Expression::Unary(Box::new(UnaryOperation { operator, operand })))
    }

    fn parse_function_call_expression(&mut self) -> ParseResult<Expression> {
        self.parse_function_call().map(Expression::Call)
    }

    /// `ID '(' [expression (',' expression)*] ')'`
    pub(super) fn parse_function_call(&mut self) -> ParseResult<FunctionCall> {
        let name = self.consume_identifier("function name")?;
        self.consume(TokenKind::LParen, "'('")?;

        let mut arguments = Vec::new();
        if !self.eat(&TokenKind::RParen) {
            loop {
                arguments.push(self.parse_expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.consume(TokenKind::RParen, "')'")?;
        }

        Ok(FunctionCall {
            function: self.resolve_function(&name),
            arguments,
        })
    }

    /// `ID '[' expression ']'`
    fn parse_array_reference(&mut self) -> ParseResult<Expression> {
        let name = self.consume_identifier("array name")?;
        self.consume(TokenKind::LBracket, "'['")?;
        let index = self.parse_expression()?;
        self.consume(TokenKind::RBracket, "']'")?;

        Ok(Expression::ArrayReference(Box::new(ArrayReference {
            var: self.resolve_var(&name),
            index,
        })))
    }

    /// `'function' ID`
    fn parse_function_reference(&mut self) -> ParseResult<Expression> {
        self.consume(TokenKind::Function, "'function'")?;
        let name = self.consume_identifier("function name")?;
        Ok(Expression::FunctionReference(self.resolve_function(&name)))
    }

    fn parse_constant_expression(&mut self) -> ParseResult<Expression> {
        self.parse_constant().map(Expression::Constant)
    }

    // Literal parsing; signs belong to unary operations, never to literals
    fn parse_constant(&mut self) -> ParseResult<Const> {
        let constant = match self.peek_kind() {
            TokenKind::Integer(value) => Const::Integer(*value),
            TokenKind::Real(value) => Const::Real(*value),
            TokenKind::FourCC(code) => Const::FourCC(*code),
            TokenKind::String(value) => Const::String(value.clone()),
            TokenKind::True => Const::Boolean(true),
            TokenKind::False => Const::Boolean(false),
            TokenKind::Null => Const::Null,
            _ => return Err(self.expected("constant")),
        };
        self.advance();
        Ok(constant)
    }

    fn parse_var_reference(&mut self) -> ParseResult<Expression> {
        let name = self.consume_identifier("variable name")?;
        Ok(Expression::VarReference(self.resolve_var(&name)))
    }

    /// `'(' expression ')'`
    fn parse_parentheses(&mut self) -> ParseResult<Expression> {
        self.consume(TokenKind::LParen, "'('")?;
        let inner = self.parse_expression()?;
        self.consume(TokenKind::RParen, "')'")?;
        Ok(Expression::Parentheses(Box::new(inner)))
    }
}

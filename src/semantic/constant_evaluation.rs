// Constant folding
//
// Folds literals, parentheses, unary `+ - not` and binary operations whose
// operands both fold. Integer arithmetic wraps like the game's 32-bit VM;
// integer division truncates. Anything else is "not constant".

use super::SemanticAnalyzer;
use crate::ast::{BinaryOperator, Const, Expression, UnaryOperator};

impl<'a> SemanticAnalyzer<'a> {
    /// Folds `expression` to a value if it is a compile-time constant
    ///
    /// The flag is false when folding failed; the value is then
    /// `Const::default()` and carries no meaning.
    pub fn evaluate_constant_expression(&self, expression: &Expression) -> (Const, bool) {
        match fold(expression) {
            Some(value) => (value, true),
            None => (Const::default(), false),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Integer(i32),
    Real(f32),
}

impl Number {
    fn from_const(value: &Const) -> Option<Self> {
        match value {
            Const::Integer(v) => Some(Number::Integer(*v)),
            Const::FourCC(code) => Some(Number::Integer(Const::fourcc_value(*code))),
            Const::Real(v) => Some(Number::Real(*v)),
            _ => None,
        }
    }

    fn as_real(self) -> f32 {
        match self {
            Number::Integer(v) => v as f32,
            Number::Real(v) => v,
        }
    }
}

fn fold(expression: &Expression) -> Option<Const> {
    match expression {
        Expression::Constant(value) => Some(value.clone()),
        Expression::Parentheses(inner) => fold(inner),
        Expression::Unary(unary) => fold_unary(unary.operator, fold(&unary.operand)?),
        Expression::Binary(binary) => {
            let left = fold(&binary.left)?;
            let right = fold(&binary.right)?;
            fold_binary(&left, binary.operator, &right)
        }
        Expression::Call(_)
        | Expression::ArrayReference(_)
        | Expression::FunctionReference(_)
        | Expression::VarReference(_) => None,
    }
}

fn fold_unary(operator: UnaryOperator, operand: Const) -> Option<Const> {
    match (operator, operand) {
        (UnaryOperator::Not, Const::Boolean(value)) => Some(Const::Boolean(!value)),
        (UnaryOperator::Not, _) => None,
        (operator, operand) => {
            let number = Number::from_const(&operand)?;
            let value = match (operator, number) {
                (UnaryOperator::Minus, Number::Integer(v)) => Const::Integer(v.wrapping_neg()),
                (UnaryOperator::Minus, Number::Real(v)) => Const::Real(-v),
                (_, Number::Integer(v)) => Const::Integer(v),
                (_, Number::Real(v)) => Const::Real(v),
            };
            Some(value)
        }
    }
}

fn fold_binary(left: &Const, operator: BinaryOperator, right: &Const) -> Option<Const> {
    if operator.is_logical() {
        let (Const::Boolean(a), Const::Boolean(b)) = (left, right) else {
            return None;
        };
        let value = match operator {
            BinaryOperator::And => *a && *b,
            _ => *a || *b,
        };
        return Some(Const::Boolean(value));
    }

    if operator.is_equality() {
        let equal = constants_equal(left, right)?;
        return Some(Const::Boolean(equal == (operator == BinaryOperator::Equal)));
    }

    if let (BinaryOperator::Add, Const::String(a), Const::String(b)) = (operator, left, right) {
        return Some(Const::String(format!("{a}{b}")));
    }

    let a = Number::from_const(left)?;
    let b = Number::from_const(right)?;

    if operator.is_ordering() {
        let ordering = match (a, b) {
            (Number::Integer(a), Number::Integer(b)) => a.partial_cmp(&b),
            _ => a.as_real().partial_cmp(&b.as_real()),
        }?;
        let value = match operator {
            BinaryOperator::Greater => ordering.is_gt(),
            BinaryOperator::Less => ordering.is_lt(),
            BinaryOperator::GreaterOrEqual => ordering.is_ge(),
            _ => ordering.is_le(),
        };
        return Some(Const::Boolean(value));
    }

    match (a, b) {
        (Number::Integer(a), Number::Integer(b)) => {
            let value = match operator {
                BinaryOperator::Add => a.wrapping_add(b),
                BinaryOperator::Subtract => a.wrapping_sub(b),
                BinaryOperator::Multiply => a.wrapping_mul(b),
                BinaryOperator::Divide if b == 0 => return None,
                BinaryOperator::Divide => a.wrapping_div(b),
                _ => return None,
            };
            Some(Const::Integer(value))
        }
        (a, b) => {
            let (a, b) = (a.as_real(), b.as_real());
            let value = match operator {
                BinaryOperator::Add => a + b,
                BinaryOperator::Subtract => a - b,
                BinaryOperator::Multiply => a * b,
                BinaryOperator::Divide if b == 0.0 => return None,
                BinaryOperator::Divide => a / b,
                _ => return None,
            };
            Some(Const::Real(value))
        }
    }
}

/// Equality of two folded values, None when they cannot be compared
fn constants_equal(left: &Const, right: &Const) -> Option<bool> {
    match (left, right) {
        (Const::String(a), Const::String(b)) => Some(a == b),
        (Const::Boolean(a), Const::Boolean(b)) => Some(a == b),
        (Const::Null, Const::Null) => Some(true),
        _ => match (Number::from_const(left)?, Number::from_const(right)?) {
            (Number::Integer(a), Number::Integer(b)) => Some(a == b),
            (a, b) => Some(a.as_real() == b.as_real()),
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Const;
    use crate::limits::CompilerLimits;
    use crate::parser::parse_expression;
    use crate::semantic::SemanticAnalyzer;
    use crate::symbols::SymbolTables;

    fn evaluate(source: &str) -> (Const, bool) {
        let mut tables = SymbolTables::new();
        let expression = parse_expression(source, &mut tables, &CompilerLimits::default())
            .unwrap_or_else(|e| panic!("failed to parse '{source}': {e}"));
        SemanticAnalyzer::from_tables(&tables).evaluate_constant_expression(&expression)
    }

    fn folds_to(source: &str, expected: Const) {
        assert_eq!(evaluate(source), (expected, true), "source: {source}");
    }

    fn not_constant(source: &str) {
        assert!(!evaluate(source).1, "'{source}' should not fold");
    }

    #[test]
    fn test_literals() {
        folds_to("200", Const::Integer(200));
        folds_to("$2FA83", Const::Integer(0x2FA83));
        folds_to("010", Const::Integer(8));
        folds_to("4.34", Const::Real(4.34));
        folds_to("\"text\"", Const::String("text".into()));
        folds_to("'AFDe'", Const::FourCC(*b"AFDe"));
        folds_to("null", Const::Null);
    }

    #[test]
    fn test_unary() {
        folds_to("-5", Const::Integer(-5));
        folds_to("-(10)", Const::Integer(-10));
        folds_to("-(10.4)", Const::Real(-10.4));
        folds_to("+(7)", Const::Integer(7));
        folds_to("not(true)", Const::Boolean(false));
        folds_to("not false", Const::Boolean(true));
        not_constant("not 1");
        not_constant("-\"text\"");
    }

    #[test]
    fn test_arithmetic() {
        folds_to("10 + 20", Const::Integer(30));
        folds_to("7 / 2", Const::Integer(3));
        folds_to("-7 / 2", Const::Integer(-3));
        folds_to("(2 * 3) - 1", Const::Integer(5));
        folds_to("7.0 / 2", Const::Real(3.5));
        folds_to("1 + 0.5", Const::Real(1.5));
        folds_to("2147483647 + 1", Const::Integer(i32::MIN));
        folds_to("\"ab\" + \"cd\"", Const::String("abcd".into()));
    }

    #[test]
    fn test_right_nesting_is_folded_as_written() {
        // 10 - (2 - 3)
        folds_to("10 - 2 - 3", Const::Integer(11));
    }

    #[test]
    fn test_comparisons_and_logic() {
        folds_to("1 == 1", Const::Boolean(true));
        folds_to("1 != 1.0", Const::Boolean(false));
        folds_to("\"a\" == \"b\"", Const::Boolean(false));
        folds_to("null == null", Const::Boolean(true));
        folds_to("(1 < 2) and true", Const::Boolean(true));
        folds_to("false or (3 >= 4)", Const::Boolean(false));
    }

    #[test]
    fn test_not_constant() {
        not_constant("GetUnit()");
        not_constant("x");
        not_constant("x[0]");
        not_constant("function F");
        not_constant("1 + F()");
        not_constant("1 / 0");
        not_constant("1.0 / 0.0");
        not_constant("\"a\" + 1");
        not_constant("true and 1");
        not_constant("\"a\" == 1");

        let (value, is_constant) = evaluate("F()");
        assert!(!is_constant);
        assert_eq!(value, Const::default());
    }
}

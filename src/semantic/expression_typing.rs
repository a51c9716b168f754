// Expression typing
//
// `expression_type` follows the language rule that a binary operation has
// the type of its left operand. `value_type` is what the checks compare:
// it is `boolean` for comparisons, equality, `and`, `or` and `not`.

use super::SemanticAnalyzer;
use super::type_compatibility::TypeCategory;
use crate::ast::{Const, Expression, UnaryOperator};
use crate::symbols::{Reference, TypeReference, VarReference};

impl<'a> SemanticAnalyzer<'a> {
    /// Canonical type of a literal; `fourcc` and `null` stay unresolved names
    pub fn constant_type(&self, constant: &Const) -> TypeReference {
        self.types.resolve(constant.type_name())
    }

    /// Type of an expression, or None when it cannot be known
    ///
    /// Unknown means an undeclared variable or function, or a call to a
    /// function that returns nothing.
    pub fn expression_type(&self, expression: &Expression) -> Option<TypeReference> {
        match expression {
            Expression::Constant(constant) => Some(self.constant_type(constant)),
            Expression::Binary(binary) => self.expression_type(&binary.left),
            Expression::Unary(unary) => self.expression_type(&unary.operand),
            Expression::Call(call) => match &call.function {
                Reference::Resolved(id) => self.functions.get(*id).return_type.clone(),
                Reference::Unresolved(_) => None,
            },
            Expression::ArrayReference(array) => self.variable_type(&array.var),
            Expression::VarReference(var) => self.variable_type(var),
            Expression::FunctionReference(_) => Some(self.types.resolve("code")),
            Expression::Parentheses(inner) => self.expression_type(inner),
        }
    }

    /// Type an expression yields as a value
    pub(super) fn value_type(&self, expression: &Expression) -> Option<TypeReference> {
        if self.yields_boolean(expression) {
            return Some(self.types.resolve("boolean"));
        }
        match expression {
            Expression::Parentheses(inner) => self.value_type(inner),
            Expression::Unary(unary) => self.value_type(&unary.operand),
            Expression::Binary(binary) => self.value_type(&binary.left),
            _ => self.expression_type(expression),
        }
    }

    /// Category of an operand, None when its type is unknown
    pub(super) fn operand_category(&self, expression: &Expression) -> Option<TypeCategory> {
        self.value_type(expression)
            .map(|type_ref| self.category_of_type(&type_ref))
    }

    fn yields_boolean(&self, expression: &Expression) -> bool {
        match expression {
            Expression::Binary(binary) => {
                let operator = binary.operator;
                operator.is_ordering() || operator.is_equality() || operator.is_logical()
            }
            Expression::Unary(unary) => unary.operator == UnaryOperator::Not,
            Expression::Parentheses(inner) => self.yields_boolean(inner),
            _ => false,
        }
    }

    fn variable_type(&self, var: &VarReference) -> Option<TypeReference> {
        var.id().map(|id| self.vars.get(id).type_ref.clone())
    }
}

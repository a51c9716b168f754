// Expression checking
//
// - Undeclared variables and function references
// - Operand categories of unary and binary operators
// - Array access: index type, constant bounds, array-ness of the variable

use super::type_compatibility::TypeCategory;
use super::{ARRAY_SIZE, SemanticAnalyzer};
use crate::ast::{BinaryOperation, BinaryOperator, Const, Expression, UnaryOperation, UnaryOperator};
use crate::report::Node;
use crate::symbols::{Reference, VarReference};

impl<'a> SemanticAnalyzer<'a> {
    pub(super) fn check_expression(&mut self, expression: &'a Expression) {
        let node = Node::Expression(expression);
        match expression {
            Expression::Constant(_) => {}
            Expression::Binary(binary) => {
                self.check_expression(&binary.left);
                self.check_expression(&binary.right);
                self.check_binary_operands(node, binary);
            }
            Expression::Unary(unary) => {
                self.check_expression(&unary.operand);
                self.check_unary_operand(node, unary);
            }
            Expression::Call(call) => self.check_call(node, call, true),
            Expression::ArrayReference(array) => {
                self.check_array_access(node, &array.var, Some(&array.index));
            }
            Expression::FunctionReference(function) => {
                if let Reference::Unresolved(name) = function {
                    self.report_undeclared(node, name);
                }
            }
            Expression::VarReference(var) => self.check_array_access(node, var, None),
            Expression::Parentheses(inner) => self.check_expression(inner),
        }
    }

    pub(super) fn report_undeclared(&mut self, node: Node<'a>, name: &str) {
        self.report(node, format!("undeclared identifier '{name}'"));
    }

    fn check_unary_operand(&mut self, node: Node<'a>, unary: &UnaryOperation) {
        let Some(category) = self.operand_category(&unary.operand) else {
            return;
        };
        if category.is_empty() {
            return;
        }

        let (valid, needed) = match unary.operator {
            UnaryOperator::Not => (category.contains(TypeCategory::BOOLEAN), "a boolean"),
            UnaryOperator::Plus | UnaryOperator::Minus => {
                (category.contains(TypeCategory::NUMERIC), "a numeric")
            }
        };
        if !valid {
            self.report(
                node,
                format!(
                    "operator '{}' needs {} operand, found {}",
                    unary.operator,
                    needed,
                    category.describe()
                ),
            );
        }
    }

    fn check_binary_operands(&mut self, node: Node<'a>, binary: &BinaryOperation) {
        let (Some(left), Some(right)) = (
            self.operand_category(&binary.left),
            self.operand_category(&binary.right),
        ) else {
            return;
        };
        if left.is_empty() || right.is_empty() {
            return;
        }

        let both = |category: TypeCategory| left.contains(category) && right.contains(category);
        let operator = binary.operator;
        let valid = if operator.is_arithmetic() {
            both(TypeCategory::NUMERIC) || (operator == BinaryOperator::Add && is_concatenation(left, right))
        } else if operator.is_ordering() {
            both(TypeCategory::NUMERIC)
        } else if operator.is_equality() {
            left.intersects(right) || left.contains(TypeCategory::NULL) || right.contains(TypeCategory::NULL)
        } else {
            both(TypeCategory::BOOLEAN)
        };

        if !valid {
            self.report(
                node,
                format!(
                    "operator '{}' cannot be applied to {} and {}",
                    operator,
                    left.describe(),
                    right.describe()
                ),
            );
        }
    }

    /// Checks `var` or `var[index]`, used in expressions and `set`
    pub(super) fn check_array_access(
        &mut self,
        node: Node<'a>,
        var: &VarReference,
        index: Option<&'a Expression>,
    ) {
        if let Some(index) = index {
            self.check_array_index(node, index);
        }

        let id = match var {
            Reference::Resolved(id) => *id,
            Reference::Unresolved(name) => {
                self.report_undeclared(node, name);
                return;
            }
        };

        let vars = self.vars;
        let declaration = vars.get(id);
        match (declaration.is_array, index.is_some()) {
            (false, true) => {
                self.report(node, format!("'{}' is not an array", declaration.identifier));
            }
            (true, false) => {
                self.report(
                    node,
                    format!("array '{}' is used without an index", declaration.identifier),
                );
            }
            _ => {}
        }
    }

    /// Index must be an integer and, when constant, lie in [0, ARRAY_SIZE)
    fn check_array_index(&mut self, node: Node<'a>, index: &'a Expression) {
        self.check_expression(index);

        if let Some(index_type) = self.value_type(index) {
            let is_integer = self.type_reference_is_of_base_type(&index_type, "integer")
                || self.type_name(&index_type) == "fourcc";
            if !is_integer && !self.category_of_type(&index_type).is_empty() {
                let found = self.type_name(&index_type).to_string();
                self.report(
                    node,
                    format!("array index must be of type integer, found {found}"),
                );
            }
        }

        let value = match self.evaluate_constant_expression(index) {
            (Const::Integer(value), true) => Some(value),
            (Const::FourCC(code), true) => Some(Const::fourcc_value(code)),
            _ => None,
        };
        if let Some(value) = value {
            if !(0..ARRAY_SIZE).contains(&value) {
                self.report(
                    node,
                    format!("array index {value} is out of bounds [0, {ARRAY_SIZE})"),
                );
            }
        }
    }
}

/// `string + string`, where either side may be `null`
fn is_concatenation(left: TypeCategory, right: TypeCategory) -> bool {
    let text = TypeCategory::STRING | TypeCategory::NULL;
    text.contains(left)
        && text.contains(right)
        && (left.contains(TypeCategory::STRING) || right.contains(TypeCategory::STRING))
}

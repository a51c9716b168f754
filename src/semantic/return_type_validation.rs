// Return type validation
//
// A `return` inside a function must agree with the declared return type:
// no value for `returns nothing`, a value otherwise, and a value
// assignable to the return type.

use super::SemanticAnalyzer;
use crate::ast::{Expression, Statement};
use crate::report::Node;

impl<'a> SemanticAnalyzer<'a> {
    pub(super) fn check_return(&mut self, statement: &'a Statement, value: Option<&'a Expression>) {
        let Some(function) = self.current_function else {
            return;
        };
        let functions = self.functions;
        let declaration = functions.get(function);
        let node = Node::Statement(statement);

        match (&declaration.return_type, value) {
            (None, None) => {}
            (None, Some(_)) => {
                self.report(
                    node,
                    "return expression for function without return type".to_string(),
                );
            }
            (Some(return_type), None) => {
                let message = format!(
                    "missing return value in function '{}' returning {}",
                    declaration.identifier,
                    self.type_name(return_type)
                );
                self.report(node, message);
            }
            (Some(return_type), Some(value)) => {
                let Some(value_type) = self.value_type(value) else {
                    return;
                };
                if !return_type.is_resolved() || self.is_assignable(return_type, &value_type) {
                    return;
                }
                let message = format!(
                    "return type mismatch in '{}': expected {}, found {}",
                    declaration.identifier,
                    self.type_name(return_type),
                    self.type_name(&value_type)
                );
                self.report(node, message);
            }
        }
    }
}

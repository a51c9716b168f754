// Function call type checking
//
// - Calls to undeclared functions
// - Argument count against the declared parameters
// - Each argument's type against its parameter's type
// - Calls used as values must return something

use super::SemanticAnalyzer;
use crate::ast::FunctionCall;
use crate::report::Node;
use crate::symbols::Reference;

impl<'a> SemanticAnalyzer<'a> {
    /// Type checks a call statement or call expression
    ///
    /// `used_as_value` is true for calls inside expressions, where a
    /// function returning nothing has no value to offer.
    pub(super) fn check_call(&mut self, node: Node<'a>, call: &'a FunctionCall, used_as_value: bool) {
        for argument in &call.arguments {
            self.check_expression(argument);
        }

        let id = match &call.function {
            Reference::Resolved(id) => *id,
            Reference::Unresolved(name) => {
                self.report_undeclared(node, name);
                return;
            }
        };

        let functions = self.functions;
        let declaration = functions.get(id);
        let name = &declaration.identifier;

        if used_as_value && declaration.return_type.is_none() {
            self.report(
                node,
                format!("function '{name}' returns nothing and cannot be used as a value"),
            );
        }

        if call.arguments.len() != declaration.parameters.len() {
            self.report(
                node,
                format!(
                    "function '{}' takes {} argument(s) but {} were given",
                    name,
                    declaration.parameters.len(),
                    call.arguments.len()
                ),
            );
            return;
        }

        for (position, (argument, parameter)) in
            call.arguments.iter().zip(&declaration.parameters).enumerate()
        {
            let Some(argument_type) = self.value_type(argument) else {
                continue;
            };
            if !self.is_assignable(&parameter.type_ref, &argument_type) {
                let message = format!(
                    "argument {} of '{}' must be {}, found {}",
                    position + 1,
                    name,
                    self.type_name(&parameter.type_ref),
                    self.type_name(&argument_type)
                );
                self.report(Node::Expression(argument), message);
            }
        }
    }
}

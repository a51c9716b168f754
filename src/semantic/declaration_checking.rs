// Declaration checking
//
// - `type X extends Y` with an undeclared parent
// - Globals and locals: declared type, array initializers, `constant`
//   without a value, initializer compatibility
// - Native and function signatures: parameter and return types

use super::SemanticAnalyzer;
use crate::ast::{Declarations, Global};
use crate::report::Node;
use crate::symbols::{FunctionId, Reference, VarId};

impl<'a> SemanticAnalyzer<'a> {
    pub(super) fn check_declarations(&mut self, declarations: &'a Declarations) {
        let types = self.types;
        for id in &declarations.types {
            let declaration = types.get(*id);
            if let Some(Reference::Unresolved(parent)) = &declaration.parent {
                self.location = declaration.location.unwrap_or_default();
                self.report_undeclared(Node::TypeDeclaration(*id), parent);
            }
        }

        for global in &declarations.globals {
            self.check_global(global);
        }

        let functions = self.functions;
        for native in &declarations.natives {
            self.location = functions.get(native.declaration).location;
            self.check_signature(Node::Native(native), native.declaration);
        }
    }

    fn check_global(&mut self, global: &'a Global) {
        let vars = self.vars;
        let declaration = vars.get(global.declaration);
        self.location = declaration.location;
        let node = Node::Global(global);

        if global.is_constant && declaration.initializer.is_none() {
            self.report(
                node,
                format!("constant '{}' has no initializer", declaration.identifier),
            );
        }
        self.check_variable_declaration(node, global.declaration);
    }

    pub(super) fn check_local(&mut self, id: VarId) {
        let vars = self.vars;
        self.location = vars.get(id).location;
        self.check_variable_declaration(Node::Variable(id), id);
    }

    fn check_variable_declaration(&mut self, node: Node<'a>, id: VarId) {
        let vars = self.vars;
        let declaration = vars.get(id);

        if let Reference::Unresolved(type_name) = &declaration.type_ref {
            self.report_undeclared(node, type_name);
        }

        let Some(initializer) = &declaration.initializer else {
            return;
        };
        if declaration.is_array {
            self.report(
                node,
                format!("array '{}' cannot have an initializer", declaration.identifier),
            );
        }
        self.check_expression(initializer);
        self.check_assignment(node, &declaration.identifier, &declaration.type_ref, initializer);
    }

    /// Reports undeclared parameter and return types
    pub(super) fn check_signature(&mut self, node: Node<'a>, id: FunctionId) {
        let functions = self.functions;
        let declaration = functions.get(id);

        for parameter in &declaration.parameters {
            if let Reference::Unresolved(type_name) = &parameter.type_ref {
                self.report_undeclared(node, type_name);
            }
        }
        if let Some(Reference::Unresolved(type_name)) = &declaration.return_type {
            self.report_undeclared(node, type_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::SourceLocation;
    use crate::report::Node;
    use crate::semantic::check;
    use crate::semantic::test_support::{messages, parse_program};

    #[test]
    fn test_constant_globals() {
        assert_eq!(
            messages("globals\n    constant integer A\nendglobals\n"),
            vec!["constant 'A' has no initializer"]
        );
        assert!(messages("globals\n    constant integer A = 1\nendglobals\n").is_empty());
        // Only globals carry values; constant natives are fine
        assert!(messages("constant native GetA takes nothing returns integer\n").is_empty());
    }

    #[test]
    fn test_initializers() {
        assert_eq!(
            messages("globals\n    integer B = \"text\"\nendglobals\n"),
            vec!["cannot assign string to 'B' of type integer"]
        );
        assert_eq!(
            messages("globals\n    integer array C = 1\nendglobals\n"),
            vec!["array 'C' cannot have an initializer"]
        );
        assert!(messages("globals\n    real R = 1\n    integer I = 'A000'\nendglobals\n").is_empty());
        assert_eq!(
            messages(
                "function F takes nothing returns nothing\n    local integer i = undefined\nendfunction\n"
            ),
            vec!["undeclared identifier 'undefined'"]
        );
    }

    #[test]
    fn test_undeclared_types() {
        assert_eq!(
            messages("type unit extends widget\n"),
            vec!["undeclared identifier 'widget'"]
        );
        assert_eq!(
            messages("globals\n    unit u = null\nendglobals\n"),
            vec!["undeclared identifier 'unit'"]
        );
        assert_eq!(
            messages("native KillUnit takes unit u returns item\n"),
            vec!["undeclared identifier 'unit'", "undeclared identifier 'item'"]
        );
    }

    #[test]
    fn test_declaration_nodes_and_locations() {
        let source = "\
type unit extends widget
function F takes nothing returns nothing
    local lightning l
endfunction
";
        let (program, tables) = parse_program(source);
        let reports = check(&program, &tables.types, &tables.vars, &tables.functions);
        assert_eq!(reports.len(), 3);

        assert!(matches!(reports[0].node, Node::TypeDeclaration(_)));
        assert_eq!(reports[0].location, SourceLocation::new(1, 1));

        assert!(matches!(reports[1].node, Node::Variable(_)));
        assert_eq!(reports[1].message, "undeclared identifier 'lightning'");
        assert_eq!(reports[1].location.line, 3);

        // Never destroyed, even though its type is undeclared
        assert!(reports[2].message.contains("DestroyLightning"));
    }
}

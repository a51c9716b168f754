// Statement checking
//
// Walks a function body. Each statement becomes the current location for
// the reports it produces, including those of nested expressions.

use super::SemanticAnalyzer;
use super::type_compatibility::TypeCategory;
use crate::ast::{DebugStatement, Expression, Function, If, Set, Statement, StatementKind};
use crate::report::Node;
use crate::symbols::{Reference, TypeReference};

impl<'a> SemanticAnalyzer<'a> {
    pub(super) fn check_function(&mut self, function: &'a Function) {
        self.current_function = Some(function.declaration);

        let functions = self.functions;
        self.location = functions.get(function.declaration).location;
        self.check_signature(Node::Function(function), function.declaration);

        for local in &function.locals {
            self.check_local(*local);
        }
        self.check_statements(&function.statements);

        self.current_function = None;
    }

    fn check_statements(&mut self, statements: &'a [Statement]) {
        for statement in statements {
            self.check_statement(statement);
        }
    }

    fn check_statement(&mut self, statement: &'a Statement) {
        self.location = statement.location;
        let node = Node::Statement(statement);

        match &statement.kind {
            StatementKind::Set(set) => self.check_set(node, set),
            StatementKind::Call(call) => self.check_call(node, call, false),
            StatementKind::If(if_statement) => self.check_if(statement, if_statement),
            StatementKind::Loop(body) => self.check_statements(&body.statements),
            StatementKind::ExitWhen(condition) => {
                self.check_expression(condition);
                self.check_condition(node, condition);
            }
            StatementKind::Return(value) => {
                if let Some(value) = value {
                    self.check_expression(value);
                }
                self.check_return(statement, value.as_ref());
            }
            StatementKind::Debug(inner) => match inner {
                DebugStatement::Set(set) => self.check_set(node, set),
                DebugStatement::Call(call) => self.check_call(node, call, false),
                DebugStatement::If(if_statement) => self.check_if(statement, if_statement),
                DebugStatement::Loop(body) => self.check_statements(&body.statements),
            },
        }
    }

    fn check_set(&mut self, node: Node<'a>, set: &'a Set) {
        self.check_array_access(node, &set.var, set.index.as_ref());
        self.check_expression(&set.value);

        let Reference::Resolved(id) = &set.var else {
            return;
        };
        let vars = self.vars;
        let declaration = vars.get(*id);
        if self.constants.contains(id) {
            self.report(
                node,
                format!("cannot assign to constant '{}'", declaration.identifier),
            );
        }
        self.check_assignment(node, &declaration.identifier, &declaration.type_ref, &set.value);
    }

    fn check_if(&mut self, statement: &'a Statement, if_statement: &'a If) {
        let node = Node::Statement(statement);

        self.check_expression(&if_statement.condition);
        self.check_condition(node, &if_statement.condition);
        self.check_statements(&if_statement.then_statements);

        for else_if in &if_statement.else_ifs {
            // Nested statements moved the location
            self.location = statement.location;
            self.check_expression(&else_if.condition);
            self.check_condition(node, &else_if.condition);
            self.check_statements(&else_if.statements);
        }

        if let Some(statements) = &if_statement.else_statements {
            self.check_statements(statements);
        }
    }

    fn check_condition(&mut self, node: Node<'a>, condition: &Expression) {
        let Some(category) = self.operand_category(condition) else {
            return;
        };
        if !category.is_empty() && !category.contains(TypeCategory::BOOLEAN) {
            self.report(
                node,
                format!("condition must be boolean, found {}", category.describe()),
            );
        }
    }

    /// Reports `value` when it cannot be stored in `name` of type `target`
    pub(super) fn check_assignment(
        &mut self,
        node: Node<'a>,
        name: &str,
        target: &TypeReference,
        value: &Expression,
    ) {
        // An undeclared target type is reported with its declaration
        if !target.is_resolved() {
            return;
        }
        let Some(value_type) = self.value_type(value) else {
            return;
        };
        if !self.is_assignable(target, &value_type) {
            let message = format!(
                "cannot assign {} to '{}' of type {}",
                self.type_name(&value_type),
                name,
                self.type_name(target)
            );
            self.report(node, message);
        }
    }
}

//! Pretty printer for parsed JASS files
//!
//! Renders a [`File`] back to source text. Expressions keep the nesting
//! they were parsed with, so printing then re-parsing yields the same AST
//! shape. Types, globals and natives keep their source order, since names
//! resolve while parsing; functions follow.

use crate::ast::{
    Const, DebugStatement, Expression, File, FunctionCall, Global, If, Native, Set, Statement,
    StatementKind, UnaryOperator,
};
use crate::symbols::{
    Declaration, FunctionId, Reference, SymbolTable, SymbolTables, TypeId, VarDeclaration,
};

const INDENT: &str = "    ";

struct Formatter<'t> {
    buffer: String,
    indent_level: usize,
    tables: &'t SymbolTables,
}

impl<'t> Formatter<'t> {
    fn new(tables: &'t SymbolTables) -> Self {
        Self {
            buffer: String::new(),
            indent_level: 0,
            tables,
        }
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.buffer.push_str(INDENT);
        }
    }

    fn write_str(&mut self, s: &str) {
        self.buffer.push_str(s);
    }

    fn write_newline(&mut self) {
        self.buffer.push('\n');
    }

    /// Writes one indented line
    fn line(&mut self, s: &str) {
        self.write_indent();
        self.write_str(s);
        self.write_newline();
    }

    fn finish(self) -> String {
        self.buffer
    }
}

/// Name a reference prints as, resolved or not
fn reference_name<'r, T: Declaration>(table: &'r SymbolTable<T>, reference: &'r Reference<T>) -> &'r str {
    match reference {
        Reference::Resolved(id) => table.get(*id).identifier(),
        Reference::Unresolved(name) => name,
    }
}

/// A top-level declaration, in the order the source declared it
#[derive(Clone, Copy)]
enum Item {
    Type(TypeId),
    Global(Global),
    Native(Native),
}

/// Types, globals and natives merged back into source order
fn declarations_in_source_order(file: &File, tables: &SymbolTables) -> Vec<Item> {
    let types = file.declarations.types.iter().map(|id| {
        let location = tables.types.get(*id).location.unwrap_or_default();
        (location, Item::Type(*id))
    });
    let globals = file.declarations.globals.iter().map(|global| {
        (tables.vars.get(global.declaration).location, Item::Global(*global))
    });
    let natives = file.declarations.natives.iter().map(|native| {
        (tables.functions.get(native.declaration).location, Item::Native(*native))
    });

    let mut items: Vec<_> = types.chain(globals).chain(natives).collect();
    items.sort_by_key(|(location, _)| *location);
    items.into_iter().map(|(_, item)| item).collect()
}

pub fn print_file(file: &File, tables: &SymbolTables) -> String {
    let mut fmt = Formatter::new(tables);
    let mut in_globals = false;

    for item in declarations_in_source_order(file, tables) {
        match item {
            Item::Global(global) => {
                if !in_globals {
                    fmt.line("globals");
                    fmt.indent();
                    in_globals = true;
                }
                fmt.write_indent();
                if global.is_constant {
                    fmt.write_str("constant ");
                }
                format_var_declaration(tables.vars.get(global.declaration), &mut fmt);
                fmt.write_newline();
                continue;
            }
            _ if in_globals => {
                fmt.dedent();
                fmt.line("endglobals");
                in_globals = false;
            }
            _ => {}
        }

        match item {
            Item::Type(id) => {
                let declaration = tables.types.get(id);
                fmt.write_str("type ");
                fmt.write_str(&declaration.identifier);
                if let Some(parent) = &declaration.parent {
                    fmt.write_str(" extends ");
                    fmt.write_str(reference_name(&tables.types, parent));
                }
                fmt.write_newline();
            }
            Item::Native(native) => {
                if native.is_constant {
                    fmt.write_str("constant ");
                }
                fmt.write_str("native ");
                format_function_head(native.declaration, &mut fmt);
                fmt.write_newline();
            }
            Item::Global(_) => {}
        }
    }
    if in_globals {
        fmt.dedent();
        fmt.line("endglobals");
    }

    for function in &file.functions {
        fmt.write_newline();
        if function.is_constant {
            fmt.write_str("constant ");
        }
        fmt.write_str("function ");
        format_function_head(function.declaration, &mut fmt);
        fmt.write_newline();

        fmt.indent();
        for local in &function.locals {
            fmt.write_indent();
            fmt.write_str("local ");
            format_var_declaration(tables.vars.get(*local), &mut fmt);
            fmt.write_newline();
        }
        format_statements(&function.statements, &mut fmt);
        fmt.dedent();
        fmt.line("endfunction");
    }

    fmt.finish()
}

/// Renders a single expression
pub fn print_expression(expression: &Expression, tables: &SymbolTables) -> String {
    let mut fmt = Formatter::new(tables);
    format_expression(expression, &mut fmt);
    fmt.finish()
}

fn format_var_declaration(declaration: &VarDeclaration, fmt: &mut Formatter) {
    let tables = fmt.tables;
    fmt.write_str(reference_name(&tables.types, &declaration.type_ref));
    if declaration.is_array {
        fmt.write_str(" array");
    }
    fmt.write_str(" ");
    fmt.write_str(&declaration.identifier);
    if let Some(initializer) = &declaration.initializer {
        fmt.write_str(" = ");
        format_expression(initializer, fmt);
    }
}

fn format_function_head(id: FunctionId, fmt: &mut Formatter) {
    let tables = fmt.tables;
    let declaration = tables.functions.get(id);

    fmt.write_str(&declaration.identifier);
    fmt.write_str(" takes ");
    if declaration.parameters.is_empty() {
        fmt.write_str("nothing");
    }
    for (i, parameter) in declaration.parameters.iter().enumerate() {
        if i > 0 {
            fmt.write_str(", ");
        }
        fmt.write_str(reference_name(&tables.types, &parameter.type_ref));
        fmt.write_str(" ");
        fmt.write_str(&parameter.identifier);
    }
    fmt.write_str(" returns ");
    match &declaration.return_type {
        Some(return_type) => fmt.write_str(reference_name(&tables.types, return_type)),
        None => fmt.write_str("nothing"),
    }
}

fn format_statements(statements: &[Statement], fmt: &mut Formatter) {
    for statement in statements {
        fmt.write_indent();
        match &statement.kind {
            StatementKind::Set(set) => format_set(set, fmt),
            StatementKind::Call(call) => {
                fmt.write_str("call ");
                format_call(call, fmt);
            }
            StatementKind::If(if_statement) => format_if(if_statement, fmt),
            StatementKind::Loop(body) => format_loop(&body.statements, fmt),
            StatementKind::ExitWhen(condition) => {
                fmt.write_str("exitwhen ");
                format_expression(condition, fmt);
            }
            StatementKind::Return(value) => {
                fmt.write_str("return");
                if let Some(value) = value {
                    fmt.write_str(" ");
                    format_expression(value, fmt);
                }
            }
            StatementKind::Debug(inner) => {
                fmt.write_str("debug ");
                match inner {
                    DebugStatement::Set(set) => format_set(set, fmt),
                    DebugStatement::Call(call) => {
                        fmt.write_str("call ");
                        format_call(call, fmt);
                    }
                    DebugStatement::If(if_statement) => format_if(if_statement, fmt),
                    DebugStatement::Loop(body) => format_loop(&body.statements, fmt),
                }
            }
        }
        fmt.write_newline();
    }
}

fn format_set(set: &Set, fmt: &mut Formatter) {
    let tables = fmt.tables;
    fmt.write_str("set ");
    fmt.write_str(reference_name(&tables.vars, &set.var));
    if let Some(index) = &set.index {
        fmt.write_str("[");
        format_expression(index, fmt);
        fmt.write_str("]");
    }
    fmt.write_str(" = ");
    format_expression(&set.value, fmt);
}

// Block statements leave the closing keyword unterminated; the caller ends the line
fn format_if(if_statement: &If, fmt: &mut Formatter) {
    fmt.write_str("if ");
    format_expression(&if_statement.condition, fmt);
    fmt.write_str(" then");
    fmt.write_newline();
    format_block(&if_statement.then_statements, fmt);

    for else_if in &if_statement.else_ifs {
        fmt.write_indent();
        fmt.write_str("elseif ");
        format_expression(&else_if.condition, fmt);
        fmt.write_str(" then");
        fmt.write_newline();
        format_block(&else_if.statements, fmt);
    }

    if let Some(statements) = &if_statement.else_statements {
        fmt.line("else");
        format_block(statements, fmt);
    }

    fmt.write_indent();
    fmt.write_str("endif");
}

fn format_loop(statements: &[Statement], fmt: &mut Formatter) {
    fmt.write_str("loop");
    fmt.write_newline();
    format_block(statements, fmt);
    fmt.write_indent();
    fmt.write_str("endloop");
}

fn format_block(statements: &[Statement], fmt: &mut Formatter) {
    fmt.indent();
    format_statements(statements, fmt);
    fmt.dedent();
}

fn format_call(call: &FunctionCall, fmt: &mut Formatter) {
    let tables = fmt.tables;
    fmt.write_str(reference_name(&tables.functions, &call.function));
    fmt.write_str("(");
    for (i, argument) in call.arguments.iter().enumerate() {
        if i > 0 {
            fmt.write_str(", ");
        }
        format_expression(argument, fmt);
    }
    fmt.write_str(")");
}

fn format_expression(expression: &Expression, fmt: &mut Formatter) {
    let tables = fmt.tables;
    match expression {
        Expression::Constant(constant) => format_constant(constant, fmt),
        Expression::Binary(binary) => {
            format_expression(&binary.left, fmt);
            fmt.write_str(" ");
            fmt.write_str(binary.operator.symbol());
            fmt.write_str(" ");
            format_expression(&binary.right, fmt);
        }
        Expression::Unary(unary) => {
            fmt.write_str(unary.operator.symbol());
            // `not` is a keyword and needs a separator
            if unary.operator == UnaryOperator::Not {
                fmt.write_str(" ");
            }
            format_expression(&unary.operand, fmt);
        }
        Expression::Call(call) => format_call(call, fmt),
        Expression::ArrayReference(array) => {
            fmt.write_str(reference_name(&tables.vars, &array.var));
            fmt.write_str("[");
            format_expression(&array.index, fmt);
            fmt.write_str("]");
        }
        Expression::FunctionReference(function) => {
            fmt.write_str("function ");
            fmt.write_str(reference_name(&tables.functions, function));
        }
        Expression::VarReference(var) => fmt.write_str(reference_name(&tables.vars, var)),
        Expression::Parentheses(inner) => {
            fmt.write_str("(");
            format_expression(inner, fmt);
            fmt.write_str(")");
        }
    }
}

fn format_constant(constant: &Const, fmt: &mut Formatter) {
    match constant {
        // Literals are unsigned; a negative value came from a wrapped hex literal
        Const::Integer(value) if *value < 0 => {
            fmt.write_str(&format!("${:08X}", *value as u32));
        }
        constant => fmt.write_str(&constant.to_string()),
    }
}

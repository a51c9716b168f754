use tracing::debug;

use super::ParseResult;
use crate::ast::{Declarations, Function, Global, Native, SourceLocation, Statement};
use crate::lexer::TokenKind;
use crate::symbols::{FunctionDeclaration, FunctionId, Parameter, Type, TypeId, VarDeclaration, VarId};

// Top-level declarations: types, globals blocks, natives and functions
impl<'a> super::Parser<'a> {
    /// `(type_decl | globals | native)*`, each ended by a line break
    pub(super) fn parse_declarations(&mut self) -> ParseResult<Declarations> {
        let mut declarations = Declarations::default();

        loop {
            if let Some(id) = self.attempt(Self::parse_type_declaration)? {
                declarations.types.push(id);
            } else if let Some(globals) = self.attempt(Self::parse_globals)? {
                declarations.globals.extend(globals);
            } else if let Some(native) = self.attempt(Self::parse_native)? {
                declarations.natives.push(native);
            } else {
                break;
            }
            self.line_break()?;
        }

        Ok(declarations)
    }

    /// `type ID extends type_ref`
    fn parse_type_declaration(&mut self) -> ParseResult<TypeId> {
        let location = self.location();
        self.consume(TokenKind::Type, "'type'")?;
        let identifier = self.consume_identifier("type name")?;
        self.consume(TokenKind::Extends, "'extends'")?;
        let parent = self.consume_identifier("parent type")?;

        let declaration = Type {
            identifier,
            parent: Some(self.resolve_type(&parent)),
            location: Some(location),
        };
        debug!(name = declaration.identifier, parent, "registered type");
        Ok(self.tables.types.insert(declaration))
    }

    fn parse_globals(&mut self) -> ParseResult<Vec<Global>> {
        self.consume(TokenKind::Globals, "'globals'")?;
        self.line_break()?;

        let mut globals = Vec::new();
        while let Some(global) = self.attempt(Self::parse_global)? {
            globals.push(global);
            self.line_break()?;
        }

        self.consume(TokenKind::EndGlobals, "'endglobals'")?;
        Ok(globals)
    }

    /// `['constant'] type_ref ['array'] ID ['=' expression]`
    fn parse_global(&mut self) -> ParseResult<Global> {
        let location = self.location();
        let is_constant = self.eat(&TokenKind::Constant);
        let declaration = self.parse_var_declaration(location)?;

        debug!(name = declaration.identifier, is_constant, "registered global");
        Ok(Global {
            is_constant,
            declaration: self.tables.vars.insert(declaration),
        })
    }

    /// `['constant'] 'native' function_head`
    fn parse_native(&mut self) -> ParseResult<Native> {
        let location = self.location();
        let is_constant = self.eat(&TokenKind::Constant);
        self.consume(TokenKind::Native, "'native'")?;
        let declaration = self.parse_function_head(location)?;

        debug!(name = declaration.identifier, "registered native");
        Ok(Native {
            is_constant,
            declaration: self.tables.functions.insert(declaration),
        })
    }

    /// `ID 'takes' ('nothing' | param (',' param)*) 'returns' ('nothing' | type_ref)`
    fn parse_function_head(&mut self, location: SourceLocation) -> ParseResult<FunctionDeclaration> {
        let identifier = self.consume_identifier("function name")?;
        self.consume(TokenKind::Takes, "'takes'")?;

        let mut parameters = Vec::new();
        if !self.eat(&TokenKind::Nothing) {
            loop {
                let type_name = self.consume_identifier("parameter type")?;
                let identifier = self.consume_identifier("parameter name")?;
                parameters.push(Parameter {
                    type_ref: self.resolve_type(&type_name),
                    identifier,
                });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenKind::Returns, "'returns'")?;
        let return_type = if self.eat(&TokenKind::Nothing) {
            None
        } else {
            let type_name = self.consume_identifier("return type")?;
            Some(self.resolve_type(&type_name))
        };

        Ok(FunctionDeclaration {
            identifier,
            parameters,
            return_type,
            location,
        })
    }

    pub(super) fn parse_function(&mut self) -> ParseResult<Function> {
        let location = self.location();
        let is_constant = self.eat(&TokenKind::Constant);
        self.consume(TokenKind::Function, "'function'")?;
        let head = self.parse_function_head(location)?;

        // Registered before the body so recursive calls resolve
        let declaration = self.tables.functions.insert(head);
        self.enter_function_scope(declaration, location);
        let body = self.parse_function_body();
        self.scope.clear();
        let (locals, statements) = body?;

        Ok(Function {
            is_constant,
            declaration,
            locals,
            statements,
        })
    }

    /// Parameters become function-scoped variables with their own handles
    fn enter_function_scope(&mut self, function: FunctionId, location: SourceLocation) {
        self.scope.clear();
        let parameters = self.tables.functions.get(function).parameters.clone();
        for parameter in parameters {
            let id = self.tables.vars.push(VarDeclaration {
                type_ref: parameter.type_ref,
                is_array: false,
                identifier: parameter.identifier.clone(),
                initializer: None,
                location,
            });
            self.scope.insert(parameter.identifier, id);
        }
    }

    fn parse_function_body(&mut self) -> ParseResult<(Vec<VarId>, Vec<Statement>)> {
        self.line_break()?;

        let mut locals = Vec::new();
        while let Some(local) = self.attempt(Self::parse_local)? {
            locals.push(local);
            self.line_break()?;
        }

        let statements = self.parse_statements()?;
        self.consume(TokenKind::EndFunction, "'endfunction'")?;
        self.line_break()?;

        Ok((locals, statements))
    }

    /// `'local' type_ref ['array'] ID ['=' expression]`
    fn parse_local(&mut self) -> ParseResult<VarId> {
        let location = self.location();
        self.consume(TokenKind::Local, "'local'")?;
        let declaration = self.parse_var_declaration(location)?;

        // The initializer was parsed before the local entered scope
        let name = declaration.identifier.clone();
        let id = self.tables.vars.push(declaration);
        self.scope.insert(name, id);
        Ok(id)
    }

    fn parse_var_declaration(&mut self, location: SourceLocation) -> ParseResult<VarDeclaration> {
        let type_name = self.consume_identifier("type name")?;
        let is_array = self.eat(&TokenKind::Array);
        let identifier = self.consume_identifier("variable name")?;
        let initializer = if self.eat(&TokenKind::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(VarDeclaration {
            type_ref: self.resolve_type(&type_name),
            is_array,
            identifier,
            initializer,
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expression, File, StatementKind};
    use crate::limits::CompilerLimits;
    use crate::parser::parse;
    use crate::symbols::{Reference, SymbolTables};

    fn parse_ok(source: &str, tables: &mut SymbolTables) -> File {
        parse(source, "decl.j", tables, &CompilerLimits::default())
            .unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    #[test]
    fn test_type_declarations_chain() {
        let mut tables = SymbolTables::new();
        let file = parse_ok(
            "type widget extends handle\ntype unit extends widget\n",
            &mut tables,
        );

        let unit = tables.types.get(file.declarations.types[1]);
        assert_eq!(unit.identifier, "unit");
        assert_eq!(unit.parent, Some(Reference::Resolved(file.declarations.types[0])));
        assert_eq!(unit.location.map(|l| l.line), Some(2));
    }

    #[test]
    fn test_unknown_parent_stays_unresolved() {
        let mut tables = SymbolTables::new();
        let file = parse_ok("type unit extends widget\n", &mut tables);
        let unit = tables.types.get(file.declarations.types[0]);
        assert_eq!(unit.parent, Some(Reference::Unresolved("widget".into())));
    }

    #[test]
    fn test_globals_block() {
        let mut tables = SymbolTables::new();
        let source = "\
globals
    // comment lines and blank lines are skipped

    constant real PI = 3.14159
    integer array counts
    string name
endglobals
";
        let file = parse_ok(source, &mut tables);
        let globals = &file.declarations.globals;
        assert_eq!(globals.len(), 3);

        assert!(globals[0].is_constant);
        let pi = tables.vars.get(globals[0].declaration);
        assert_eq!(pi.identifier, "PI");
        assert!(pi.initializer.is_some());

        let counts = tables.vars.get(globals[1].declaration);
        assert!(counts.is_array);
        assert!(!globals[1].is_constant);
        assert_eq!(counts.type_ref, tables.types.resolve("integer"));

        assert_eq!(tables.vars.lookup("name"), Some(globals[2].declaration));
    }

    #[test]
    fn test_natives() {
        let mut tables = SymbolTables::new();
        let source = "\
constant native GetTriggerUnit takes nothing returns unit
native SetUnitX takes unit whichUnit, real newX returns nothing
";
        let file = parse_ok(source, &mut tables);
        let natives = &file.declarations.natives;
        assert_eq!(natives.len(), 2);
        assert!(natives[0].is_constant);

        let set_x = tables.functions.get(natives[1].declaration);
        assert_eq!(set_x.parameters.len(), 2);
        assert_eq!(set_x.parameters[1].identifier, "newX");
        assert_eq!(set_x.return_type, None);

        let get = tables.functions.get(natives[0].declaration);
        assert_eq!(get.return_type, Some(Reference::Unresolved("unit".into())));
    }

    #[test]
    fn test_recursive_call_resolves() {
        let mut tables = SymbolTables::new();
        let source = "\
function Fact takes integer n returns integer
    if n <= 1 then
        return 1
    endif
    return n * Fact(n - 1)
endfunction
";
        let file = parse_ok(source, &mut tables);
        let function = &file.functions[0];
        let StatementKind::Return(Some(Expression::Binary(binary))) = &function.statements[1].kind
        else {
            panic!("expected return of a binary operation");
        };
        let Expression::Call(call) = &binary.right else {
            panic!("expected a call on the right");
        };
        assert_eq!(call.function, Reference::Resolved(function.declaration));
    }

    #[test]
    fn test_parameters_and_locals_are_function_scoped() {
        let mut tables = SymbolTables::new();
        let source = "\
function A takes integer p returns integer
    local integer l = p
    return l
endfunction
function B takes nothing returns integer
    return l
endfunction
";
        let file = parse_ok(source, &mut tables);
        assert!(!tables.vars.contains("p"));
        assert!(!tables.vars.contains("l"));

        let a = &file.functions[0];
        assert_eq!(a.locals.len(), 1);
        let local = tables.vars.get(a.locals[0]);
        let Some(Expression::VarReference(Reference::Resolved(param))) = &local.initializer else {
            panic!("parameter should resolve inside the function");
        };
        assert_eq!(tables.vars.get(*param).identifier, "p");

        let StatementKind::Return(Some(Expression::VarReference(reference))) =
            &file.functions[1].statements[0].kind
        else {
            panic!("expected return of a variable");
        };
        assert_eq!(*reference, Reference::Unresolved("l".into()));
    }

    #[test]
    fn test_local_shadows_global() {
        let mut tables = SymbolTables::new();
        let source = "\
globals
    integer x = 1
endglobals
function F takes nothing returns integer
    local integer x = x
    return x
endfunction
";
        let file = parse_ok(source, &mut tables);
        let global = file.declarations.globals[0].declaration;
        let local = file.functions[0].locals[0];

        // The initializer still sees the global
        assert_eq!(
            tables.vars.get(local).initializer,
            Some(Expression::VarReference(Reference::Resolved(global)))
        );
        assert_eq!(
            file.functions[0].statements[0].kind,
            StatementKind::Return(Some(Expression::VarReference(Reference::Resolved(local))))
        );
    }

    #[test]
    fn test_constant_function() {
        let mut tables = SymbolTables::new();
        let file = parse_ok(
            "constant function Zero takes nothing returns integer\n    return 0\nendfunction",
            &mut tables,
        );
        assert!(file.functions[0].is_constant);
    }

    #[test]
    fn test_duplicate_declaration_last_wins() {
        let mut tables = SymbolTables::new();
        let file = parse_ok(
            "globals\n    integer x\n    real x\nendglobals\n",
            &mut tables,
        );
        assert_eq!(
            tables.vars.lookup("x"),
            Some(file.declarations.globals[1].declaration)
        );
    }

    #[test]
    fn test_missing_endglobals() {
        let mut tables = SymbolTables::new();
        let error = parse(
            "globals\n    integer x\n",
            "decl.j",
            &mut tables,
            &CompilerLimits::default(),
        )
        .unwrap_err();
        assert_eq!(error.rule, "'endglobals'");
        assert_eq!(error.line, 3);
    }
}

// Semantic analysis over a parsed Program
//
// The analyzer is a read-only pass: it borrows the session's symbol tables
// and AST and collects Reports. Checks are split by concern:
// - type_compatibility: names, compatibility, base-type ancestry, categories
// - expression_typing: the type of an expression
// - constant_evaluation: constant folding
// - expression_checking / statement_checking / declaration_checking
// - function_call_type_checking, return_type_validation
// - leak_analysis: handles never passed to a destructor

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, instrument};

mod constant_evaluation;
mod declaration_checking;
mod expression_checking;
mod expression_typing;
mod function_call_type_checking;
mod leak_analysis;
mod return_type_validation;
mod statement_checking;
mod type_compatibility;

pub use leak_analysis::{Destructors, default_destructors, leaking_declarations};
pub use type_compatibility::{TypeCategory, type_names_are_compatible};

use crate::ast::{Program, SourceLocation};
use crate::report::{Node, Report};
use crate::symbols::{FunctionId, FunctionTable, SymbolTables, TypeTable, VarId, VarTable};

/// Largest array index plus one
pub const ARRAY_SIZE: i32 = 8192;

pub struct SemanticAnalyzer<'a> {
    types: &'a TypeTable,
    vars: &'a VarTable,
    functions: &'a FunctionTable,
    destructors: Destructors,
    reports: Vec<Report<'a>>,
    /// Globals declared `constant`
    constants: HashSet<VarId>,

    // Context of the node being checked, copied into every report
    file: &'a Path,
    location: SourceLocation,
    current_function: Option<FunctionId>,
}

impl<'a> SemanticAnalyzer<'a> {
    /// Creates an analyzer using the builtin destructor table
    pub fn new(types: &'a TypeTable, vars: &'a VarTable, functions: &'a FunctionTable) -> Self {
        Self {
            types,
            vars,
            functions,
            destructors: Destructors::builtin(),
            reports: Vec::new(),
            constants: HashSet::new(),
            file: Path::new(""),
            location: SourceLocation::default(),
            current_function: None,
        }
    }

    pub fn from_tables(tables: &'a SymbolTables) -> Self {
        Self::new(&tables.types, &tables.vars, &tables.functions)
    }

    /// Builder method to replace the destructor table used for leak reports
    pub fn with_destructors(mut self, destructors: Destructors) -> Self {
        self.destructors = destructors;
        self
    }

    /// Records a report at the current file and location
    fn report(&mut self, node: Node<'a>, message: String) {
        debug!(location = %self.location, "report: {message}");
        self.reports
            .push(Report::new(node, message, self.file, self.location));
    }

    /// Runs every check over `program` and returns all reports in order
    pub fn analyze(mut self, program: &'a Program) -> Vec<Report<'a>> {
        self.constants = program
            .files
            .iter()
            .flat_map(|file| &file.declarations.globals)
            .filter(|global| global.is_constant)
            .map(|global| global.declaration)
            .collect();

        for file in &program.files {
            self.file = file.path.as_path();
            self.check_declarations(&file.declarations);
            for function in &file.functions {
                self.check_function(function);
            }
        }

        self.report_leaks(program);
        self.reports
    }
}

/// Analyzer entry point with the builtin destructor table
#[instrument(skip_all, fields(files = program.files.len()))]
pub fn check<'a>(
    program: &'a Program,
    types: &'a TypeTable,
    vars: &'a VarTable,
    functions: &'a FunctionTable,
) -> Vec<Report<'a>> {
    let reports = SemanticAnalyzer::new(types, vars, functions).analyze(program);
    debug!(reports = reports.len(), "analysis finished");
    reports
}


#[cfg(test)]
mod tests {
    use super::test_support::{messages, parse_program};
    use super::*;

    #[test]
    fn test_clean_program_has_no_reports() {
        let source = "\
type timer extends handle
globals
    constant integer LIMIT = 10
    integer array counts
endglobals
native CreateTimer takes nothing returns timer
native DestroyTimer takes timer t returns nothing
function Tick takes integer i returns boolean
    local timer t = CreateTimer()
    set counts[i] = counts[i] + 1
    call DestroyTimer(t)
    return counts[i] > LIMIT
endfunction
";
        assert_eq!(messages(source), Vec::<String>::new());
    }

    #[test]
    fn test_reports_carry_file_and_location() {
        let source = "\
function F takes nothing returns nothing
    call Missing()
endfunction
";
        let (program, tables) = parse_program(source);
        let reports = check(&program, &tables.types, &tables.vars, &tables.functions);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].file, Path::new("test.j"));
        assert_eq!(reports[0].location, SourceLocation::new(2, 5));
        assert!(matches!(reports[0].node, Node::Statement(_)));
        assert_eq!(reports[0].message, "undeclared identifier 'Missing'");
    }

    #[test]
    fn test_all_reports_are_collected() {
        let source = "\
globals
    constant integer A
    integer B = \"text\"
endglobals
function F takes nothing returns nothing
    return 5
endfunction
";
        assert_eq!(messages(source).len(), 3);
    }

    #[test]
    fn test_custom_destructors() {
        let source = "\
function F takes nothing returns nothing
    local hashtable h
endfunction
";
        let (program, tables) = parse_program(source);
        let mut destructors = Destructors::default();
        destructors.insert("hashtable", "FlushParentHashtable");
        let reports = SemanticAnalyzer::from_tables(&tables)
            .with_destructors(destructors)
            .analyze(&program);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].message, "undeclared identifier 'hashtable'");
        assert!(reports[1].message.contains("FlushParentHashtable"));
    }
}

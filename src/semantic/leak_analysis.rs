// Leak analysis
//
// A global or local whose type has a known destructor leaks unless some
// call statement passes it, as the only argument, to one of those
// destructors. The scan is syntactic: handles forwarded through helper
// functions are not followed.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use tracing::{debug, instrument};

use super::SemanticAnalyzer;
use crate::ast::{DebugStatement, Expression, FunctionCall, Program, Statement, StatementKind};
use crate::report::Node;
use crate::symbols::{SymbolTables, VarId};

/// Well-known handle types and the natives that release them
const BUILTIN_DESTRUCTORS: [(&str, &str); 28] = [
    ("boolexpr", "DestroyBoolExpr"),
    ("conditionfunc", "DestroyCondition"),
    ("defeatcondition", "DestroyDefeatCondition"),
    ("destructable", "RemoveDestructable"),
    ("dialog", "DialogDestroy"),
    ("effect", "DestroyEffect"),
    ("filterfunc", "DestroyFilter"),
    ("fogmodifier", "DestroyFogModifier"),
    ("force", "DestroyForce"),
    ("gamecache", "FlushGameCache"),
    ("group", "DestroyGroup"),
    ("image", "DestroyImage"),
    ("item", "RemoveItem"),
    ("itempool", "DestroyItemPool"),
    ("leaderboard", "DestroyLeaderboard"),
    ("lightning", "DestroyLightning"),
    ("location", "RemoveLocation"),
    ("multiboard", "DestroyMultiboard"),
    ("quest", "DestroyQuest"),
    ("rect", "RemoveRect"),
    ("region", "RemoveRegion"),
    ("sound", "KillSoundWhenDone"),
    ("texttag", "DestroyTextTag"),
    ("timer", "DestroyTimer"),
    ("timerdialog", "DestroyTimerDialog"),
    ("trigger", "DestroyTrigger"),
    ("ubersplat", "DestroyUbersplat"),
    ("unitpool", "DestroyUnitPool"),
];

/// Multimap from type name to the functions that destroy a value of it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Destructors {
    by_type: BTreeMap<String, Vec<String>>,
}

impl Destructors {
    pub fn builtin() -> Self {
        let mut destructors = Self::default();
        for (type_name, destructor) in BUILTIN_DESTRUCTORS {
            destructors.insert(type_name, destructor);
        }
        destructors
    }

    /// Adds a destructor for `type_name`; duplicates are ignored
    pub fn insert(&mut self, type_name: &str, destructor: &str) {
        let entry = self.by_type.entry(type_name.to_string()).or_default();
        if !entry.iter().any(|existing| existing == destructor) {
            entry.push(destructor.to_string());
        }
    }

    pub fn for_type(&self, type_name: &str) -> &[String] {
        self.by_type
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_destructor(&self, type_name: &str, function: &str) -> bool {
        self.for_type(type_name).iter().any(|d| d == function)
    }

    /// Number of (type, destructor) pairs
    pub fn len(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_type.iter().flat_map(|(type_name, destructors)| {
            destructors
                .iter()
                .map(move |destructor| (type_name.as_str(), destructor.as_str()))
        })
    }
}

pub fn default_destructors() -> Destructors {
    Destructors::builtin()
}

impl<'a> SemanticAnalyzer<'a> {
    /// Declarations never passed to a destructor, with the file declaring them
    fn find_leaks(&self, program: &'a Program) -> Vec<(VarId, &'a Path)> {
        let mut candidates: Vec<(VarId, &'a Path)> = Vec::new();
        for file in &program.files {
            let globals = file.declarations.globals.iter().map(|global| global.declaration);
            let locals = file.functions.iter().flat_map(|function| function.locals.iter().copied());
            for id in globals.chain(locals) {
                let type_name = self.type_name(&self.vars.get(id).type_ref);
                if !self.destructors.for_type(type_name).is_empty() {
                    candidates.push((id, file.path.as_path()));
                }
            }
        }

        let mut pending: HashSet<VarId> = candidates.iter().map(|(id, _)| *id).collect();

        'scan: for function in program.functions() {
            for call in calls(&function.statements) {
                if pending.is_empty() {
                    break 'scan;
                }
                if let Some(id) = self.destroyed_by(call) {
                    pending.remove(&id);
                }
            }
        }

        candidates
            .into_iter()
            .filter(|(id, _)| pending.contains(id))
            .collect()
    }

    /// The declaration `call` destroys, if it is a destructor call
    fn destroyed_by(&self, call: &FunctionCall) -> Option<VarId> {
        let [argument] = call.arguments.as_slice() else {
            return None;
        };
        let id = match argument {
            Expression::VarReference(var) => var.id()?,
            Expression::ArrayReference(array) => array.var.id()?,
            _ => return None,
        };
        let type_name = self.type_name(&self.vars.get(id).type_ref);
        let function = self.function_name(&call.function);
        self.destructors
            .is_destructor(type_name, function)
            .then_some(id)
    }

    /// Declarations of `program` that are never destroyed, in declaration order
    pub fn leaking_declarations(&self, program: &'a Program) -> Vec<VarId> {
        self.find_leaks(program)
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }

    pub(super) fn report_leaks(&mut self, program: &'a Program) {
        let vars = self.vars;
        for (id, file) in self.find_leaks(program) {
            let declaration = vars.get(id);
            self.file = file;
            self.location = declaration.location;

            let type_name = self.type_name(&declaration.type_ref);
            let message = format!(
                "'{}' of type {} is never destroyed (expected a call to {})",
                declaration.identifier,
                type_name,
                self.destructors.for_type(type_name).join(" or ")
            );
            self.report(Node::Variable(id), message);
        }
    }
}

/// Every call statement in `statements`, including nested blocks
fn calls(statements: &[Statement]) -> Vec<&FunctionCall> {
    let mut found = Vec::new();
    collect_calls(statements, &mut found);
    found
}

fn collect_calls<'s>(statements: &'s [Statement], found: &mut Vec<&'s FunctionCall>) {
    for statement in statements {
        match &statement.kind {
            StatementKind::Call(call) | StatementKind::Debug(DebugStatement::Call(call)) => {
                found.push(call);
            }
            StatementKind::If(if_statement) | StatementKind::Debug(DebugStatement::If(if_statement)) => {
                collect_calls(&if_statement.then_statements, found);
                for else_if in &if_statement.else_ifs {
                    collect_calls(&else_if.statements, found);
                }
                if let Some(else_statements) = &if_statement.else_statements {
                    collect_calls(else_statements, found);
                }
            }
            StatementKind::Loop(body) | StatementKind::Debug(DebugStatement::Loop(body)) => {
                collect_calls(&body.statements, found);
            }
            StatementKind::Set(_)
            | StatementKind::ExitWhen(_)
            | StatementKind::Return(_)
            | StatementKind::Debug(DebugStatement::Set(_)) => {}
        }
    }
}

/// Leak analysis entry point
#[instrument(skip_all, fields(destructors = destructors.len()))]
pub fn leaking_declarations(
    program: &Program,
    tables: &SymbolTables,
    destructors: &Destructors,
) -> Vec<VarId> {
    let leaks = SemanticAnalyzer::from_tables(tables)
        .with_destructors(destructors.clone())
        .leaking_declarations(program);
    debug!(leaks = leaks.len(), "leak analysis finished");
    leaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::test_support::{messages, parse_program};

    const PRELUDE: &str = "\
type agent extends handle
type timer extends handle
type group extends handle
type location extends handle
native CreateTimer takes nothing returns timer
native DestroyTimer takes timer t returns nothing
native CreateGroup takes nothing returns group
native DestroyGroup takes group g returns nothing
native RemoveLocation takes location l returns nothing
native PauseTimer takes timer t returns nothing
native TimerStart takes timer t, real timeout, boolean periodic, code handler returns nothing
";

    fn leak_names(body: &str) -> Vec<String> {
        let source = format!(
            "{PRELUDE}function Test takes nothing returns nothing\n{body}\nendfunction\n"
        );
        let (program, tables) = parse_program(&source);
        leaking_declarations(&program, &tables, &default_destructors())
            .into_iter()
            .map(|id| tables.vars.get(id).identifier.clone())
            .collect()
    }

    #[test]
    fn test_builtin_table() {
        let destructors = default_destructors();
        assert_eq!(destructors.len(), BUILTIN_DESTRUCTORS.len());
        assert!(destructors.is_destructor("timer", "DestroyTimer"));
        assert!(destructors.is_destructor("group", "DestroyGroup"));
        assert!(destructors.is_destructor("trigger", "DestroyTrigger"));
        assert!(!destructors.is_destructor("timer", "PauseTimer"));
        assert!(destructors.for_type("unit").is_empty());
    }

    #[test]
    fn test_insert_keeps_one_entry_per_pair() {
        let mut destructors = Destructors::default();
        assert!(destructors.is_empty());
        destructors.insert("timer", "ReleaseTimer");
        destructors.insert("timer", "ReleaseTimer");
        destructors.insert("timer", "DestroyTimer");
        assert_eq!(destructors.for_type("timer"), ["ReleaseTimer", "DestroyTimer"]);
        assert_eq!(
            destructors.iter().collect::<Vec<_>>(),
            vec![("timer", "ReleaseTimer"), ("timer", "DestroyTimer")]
        );
    }

    #[test]
    fn test_timer_leak() {
        assert_eq!(
            leak_names("    local timer t = CreateTimer()\n    call PauseTimer(t)"),
            vec!["t"]
        );
        assert!(
            leak_names("    local timer t = CreateTimer()\n    call DestroyTimer(t)").is_empty()
        );
    }

    #[test]
    fn test_destructor_must_match_type() {
        assert_eq!(
            leak_names("    local timer t = CreateTimer()\n    call DestroyGroup(t)"),
            vec!["t"]
        );
    }

    #[test]
    fn test_nested_and_array_destruction() {
        let body = "\
    local group array groups
    local location l
    if true then
        loop
            call DestroyGroup(groups[0])
        endloop
    else
        debug call RemoveLocation(l)
    endif";
        assert!(leak_names(body).is_empty());
    }

    #[test]
    fn test_only_single_argument_calls_destroy() {
        assert_eq!(
            leak_names("    local timer t = CreateTimer()\n    call TimerStart(t, 1.0, false, null)"),
            vec!["t"]
        );
    }

    #[test]
    fn test_globals_destroyed_in_any_function() {
        let source = format!(
            "{PRELUDE}globals\n    timer T = null\n    group G = null\nendglobals\n\
             function Cleanup takes nothing returns nothing\n    call DestroyTimer(T)\nendfunction\n"
        );
        let (program, tables) = parse_program(&source);
        let leaks = leaking_declarations(&program, &tables, &default_destructors());
        assert_eq!(leaks.len(), 1);
        assert_eq!(tables.vars.get(leaks[0]).identifier, "G");
    }

    #[test]
    fn test_leak_reports() {
        let reports = messages(&format!(
            "{PRELUDE}function Test takes nothing returns nothing\n    local group g = CreateGroup()\nendfunction\n"
        ));
        assert_eq!(
            reports,
            vec!["'g' of type group is never destroyed (expected a call to DestroyGroup)"]
        );
    }
}

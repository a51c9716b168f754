//! Symbol tables and declaration handles
//!
//! Every type, variable and function declared while parsing is stored in an
//! append-only arena owned by the session's [`SymbolTables`]. The AST never
//! holds a declaration by value; it holds an [`Id`] into one of the arenas or,
//! when a name could not be found at parse time, the bare name as an
//! [`Reference::Unresolved`].
//!
//! Name registration is "last write wins": declaring a name twice keeps both
//! declarations in the arena but later lookups see the newer one.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use tracing::debug;

use crate::ast::{Expression, SourceLocation};

/// The six types every JASS environment starts with
pub const BASE_TYPES: [&str; 6] = ["integer", "real", "boolean", "string", "handle", "code"];

/// Typed index into a [`SymbolTable`]
pub struct Id<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    fn new(index: usize) -> Self {
        Self {
            index: index as u32,
            _marker: PhantomData,
        }
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

// Manual impls: derives would require T: Clone/Eq/...
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index)
    }
}

pub type TypeId = Id<Type>;
pub type VarId = Id<VarDeclaration>;
pub type FunctionId = Id<FunctionDeclaration>;

/// A name that was either found in a symbol table or kept verbatim
pub enum Reference<T> {
    Resolved(Id<T>),
    Unresolved(String),
}

impl<T> Reference<T> {
    pub fn id(&self) -> Option<Id<T>> {
        match self {
            Reference::Resolved(id) => Some(*id),
            Reference::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Reference::Resolved(_))
    }
}

impl<T> Clone for Reference<T> {
    fn clone(&self) -> Self {
        match self {
            Reference::Resolved(id) => Reference::Resolved(*id),
            Reference::Unresolved(name) => Reference::Unresolved(name.clone()),
        }
    }
}

impl<T> PartialEq for Reference<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Reference::Resolved(a), Reference::Resolved(b)) => a == b,
            (Reference::Unresolved(a), Reference::Unresolved(b)) => a == b,
            _ => false,
        }
    }
}

impl<T> fmt::Debug for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Resolved(id) => write!(f, "Resolved({id:?})"),
            Reference::Unresolved(name) => write!(f, "Unresolved({name:?})"),
        }
    }
}

pub type TypeReference = Reference<Type>;
pub type VarReference = Reference<VarDeclaration>;
pub type FunctionReference = Reference<FunctionDeclaration>;

/// Anything that can be registered in a [`SymbolTable`] under a name
pub trait Declaration {
    fn identifier(&self) -> &str;
}

/// A base type or a `type X extends Y` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub identifier: String,
    pub parent: Option<TypeReference>,
    /// None for the predefined base types
    pub location: Option<SourceLocation>,
}

impl Declaration for Type {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Global, local or parameter variable
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclaration {
    pub type_ref: TypeReference,
    pub is_array: bool,
    pub identifier: String,
    pub initializer: Option<Expression>,
    pub location: SourceLocation,
}

impl Declaration for VarDeclaration {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub type_ref: TypeReference,
    pub identifier: String,
}

/// Signature of a native or a function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub identifier: String,
    pub parameters: Vec<Parameter>,
    /// None when the function `returns nothing`
    pub return_type: Option<TypeReference>,
    pub location: SourceLocation,
}

impl Declaration for FunctionDeclaration {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Append-only declaration arena plus a name index
#[derive(Debug, Clone)]
pub struct SymbolTable<T> {
    declarations: Vec<T>,
    names: HashMap<String, Id<T>>,
}

impl<T: Declaration> SymbolTable<T> {
    pub fn new() -> Self {
        Self {
            declarations: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Stores a declaration and makes its name resolvable
    ///
    /// An earlier declaration with the same name stays in the arena but is no
    /// longer found by name.
    pub fn insert(&mut self, declaration: T) -> Id<T> {
        let name = declaration.identifier().to_string();
        let id = self.push(declaration);
        if let Some(previous) = self.names.insert(name, id) {
            debug!(
                name = self.get(id).identifier(),
                previous = previous.index(),
                "declaration overwrites an earlier one"
            );
        }
        id
    }

    /// Stores a declaration without registering its name
    pub fn push(&mut self, declaration: T) -> Id<T> {
        let id = Id::new(self.declarations.len());
        self.declarations.push(declaration);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<Id<T>> {
        self.names.get(name).copied()
    }

    /// Lookup-or-else-literal
    pub fn resolve(&self, name: &str) -> Reference<T> {
        match self.lookup(name) {
            Some(id) => Reference::Resolved(id),
            None => Reference::Unresolved(name.to_string()),
        }
    }

    /// Panics when `id` was issued by another table: the AST and the tables
    /// of one session must never be mixed with those of another.
    pub fn get(&self, id: Id<T>) -> &T {
        match self.declarations.get(id.index()) {
            Some(declaration) => declaration,
            None => panic!(
                "declaration handle {} does not belong to this table ({} entries)",
                id.index(),
                self.declarations.len()
            ),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Number of stored declarations, shadowed ones included
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
        self.declarations
            .iter()
            .enumerate()
            .map(|(index, declaration)| (Id::new(index), declaration))
    }
}

impl<T: Declaration> Default for SymbolTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub type TypeTable = SymbolTable<Type>;
pub type VarTable = SymbolTable<VarDeclaration>;
pub type FunctionTable = SymbolTable<FunctionDeclaration>;

impl TypeTable {
    /// A type table holding the six base types
    pub fn with_base_types() -> Self {
        let mut table = Self::new();
        for name in BASE_TYPES {
            table.insert(Type {
                identifier: name.to_string(),
                parent: None,
                location: None,
            });
        }
        table
    }
}

/// The three tables shared by every file of a parse session
#[derive(Debug, Clone)]
pub struct SymbolTables {
    pub types: TypeTable,
    pub vars: VarTable,
    pub functions: FunctionTable,
}

impl SymbolTables {
    pub fn new() -> Self {
        Self {
            types: TypeTable::with_base_types(),
            vars: VarTable::new(),
            functions: FunctionTable::new(),
        }
    }
}

impl Default for SymbolTables {
    fn default() -> Self {
        Self::new()
    }
}

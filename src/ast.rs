// AST for JASS source files
//
// Declarations (types, variables, functions) live in the session's symbol
// tables; the tree refers to them through handles from `crate::symbols`.
// Recursive expression cases are boxed; statement bodies are vectors.

use std::fmt;
use std::path::PathBuf;

use crate::symbols::{FunctionId, FunctionReference, TypeId, VarId, VarReference};

/// 1-based source position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Root: every file parsed in one session, in parse order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub files: Vec<File>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.files.iter().flat_map(|file| file.functions.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub path: PathBuf,
    pub declarations: Declarations,
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations {
    pub types: Vec<TypeId>,
    pub globals: Vec<Global>,
    pub natives: Vec<Native>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Global {
    pub is_constant: bool,
    pub declaration: VarId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Native {
    pub is_constant: bool,
    pub declaration: FunctionId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub is_constant: bool,
    pub declaration: FunctionId,
    pub locals: Vec<VarId>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Set(Set),
    Call(FunctionCall),
    If(If),
    Loop(Loop),
    ExitWhen(Expression),
    Return(Option<Expression>),
    Debug(DebugStatement),
}

/// `set var = value` or `set var[index] = value`
#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    pub var: VarReference,
    pub index: Option<Expression>,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Expression,
    pub then_statements: Vec<Statement>,
    pub else_ifs: Vec<ElseIf>,
    pub else_statements: Option<Vec<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElseIf {
    pub condition: Expression,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    pub statements: Vec<Statement>,
}

/// Statements allowed after `debug`
#[derive(Debug, Clone, PartialEq)]
pub enum DebugStatement {
    Set(Set),
    Call(FunctionCall),
    If(If),
    Loop(Loop),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Constant(Const),
    Binary(Box<BinaryOperation>),
    Unary(Box<UnaryOperation>),
    Call(FunctionCall),
    ArrayReference(Box<ArrayReference>),
    FunctionReference(FunctionReference),
    VarReference(VarReference),
    Parentheses(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOperation {
    pub left: Expression,
    pub operator: BinaryOperator,
    pub right: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOperation {
    pub operator: UnaryOperator,
    pub operand: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub function: FunctionReference,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayReference {
    pub var: VarReference,
    pub index: Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Greater,
    Less,
    Equal,
    NotEqual,
    GreaterOrEqual,
    LessOrEqual,
    And,
    Or,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Greater => ">",
            BinaryOperator::Less => "<",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::LessOrEqual => "<=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
        )
    }

    /// `> < >= <=`
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            BinaryOperator::Greater
                | BinaryOperator::Less
                | BinaryOperator::GreaterOrEqual
                | BinaryOperator::LessOrEqual
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOperator::Equal | BinaryOperator::NotEqual)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::Not => "not",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Literal value
///
/// The default value is `Integer(0)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Const {
    Integer(i32),
    Real(f32),
    FourCC([u8; 4]),
    Boolean(bool),
    String(String),
    Null,
}

impl Default for Const {
    fn default() -> Self {
        Const::Integer(0)
    }
}

impl Const {
    /// Name of the type a literal of this kind has
    ///
    /// `fourcc` and `null` are pseudo types: they are never declared in a
    /// type table but take part in compatibility checks.
    pub fn type_name(&self) -> &'static str {
        match self {
            Const::Integer(_) => "integer",
            Const::Real(_) => "real",
            Const::FourCC(_) => "fourcc",
            Const::Boolean(_) => "boolean",
            Const::String(_) => "string",
            Const::Null => "null",
        }
    }

    /// Integer value of a four-character code (big endian, as the game reads it)
    pub fn fourcc_value(code: [u8; 4]) -> i32 {
        i32::from_be_bytes(code)
    }
}

// Prints literal syntax that lexes back to the same value
impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Const::Integer(value) => write!(f, "{value}"),
            Const::Real(value) => {
                let text = value.to_string();
                if text.contains('.') {
                    f.write_str(&text)
                } else {
                    write!(f, "{text}.0")
                }
            }
            // Codes that cannot be written between quotes fall back to their value
            Const::FourCC(code) => match std::str::from_utf8(code) {
                Ok(text) if !text.contains(['\'', '\n']) => write!(f, "'{text}'"),
                _ => write!(f, "${:08X}", u32::from_be_bytes(*code)),
            },
            Const::Boolean(value) => write!(f, "{value}"),
            Const::String(value) => {
                f.write_str("\"")?;
                for c in value.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        '\u{8}' => f.write_str("\\b")?,
                        '\u{c}' => f.write_str("\\f")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Const::Null => f.write_str("null"),
        }
    }
}

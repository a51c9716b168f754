// Diagnostics produced by the analyzer
//
// A Report borrows the node it concerns from the session's Program, so it
// cannot outlive the session that parsed the source.

use std::fmt;
use std::path::Path;

use crate::ast::{Expression, Function, Global, Native, SourceLocation, Statement};
use crate::symbols::{TypeId, VarId};

/// The AST node a report is about
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    TypeDeclaration(TypeId),
    Global(&'a Global),
    Native(&'a Native),
    Function(&'a Function),
    /// A global, local or parameter, by handle
    Variable(VarId),
    Statement(&'a Statement),
    Expression(&'a Expression),
}

/// A non-fatal finding tied to an AST node
#[derive(Debug, Clone, PartialEq)]
pub struct Report<'a> {
    pub node: Node<'a>,
    pub message: String,
    pub file: &'a Path,
    pub location: SourceLocation,
}

impl<'a> Report<'a> {
    pub fn new(
        node: Node<'a>,
        message: impl Into<String>,
        file: &'a Path,
        location: SourceLocation,
    ) -> Self {
        Self {
            node,
            message: message.into(),
            file,
            location,
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.file.display(),
            self.location,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Const;

    #[test]
    fn test_display() {
        let expression = Expression::Constant(Const::Integer(5));
        let report = Report::new(
            Node::Expression(&expression),
            "return expression for function without return type",
            Path::new("war3map.j"),
            SourceLocation::new(12, 5),
        );
        assert_eq!(
            report.to_string(),
            "war3map.j:12:5: return expression for function without return type"
        );
        assert_eq!(report.node, Node::Expression(&expression));
    }
}

// Parse session
//
// Owns the symbol tables and the Program built from them. Files must be
// parsed in order: each one sees the declarations of those before it.
// Reports and leak results borrow from the session.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, instrument};

use crate::ast::{File, Program};
use crate::limits::CompilerLimits;
use crate::parser::{ParseError, parse};
use crate::report::Report;
use crate::semantic::{Destructors, SemanticAnalyzer};
use crate::symbols::{SymbolTables, VarId};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug)]
pub struct Session {
    tables: SymbolTables,
    program: Program,
    limits: CompilerLimits,
    destructors: Destructors,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_limits(CompilerLimits::default())
    }

    pub fn with_limits(limits: CompilerLimits) -> Self {
        Self {
            tables: SymbolTables::new(),
            program: Program::new(),
            limits,
            destructors: Destructors::builtin(),
        }
    }

    /// Builder method to replace the destructor table used by `check` and
    /// `leaking_declarations`
    pub fn with_destructors(mut self, destructors: Destructors) -> Self {
        self.destructors = destructors;
        self
    }

    /// Parses `source` and appends the file to the program
    ///
    /// On failure the program is unchanged, but declarations registered
    /// before the error stay in the symbol tables.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn parse(&mut self, source: &str, path: impl AsRef<Path>) -> Result<&File, SessionError> {
        let file = parse(source, path.as_ref(), &mut self.tables, &self.limits)?;
        info!(
            functions = file.functions.len(),
            globals = file.declarations.globals.len(),
            "parsed file"
        );
        self.program.files.push(file);
        Ok(&self.program.files[self.program.files.len() - 1])
    }

    /// Reads and parses a file; invalid UTF-8 is replaced
    pub fn parse_path(&mut self, path: impl AsRef<Path>) -> Result<&File, SessionError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = String::from_utf8_lossy(&bytes);
        self.parse(&source, path)
    }

    fn analyzer(&self) -> SemanticAnalyzer<'_> {
        SemanticAnalyzer::from_tables(&self.tables).with_destructors(self.destructors.clone())
    }

    /// Every report of the analyzer over all parsed files
    pub fn check(&self) -> Vec<Report<'_>> {
        self.analyzer().analyze(&self.program)
    }

    pub fn leaking_declarations(&self) -> Vec<VarId> {
        self.analyzer().leaking_declarations(&self.program)
    }

    pub fn tables(&self) -> &SymbolTables {
        &self.tables
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn limits(&self) -> &CompilerLimits {
        &self.limits
    }
}

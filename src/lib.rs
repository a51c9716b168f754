//! Front-end for the JASS scripting language
//!
//! Parses JASS source into a typed AST backed by per-session symbol tables,
//! then runs semantic checks and a handle leak analysis over it.
//!
//! ```no_run
//! use jass_front::Session;
//!
//! let mut session = Session::new();
//! session.parse_path("common.j")?;
//! session.parse_path("war3map.j")?;
//! for report in session.check() {
//!     eprintln!("{report}");
//! }
//! # Ok::<(), jass_front::SessionError>(())
//! ```

pub mod ast;
pub mod config;
pub mod lexer;
pub mod limits;
pub mod parser;
pub mod printer;
pub mod report;
pub mod semantic;
pub mod session;
pub mod symbols;

pub use config::{Config, ConfigError};
pub use limits::CompilerLimits;
pub use parser::{ParseError, ParseErrorKind, parse, parse_expression};
pub use printer::{print_expression, print_file};
pub use report::{Node, Report};
pub use semantic::{Destructors, SemanticAnalyzer, check, default_destructors, leaking_declarations};
pub use session::{Session, SessionError};
pub use symbols::SymbolTables;

use std::path::{Path, PathBuf};

use jass_front::{
    CompilerLimits, Config, ParseErrorKind, Session, SessionError, default_destructors,
    leaking_declarations, print_file,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// A session with common.j followed by `names`
fn session_with(names: &[&str]) -> Session {
    let mut session = Session::new();
    for name in ["common.j"].iter().chain(names) {
        if let Err(e) = session.parse_path(fixture(name)) {
            panic!("failed to parse {name}: {e}");
        }
    }
    session
}

#[test]
fn test_clean_map_has_no_reports() {
    let session = session_with(&["clean.j"]);
    let reports = session.check();
    assert!(reports.is_empty(), "unexpected reports: {reports:#?}");
    assert!(session.leaking_declarations().is_empty());
}

#[test]
fn test_every_report_is_collected_in_order() {
    let session = session_with(&["errors.j"]);
    let messages: Vec<_> = session
        .check()
        .into_iter()
        .map(|report| report.message)
        .collect();

    assert_eq!(
        messages,
        vec![
            "constant 'LIMIT' has no initializer",
            "array 'counts' cannot have an initializer",
            "cannot assign string to 'ratio' of type real",
            "cannot assign to constant 'LIMIT'",
            "array index 8192 is out of bounds [0, 8192)",
            "function 'KillUnit' takes 1 argument(s) but 2 were given",
            "undeclared identifier 'Missing'",
            "condition must be boolean, found numeric",
            "missing return value in function 'Broken' returning integer",
            "'g' of type group is never destroyed (expected a call to DestroyGroup)",
        ]
    );
}

#[test]
fn test_reports_point_into_their_file() {
    let session = session_with(&["errors.j"]);
    let reports = session.check();

    let missing = reports
        .iter()
        .find(|report| report.message.contains("'Missing'"))
        .unwrap();
    assert_eq!(missing.file, fixture("errors.j"));
    assert_eq!((missing.location.line, missing.location.column), (12, 5));

    let display = missing.to_string();
    assert!(display.ends_with("errors.j:12:5: undeclared identifier 'Missing'"));
}

#[test]
fn test_syntax_error_location() {
    let mut session = Session::new();
    let err = session.parse_path(fixture("syntax_error.j")).unwrap_err();
    let SessionError::Parse(err) = &err else {
        panic!("expected a parse error, got {err}");
    };
    assert_eq!(err.kind, ParseErrorKind::Syntax);
    assert_eq!(err.line, 2);
    assert_eq!(err.file_path, fixture("syntax_error.j"));
    assert!(session.program().files.is_empty());
}

#[test]
fn test_files_without_common_j_report_undeclared_names() {
    let mut session = Session::new();
    session.parse_path(fixture("clean.j")).unwrap();
    let reports = session.check();
    assert!(
        reports
            .iter()
            .any(|report| report.message == "undeclared identifier 'CreateUnit'")
    );
    assert!(
        reports
            .iter()
            .any(|report| report.message == "undeclared identifier 'location'")
    );
}

#[test]
fn test_leaking_declarations_entry_point() {
    let session = session_with(&["errors.j"]);
    let leaks = leaking_declarations(session.program(), session.tables(), &default_destructors());
    let names: Vec<_> = leaks
        .iter()
        .map(|id| session.tables().vars.get(*id).identifier.as_str())
        .collect();
    assert_eq!(names, vec!["g"]);
}

#[test]
fn test_project_config() {
    let config = Config::from_project_toml(fixture("jass.toml")).unwrap();
    assert_eq!(config.limits.max_expr_depth, 4);
    assert!(config.destructors.is_destructor("group", "ReleaseGroup"));
    assert!(config.destructors.is_destructor("group", "DestroyGroup"));

    let mut session = Session::with_limits(config.limits).with_destructors(config.destructors);
    let err = session
        .parse("globals\n    integer x = ((((((1))))))\nendglobals\n", "deep.j")
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Parse(ref e) if e.kind == ParseErrorKind::LimitExceeded
    ));
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    let config = Config::from_project_toml(fixture("absent.toml")).unwrap();
    assert_eq!(config.limits, CompilerLimits::default());
    assert_eq!(config.destructors, default_destructors());
}

#[test]
fn test_printed_files_parse_to_the_same_text() {
    let session = session_with(&["clean.j"]);

    let mut reparsed = Session::new();
    for (file, name) in session.program().files.iter().zip(["common.j", "clean.j"]) {
        let printed = print_file(file, session.tables());
        reparsed.parse(&printed, name).unwrap();
        let file = reparsed.program().files.last().unwrap();
        assert_eq!(print_file(file, reparsed.tables()), printed);
    }
    assert!(reparsed.check().is_empty());
}

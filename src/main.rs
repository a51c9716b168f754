mod cli;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, FilesArgs};
use jass_front::{Config, Session, print_file};

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_project_toml(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command {
        Commands::Parse(args) => {
            let session = parse_files(&args, config)?;
            for file in &session.program().files {
                print!("{}", print_file(file, session.tables()));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check(args) => {
            let session = parse_files(&args, config)?;
            let reports = session.check();
            for report in &reports {
                println!("{report}");
            }
            Ok(if reports.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Leaks(args) => {
            let session = parse_files(&args, config)?;
            let leaks = session.leaking_declarations();
            for id in &leaks {
                let declaration = session.tables().vars.get(*id);
                println!("{}: {}", declaration.location, declaration.identifier);
            }
            Ok(if leaks.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Parses every input into one session, stopping at the first failure
fn parse_files(args: &FilesArgs, config: Config) -> anyhow::Result<Session> {
    let mut session = Session::with_limits(config.limits).with_destructors(config.destructors);
    for path in &args.files {
        session
            .parse_path(path)
            .with_context(|| format!("parsing {}", path.display()))?;
    }
    Ok(session)
}

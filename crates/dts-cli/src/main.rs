use std::{
    error::Error as _,
    fmt,
    io::{self, Write as _},
    path::PathBuf,
    process::ExitCode,
};

use clap::{
    builder::{
        styling::{AnsiColor, Style},
        Styles,
    },
    Parser,
};
use dts_parser::{parse_path, ParseError, ParseOptions};
use dts_workspace::{config::cli_config::CliConfig, Workspace, WorkspaceError};
use owo_colors::OwoColorize as _;
use thiserror::Error;
use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

mod dot;
mod pretty;

fn styles() -> Styles {
    Styles::styled()
        .header(Style::new().bold())
        .usage(Style::new().bold())
        .literal(AnsiColor::Blue.on_default().bold())
        .placeholder(AnsiColor::White.on_default().dimmed())
}

const HELP_TEMPLATE: &str = "\
{before-help}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}\
    ";

/// dts parses Devicetree source files, resolving includes and merging repeated nodes.
#[derive(Parser, Debug)]
#[command(name = "dts", version, author, about, long_about = None, styles = styles(), help_template = HELP_TEMPLATE)]
struct Cli {
    /// If provided, displays info log messages
    ///
    /// This can be overridden by the `RUST_LOG` environment variable
    #[arg(short, long)]
    verbose: bool,

    /// Print a Graphviz dot graph instead of the node tree
    #[arg(long)]
    dot: bool,

    #[command(flatten)]
    workspace: CliConfig,

    /// The DTS file to parse
    file: PathBuf,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("couldn't resolve the path of the input file")]
    Path(#[source] io::Error),

    #[error("couldn't load the workspace configuration")]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("couldn't render the output")]
    Render(#[from] fmt::Error),

    #[error("couldn't write the output")]
    Output(#[source] io::Error),
}

fn run(cli: Cli) -> Result<(), CliError> {
    let file = std::path::absolute(&cli.file).map_err(CliError::Path)?;
    let dir = file.parent().map_or_else(|| PathBuf::from("."), PathBuf::from);

    let workspace = Workspace::try_new(dir)?;
    let config = workspace.combined_config(Some(cli.workspace))?;
    let options = ParseOptions::default().with_include_paths(config.into_include_paths());

    let tree = parse_path(&cli.file, &options)?;
    debug!(nodes = tree.len(), "Parsed file");

    let mut out = String::new();
    if cli.dot {
        dot::write_dot(&tree, &mut out)?;
    } else {
        pretty::write_tree(&tree, &mut out)?;
    }
    io::stdout()
        .lock()
        .write_all(out.as_bytes())
        .map_err(CliError::Output)
}

fn report(err: &CliError) {
    eprintln!("{}: {err}", "error".red().bold());
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  {} {cause}", "caused by:".dimmed());
        source = cause.source();
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version also end up here
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(
                    if cli.verbose {
                        LevelFilter::INFO
                    } else {
                        LevelFilter::WARN
                    }
                    .into(),
                )
                .from_env_lossy(),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

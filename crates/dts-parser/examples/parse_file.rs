//! Parses the file at argv 1, searching the directories in argv 2.. for includes, and prints the
//! node forest

use std::path::PathBuf;

use dts_parser::{parse_path, ParseOptions};
use owo_colors::{colors::xterm::Gray, OwoColorize as _};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy()
                .add_directive("dts_parser=debug".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let path = PathBuf::from(args.next().ok_or("Should have a path as an argument")?);
    let options = ParseOptions::default().with_include_paths(args.map(PathBuf::from).collect());

    match parse_path(&path, &options) {
        Ok(tree) => {
            eprintln!("{}", "Parsed!".green());
            eprintln!("{}", format!("{} top-level nodes", tree.len()).fg::<Gray>());
            println!("{tree:#?}");
            Ok(())
        }
        Err(err) => {
            eprintln!("{}: {err}", "Invalid DTS!".red());
            std::process::exit(1);
        }
    }
}

use std::path::PathBuf;

use clap::Parser;

/// Command-line interface (CLI) workspace configuration
#[derive(Debug, PartialEq, Eq, Parser)]
pub struct CliConfig {
    /// List of comma-separated directories to search for `/include/` files
    #[arg(short = 'I', long, value_delimiter = ',')]
    pub include_paths: Option<Vec<PathBuf>>,
}

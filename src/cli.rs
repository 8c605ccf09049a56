use std::path::PathBuf;

use clap::{ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "nbrun", about = "Jupyter notebook execution and testing CLI", version)]
#[command(group(ArgGroup::new("write_mode").args(["output", "in_place"]).multiple(false)))]
pub struct Cli {
    /// Notebook file to execute (.ipynb).
    #[arg(value_name = "NOTEBOOK")]
    pub notebook: PathBuf,

    /// Python interpreter used to execute cells (overrides PYTHON_BIN).
    #[arg(long)]
    pub python: Option<String>,

    /// Per-cell timeout in seconds (overrides CELL_TIMEOUT).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Write the executed notebook (outputs and execution counts) to this path.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Overwrite the input notebook with the executed result.
    #[arg(long = "in-place")]
    pub in_place: bool,

    /// Stop at the first failing cell instead of collecting all errors.
    #[arg(long = "halt-on-error")]
    pub halt_on_error: bool,

    /// Render the notebook without executing it.
    #[arg(long, conflicts_with_all = ["output", "in_place", "halt_on_error"])]
    pub show: bool,

    /// Suppress per-cell status lines; errors are still reported.
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

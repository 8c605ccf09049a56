use std::time::Duration;

use anyhow::{bail, Result};

use nbrun::cli::Cli;
use nbrun::config::Config;
use nbrun::kernel;
use nbrun::notebook::Notebook;
use nbrun::printer::{self, StatusPrinter};
use nbrun::runner::{NotebookRunner, RunOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Load config
    let cfg = Config::load();

    // Resolve interpreter: CLI overrides config; "auto" means platform default
    let python_bin = match args.python.clone().or_else(|| cfg.get("PYTHON_BIN")) {
        Some(v) if v != "auto" => v,
        _ => kernel::default_python_bin().to_string(),
    };
    let timeout_secs = args
        .timeout
        .or_else(|| cfg.get_u64("CELL_TIMEOUT"))
        .unwrap_or(60);

    if !args.notebook.exists() {
        bail!("notebook '{}' does not exist", args.notebook.display());
    }
    let mut notebook = Notebook::from_path(&args.notebook)?;

    if args.show {
        printer::render_notebook(&notebook);
        return Ok(());
    }

    let opts = RunOptions {
        python_bin,
        cell_timeout: Duration::from_secs(timeout_secs),
        halt_on_error: args.halt_on_error,
    };
    let errors = NotebookRunner::new(opts).run(&mut notebook).await?;

    StatusPrinter::auto(args.quiet).report(&notebook, &errors);

    if args.in_place {
        notebook.write_to(&args.notebook)?;
    } else if let Some(path) = &args.output {
        notebook.write_to(path)?;
    }

    // Pass/fail exit code: empty error sequence means success
    if !errors.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

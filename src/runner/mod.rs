//! Notebook runner: execute code cells in order and collect error descriptors.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::kernel::{self, PythonKernel};
use crate::notebook::{Cell, Notebook, Output};

/// One failed cell, ordered by cell position within the notebook.
#[derive(Debug, Clone)]
pub struct CellError {
    pub cell_index: usize,
    pub execution_count: Option<i64>,
    pub ename: String,
    pub evalue: String,
    pub traceback: Vec<String>,
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell {}: {}: {}", self.cell_index + 1, self.ename, self.evalue)
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub python_bin: String,
    pub cell_timeout: Duration,
    pub halt_on_error: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            python_bin: kernel::default_python_bin().to_string(),
            cell_timeout: Duration::from_secs(60),
            halt_on_error: false,
        }
    }
}

pub struct NotebookRunner {
    opts: RunOptions,
}

impl NotebookRunner {
    pub fn new(opts: RunOptions) -> Self {
        Self { opts }
    }

    /// Execute the notebook's code cells in place.
    ///
    /// Executed cells get fresh execution counts (1..n) and outputs; a failed
    /// cell gets an `error` output and contributes one [`CellError`]. By
    /// default execution continues past failures so the full error sequence
    /// is collected. The returned sequence mirrors the `error` outputs
    /// attached to the notebook, in cell order.
    pub async fn run(&self, notebook: &mut Notebook) -> Result<Vec<CellError>> {
        for cell in notebook.cells.iter_mut() {
            if let Cell::Code { execution_count, outputs, .. } = cell {
                *execution_count = None;
                outputs.clear();
            }
        }

        let mut kernel = PythonKernel::start(&self.opts.python_bin).await?;
        let mut errors = Vec::new();
        let mut count: i64 = 0;

        for (index, cell) in notebook.cells.iter_mut().enumerate() {
            let Cell::Code { source, execution_count, outputs, .. } = cell else {
                continue;
            };
            if source.is_blank() {
                continue;
            }
            let code = source.text();
            count += 1;
            *execution_count = Some(count);

            let outcome = kernel.execute(&code, self.opts.cell_timeout).await?;
            if !outcome.stdout.is_empty() {
                outputs.push(Output::Stream {
                    name: "stdout".to_string(),
                    text: outcome.stdout.into(),
                });
            }
            if !outcome.stderr.is_empty() {
                outputs.push(Output::Stream {
                    name: "stderr".to_string(),
                    text: outcome.stderr.into(),
                });
            }
            if let Some(err) = outcome.error {
                outputs.push(Output::Error {
                    ename: err.ename.clone(),
                    evalue: err.evalue.clone(),
                    traceback: err.traceback.clone(),
                });
                errors.push(CellError {
                    cell_index: index,
                    execution_count: Some(count),
                    ename: err.ename,
                    evalue: err.evalue,
                    traceback: err.traceback,
                });
                if self.opts.halt_on_error || !kernel.alive() {
                    break;
                }
            }
        }

        kernel.shutdown().await?;
        Ok(errors)
    }
}

/// Execute a notebook file with default options and return it together with
/// the errors collected during the run.
pub async fn run_notebook(path: impl AsRef<Path>) -> Result<(Notebook, Vec<CellError>)> {
    let mut notebook = Notebook::from_path(path.as_ref())?;
    let errors = NotebookRunner::new(RunOptions::default())
        .run(&mut notebook)
        .await?;
    Ok((notebook, errors))
}

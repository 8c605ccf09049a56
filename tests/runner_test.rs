use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use nbrun::kernel;
use nbrun::notebook::{Cell, Notebook, Output};
use nbrun::runner::{run_notebook, NotebookRunner, RunOptions};

fn python_available() -> bool {
    std::process::Command::new(kernel::default_python_bin())
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn execution_counts(notebook: &Notebook) -> Vec<Option<i64>> {
    notebook
        .cells
        .iter()
        .filter_map(|cell| match cell {
            Cell::Code { execution_count, .. } => Some(*execution_count),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_runner() -> Result<()> {
    if !python_available() {
        println!("Warning: no Python interpreter found on PATH");
        println!("Skipping notebook execution test");
        return Ok(());
    }

    let (_notebook, errors) = run_notebook("tests/fixtures/Testing.ipynb").await?;
    assert!(errors.is_empty(), "notebook raised errors: {:?}", errors);

    Ok(())
}

#[tokio::test]
async fn test_runner_is_idempotent() -> Result<()> {
    if !python_available() {
        println!("Skipping test - no Python interpreter available");
        return Ok(());
    }

    let (first, first_errors) = run_notebook("tests/fixtures/Testing.ipynb").await?;
    let (second, second_errors) = run_notebook("tests/fixtures/Testing.ipynb").await?;

    assert!(first_errors.is_empty());
    assert!(second_errors.is_empty());
    assert_eq!(execution_counts(&first), execution_counts(&second));

    Ok(())
}

#[tokio::test]
async fn test_failing_cell_is_collected() -> Result<()> {
    if !python_available() {
        println!("Skipping test - no Python interpreter available");
        return Ok(());
    }

    let (notebook, errors) = run_notebook("tests/fixtures/Failing.ipynb").await?;

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].ename, "ZeroDivisionError");
    assert_eq!(errors[0].cell_index, 1);
    assert!(!errors[0].traceback.is_empty());

    // Later cells still run by default, and interpreter state persists
    let Cell::Code { execution_count, outputs, .. } = &notebook.cells[2] else {
        panic!("expected code cell");
    };
    assert_eq!(*execution_count, Some(3));
    let stdout = outputs
        .iter()
        .find_map(|o| match o {
            Output::Stream { name, text } if name == "stdout" => Some(text.text()),
            _ => None,
        })
        .expect("third cell should print");
    assert_eq!(stdout, "1\n");

    // The failing cell carries the error output the descriptor was built from
    let Cell::Code { outputs, .. } = &notebook.cells[1] else {
        panic!("expected code cell");
    };
    assert!(outputs
        .iter()
        .any(|o| matches!(o, Output::Error { ename, .. } if ename == "ZeroDivisionError")));

    Ok(())
}

#[tokio::test]
async fn test_halt_on_error_stops_execution() -> Result<()> {
    if !python_available() {
        println!("Skipping test - no Python interpreter available");
        return Ok(());
    }

    let mut notebook = Notebook::from_path(Path::new("tests/fixtures/Failing.ipynb"))?;
    let opts = RunOptions { halt_on_error: true, ..Default::default() };
    let errors = NotebookRunner::new(opts).run(&mut notebook).await?;

    assert_eq!(errors.len(), 1);
    let Cell::Code { execution_count, .. } = &notebook.cells[2] else {
        panic!("expected code cell");
    };
    assert_eq!(*execution_count, None, "cells after the failure must not run");

    Ok(())
}

#[tokio::test]
async fn test_state_persists_across_cells() -> Result<()> {
    if !python_available() {
        println!("Skipping test - no Python interpreter available");
        return Ok(());
    }

    use std::io::Write;
    use tempfile::NamedTempFile;

    let notebook = serde_json::json!({
        "cells": [
            {
                "cell_type": "code",
                "execution_count": null,
                "metadata": {},
                "outputs": [],
                "source": "answer = 6 * 7"
            },
            {
                "cell_type": "code",
                "execution_count": null,
                "metadata": {},
                "outputs": [],
                "source": "print(answer)"
            }
        ],
        "metadata": {},
        "nbformat": 4,
        "nbformat_minor": 5
    });
    let mut file = NamedTempFile::new()?;
    file.write_all(notebook.to_string().as_bytes())?;

    let (executed, errors) = run_notebook(file.path()).await?;
    assert!(errors.is_empty(), "notebook raised errors: {:?}", errors);

    let Cell::Code { outputs, .. } = &executed.cells[1] else {
        panic!("expected code cell");
    };
    let stdout = outputs
        .iter()
        .find_map(|o| match o {
            Output::Stream { name, text } if name == "stdout" => Some(text.text()),
            _ => None,
        })
        .expect("second cell should print");
    assert_eq!(stdout, "42\n");

    Ok(())
}

#[tokio::test]
async fn test_cell_timeout_is_reported() -> Result<()> {
    if !python_available() {
        println!("Skipping test - no Python interpreter available");
        return Ok(());
    }

    use std::io::Write;
    use tempfile::NamedTempFile;

    let notebook = serde_json::json!({
        "cells": [
            {
                "cell_type": "code",
                "execution_count": null,
                "metadata": {},
                "outputs": [],
                "source": "import time\ntime.sleep(60)"
            }
        ],
        "metadata": {},
        "nbformat": 4,
        "nbformat_minor": 5
    });
    let mut file = NamedTempFile::new()?;
    file.write_all(notebook.to_string().as_bytes())?;

    let mut parsed = Notebook::from_path(file.path())?;
    let opts = RunOptions { cell_timeout: Duration::from_secs(1), ..Default::default() };
    let errors = NotebookRunner::new(opts).run(&mut parsed).await?;

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].ename, "CellTimeoutError");

    Ok(())
}

#[tokio::test]
async fn test_missing_notebook_fails() {
    let result = run_notebook("tests/fixtures/Missing.ipynb").await;
    assert!(result.is_err(), "should fail on nonexistent notebook");
}

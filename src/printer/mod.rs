//! Printers: per-cell status lines and markdown notebook rendering (termimad).

use std::io;

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use serde_json::Value;
use termimad::MadSkin;

use crate::notebook::{Cell, Notebook, Output};
use crate::runner::CellError;

pub struct StatusPrinter {
    pub color: bool,
    pub quiet: bool,
}

impl StatusPrinter {
    pub fn auto(quiet: bool) -> Self {
        Self { color: io::stdout().is_terminal(), quiet }
    }

    /// Report an executed notebook: one line per executed cell, then each
    /// collected error verbatim (name, value, traceback), then a summary.
    pub fn report(&self, notebook: &Notebook, errors: &[CellError]) {
        let mut executed = 0usize;
        for cell in &notebook.cells {
            let Cell::Code { execution_count: Some(count), outputs, .. } = cell else {
                continue;
            };
            executed += 1;
            let failure = outputs.iter().find_map(|o| match o {
                Output::Error { ename, evalue, .. } => Some((ename, evalue)),
                _ => None,
            });
            if self.quiet {
                continue;
            }
            match failure {
                None => println!("cell {} ... {}", count, self.ok()),
                Some((ename, evalue)) => {
                    println!("cell {} ... {} {}: {}", count, self.failed(), ename, evalue)
                }
            }
        }

        for err in errors {
            println!();
            if self.color {
                println!("{}", err.red());
            } else {
                println!("{}", err);
            }
            for line in &err.traceback {
                print!("{}", line);
            }
            if err.traceback.last().is_some_and(|l| !l.ends_with('\n')) {
                println!();
            }
        }

        let summary = format!("{} cells executed, {} errors", executed, errors.len());
        println!();
        if !self.color {
            println!("{}", summary);
        } else if errors.is_empty() {
            println!("{}", summary.green());
        } else {
            println!("{}", summary.red());
        }
    }

    fn ok(&self) -> String {
        if self.color {
            format!("{}", "ok".green())
        } else {
            "ok".to_string()
        }
    }

    fn failed(&self) -> String {
        if self.color {
            format!("{}", "ERROR".red())
        } else {
            "ERROR".to_string()
        }
    }
}

pub struct MarkdownPrinter {
    pub skin: MadSkin,
    pub width: usize,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self { skin: MadSkin::default(), width: 100 }
    }
}

impl MarkdownPrinter {
    pub fn print(&self, text: &str) {
        self.skin.print_text(text);
        println!();
    }
}

/// Render a notebook to the terminal without executing it: markdown cells
/// prettified, code cells with their stored counts and outputs.
pub fn render_notebook(notebook: &Notebook) {
    let color = io::stdout().is_terminal();
    let md = MarkdownPrinter::default();
    for cell in &notebook.cells {
        match cell {
            Cell::Markdown { source, .. } => md.print(&source.text()),
            Cell::Raw { source, .. } => {
                println!("{}", source.text());
                println!();
            }
            Cell::Code { source, execution_count, outputs, .. } => {
                let label = match execution_count {
                    Some(n) => format!("In [{}]:", n),
                    None => "In [ ]:".to_string(),
                };
                if color {
                    println!("{}", label.cyan());
                } else {
                    println!("{}", label);
                }
                println!("{}", source.text());
                for output in outputs {
                    render_output(output, color);
                }
                println!();
            }
        }
    }
}

fn render_output(output: &Output, color: bool) {
    match output {
        Output::Stream { text, .. } => print!("{}", text.text()),
        Output::Error { ename, evalue, .. } => {
            let line = format!("{}: {}", ename, evalue);
            if color {
                println!("{}", line.red());
            } else {
                println!("{}", line);
            }
        }
        Output::ExecuteResult { data, .. } | Output::DisplayData { data, .. } => {
            if let Some(text) = data.get("text/plain") {
                print!("{}", plain_text(text));
            }
        }
    }
}

// text/plain payloads follow the same single-string-or-lines convention as
// cell sources.
fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .concat(),
        other => other.to_string(),
    }
}

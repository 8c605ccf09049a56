//! nbformat 4 data model: cells, outputs, and multiline sources.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A parsed notebook document.
///
/// Unknown metadata is kept as raw JSON so a parse → serialize round trip
/// preserves kernelspec and language info written by other tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub nbformat: u32,
    #[serde(default)]
    pub nbformat_minor: u32,
}

impl Notebook {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read notebook '{}': {}", path.display(), e))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let notebook: Self =
            serde_json::from_str(text).map_err(|e| anyhow!("invalid notebook JSON: {}", e))?;
        if notebook.nbformat != 4 {
            bail!(
                "unsupported nbformat version {} (expected 4)",
                notebook.nbformat
            );
        }
        Ok(notebook)
    }

    pub fn to_json(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)
            .map_err(|e| anyhow!("failed to write notebook '{}': {}", path.display(), e))
    }
}

/// A notebook cell, tagged by `cell_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "snake_case")]
pub enum Cell {
    Code {
        #[serde(default)]
        source: MultilineText,
        #[serde(default)]
        metadata: Map<String, Value>,
        #[serde(default)]
        execution_count: Option<i64>,
        #[serde(default)]
        outputs: Vec<Output>,
    },
    Markdown {
        #[serde(default)]
        source: MultilineText,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    Raw {
        #[serde(default)]
        source: MultilineText,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
}

impl Cell {
    pub fn source(&self) -> &MultilineText {
        match self {
            Cell::Code { source, .. } | Cell::Markdown { source, .. } | Cell::Raw { source, .. } => {
                source
            }
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Cell::Code { .. })
    }
}

/// A code cell output, tagged by `output_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    Stream {
        name: String,
        text: MultilineText,
    },
    ExecuteResult {
        #[serde(default)]
        execution_count: Option<i64>,
        #[serde(default)]
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    DisplayData {
        #[serde(default)]
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    Error {
        ename: String,
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

/// nbformat's multiline-string convention: either one string or a list of
/// line strings (each usually keeping its trailing newline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MultilineText {
    Single(String),
    Lines(Vec<String>),
}

impl MultilineText {
    pub fn text(&self) -> String {
        match self {
            MultilineText::Single(s) => s.clone(),
            MultilineText::Lines(lines) => lines.concat(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            MultilineText::Single(s) => s.trim().is_empty(),
            MultilineText::Lines(lines) => lines.iter().all(|l| l.trim().is_empty()),
        }
    }
}

impl Default for MultilineText {
    fn default() -> Self {
        MultilineText::Single(String::new())
    }
}

impl From<String> for MultilineText {
    fn from(value: String) -> Self {
        MultilineText::Single(value)
    }
}

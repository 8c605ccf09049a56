//! Interpreter process management (startup, cell requests, shutdown).

pub mod python;

pub use python::PythonKernel;

/// Result of executing one cell's source in the kernel.
#[derive(Debug, Clone, Default)]
pub struct CellOutcome {
    pub stdout: String,
    pub stderr: String,
    pub error: Option<KernelError>,
}

/// Exception raised while executing a cell, as reported by the interpreter.
#[derive(Debug, Clone)]
pub struct KernelError {
    pub ename: String,
    pub evalue: String,
    pub traceback: Vec<String>,
}

/// Platform default interpreter, used when PYTHON_BIN is unset or "auto".
pub fn default_python_bin() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

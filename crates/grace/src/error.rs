//! Evaluator error kinds and the exception wrapper surfaced to embedders.
//!
//! `EvalError` intentionally carries only the data needed to render a
//! message; position and call-stack context live on [`GraceException`],
//! mirroring the split between a bare error reason and a located,
//! traced exception in the interpreter this one descends from. No
//! `thiserror`/`anyhow`: `Display` is hand-written, the way the rest of
//! this codebase writes it.

use std::fmt;

/// A source position attached to an AST node by the parser, when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodeLoc {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for CodeLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One frame of the call stack active when an error was raised: the
/// selector being evaluated and, if known, where it was invoked from.
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub selector: String,
    pub loc: Option<CodeLoc>,
}

/// A single evaluator failure. Every variant here corresponds to a
/// documented error kind; `Halted` is the one addition beyond that list,
/// raised when a debug driver cancels an in-flight evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    UndefinedName(String),
    NoSuchMethod { type_name: &'static str, selector: String },
    TypeMismatch { expected: &'static str, got: &'static str },
    ConstantReassignment(String),
    ScopeUnderflow,
    ArityMismatch { selector: String, expected: usize, got: usize },
    DivisionByZero,
    Halted,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UndefinedName(name) => write!(f, "undefined name '{name}'"),
            EvalError::NoSuchMethod { type_name, selector } => {
                write!(f, "no such method '{selector}' on {type_name}")
            }
            EvalError::TypeMismatch { expected, got } => {
                write!(f, "expected {expected}, got {got}")
            }
            EvalError::ConstantReassignment(name) => {
                write!(f, "cannot reassign constant '{name}'")
            }
            EvalError::ScopeUnderflow => write!(f, "scope underflow: no scope to restore"),
            EvalError::ArityMismatch { selector, expected, got } => {
                write!(f, "'{selector}' expects {expected} argument(s), got {got}")
            }
            EvalError::DivisionByZero => write!(f, "division by zero"),
            EvalError::Halted => write!(f, "evaluation halted"),
        }
    }
}

impl std::error::Error for EvalError {}

/// What the embedder actually sees: the error reason, where it happened,
/// and the stack of method/block invocations active at the time.
#[derive(Debug, Clone)]
pub struct GraceException {
    pub reason: EvalError,
    pub loc: Option<CodeLoc>,
    pub trace: Vec<StackFrame>,
}

impl GraceException {
    pub fn new(reason: EvalError) -> Self {
        Self { reason, loc: None, trace: Vec::new() }
    }

    pub fn at(mut self, loc: CodeLoc) -> Self {
        self.loc = Some(loc);
        self
    }

    pub fn push_frame(mut self, frame: StackFrame) -> Self {
        self.trace.push(frame);
        self
    }

    /// A one-line rendering suitable for a CLI diagnostic, ignoring the
    /// full trace.
    pub fn summary(&self) -> String {
        match self.loc {
            Some(loc) => format!("{loc}: {}", self.reason),
            None => self.reason.to_string(),
        }
    }
}

impl fmt::Display for GraceException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for frame in self.trace.iter().rev() {
            match frame.loc {
                Some(loc) => writeln!(f, "  in {} at {loc}", frame.selector)?,
                None => writeln!(f, "  in {}", frame.selector)?,
            }
        }
        Ok(())
    }
}

impl std::error::Error for GraceException {}

pub type EvalResult<T> = Result<T, GraceException>;

impl From<EvalError> for GraceException {
    fn from(reason: EvalError) -> Self {
        GraceException::new(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_includes_location_when_present() {
        let exc = GraceException::new(EvalError::DivisionByZero).at(CodeLoc { line: 4, column: 2 });
        assert_eq!(exc.summary(), "4:2: division by zero");
    }

    #[test]
    fn summary_omits_location_when_absent() {
        let exc = GraceException::new(EvalError::ScopeUnderflow);
        assert_eq!(exc.summary(), "scope underflow: no scope to restore");
    }
}

//! Runtime error type for the parser engine

use thiserror::Error;

/// Runtime parse failure: either an explicit `Error` action in a template, or
/// a whole run that matched no input at all. Carries the triggering input
/// line and the state the machine was in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at input line {line} in state '{state}': {message}")]
pub struct ParseError {
    pub message: String,
    /// 1-based input line that triggered the failure.
    pub line: usize,
    pub state: String,
}

//! Error taxonomy for the execution core.
//!
//! Leaf errors (`VariableError`, `ParseError`, `ResolveError`) are small
//! `thiserror` enums owned by the component that raises them. The
//! Command Processor folds all of them into one `ExecutionError`, the
//! error type returned from `Engine::execute`.

use thiserror::Error;

/// Raised by `VariableStore::set` when a user-level write violates the
/// naming rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariableError {
    #[error("variable name must not be empty")]
    EmptyName,
    #[error("'{0}' is a reserved system variable name")]
    ReservedName(String),
}

/// Raised by the Parser on structurally malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unbalanced '[' in options: {0}")]
    UnbalancedBrackets(String),
    #[error("unterminated quote in options: {0}")]
    UnterminatedQuote(String),
}

/// Raised by the Resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("command not found: {0}")]
    NotFound(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("read error: {0}")]
    ReadError(String),
}

/// Unified error returned by one pass through the Command Processor, and
/// ultimately by `Engine::execute` when it propagates out of
/// `process_stack`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("parse failed: {0}")]
    ParseFailed(String),
    #[error("command not found: {0}")]
    CommandNotFound(String),
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),
    #[error("command resolution failed: {0}")]
    ResolutionFailed(String),
    #[error("recursion limit exceeded: {0}")]
    RecursionLimitExceeded(String),
    #[error("internal scheduler invariant violated: {0}")]
    Internal(String),
}

impl From<ParseError> for ExecutionError {
    fn from(e: ParseError) -> Self {
        ExecutionError::ParseFailed(e.to_string())
    }
}

impl From<ResolveError> for ExecutionError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NotFound(name) => ExecutionError::CommandNotFound(name),
            other => ExecutionError::ResolutionFailed(other.to_string()),
        }
    }
}

/// Strip a single well-known wrapping prefix from an error message, used
/// by the Try Handler to recover the inner cause before storing it in
/// `_error`. If no known prefix is present the message is returned
/// unchanged.
pub fn strip_known_prefix(message: &str) -> String {
    const PREFIXES: &[&str] = &["command execution failed: ", "command resolution failed: "];
    for prefix in PREFIXES {
        if let Some(rest) = message.strip_prefix(prefix) {
            return rest.to_string();
        }
    }
    message.to_string()
}

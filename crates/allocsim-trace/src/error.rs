//! Trace ingestion errors.
//!
//! Distinct from `allocsim_core::AllocError`: a malformed trace is an input
//! problem, not a simulator-invariant violation, so it gets its own error
//! family and its own (non-fatal-to-the-process-in-the-halt sense, but
//! still reported and non-zero-exit) handling in the CLI.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TraceError {
    #[error("{path}:{line}: could not parse a record from {content:?}")]
    Unparsable { path: String, line: usize, content: String },

    #[error("id {id}: size {size} is not positive")]
    NonPositiveSize { id: u64, size: i64 },

    #[error("id {id}: born ({born}) is after die ({die})")]
    BornAfterDie { id: u64, born: u64, die: u64 },

    #[error("id {id} appears more than once in the trace")]
    DuplicateId { id: u64 },

    #[error("id {id} has a size record but no liveness record")]
    MissingLiveness { id: u64 },

    #[error("{path}: {message}")]
    Io { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, TraceError>;

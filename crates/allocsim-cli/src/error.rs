//! CLI-level error type: wraps the two library error families plus I/O and
//! (de)serialization failures that only make sense once we're driving a run
//! from files on disk.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("malformed trace: {0}")]
    Trace(#[from] allocsim_trace::TraceError),

    #[error("simulation error: {0}")]
    Alloc(#[from] allocsim_core::AllocError),

    #[error("could not render report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("unknown input format {0:?}; expected one of: liveness, jsonl")]
    UnknownFormat(String),

    #[error("liveness-pair input requires --size-list alongside --input")]
    MissingSizeList,
}

pub type Result<T> = std::result::Result<T, CliError>;

pub fn read_to_string(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io { path: path.to_path_buf(), source })
}

/// Process exit codes for each broad class of failure, so a fatal
/// invariant violation is distinguishable from a bad trace or a simulated
/// out-of-memory condition without parsing the error message.
pub mod exit_code {
    /// A core invariant violation halted the simulation: a bug in the
    /// allocator engine itself, never an expected condition.
    pub const INVARIANT_VIOLATION: i32 = 70;
    /// The allocator's out-of-memory condition was reported. Unreachable
    /// under the CLI's default configuration (no reservation cap), but
    /// kept distinct from an invariant violation should one ever be wired
    /// up.
    pub const OUT_OF_MEMORY: i32 = 75;
    /// The trace, CLI arguments, or filesystem input were themselves at
    /// fault — not a bug in the simulator.
    pub const INPUT_ERROR: i32 = 65;
}

impl CliError {
    /// Maps this error to the exit code `main` should use, keeping fatal
    /// simulator bugs distinguishable from ordinary input problems (§7).
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Alloc(e) if e.is_fatal() => exit_code::INVARIANT_VIOLATION,
            CliError::Alloc(_) => exit_code::OUT_OF_MEMORY,
            CliError::Io { .. }
            | CliError::Trace(_)
            | CliError::Report(_)
            | CliError::UnknownFormat(_)
            | CliError::MissingSizeList => exit_code::INPUT_ERROR,
        }
    }
}

//! Library half of the `allocsim` CLI: trace loading, the replay driver
//! wrapper, and structured decision logging. Kept separate from
//! `src/bin/allocsim.rs` so the pieces are independently testable.

pub mod decision_log;
pub mod error;
pub mod run;

use std::path::Path;

use allocsim_core::EventRecord;

use crate::error::{CliError, Result};

/// Input formats the CLI accepts for `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    LivenessPair,
    JsonLines,
}

impl std::str::FromStr for InputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "liveness" => Ok(Self::LivenessPair),
            "jsonl" => Ok(Self::JsonLines),
            other => Err(CliError::UnknownFormat(other.to_string())),
        }
    }
}

/// Loads a trace from disk according to `format`, producing the normalized
/// event sequence the core replay driver consumes.
///
/// For `InputFormat::LivenessPair`, `size_list_path` must be `Some` — the
/// upstream format splits sizes and liveness across two files.
pub fn load_events(
    format: InputFormat,
    input_path: &Path,
    size_list_path: Option<&Path>,
) -> Result<Vec<EventRecord>> {
    match format {
        InputFormat::JsonLines => {
            let content = error::read_to_string(input_path)?;
            Ok(allocsim_trace::load_jsonl(&content)?)
        }
        InputFormat::LivenessPair => {
            let size_list_path = size_list_path.ok_or(CliError::MissingSizeList)?;
            let size_list = error::read_to_string(size_list_path)?;
            let liveness = error::read_to_string(input_path)?;
            Ok(allocsim_trace::load_liveness_pair(&size_list, &liveness)?)
        }
    }
}

//! CLI entrypoint for the allocator simulator.

use std::path::PathBuf;

use allocsim_cli::error::{CliError, Result};
use allocsim_cli::run::{build_report, run};
use allocsim_cli::{load_events, InputFormat};
use allocsim_core::SizePolicy;
use clap::{Parser, Subcommand, ValueEnum};

/// Replays large-block allocation traces against a caching allocator
/// simulator and reports peak reserved memory and segment count.
#[derive(Debug, Parser)]
#[command(name = "allocsim")]
#[command(about = "Caching large-block allocator simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Round up to the 2 MiB quantum.
    #[value(name = "round-large")]
    RoundLarge,
    /// Smallest power of two at least as large as the request.
    #[value(name = "next-pow2")]
    NextPow2,
    /// A single fixed size, computed once from the full trace's largest
    /// requested size before replay begins.
    #[value(name = "global-max")]
    GlobalMax,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// The upstream two-file liveness-pair format.
    Liveness,
    /// One JSON object per line.
    Jsonl,
}

impl From<FormatArg> for InputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Liveness => InputFormat::LivenessPair,
            FormatArg::Jsonl => InputFormat::JsonLines,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a trace and print the final report.
    Run {
        /// Path to the trace: the liveness log for `--format liveness`, or
        /// the JSONL file for `--format jsonl`.
        #[arg(long)]
        input: PathBuf,
        /// Path to the size-list file, required for `--format liveness`.
        #[arg(long)]
        size_list: Option<PathBuf>,
        /// Input trace format.
        #[arg(long, value_enum, default_value_t = FormatArg::Jsonl)]
        format: FormatArg,
        /// Allocation size policy.
        #[arg(long, value_enum, default_value_t = PolicyArg::RoundLarge)]
        policy: PolicyArg,
        /// Output report format.
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        report: ReportFormat,
        /// Include a full per-segment, per-block snapshot in the report.
        #[arg(long)]
        dump_segments: bool,
        /// Write a JSONL decision log (one record per malloc/free) to this
        /// path.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Convert a liveness-pair trace to JSON Lines, for easier downstream
    /// inspection or replay without the two-file format.
    Convert {
        /// Size-list file path.
        #[arg(long)]
        size_list: PathBuf,
        /// Liveness log file path.
        #[arg(long)]
        liveness: PathBuf,
        /// Output JSONL path (stdout if omitted).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

impl std::fmt::Display for PolicyArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PolicyArg::RoundLarge => "round-large",
            PolicyArg::NextPow2 => "next-pow2",
            PolicyArg::GlobalMax => "global-max",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for FormatArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FormatArg::Liveness => "liveness",
            FormatArg::Jsonl => "jsonl",
        };
        write!(f, "{s}")
    }
}

fn resolve_policy(arg: PolicyArg, events: &[allocsim_core::EventRecord]) -> SizePolicy {
    match arg {
        PolicyArg::RoundLarge => SizePolicy::RoundLarge,
        PolicyArg::NextPow2 => SizePolicy::NextPowerOfTwo,
        PolicyArg::GlobalMax => {
            let max = events.iter().map(|e| e.size).max().unwrap_or(0);
            SizePolicy::GlobalMax(max)
        }
    }
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run { input, size_list, format, policy, report, dump_segments, log } => {
            let events = load_events(format.into(), &input, size_list.as_deref())?;
            let policy = resolve_policy(policy, &events);
            let outcome = run(&events, policy, log.as_deref())?;
            let report_value = build_report(&outcome, dump_segments);
            match report {
                ReportFormat::Text => println!("{}", report_value.to_text()),
                ReportFormat::Json => println!("{}", report_value.to_json()),
            }
        }
        Command::Convert { size_list, liveness, output } => {
            let size_list_content = allocsim_cli::error::read_to_string(&size_list)?;
            let liveness_content = allocsim_cli::error::read_to_string(&liveness)?;
            let events = allocsim_trace::load_liveness_pair(&size_list_content, &liveness_content)
                .map_err(CliError::from)?;

            let mut out = String::new();
            for event in &events {
                let line = serde_json::json!({
                    "id": event.id,
                    "size_bytes": event.size,
                    "born": event.born,
                    "die": event.die,
                });
                out.push_str(&line.to_string());
                out.push('\n');
            }

            match output {
                Some(path) => std::fs::write(&path, out)
                    .map_err(|source| CliError::Io { path, source })?,
                None => print!("{out}"),
            }
        }
    }

    Ok(())
}

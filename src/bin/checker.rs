//! Response Compatibility Checker CLI
//!
//! Checks that a candidate JSON response is backward compatible with a baseline.
//!
//! Usage:
//!   compat-checker https://api.example.com/v1/users https://staging.example.com/v1/users
//!   compat-checker responses/users.json - < new-users.json
//!
//! Exit codes: 0 compatible, 1 usage or loading error, 2 incompatible.

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use response_compat::{
    CompatConfig, DocumentLoader, DocumentSource, NumberPolicy, OutputFormat, Verdict,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const EXIT_INCOMPATIBLE: i32 = 2;

#[derive(Parser)]
#[command(name = "compat-checker")]
#[command(about = "Check that a candidate JSON response is backward compatible with a baseline")]
#[command(version, arg_required_else_help = true)]
struct Cli {
    /// Baseline document: URL, file path, or - for stdin
    baseline: String,

    /// Candidate document: URL, file path, or - for stdin
    candidate: String,

    /// Config file to load (optional)
    #[arg(short, long)]
    config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Number kinds: strict keeps integers and floats apart
    #[arg(long, value_enum)]
    numbers: Option<NumberPolicy>,

    /// Label for top-level mismatches
    #[arg(long)]
    root_context: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Show a line diff of the mismatching fragments
    #[arg(long)]
    diff: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut config = CompatConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;

    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if let Some(numbers) = cli.numbers {
        config.check.number_policy = numbers;
    }
    if let Some(label) = cli.root_context {
        config.check.root_context = label;
    }
    if let Some(timeout) = cli.timeout {
        config.fetch.timeout_secs = timeout;
    }
    if cli.diff {
        config.output.show_diff = true;
    }

    let baseline: DocumentSource = cli.baseline.parse()?;
    let candidate: DocumentSource = cli.candidate.parse()?;

    let loader = DocumentLoader::http(&config.fetch);
    let (baseline_doc, candidate_doc) = loader.load_pair(&baseline, &candidate)?;

    let outcome = config.checker().check(&baseline_doc.value, &candidate_doc.value);
    let verdict = Verdict::new(&baseline_doc, &candidate_doc, outcome);

    match &verdict.incompatibility {
        Some(incompatibility) => info!(
            context = %incompatibility.context,
            reason = incompatibility.reason.code(),
            path = %incompatibility.path,
            baseline_sha = verdict.baseline.fingerprint.short(),
            candidate_sha = verdict.candidate.fingerprint.short(),
            "candidate is incompatible"
        ),
        None => info!(
            %baseline,
            %candidate,
            baseline_sha = verdict.baseline.fingerprint.short(),
            candidate_sha = verdict.candidate.fingerprint.short(),
            "candidate is compatible"
        ),
    }

    config.reporter().write_to(&verdict, std::io::stdout().lock())?;

    Ok(if verdict.compatible { 0 } else { EXIT_INCOMPATIBLE })
}

//! dynamo-bulk CLI - copy every item between DynamoDB tables, or delete every item of one.

use clap::{Args, Parser, Subcommand, ValueEnum};
use dynamo_bulk::{
    BackoffConfig, ClientOptions, DynamoTable, Error, PipelineOptions, RunResult, TerminalPrompt,
    copy_table, truncate_table,
};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Exit codes for CLI operations.
///
/// - 0: Success, including empty sources and cancelled runs
/// - 1-127: Application errors
/// - 130: Interrupted by SIGINT
#[repr(i32)]
#[derive(Debug, Clone, Copy)]
enum ExitCode {
    /// Run finished, was empty, or was cancelled at the prompt
    Success = 0,
    /// Invalid options
    ConfigError = 1,
    /// Scan or describe failed
    ReadError = 2,
    /// Transform command failed
    TransformError = 3,
    /// Batch write failed
    WriteError = 4,
    /// Confirmation could not be read
    PromptError = 5,
    /// Signal interrupt (SIGINT = 2, so 128 + 2 = 130)
    SignalInterrupt = 130,
}

impl ExitCode {
    fn from_error(error: &Error) -> Self {
        if error.is_config_error() {
            ExitCode::ConfigError
        } else if error.is_read_failure() {
            ExitCode::ReadError
        } else if error.is_transform_failure() {
            ExitCode::TransformError
        } else if error.is_prompt_error() {
            ExitCode::PromptError
        } else {
            ExitCode::WriteError
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "dynamo-bulk")]
#[command(about = "Bulk copy and truncate for DynamoDB tables", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Number of items per batch write (1-25)
    #[arg(long, global = true, default_value_t = 25, value_name = "COUNT")]
    batch_size: usize,

    /// Skip the confirmation prompt
    #[arg(short, long, global = true)]
    yes: bool,

    /// Cap the delay between resubmissions of unprocessed items
    #[arg(long, global = true, value_name = "SECONDS")]
    max_backoff_secs: Option<u64>,

    /// Send every request to this endpoint (e.g. LocalStack)
    #[arg(long, global = true, value_name = "URL")]
    endpoint_url: Option<String>,

    /// Print the run summary as JSON on stdout
    #[arg(long, global = true)]
    output_json: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy all items from one table to another by scanning the source and
    /// batch writing every item found
    ///
    /// If the source holds many items and the destination can be a new
    /// table, restoring a DynamoDB backup is usually cheaper.
    Copy(CopyArgs),

    /// Delete all items in a table
    ///
    /// If the table holds many items, deleting and recreating it is usually
    /// cheaper.
    Truncate(TruncateArgs),
}

#[derive(Args)]
struct CopyArgs {
    /// Table to read from
    #[arg(long, value_name = "TABLE")]
    source_table_name: String,

    /// Named AWS profile (e.g. "qa") used to access the source table
    #[arg(long, value_name = "PROFILE")]
    source_profile: Option<String>,

    /// Region where the source table is provisioned
    #[arg(long, value_name = "REGION")]
    source_region: Option<String>,

    /// Attempts per scan request, e.g. when the source has low read capacity
    #[arg(long, value_name = "COUNT")]
    source_retries: Option<u32>,

    /// Make the scan reflect recently completed writes (doubles consumed read capacity)
    #[arg(long)]
    source_consistent_scan: bool,

    /// Limit the number of items read from the source at once
    #[arg(long, value_name = "COUNT")]
    source_scan_size: Option<u32>,

    /// Table to write to
    #[arg(long, value_name = "TABLE")]
    destination_table_name: String,

    /// Named AWS profile (e.g. "development") used to access the destination table
    #[arg(long, value_name = "PROFILE")]
    destination_profile: Option<String>,

    /// Region where the destination table is provisioned
    #[arg(long, value_name = "REGION")]
    destination_region: Option<String>,

    /// Attempts per batch write request, e.g. when the destination has low write capacity
    #[arg(long, value_name = "COUNT")]
    destination_retries: Option<u32>,

    /// Shell command that rewrites each item: JSON object in on stdin, JSON object out on stdout
    #[arg(long, value_name = "COMMAND")]
    transform: Option<String>,
}

#[derive(Args)]
struct TruncateArgs {
    /// Table whose items will be deleted
    #[arg(long, value_name = "TABLE")]
    table_name: String,

    /// Named AWS profile (e.g. "development"); omit to use environment variables
    #[arg(long, value_name = "PROFILE")]
    profile: Option<String>,

    /// Region where the table is provisioned
    #[arg(long, value_name = "REGION")]
    region: Option<String>,

    /// Attempts per request, e.g. when the table has low capacity
    #[arg(long, value_name = "COUNT")]
    retries: Option<u32>,

    /// Make the scan reflect recently completed writes (doubles consumed read capacity)
    #[arg(long)]
    consistent_scan: bool,

    /// Limit the number of items read at once
    #[arg(long, value_name = "COUNT")]
    scan_size: Option<u32>,
}

#[tokio::main]
async fn main() {
    let exit_code = run_cli().await;
    std::process::exit(exit_code as i32);
}

async fn run_cli() -> ExitCode {
    let cli = Cli::parse();

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match cli.verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so stdout stays clean for --output-json
    match cli.log_format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    }

    let output_json = cli.output_json;

    let result = tokio::select! {
        biased;
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!(
                "interrupted; batches already applied remain and the run is safe to repeat"
            );
            return ExitCode::SignalInterrupt;
        }
        result = execute_command(cli) => result,
    };

    if output_json {
        println!("{}", summary_json(&result));
    }
    if let Some(message) = outcome_message(&result) {
        eprintln!("{message}");
    }

    match result {
        RunResult::Success(_) | RunResult::EmptySource | RunResult::Cancelled => ExitCode::Success,
        RunResult::Failed(e) => ExitCode::from_error(&e),
    }
}

async fn execute_command(cli: Cli) -> RunResult {
    let backoff = BackoffConfig {
        max_delay: cli.max_backoff_secs.map(Duration::from_secs),
        ..BackoffConfig::default()
    };
    let mut prompt = TerminalPrompt;

    match cli.command {
        Commands::Copy(args) => {
            let options = PipelineOptions {
                consistent_read: args.source_consistent_scan,
                page_size: args.source_scan_size,
                batch_size: cli.batch_size,
                transform: args.transform,
                assume_yes: cli.yes,
                backoff,
            };

            let source = DynamoTable::connect(
                &args.source_table_name,
                &ClientOptions {
                    profile: args.source_profile,
                    region: args.source_region,
                    retries: args.source_retries,
                    endpoint_url: cli.endpoint_url.clone(),
                },
            )
            .await;
            let destination = DynamoTable::connect(
                &args.destination_table_name,
                &ClientOptions {
                    profile: args.destination_profile,
                    region: args.destination_region,
                    retries: args.destination_retries,
                    endpoint_url: cli.endpoint_url,
                },
            )
            .await;

            copy_table(&source, &destination, &options, &mut prompt).await
        }

        Commands::Truncate(args) => {
            let options = PipelineOptions {
                consistent_read: args.consistent_scan,
                page_size: args.scan_size,
                batch_size: cli.batch_size,
                transform: None,
                assume_yes: cli.yes,
                backoff,
            };

            let table = DynamoTable::connect(
                &args.table_name,
                &ClientOptions {
                    profile: args.profile,
                    region: args.region,
                    retries: args.retries,
                    endpoint_url: cli.endpoint_url,
                },
            )
            .await;

            truncate_table(&table, &options, &mut prompt).await
        }
    }
}

/// Operator-facing line for runs that end without writing anything
fn outcome_message(result: &RunResult) -> Option<&'static str> {
    match result {
        RunResult::Cancelled => Some("Not confirmed; no changes made."),
        RunResult::EmptySource => Some("Source is empty; no changes made."),
        RunResult::Success(_) | RunResult::Failed(_) => None,
    }
}

fn summary_json(result: &RunResult) -> serde_json::Value {
    match result {
        RunResult::Success(summary) => serde_json::json!({ "status": "success", "summary": summary }),
        RunResult::EmptySource => serde_json::json!({ "status": "empty" }),
        RunResult::Cancelled => serde_json::json!({ "status": "cancelled" }),
        RunResult::Failed(e) => serde_json::json!({ "status": "failed", "error": e.to_string() }),
    }
}

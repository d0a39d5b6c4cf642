//! # DynamoDB Bulk Copy and Truncate
//!
//! Moves every item of a DynamoDB table in bulk:
//! - **Copy** scans a source table and batch-writes each item (optionally
//!   rewritten by an external command) into a destination table
//! - **Truncate** scans a table for its keys and batch-deletes them
//!
//! Both run the same pipeline: cursor-paginated scan, fixed-size batches of
//! up to 25 mutations, a typed-name confirmation before the first mutation,
//! and resubmission of unprocessed items with exponential backoff until every
//! batch is fully applied. Mutations are idempotent per item key, so an
//! interrupted run is resumed by running it again.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dynamo_bulk::{
//!     ClientOptions, DynamoTable, PipelineOptions, RunResult, TerminalPrompt, copy_table,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = DynamoTable::connect("users", &ClientOptions::default()).await;
//!     let destination = DynamoTable::connect("users_backup", &ClientOptions::default()).await;
//!
//!     let mut prompt = TerminalPrompt::default();
//!     match copy_table(&source, &destination, &PipelineOptions::default(), &mut prompt).await {
//!         RunResult::Success(summary) => println!("copied {} items", summary.items),
//!         RunResult::EmptySource => println!("nothing to copy"),
//!         RunResult::Cancelled => println!("no changes made"),
//!         RunResult::Failed(error) => eprintln!("copy failed: {error}"),
//!     }
//! }
//! ```
#![deny(
    bad_style,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    deprecated,
    unreachable_code,
    unused_mut
)]

mod error;
pub use error::Error;

/// Run and connection options
pub mod config;

/// Table handles and item types
pub mod table;

/// Scan, transform, batch, confirm and apply
pub mod pipeline;

pub use config::{BackoffConfig, ClientOptions, PipelineOptions};
pub use pipeline::{
    BatchReport, Batcher, ConfirmationGate, Identity, MutationExecutor, PageSource, Pipeline,
    Prompt, RunResult, RunSummary, ShellTransformer, TerminalPrompt, Transform, Transformer,
    copy_table, run_pipeline, truncate_table,
};
pub use table::{DynamoTable, TableHandle};

// Re-export aws-config types for configuration
pub use aws_config::{BehaviorVersion, Region, SdkConfig};

use aws_sdk_dynamodb::Client as DynamoDbClient;

/// Load the AWS configuration for one table's client
///
/// It configures:
/// - Adaptive retry mode with 3 max attempts, or `options.retries`
/// - Exponential backoff starting at 1 second
/// - Connect timeout: 3 seconds
/// - Read timeout: 20 seconds
/// - Operation timeout: 60 seconds
/// - LocalStack support via AWS_PROFILE=localstack
///
/// These retries cover whole-request failures such as throttled scans.
/// Items a successful `BatchWriteItem` leaves unprocessed are retried by
/// [`MutationExecutor`] instead.
pub async fn aws_config_defaults(options: &ClientOptions) -> SdkConfig {
    use aws_types::sdk_config::{RetryConfig, TimeoutConfig};
    use std::time::Duration;

    let timeout_config = TimeoutConfig::builder()
        .connect_timeout(Duration::from_secs(3))
        .read_timeout(Duration::from_secs(20))
        .operation_timeout(Duration::from_secs(60))
        .build();

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(
            RetryConfig::adaptive()
                .with_max_attempts(options.retries.unwrap_or(3))
                .with_initial_backoff(Duration::from_secs(1)),
        )
        .timeout_config(timeout_config);

    if let Some(profile) = &options.profile {
        loader = loader.profile_name(profile);
    }

    if let Some(region) = &options.region {
        loader = loader.region(Region::new(region.clone()));
    }

    if let Some(endpoint_url) = &options.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    } else if std::env::var("AWS_PROFILE").unwrap_or_default() == "localstack" {
        loader = loader.endpoint_url("http://127.0.0.1:4566");
    }

    loader.load().await
}

/// Build a DynamoDB client for one table
///
/// Source and destination may live in different accounts or regions, so
/// every table gets its own client instead of a shared global one.
pub async fn dynamodb_client(options: &ClientOptions) -> DynamoDbClient {
    let config = aws_config_defaults(options).await;
    DynamoDbClient::new(&config)
}

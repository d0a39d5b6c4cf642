use std::time::Duration;

use crate::Error;
use crate::table::MAX_BATCH_SIZE;

/// Backoff applied between resubmissions of a partially applied batch
///
/// The delay starts at `initial_delay` and doubles after every retry. With
/// `max_delay` unset the growth is unbounded and a batch is retried until
/// the backend accepts all of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay before the first resubmission
    pub initial_delay: Duration,
    /// Optional ceiling for the delay between resubmissions
    pub max_delay: Option<Duration>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: None,
        }
    }
}

/// Options controlling one copy or truncate run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Use strongly consistent scans (doubles consumed read capacity)
    pub consistent_read: bool,
    /// Maximum number of items read per scan page
    pub page_size: Option<u32>,
    /// Number of mutations per `BatchWriteItem` request
    pub batch_size: usize,
    /// Shell command each item is piped through before it is written
    pub transform: Option<String>,
    /// Skip the confirmation prompt
    pub assume_yes: bool,
    /// Backoff for partially applied batches
    pub backoff: BackoffConfig,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            consistent_read: false,
            page_size: None,
            batch_size: MAX_BATCH_SIZE,
            transform: None,
            assume_yes: false,
            backoff: BackoffConfig::default(),
        }
    }
}

impl PipelineOptions {
    /// Check the options before anything touches a table
    ///
    /// `truncating` is true when the run deletes from its source instead of
    /// copying to a destination; transformations only make sense for copies.
    pub fn validate(&self, truncating: bool) -> Result<(), Error> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(Error::InvalidOptions(format!(
                "batch size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                self.batch_size
            )));
        }

        if self.page_size == Some(0) {
            return Err(Error::InvalidOptions(
                "page size must be greater than zero".to_string(),
            ));
        }

        if let Some(page_size) = self.page_size {
            if i32::try_from(page_size).is_err() {
                return Err(Error::InvalidOptions(format!(
                    "page size {page_size} is too large"
                )));
            }
        }

        if self.backoff.initial_delay.is_zero() {
            return Err(Error::InvalidOptions(
                "initial backoff delay must be greater than zero".to_string(),
            ));
        }

        if let Some(command) = &self.transform {
            if truncating {
                return Err(Error::InvalidOptions(
                    "a transform can only be used when copying".to_string(),
                ));
            }
            if command.trim().is_empty() {
                return Err(Error::InvalidOptions(
                    "transform command is empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Connection settings for one table's DynamoDB client
///
/// Credentials come from the usual AWS provider chain; these only pick the
/// profile and region the chain resolves against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Named AWS profile, or `None` for environment credentials
    pub profile: Option<String>,
    /// Region the table is provisioned in
    pub region: Option<String>,
    /// Transport-level attempts per request (adaptive retry mode)
    pub retries: Option<u32>,
    /// Endpoint override, e.g. LocalStack
    pub endpoint_url: Option<String>,
}

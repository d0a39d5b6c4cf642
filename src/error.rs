use aws_sdk_dynamodb::error::BuildError;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_runtime_api::http::Response;
use std::error::Error as StdError;
use std::fmt;

type DynamoScanError = SdkError<ScanError, Response>;
type DynamoDescribeTableError = SdkError<DescribeTableError, Response>;
type DynamoBatchWriteItemError = SdkError<BatchWriteItemError, Response>;

/// Bulk copy/truncate error
#[derive(Debug)]
pub enum Error {
    /// DynamoDB request builder error
    BuildError(BuildError),
    /// DynamoDB Scan operation error
    DynamoScanError(DynamoScanError),
    /// DynamoDB DescribeTable operation error
    DynamoDescribeTableError(DynamoDescribeTableError),
    /// DynamoDB BatchWriteItem operation error
    DynamoBatchWriteItemError(DynamoBatchWriteItemError),
    /// A table handle other than DynamoDB failed to read
    ReadFailed(String),
    /// A table handle other than DynamoDB failed to write
    WriteFailed(String),
    /// A scanned item lacks one of the table's key attributes
    MissingKeyAttribute {
        /// Table the item was read from
        table: String,
        /// Key attribute that was absent
        attribute: String,
    },
    /// The table description carries no usable key schema
    InvalidKeySchema(String),
    /// The backend reported unprocessed mutations that were not submitted
    UnexpectedUnprocessed {
        /// Mutations sent in the request
        submitted: usize,
        /// Mutations reported back as unprocessed
        unprocessed: usize,
    },
    /// The external transformation failed or produced undecodable output
    Transform(String),
    /// Invalid run options
    InvalidOptions(String),
    /// Reading the operator's confirmation failed
    Prompt(std::io::Error),
}

impl Error {
    /// The source could not be described or scanned
    ///
    /// Read failures abort the run before any further mutation.
    pub fn is_read_failure(&self) -> bool {
        matches!(
            self,
            Error::DynamoScanError(_)
                | Error::DynamoDescribeTableError(_)
                | Error::ReadFailed(_)
                | Error::MissingKeyAttribute { .. }
                | Error::InvalidKeySchema(_)
        )
    }

    /// The external transformation failed
    pub fn is_transform_failure(&self) -> bool {
        matches!(self, Error::Transform(_))
    }

    /// A batch write failed outright (as opposed to partially)
    pub fn is_write_failure(&self) -> bool {
        matches!(
            self,
            Error::DynamoBatchWriteItemError(_)
                | Error::WriteFailed(_)
                | Error::UnexpectedUnprocessed { .. }
                | Error::BuildError(_)
        )
    }

    /// The run was misconfigured
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::InvalidOptions(_))
    }

    /// The confirmation prompt could not be read
    pub fn is_prompt_error(&self) -> bool {
        matches!(self, Error::Prompt(_))
    }
}

macro_rules! impl_from_error {
    ($name:ident) => {
        impl From<$name> for Error {
            fn from(e: $name) -> Self {
                Error::$name(e)
            }
        }
    };
}

impl_from_error!(BuildError);
impl_from_error!(DynamoScanError);
impl_from_error!(DynamoDescribeTableError);
impl_from_error!(DynamoBatchWriteItemError);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BuildError(e) => write!(f, "DynamoDB request builder error: {}", e),
            Error::DynamoScanError(e) => write!(f, "DynamoDB Scan operation failed: {}", e),
            Error::DynamoDescribeTableError(e) => {
                write!(f, "DynamoDB DescribeTable operation failed: {}", e)
            }
            Error::DynamoBatchWriteItemError(e) => {
                write!(f, "DynamoDB BatchWriteItem operation failed: {}", e)
            }
            Error::ReadFailed(reason) => write!(f, "read failed: {}", reason),
            Error::WriteFailed(reason) => write!(f, "write failed: {}", reason),
            Error::MissingKeyAttribute { table, attribute } => write!(
                f,
                "item read from table {} has no key attribute {}",
                table, attribute
            ),
            Error::InvalidKeySchema(table) => {
                write!(f, "table {} has no partition key in its key schema", table)
            }
            Error::UnexpectedUnprocessed {
                submitted,
                unprocessed,
            } => write!(
                f,
                "backend reported {} unprocessed mutations that do not belong to the {} submitted",
                unprocessed, submitted
            ),
            Error::Transform(reason) => write!(f, "transform failed: {}", reason),
            Error::InvalidOptions(reason) => write!(f, "invalid options: {}", reason),
            Error::Prompt(e) => write!(f, "could not read confirmation: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::BuildError(e) => Some(e),
            Error::DynamoScanError(e) => Some(e),
            Error::DynamoDescribeTableError(e) => Some(e),
            Error::DynamoBatchWriteItemError(e) => Some(e),
            Error::Prompt(e) => Some(e),
            _ => None,
        }
    }
}

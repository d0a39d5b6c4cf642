use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::operation::scan::builders::ScanFluentBuilder;
use aws_sdk_dynamodb::types::{KeyType, Select, TableDescription};
use tracing::debug;

use crate::config::ClientOptions;
use crate::error::Error;
use crate::table::batch::batch_write_internal;
use crate::table::helpers::expressions::ProjectionBuilder;
use crate::table::types::{Cursor, KeySchema, Mutation, Page, PageRequest, TableSummary};
use crate::table::TableHandle;

/// A DynamoDB table reached through an SDK client
#[derive(Clone, Debug)]
pub struct DynamoTable {
    client: Client,
    name: String,
}

impl DynamoTable {
    /// Handle for `name` using an existing client
    pub fn new(client: Client, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    /// Build a client from `options` and wrap the named table
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use dynamo_bulk::{ClientOptions, DynamoTable, TableHandle};
    ///
    /// # async fn example() -> Result<(), dynamo_bulk::Error> {
    /// let options = ClientOptions {
    ///     profile: Some("development".to_string()),
    ///     region: Some("eu-west-1".to_string()),
    ///     ..Default::default()
    /// };
    /// let table = DynamoTable::connect("users", &options).await;
    /// let summary = table.describe().await?;
    /// println!("{} holds about {:?} items", summary.name, summary.item_count);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(name: impl Into<String>, options: &ClientOptions) -> Self {
        Self::new(crate::dynamodb_client(options).await, name)
    }

    /// The underlying SDK client
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn scan_builder(&self, request: PageRequest<'_>) -> ScanFluentBuilder {
        let mut builder = self
            .client
            .scan()
            .table_name(&self.name)
            .consistent_read(request.consistent)
            .set_limit(request.limit.and_then(|limit| i32::try_from(limit).ok()));

        builder = match request.key_only {
            Some(key_schema) => {
                let (expression, names) = ProjectionBuilder::new()
                    .with_key_schema(key_schema)
                    .build();
                builder
                    .projection_expression(expression)
                    .set_expression_attribute_names(Some(names))
            }
            // Scans operate on the base table, so requesting all attributes is always valid.
            None => builder.select(Select::AllAttributes),
        };

        if let Some(cursor) = request.cursor {
            builder = builder.set_exclusive_start_key(Some(cursor.as_item().clone()));
        }

        builder
    }
}

fn summary_from_description(
    name: &str,
    description: Option<TableDescription>,
) -> Result<TableSummary, Error> {
    let description = description.ok_or_else(|| Error::InvalidKeySchema(name.to_string()))?;

    let mut partition_key = None;
    let mut sort_key = None;
    for element in description.key_schema() {
        match element.key_type() {
            KeyType::Hash => partition_key = Some(element.attribute_name().to_string()),
            KeyType::Range => sort_key = Some(element.attribute_name().to_string()),
            _ => {}
        }
    }

    let partition_key = partition_key.ok_or_else(|| Error::InvalidKeySchema(name.to_string()))?;

    Ok(TableSummary {
        name: description.table_name().unwrap_or(name).to_string(),
        item_count: description
            .item_count()
            .and_then(|count| u64::try_from(count).ok()),
        key_schema: KeySchema {
            partition_key,
            sort_key,
        },
    })
}

impl TableHandle for DynamoTable {
    fn name(&self) -> &str {
        &self.name
    }

    async fn describe(&self) -> Result<TableSummary, Error> {
        let output = self
            .client
            .describe_table()
            .table_name(&self.name)
            .send()
            .await?;

        summary_from_description(&self.name, output.table)
    }

    async fn read_page(&self, request: PageRequest<'_>) -> Result<Page, Error> {
        let output = self.scan_builder(request).send().await?;

        let items = output.items.unwrap_or_default();
        // DynamoDB may send an empty map instead of omitting the key on the last page
        let cursor = output
            .last_evaluated_key
            .filter(|key| !key.is_empty())
            .map(Cursor::new);

        debug!(
            table = %self.name,
            items = items.len(),
            scanned = output.scanned_count,
            more = cursor.is_some(),
            "scanned page"
        );

        Ok(Page { items, cursor })
    }

    async fn apply_batch(&self, pending: Vec<Mutation>) -> Result<Vec<Mutation>, Error> {
        batch_write_internal(&self.client, &self.name, pending).await
    }
}

use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

use crate::Error;

/// Largest number of mutations DynamoDB accepts in one `BatchWriteItem`
pub const MAX_BATCH_SIZE: usize = 25;

/// One row: attribute name to typed value
pub type Item = HashMap<String, AttributeValue>;

/// The attributes that identify a row under its table's key schema
#[derive(Clone, Debug, PartialEq)]
pub struct ItemKey(Item);

impl ItemKey {
    /// Wrap key attributes already projected by the caller
    pub fn new(attributes: Item) -> Self {
        Self(attributes)
    }

    /// Key attributes by name
    pub fn attributes(&self) -> &Item {
        &self.0
    }

    /// Consume the key into its attribute map
    pub fn into_attributes(self) -> Item {
        self.0
    }
}

/// Partition key and optional sort key attribute names
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySchema {
    /// HASH key attribute
    pub partition_key: String,
    /// RANGE key attribute
    pub sort_key: Option<String>,
}

impl KeySchema {
    /// Key schema with only a partition key
    pub fn new(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: None,
        }
    }

    /// Add a sort key
    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    /// Key attribute names, partition key first
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.partition_key.as_str()).chain(self.sort_key.as_deref())
    }

    /// Project an item onto its key attributes
    pub fn project(&self, table: &str, item: &Item) -> Result<ItemKey, Error> {
        let mut key = HashMap::with_capacity(2);

        for name in self.attribute_names() {
            let value = item.get(name).ok_or_else(|| Error::MissingKeyAttribute {
                table: table.to_string(),
                attribute: name.to_string(),
            })?;
            let _ = key.insert(name.to_string(), value.clone());
        }

        Ok(ItemKey(key))
    }
}

impl std::fmt::Display for KeySchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.sort_key {
            Some(sort_key) => write!(f, "{} (partition), {} (sort)", self.partition_key, sort_key),
            None => write!(f, "{} (partition)", self.partition_key),
        }
    }
}

/// Opaque position to resume a scan after
///
/// Cursors are only ever forwarded verbatim from one page to the request
/// for the next.
#[must_use = "cursor should be used for pagination to fetch the next page"]
#[derive(Clone, Debug, PartialEq)]
pub struct Cursor(Item);

impl Cursor {
    /// Wrap a backend continuation key
    pub fn new(last_evaluated_key: Item) -> Self {
        Self(last_evaluated_key)
    }

    /// The backend continuation key
    pub fn as_item(&self) -> &Item {
        &self.0
    }
}

/// Items returned by one read call
#[must_use = "pages carry scanned items that should be processed"]
#[derive(Clone, Debug, Default)]
pub struct Page {
    /// Items in scan order
    pub items: Vec<Item>,
    /// Present unless this is the last page
    pub cursor: Option<Cursor>,
}

/// Parameters for one read call
#[derive(Clone, Copy, Debug, Default)]
pub struct PageRequest<'a> {
    /// Continue after this cursor; `None` starts at the beginning
    pub cursor: Option<&'a Cursor>,
    /// Strongly consistent read
    pub consistent: bool,
    /// Page size hint
    pub limit: Option<u32>,
    /// Read only these key attributes instead of whole items
    pub key_only: Option<&'a KeySchema>,
}

/// Descriptive data used to render the confirmation prompt
///
/// `item_count` is the backend's periodically refreshed estimate and is
/// never used for correctness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSummary {
    /// Table name
    pub name: String,
    /// Approximate number of items
    pub item_count: Option<u64>,
    /// Key schema of the table
    pub key_schema: KeySchema,
}

/// One idempotent, key-addressed write
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    /// Insert or replace a whole item
    Put(Item),
    /// Delete the item with this key
    Delete(ItemKey),
}

impl Mutation {
    /// Attributes shown to the operator for this mutation
    pub fn attributes(&self) -> &Item {
        match self {
            Mutation::Put(item) => item,
            Mutation::Delete(key) => key.attributes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(pairs: &[(&str, &str)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), AttributeValue::S(v.to_string())))
            .collect()
    }

    #[test]
    fn test_project_partition_key_only() {
        let schema = KeySchema::new("id");
        let key = schema
            .project("users", &item(&[("id", "1"), ("name", "ann")]))
            .unwrap();

        assert_eq!(key.attributes().len(), 1);
        assert_eq!(
            key.attributes().get("id"),
            Some(&AttributeValue::S("1".into()))
        );
    }

    #[test]
    fn test_project_composite_key() {
        let schema = KeySchema::new("game").with_sort_key("age");
        let key = schema
            .project(
                "scores",
                &item(&[("game", "chess"), ("age", "7"), ("ux", "x")]),
            )
            .unwrap();

        assert_eq!(key.into_attributes(), item(&[("game", "chess"), ("age", "7")]));
    }

    #[test]
    fn test_project_missing_sort_key() {
        let schema = KeySchema::new("game").with_sort_key("age");
        let err = schema
            .project("scores", &item(&[("game", "chess")]))
            .unwrap_err();

        assert!(err.is_read_failure());
        assert!(matches!(
            err,
            Error::MissingKeyAttribute { ref attribute, .. } if attribute == "age"
        ));
    }

    #[test]
    fn test_key_schema_display() {
        assert_eq!(KeySchema::new("id").to_string(), "id (partition)");
        assert_eq!(
            KeySchema::new("pk").with_sort_key("sk").to_string(),
            "pk (partition), sk (sort)"
        );
    }

    #[test]
    fn test_mutation_attributes() {
        let put = Mutation::Put(item(&[("id", "1"), ("v", "x")]));
        let delete = Mutation::Delete(ItemKey::new(item(&[("id", "1")])));

        assert_eq!(put.attributes().len(), 2);
        assert_eq!(delete.attributes().len(), 1);
    }
}

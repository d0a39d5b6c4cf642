#![allow(dead_code, unused_imports)]

/// Test helpers and fixtures for pipeline integration tests
///
/// This module provides an in-memory table implementing `TableHandle`,
/// scripted prompts, and item builders used across the integration tests.
pub mod fixtures;

pub use dynamo_bulk::table::{
    Cursor, Item, KeySchema, Mutation, Page, PageRequest, TableHandle, TableSummary,
};
pub use dynamo_bulk::{Error, PipelineOptions, RunResult, RunSummary};

pub use fixtures::{ScriptedPrompt, numbered_items, user_item};

use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

const DEFAULT_PAGE_SIZE: usize = 100;

/// One recorded `read_page` call
#[derive(Clone, Debug, PartialEq)]
pub struct ReadCall {
    pub cursor: Option<Cursor>,
    pub consistent: bool,
    pub key_only: bool,
    pub limit: Option<u32>,
}

#[derive(Debug, Default)]
struct State {
    items: BTreeMap<String, Item>,
    declines: VecDeque<usize>,
    reads: Vec<ReadCall>,
    submitted: Vec<Vec<Mutation>>,
}

/// In-memory table with a string partition key
///
/// Items are kept in key order and scanned with a last-evaluated-key
/// cursor, so deleting already scanned items does not disturb the scan.
#[derive(Debug)]
pub struct MemoryTable {
    name: String,
    key_schema: KeySchema,
    item_count: Option<u64>,
    state: Mutex<State>,
    fail_read_at: Option<usize>,
    fail_writes: bool,
}

impl MemoryTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            key_schema: KeySchema::new("id"),
            item_count: None,
            state: Mutex::new(State::default()),
            fail_read_at: None,
            fail_writes: false,
        }
    }

    pub fn with_items(self, items: Vec<Item>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for item in items {
                let key = key_of(&item);
                state.items.insert(key, item);
            }
        }
        self
    }

    /// Report `count` as the approximate item count instead of the real one
    pub fn with_item_count(mut self, count: u64) -> Self {
        self.item_count = Some(count);
        self
    }

    /// Decline the last `n` mutations of successive `apply_batch` calls
    pub fn declining(self, plan: impl IntoIterator<Item = usize>) -> Self {
        self.state.lock().unwrap().declines = plan.into_iter().collect();
        self
    }

    /// Fail the read with this zero-based index
    pub fn failing_read(mut self, index: usize) -> Self {
        self.fail_read_at = Some(index);
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn reads(&self) -> Vec<ReadCall> {
        self.state.lock().unwrap().reads.clone()
    }

    pub fn submitted(&self) -> Vec<Vec<Mutation>> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn submitted_sizes(&self) -> Vec<usize> {
        let state = self.state.lock().unwrap();
        state.submitted.iter().map(Vec::len).collect()
    }

    pub fn apply_calls(&self) -> usize {
        self.state.lock().unwrap().submitted.len()
    }

    pub fn items(&self) -> Vec<Item> {
        self.state.lock().unwrap().items.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().items.len()
    }

    pub fn get(&self, id: &str) -> Option<Item> {
        self.state.lock().unwrap().items.get(id).cloned()
    }
}

fn key_of(item: &Item) -> String {
    match item.get("id") {
        Some(AttributeValue::S(id)) => id.clone(),
        other => panic!("test item without a string id: {other:?}"),
    }
}

impl TableHandle for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    async fn describe(&self) -> Result<TableSummary, Error> {
        let count = self.state.lock().unwrap().items.len() as u64;
        Ok(TableSummary {
            name: self.name.clone(),
            item_count: Some(self.item_count.unwrap_or(count)),
            key_schema: self.key_schema.clone(),
        })
    }

    async fn read_page(&self, request: PageRequest<'_>) -> Result<Page, Error> {
        let mut state = self.state.lock().unwrap();
        if self.fail_read_at == Some(state.reads.len()) {
            return Err(Error::ReadFailed("ProvisionedThroughputExceeded".to_string()));
        }
        state.reads.push(ReadCall {
            cursor: request.cursor.cloned(),
            consistent: request.consistent,
            key_only: request.key_only.is_some(),
            limit: request.limit,
        });

        let after = request.cursor.map(|cursor| key_of(cursor.as_item()));
        let limit = request
            .limit
            .map_or(DEFAULT_PAGE_SIZE, |limit| limit as usize);

        let mut remaining = state
            .items
            .iter()
            .filter(|(key, _)| after.as_ref().is_none_or(|after| *key > after));

        let mut items = Vec::new();
        let mut last_key = None;
        for (key, item) in remaining.by_ref().take(limit) {
            let item = match request.key_only {
                Some(schema) => item
                    .iter()
                    .filter(|(name, _)| schema.attribute_names().any(|attribute| attribute == name.as_str()))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect(),
                None => item.clone(),
            };
            items.push(item);
            last_key = Some(key.clone());
        }

        let cursor = match (last_key, remaining.next()) {
            (Some(last_key), Some(_)) => Some(Cursor::new(Item::from([(
                "id".to_string(),
                AttributeValue::S(last_key),
            )]))),
            _ => None,
        };

        Ok(Page { items, cursor })
    }

    async fn apply_batch(&self, pending: Vec<Mutation>) -> Result<Vec<Mutation>, Error> {
        if self.fail_writes {
            return Err(Error::WriteFailed("ResourceNotFoundException".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        state.submitted.push(pending.clone());

        let declined = state.declines.pop_front().unwrap_or(0).min(pending.len());
        let mut accepted = pending;
        let unprocessed = accepted.split_off(accepted.len() - declined);

        for mutation in accepted {
            match mutation {
                Mutation::Put(item) => {
                    let key = key_of(&item);
                    state.items.insert(key, item);
                }
                Mutation::Delete(key) => {
                    let key = key_of(key.attributes());
                    state.items.remove(&key);
                }
            }
        }

        Ok(unprocessed)
    }
}

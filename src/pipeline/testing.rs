//! In-memory table for unit tests

use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::Error;
use crate::table::{Cursor, Item, KeySchema, Mutation, Page, PageRequest, TableHandle, TableSummary};

const DEFAULT_PAGE_SIZE: usize = 100;

pub(crate) fn numbered_items(count: usize) -> Vec<Item> {
    (0..count)
        .map(|i| {
            Item::from([
                ("id".to_string(), AttributeValue::S(format!("item-{i:04}"))),
                ("n".to_string(), AttributeValue::N(i.to_string())),
            ])
        })
        .collect()
}

#[derive(Debug, Default)]
struct State {
    items: Vec<Item>,
    declines: VecDeque<usize>,
    reads: Vec<(Option<Cursor>, bool, bool)>,
    submitted: Vec<Vec<Mutation>>,
}

/// Table keyed by `id`, scanned by offset cursors
#[derive(Debug)]
pub(crate) struct VecTable {
    name: String,
    state: Mutex<State>,
    fail_read_after: Option<usize>,
    fail_writes: bool,
    foreign_unprocessed: bool,
}

impl VecTable {
    pub(crate) fn new(name: &str, items: Vec<Item>) -> Self {
        Self {
            name: name.to_string(),
            state: Mutex::new(State {
                items,
                ..Default::default()
            }),
            fail_read_after: None,
            fail_writes: false,
            foreign_unprocessed: false,
        }
    }

    /// Decline the last `n` mutations of successive calls
    pub(crate) fn declining(self, plan: impl IntoIterator<Item = usize>) -> Self {
        self.state.lock().unwrap().declines = plan.into_iter().collect();
        self
    }

    pub(crate) fn fail_read_after(mut self, reads: usize) -> Self {
        self.fail_read_after = Some(reads);
        self
    }

    pub(crate) fn fail_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Report a mutation that was never submitted as unprocessed
    pub(crate) fn returning_foreign(mut self) -> Self {
        self.foreign_unprocessed = true;
        self
    }

    pub(crate) fn requested_cursors(&self) -> Vec<Option<Cursor>> {
        let state = self.state.lock().unwrap();
        state.reads.iter().map(|(cursor, _, _)| cursor.clone()).collect()
    }

    pub(crate) fn last_request_flags(&self) -> Option<(bool, bool)> {
        let state = self.state.lock().unwrap();
        state
            .reads
            .last()
            .map(|(_, consistent, key_only)| (*consistent, *key_only))
    }

    pub(crate) fn stored_items(&self) -> Vec<Item> {
        self.state.lock().unwrap().items.clone()
    }

    pub(crate) fn stored_count(&self) -> usize {
        self.state.lock().unwrap().items.len()
    }

    pub(crate) fn submitted_batches(&self) -> Vec<Vec<Mutation>> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub(crate) fn submitted_sizes(&self) -> Vec<usize> {
        let state = self.state.lock().unwrap();
        state.submitted.iter().map(Vec::len).collect()
    }
}

fn offset(cursor: Option<&Cursor>) -> usize {
    match cursor.and_then(|cursor| cursor.as_item().get("offset")) {
        Some(AttributeValue::N(n)) => n.parse().unwrap_or_default(),
        _ => 0,
    }
}

impl TableHandle for VecTable {
    fn name(&self) -> &str {
        &self.name
    }

    async fn describe(&self) -> Result<TableSummary, Error> {
        Ok(TableSummary {
            name: self.name.clone(),
            item_count: Some(self.stored_count() as u64),
            key_schema: KeySchema::new("id"),
        })
    }

    async fn read_page(&self, request: PageRequest<'_>) -> Result<Page, Error> {
        let mut state = self.state.lock().unwrap();
        if self.fail_read_after == Some(state.reads.len()) {
            return Err(Error::ReadFailed("scan throttled".to_string()));
        }
        state.reads.push((
            request.cursor.cloned(),
            request.consistent,
            request.key_only.is_some(),
        ));

        let start = offset(request.cursor);
        let limit = request.limit.map_or(DEFAULT_PAGE_SIZE, |limit| limit as usize);
        let end = (start + limit).min(state.items.len());

        let cursor = (end < state.items.len()).then(|| {
            Cursor::new(Item::from([(
                "offset".to_string(),
                AttributeValue::N(end.to_string()),
            )]))
        });

        Ok(Page {
            items: state.items[start..end].to_vec(),
            cursor,
        })
    }

    async fn apply_batch(&self, pending: Vec<Mutation>) -> Result<Vec<Mutation>, Error> {
        if self.fail_writes {
            return Err(Error::WriteFailed("table not found".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        state.submitted.push(pending.clone());

        let declined = state.declines.pop_front().unwrap_or(0).min(pending.len());
        let mut accepted = pending;
        let mut unprocessed = accepted.split_off(accepted.len() - declined);
        if self.foreign_unprocessed {
            unprocessed = vec![Mutation::Put(Item::from([(
                "id".to_string(),
                AttributeValue::S("foreign".to_string()),
            )]))];
        }

        for mutation in accepted {
            match mutation {
                Mutation::Put(item) => {
                    let position = state.items.iter().position(|stored| stored["id"] == item["id"]);
                    match position {
                        Some(position) => state.items[position] = item,
                        None => state.items.push(item),
                    }
                }
                Mutation::Delete(key) => {
                    let id = &key.attributes()["id"];
                    state.items.retain(|stored| &stored["id"] != id);
                }
            }
        }

        Ok(unprocessed)
    }
}

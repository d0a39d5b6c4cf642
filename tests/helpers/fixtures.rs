//! Common test fixtures
//!
//! Item builders and a prompt that answers from a script while recording
//! every preview it was shown.

use super::{Error, Item};
use aws_sdk_dynamodb::types::AttributeValue;
use dynamo_bulk::Prompt;

/// `count` items with ids `item-0000`, `item-0001`, ... in key order
pub fn numbered_items(count: usize) -> Vec<Item> {
    (0..count)
        .map(|i| user_item(&format!("item-{i:04}"), &format!("user {i}"), i))
        .collect()
}

/// Item shaped like a user record
pub fn user_item(id: &str, name: &str, age: usize) -> Item {
    Item::from([
        ("id".to_string(), AttributeValue::S(id.to_string())),
        ("name".to_string(), AttributeValue::S(name.to_string())),
        ("age".to_string(), AttributeValue::N(age.to_string())),
        (
            "roles".to_string(),
            AttributeValue::Ss(vec!["reader".to_string()]),
        ),
    ])
}

/// Prompt returning a fixed answer
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answer: String,
    shown: Vec<String>,
    fail: bool,
}

impl ScriptedPrompt {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            ..Default::default()
        }
    }

    /// Prompt whose input stream is closed
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.shown.len()
    }

    pub fn shown(&self) -> &[String] {
        &self.shown
    }
}

impl Prompt for ScriptedPrompt {
    fn prompt(&mut self, text: &str) -> Result<String, Error> {
        self.shown.push(text.to_string());
        if self.fail {
            return Err(Error::Prompt(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stdin closed",
            )));
        }
        Ok(self.answer.clone())
    }
}

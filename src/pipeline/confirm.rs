use std::fmt::Write as _;

use crate::Error;
use crate::pipeline::batcher::Batch;
use crate::pipeline::transform::item_to_json;
use crate::table::{Mutation, TableSummary};

/// Above this estimated item count the preview recommends a table-level alternative
pub const LARGE_TABLE_THRESHOLD: u64 = 100_000;

/// Number of first-batch entries shown in the preview
pub const PREVIEW_SIZE: usize = 10;

/// Operator input for the confirmation step
pub trait Prompt {
    /// Show `text` and return what the operator typed
    fn prompt(&mut self, text: &str) -> Result<String, Error>;
}

impl<P: Prompt + ?Sized> Prompt for &mut P {
    fn prompt(&mut self, text: &str) -> Result<String, Error> {
        (**self).prompt(text)
    }
}

/// Prompts on the controlling terminal
///
/// Falls back to reading one line from stdin when stderr is not a terminal,
/// so an answer can be piped in. Ctrl-C at the prompt, or stdin closing
/// before a line arrives, counts as not confirming.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    fn read_answer() -> std::io::Result<String> {
        if !dialoguer::console::Term::stderr().is_term() {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            return Ok(line);
        }

        dialoguer::Input::<String>::new()
            .with_prompt(">")
            .allow_empty(true)
            .interact_text()
            .map_err(|dialoguer::Error::IO(e)| e)
    }
}

impl Prompt for TerminalPrompt {
    fn prompt(&mut self, text: &str) -> Result<String, Error> {
        eprintln!("{text}");

        // the read blocks; hand the worker thread over when the runtime can spare it
        let answer = match tokio::runtime::Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(Self::read_answer)
            }
            _ => Self::read_answer(),
        };

        answer_or_cancel(answer)
    }
}

/// Map a terminal read to the operator's answer
///
/// An interrupted read becomes an empty answer, which cancels the run
/// instead of failing it.
pub(crate) fn answer_or_cancel(answer: std::io::Result<String>) -> Result<String, Error> {
    match answer {
        Ok(answer) => Ok(answer),
        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => Ok(String::new()),
        Err(e) => Err(Error::Prompt(e)),
    }
}

/// What a run is about to do, with descriptions of the tables involved
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Write every source item into the destination
    Copy {
        /// Table being scanned
        source: TableSummary,
        /// Table receiving the items
        destination: TableSummary,
    },
    /// Delete every item of the target
    Truncate {
        /// Table being emptied
        target: TableSummary,
    },
}

/// Last-chance confirmation before the first mutation of a run
///
/// The operator must type the name of the table about to be modified;
/// comparison ignores case and surrounding whitespace, and anything else
/// cancels the run.
#[derive(Clone, Debug)]
pub struct ConfirmationGate {
    operation: Operation,
}

impl ConfirmationGate {
    /// Gate for `operation`
    pub fn new(operation: Operation) -> Self {
        Self { operation }
    }

    /// The operation being confirmed
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Name the operator has to type
    pub fn token(&self) -> &str {
        match &self.operation {
            Operation::Copy { destination, .. } => &destination.name,
            Operation::Truncate { target } => &target.name,
        }
    }

    /// Whether `input` confirms the operation
    pub fn accepts(&self, input: &str) -> bool {
        input.trim().to_lowercase() == self.token().to_lowercase()
    }

    /// Preview text for the first batch
    pub fn render(&self, first_batch: &Batch<Mutation>) -> String {
        let mut text = String::new();

        let (noun, large) = match &self.operation {
            Operation::Copy {
                source,
                destination,
            } => {
                let _ = writeln!(
                    text,
                    "About to copy every item from {} into {}.",
                    describe(source),
                    describe(destination)
                );
                let _ = writeln!(
                    text,
                    "Items in {} with the same keys will be overwritten.",
                    destination.name
                );
                let large = is_large(source).then(|| {
                    format!(
                        "Table {} holds roughly {} items. Restoring a backup of it into a new \
                         table is usually cheaper and faster than copying items one by one.",
                        source.name,
                        source.item_count.unwrap_or_default()
                    )
                });
                ("items", large)
            }
            Operation::Truncate { target } => {
                let _ = writeln!(text, "About to delete every item in {}.", describe(target));
                let large = is_large(target).then(|| {
                    format!(
                        "Table {} holds roughly {} items. Deleting and recreating the table is \
                         usually cheaper and faster than deleting items one by one.",
                        target.name,
                        target.item_count.unwrap_or_default()
                    )
                });
                ("keys", large)
            }
        };

        let sample = first_batch.sample(PREVIEW_SIZE);
        let _ = writeln!(
            text,
            "First {} of {} {} in the first batch:",
            sample.len(),
            first_batch.len(),
            noun
        );
        for mutation in sample {
            let _ = writeln!(text, "  {}", preview(mutation));
        }

        if let Some(large) = large {
            let _ = writeln!(text, "{large}");
        }

        let _ = write!(
            text,
            "Type the table name {} to proceed; anything else cancels.",
            self.token()
        );

        text
    }

    /// Show the preview and read the operator's answer
    pub fn confirm<P: Prompt>(
        &self,
        first_batch: &Batch<Mutation>,
        prompt: &mut P,
    ) -> Result<bool, Error> {
        let input = prompt.prompt(&self.render(first_batch))?;
        Ok(self.accepts(&input))
    }
}

fn is_large(summary: &TableSummary) -> bool {
    summary
        .item_count
        .is_some_and(|count| count > LARGE_TABLE_THRESHOLD)
}

fn describe(summary: &TableSummary) -> String {
    let count = match summary.item_count {
        Some(count) => format!("~{count} items"),
        None => "unknown item count".to_string(),
    };
    format!("table {} ({count}; key {})", summary.name, summary.key_schema)
}

fn preview(mutation: &Mutation) -> String {
    let attributes = mutation.attributes();
    match item_to_json(attributes.clone()) {
        Ok(json) => json.to_string(),
        Err(_) => format!("{attributes:?}"),
    }
}

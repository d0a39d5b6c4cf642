use serde_json::Value;
use std::future::Future;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::Error;
use crate::table::Item;

/// Rewrites each item before it is written to the destination
pub trait Transformer {
    /// Produce the item to write in place of `item`
    ///
    /// Any error aborts the whole run; an item is never written untransformed.
    fn transform(&self, item: Item) -> impl Future<Output = Result<Item, Error>>;
}

/// Writes every item unchanged
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl Transformer for Identity {
    async fn transform(&self, item: Item) -> Result<Item, Error> {
        Ok(item)
    }
}

/// Pipes each item through a shell command as a JSON object
///
/// The command receives one JSON object on stdin and must print one JSON
/// object on stdout and exit successfully. Its stderr is passed through.
///
/// Numbers travel as JSON numbers, so decimals beyond `f64` precision are
/// rounded and binary attributes cannot be represented at all.
#[derive(Clone, Debug)]
pub struct ShellTransformer {
    command: String,
}

impl ShellTransformer {
    /// Transformer running `command` through the platform shell
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// The shell command
    pub fn command(&self) -> &str {
        &self.command
    }

    fn shell(&self) -> Command {
        #[cfg(windows)]
        {
            let mut command = Command::new("cmd");
            let _ = command.arg("/C").arg(&self.command);
            command
        }
        #[cfg(not(windows))]
        {
            let mut command = Command::new("sh");
            let _ = command.arg("-c").arg(&self.command);
            command
        }
    }

    fn failure(&self, reason: impl std::fmt::Display) -> Error {
        Error::Transform(format!("`{}`: {}", self.command, reason))
    }
}

impl Transformer for ShellTransformer {
    async fn transform(&self, item: Item) -> Result<Item, Error> {
        let input = item_to_json(item)
            .and_then(|json| serde_json::to_vec(&json).map_err(|e| e.to_string()))
            .map_err(|e| self.failure(format!("cannot encode item: {e}")))?;

        let mut child = self
            .shell()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.failure(format!("cannot start: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.failure("stdin not captured"))?;

        // Feed stdin while collecting stdout so a chatty child cannot fill its pipe and stall
        let write_input = async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        };
        let (written, output) = tokio::join!(write_input, child.wait_with_output());

        let output = output.map_err(|e| self.failure(e))?;
        if !output.status.success() {
            return Err(self.failure(output.status));
        }
        // A child that exits successfully without reading all of stdin is fine
        if let Err(e) = written {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(self.failure(format!("cannot write item: {e}")));
            }
        }

        let json: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| self.failure(format!("output is not JSON: {e}")))?;

        json_to_item(json).map_err(|e| self.failure(format!("output is not an item: {e}")))
    }
}

/// The transformation configured for a run
#[derive(Clone, Debug)]
pub enum Transform {
    /// No transformation
    Identity(Identity),
    /// External command
    Shell(ShellTransformer),
}

impl Transform {
    /// Shell transform for `command`, identity otherwise
    pub fn from_command(command: Option<&str>) -> Self {
        match command {
            Some(command) => Transform::Shell(ShellTransformer::new(command)),
            None => Transform::Identity(Identity),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::Identity(Identity)
    }
}

impl Transformer for Transform {
    async fn transform(&self, item: Item) -> Result<Item, Error> {
        match self {
            Transform::Identity(identity) => identity.transform(item).await,
            Transform::Shell(shell) => shell.transform(item).await,
        }
    }
}

/// Plain JSON rendering of an item
pub fn item_to_json(item: Item) -> Result<Value, String> {
    serde_dynamo::from_item(item).map_err(|e| e.to_string())
}

/// Item from a plain JSON object
pub fn json_to_item(json: Value) -> Result<Item, String> {
    if !json.is_object() {
        return Err(format!("expected a JSON object, got {json}"));
    }
    serde_dynamo::to_item(json).map_err(|e| e.to_string())
}

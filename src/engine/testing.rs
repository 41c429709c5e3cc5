//! Recording engine for unit tests.

use super::{ContainerEngine, EngineCommand, EngineOutput};
use crate::error::Result;
use crate::pipeline::credentials::Secret;
use std::cell::RefCell;
use std::collections::HashMap;

/// Records every invocation and answers from a table keyed by subcommand.
///
/// Unconfigured subcommands succeed, except `image` (inspect), which reports
/// the image as missing.
#[derive(Debug, Default)]
pub(crate) struct RecordingEngine {
    calls: RefCell<Vec<Vec<String>>>,
    stdin: RefCell<Vec<String>>,
    responses: HashMap<String, EngineOutput>,
}

impl RecordingEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answers every `subcommand` invocation with `output`.
    pub(crate) fn respond(mut self, subcommand: &str, output: EngineOutput) -> Self {
        self.responses.insert(subcommand.to_string(), output);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// First argument of each call, in order
    pub(crate) fn subcommands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|args| args.first().cloned())
            .collect()
    }

    /// Everything written to stdin, one entry per call that had stdin
    pub(crate) fn stdin(&self) -> Vec<String> {
        self.stdin.borrow().clone()
    }
}

impl ContainerEngine for RecordingEngine {
    async fn run(
        &self,
        command: &EngineCommand<'_>,
        stdin: Option<&Secret>,
    ) -> Result<EngineOutput> {
        let args = command.args();
        let subcommand = args.first().cloned().unwrap_or_default();
        self.calls.borrow_mut().push(args);
        if let Some(secret) = stdin {
            self.stdin.borrow_mut().push(secret.expose().to_string());
        }

        Ok(match self.responses.get(&subcommand) {
            Some(output) => output.clone(),
            None if subcommand == "image" => EngineOutput::failed(1, "Error: No such image"),
            None => EngineOutput::ok(),
        })
    }
}

//! Batch runner
//!
//! Feeds every input record through build and execute, one record at a
//! time. The result is the concatenation of each record's sequence in input
//! order.

use crate::error::{BatchFailure, DispatchError};
use crate::input::InputSource;
use crate::resource::{build, Dispatcher, Operation, ResourceType};
use serde_json::{json, Value};

/// How a batch reacts to a failed record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Substitute an error marker record instead of aborting
    pub continue_on_failure: bool,
}

/// Runs one (resource, operation) over a batch of input records
pub struct BatchRunner<'a> {
    dispatcher: &'a Dispatcher,
    resource: ResourceType,
    operation: Operation,
    options: BatchOptions,
}

impl<'a> BatchRunner<'a> {
    pub fn new(dispatcher: &'a Dispatcher, resource: ResourceType, operation: Operation) -> Self {
        Self {
            dispatcher,
            resource,
            operation,
            options: BatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Process all records. An empty batch still runs once, for record 0.
    pub async fn run(&self, input: &dyn InputSource) -> Result<Vec<Value>, BatchFailure> {
        let count = input.len().max(1);
        let mut output = Vec::new();

        for index in 0..count {
            match self.run_one(input, index).await {
                Ok(records) => output.extend(records),
                Err(err) if self.options.continue_on_failure => {
                    tracing::warn!(
                        "record {} of {} {} failed, continuing: {}",
                        index,
                        self.resource,
                        self.operation,
                        err
                    );
                    output.push(error_marker(&err, index));
                },
                Err(err) => {
                    return Err(BatchFailure {
                        record_index: index,
                        completed: output,
                        source: err,
                    });
                },
            }
        }

        tracing::info!(
            "{} {}: {} records from {} inputs",
            self.resource,
            self.operation,
            output.len(),
            count
        );
        Ok(output)
    }

    async fn run_one(&self, input: &dyn InputSource, index: usize) -> Result<Vec<Value>, DispatchError> {
        let params = build(self.resource, self.operation, input, index)?;
        Ok(self.dispatcher.execute(&params).await?.records)
    }
}

/// Record standing in for a failed input record
pub fn error_marker(err: &DispatchError, record_index: usize) -> Value {
    json!({
        "error": err.to_string(),
        "kind": err.kind(),
        "recordIndex": record_index,
    })
}

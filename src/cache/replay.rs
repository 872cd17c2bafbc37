//! Reconstruction of a tracked operation's call history
//!
//! Replay never fails on a damaged or partial history: calls whose output was
//! never written show up as [`CallOutcome::Missing`], entries that cannot be
//! decoded are rendered with a marker instead of aborting the replay.

use crate::backend::{parse_counter, SharedBackend};
use crate::cache::history::{HistoryRecord, HistoryValue, RecordBody};
use crate::cache::key::OperationId;
use crate::error::Result;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Arguments of a replayed call
#[derive(Debug, Clone, PartialEq)]
pub enum CallArguments {
    Decoded(Vec<HistoryValue>),
    /// Raw input entry that could not be decoded
    Undecodable(String),
}

/// What a replayed call produced
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Returned(HistoryValue),
    Failed(String),
    /// No output was ever recorded for this call
    Missing,
    /// Raw output entry that could not be decoded
    Undecodable(String),
}

impl fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallOutcome::Returned(value) => write!(f, "{}", value),
            CallOutcome::Failed(error) => write!(f, "<failed: {}>", error),
            CallOutcome::Missing => write!(f, "<no output recorded>"),
            CallOutcome::Undecodable(raw) => write!(f, "<undecodable output: {}>", raw),
        }
    }
}

/// One call reconstructed from history
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    /// 1-based position in the inputs list (call order)
    pub position: u64,
    pub args: CallArguments,
    pub outcome: CallOutcome,
}

/// Full call history of one operation
#[derive(Debug, Clone, PartialEq)]
pub struct Replay {
    pub operation: String,
    /// Counter value, or the number of recorded inputs if no counter exists
    pub call_count: u64,
    pub calls: Vec<CallRecord>,
    /// Outputs that reference an input which does not exist
    pub orphan_outputs: usize,
}

impl Replay {
    /// One human-readable line per call, in call order
    pub fn lines(&self) -> Vec<String> {
        self.calls.iter().map(|call| self.render(call)).collect()
    }

    /// Calls whose output was never recorded
    pub fn missing_outputs(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| c.outcome == CallOutcome::Missing)
            .count()
    }

    /// Check if no call was recorded
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    fn render(&self, call: &CallRecord) -> String {
        let args = match &call.args {
            CallArguments::Decoded(values) => values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            CallArguments::Undecodable(raw) => format!("<undecodable input: {}>", raw),
        };
        format!("{}({}) -> {}", self.operation, args, call.outcome)
    }
}

impl fmt::Display for Replay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.call_count == 1 { "time" } else { "times" };
        write!(f, "{} was called {} {}:", self.operation, self.call_count, noun)?;
        for line in self.lines() {
            write!(f, "\n{}", line)?;
        }
        Ok(())
    }
}

/// Reads recorded history back from the backend
pub struct ReplayLog {
    backend: SharedBackend,
}

impl ReplayLog {
    /// Create a replay log over `backend`
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// Reconstruct every recorded call of `operation`
    pub async fn replay(&self, operation: impl Into<OperationId>) -> Result<Replay> {
        let id = operation.into();

        let counter = match self.backend.get(&id.counter_key()).await? {
            Some(raw) => Some(parse_counter(&id.counter_key(), &raw)?.max(0) as u64),
            None => None,
        };
        let inputs = self.backend.read_list(&id.inputs_key()).await?;
        let outputs = self.backend.read_list(&id.outputs_key()).await?;

        debug!(
            "Replaying {}: {} inputs, {} outputs",
            id,
            inputs.len(),
            outputs.len()
        );

        let mut answered: HashMap<u64, CallOutcome> = HashMap::new();
        let mut undecodable_by_index: HashMap<usize, String> = HashMap::new();

        for (index, raw) in outputs.iter().enumerate() {
            let decoded = HistoryRecord::decode(raw);
            let outcome = match &decoded {
                Ok(HistoryRecord {
                    body: RecordBody::Returned { call, value },
                    ..
                }) => Some((*call, CallOutcome::Returned(value.clone()))),
                Ok(HistoryRecord {
                    body: RecordBody::Failed { call, error },
                    ..
                }) => Some((*call, CallOutcome::Failed(error.clone()))),
                _ => None,
            };

            match outcome {
                Some((call, outcome)) => {
                    answered.entry(call).or_insert(outcome);
                }
                None => {
                    warn!("Undecodable output #{} for {}", index + 1, id);
                    undecodable_by_index.insert(index, lossy(raw));
                }
            }
        }

        let mut calls = Vec::with_capacity(inputs.len());
        for (index, raw) in inputs.iter().enumerate() {
            let position = index as u64 + 1;

            let args = match HistoryRecord::decode(raw) {
                Ok(HistoryRecord {
                    body: RecordBody::Call { args },
                    ..
                }) => CallArguments::Decoded(args),
                _ => {
                    warn!("Undecodable input #{} for {}", position, id);
                    CallArguments::Undecodable(lossy(raw))
                }
            };

            let outcome = answered
                .remove(&position)
                .or_else(|| undecodable_by_index.remove(&index).map(CallOutcome::Undecodable))
                .unwrap_or(CallOutcome::Missing);

            calls.push(CallRecord {
                position,
                args,
                outcome,
            });
        }

        let orphan_outputs = answered.len();
        if orphan_outputs > 0 {
            warn!("{} outputs of {} reference unknown inputs", orphan_outputs, id);
        }

        Ok(Replay {
            operation: id.name().to_string(),
            call_count: counter.unwrap_or(calls.len() as u64),
            calls,
            orphan_outputs,
        })
    }
}

fn lossy(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

//! Call counting and history recording around an arbitrary operation

use crate::backend::{parse_counter, SharedBackend};
use crate::cache::history::{HistoryRecord, HistoryValue, Recordable};
use crate::cache::key::OperationId;
use crate::error::Result;
use std::future::Future;
use tracing::{debug, warn};

/// Wraps calls to one logical operation with a counter and an input/output log
///
/// For every [`invoke`](Self::invoke) the order is fixed:
/// 1. increment the operation counter
/// 2. append the arguments to `<name>:inputs`
/// 3. run the operation
/// 4. append the result (or failure) to `<name>:outputs`
///
/// Steps 1 and 2 happen before the operation runs, so counters and inputs
/// reflect attempted calls even when the operation never completes.
#[derive(Clone)]
pub struct TrackedOperation {
    backend: SharedBackend,
    id: OperationId,
    count_calls: bool,
    record_history: bool,
}

impl TrackedOperation {
    /// Track `name` with both counting and history enabled
    pub fn new(backend: SharedBackend, name: impl Into<OperationId>) -> Self {
        Self {
            backend,
            id: name.into(),
            count_calls: true,
            record_history: true,
        }
    }

    /// Enable or disable the call counter
    pub fn count_calls(mut self, enable: bool) -> Self {
        self.count_calls = enable;
        self
    }

    /// Enable or disable input/output history
    pub fn record_history(mut self, enable: bool) -> Self {
        self.record_history = enable;
        self
    }

    /// Identity of the tracked operation
    pub fn id(&self) -> &OperationId {
        &self.id
    }

    /// Run `op` with counting and history recording around it
    ///
    /// A failed operation still gets an output record (marked as failed) so
    /// its input is never left without a partner; the operation's error is then
    /// returned. Backend failures while tracking are propagated.
    pub async fn invoke<T, F, Fut>(&self, args: Vec<HistoryValue>, op: F) -> Result<T>
    where
        T: Recordable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if self.count_calls {
            let count = self.backend.increment(&self.id.counter_key()).await?;
            debug!("{} call #{}", self.id, count);
        }

        let position = if self.record_history {
            let record = HistoryRecord::call(args).encode()?;
            Some(
                self.backend
                    .append_to_list(&self.id.inputs_key(), &record)
                    .await?,
            )
        } else {
            None
        };

        let outcome = op().await;

        if let Some(call) = position {
            let record = match &outcome {
                Ok(value) => HistoryRecord::returned(call, value.to_history()),
                Err(e) => HistoryRecord::failed(call, e.to_string()),
            };

            let appended = match record.encode() {
                Ok(raw) => self
                    .backend
                    .append_to_list(&self.id.outputs_key(), &raw)
                    .await
                    .map(|_| ()),
                Err(e) => Err(e),
            };

            if let Err(record_err) = appended {
                if outcome.is_ok() {
                    return Err(record_err);
                }
                warn!(
                    "Could not record failure of {} call #{}: {}",
                    self.id, call, record_err
                );
            }
        }

        outcome
    }

    /// Current value of the call counter, 0 if the operation was never called
    pub async fn counter(&self) -> Result<u64> {
        let key = self.id.counter_key();
        match self.backend.get(&key).await? {
            Some(raw) => Ok(parse_counter(&key, &raw)?.max(0) as u64),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{KeyValueBackend, MemoryBackend};
    use crate::cache::history::RecordBody;
    use crate::error::CacheError;
    use std::sync::Arc;

    fn backend() -> Arc<MemoryBackend> {
        Arc::new(MemoryBackend::new())
    }

    #[tokio::test]
    async fn test_invoke_counts_and_records() {
        let backend = backend();
        let op = TrackedOperation::new(backend.clone(), "double");

        let result = op
            .invoke(vec![HistoryValue::Integer(21)], || async { Ok(42i64) })
            .await
            .unwrap();
        assert_eq!(result, 42);
        assert_eq!(op.counter().await.unwrap(), 1);

        let inputs = backend.read_list("double:inputs").await.unwrap();
        let outputs = backend.read_list("double:outputs").await.unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(outputs.len(), 1);

        let output = HistoryRecord::decode(&outputs[0]).unwrap();
        assert_eq!(
            output.body,
            RecordBody::Returned {
                call: 1,
                value: HistoryValue::Integer(42)
            }
        );
    }

    #[tokio::test]
    async fn test_input_recorded_before_operation_runs() {
        let backend = backend();
        let op = TrackedOperation::new(backend.clone(), "probe");
        let observer = backend.clone();

        op.invoke(vec![], || async move {
            assert_eq!(observer.get("probe").await?, Some(b"1".to_vec()));
            assert_eq!(observer.read_list("probe:inputs").await?.len(), 1);
            assert!(observer.read_list("probe:outputs").await?.is_empty());
            Ok::<(), CacheError>(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_failed_operation_records_failure() {
        let backend = backend();
        let op = TrackedOperation::new(backend.clone(), "explode");

        let err = op
            .invoke::<(), _, _>(vec![], || async { Err(CacheError::Other("boom".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Other(_)));

        let outputs = backend.read_list("explode:outputs").await.unwrap();
        assert_eq!(outputs.len(), 1);
        let record = HistoryRecord::decode(&outputs[0]).unwrap();
        assert!(matches!(record.body, RecordBody::Failed { call: 1, .. }));
    }

    #[tokio::test]
    async fn test_counting_only() {
        let backend = backend();
        let op = TrackedOperation::new(backend.clone(), "quiet").record_history(false);

        op.invoke(vec![], || async { Ok(()) }).await.unwrap();
        op.invoke(vec![], || async { Ok(()) }).await.unwrap();

        assert_eq!(op.counter().await.unwrap(), 2);
        assert!(backend.read_list("quiet:inputs").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_only() {
        let backend = backend();
        let op = TrackedOperation::new(backend.clone(), "uncounted").count_calls(false);

        op.invoke(vec![], || async { Ok(()) }).await.unwrap();

        assert_eq!(op.counter().await.unwrap(), 0);
        assert_eq!(backend.read_list("uncounted:inputs").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_counter_never_called() {
        let op = TrackedOperation::new(backend(), "idle");
        assert_eq!(op.counter().await.unwrap(), 0);
    }
}

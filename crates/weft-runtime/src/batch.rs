//! Concurrent batch evaluation under a shared deadline

use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use weft_core::{BridgeError, Rejection, Value, DEFAULT_BATCH_TIMEOUT};
use weft_future::{Future, SettledResult, Thenable};

/// One slot of a batch
#[derive(Clone, Debug)]
pub enum BatchTask {
    /// Plain value, already done
    Ready(Value),
    /// Outcome known up front
    Settled(SettledResult),
    /// Awaited concurrently with the other pending slots
    Pending(Future),
}

impl From<Thenable> for BatchTask {
    fn from(thenable: Thenable) -> Self {
        match thenable {
            Thenable::Future(future) => BatchTask::Pending(future),
            Thenable::Settled(settled) => BatchTask::Settled(settled),
        }
    }
}

/// Evaluates a batch of tasks, preserving input order
///
/// Fails fast: the first rejected slot rejects the whole batch, and a batch
/// still running at the deadline rejects with [`BridgeError::BatchTimeout`].
/// Unfinished tasks are abandoned when evaluation returns.
#[derive(Clone, Debug)]
pub struct BatchEvaluator {
    timeout: Duration,
}

impl Default for BatchEvaluator {
    fn default() -> Self {
        BatchEvaluator::new(DEFAULT_BATCH_TIMEOUT)
    }
}

impl BatchEvaluator {
    pub fn new(timeout: Duration) -> Self {
        BatchEvaluator { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run every task concurrently and collect results in input order
    pub async fn evaluate(&self, tasks: Vec<BatchTask>) -> Result<Vec<Value>, Rejection> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let total = tasks.len();
        let mut slots: Vec<Option<Value>> = vec![None; total];
        let mut set = JoinSet::new();

        for (index, task) in tasks.into_iter().enumerate() {
            match task {
                BatchTask::Ready(value) => slots[index] = Some(value),
                BatchTask::Settled(settled) => slots[index] = Some(settled.into_outcome()?),
                BatchTask::Pending(future) => {
                    set.spawn(async move { (index, future.wait().await) });
                }
            }
        }

        debug!(total, pending = set.len(), timeout = ?self.timeout, "evaluating batch");

        let collect = async {
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((index, Ok(value))) => slots[index] = Some(value),
                    Ok((index, Err(reason))) => {
                        debug!(index, "batch slot rejected: {}", reason);
                        return Err(reason);
                    }
                    Err(e) => return Err(Rejection::from(BridgeError::TaskFailed(e.to_string()))),
                }
            }
            Ok(())
        };
        let finished = tokio::time::timeout(self.timeout, collect).await;

        match finished {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => return Err(reason),
            Err(_) => {
                let pending = set.len();
                warn!(pending, timeout = ?self.timeout, "batch deadline exceeded");
                return Err(BridgeError::BatchTimeout {
                    timeout: self.timeout,
                    pending,
                }
                .into());
            }
        }

        debug!(total, "batch fulfilled");
        Ok(slots.into_iter().map(Option::unwrap_or_default).collect())
    }
}

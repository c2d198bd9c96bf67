//! Native thenables

use weft_core::{BridgeResult, SettlementState, Value};

use crate::{Future, OnFulfilled, OnRejected, Outcome, SettledResult};

/// A native eventual outcome: pending future or settled result
#[derive(Clone, Debug)]
pub enum Thenable {
    Future(Future),
    Settled(SettledResult),
}

impl Thenable {
    /// Recognize a native thenable carried inside a value
    pub fn from_value(value: &Value) -> Option<Thenable> {
        let object = value.as_object()?;

        if let Some(future) = object.downcast_ref::<Future>() {
            return Some(Thenable::Future(future.clone()));
        }
        object
            .downcast_ref::<SettledResult>()
            .map(|settled| Thenable::Settled(settled.clone()))
    }

    /// Normalize a reaction outcome, adopting native thenables it carries
    pub fn adopt(outcome: Outcome) -> Thenable {
        if let Ok(value) = &outcome {
            if let Some(thenable) = Thenable::from_value(value) {
                return thenable;
            }
        }
        Thenable::Settled(SettledResult::from_outcome(outcome))
    }

    pub fn state(&self) -> SettlementState {
        match self {
            Thenable::Future(future) => future.state(),
            Thenable::Settled(settled) => settled.state(),
        }
    }

    /// Outcome, if already known
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            Thenable::Future(future) => future.outcome(),
            Thenable::Settled(settled) => Some(settled.outcome().clone()),
        }
    }

    /// Chain reactions onto the underlying future or settled result
    pub fn then(
        &self,
        on_fulfilled: Option<OnFulfilled>,
        on_rejected: Option<OnRejected>,
    ) -> BridgeResult<Thenable> {
        match self {
            Thenable::Future(future) => {
                Ok(Thenable::Future(future.then(on_fulfilled, on_rejected)))
            }
            Thenable::Settled(settled) => settled.then(on_fulfilled, on_rejected),
        }
    }

    /// Suspend until settled
    pub async fn settled(&self) -> Outcome {
        match self {
            Thenable::Future(future) => future.wait().await,
            Thenable::Settled(settled) => settled.outcome().clone(),
        }
    }

    /// Carry this thenable inside a value
    pub fn into_value(self) -> Value {
        match self {
            Thenable::Future(future) => Value::object(future),
            Thenable::Settled(settled) => Value::object(settled),
        }
    }
}

impl From<Future> for Thenable {
    fn from(future: Future) -> Self {
        Thenable::Future(future)
    }
}

impl From<SettledResult> for Thenable {
    fn from(settled: SettledResult) -> Self {
        Thenable::Settled(settled)
    }
}

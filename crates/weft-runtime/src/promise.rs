//! Wrapped promise handed to the executor

use std::fmt;

use weft_core::{BridgeResult, SettlementState};
use weft_future::{OnFulfilled, OnRejected, Outcome, Thenable};

use crate::PromiseAdapter;

/// A native thenable plus the adapter that produced it
#[derive(Clone)]
pub struct Promise {
    adopted: Thenable,
    adapter: PromiseAdapter,
}

impl Promise {
    pub(crate) fn new(adopted: Thenable, adapter: PromiseAdapter) -> Self {
        Promise { adopted, adapter }
    }

    /// The underlying future or settled result
    pub fn adopted(&self) -> &Thenable {
        &self.adopted
    }

    pub fn into_thenable(self) -> Thenable {
        self.adopted
    }

    pub fn adapter(&self) -> &PromiseAdapter {
        &self.adapter
    }

    pub fn state(&self) -> SettlementState {
        self.adopted.state()
    }

    /// Outcome, if already known
    pub fn outcome(&self) -> Option<Outcome> {
        self.adopted.outcome()
    }

    /// Chain through the owning adapter
    pub fn then(
        &self,
        on_fulfilled: Option<OnFulfilled>,
        on_rejected: Option<OnRejected>,
    ) -> BridgeResult<Promise> {
        self.adapter.then(self, on_fulfilled, on_rejected)
    }

    /// Suspend until settled
    pub async fn wait(&self) -> Outcome {
        self.adopted.settled().await
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("adopted", &self.adopted)
            .finish()
    }
}

//! Already-settled results

use weft_core::{BridgeError, BridgeResult, ExternalObject, Rejection, SettlementState, Value};

use crate::{OnFulfilled, OnRejected, Outcome, Thenable};

/// Immutable value/reason pair known at construction time
///
/// Never pending, so chaining never involves the scheduler.
#[derive(Clone, Debug, PartialEq)]
pub struct SettledResult {
    outcome: Outcome,
}

impl SettledResult {
    pub fn fulfilled(value: Value) -> Self {
        SettledResult { outcome: Ok(value) }
    }

    pub fn rejected(reason: Rejection) -> Self {
        SettledResult {
            outcome: Err(reason),
        }
    }

    pub fn from_outcome(outcome: Outcome) -> Self {
        SettledResult { outcome }
    }

    pub fn state(&self) -> SettlementState {
        match self.outcome {
            Ok(_) => SettlementState::Fulfilled,
            Err(_) => SettlementState::Rejected,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    pub fn reason(&self) -> Option<&Rejection> {
        self.outcome.as_ref().err()
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn into_outcome(self) -> Outcome {
        self.outcome
    }

    /// Chain reactions synchronously
    ///
    /// The matching reaction runs immediately and its outcome becomes the
    /// result; without one the original result is returned.
    pub fn then(
        &self,
        on_fulfilled: Option<OnFulfilled>,
        on_rejected: Option<OnRejected>,
    ) -> BridgeResult<Thenable> {
        if !self.state().is_settled() {
            return Err(BridgeError::NotSettled);
        }

        let next = match (&self.outcome, on_fulfilled, on_rejected) {
            (Ok(value), Some(reaction), _) => reaction(value.clone()),
            (Err(reason), _, Some(reaction)) => reaction(reason.clone()),
            _ => return Ok(Thenable::Settled(self.clone())),
        };

        Ok(Thenable::adopt(next))
    }
}

impl ExternalObject for SettledResult {
    fn type_name(&self) -> &'static str {
        "SettledResult"
    }
}

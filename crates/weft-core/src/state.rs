//! Settlement states for one-shot asynchronous values

use std::fmt;

/// Lifecycle of a future or settled result
///
/// Transitions are terminal: `Pending` may move to `Fulfilled` or `Rejected`,
/// and nothing ever leaves a settled state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SettlementState {
    /// Not yet settled
    #[default]
    Pending,
    /// Settled with a value
    Fulfilled,
    /// Settled with a rejection reason
    Rejected,
}

impl SettlementState {
    /// Is this a terminal state?
    #[inline]
    pub fn is_settled(self) -> bool {
        !matches!(self, SettlementState::Pending)
    }

    /// Can the state move to `next`?
    pub fn can_transition_to(self, next: SettlementState) -> bool {
        self == SettlementState::Pending && next.is_settled()
    }
}

impl fmt::Display for SettlementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettlementState::Pending => "pending",
            SettlementState::Fulfilled => "fulfilled",
            SettlementState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

//! Error types for the promise bridge

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Bridge errors
///
/// All kinds are contract-level failures and are never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    // Conversion errors
    #[error("Thenable is not supported: {0}")]
    UnsupportedThenable(String),

    #[error("Not yet implemented: {0}")]
    Unimplemented(&'static str),

    // Misuse errors
    #[error("Thenable was not recognized before conversion: {0}")]
    NotRecognized(&'static str),

    #[error("Thenable should always be settled before chaining")]
    NotSettled,

    #[error("Promise was created by a different adapter")]
    ForeignPromise,

    // Batch errors
    #[error("Batch timed out after {timeout:?} with {pending} task(s) pending")]
    BatchTimeout { timeout: Duration, pending: usize },

    #[error("Task failed: {0}")]
    TaskFailed(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BridgeError {
    /// Does this error indicate a bug in the caller rather than a runtime condition?
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            BridgeError::NotRecognized(_) | BridgeError::NotSettled | BridgeError::ForeignPromise
        )
    }
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Reason a future or settled result was rejected
///
/// Cheap to clone; equality is identity of the underlying error.
#[derive(Clone)]
pub struct Rejection(Arc<dyn StdError + Send + Sync + 'static>);

#[derive(Error, Debug)]
#[error("{0}")]
struct Message(String);

impl Rejection {
    /// Wrap an error
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Rejection(Arc::new(error))
    }

    /// Rejection carrying only a message
    pub fn msg(message: impl Into<String>) -> Self {
        Rejection::new(Message(message.into()))
    }

    /// Borrow the underlying error as a concrete type
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    /// The bridge error behind this rejection, if any
    pub fn bridge_error(&self) -> Option<&BridgeError> {
        self.downcast_ref::<BridgeError>()
    }

    /// Do both handles refer to the same error?
    pub fn ptr_eq(&self, other: &Rejection) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<BridgeError> for Rejection {
    fn from(error: BridgeError) -> Self {
        Rejection::new(error)
    }
}

impl PartialEq for Rejection {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rejection({})", self.0)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for Rejection {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

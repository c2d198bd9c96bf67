//! Weft Future - One-shot asynchronous values
//!
//! Two native representations of an eventual outcome:
//! - [`Future`]: starts pending, settles exactly once, runs continuations in order
//! - [`SettledResult`]: already known at construction, never pending
//!
//! [`Thenable`] is the closed union of the two.

pub mod future;
pub mod settled;
pub mod thenable;

pub use future::*;
pub use settled::*;
pub use thenable::*;

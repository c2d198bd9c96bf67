//! Weft Runtime - Promise adapter for a query executor
//!
//! The executor talks to [`PromiseAdapter`] only:
//! 1. Normalize values into native thenables (native fast path, then the registry)
//! 2. Chain reactions with `then`
//! 3. Aggregate many values concurrently with `all` under one deadline
//!
//! Every successful operation hands back a [`Promise`] that remembers which
//! adapter produced it.

pub mod adapter;
pub mod batch;
pub mod promise;

pub use adapter::*;
pub use batch::*;
pub use promise::*;

pub use weft_core::{BridgeConfig, BridgeError, BridgeResult, Rejection, SettlementState, Value};
pub use weft_future::{Future, OnFulfilled, OnRejected, Outcome, SettledResult, Thenable};
pub use weft_registry::{ThenableAdapter, ThenableAdapterRegistry, TypeDescriptor};

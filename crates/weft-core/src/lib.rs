//! Weft Core - Fundamental types shared by the promise bridge
//!
//! This crate defines the types used throughout the bridge:
//! - Dynamic values and identity-bearing external objects
//! - Settlement states (Pending, Fulfilled, Rejected)
//! - Rejection reasons and bridge errors
//! - Bridge configuration

pub mod config;
pub mod error;
pub mod state;
pub mod value;

pub use config::*;
pub use error::*;
pub use state::*;
pub use value::*;

//! Weft Registry - Recognition of third-party thenables
//!
//! Adapters are registered against type descriptors in a fixed order. The
//! first descriptor a candidate satisfies wins, and the winning adapter is
//! remembered per object identity so repeated checks skip the scan.

pub mod cache;
pub mod descriptor;
pub mod registry;

pub use cache::*;
pub use descriptor::*;
pub use registry::*;

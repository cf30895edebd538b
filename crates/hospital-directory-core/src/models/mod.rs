//! Domain models for the hospital directory.

mod filter;
mod hospital;
mod raw;
mod stats;

pub use filter::*;
pub use hospital::*;
pub use raw::*;
pub use stats::*;

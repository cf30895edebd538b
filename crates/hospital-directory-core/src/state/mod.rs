//! Listing state: pagination and search input debouncing.

mod debounce;
mod pagination;

pub use debounce::*;
pub use pagination::*;

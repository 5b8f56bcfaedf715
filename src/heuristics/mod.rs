//! Population-based search over customer orderings.
//!
//! Only the distance matrix is consulted here; the road graph never is.

pub mod genetic;
pub mod operators;

pub use genetic::*;
pub use operators::*;

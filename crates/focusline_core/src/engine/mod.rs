//! Pure focus-state and ordering rules.
//!
//! Nothing here touches storage; services feed these functions with rows
//! read from a repository or from the projection cache.

pub mod ordering;
pub mod transition;

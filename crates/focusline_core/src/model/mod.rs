//! Domain model for focus-tracked work items.
//!
//! # Responsibility
//! - Define canonical records (`Item`, `Zone`) and their closed enums.
//! - Define write-side value types consumed by engines and repositories.
//!
//! # Invariants
//! - Every item is identified by a stable `ItemId`.
//! - Context and status are closed enums; free text is parsed at the edges.

pub mod change;
pub mod item;
pub mod ref_code;
pub mod zone;

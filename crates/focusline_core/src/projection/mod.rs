//! Client-side projection of the item store.
//!
//! # Responsibility
//! - Keep a working set of items in memory for low-latency reads.
//! - Apply mutations optimistically and reconcile or reload afterwards.
//!
//! # Invariants
//! - Store failures after an optimistic write trigger a full reload, not a
//!   patch-level rollback.
//! - Responses for superseded requests are dropped (last request wins per
//!   item id).

pub mod cache;
pub mod session;

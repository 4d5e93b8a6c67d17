//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the item store contract consumed by the engines and services.
//! - Isolate SQLite query details from orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `ZoneNotFound`) in
//!   addition to DB transport errors.
//! - Repositories refuse connections that are not fully migrated.

pub mod item_repo;
mod schema;
pub mod zone_repo;

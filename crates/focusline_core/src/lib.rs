//! Core domain logic for Focusline.
//! This crate is the single source of truth for focus-state invariants.

pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod projection;
pub mod repo;
pub mod service;

pub use engine::ordering::{compute_reorder, OrderingError};
pub use engine::transition::{plan_transition, TransitionError, TransitionPlan};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::change::{FieldUpdate, ItemPatch, OrderUpdate, StatusChange, StatusWrites};
pub use model::item::{
    Item, ItemContext, ItemDraft, ItemId, ItemStatus, ItemValidationError, NewItem,
};
pub use model::zone::{Zone, ZoneId};
pub use projection::cache::{ProjectionCache, RequestTicket};
pub use projection::session::FocusSession;
pub use repo::item_repo::{
    AppliedTransition, ItemListQuery, ItemRepository, RepoError, RepoResult, SqliteItemRepository,
};
pub use repo::zone_repo::{SqliteZoneRepository, ZoneRepository};
pub use service::item_service::{
    parse_status, ItemService, ServiceError, ServiceResult, TransitionOutcome,
};
pub use service::zone_service::ZoneService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

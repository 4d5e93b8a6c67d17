//! Item use-case service.
//!
//! # Responsibility
//! - Validate requests before any write.
//! - Run the transition and ordering engines against authoritative rows.
//! - Map repository failures into caller-facing error kinds.
//!
//! # Invariants
//! - Validation failures never reach the repository.
//! - The current item is always looked up, never cached here.
//! - A demotion and its promotion are persisted as one repository call.

use crate::engine::ordering::{compute_reorder, OrderingError};
use crate::engine::transition::{plan_transition, TransitionError, TransitionPlan};
use crate::model::change::{ItemPatch, OrderUpdate};
use crate::model::item::{
    now_epoch_ms, Item, ItemDraft, ItemId, ItemStatus, ItemValidationError, NewItem,
};
use crate::model::zone::ZoneId;
use crate::repo::item_repo::{ItemListQuery, ItemRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

const REF_CODE_ATTEMPTS: u32 = 5;

/// Caller-facing error kinds for item operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Status text outside `waiting|in_progress|current|done`.
    InvalidStatus(String),
    /// Context text outside the closed set.
    InvalidContext(String),
    NotFound(ItemId),
    ZoneNotFound(ZoneId),
    /// Input rejected before any write (blank title, missing context, ...).
    Validation(ItemValidationError),
    /// Attempt to move a done item back into an open status.
    ReopenDone { id: ItemId, target: ItemStatus },
    InvalidOrder(OrderingError),
    /// The store rejected a write.
    Persistence(RepoError),
    /// The previous current item was demoted but the promotion failed.
    PartialTransitionFailure {
        demoted_id: ItemId,
        target_id: ItemId,
        source: RepoError,
    },
}

impl ServiceError {
    /// Whether the store may now differ from any optimistic projection.
    pub fn requires_reload(&self) -> bool {
        matches!(
            self,
            Self::Persistence(_) | Self::PartialTransitionFailure { .. } | Self::NotFound(_)
        )
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidStatus(value) => write!(
                f,
                "invalid status `{value}`; expected waiting|in_progress|current|done"
            ),
            Self::InvalidContext(value) => write!(
                f,
                "invalid context `{value}`; expected objectives|research|needs|reminders"
            ),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::ZoneNotFound(id) => write!(f, "zone not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::ReopenDone { id, target } => {
                write!(f, "item {id} is done and cannot move to `{target}`")
            }
            Self::InvalidOrder(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "persistence failure: {err}"),
            Self::PartialTransitionFailure {
                demoted_id,
                target_id,
                source,
            } => write!(
                f,
                "transition partially applied: demoted {demoted_id} but failed to promote {target_id}: {source}"
            ),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidOrder(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::PartialTransitionFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ItemValidationError> for ServiceError {
    fn from(value: ItemValidationError) -> Self {
        match value {
            ItemValidationError::InvalidStatus(text) => Self::InvalidStatus(text),
            ItemValidationError::InvalidContext(text) => Self::InvalidContext(text),
            other => Self::Validation(other),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::ZoneNotFound(id) => Self::ZoneNotFound(id),
            RepoError::PartialTransition {
                demoted_id,
                target_id,
                source,
            } => Self::PartialTransitionFailure {
                demoted_id,
                target_id,
                source: *source,
            },
            other => Self::Persistence(other),
        }
    }
}

impl From<TransitionError> for ServiceError {
    fn from(value: TransitionError) -> Self {
        match value {
            TransitionError::ReopenDone { id, target } => Self::ReopenDone { id, target },
        }
    }
}

impl From<OrderingError> for ServiceError {
    fn from(value: OrderingError) -> Self {
        Self::InvalidOrder(value)
    }
}

/// Result of a successful status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub item: Item,
    /// The previous current item, when this transition demoted it.
    pub demoted: Option<Item>,
}

impl TransitionOutcome {
    pub fn demoted_item_id(&self) -> Option<ItemId> {
        self.demoted.as_ref().map(|item| item.id)
    }
}

/// Use-case service over an item repository.
pub struct ItemService<R: ItemRepository> {
    repo: R,
}

impl<R: ItemRepository> ItemService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates a draft and creates the item at the end of the order.
    pub fn create_item(&self, draft: &ItemDraft) -> ServiceResult<Item> {
        let prepared = self.prepare_item(draft)?;
        self.insert_prepared(&prepared)
    }

    /// Validation half of `create_item`; performs no write.
    pub fn prepare_item(&self, draft: &ItemDraft) -> ServiceResult<NewItem> {
        NewItem::from_draft(draft).map_err(|err| {
            warn!("event=item_create module=service status=rejected reason={err}");
            ServiceError::from(err)
        })
    }

    /// Persists a previously prepared item.
    ///
    /// A generated ref code that collides with a stored one is redrawn up to
    /// `REF_CODE_ATTEMPTS` times; a caller-supplied code is never replaced.
    pub fn insert_prepared(&self, item: &NewItem) -> ServiceResult<Item> {
        let mut candidate = item.clone();
        let mut attempt = 1;
        let created = loop {
            match self.repo.create_item(&candidate) {
                Err(RepoError::DuplicateRefCode(code))
                    if candidate.generated_ref_code && attempt < REF_CODE_ATTEMPTS =>
                {
                    warn!(
                        "event=item_create module=service status=retry reason=ref_code_conflict ref_code={code} attempt={attempt}"
                    );
                    candidate.regenerate_ref_code();
                    attempt += 1;
                }
                result => break result?,
            }
        };
        info!(
            "event=item_create module=service status=ok item_id={} context={} priority_order={}",
            created.id, created.context, created.priority_order
        );
        Ok(created)
    }

    pub fn get_item(&self, id: ItemId) -> ServiceResult<Item> {
        self.repo.get_item(id)?.ok_or(ServiceError::NotFound(id))
    }

    pub fn list_items(&self, query: &ItemListQuery) -> ServiceResult<Vec<Item>> {
        Ok(self.repo.list_items(query)?)
    }

    pub fn current_item(&self) -> ServiceResult<Option<Item>> {
        Ok(self.repo.find_current()?)
    }

    /// Applies a field patch. Status and context are out of reach here.
    pub fn update_fields(&self, id: ItemId, patch: &ItemPatch) -> ServiceResult<Item> {
        let patch = patch.normalized()?;
        if patch.is_empty() {
            return self.get_item(id);
        }
        let updated = self.repo.update_fields(id, &patch)?;
        info!("event=item_update_fields module=service status=ok item_id={id}");
        Ok(updated)
    }

    /// Moves an item to `target`, demoting the previous current item when
    /// `target` is `current`.
    ///
    /// # Errors
    /// - `NotFound` for unknown ids.
    /// - `ReopenDone` when the item is done.
    /// - `Persistence` / `PartialTransitionFailure` when the store rejects a
    ///   write; callers holding projections must reload.
    pub fn transition_status(
        &self,
        id: ItemId,
        target: ItemStatus,
    ) -> ServiceResult<TransitionOutcome> {
        let item = self.get_item(id)?;
        let (current, in_progress_min) = match target {
            ItemStatus::Current => (
                self.repo.find_current()?,
                self.repo.min_priority_order(ItemStatus::InProgress)?,
            ),
            _ => (None, None),
        };

        let plan = plan_transition(
            &item,
            current.as_ref(),
            in_progress_min,
            target,
            now_epoch_ms(),
        )?;

        let writes = match plan {
            TransitionPlan::Unchanged => {
                info!(
                    "event=item_transition module=service status=unchanged item_id={id} to={target}"
                );
                return Ok(TransitionOutcome {
                    item,
                    demoted: None,
                });
            }
            TransitionPlan::Write(writes) => writes,
        };

        match self.repo.apply_transition(&writes) {
            Ok(applied) => {
                info!(
                    "event=item_transition module=service status=ok item_id={id} from={} to={target} demoted={}",
                    item.status,
                    applied
                        .demoted
                        .as_ref()
                        .map_or_else(|| "none".to_string(), |demoted| demoted.id.to_string())
                );
                Ok(TransitionOutcome {
                    item: applied.item,
                    demoted: applied.demoted,
                })
            }
            Err(err) => {
                let err = ServiceError::from(err);
                warn!(
                    "event=item_transition module=service status=error item_id={id} to={target} error={err}"
                );
                Err(err)
            }
        }
    }

    /// [`ItemService::transition_status`] for a status given as text.
    ///
    /// # Errors
    /// - `InvalidStatus` when `status` names no known status; nothing is read
    ///   or written.
    pub fn transition_status_named(
        &self,
        id: ItemId,
        status: &str,
    ) -> ServiceResult<TransitionOutcome> {
        let target = parse_status(status)?;
        self.transition_status(id, target)
    }

    /// Moves one item within its status bucket and persists the dense
    /// renumbering of that bucket.
    pub fn reorder(
        &self,
        status: ItemStatus,
        moved_id: ItemId,
        target_index: i64,
    ) -> ServiceResult<Vec<OrderUpdate>> {
        let bucket = self.repo.list_items(&ItemListQuery::bucket(status))?;
        let updates = match compute_reorder(&bucket, moved_id, target_index) {
            Ok(updates) => updates,
            Err(OrderingError::MovedItemMissing(id)) => {
                if self.repo.get_item(id)?.is_none() {
                    return Err(ServiceError::NotFound(id));
                }
                return Err(OrderingError::MovedItemMissing(id).into());
            }
            Err(err) => return Err(err.into()),
        };

        self.apply_order(&updates)?;
        info!(
            "event=item_reorder module=service status=ok item_id={moved_id} bucket={status} target_index={target_index} writes={}",
            updates.len()
        );
        Ok(updates)
    }

    /// Persists explicit order values, reporting the first failure.
    pub fn apply_order(&self, updates: &[OrderUpdate]) -> ServiceResult<()> {
        self.repo.apply_order(updates).map_err(|err| {
            warn!(
                "event=item_apply_order module=service status=error writes={} error={err}",
                updates.len()
            );
            ServiceError::from(err)
        })
    }
}

/// Parses caller-supplied status text into [`ItemStatus`].
pub fn parse_status(value: &str) -> ServiceResult<ItemStatus> {
    value.parse::<ItemStatus>().map_err(ServiceError::from)
}

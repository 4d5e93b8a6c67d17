//! Status transition planning.
//!
//! # Responsibility
//! - Decide which writes a status change needs, including the demotion of
//!   the previous current item.
//!
//! # Invariants
//! - A plan never leaves two items in `current`: promoting an item demotes
//!   any other current item in the same plan.
//! - The demoted item lands above every `in_progress` item that existed
//!   before the transition.
//! - `done` is terminal; `completed_at` is stamped once on entry.
//! - Planning is pure: callers supply the current item and bucket minimum.

use crate::engine::ordering::demotion_order;
use crate::model::change::{StatusChange, StatusWrites};
use crate::model::item::{Item, ItemId, ItemStatus};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Outcome of planning one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionPlan {
    /// The item already holds the target status; nothing to write.
    Unchanged,
    Write(StatusWrites),
}

impl TransitionPlan {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    pub fn demoted_item_id(&self) -> Option<ItemId> {
        match self {
            Self::Unchanged => None,
            Self::Write(writes) => writes.demotion.as_ref().map(|demotion| demotion.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The item is done and cannot move back into an open status.
    ReopenDone { id: ItemId, target: ItemStatus },
}

impl Display for TransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReopenDone { id, target } => {
                write!(f, "item {id} is done and cannot move to `{target}`")
            }
        }
    }
}

impl Error for TransitionError {}

/// Plans the writes that move `target` to `to`.
///
/// `current` is the item holding `current` right now, if any, and
/// `in_progress_min` the smallest `priority_order` in the `in_progress`
/// bucket before the transition.
pub fn plan_transition(
    target: &Item,
    current: Option<&Item>,
    in_progress_min: Option<i64>,
    to: ItemStatus,
    now_ms: i64,
) -> Result<TransitionPlan, TransitionError> {
    if target.status == to {
        return Ok(TransitionPlan::Unchanged);
    }
    if target.is_done() {
        return Err(TransitionError::ReopenDone {
            id: target.id,
            target: to,
        });
    }

    let mut change = StatusChange {
        id: target.id,
        status: to,
        priority_order: None,
        completed_at: None,
    };

    let demotion = match to {
        ItemStatus::Current => current
            .filter(|previous| previous.id != target.id)
            .map(|previous| StatusChange {
                id: previous.id,
                status: ItemStatus::InProgress,
                priority_order: Some(demotion_order(in_progress_min)),
                completed_at: None,
            }),
        ItemStatus::Done => {
            change.completed_at = Some(now_ms);
            None
        }
        ItemStatus::Waiting | ItemStatus::InProgress => None,
    };

    Ok(TransitionPlan::Write(StatusWrites { demotion, change }))
}

#[cfg(test)]
mod tests {
    use super::{plan_transition, TransitionError, TransitionPlan};
    use crate::model::change::{StatusChange, StatusWrites};
    use crate::model::item::{Item, ItemContext, ItemStatus};
    use uuid::Uuid;

    const NOW: i64 = 1_700_000_000_000;

    fn item(status: ItemStatus, order: i64) -> Item {
        Item {
            id: Uuid::new_v4(),
            ref_code: "RES-AB12C".to_string(),
            title: "row".to_string(),
            context: ItemContext::Research,
            status,
            priority_order: order,
            zone_id: None,
            notes: None,
            due_date: None,
            created_at: 0,
            updated_at: 0,
            completed_at: (status == ItemStatus::Done).then_some(1),
        }
    }

    #[test]
    fn promoting_demotes_previous_current_above_bucket_minimum() {
        let a = item(ItemStatus::Current, 5);
        let c = item(ItemStatus::InProgress, 4);

        let plan = plan_transition(&c, Some(&a), Some(3), ItemStatus::Current, NOW).unwrap();

        assert_eq!(
            plan,
            TransitionPlan::Write(StatusWrites {
                demotion: Some(StatusChange {
                    id: a.id,
                    status: ItemStatus::InProgress,
                    priority_order: Some(2),
                    completed_at: None,
                }),
                change: StatusChange {
                    id: c.id,
                    status: ItemStatus::Current,
                    priority_order: None,
                    completed_at: None,
                },
            })
        );
        assert_eq!(plan.demoted_item_id(), Some(a.id));
    }

    #[test]
    fn promoting_with_empty_in_progress_bucket_places_demoted_at_one() {
        let a = item(ItemStatus::Current, 9);
        let b = item(ItemStatus::Waiting, 2);

        let plan = plan_transition(&b, Some(&a), None, ItemStatus::Current, NOW).unwrap();
        let TransitionPlan::Write(writes) = plan else {
            panic!("expected writes");
        };
        assert_eq!(writes.demotion.unwrap().priority_order, Some(1));
    }

    #[test]
    fn promoting_without_current_item_has_no_demotion() {
        let b = item(ItemStatus::Waiting, 2);
        let plan = plan_transition(&b, None, Some(4), ItemStatus::Current, NOW).unwrap();
        assert_eq!(plan.demoted_item_id(), None);
        assert!(!plan.is_unchanged());
    }

    #[test]
    fn promoting_current_item_is_unchanged() {
        let a = item(ItemStatus::Current, 1);
        let plan = plan_transition(&a, Some(&a), Some(3), ItemStatus::Current, NOW).unwrap();
        assert!(plan.is_unchanged());
    }

    #[test]
    fn done_stamps_completion_and_is_unchanged_when_repeated() {
        let open = item(ItemStatus::InProgress, 1);
        let TransitionPlan::Write(writes) =
            plan_transition(&open, None, None, ItemStatus::Done, NOW).unwrap()
        else {
            panic!("expected writes");
        };
        assert_eq!(writes.change.completed_at, Some(NOW));
        assert_eq!(writes.change.priority_order, None);

        let done = item(ItemStatus::Done, 1);
        assert!(plan_transition(&done, None, None, ItemStatus::Done, NOW)
            .unwrap()
            .is_unchanged());
    }

    #[test]
    fn done_items_cannot_reopen() {
        let done = item(ItemStatus::Done, 1);
        for target in [
            ItemStatus::Waiting,
            ItemStatus::InProgress,
            ItemStatus::Current,
        ] {
            let err = plan_transition(&done, None, None, target, NOW).unwrap_err();
            assert_eq!(err, TransitionError::ReopenDone { id: done.id, target });
        }
    }

    #[test]
    fn open_status_changes_touch_only_the_target() {
        let current = item(ItemStatus::Current, 1);
        let waiting = item(ItemStatus::Waiting, 3);
        let plan =
            plan_transition(&waiting, Some(&current), Some(1), ItemStatus::InProgress, NOW)
                .unwrap();
        assert_eq!(
            plan,
            TransitionPlan::Write(StatusWrites {
                demotion: None,
                change: StatusChange {
                    id: waiting.id,
                    status: ItemStatus::InProgress,
                    priority_order: None,
                    completed_at: None,
                },
            })
        );
    }
}

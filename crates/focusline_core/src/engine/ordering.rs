//! Priority-order computations.
//!
//! # Responsibility
//! - Dense renumbering for manual reorders inside one status bucket.
//! - Placement values for appended and demoted items.
//! - The canonical display comparator shared by SQL listings and the cache.
//!
//! # Invariants
//! - `compute_reorder` only emits updates for items of the bucket it was given.
//! - Within a bucket, `priority_order` then `id` is a strict total order.

use crate::model::change::OrderUpdate;
use crate::model::item::{Item, ItemId, ItemStatus};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors for malformed reorder input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderingError {
    /// The moved item is not part of the bucket.
    MovedItemMissing(ItemId),
    /// The bucket mixes statuses.
    MixedBuckets {
        expected: ItemStatus,
        found: ItemStatus,
        id: ItemId,
    },
}

impl Display for OrderingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MovedItemMissing(id) => write!(f, "item {id} is not in the reordered bucket"),
            Self::MixedBuckets {
                expected,
                found,
                id,
            } => write!(
                f,
                "item {id} has status `{found}` inside a `{expected}` bucket"
            ),
        }
    }
}

impl Error for OrderingError {}

/// Order for an item appended after `max`; `1` for an empty store.
pub fn append_order(max: Option<i64>) -> i64 {
    max.map_or(1, |max| max + 1)
}

/// Order that places a demoted item above every item of its new bucket.
pub fn demotion_order(bucket_min: Option<i64>) -> i64 {
    bucket_min.map_or(1, |min| min - 1)
}

/// User-visible list order: status rank, then `priority_order`, then id.
pub fn display_cmp(a: &Item, b: &Item) -> Ordering {
    a.status
        .display_rank()
        .cmp(&b.status.display_rank())
        .then(a.priority_order.cmp(&b.priority_order))
        .then(a.id.cmp(&b.id))
}

/// Moves one item inside an ordered bucket and renumbers the bucket `1..=N`.
///
/// `target_index` is clamped into `0..=N-1`, so stale or negative indices
/// from a concurrent edit still land at an edge instead of failing.
pub fn compute_reorder(
    bucket: &[Item],
    moved_id: ItemId,
    target_index: i64,
) -> Result<Vec<OrderUpdate>, OrderingError> {
    if let Some(first) = bucket.first() {
        if let Some(stray) = bucket.iter().find(|item| item.status != first.status) {
            return Err(OrderingError::MixedBuckets {
                expected: first.status,
                found: stray.status,
                id: stray.id,
            });
        }
    }

    let mut ids: Vec<ItemId> = bucket.iter().map(|item| item.id).collect();
    let position = ids
        .iter()
        .position(|id| *id == moved_id)
        .ok_or(OrderingError::MovedItemMissing(moved_id))?;
    ids.remove(position);

    let target_index = target_index.clamp(0, ids.len() as i64) as usize;
    ids.insert(target_index, moved_id);

    Ok(ids
        .into_iter()
        .enumerate()
        .map(|(index, id)| OrderUpdate {
            id,
            priority_order: index as i64 + 1,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{append_order, compute_reorder, demotion_order, display_cmp, OrderingError};
    use crate::model::item::{Item, ItemContext, ItemStatus};
    use std::cmp::Ordering;
    use uuid::Uuid;

    fn item(status: ItemStatus, order: i64) -> Item {
        Item {
            id: Uuid::new_v4(),
            ref_code: "OBJ-AAAAA".to_string(),
            title: "row".to_string(),
            context: ItemContext::Objectives,
            status,
            priority_order: order,
            zone_id: None,
            notes: None,
            due_date: None,
            created_at: 0,
            updated_at: 0,
            completed_at: (status == ItemStatus::Done).then_some(0),
        }
    }

    fn ids_in_order(updates: &[super::OrderUpdate]) -> Vec<Uuid> {
        updates.iter().map(|update| update.id).collect()
    }

    #[test]
    fn placement_helpers_handle_empty_buckets() {
        assert_eq!(append_order(None), 1);
        assert_eq!(append_order(Some(7)), 8);
        assert_eq!(demotion_order(None), 1);
        assert_eq!(demotion_order(Some(3)), 2);
        assert_eq!(demotion_order(Some(-4)), -5);
    }

    #[test]
    fn reorder_moves_item_and_renumbers_densely() {
        let bucket: Vec<Item> = [10, 20, 30, 40]
            .into_iter()
            .map(|order| item(ItemStatus::Waiting, order))
            .collect();

        let updates = compute_reorder(&bucket, bucket[0].id, 2).unwrap();

        assert_eq!(
            ids_in_order(&updates),
            vec![bucket[1].id, bucket[2].id, bucket[0].id, bucket[3].id]
        );
        let orders: Vec<i64> = updates.iter().map(|update| update.priority_order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);
    }

    #[test]
    fn reorder_to_same_position_keeps_sequence() {
        let bucket: Vec<Item> = (1..=3).map(|order| item(ItemStatus::InProgress, order)).collect();
        let updates = compute_reorder(&bucket, bucket[1].id, 1).unwrap();
        let original: Vec<Uuid> = bucket.iter().map(|item| item.id).collect();
        assert_eq!(ids_in_order(&updates), original);
    }

    #[test]
    fn reorder_clamps_out_of_range_indices() {
        let bucket: Vec<Item> = (1..=3).map(|order| item(ItemStatus::Waiting, order)).collect();

        let to_end = compute_reorder(&bucket, bucket[0].id, 99).unwrap();
        assert_eq!(to_end.last().map(|update| update.id), Some(bucket[0].id));

        let to_start = compute_reorder(&bucket, bucket[2].id, -5).unwrap();
        assert_eq!(to_start.first().map(|update| update.id), Some(bucket[2].id));
    }

    #[test]
    fn reorder_rejects_missing_item_and_mixed_buckets() {
        let bucket = vec![item(ItemStatus::Waiting, 1), item(ItemStatus::Waiting, 2)];
        let stranger = Uuid::new_v4();
        assert_eq!(
            compute_reorder(&bucket, stranger, 0).unwrap_err(),
            OrderingError::MovedItemMissing(stranger)
        );
        assert_eq!(
            compute_reorder(&[], stranger, 0).unwrap_err(),
            OrderingError::MovedItemMissing(stranger)
        );

        let mixed = vec![item(ItemStatus::Waiting, 1), item(ItemStatus::Done, 2)];
        let err = compute_reorder(&mixed, mixed[0].id, 1).unwrap_err();
        assert!(matches!(err, OrderingError::MixedBuckets { found: ItemStatus::Done, .. }));
    }

    #[test]
    fn display_order_ranks_status_before_priority() {
        let current = item(ItemStatus::Current, 50);
        let in_progress = item(ItemStatus::InProgress, -3);
        let waiting = item(ItemStatus::Waiting, 1);
        let done = item(ItemStatus::Done, 0);

        assert_eq!(display_cmp(&current, &in_progress), Ordering::Less);
        assert_eq!(display_cmp(&in_progress, &waiting), Ordering::Less);
        assert_eq!(display_cmp(&waiting, &done), Ordering::Less);

        let mut tie_a = item(ItemStatus::Waiting, 4);
        let mut tie_b = item(ItemStatus::Waiting, 4);
        tie_a.id = Uuid::from_u128(1);
        tie_b.id = Uuid::from_u128(2);
        assert_eq!(display_cmp(&tie_a, &tie_b), Ordering::Less);
    }
}

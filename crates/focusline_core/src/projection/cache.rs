//! In-memory projection of the item store.
//!
//! # Responsibility
//! - Hold the last-known-good item set for fast reads.
//! - Accept optimistic writes ahead of persistence.
//! - Accept authoritative rows only from the latest request per item.
//!
//! # Invariants
//! - The current item is derived from the held rows, never stored apart.
//! - A full reload bumps the generation; tickets from older generations are
//!   ignored.

use crate::engine::ordering::display_cmp;
use crate::model::change::{ItemPatch, OrderUpdate, StatusWrites};
use crate::model::item::{Item, ItemId, ItemStatus};
use crate::repo::item_repo::ItemListQuery;
use std::collections::HashMap;

/// Identifies one in-flight request for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    item_id: ItemId,
    sequence: u64,
    generation: u64,
}

impl RequestTicket {
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }
}

#[derive(Debug, Default)]
pub struct ProjectionCache {
    items: HashMap<ItemId, Item>,
    latest_requests: HashMap<ItemId, u64>,
    next_sequence: u64,
    generation: u64,
}

impl ProjectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every row with an authoritative snapshot.
    pub fn replace_all(&mut self, items: Vec<Item>) {
        self.items = items.into_iter().map(|item| (item.id, item)).collect();
        self.latest_requests.clear();
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn current(&self) -> Option<&Item> {
        self.items.values().find(|item| item.is_current())
    }

    /// Number of rows holding `current`; anything above one is a projection
    /// that must not outlive its reconciliation.
    pub fn current_count(&self) -> usize {
        self.items.values().filter(|item| item.is_current()).count()
    }

    pub fn min_priority_order(&self, status: ItemStatus) -> Option<i64> {
        self.items
            .values()
            .filter(|item| item.status == status)
            .map(|item| item.priority_order)
            .min()
    }

    pub fn max_priority_order(&self) -> Option<i64> {
        self.items.values().map(|item| item.priority_order).max()
    }

    /// Rows matching `query`, in display order.
    pub fn items(&self, query: &ItemListQuery) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .items
            .values()
            .filter(|item| query.matches(item))
            .cloned()
            .collect();
        items.sort_by(display_cmp);
        items
    }

    pub fn bucket(&self, status: ItemStatus) -> Vec<Item> {
        self.items(&ItemListQuery::bucket(status))
    }

    /// Registers a new request for `item_id`, superseding earlier ones.
    pub fn begin_request(&mut self, item_id: ItemId) -> RequestTicket {
        self.next_sequence += 1;
        self.latest_requests.insert(item_id, self.next_sequence);
        RequestTicket {
            item_id,
            sequence: self.next_sequence,
            generation: self.generation,
        }
    }

    /// Items with a request that has not been reconciled yet.
    pub fn pending_requests(&self) -> usize {
        self.latest_requests.len()
    }

    pub fn is_latest(&self, ticket: &RequestTicket) -> bool {
        ticket.generation == self.generation
            && self.latest_requests.get(&ticket.item_id) == Some(&ticket.sequence)
    }

    pub fn insert(&mut self, item: Item) {
        self.items.insert(item.id, item);
    }

    pub fn apply_writes(&mut self, writes: &StatusWrites) {
        for change in writes.demotion.iter().chain(std::iter::once(&writes.change)) {
            if let Some(item) = self.items.get_mut(&change.id) {
                change.apply_to(item);
            }
        }
    }

    /// Returns `false` when the item is not held.
    pub fn apply_patch(&mut self, id: ItemId, patch: &ItemPatch) -> bool {
        match self.items.get_mut(&id) {
            Some(item) => {
                patch.apply_to(item);
                true
            }
            None => false,
        }
    }

    pub fn apply_order(&mut self, updates: &[OrderUpdate]) {
        for update in updates {
            if let Some(item) = self.items.get_mut(&update.id) {
                item.priority_order = update.priority_order;
            }
        }
    }

    /// Stores authoritative rows if `ticket` is still the latest request.
    ///
    /// Returns whether the rows were applied.
    pub fn reconcile(&mut self, ticket: &RequestTicket, rows: &[Item]) -> bool {
        if !self.is_latest(ticket) {
            return false;
        }
        for row in rows {
            self.items.insert(row.id, row.clone());
        }
        self.latest_requests.remove(&ticket.item_id);
        true
    }

    /// Order-only variant of [`ProjectionCache::reconcile`].
    pub fn reconcile_order(&mut self, ticket: &RequestTicket, updates: &[OrderUpdate]) -> bool {
        if !self.is_latest(ticket) {
            return false;
        }
        self.apply_order(updates);
        self.latest_requests.remove(&ticket.item_id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectionCache;
    use crate::model::change::{ItemPatch, OrderUpdate, StatusChange, StatusWrites};
    use crate::model::item::{Item, ItemContext, ItemStatus};
    use crate::repo::item_repo::ItemListQuery;
    use uuid::Uuid;

    fn item(status: ItemStatus, order: i64) -> Item {
        Item {
            id: Uuid::new_v4(),
            ref_code: "NED-00000".to_string(),
            title: "row".to_string(),
            context: ItemContext::Needs,
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
    fn stale_ticket_is_ignored_after_newer_request() {
        let row = item(ItemStatus::Waiting, 1);
        let mut cache = ProjectionCache::new();
        cache.replace_all(vec![row.clone()]);

        let first = cache.begin_request(row.id);
        let second = cache.begin_request(row.id);

        let mut stale = row.clone();
        stale.title = "stale".to_string();
        assert!(!cache.reconcile(&first, &[stale]));
        assert_eq!(cache.get(row.id).unwrap().title, "row");

        let mut fresh = row.clone();
        fresh.title = "fresh".to_string();
        assert!(cache.reconcile(&second, &[fresh]));
        assert_eq!(cache.get(row.id).unwrap().title, "fresh");
    }

    #[test]
    fn reload_invalidates_outstanding_tickets() {
        let row = item(ItemStatus::Waiting, 1);
        let mut cache = ProjectionCache::new();
        cache.replace_all(vec![row.clone()]);
        let ticket = cache.begin_request(row.id);

        cache.replace_all(vec![row.clone()]);
        assert!(!cache.is_latest(&ticket));
        assert!(!cache.reconcile_order(
            &ticket,
            &[OrderUpdate {
                id: row.id,
                priority_order: 9
            }]
        ));
        assert_eq!(cache.get(row.id).unwrap().priority_order, 1);
    }

    #[test]
    fn tickets_for_other_items_do_not_interfere() {
        let a = item(ItemStatus::Waiting, 1);
        let b = item(ItemStatus::Waiting, 2);
        let mut cache = ProjectionCache::new();
        cache.replace_all(vec![a.clone(), b.clone()]);

        let ticket_a = cache.begin_request(a.id);
        let _ticket_b = cache.begin_request(b.id);
        assert!(cache.is_latest(&ticket_a));
        assert_eq!(ticket_a.item_id(), a.id);
    }

    #[test]
    fn optimistic_writes_move_current_and_keep_single_current() {
        let a = item(ItemStatus::Current, 5);
        let b = item(ItemStatus::Waiting, 2);
        let mut cache = ProjectionCache::new();
        cache.replace_all(vec![a.clone(), b.clone()]);

        cache.apply_writes(&StatusWrites {
            demotion: Some(StatusChange {
                id: a.id,
                status: ItemStatus::InProgress,
                priority_order: Some(1),
                completed_at: None,
            }),
            change: StatusChange {
                id: b.id,
                status: ItemStatus::Current,
                priority_order: None,
                completed_at: None,
            },
        });

        assert_eq!(cache.current().map(|item| item.id), Some(b.id));
        assert_eq!(cache.current_count(), 1);
        assert_eq!(cache.min_priority_order(ItemStatus::InProgress), Some(1));
    }

    #[test]
    fn listing_filters_and_sorts_for_display() {
        let done = item(ItemStatus::Done, 1);
        let waiting_late = item(ItemStatus::Waiting, 7);
        let waiting_early = item(ItemStatus::Waiting, 3);
        let current = item(ItemStatus::Current, 9);
        let mut cache = ProjectionCache::new();
        cache.replace_all(vec![
            done.clone(),
            waiting_late.clone(),
            waiting_early.clone(),
            current.clone(),
        ]);

        let open: Vec<Uuid> = cache
            .items(&ItemListQuery::default())
            .iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(open, vec![current.id, waiting_early.id, waiting_late.id]);

        assert_eq!(cache.items(&ItemListQuery::all()).len(), 4);
        assert_eq!(cache.bucket(ItemStatus::Done).len(), 1);
    }

    #[test]
    fn patch_on_unknown_item_reports_miss() {
        let mut cache = ProjectionCache::new();
        let patch = ItemPatch {
            title: Some("x".to_string()),
            ..ItemPatch::default()
        };
        assert!(!cache.apply_patch(Uuid::new_v4(), &patch));
        assert!(cache.is_empty());
    }
}

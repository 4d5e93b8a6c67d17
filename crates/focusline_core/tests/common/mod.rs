//! Shared fixtures for integration tests.

#![allow(dead_code)]

use focusline_core::{
    Item, ItemDraft, ItemId, ItemListQuery, ItemPatch, ItemRepository, ItemService, ItemStatus,
    NewItem, OrderUpdate, RepoError, RepoResult, SqliteItemRepository, StatusChange,
};
use rusqlite::Connection;
use std::cell::Cell;

pub fn service(conn: &Connection) -> ItemService<SqliteItemRepository<'_>> {
    ItemService::new(SqliteItemRepository::try_new(conn).unwrap())
}

pub fn create(
    service: &ItemService<impl ItemRepository>,
    title: &str,
    context: &str,
) -> Item {
    service.create_item(&ItemDraft::new(title, context)).unwrap()
}

/// Creates an item and moves it straight into `status`.
pub fn create_in(
    service: &ItemService<impl ItemRepository>,
    title: &str,
    status: ItemStatus,
) -> Item {
    let item = create(service, title, "objectives");
    if status == ItemStatus::Waiting {
        return item;
    }
    service.transition_status(item.id, status).unwrap().item
}

pub fn status_of(service: &ItemService<impl ItemRepository>, id: ItemId) -> ItemStatus {
    service.get_item(id).unwrap().status
}

pub fn bucket_ids(service: &ItemService<impl ItemRepository>, status: ItemStatus) -> Vec<ItemId> {
    service
        .list_items(&ItemListQuery::bucket(status))
        .unwrap()
        .into_iter()
        .map(|item| item.id)
        .collect()
}

pub fn current_count(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM items WHERE status = 'current';",
        [],
        |row| row.get(0),
    )
    .unwrap()
}

/// SQLite repository that fails selected writes on demand.
///
/// Transitions and reorders go through the trait's sequential defaults, so a
/// failure after the first write leaves a partially applied change behind.
pub struct FlakyItemRepository<'conn> {
    inner: SqliteItemRepository<'conn>,
    status_writes: Cell<usize>,
    fail_status_write: Cell<Option<usize>>,
    order_writes: Cell<usize>,
    fail_order_write: Cell<Option<usize>>,
    ref_code_conflicts: Cell<usize>,
}

impl<'conn> FlakyItemRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            inner: SqliteItemRepository::try_new(conn).unwrap(),
            status_writes: Cell::new(0),
            fail_status_write: Cell::new(None),
            order_writes: Cell::new(0),
            fail_order_write: Cell::new(None),
            ref_code_conflicts: Cell::new(0),
        }
    }

    /// Fails the `nth` (1-based) status write from now on.
    pub fn fail_status_write(&self, nth: usize) {
        self.status_writes.set(0);
        self.fail_status_write.set(Some(nth));
    }

    /// Fails the `nth` (1-based) order write from now on.
    pub fn fail_order_write(&self, nth: usize) {
        self.order_writes.set(0);
        self.fail_order_write.set(Some(nth));
    }

    /// Rejects the next `count` inserts as ref-code conflicts.
    pub fn conflict_ref_codes(&self, count: usize) {
        self.ref_code_conflicts.set(count);
    }

    pub fn heal(&self) {
        self.fail_status_write.set(None);
        self.fail_order_write.set(None);
        self.ref_code_conflicts.set(0);
    }

    fn injected(counter: &Cell<usize>, fail_at: &Cell<Option<usize>>) -> RepoResult<()> {
        let count = counter.get() + 1;
        counter.set(count);
        if fail_at.get() == Some(count) {
            return Err(RepoError::InvalidData(format!(
                "injected failure on write #{count}"
            )));
        }
        Ok(())
    }
}

impl ItemRepository for FlakyItemRepository<'_> {
    fn create_item(&self, item: &NewItem) -> RepoResult<Item> {
        let conflicts = self.ref_code_conflicts.get();
        if conflicts > 0 {
            self.ref_code_conflicts.set(conflicts - 1);
            return Err(RepoError::DuplicateRefCode(item.ref_code.clone()));
        }
        self.inner.create_item(item)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        self.inner.get_item(id)
    }

    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<Item>> {
        self.inner.list_items(query)
    }

    fn find_current(&self) -> RepoResult<Option<Item>> {
        self.inner.find_current()
    }

    fn min_priority_order(&self, status: ItemStatus) -> RepoResult<Option<i64>> {
        self.inner.min_priority_order(status)
    }

    fn update_fields(&self, id: ItemId, patch: &ItemPatch) -> RepoResult<Item> {
        self.inner.update_fields(id, patch)
    }

    fn update_status(&self, change: &StatusChange) -> RepoResult<Item> {
        Self::injected(&self.status_writes, &self.fail_status_write)?;
        self.inner.update_status(change)
    }

    fn set_priority_order(&self, update: &OrderUpdate) -> RepoResult<()> {
        Self::injected(&self.order_writes, &self.fail_order_write)?;
        self.inner.set_priority_order(update)
    }
}

/// Lets tests keep a handle on the flaky repository after handing it to a
/// service or session.
impl ItemRepository for &FlakyItemRepository<'_> {
    fn create_item(&self, item: &NewItem) -> RepoResult<Item> {
        (**self).create_item(item)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        (**self).get_item(id)
    }

    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<Item>> {
        (**self).list_items(query)
    }

    fn find_current(&self) -> RepoResult<Option<Item>> {
        (**self).find_current()
    }

    fn min_priority_order(&self, status: ItemStatus) -> RepoResult<Option<i64>> {
        (**self).min_priority_order(status)
    }

    fn update_fields(&self, id: ItemId, patch: &ItemPatch) -> RepoResult<Item> {
        (**self).update_fields(id, patch)
    }

    fn update_status(&self, change: &StatusChange) -> RepoResult<Item> {
        (**self).update_status(change)
    }

    fn set_priority_order(&self, update: &OrderUpdate) -> RepoResult<()> {
        (**self).set_priority_order(update)
    }
}

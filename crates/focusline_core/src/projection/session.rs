//! Optimistic session over an item service.
//!
//! # Responsibility
//! - Apply every mutation to the projection before persisting it.
//! - Reconcile authoritative rows on success.
//! - Reload the whole projection when persistence fails.
//!
//! # Invariants
//! - Input validation runs before the projection is touched.
//! - A failed write is never left visible past the following reload.
//! - Errors are returned to the caller after recovery, never swallowed.

use crate::engine::ordering::{append_order, compute_reorder};
use crate::engine::transition::{plan_transition, TransitionPlan};
use crate::model::change::{ItemPatch, OrderUpdate};
use crate::model::item::{now_epoch_ms, Item, ItemDraft, ItemId, ItemStatus, NewItem};
use crate::projection::cache::ProjectionCache;
use crate::repo::item_repo::{ItemListQuery, ItemRepository};
use crate::service::item_service::{
    parse_status, ItemService, ServiceError, ServiceResult, TransitionOutcome,
};
use log::{error, info, warn};

/// Single-writer session: one projection, one service, sequential calls.
pub struct FocusSession<R: ItemRepository> {
    service: ItemService<R>,
    cache: ProjectionCache,
}

impl<R: ItemRepository> FocusSession<R> {
    /// Builds a session and loads the projection.
    pub fn open(service: ItemService<R>) -> ServiceResult<Self> {
        let mut session = Self {
            service,
            cache: ProjectionCache::new(),
        };
        session.reload()?;
        Ok(session)
    }

    pub fn service(&self) -> &ItemService<R> {
        &self.service
    }

    pub fn cache(&self) -> &ProjectionCache {
        &self.cache
    }

    /// Discards the projection and reads every row again.
    pub fn reload(&mut self) -> ServiceResult<()> {
        let items = self.service.list_items(&ItemListQuery::all())?;
        let count = items.len();
        self.cache.replace_all(items);
        info!(
            "event=projection_reload module=projection status=ok items={count} generation={}",
            self.cache.generation()
        );
        Ok(())
    }

    /// Projected rows matching `query`, in display order.
    pub fn items(&self, query: &ItemListQuery) -> Vec<Item> {
        self.cache.items(query)
    }

    pub fn current(&self) -> Option<&Item> {
        self.cache.current()
    }

    pub fn create_item(&mut self, draft: &ItemDraft) -> ServiceResult<Item> {
        let prepared = self.service.prepare_item(draft)?;
        let ticket = self.cache.begin_request(prepared.id);
        self.cache
            .insert(provisional_item(&prepared, self.cache.max_priority_order()));

        match self.service.insert_prepared(&prepared) {
            Ok(item) => {
                self.cache.reconcile(&ticket, std::slice::from_ref(&item));
                Ok(item)
            }
            Err(err) => Err(self.recover(err)),
        }
    }

    pub fn update_fields(&mut self, id: ItemId, patch: &ItemPatch) -> ServiceResult<Item> {
        let patch = patch.normalized()?;
        let ticket = self.cache.begin_request(id);
        self.cache.apply_patch(id, &patch);

        match self.service.update_fields(id, &patch) {
            Ok(item) => {
                self.cache.reconcile(&ticket, std::slice::from_ref(&item));
                Ok(item)
            }
            Err(err) => Err(self.recover(err)),
        }
    }

    /// Predicts the transition on the projection, then persists it.
    ///
    /// A transition the projection already knows to be invalid (reopening a
    /// done item) is rejected without touching the store. When the store
    /// demoted a different item than the projection predicted, the projection
    /// is reloaded.
    pub fn transition_status(
        &mut self,
        id: ItemId,
        target: ItemStatus,
    ) -> ServiceResult<TransitionOutcome> {
        let predicted = match self.cache.get(id) {
            Some(item) => Some(plan_transition(
                item,
                self.cache.current(),
                self.cache.min_priority_order(ItemStatus::InProgress),
                target,
                now_epoch_ms(),
            )?),
            None => None,
        };

        let ticket = self.cache.begin_request(id);
        let mut predicted_demotion = None;
        if let Some(TransitionPlan::Write(writes)) = predicted {
            predicted_demotion = writes.demotion.as_ref().map(|demotion| demotion.id);
            self.cache.apply_writes(&writes);
        }

        match self.service.transition_status(id, target) {
            Ok(outcome) => {
                let mut rows = vec![outcome.item.clone()];
                rows.extend(outcome.demoted.iter().cloned());
                self.cache.reconcile(&ticket, &rows);
                if predicted_demotion != outcome.demoted_item_id() {
                    self.resync_after_divergence(id);
                }
                Ok(outcome)
            }
            Err(err) => Err(self.recover(err)),
        }
    }

    /// [`FocusSession::transition_status`] for a status given as text.
    pub fn transition_status_named(
        &mut self,
        id: ItemId,
        status: &str,
    ) -> ServiceResult<TransitionOutcome> {
        let target = parse_status(status)?;
        self.transition_status(id, target)
    }

    /// Moves an item inside its bucket, projecting the renumbering first.
    pub fn reorder(
        &mut self,
        status: ItemStatus,
        moved_id: ItemId,
        target_index: i64,
    ) -> ServiceResult<Vec<OrderUpdate>> {
        let ticket = self.cache.begin_request(moved_id);
        // A miss here only means the projection is stale; the store decides.
        if let Ok(predicted) = compute_reorder(&self.cache.bucket(status), moved_id, target_index) {
            self.cache.apply_order(&predicted);
        }

        match self.service.reorder(status, moved_id, target_index) {
            Ok(updates) => {
                self.cache.reconcile_order(&ticket, &updates);
                Ok(updates)
            }
            Err(err) => Err(self.recover(err)),
        }
    }

    fn resync_after_divergence(&mut self, id: ItemId) {
        warn!(
            "event=projection_resync module=projection status=start reason=demotion_mismatch item_id={id}"
        );
        if let Err(reload_err) = self.reload() {
            error!(
                "event=projection_resync module=projection status=error error={reload_err}"
            );
        }
    }

    fn recover(&mut self, err: ServiceError) -> ServiceError {
        warn!("event=projection_resync module=projection status=start reason={err}");
        if let Err(reload_err) = self.reload() {
            error!(
                "event=projection_resync module=projection status=error error={reload_err}"
            );
        }
        err
    }
}

fn provisional_item(prepared: &NewItem, max_order: Option<i64>) -> Item {
    let now = now_epoch_ms();
    Item {
        id: prepared.id,
        ref_code: prepared.ref_code.clone(),
        title: prepared.title.clone(),
        context: prepared.context,
        status: ItemStatus::Waiting,
        priority_order: append_order(max_order),
        zone_id: prepared.zone_id,
        notes: prepared.notes.clone(),
        due_date: prepared.due_date.clone(),
        created_at: now,
        updated_at: now,
        completed_at: None,
    }
}

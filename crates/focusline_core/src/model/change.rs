//! Write-side value types shared by engines, repositories and the cache.
//!
//! # Invariants
//! - `ItemPatch` can only reach `title`, `notes`, `zone_id` and `due_date`.
//! - Status writes never carry field edits, and field patches never carry
//!   status.

use crate::model::item::{normalize_optional_text, Item, ItemId, ItemStatus, ItemValidationError};
use crate::model::zone::ZoneId;

/// Tri-state update for an optional field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Leave the stored value as is.
    Keep,
    Set(T),
    /// Reset to `NULL`.
    Clear,
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        Self::Keep
    }
}

impl<T: Clone> FieldUpdate<T> {
    fn apply(&self, slot: &mut Option<T>) {
        match self {
            Self::Keep => {}
            Self::Set(value) => *slot = Some(value.clone()),
            Self::Clear => *slot = None,
        }
    }
}

/// Field-update patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub notes: FieldUpdate<String>,
    pub zone_id: FieldUpdate<ZoneId>,
    pub due_date: FieldUpdate<String>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.notes == FieldUpdate::Keep
            && self.zone_id == FieldUpdate::Keep
            && self.due_date == FieldUpdate::Keep
    }

    /// Returns a trimmed copy, rejecting blank titles.
    ///
    /// Blank `Set` values for notes/due date collapse into `Clear`.
    pub fn normalized(&self) -> Result<Self, ItemValidationError> {
        let title = match self.title.as_deref() {
            None => None,
            Some(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ItemValidationError::BlankTitle);
                }
                Some(trimmed.to_string())
            }
        };

        Ok(Self {
            title,
            notes: normalize_text_update(&self.notes),
            zone_id: self.zone_id.clone(),
            due_date: normalize_text_update(&self.due_date),
        })
    }

    /// Applies the patch to an in-memory item.
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        self.notes.apply(&mut item.notes);
        self.zone_id.apply(&mut item.zone_id);
        self.due_date.apply(&mut item.due_date);
    }
}

fn normalize_text_update(update: &FieldUpdate<String>) -> FieldUpdate<String> {
    match update {
        FieldUpdate::Set(value) => match normalize_optional_text(Some(value.as_str())) {
            Some(text) => FieldUpdate::Set(text),
            None => FieldUpdate::Clear,
        },
        other => other.clone(),
    }
}

/// One status write against one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub id: ItemId,
    pub status: ItemStatus,
    /// New order, or `None` to keep the stored one.
    pub priority_order: Option<i64>,
    /// Completion stamp, or `None` to keep the stored one.
    pub completed_at: Option<i64>,
}

impl StatusChange {
    pub fn apply_to(&self, item: &mut Item) {
        item.status = self.status;
        if let Some(order) = self.priority_order {
            item.priority_order = order;
        }
        if let Some(stamp) = self.completed_at {
            item.completed_at = Some(stamp);
        }
    }
}

/// Writes making up one status transition.
///
/// When `demotion` is present it must be committed before, or atomically
/// with, `change`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusWrites {
    pub demotion: Option<StatusChange>,
    pub change: StatusChange,
}

/// New order value for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderUpdate {
    pub id: ItemId,
    pub priority_order: i64,
}

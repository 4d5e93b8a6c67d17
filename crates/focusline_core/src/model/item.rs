//! Item domain model.
//!
//! # Responsibility
//! - Define the canonical work item record and its closed enums.
//! - Validate drafts into insert-ready records before any write happens.
//!
//! # Invariants
//! - `id` is stable and never reused for another item.
//! - `context` never changes after creation; no mutation path carries it.
//! - `completed_at` is set iff `status == ItemStatus::Done`.

use crate::model::ref_code::{generate_ref_code, is_valid_ref_code};
use crate::model::zone::ZoneId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for every work item.
pub type ItemId = Uuid;

/// Fixed classification assigned to an item at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemContext {
    Objectives,
    Research,
    Needs,
    Reminders,
}

impl ItemContext {
    /// Every context, in catalog order.
    pub const ALL: [ItemContext; 4] = [
        ItemContext::Objectives,
        ItemContext::Research,
        ItemContext::Needs,
        ItemContext::Reminders,
    ];

    /// Storage/wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Objectives => "objectives",
            Self::Research => "research",
            Self::Needs => "needs",
            Self::Reminders => "reminders",
        }
    }

    /// Three-letter prefix used in generated ref codes.
    pub fn ref_prefix(self) -> &'static str {
        match self {
            Self::Objectives => "OBJ",
            Self::Research => "RES",
            Self::Needs => "NED",
            Self::Reminders => "REM",
        }
    }
}

impl Display for ItemContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemContext {
    type Err = ItemValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "objectives" => Ok(Self::Objectives),
            "research" => Ok(Self::Research),
            "needs" => Ok(Self::Needs),
            "reminders" => Ok(Self::Reminders),
            _ => Err(ItemValidationError::InvalidContext(value.to_string())),
        }
    }
}

/// Focus-state of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Queued, not started.
    Waiting,
    /// Started; ordered by `priority_order`.
    InProgress,
    /// The single item in focus.
    Current,
    /// Completed. Terminal.
    Done,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::Waiting,
        ItemStatus::InProgress,
        ItemStatus::Current,
        ItemStatus::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InProgress => "in_progress",
            Self::Current => "current",
            Self::Done => "done",
        }
    }

    /// Position of this bucket in the user-visible list.
    pub fn display_rank(self) -> u8 {
        match self {
            Self::Current => 0,
            Self::InProgress => 1,
            Self::Waiting => 2,
            Self::Done => 3,
        }
    }
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = ItemValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "waiting" => Ok(Self::Waiting),
            "in_progress" | "in-progress" => Ok(Self::InProgress),
            "current" => Ok(Self::Current),
            "done" => Ok(Self::Done),
            _ => Err(ItemValidationError::InvalidStatus(value.to_string())),
        }
    }
}

/// Validation errors for item records and drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    NilId,
    BlankTitle,
    MissingContext,
    InvalidContext(String),
    InvalidStatus(String),
    InvalidRefCode(String),
    BlankZoneName,
    CompletionMismatch {
        status: ItemStatus,
        completed_at: Option<i64>,
    },
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "item id must not be nil"),
            Self::BlankTitle => write!(f, "item title must not be blank"),
            Self::MissingContext => write!(f, "item context is required"),
            Self::InvalidContext(value) => write!(
                f,
                "invalid context `{value}`; expected objectives|research|needs|reminders"
            ),
            Self::InvalidStatus(value) => write!(
                f,
                "invalid status `{value}`; expected waiting|in_progress|current|done"
            ),
            Self::InvalidRefCode(value) => {
                write!(f, "invalid ref code `{value}`; expected AAA-XXXXX")
            }
            Self::BlankZoneName => write!(f, "zone name must not be blank"),
            Self::CompletionMismatch {
                status,
                completed_at,
            } => write!(
                f,
                "completed_at {completed_at:?} is inconsistent with status `{status}`"
            ),
        }
    }
}

impl Error for ItemValidationError {}

/// Canonical work item record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Human-readable identifier, e.g. `OBJ-7K2QD`.
    pub ref_code: String,
    pub title: String,
    pub context: ItemContext,
    pub status: ItemStatus,
    /// Relative position inside the item's status bucket.
    pub priority_order: i64,
    pub zone_id: Option<ZoneId>,
    pub notes: Option<String>,
    /// Free-form due date text; no scheduling semantics.
    pub due_date: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
    /// Unix epoch milliseconds; stamped when the item enters `done`.
    pub completed_at: Option<i64>,
}

impl Item {
    /// Checks record-level invariants.
    ///
    /// Used on every read path so corrupt persisted rows surface as errors
    /// instead of leaking into projections.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id.is_nil() {
            return Err(ItemValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(ItemValidationError::BlankTitle);
        }
        if !is_valid_ref_code(&self.ref_code) {
            return Err(ItemValidationError::InvalidRefCode(self.ref_code.clone()));
        }
        let is_done = self.status == ItemStatus::Done;
        if is_done != self.completed_at.is_some() {
            return Err(ItemValidationError::CompletionMismatch {
                status: self.status,
                completed_at: self.completed_at,
            });
        }
        Ok(())
    }

    pub fn is_current(&self) -> bool {
        self.status == ItemStatus::Current
    }

    pub fn is_done(&self) -> bool {
        self.status == ItemStatus::Done
    }
}

/// Untrusted creation input.
///
/// `context` stays textual here so that out-of-set values are rejected by
/// validation rather than by the caller's parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    pub title: String,
    pub context: Option<String>,
    pub zone_id: Option<ZoneId>,
    pub notes: Option<String>,
    pub due_date: Option<String>,
    /// Caller-supplied ref code; generated when absent.
    pub ref_code: Option<String>,
}

impl ItemDraft {
    pub fn new(title: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            context: Some(context.into()),
            ..Self::default()
        }
    }
}

/// Validated, insert-ready item.
///
/// Status, order and timestamps are assigned by the store at insert time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub id: ItemId,
    pub ref_code: String,
    pub title: String,
    pub context: ItemContext,
    pub zone_id: Option<ZoneId>,
    pub notes: Option<String>,
    pub due_date: Option<String>,
    /// `false` when the caller supplied `ref_code`.
    pub generated_ref_code: bool,
}

impl NewItem {
    /// Validates a draft and fills generated fields.
    ///
    /// # Errors
    /// - `BlankTitle` when the trimmed title is empty.
    /// - `MissingContext` / `InvalidContext` for absent or unknown contexts.
    /// - `InvalidRefCode` when a supplied ref code is malformed.
    pub fn from_draft(draft: &ItemDraft) -> Result<Self, ItemValidationError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(ItemValidationError::BlankTitle);
        }

        let context = match draft.context.as_deref() {
            None => return Err(ItemValidationError::MissingContext),
            Some(value) => value.parse::<ItemContext>()?,
        };

        let (ref_code, generated_ref_code) = match draft.ref_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                if !is_valid_ref_code(code) {
                    return Err(ItemValidationError::InvalidRefCode(code.to_string()));
                }
                (code.to_string(), false)
            }
            _ => (generate_ref_code(Some(context)), true),
        };

        Ok(Self {
            id: Uuid::new_v4(),
            ref_code,
            title: title.to_string(),
            context,
            zone_id: draft.zone_id,
            notes: normalize_optional_text(draft.notes.as_deref()),
            due_date: normalize_optional_text(draft.due_date.as_deref()),
            generated_ref_code,
        })
    }

    /// Draws a fresh ref code. Caller-supplied codes are kept.
    pub fn regenerate_ref_code(&mut self) {
        if self.generated_ref_code {
            self.ref_code = generate_ref_code(Some(self.context));
        }
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

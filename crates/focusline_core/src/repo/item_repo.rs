//! Item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Translate create, field-update, status-update and reorder operations
//!   into SQL against the `items` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Read paths run `Item::validate()` and reject invalid persisted state.
//! - A transition's demotion write is committed before, or atomically with,
//!   its promotion write.
//! - List order is `status rank, priority_order ASC, item_uuid ASC`.

use crate::db::DbError;
use crate::engine::ordering::append_order;
use crate::model::change::{ItemPatch, OrderUpdate, StatusChange, StatusWrites};
use crate::model::item::{
    now_epoch_ms, Item, ItemContext, ItemId, ItemStatus, ItemValidationError, NewItem,
};
use crate::model::zone::ZoneId;
use crate::repo::schema::ensure_connection_ready;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    item_uuid,
    ref_code,
    title,
    context,
    status,
    priority_order,
    zone_uuid,
    notes,
    due_date,
    created_at,
    updated_at,
    completed_at
FROM items";

const ITEM_ORDER_SQL: &str = " ORDER BY
    CASE status
        WHEN 'current' THEN 0
        WHEN 'in_progress' THEN 1
        WHEN 'waiting' THEN 2
        ELSE 3
    END ASC,
    priority_order ASC,
    item_uuid ASC";

const ITEM_COLUMNS: &[&str] = &[
    "item_uuid",
    "ref_code",
    "title",
    "context",
    "status",
    "priority_order",
    "zone_uuid",
    "notes",
    "due_date",
    "created_at",
    "updated_at",
    "completed_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for item and zone persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ItemValidationError),
    Db(DbError),
    NotFound(ItemId),
    ZoneNotFound(ZoneId),
    /// Another item already holds this ref code.
    DuplicateRefCode(String),
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// The demotion write committed but the promotion write failed.
    PartialTransition {
        demoted_id: ItemId,
        target_id: ItemId,
        source: Box<RepoError>,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::ZoneNotFound(id) => write!(f, "zone not found: {id}"),
            Self::DuplicateRefCode(code) => write!(f, "ref code already in use: {code}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::PartialTransition {
                demoted_id,
                target_id,
                source,
            } => write!(
                f,
                "demoted {demoted_id} but failed to promote {target_id}: {source}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::PartialTransition { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read filter for item listings.
///
/// `include_done` only applies when `status` is `None`; an explicit status
/// always selects exactly that bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemListQuery {
    pub include_done: bool,
    pub zone_id: Option<ZoneId>,
    /// Empty means every context.
    pub contexts: Vec<ItemContext>,
    pub status: Option<ItemStatus>,
}

impl ItemListQuery {
    /// Every item, done included.
    pub fn all() -> Self {
        Self {
            include_done: true,
            ..Self::default()
        }
    }

    /// Exactly one status bucket.
    pub fn bucket(status: ItemStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        match self.status {
            Some(status) if item.status != status => return false,
            None if !self.include_done && item.is_done() => return false,
            _ => {}
        }
        if let Some(zone_id) = self.zone_id {
            if item.zone_id != Some(zone_id) {
                return false;
            }
        }
        self.contexts.is_empty() || self.contexts.contains(&item.context)
    }
}

/// Rows written by one applied transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTransition {
    pub item: Item,
    pub demoted: Option<Item>,
}

/// Repository interface for item persistence.
pub trait ItemRepository {
    /// Inserts a validated item in `waiting`, appended after every other item.
    fn create_item(&self, item: &NewItem) -> RepoResult<Item>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<Item>>;
    /// Derived lookup of the item holding `current`.
    fn find_current(&self) -> RepoResult<Option<Item>>;
    /// Smallest `priority_order` in one status bucket.
    fn min_priority_order(&self, status: ItemStatus) -> RepoResult<Option<i64>>;
    fn update_fields(&self, id: ItemId, patch: &ItemPatch) -> RepoResult<Item>;
    fn update_status(&self, change: &StatusChange) -> RepoResult<Item>;
    fn set_priority_order(&self, update: &OrderUpdate) -> RepoResult<()>;

    /// Persists a transition.
    ///
    /// The default runs the demotion, then the promotion. A promotion failure
    /// after a committed demotion is reported as `PartialTransition`, never
    /// as success. Transactional stores override this.
    fn apply_transition(&self, writes: &StatusWrites) -> RepoResult<AppliedTransition> {
        let demoted = match &writes.demotion {
            Some(demotion) => Some(self.update_status(demotion)?),
            None => None,
        };

        match self.update_status(&writes.change) {
            Ok(item) => Ok(AppliedTransition { item, demoted }),
            Err(err) => match demoted {
                Some(demoted) => Err(RepoError::PartialTransition {
                    demoted_id: demoted.id,
                    target_id: writes.change.id,
                    source: Box::new(err),
                }),
                None => Err(err),
            },
        }
    }

    /// Applies order updates, stopping at the first failure.
    ///
    /// The default issues independent writes; earlier updates stay applied
    /// when a later one fails.
    fn apply_order(&self, updates: &[OrderUpdate]) -> RepoResult<()> {
        for update in updates {
            self.set_priority_order(update)?;
        }
        Ok(())
    }
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Creates a repository over a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "items", ITEM_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(&self, item: &NewItem) -> RepoResult<Item> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let max_order: Option<i64> =
            tx.query_row("SELECT MAX(priority_order) FROM items;", [], |row| row.get(0))?;
        let now = now_epoch_ms();

        tx.execute(
            "INSERT INTO items (
                item_uuid,
                ref_code,
                title,
                context,
                status,
                priority_order,
                zone_uuid,
                notes,
                due_date,
                created_at,
                updated_at,
                completed_at
            ) VALUES (?1, ?2, ?3, ?4, 'waiting', ?5, ?6, ?7, ?8, ?9, ?9, NULL);",
            params![
                item.id.to_string(),
                item.ref_code.as_str(),
                item.title.as_str(),
                item.context.as_str(),
                append_order(max_order),
                item.zone_id.map(|value| value.to_string()),
                item.notes.as_deref(),
                item.due_date.as_deref(),
                now,
            ],
        )
        .map_err(|err| {
            if is_ref_code_conflict(&err) {
                RepoError::DuplicateRefCode(item.ref_code.clone())
            } else {
                RepoError::from(err)
            }
        })?;

        let created = load_required_item(&tx, item.id)?;
        tx.commit()?;
        Ok(created)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        load_item(self.conn, id)
    }

    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<Item>> {
        let mut sql = format!("{ITEM_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        match query.status {
            Some(status) => {
                sql.push_str(" AND status = ?");
                bind_values.push(Value::Text(status.as_str().to_string()));
            }
            None if !query.include_done => sql.push_str(" AND status <> 'done'"),
            None => {}
        }

        if let Some(zone_id) = query.zone_id {
            sql.push_str(" AND zone_uuid = ?");
            bind_values.push(Value::Text(zone_id.to_string()));
        }

        if !query.contexts.is_empty() {
            let placeholders = vec!["?"; query.contexts.len()].join(", ");
            sql.push_str(&format!(" AND context IN ({placeholders})"));
            bind_values.extend(
                query
                    .contexts
                    .iter()
                    .map(|context| Value::Text(context.as_str().to_string())),
            );
        }

        sql.push_str(ITEM_ORDER_SQL);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn find_current(&self) -> RepoResult<Option<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ITEM_SELECT_SQL}
             WHERE status = 'current'
             ORDER BY item_uuid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let current = parse_item_row(row)?;
        if rows.next()?.is_some() {
            return Err(RepoError::InvalidData(
                "more than one item holds status `current`".to_string(),
            ));
        }
        Ok(Some(current))
    }

    fn min_priority_order(&self, status: ItemStatus) -> RepoResult<Option<i64>> {
        let min = self.conn.query_row(
            "SELECT MIN(priority_order) FROM items WHERE status = ?1;",
            [status.as_str()],
            |row| row.get(0),
        )?;
        Ok(min)
    }

    fn update_fields(&self, id: ItemId, patch: &ItemPatch) -> RepoResult<Item> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut item = load_item(&tx, id)?.ok_or(RepoError::NotFound(id))?;
        patch.apply_to(&mut item);
        item.validate()?;

        tx.execute(
            "UPDATE items
             SET
                title = ?2,
                notes = ?3,
                zone_uuid = ?4,
                due_date = ?5,
                updated_at = ?6
             WHERE item_uuid = ?1;",
            params![
                id.to_string(),
                item.title.as_str(),
                item.notes.as_deref(),
                item.zone_id.map(|value| value.to_string()),
                item.due_date.as_deref(),
                now_epoch_ms(),
            ],
        )?;

        let updated = load_required_item(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn update_status(&self, change: &StatusChange) -> RepoResult<Item> {
        write_status(self.conn, change)?;
        load_required_item(self.conn, change.id)
    }

    fn set_priority_order(&self, update: &OrderUpdate) -> RepoResult<()> {
        write_order(self.conn, update)
    }

    fn apply_transition(&self, writes: &StatusWrites) -> RepoResult<AppliedTransition> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let demoted_id = match &writes.demotion {
            Some(demotion) => {
                write_status(&tx, demotion)?;
                Some(demotion.id)
            }
            None => None,
        };
        write_status(&tx, &writes.change)?;

        let item = load_required_item(&tx, writes.change.id)?;
        let demoted = demoted_id
            .map(|id| load_required_item(&tx, id))
            .transpose()?;
        tx.commit()?;

        Ok(AppliedTransition { item, demoted })
    }

    fn apply_order(&self, updates: &[OrderUpdate]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for update in updates {
            write_order(&tx, update)?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn write_status(conn: &Connection, change: &StatusChange) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE items
         SET
            status = ?2,
            priority_order = COALESCE(?3, priority_order),
            completed_at = COALESCE(?4, completed_at),
            updated_at = ?5
         WHERE item_uuid = ?1;",
        params![
            change.id.to_string(),
            change.status.as_str(),
            change.priority_order,
            change.completed_at,
            now_epoch_ms(),
        ],
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound(change.id));
    }
    Ok(())
}

fn is_ref_code_conflict(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, Some(message)) => {
            failure.code == ErrorCode::ConstraintViolation && message.contains("items.ref_code")
        }
        _ => false,
    }
}

fn write_order(conn: &Connection, update: &OrderUpdate) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE items
         SET
            priority_order = ?2,
            updated_at = ?3
         WHERE item_uuid = ?1;",
        params![update.id.to_string(), update.priority_order, now_epoch_ms()],
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound(update.id));
    }
    Ok(())
}

fn load_item(conn: &Connection, id: ItemId) -> RepoResult<Option<Item>> {
    let mut stmt = conn.prepare(&format!("{ITEM_SELECT_SQL} WHERE item_uuid = ?1;"))?;
    let parsed = stmt
        .query_row([id.to_string()], |row| Ok(parse_item_row(row)))
        .optional()?;
    parsed.transpose()
}

fn load_required_item(conn: &Connection, id: ItemId) -> RepoResult<Item> {
    load_item(conn, id)?.ok_or(RepoError::NotFound(id))
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let id = parse_uuid(&row.get::<_, String>("item_uuid")?, "items.item_uuid")?;
    let zone_id = row
        .get::<_, Option<String>>("zone_uuid")?
        .map(|value| parse_uuid(&value, "items.zone_uuid"))
        .transpose()?;

    let context_text: String = row.get("context")?;
    let context = context_text.parse::<ItemContext>().map_err(|_| {
        RepoError::InvalidData(format!("invalid context `{context_text}` in items.context"))
    })?;

    let status_text: String = row.get("status")?;
    let status = status_text.parse::<ItemStatus>().map_err(|_| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in items.status"))
    })?;

    let item = Item {
        id,
        ref_code: row.get("ref_code")?,
        title: row.get("title")?,
        context,
        status,
        priority_order: row.get("priority_order")?,
        zone_id,
        notes: row.get("notes")?,
        due_date: row.get("due_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        completed_at: row.get("completed_at")?,
    };
    item.validate()?;
    Ok(item)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

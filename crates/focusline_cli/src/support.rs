use focusline_core::db::open_db;
use focusline_core::{
    default_log_level, init_logging as core_init_logging, Item, ItemId, ItemListQuery,
    ItemService, SqliteItemRepository, ZoneId,
};
use rusqlite::Connection;
use uuid::Uuid;

pub fn init_logging(level: Option<&str>, log_dir: Option<&str>) {
    let Some(log_dir) = log_dir else {
        return;
    };
    let level = level.unwrap_or_else(|| default_log_level());
    if let Err(err) = core_init_logging(level, log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }
}

pub fn open(db: &str) -> Result<Connection, String> {
    open_db(db).map_err(|e| format!("failed to open {db}: {e}"))
}

pub fn item_service(conn: &Connection) -> Result<ItemService<SqliteItemRepository<'_>>, String> {
    let repo = SqliteItemRepository::try_new(conn).map_err(|e| e.to_string())?;
    Ok(ItemService::new(repo))
}

/// Resolves a UUID or a ref code (case-insensitive) to an item id.
pub fn resolve_item(conn: &Connection, reference: &str) -> Result<ItemId, String> {
    let reference = reference.trim();
    if let Ok(id) = Uuid::parse_str(reference) {
        return Ok(id);
    }

    let wanted = reference.to_ascii_uppercase();
    let items = item_service(conn)?
        .list_items(&ItemListQuery::all())
        .map_err(|e| e.to_string())?;
    items
        .into_iter()
        .find(|item| item.ref_code == wanted)
        .map(|item| item.id)
        .ok_or_else(|| format!("item not found: {reference}"))
}

pub fn parse_zone_id(value: &str) -> Result<ZoneId, String> {
    Uuid::parse_str(value.trim()).map_err(|_| format!("invalid zone id `{value}`"))
}

pub fn item_line(item: &Item) -> String {
    let marker = if item.is_current() { "*" } else { " " };
    format!(
        "{marker} {}  {:<11}  {:>4}  {:<10}  {}",
        item.ref_code, item.status, item.priority_order, item.context, item.title
    )
}

pub fn print_item_detail(item: &Item) {
    println!("id: {}", item.id);
    println!("ref: {}", item.ref_code);
    println!("title: {}", item.title);
    println!("context: {}", item.context);
    println!("status: {}", item.status);
    println!("priority_order: {}", item.priority_order);
    println!(
        "zone: {}",
        item.zone_id
            .map_or_else(|| "(none)".to_string(), |id| id.to_string())
    );
    println!("due: {}", item.due_date.as_deref().unwrap_or("(none)"));
    println!("notes: {}", item.notes.as_deref().unwrap_or("(none)"));
    if let Some(completed_at) = item.completed_at {
        println!("completed_at: {completed_at}");
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|e| format!("failed to render json: {e}"))?;
    println!("{rendered}");
    Ok(())
}

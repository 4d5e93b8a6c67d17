use crate::support::{
    item_line, item_service, open, parse_zone_id, print_item_detail, print_json, resolve_item,
};
use focusline_core::{
    parse_status, FieldUpdate, FocusSession, ItemContext, ItemDraft, ItemListQuery, ItemPatch,
};
use log::info;

pub struct AddArgs {
    pub title: String,
    pub context: String,
    pub zone: Option<String>,
    pub notes: Option<String>,
    pub due: Option<String>,
    pub ref_code: Option<String>,
}

pub struct EditArgs {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub clear_notes: bool,
    pub zone: Option<String>,
    pub clear_zone: bool,
    pub due: Option<String>,
    pub clear_due: bool,
}

pub fn add(db: &str, args: AddArgs, json: bool) -> Result<(), String> {
    let conn = open(db)?;
    let zone_id = args.zone.as_deref().map(parse_zone_id).transpose()?;
    let draft = ItemDraft {
        title: args.title,
        context: Some(args.context),
        zone_id,
        notes: args.notes,
        due_date: args.due,
        ref_code: args.ref_code,
    };

    let mut session = FocusSession::open(item_service(&conn)?).map_err(|e| e.to_string())?;
    let item = session.create_item(&draft).map_err(|e| e.to_string())?;
    info!(
        "event=cli_command module=cli status=ok command=add item_id={}",
        item.id
    );

    if json {
        return print_json(&item);
    }
    println!("created {} ({})", item.ref_code, item.id);
    Ok(())
}

pub fn list(
    db: &str,
    status: Option<String>,
    contexts: Vec<String>,
    zone: Option<String>,
    all: bool,
    json: bool,
) -> Result<(), String> {
    let status = status
        .as_deref()
        .map(parse_status)
        .transpose()
        .map_err(|e| e.to_string())?;
    let contexts = contexts
        .iter()
        .map(|value| value.parse::<ItemContext>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;
    let zone_id = zone.as_deref().map(parse_zone_id).transpose()?;

    let query = ItemListQuery {
        include_done: all,
        zone_id,
        contexts,
        status,
    };

    let conn = open(db)?;
    let items = item_service(&conn)?
        .list_items(&query)
        .map_err(|e| e.to_string())?;

    if json {
        return print_json(&items);
    }
    if items.is_empty() {
        println!("no items");
        return Ok(());
    }
    for item in &items {
        println!("{}", item_line(item));
    }
    Ok(())
}

pub fn show(db: &str, reference: &str, json: bool) -> Result<(), String> {
    let conn = open(db)?;
    let id = resolve_item(&conn, reference)?;
    let item = item_service(&conn)?
        .get_item(id)
        .map_err(|e| e.to_string())?;

    if json {
        return print_json(&item);
    }
    print_item_detail(&item);
    Ok(())
}

pub fn set_status(db: &str, reference: &str, status: &str) -> Result<(), String> {
    let target = parse_status(status).map_err(|e| e.to_string())?;
    let conn = open(db)?;
    let id = resolve_item(&conn, reference)?;

    let mut session = FocusSession::open(item_service(&conn)?).map_err(|e| e.to_string())?;
    let outcome = session
        .transition_status(id, target)
        .map_err(|e| e.to_string())?;
    info!("event=cli_command module=cli status=ok command=status item_id={id} to={target}");

    println!("{} -> {}", outcome.item.ref_code, outcome.item.status);
    if let Some(demoted) = &outcome.demoted {
        println!(
            "{} -> {} (priority_order {})",
            demoted.ref_code, demoted.status, demoted.priority_order
        );
    }
    Ok(())
}

pub fn move_item(db: &str, reference: &str, index: i64) -> Result<(), String> {
    let conn = open(db)?;
    let id = resolve_item(&conn, reference)?;

    let mut session = FocusSession::open(item_service(&conn)?).map_err(|e| e.to_string())?;
    let status = session
        .service()
        .get_item(id)
        .map_err(|e| e.to_string())?
        .status;
    let updates = session
        .reorder(status, id, index)
        .map_err(|e| e.to_string())?;
    info!(
        "event=cli_command module=cli status=ok command=move item_id={id} writes={}",
        updates.len()
    );

    for item in session.items(&ItemListQuery::bucket(status)) {
        println!("{}", item_line(&item));
    }
    Ok(())
}

pub fn edit(db: &str, reference: &str, args: EditArgs) -> Result<(), String> {
    let zone_id = args.zone.as_deref().map(parse_zone_id).transpose()?;
    let patch = ItemPatch {
        title: args.title,
        notes: field_update(args.notes, args.clear_notes),
        zone_id: field_update(zone_id, args.clear_zone),
        due_date: field_update(args.due, args.clear_due),
    };
    if patch.is_empty() {
        return Err("no update fields provided".to_string());
    }

    let conn = open(db)?;
    let id = resolve_item(&conn, reference)?;
    let mut session = FocusSession::open(item_service(&conn)?).map_err(|e| e.to_string())?;
    let item = session
        .update_fields(id, &patch)
        .map_err(|e| e.to_string())?;
    info!("event=cli_command module=cli status=ok command=edit item_id={id}");

    print_item_detail(&item);
    Ok(())
}

fn field_update<T>(value: Option<T>, clear: bool) -> FieldUpdate<T> {
    match (value, clear) {
        (_, true) => FieldUpdate::Clear,
        (Some(value), false) => FieldUpdate::Set(value),
        (None, false) => FieldUpdate::Keep,
    }
}

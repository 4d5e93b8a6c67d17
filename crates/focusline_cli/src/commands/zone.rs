use crate::support::{open, parse_zone_id, print_json};
use focusline_core::{SqliteZoneRepository, ZoneService};
use log::info;
use rusqlite::Connection;

fn zone_service(conn: &Connection) -> Result<ZoneService<SqliteZoneRepository<'_>>, String> {
    let repo = SqliteZoneRepository::try_new(conn).map_err(|e| e.to_string())?;
    Ok(ZoneService::new(repo))
}

pub fn add(db: &str, name: &str) -> Result<(), String> {
    let conn = open(db)?;
    let zone = zone_service(&conn)?
        .create_zone(name)
        .map_err(|e| e.to_string())?;
    info!(
        "event=cli_command module=cli status=ok command=zone_add zone_id={}",
        zone.id
    );
    println!("created zone {} ({})", zone.name, zone.id);
    Ok(())
}

pub fn list(db: &str, json: bool) -> Result<(), String> {
    let conn = open(db)?;
    let zones = zone_service(&conn)?
        .list_zones()
        .map_err(|e| e.to_string())?;

    if json {
        return print_json(&zones);
    }
    if zones.is_empty() {
        println!("no zones");
        return Ok(());
    }
    for zone in &zones {
        println!("{}  {}", zone.id, zone.name);
    }
    Ok(())
}

pub fn delete(db: &str, zone: &str) -> Result<(), String> {
    let id = parse_zone_id(zone)?;
    let conn = open(db)?;
    zone_service(&conn)?
        .delete_zone(id)
        .map_err(|e| e.to_string())?;
    info!("event=cli_command module=cli status=ok command=zone_delete zone_id={id}");
    println!("deleted zone {id}");
    Ok(())
}

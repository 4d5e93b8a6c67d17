//! Zone repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Zones are listed by `name ASC, zone_uuid ASC`.
//! - Deleting a zone clears `items.zone_uuid` on referencing items through
//!   `ON DELETE SET NULL`; items are never removed.

use crate::model::item::now_epoch_ms;
use crate::model::zone::{Zone, ZoneId};
use crate::repo::item_repo::{parse_uuid, RepoError, RepoResult};
use crate::repo::schema::ensure_connection_ready;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

pub trait ZoneRepository {
    fn create_zone(&self, name: &str) -> RepoResult<Zone>;
    fn list_zones(&self) -> RepoResult<Vec<Zone>>;
    fn delete_zone(&self, id: ZoneId) -> RepoResult<()>;
}

pub struct SqliteZoneRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteZoneRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "zones", &["zone_uuid", "name", "created_at"])?;
        Ok(Self { conn })
    }
}

impl ZoneRepository for SqliteZoneRepository<'_> {
    fn create_zone(&self, name: &str) -> RepoResult<Zone> {
        let zone = Zone {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now_epoch_ms(),
        };
        self.conn.execute(
            "INSERT INTO zones (zone_uuid, name, created_at) VALUES (?1, ?2, ?3);",
            params![zone.id.to_string(), zone.name.as_str(), zone.created_at],
        )?;
        Ok(zone)
    }

    fn list_zones(&self) -> RepoResult<Vec<Zone>> {
        let mut stmt = self.conn.prepare(
            "SELECT zone_uuid, name, created_at
             FROM zones
             ORDER BY name ASC, zone_uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut zones = Vec::new();
        while let Some(row) = rows.next()? {
            zones.push(parse_zone_row(row)?);
        }
        Ok(zones)
    }

    fn delete_zone(&self, id: ZoneId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM zones WHERE zone_uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::ZoneNotFound(id));
        }
        Ok(())
    }
}

fn parse_zone_row(row: &Row<'_>) -> RepoResult<Zone> {
    Ok(Zone {
        id: parse_uuid(&row.get::<_, String>("zone_uuid")?, "zones.zone_uuid")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
    })
}

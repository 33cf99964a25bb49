//! Map document repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Stored `map_data` always passes `MapData::validate` and carries its id.
//! - At most one row has `is_active = 1` (partial unique index); switching
//!   the active map happens in one IMMEDIATE transaction.

use super::{bool_to_int, ensure_schema_ready, now_epoch_ms, RepoError, RepoResult};
use crate::model::map::{MapData, MapDataError, MapRecord};
use crate::model::plot::MapId;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MAP_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    map_data,
    is_active,
    created_at,
    updated_at
FROM community_maps";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[(
    "community_maps",
    &["id", "name", "description", "map_data", "is_active"],
)];

pub type MapRepoResult<T> = Result<T, MapRepoError>;

#[derive(Debug)]
pub enum MapRepoError {
    NotFound(MapId),
    /// The active map cannot be deleted.
    MapActive(MapId),
    /// Plot rows still reference the map.
    MapReferenced(MapId),
    InvalidDocument(MapDataError),
    Repo(RepoError),
}

impl Display for MapRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "map not found: {id}"),
            Self::MapActive(id) => write!(f, "map `{id}` is active and cannot be deleted"),
            Self::MapReferenced(id) => write!(f, "map `{id}` still has plot records"),
            Self::InvalidDocument(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MapRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDocument(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MapRepoError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for MapRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

impl From<MapDataError> for MapRepoError {
    fn from(value: MapDataError) -> Self {
        Self::InvalidDocument(value)
    }
}

/// Repository interface for stored map documents.
pub trait MapRepository {
    /// Inserts a new document (no id, or unknown id) or replaces an existing one.
    fn save_map(&self, map: &MapData) -> MapRepoResult<MapRecord>;
    fn get_map(&self, map_id: MapId) -> MapRepoResult<Option<MapRecord>>;
    /// Most recently updated first.
    fn list_maps(&self) -> MapRepoResult<Vec<MapRecord>>;
    fn active_map(&self) -> MapRepoResult<Option<MapRecord>>;
    fn set_active(&self, map_id: MapId) -> MapRepoResult<()>;
    fn delete_map(&self, map_id: MapId) -> MapRepoResult<()>;
}

/// SQLite-backed map store.
pub struct SqliteMapRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMapRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl MapRepository for SqliteMapRepository<'_> {
    fn save_map(&self, map: &MapData) -> MapRepoResult<MapRecord> {
        map.validate()?;
        let id = map.id.unwrap_or_else(Uuid::new_v4);
        let mut stored = map.clone();
        stored.id = Some(id);
        let document = stored.to_json()?;
        let now = now_epoch_ms();

        self.conn.execute(
            "INSERT INTO community_maps (id, name, description, map_data, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                map_data = excluded.map_data,
                updated_at = excluded.updated_at;",
            params![id.to_string(), stored.name, stored.description, document, now],
        )?;

        self.get_map(id)?.ok_or(MapRepoError::NotFound(id))
    }

    fn get_map(&self, map_id: MapId) -> MapRepoResult<Option<MapRecord>> {
        Ok(load_map(self.conn, map_id)?)
    }

    fn list_maps(&self) -> MapRepoResult<Vec<MapRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MAP_SELECT_SQL} ORDER BY updated_at DESC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut maps = Vec::new();
        while let Some(row) = rows.next()? {
            maps.push(parse_map_row(row)?);
        }
        Ok(maps)
    }

    fn active_map(&self) -> MapRepoResult<Option<MapRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MAP_SELECT_SQL} WHERE is_active = 1;"))?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_map_row(row)?));
        }
        Ok(None)
    }

    fn set_active(&self, map_id: MapId) -> MapRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !map_exists(&tx, &map_id.to_string())? {
            return Err(MapRepoError::NotFound(map_id));
        }
        switch_active(&tx, map_id)?;
        tx.commit()?;
        info!("event=map_activate module=repo status=ok map_id={map_id}");
        Ok(())
    }

    fn delete_map(&self, map_id: MapId) -> MapRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let id_text = map_id.to_string();
        let is_active: Option<i64> = tx
            .query_row(
                "SELECT is_active FROM community_maps WHERE id = ?1;",
                [&id_text],
                |row| row.get(0),
            )
            .optional()?;
        match is_active {
            None => return Err(MapRepoError::NotFound(map_id)),
            Some(1) => return Err(MapRepoError::MapActive(map_id)),
            Some(_) => {}
        }

        let referenced: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM plots WHERE map_id = ?1);",
            [&id_text],
            |row| row.get(0),
        )?;
        if referenced == 1 {
            return Err(MapRepoError::MapReferenced(map_id));
        }

        tx.execute("DELETE FROM community_maps WHERE id = ?1;", [&id_text])?;
        tx.commit()?;
        info!("event=map_delete module=repo status=ok map_id={map_id}");
        Ok(())
    }
}

/// Loads one map row. `conn` may be an open transaction.
pub(crate) fn load_map(conn: &Connection, map_id: MapId) -> RepoResult<Option<MapRecord>> {
    let mut stmt = conn.prepare(&format!("{MAP_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([map_id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_map_row(row)?));
    }
    Ok(None)
}

/// Makes `map_id` the only active row. Callers own the transaction.
pub(crate) fn switch_active(conn: &Connection, map_id: MapId) -> RepoResult<()> {
    let id_text = map_id.to_string();
    conn.execute(
        "UPDATE community_maps SET is_active = 0 WHERE is_active = 1 AND id <> ?1;",
        [&id_text],
    )?;
    conn.execute(
        "UPDATE community_maps SET is_active = ?1 WHERE id = ?2;",
        params![bool_to_int(true), id_text],
    )?;
    Ok(())
}

fn map_exists(conn: &Connection, id: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM community_maps WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_map_row(row: &Row<'_>) -> RepoResult<MapRecord> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in community_maps.id"))
    })?;

    let document: String = row.get("map_data")?;
    let map_data = MapData::from_json(&document).map_err(|err| {
        RepoError::InvalidData(format!("invalid map document for `{id}`: {err}"))
    })?;

    let is_active = match row.get::<_, i64>("is_active")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_active value `{other}` in community_maps.is_active"
            )));
        }
    };

    Ok(MapRecord {
        id,
        name: row.get("name")?,
        description: row.get("description")?,
        map_data,
        is_active,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

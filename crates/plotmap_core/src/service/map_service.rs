//! Map document use-case service.
//!
//! # Responsibility
//! - Save, load, list and delete stored map documents.
//! - Track which map is active.
//!
//! # Invariants
//! - Every stored document passed `MapData::validate` before it was written.
//! - The active map cannot be deleted.

use crate::model::map::{MapData, MapDataError, MapRecord};
use crate::model::plot::MapId;
use crate::repo::map_repo::{MapRepoError, MapRepository};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for map document use-cases.
#[derive(Debug)]
pub enum MapServiceError {
    MapNotFound(MapId),
    MapActive(MapId),
    MapReferenced(MapId),
    /// Document failed structural validation.
    InvalidDocument(MapDataError),
    StorageUnavailable(RepoError),
    Repo(RepoError),
}

impl Display for MapServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MapNotFound(id) => write!(f, "map not found: {id}"),
            Self::MapActive(id) => write!(f, "map `{id}` is active and cannot be deleted"),
            Self::MapReferenced(id) => write!(f, "map `{id}` still has plot records"),
            Self::InvalidDocument(err) => write!(f, "invalid map document: {err}"),
            Self::StorageUnavailable(err) => write!(f, "storage busy, retry later: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MapServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDocument(err) => Some(err),
            Self::StorageUnavailable(err) | Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MapServiceError {
    fn from(value: RepoError) -> Self {
        if value.is_busy() {
            Self::StorageUnavailable(value)
        } else {
            Self::Repo(value)
        }
    }
}

impl From<MapRepoError> for MapServiceError {
    fn from(value: MapRepoError) -> Self {
        match value {
            MapRepoError::NotFound(id) => Self::MapNotFound(id),
            MapRepoError::MapActive(id) => Self::MapActive(id),
            MapRepoError::MapReferenced(id) => Self::MapReferenced(id),
            MapRepoError::InvalidDocument(err) => Self::InvalidDocument(err),
            MapRepoError::Repo(err) => err.into(),
        }
    }
}

impl From<MapDataError> for MapServiceError {
    fn from(value: MapDataError) -> Self {
        Self::InvalidDocument(value)
    }
}

pub type MapServiceResult<T> = Result<T, MapServiceError>;

/// Use-case facade for stored map documents.
pub struct MapService<R: MapRepository> {
    repo: R,
}

impl<R: MapRepository> MapService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stores a document, assigning an id on first save.
    pub fn save_map(&self, map: &MapData) -> MapServiceResult<MapRecord> {
        let record = self.repo.save_map(map)?;
        info!(
            "event=map_save module=service status=ok map_id={} item_count={}",
            record.id,
            record.map_data.items.len()
        );
        Ok(record)
    }

    /// Parses, validates and stores a JSON document.
    pub fn import_json(&self, json: &str) -> MapServiceResult<MapRecord> {
        let map = MapData::from_json(json)?;
        self.save_map(&map)
    }

    pub fn get_map(&self, map_id: MapId) -> MapServiceResult<MapRecord> {
        self.repo
            .get_map(map_id)?
            .ok_or(MapServiceError::MapNotFound(map_id))
    }

    /// Most recently updated first.
    pub fn list_maps(&self) -> MapServiceResult<Vec<MapRecord>> {
        Ok(self.repo.list_maps()?)
    }

    pub fn active_map(&self) -> MapServiceResult<Option<MapRecord>> {
        Ok(self.repo.active_map()?)
    }

    /// Flags `map_id` as the single active map.
    ///
    /// Plot reconciliation is not part of this call; see
    /// [`crate::service::activation_service::MapActivation`].
    pub fn set_active(&self, map_id: MapId) -> MapServiceResult<()> {
        Ok(self.repo.set_active(map_id)?)
    }

    pub fn delete_map(&self, map_id: MapId) -> MapServiceResult<()> {
        Ok(self.repo.delete_map(map_id)?)
    }
}

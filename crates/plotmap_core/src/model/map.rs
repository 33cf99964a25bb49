//! Map document model.
//!
//! # Responsibility
//! - Define the exported/imported map document (`MapData`).
//! - Validate document-level invariants before the document is persisted
//!   or handed to the editor.
//!
//! # Invariants
//! - Exactly one background-class layer and at least one operational layer.
//! - Layer ids and item ids are unique; every item's layer id resolves.
//! - `to_json` followed by `from_json` yields an equal document.

use crate::model::item::{Item, ItemValidationError};
use crate::model::layer::{default_layers, Layer};
use crate::model::plot::MapId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Name given to maps created without one.
pub const DEFAULT_MAP_NAME: &str = "New Community Map";
/// Side length, in map units, of a freshly created map.
pub const DEFAULT_MAP_SIZE: f64 = 150.0;

/// Lighting and backdrop settings carried with the document.
///
/// Renderer-specific keys this crate does not model are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEnvironment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars_intensity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_light_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_light_intensity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directional_light_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directional_light_intensity: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MapEnvironment {
    /// Environment used by a fresh map.
    pub fn standard() -> Self {
        Self {
            background_color: Some("#DDDDDD".to_string()),
            stars_intensity: Some(0.5),
            ambient_light_color: Some("#FFFFFF".to_string()),
            ambient_light_intensity: Some(0.8),
            directional_light_color: Some("#FFFFFF".to_string()),
            directional_light_intensity: Some(1.0),
            extra: Map::new(),
        }
    }
}

/// Full map document: grid size, environment, layers and items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MapId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub environment: MapEnvironment,
    #[serde(default = "default_layers")]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl MapData {
    /// Creates an empty 150x150 map with the default layer stack.
    pub fn new_default() -> Self {
        Self::new(DEFAULT_MAP_NAME, DEFAULT_MAP_SIZE, DEFAULT_MAP_SIZE)
    }

    /// Creates an empty map with the default layer stack.
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            width,
            height,
            environment: MapEnvironment::standard(),
            layers: default_layers(),
            items: Vec::new(),
        }
    }

    /// Parses and validates a document.
    pub fn from_json(text: &str) -> Result<Self, MapDataError> {
        let data: Self = serde_json::from_str(text)?;
        data.validate()?;
        Ok(data)
    }

    /// Serializes to compact JSON.
    pub fn to_json(&self) -> Result<String, MapDataError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes to indented JSON for export files.
    pub fn to_json_pretty(&self) -> Result<String, MapDataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn layer(&self, layer_id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == layer_id)
    }

    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Items that declare plot cells.
    pub fn plot_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| item.is_plot())
    }

    /// Checks all document-level invariants.
    pub fn validate(&self) -> Result<(), MapDataError> {
        let size_ok = |value: f64| value.is_finite() && value >= 1.0;
        if !size_ok(self.width) || !size_ok(self.height) {
            return Err(MapDataError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }

        let mut layer_ids = HashSet::with_capacity(self.layers.len());
        for layer in &self.layers {
            if !layer_ids.insert(layer.id.as_str()) {
                return Err(MapDataError::DuplicateLayerId(layer.id.clone()));
            }
            if !layer.z_index.is_finite() {
                return Err(MapDataError::NonFiniteZIndex(layer.id.clone()));
            }
        }

        let backgrounds = self.layers.iter().filter(|layer| layer.is_background()).count();
        match backgrounds {
            0 => return Err(MapDataError::MissingBackgroundLayer),
            1 => {}
            count => return Err(MapDataError::MultipleBackgroundLayers(count)),
        }
        if self.layers.len() == backgrounds {
            return Err(MapDataError::NoOperationalLayer);
        }

        let mut item_ids = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            item.validate().map_err(|source| MapDataError::InvalidItem {
                item_id: item.id.clone(),
                source,
            })?;
            if !item_ids.insert(item.id.as_str()) {
                return Err(MapDataError::DuplicateItemId(item.id.clone()));
            }
            if !layer_ids.contains(item.layer_id.as_str()) {
                return Err(MapDataError::UnknownLayer {
                    item_id: item.id.clone(),
                    layer_id: item.layer_id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Stored map document with its activation flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRecord {
    pub id: MapId,
    pub name: String,
    pub description: Option<String>,
    pub map_data: MapData,
    /// At most one stored map is active.
    pub is_active: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

/// Map document parse and validation errors.
#[derive(Debug)]
pub enum MapDataError {
    Json(serde_json::Error),
    InvalidSize { width: f64, height: f64 },
    MissingBackgroundLayer,
    MultipleBackgroundLayers(usize),
    NoOperationalLayer,
    DuplicateLayerId(String),
    NonFiniteZIndex(String),
    DuplicateItemId(String),
    UnknownLayer { item_id: String, layer_id: String },
    InvalidItem {
        item_id: String,
        source: ItemValidationError,
    },
}

impl Display for MapDataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid map document JSON: {err}"),
            Self::InvalidSize { width, height } => {
                write!(f, "map size {width}x{height} is invalid; both must be >= 1")
            }
            Self::MissingBackgroundLayer => write!(f, "map has no background layer"),
            Self::MultipleBackgroundLayers(count) => {
                write!(f, "map has {count} background layers; expected exactly one")
            }
            Self::NoOperationalLayer => write!(f, "map has no operational layer"),
            Self::DuplicateLayerId(id) => write!(f, "duplicate layer id `{id}`"),
            Self::NonFiniteZIndex(id) => write!(f, "layer `{id}` has a non-finite zIndex"),
            Self::DuplicateItemId(id) => write!(f, "duplicate item id `{id}`"),
            Self::UnknownLayer { item_id, layer_id } => {
                write!(f, "item `{item_id}` references unknown layer `{layer_id}`")
            }
            Self::InvalidItem { item_id, source } => write!(f, "item `{item_id}`: {source}"),
        }
    }
}

impl Error for MapDataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::InvalidItem { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MapDataError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

//! In-process map editor.
//!
//! # Responsibility
//! - Own one `MapData` document and apply editor commands to it.
//! - Enforce layer rules (`layers.rs`) and spatial placement rules
//!   (`items.rs`) synchronously, before anything is persisted.
//!
//! # Invariants
//! - The wrapped document always satisfies `MapData::validate`.
//! - Layers are kept sorted by ascending `z_index`.
//! - A failed command leaves the document unchanged.
//!
//! # See also
//! - `service::map_service` for persistence of edited documents.

pub mod items;
pub mod layers;

pub use items::{CollisionPolicy, NewItem, RenderEntry, SelectionFilter};
pub use layers::LayerDirection;

use crate::config::EngineConfig;
use crate::geometry::SnapSettings;
use crate::model::item::{ItemCategory, ItemId};
use crate::model::layer::LayerId;
use crate::model::map::{MapData, MapDataError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for editor commands.
pub type EditorResult<T> = Result<T, EditorError>;

/// Editor command failures.
#[derive(Debug)]
pub enum EditorError {
    /// Background-class layers cannot be removed, renamed, moved or used
    /// as an item target; reserved names cannot be reused.
    LayerProtected(String),
    /// Removing the layer would leave no operational layer.
    LastOperationalLayer,
    UnknownLayer(LayerId),
    UnknownItem(ItemId),
    UnknownItemType(String),
    /// No layer accepts items of this category.
    NoLayerForCategory(ItemCategory),
    DuplicateItem(ItemId),
    /// Same-layer overlap under `CollisionPolicy::Reject`.
    Overlap { existing: ItemId },
    InvalidDimensions { width: f64, height: f64 },
    InvalidLayerName(String),
    InvalidValue(&'static str),
    InvalidMap(MapDataError),
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LayerProtected(layer) => write!(f, "layer `{layer}` is protected"),
            Self::LastOperationalLayer => {
                write!(f, "cannot remove the last non-background layer")
            }
            Self::UnknownLayer(id) => write!(f, "layer not found: {id}"),
            Self::UnknownItem(id) => write!(f, "item not found: {id}"),
            Self::UnknownItemType(id) => write!(f, "unknown item type: {id}"),
            Self::NoLayerForCategory(category) => {
                write!(f, "no visible layer accepts `{}` items", category.as_str())
            }
            Self::DuplicateItem(id) => write!(f, "item id already exists: {id}"),
            Self::Overlap { existing } => {
                write!(f, "placement overlaps item `{existing}` on the same layer")
            }
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid item dimensions {width}x{height}")
            }
            Self::InvalidLayerName(name) => write!(f, "invalid layer name `{name}`"),
            Self::InvalidValue(field) => write!(f, "invalid value for `{field}`"),
            Self::InvalidMap(err) => write!(f, "invalid map document: {err}"),
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidMap(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MapDataError> for EditorError {
    fn from(value: MapDataError) -> Self {
        Self::InvalidMap(value)
    }
}

/// Editing session over one map document.
#[derive(Debug, Clone)]
pub struct MapEditor {
    map: MapData,
    snap: SnapSettings,
}

impl MapEditor {
    /// Wraps a document after validating it.
    ///
    /// # Errors
    /// - `InvalidMap` when the document violates a map invariant.
    pub fn new(map: MapData, snap: SnapSettings) -> EditorResult<Self> {
        map.validate()?;
        if !(snap.grid_size.is_finite() && snap.grid_size > 0.0) {
            return Err(EditorError::InvalidValue("gridSize"));
        }
        let mut editor = Self { map, snap };
        editor.sort_layers();
        Ok(editor)
    }

    /// Wraps a document using the configured snap settings.
    pub fn with_config(map: MapData, config: &EngineConfig) -> EditorResult<Self> {
        Self::new(map, config.snap)
    }

    /// Parses, validates and wraps an exported document.
    pub fn import_json(text: &str, snap: SnapSettings) -> EditorResult<Self> {
        Self::new(MapData::from_json(text)?, snap)
    }

    /// Serializes the current document.
    pub fn export_json(&self) -> EditorResult<String> {
        Ok(self.map.to_json()?)
    }

    pub fn map(&self) -> &MapData {
        &self.map
    }

    pub fn into_map(self) -> MapData {
        self.map
    }

    pub fn snap(&self) -> SnapSettings {
        self.snap
    }

    pub fn set_snap(&mut self, snap: SnapSettings) -> EditorResult<()> {
        if !(snap.grid_size.is_finite() && snap.grid_size > 0.0) {
            return Err(EditorError::InvalidValue("gridSize"));
        }
        self.snap = snap;
        Ok(())
    }
}

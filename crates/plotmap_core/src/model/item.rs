//! Placed map item model.
//!
//! # Responsibility
//! - Define the canonical item record shared by the editor, renderers and
//!   map activation.
//! - Expose a typed view over plot-specific properties while keeping the
//!   open property bag lossless on export/import.
//!
//! # Invariants
//! - `width` and `height` are at least `MIN_ITEM_EXTENT`.
//! - `rotation` lies in `[0, 360)`; it never changes bounds.
//! - `scale` is strictly positive.

use crate::geometry::Bounds;
use crate::model::layer::LayerId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable item identifier. Plot ids reuse this value.
pub type ItemId = String;

/// Smallest accepted width or height in map units.
pub const MIN_ITEM_EXTENT: f64 = 0.1;

const PROPERTY_NAME: &str = "name";
const PROPERTY_PRICE: &str = "price";
const PROPERTY_FACING_DIRECTION: &str = "facingDirection";

/// Item category. Decides z-offset, selection filters and plot derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    #[serde(alias = "GROUND")]
    Ground,
    #[serde(alias = "STREET")]
    Street,
    #[serde(alias = "PLOT")]
    Plot,
    #[serde(alias = "BUILDING")]
    Building,
    #[serde(alias = "DECORATIVE")]
    Decorative,
    #[serde(alias = "LANDMARK")]
    Landmark,
}

impl ItemCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ground => "ground",
            Self::Street => "street",
            Self::Plot => "plot",
            Self::Building => "building",
            Self::Decorative => "decorative",
            Self::Landmark => "landmark",
        }
    }
}

/// One placed object on the map grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    /// Serialized as `type`, e.g. `plot-standard` or `decorative-tree-pine`.
    #[serde(rename = "type")]
    pub kind: String,
    pub category: ItemCategory,
    /// Top-left corner in map units.
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_extent")]
    pub width: f64,
    #[serde(default = "default_extent")]
    pub height: f64,
    /// Display rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub layer_id: LayerId,
    /// Extra depth relative to the layer's `z_index`.
    #[serde(default)]
    pub elevation_offset: f64,
    /// Open metadata bag. Use `plot_properties` for typed plot fields.
    #[serde(default, deserialize_with = "deserialize_properties")]
    pub properties: Map<String, Value>,
}

impl Item {
    /// Axis-aligned bounds; rotation is ignored.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    pub fn is_plot(&self) -> bool {
        self.category == ItemCategory::Plot
    }

    /// Typed plot properties. `None` for non-plot categories.
    pub fn plot_properties(&self) -> Option<PlotProperties> {
        if !self.is_plot() {
            return None;
        }
        Some(PlotProperties::from_properties(&self.properties))
    }

    /// Writes typed plot properties back into the open bag.
    ///
    /// Returns `false` and leaves the item unchanged for non-plot categories.
    pub fn set_plot_properties(&mut self, properties: &PlotProperties) -> bool {
        if !self.is_plot() {
            return false;
        }
        properties.apply_to(&mut self.properties);
        true
    }

    /// Checks per-item invariants.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id.trim().is_empty() {
            return Err(ItemValidationError::EmptyId);
        }
        if self.kind.trim().is_empty() {
            return Err(ItemValidationError::EmptyType);
        }
        if self.layer_id.trim().is_empty() {
            return Err(ItemValidationError::EmptyLayer);
        }
        for (field, value) in [
            ("x", self.x),
            ("y", self.y),
            ("elevationOffset", self.elevation_offset),
        ] {
            if !value.is_finite() {
                return Err(ItemValidationError::NonFinite(field));
            }
        }
        validate_extent(self.width, self.height)?;
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ItemValidationError::InvalidScale(self.scale));
        }
        if !(self.rotation.is_finite() && (0.0..360.0).contains(&self.rotation)) {
            return Err(ItemValidationError::InvalidRotation(self.rotation));
        }
        Ok(())
    }
}

/// Validates a width/height pair against `MIN_ITEM_EXTENT`.
pub fn validate_extent(width: f64, height: f64) -> Result<(), ItemValidationError> {
    let valid = |value: f64| value.is_finite() && value >= MIN_ITEM_EXTENT;
    if !valid(width) || !valid(height) {
        return Err(ItemValidationError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Wraps any finite angle into `[0, 360)`.
pub fn normalize_rotation(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Typed view of the properties a plot item carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotProperties {
    /// Display name shown in the marketplace.
    pub name: Option<String>,
    /// Listing price; only numeric values are honored.
    pub price: Option<f64>,
    /// Mirrors the item's rotation after rotate operations.
    pub facing_direction: Option<f64>,
}

impl PlotProperties {
    /// Reads plot fields from an open property bag.
    ///
    /// Empty names and non-numeric prices are treated as absent.
    pub fn from_properties(properties: &Map<String, Value>) -> Self {
        let name = match properties.get(PROPERTY_NAME) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => None,
            Some(Value::String(value)) if value.is_empty() => None,
            Some(Value::String(value)) => Some(value.clone()),
            Some(other) => Some(other.to_string()),
        };
        Self {
            name,
            price: properties.get(PROPERTY_PRICE).and_then(Value::as_f64),
            facing_direction: properties
                .get(PROPERTY_FACING_DIRECTION)
                .and_then(Value::as_f64),
        }
    }

    /// Writes set fields into `properties` and removes unset ones.
    pub fn apply_to(&self, properties: &mut Map<String, Value>) {
        write_optional(properties, PROPERTY_NAME, self.name.clone().map(Value::from));
        write_optional(properties, PROPERTY_PRICE, self.price.map(Value::from));
        write_optional(
            properties,
            PROPERTY_FACING_DIRECTION,
            self.facing_direction.map(Value::from),
        );
    }
}

fn write_optional(properties: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    match value {
        Some(value) => {
            properties.insert(key.to_string(), value);
        }
        None => {
            properties.remove(key);
        }
    }
}

fn default_extent() -> f64 {
    1.0
}

fn default_scale() -> f64 {
    1.0
}

fn deserialize_properties<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Item invariant violations.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemValidationError {
    EmptyId,
    EmptyType,
    EmptyLayer,
    NonFinite(&'static str),
    InvalidDimensions { width: f64, height: f64 },
    InvalidScale(f64),
    InvalidRotation(f64),
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "item id must not be blank"),
            Self::EmptyType => write!(f, "item type must not be blank"),
            Self::EmptyLayer => write!(f, "item layer id must not be blank"),
            Self::NonFinite(field) => write!(f, "item field `{field}` must be finite"),
            Self::InvalidDimensions { width, height } => write!(
                f,
                "item dimensions {width}x{height} are invalid; both must be >= {MIN_ITEM_EXTENT}"
            ),
            Self::InvalidScale(scale) => write!(f, "item scale {scale} must be positive"),
            Self::InvalidRotation(rotation) => {
                write!(f, "item rotation {rotation} must lie in [0, 360)")
            }
        }
    }
}

impl Error for ItemValidationError {}

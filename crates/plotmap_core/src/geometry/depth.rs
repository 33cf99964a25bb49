//! Draw-order keys and world-space placement.
//!
//! # Responsibility
//! - Provide the fixed category z-offset table that keeps same-layer visual
//!   levels (ground, street, plot, structures) from z-fighting.
//! - Convert top-left map coordinates into map-centered world coordinates.
//!
//! # Invariants
//! - `DrawKey` ordering is total: `f64::total_cmp` on depth, then `y`, then `x`.
//! - `category_z_offset` always returns a value in `0.00..=0.56`.

use crate::geometry::bounds::Bounds;
use crate::model::item::ItemCategory;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Composite draw-order key for one item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawKey {
    /// `layer.z_index + item.elevation_offset + category_z_offset(item)`.
    pub depth: f64,
    pub y: f64,
    pub x: f64,
}

impl DrawKey {
    pub fn new(layer_z_index: f64, elevation_offset: f64, z_offset: f64, bounds: &Bounds) -> Self {
        Self {
            depth: layer_z_index + elevation_offset + z_offset,
            y: bounds.y,
            x: bounds.x,
        }
    }

    /// Lexicographic `(depth, y, x)` comparison.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.depth
            .total_cmp(&other.depth)
            .then_with(|| self.y.total_cmp(&other.y))
            .then_with(|| self.x.total_cmp(&other.x))
    }
}

/// Map-centered world position on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPosition {
    pub x: f64,
    pub z: f64,
}

/// Re-origins an item's center from the map's top-left corner to its center.
pub fn to_world_center(
    bounds: &Bounds,
    map_width: f64,
    map_height: f64,
    unit_size: f64,
) -> WorldPosition {
    let center = bounds.center();
    WorldPosition {
        x: (center.x - map_width / 2.0) * unit_size,
        z: (center.y - map_height / 2.0) * unit_size,
    }
}

/// Small depth bias per category and selected type substrings.
pub fn category_z_offset(category: ItemCategory, item_type: &str) -> f64 {
    let item_type = item_type.to_ascii_lowercase();
    match category {
        ItemCategory::Ground => {
            if item_type.contains("sand") || item_type.contains("dirt") {
                0.30
            } else if item_type.contains("park") {
                0.30
            } else if item_type.contains("water") {
                0.50
            } else if item_type.contains("grass") {
                0.05
            } else {
                0.00
            }
        }
        ItemCategory::Street => {
            const RAISED: &[&str] = &["junction", "roundabout", "path", "bridge", "parking-lot"];
            if RAISED.iter().any(|needle| item_type.contains(needle)) {
                0.56
            } else {
                0.50
            }
        }
        ItemCategory::Plot
        | ItemCategory::Building
        | ItemCategory::Landmark
        | ItemCategory::Decorative => 0.50,
    }
}

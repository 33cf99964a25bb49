//! Item placement, transforms, selection and render ordering.
//!
//! # Invariants
//! - Sizes must be positive and finite before snapping; snapped bounds are
//!   validated again before collision tests.
//! - Under `CollisionPolicy::Reject` no two items on one layer share
//!   interior area (`aabb_overlap`).
//! - Items never sit on the background layer through editor commands.
//! - `render_order` depends only on item contents, never on storage order.

use super::{EditorError, EditorResult, MapEditor};
use crate::geometry::{
    aabb_overlap, category_z_offset, rect_touches, to_world_center, Bounds, DrawKey, Point,
    WorldPosition,
};
use crate::model::catalog::{find_item_type, layer_hints};
use crate::model::item::{
    normalize_rotation, validate_extent, Item, ItemCategory, ItemId, ItemValidationError,
    PlotProperties,
};
use crate::model::layer::{Layer, LayerId};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Behavior when a placement overlaps a same-layer item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Fail with `EditorError::Overlap`.
    #[default]
    Reject,
    /// Accept overlapping placements.
    Allow,
}

/// Input for `MapEditor::place_item`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    /// Generated when `None`.
    pub id: Option<ItemId>,
    pub kind: String,
    pub category: ItemCategory,
    pub layer_id: LayerId,
    pub bounds: Bounds,
    pub rotation: f64,
    pub scale: f64,
    pub color: Option<String>,
    pub elevation_offset: f64,
    pub properties: Map<String, Value>,
}

impl NewItem {
    pub fn new(
        kind: impl Into<String>,
        category: ItemCategory,
        layer_id: impl Into<LayerId>,
        bounds: Bounds,
    ) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            category,
            layer_id: layer_id.into(),
            bounds,
            rotation: 0.0,
            scale: 1.0,
            color: None,
            elevation_offset: 0.0,
            properties: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<ItemId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_elevation_offset(mut self, elevation_offset: f64) -> Self {
        self.elevation_offset = elevation_offset;
        self
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    /// Sets typed plot properties. Ignored for non-plot categories.
    pub fn with_plot_properties(mut self, properties: &PlotProperties) -> Self {
        if self.category == ItemCategory::Plot {
            properties.apply_to(&mut self.properties);
        }
        self
    }
}

/// Category/type filter for rectangle selection. Empty lists match all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionFilter {
    pub categories: Vec<ItemCategory>,
    pub types: Vec<String>,
}

impl SelectionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn categories(categories: impl IntoIterator<Item = ItemCategory>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
            types: Vec::new(),
        }
    }

    pub fn types<S: Into<String>>(types: impl IntoIterator<Item = S>) -> Self {
        Self {
            categories: Vec::new(),
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        (self.categories.is_empty() || self.categories.contains(&item.category))
            && (self.types.is_empty() || self.types.iter().any(|kind| *kind == item.kind))
    }
}

/// One entry of the deterministic draw list.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderEntry<'a> {
    pub item: &'a Item,
    pub key: DrawKey,
}

impl MapEditor {
    pub fn items(&self) -> &[Item] {
        &self.map.items
    }

    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.map.item(item_id)
    }

    /// Declared plot cells, in document order.
    pub fn plot_items(&self) -> Vec<&Item> {
        self.map.plot_items().collect()
    }

    /// Snaps, validates and inserts a new item.
    ///
    /// # Errors
    /// - `UnknownLayer` / `LayerProtected` for a missing or background layer.
    /// - `InvalidDimensions` for non-finite or non-positive sizes, or when the
    ///   snapped size is below the minimum.
    /// - `DuplicateItem` when a caller-provided id already exists.
    /// - `Overlap` under `CollisionPolicy::Reject`.
    pub fn place_item(&mut self, new_item: NewItem, policy: CollisionPolicy) -> EditorResult<ItemId> {
        self.target_layer(&new_item.layer_id)?;
        let bounds = self.snap_bounds(new_item.bounds)?;
        if !new_item.rotation.is_finite() {
            return Err(EditorError::InvalidValue("rotation"));
        }
        if !(new_item.scale.is_finite() && new_item.scale > 0.0) {
            return Err(EditorError::InvalidValue("scale"));
        }
        if !new_item.elevation_offset.is_finite() {
            return Err(EditorError::InvalidValue("elevationOffset"));
        }
        if new_item.kind.trim().is_empty() {
            return Err(EditorError::InvalidValue("type"));
        }

        let id = match new_item.id {
            Some(id) if id.trim().is_empty() => return Err(EditorError::InvalidValue("id")),
            Some(id) if self.map.item(&id).is_some() => return Err(EditorError::DuplicateItem(id)),
            Some(id) => id,
            None => Uuid::new_v4().to_string(),
        };
        self.check_collision(&new_item.layer_id, &bounds, None, policy)?;

        let item = Item {
            id: id.clone(),
            kind: new_item.kind,
            category: new_item.category,
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            rotation: normalize_rotation(new_item.rotation),
            scale: new_item.scale,
            color: new_item.color,
            layer_id: new_item.layer_id,
            elevation_offset: new_item.elevation_offset,
            properties: new_item.properties,
        };
        debug!(
            "event=item_place module=editor status=ok item_id={} category={} layer_id={}",
            item.id,
            item.category.as_str(),
            item.layer_id
        );
        self.map.items.push(item);
        Ok(id)
    }

    /// Places a catalog item type with its default size, colour and elevation.
    ///
    /// When `layer_id` is `None` the layer is routed from the item category.
    pub fn place_catalog_item(
        &mut self,
        type_id: &str,
        x: f64,
        y: f64,
        layer_id: Option<&str>,
        policy: CollisionPolicy,
    ) -> EditorResult<ItemId> {
        let spec =
            find_item_type(type_id).ok_or_else(|| EditorError::UnknownItemType(type_id.to_string()))?;
        let layer_id = match layer_id {
            Some(layer_id) => layer_id.to_string(),
            None => self
                .layer_for_category(spec.category, spec.id)
                .ok_or(EditorError::NoLayerForCategory(spec.category))?,
        };
        let new_item = NewItem::new(
            spec.id,
            spec.category,
            layer_id,
            Bounds::new(x, y, spec.default_width, spec.default_height),
        )
        .with_color(spec.color)
        .with_elevation_offset(spec.elevation_offset);
        self.place_item(new_item, policy)
    }

    /// Finds the visible operational layer new items of `category` go to.
    pub fn layer_for_category(&self, category: ItemCategory, type_id: &str) -> Option<LayerId> {
        let candidates = || {
            self.map
                .layers
                .iter()
                .filter(|layer| layer.visible && !layer.is_background())
        };
        layer_hints(category, type_id).iter().find_map(|hint| {
            candidates()
                .find(|layer| layer.name.eq_ignore_ascii_case(hint.exact))
                .or_else(|| {
                    candidates().find(|layer| layer.name.to_ascii_lowercase().contains(hint.contains))
                })
                .map(|layer| layer.id.clone())
        })
    }

    /// Moves an item's top-left corner.
    pub fn move_item(&mut self, item_id: &str, x: f64, y: f64, policy: CollisionPolicy) -> EditorResult<()> {
        let (index, current) = self.item_bounds(item_id)?;
        let bounds = self.snap_bounds(Bounds::new(x, y, current.width, current.height))?;
        self.check_collision(&self.map.items[index].layer_id, &bounds, Some(item_id), policy)?;
        let item = &mut self.map.items[index];
        item.x = bounds.x;
        item.y = bounds.y;
        Ok(())
    }

    /// Resizes an item, keeping its top-left corner.
    pub fn resize_item(
        &mut self,
        item_id: &str,
        width: f64,
        height: f64,
        policy: CollisionPolicy,
    ) -> EditorResult<()> {
        let (index, current) = self.item_bounds(item_id)?;
        let bounds = self.snap_bounds(Bounds::new(current.x, current.y, width, height))?;
        self.check_collision(&self.map.items[index].layer_id, &bounds, Some(item_id), policy)?;
        let item = &mut self.map.items[index];
        item.width = bounds.width;
        item.height = bounds.height;
        Ok(())
    }

    /// Adds `degrees` to each item's rotation, modulo 360.
    ///
    /// Plot items mirror the new rotation into `facingDirection`. All ids are
    /// checked before any item changes.
    pub fn rotate_items(&mut self, item_ids: &[ItemId], degrees: f64) -> EditorResult<()> {
        if !degrees.is_finite() {
            return Err(EditorError::InvalidValue("degrees"));
        }
        let mut indices = Vec::with_capacity(item_ids.len());
        for item_id in item_ids {
            let index = self.item_index(item_id)?;
            if !indices.contains(&index) {
                indices.push(index);
            }
        }

        for index in indices {
            let item = &mut self.map.items[index];
            item.rotation = normalize_rotation(item.rotation + degrees);
            if let Some(mut plot) = item.plot_properties() {
                plot.facing_direction = Some(item.rotation);
                item.set_plot_properties(&plot);
            }
        }
        Ok(())
    }

    /// Moves an item to another operational layer.
    pub fn assign_layer(
        &mut self,
        item_id: &str,
        layer_id: &str,
        policy: CollisionPolicy,
    ) -> EditorResult<()> {
        self.target_layer(layer_id)?;
        let (index, bounds) = self.item_bounds(item_id)?;
        self.check_collision(layer_id, &bounds, Some(item_id), policy)?;
        self.map.items[index].layer_id = layer_id.to_string();
        Ok(())
    }

    /// Replaces the typed plot properties of a plot item.
    pub fn set_plot_properties(&mut self, item_id: &str, properties: &PlotProperties) -> EditorResult<()> {
        if let Some(price) = properties.price {
            if !(price.is_finite() && price >= 0.0) {
                return Err(EditorError::InvalidValue("price"));
            }
        }
        let index = self.item_index(item_id)?;
        if !self.map.items[index].set_plot_properties(properties) {
            return Err(EditorError::InvalidValue("category"));
        }
        Ok(())
    }

    pub fn remove_item(&mut self, item_id: &str) -> EditorResult<Item> {
        let index = self.item_index(item_id)?;
        Ok(self.map.items.remove(index))
    }

    /// Ids of items touching the rectangle spanned by two corners.
    ///
    /// Edge contact counts, so a zero-area rectangle on an item's border
    /// selects it.
    pub fn select_in_rectangle(&self, from: Point, to: Point, filter: &SelectionFilter) -> Vec<ItemId> {
        let rect = Bounds::from_corners(from, to);
        self.map
            .items
            .iter()
            .filter(|item| filter.matches(item) && rect_touches(&rect, &item.bounds()))
            .map(|item| item.id.clone())
            .collect()
    }

    /// Items in draw order: depth, then `y`, then `x`, then id.
    ///
    /// Items on hidden layers are skipped unless `include_hidden`.
    pub fn render_order(&self, include_hidden: bool) -> Vec<RenderEntry<'_>> {
        let mut entries: Vec<RenderEntry<'_>> = self
            .map
            .items
            .iter()
            .filter_map(|item| {
                let layer = self.map.layer(&item.layer_id)?;
                if !layer.visible && !include_hidden {
                    return None;
                }
                Some(RenderEntry {
                    item,
                    key: draw_key(layer, item),
                })
            })
            .collect();
        entries.sort_by(|left, right| {
            left.key
                .compare(&right.key)
                .then_with(|| left.item.id.cmp(&right.item.id))
        });
        entries
    }

    /// Center of an item in map-centered world units.
    pub fn world_position(&self, item_id: &str, unit_size: f64) -> EditorResult<WorldPosition> {
        if !(unit_size.is_finite() && unit_size > 0.0) {
            return Err(EditorError::InvalidValue("unitSize"));
        }
        let (_, bounds) = self.item_bounds(item_id)?;
        Ok(to_world_center(&bounds, self.map.width, self.map.height, unit_size))
    }

    fn target_layer(&self, layer_id: &str) -> EditorResult<&Layer> {
        let layer = self
            .map
            .layer(layer_id)
            .ok_or_else(|| EditorError::UnknownLayer(layer_id.to_string()))?;
        if layer.is_background() {
            return Err(EditorError::LayerProtected(layer.name.clone()));
        }
        Ok(layer)
    }

    fn snap_bounds(&self, bounds: Bounds) -> EditorResult<Bounds> {
        if !bounds.x.is_finite() {
            return Err(EditorError::InvalidValue("x"));
        }
        if !bounds.y.is_finite() {
            return Err(EditorError::InvalidValue("y"));
        }
        // Snapping clamps sizes to one cell, so the raw input is checked first.
        if !(bounds.width.is_finite() && bounds.width > 0.0)
            || !(bounds.height.is_finite() && bounds.height > 0.0)
        {
            return Err(EditorError::InvalidDimensions {
                width: bounds.width,
                height: bounds.height,
            });
        }
        let snapped = Bounds::new(
            self.snap.position(bounds.x),
            self.snap.position(bounds.y),
            self.snap.size(bounds.width),
            self.snap.size(bounds.height),
        );
        validate_extent(snapped.width, snapped.height).map_err(extent_error)?;
        Ok(snapped)
    }

    fn check_collision(
        &self,
        layer_id: &str,
        bounds: &Bounds,
        exclude: Option<&str>,
        policy: CollisionPolicy,
    ) -> EditorResult<()> {
        if policy == CollisionPolicy::Allow {
            return Ok(());
        }
        let hit = self.map.items.iter().find(|item| {
            item.layer_id == layer_id
                && Some(item.id.as_str()) != exclude
                && aabb_overlap(bounds, &item.bounds())
        });
        match hit {
            Some(existing) => Err(EditorError::Overlap {
                existing: existing.id.clone(),
            }),
            None => Ok(()),
        }
    }

    fn item_index(&self, item_id: &str) -> EditorResult<usize> {
        self.map
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| EditorError::UnknownItem(item_id.to_string()))
    }

    fn item_bounds(&self, item_id: &str) -> EditorResult<(usize, Bounds)> {
        let index = self.item_index(item_id)?;
        Ok((index, self.map.items[index].bounds()))
    }
}

fn extent_error(err: ItemValidationError) -> EditorError {
    match err {
        ItemValidationError::InvalidDimensions { width, height } => {
            EditorError::InvalidDimensions { width, height }
        }
        _ => EditorError::InvalidValue("size"),
    }
}

/// Draw key of `item` on `layer`.
pub fn draw_key(layer: &Layer, item: &Item) -> DrawKey {
    DrawKey::new(
        layer.z_index,
        item.elevation_offset,
        category_z_offset(item.category, &item.kind),
        &item.bounds(),
    )
}

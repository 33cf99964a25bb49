//! Layer commands for `MapEditor`.
//!
//! # Invariants
//! - Exactly one background-class layer; it is never removed, renamed or
//!   reordered.
//! - At least one operational layer remains after every command.

use super::{EditorError, EditorResult, MapEditor};
use crate::model::layer::{is_background_name, Layer, LayerId};
use log::{debug, info};

/// Gap between the topmost layer and a newly added one.
const NEW_LAYER_Z_STEP: f64 = 0.01;

/// Direction for `reorder_layer`, in ascending `z_index` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerDirection {
    /// Towards lower `z_index` (drawn earlier).
    Up,
    /// Towards higher `z_index` (drawn later).
    Down,
}

impl MapEditor {
    /// Layers in ascending `z_index` order.
    pub fn layers(&self) -> &[Layer] {
        &self.map.layers
    }

    pub fn layer(&self, layer_id: &str) -> Option<&Layer> {
        self.map.layer(layer_id)
    }

    /// Adds a visible layer on top of the stack.
    ///
    /// # Errors
    /// - `InvalidLayerName` for blank names.
    /// - `LayerProtected` for reserved background names.
    pub fn add_layer(&mut self, name: &str) -> EditorResult<LayerId> {
        let name = validate_layer_name(name)?;
        let z_index = self
            .map
            .layers
            .iter()
            .map(|layer| layer.z_index)
            .max_by(f64::total_cmp)
            .map_or(0.0, |max| max + NEW_LAYER_Z_STEP);

        let layer = Layer::new(name, z_index);
        let id = layer.id.clone();
        self.map.layers.push(layer);
        self.sort_layers();
        info!("event=layer_add module=editor status=ok layer_id={id} z_index={z_index}");
        Ok(id)
    }

    /// Renames an operational layer.
    pub fn rename_layer(&mut self, layer_id: &str, name: &str) -> EditorResult<()> {
        let name = validate_layer_name(name)?;
        let layer = self.operational_layer_mut(layer_id)?;
        layer.name = name;
        Ok(())
    }

    /// Toggles visibility. Hidden layers are skipped by `render_order(false)`.
    pub fn set_layer_visible(&mut self, layer_id: &str, visible: bool) -> EditorResult<()> {
        let layer = self
            .map
            .layers
            .iter_mut()
            .find(|layer| layer.id == layer_id)
            .ok_or_else(|| EditorError::UnknownLayer(layer_id.to_string()))?;
        layer.visible = visible;
        Ok(())
    }

    /// Sets an operational layer's `z_index` directly.
    ///
    /// The value must stay above the background layer's `z_index`.
    pub fn set_layer_z_index(&mut self, layer_id: &str, z_index: f64) -> EditorResult<()> {
        if !z_index.is_finite() {
            return Err(EditorError::InvalidValue("zIndex"));
        }
        let floor = self
            .map
            .layers
            .iter()
            .filter(|layer| layer.is_background())
            .map(|layer| layer.z_index)
            .max_by(f64::total_cmp);
        if floor.is_some_and(|floor| z_index <= floor) {
            return Err(EditorError::InvalidValue("zIndex"));
        }
        self.operational_layer_mut(layer_id)?.z_index = z_index;
        self.sort_layers();
        Ok(())
    }

    /// Removes an operational layer and every item on it.
    ///
    /// Returns the number of items removed with the layer.
    ///
    /// # Errors
    /// - `UnknownLayer` when `layer_id` does not exist.
    /// - `LayerProtected` for the background layer.
    /// - `LastOperationalLayer` when it is the only operational layer.
    pub fn remove_layer(&mut self, layer_id: &str) -> EditorResult<usize> {
        let layer = self
            .map
            .layer(layer_id)
            .ok_or_else(|| EditorError::UnknownLayer(layer_id.to_string()))?;
        if layer.is_background() {
            return Err(EditorError::LayerProtected(layer.name.clone()));
        }
        let operational = self
            .map
            .layers
            .iter()
            .filter(|layer| !layer.is_background())
            .count();
        if operational <= 1 {
            return Err(EditorError::LastOperationalLayer);
        }

        let before = self.map.items.len();
        self.map.items.retain(|item| item.layer_id != layer_id);
        let removed_items = before - self.map.items.len();
        self.map.layers.retain(|layer| layer.id != layer_id);
        info!(
            "event=layer_remove module=editor status=ok layer_id={layer_id} removed_items={removed_items}"
        );
        Ok(removed_items)
    }

    /// Swaps `z_index` with the neighbouring layer.
    ///
    /// Returns `false` when there is no neighbour in that direction or the
    /// neighbour is the background layer.
    pub fn reorder_layer(&mut self, layer_id: &str, direction: LayerDirection) -> EditorResult<bool> {
        let index = self
            .map
            .layers
            .iter()
            .position(|layer| layer.id == layer_id)
            .ok_or_else(|| EditorError::UnknownLayer(layer_id.to_string()))?;
        if self.map.layers[index].is_background() {
            return Err(EditorError::LayerProtected(self.map.layers[index].name.clone()));
        }

        let neighbour = match direction {
            LayerDirection::Up => index.checked_sub(1),
            LayerDirection::Down => Some(index + 1).filter(|next| *next < self.map.layers.len()),
        };
        let Some(neighbour) = neighbour else {
            return Ok(false);
        };
        if self.map.layers[neighbour].is_background() {
            return Ok(false);
        }

        let z_index = self.map.layers[index].z_index;
        self.map.layers[index].z_index = self.map.layers[neighbour].z_index;
        self.map.layers[neighbour].z_index = z_index;
        self.map.layers.swap(index, neighbour);
        self.sort_layers();
        debug!("event=layer_reorder module=editor status=ok layer_id={layer_id} direction={direction:?}");
        Ok(true)
    }

    pub(super) fn sort_layers(&mut self) {
        self.map
            .layers
            .sort_by(|left, right| left.z_index.total_cmp(&right.z_index));
    }

    fn operational_layer_mut(&mut self, layer_id: &str) -> EditorResult<&mut Layer> {
        let layer = self
            .map
            .layers
            .iter_mut()
            .find(|layer| layer.id == layer_id)
            .ok_or_else(|| EditorError::UnknownLayer(layer_id.to_string()))?;
        if layer.is_background() {
            return Err(EditorError::LayerProtected(layer.name.clone()));
        }
        Ok(layer)
    }
}

fn validate_layer_name(name: &str) -> EditorResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EditorError::InvalidLayerName(name.to_string()));
    }
    if is_background_name(trimmed) {
        return Err(EditorError::LayerProtected(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

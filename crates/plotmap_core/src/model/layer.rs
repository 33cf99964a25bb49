//! Layer model.
//!
//! # Invariants
//! - Background-class is decided by name only, against `BACKGROUND_LAYER_NAMES`.
//! - A valid map holds exactly one background-class layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable layer identifier (UUID text for generated layers).
pub type LayerId = String;

/// Reserved lowercase names that mark the background-class layer.
pub const BACKGROUND_LAYER_NAMES: &[&str] = &["map background", "background"];

/// Display name used when a fresh map creates its background layer.
pub const DEFAULT_BACKGROUND_LAYER_NAME: &str = "Map Background";

/// Named z-ordering bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    /// Base depth for every item on the layer.
    pub z_index: f64,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl Layer {
    /// Creates a visible layer with a generated id.
    pub fn new(name: impl Into<String>, z_index: f64) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name, z_index)
    }

    /// Creates a visible layer with a caller-provided id.
    pub fn with_id(id: impl Into<LayerId>, name: impl Into<String>, z_index: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            z_index,
            visible: true,
        }
    }

    /// Returns whether this is the protected background layer.
    pub fn is_background(&self) -> bool {
        is_background_name(&self.name)
    }
}

/// Returns whether `name` is one of the reserved background names.
pub fn is_background_name(name: &str) -> bool {
    let normalized = name.trim().to_ascii_lowercase();
    BACKGROUND_LAYER_NAMES.contains(&normalized.as_str())
}

/// Layer stack used by a fresh map.
pub fn default_layers() -> Vec<Layer> {
    vec![
        Layer::new(DEFAULT_BACKGROUND_LAYER_NAME, -10.0),
        Layer::new("Ground", 0.00),
        Layer::new("Streets", 0.02),
        Layer::new("Water Features", 0.04),
        Layer::new("Plots", 0.08),
        Layer::new("Objects & Structures", 0.10),
    ]
}

fn default_visible() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::{default_layers, is_background_name};

    #[test]
    fn background_names_match_case_insensitively() {
        assert!(is_background_name("Map Background"));
        assert!(is_background_name("  BACKGROUND "));
        assert!(!is_background_name("Ground"));
    }

    #[test]
    fn default_stack_has_one_background() {
        let layers = default_layers();
        assert_eq!(layers.iter().filter(|layer| layer.is_background()).count(), 1);
        assert!(layers.windows(2).all(|pair| pair[0].z_index < pair[1].z_index));
    }
}
